use protocol::RejectReason;

/// A feature-info lookup that did not produce an answer.
///
/// The state machine treats every variant as "no feature here".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    Transport(String),
    Status(u16),
    Malformed(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::Transport(e) => write!(f, "feature-info request failed: {e}"),
            QueryError::Status(status) => write!(f, "feature-info request returned {status}"),
            QueryError::Malformed(e) => write!(f, "malformed feature-info response: {e}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// A mutation the store did not confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    Transport(String),
    Encode(String),
    Rejected(RejectReason),
}

impl std::fmt::Display for CommitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitError::Transport(e) => write!(f, "store request failed: {e}"),
            CommitError::Encode(e) => write!(f, "could not encode request: {e}"),
            CommitError::Rejected(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for CommitError {}

impl From<RejectReason> for CommitError {
    fn from(reason: RejectReason) -> Self {
        CommitError::Rejected(reason)
    }
}
