/// Identifies one outstanding network request.
///
/// Tickets are issued from a single monotonic counter, so a response can be
/// matched against the request the state machine is still waiting for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

/// Interaction session counter; bumped on every mode change.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0 + 1)
    }
}

#[derive(Debug, Default)]
pub struct TicketIssuer {
    next: u64,
}

impl TicketIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.next += 1;
        Ticket(self.next)
    }
}
