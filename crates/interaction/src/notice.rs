use foundation::Epoch;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Operator-facing outcome of a gesture or request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub epoch: Epoch,
    pub severity: Severity,
    pub message: String,
    /// How many times this exact notice was raised back to back.
    pub count: u32,
}

/// Notices in the order they were raised, waiting to be shown.
///
/// Repeating the previous notice within the same epoch bumps its count
/// instead of queueing a copy, so an operator hammering a refused gesture
/// sees one line.
#[derive(Debug, Default)]
pub struct NoticeBus {
    pending: Vec<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, epoch: Epoch, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        if let Some(last) = self.pending.last_mut()
            && last.epoch == epoch
            && last.severity == severity
            && last.message == message
        {
            last.count = last.count.saturating_add(1);
            return;
        }
        self.pending.push(Notice {
            epoch,
            severity,
            message,
            count: 1,
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::{NoticeBus, Severity};
    use foundation::Epoch;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_refusals_collapse_into_one_notice() {
        let mut bus = NoticeBus::new();
        for _ in 0..3 {
            bus.emit(Epoch(4), Severity::Warning, "commit pending; cancel refused");
        }
        assert_eq!(bus.notices().len(), 1);
        assert_eq!(bus.notices()[0].count, 3);

        // A new epoch is a new gesture session, even with the same text.
        bus.emit(Epoch(5), Severity::Warning, "commit pending; cancel refused");
        assert_eq!(bus.notices().len(), 2);
        assert_eq!(bus.notices()[1].count, 1);
    }

    #[test]
    fn interleaved_notices_keep_emission_order() {
        let mut bus = NoticeBus::new();
        bus.emit(Epoch(1), Severity::Error, "delete failed");
        bus.emit(Epoch(1), Severity::Info, "no feature found at this location");
        bus.emit(Epoch(1), Severity::Error, "delete failed");
        let drained: Vec<(Severity, u32)> =
            bus.drain().into_iter().map(|n| (n.severity, n.count)).collect();
        assert_eq!(
            drained,
            vec![(Severity::Error, 1), (Severity::Info, 1), (Severity::Error, 1)]
        );
        assert!(bus.notices().is_empty());
    }
}
