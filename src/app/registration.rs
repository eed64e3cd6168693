//! "Allow registration" flag with an explicit optimistic transition.

/// Where the last toggle ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TogglePhase {
    /// Displayed value matches the server.
    Committed,
    /// A change was sent and has not been answered yet.
    Pending { seq: u64, requested: bool },
    /// The last change failed and the display went back to the server value.
    RolledBack,
}

#[derive(Clone, Debug)]
pub struct RegistrationToggle {
    committed: bool,
    phase: TogglePhase,
    next_seq: u64,
}

impl RegistrationToggle {
    pub fn new(committed: bool) -> Self {
        Self {
            committed,
            phase: TogglePhase::Committed,
            next_seq: 1,
        }
    }

    /// Value shown to the operator: the requested one while pending.
    pub fn displayed(&self) -> bool {
        match self.phase {
            TogglePhase::Pending { requested, .. } => requested,
            _ => self.committed,
        }
    }

    pub fn phase(&self) -> TogglePhase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, TogglePhase::Pending { .. })
    }

    /// Start a transition to `requested`. Refused while another is pending.
    pub fn begin(&mut self, requested: bool) -> Option<u64> {
        if self.is_pending() {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.phase = TogglePhase::Pending { seq, requested };
        Some(seq)
    }

    /// The server accepted transition `seq`.
    pub fn commit(&mut self, seq: u64) {
        if let TogglePhase::Pending { seq: current, requested } = self.phase
            && current == seq
        {
            self.committed = requested;
            self.phase = TogglePhase::Committed;
        }
    }

    /// Transition `seq` failed; fall back to the last committed value.
    pub fn roll_back(&mut self, seq: u64) {
        if let TogglePhase::Pending { seq: current, .. } = self.phase
            && current == seq
        {
            self.phase = TogglePhase::RolledBack;
        }
    }

    /// Adopt the server value from a fresh snapshot. A pending change keeps
    /// its displayed value until it resolves.
    pub fn sync(&mut self, server: bool) {
        self.committed = server;
    }
}

impl Default for RegistrationToggle {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimistic_value_shown_while_pending() {
        let mut t = RegistrationToggle::new(false);
        let seq = t.begin(true).unwrap();
        assert!(t.displayed());
        assert_eq!(t.phase(), TogglePhase::Pending { seq, requested: true });
    }

    #[test]
    fn failure_restores_previous_value() {
        let mut t = RegistrationToggle::new(false);
        let seq = t.begin(true).unwrap();
        t.roll_back(seq);
        assert!(!t.displayed());
        assert_eq!(t.phase(), TogglePhase::RolledBack);

        let mut t = RegistrationToggle::new(true);
        let seq = t.begin(false).unwrap();
        t.roll_back(seq);
        assert!(t.displayed());
    }

    #[test]
    fn second_toggle_refused_while_pending() {
        let mut t = RegistrationToggle::new(false);
        assert!(t.begin(true).is_some());
        assert!(t.begin(false).is_none());
        assert!(t.displayed());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut t = RegistrationToggle::new(false);
        let first = t.begin(true).unwrap();
        t.commit(first);
        let second = t.begin(false).unwrap();
        t.roll_back(first);
        assert_eq!(t.phase(), TogglePhase::Pending { seq: second, requested: false });
        t.commit(second);
        assert!(!t.displayed());
        assert_eq!(t.phase(), TogglePhase::Committed);
    }

    #[test]
    fn sync_does_not_override_pending_display() {
        let mut t = RegistrationToggle::new(false);
        let seq = t.begin(true).unwrap();
        t.sync(false);
        assert!(t.displayed());
        t.roll_back(seq);
        assert!(!t.displayed());
    }
}
