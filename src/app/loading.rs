use std::collections::BTreeSet;

use crate::api::{ActionKey, KeyTarget};

/// Set of action keys with a request in flight.
#[derive(Clone, Debug, Default)]
pub struct LoadingTracker {
    busy: BTreeSet<ActionKey>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` busy. Returns false when it already was.
    pub fn start(&mut self, key: ActionKey) -> bool {
        self.busy.insert(key)
    }

    pub fn finish(&mut self, key: &ActionKey) {
        self.busy.remove(key);
    }

    pub fn is_busy(&self, key: &ActionKey) -> bool {
        self.busy.contains(key)
    }

    /// Any in-flight operation on user `username`; used for row markers.
    pub fn any_for_user(&self, username: &str) -> bool {
        self.busy
            .iter()
            .any(|k| matches!(k.target(), Some(KeyTarget::User(u)) if u == username))
    }

    pub fn any_for_group(&self, name: &str) -> bool {
        self.busy
            .iter()
            .any(|k| matches!(k.target(), Some(KeyTarget::Group(g)) if g == name))
    }

    pub fn len(&self) -> usize {
        self.busy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.busy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_keys_run_together() {
        let mut t = LoadingTracker::new();
        assert!(t.start(ActionKey::targeted("banUser", "alice")));
        assert!(t.start(ActionKey::targeted("banUser", "bob")));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn duplicate_key_is_refused_until_finished() {
        let mut t = LoadingTracker::new();
        let key = ActionKey::new("addUser");
        assert!(t.start(key.clone()));
        assert!(!t.start(key.clone()));
        t.finish(&key);
        assert!(!t.is_busy(&key));
        assert!(t.start(key));
    }

    #[test]
    fn row_marker_matches_exact_user() {
        let mut t = LoadingTracker::new();
        t.start(ActionKey::targeted("setAdmin", "bob"));
        assert!(t.any_for_user("bob"));
        assert!(!t.any_for_user("alice"));
        assert!(!t.any_for_group("bob"));
    }

    #[test]
    fn user_and_group_markers_do_not_bleed() {
        let mut t = LoadingTracker::new();
        t.start(ActionKey::group(crate::api::GroupAction::Edit, "bob"));
        t.start(ActionKey::targeted("banUser", "x_bob"));
        assert!(t.any_for_group("bob"));
        assert!(!t.any_for_user("bob"));
        assert!(t.any_for_user("x_bob"));
    }
}
