//! Multi-select over the users table, scoped to what the actor may touch.

use std::collections::BTreeSet;

use super::Session;
use crate::model::{Role, User};

/// Whether `actor` may act on `user`: owners on everyone, admins on plain
/// users and on themselves.
pub fn is_selectable(actor: &Session, user: &User) -> bool {
    match actor.role {
        Role::Owner => true,
        Role::Admin => user.role == Role::User || user.username == actor.username,
        Role::User => false,
    }
}

/// Usernames `actor` may select, in snapshot order.
pub fn eligible_usernames<'a>(actor: &Session, users: &'a [User]) -> Vec<&'a str> {
    users
        .iter()
        .filter(|u| is_selectable(actor, u))
        .map(|u| u.username.as_str())
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.selected.contains(username)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Check or uncheck one user. Users outside the actor's scope are refused.
    pub fn set(&mut self, actor: &Session, user: &User, checked: bool) -> bool {
        if checked {
            if !is_selectable(actor, user) {
                return false;
            }
            self.selected.insert(user.username.clone());
        } else {
            self.selected.remove(&user.username);
        }
        true
    }

    /// Select exactly the eligible subset, or clear everything.
    pub fn set_all(&mut self, actor: &Session, users: &[User], checked: bool) {
        self.selected.clear();
        if checked {
            self.selected.extend(
                eligible_usernames(actor, users)
                    .into_iter()
                    .map(str::to_string),
            );
        }
    }

    /// True iff every eligible user is selected and there is at least one.
    pub fn all_selected(&self, actor: &Session, users: &[User]) -> bool {
        let eligible = eligible_usernames(actor, users).len();
        eligible > 0 && self.selected.len() == eligible
    }

    /// Selected usernames in the order they appear in `users`.
    pub fn ordered_in(&self, users: &[User]) -> Vec<String> {
        users
            .iter()
            .filter(|u| self.selected.contains(&u.username))
            .map(|u| u.username.clone())
            .collect()
    }

    /// Drop entries that no longer exist or are no longer selectable.
    pub fn retain_eligible(&mut self, actor: &Session, users: &[User]) {
        let eligible: BTreeSet<&str> = eligible_usernames(actor, users).into_iter().collect();
        self.selected.retain(|name| eligible.contains(name.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, role: Role) -> User {
        User {
            username: name.to_string(),
            role,
            banned: false,
            tags: None,
            enabled_apis: None,
        }
    }

    fn roster() -> Vec<User> {
        vec![
            user("root", Role::Owner),
            user("ada", Role::Admin),
            user("max", Role::Admin),
            user("alice", Role::User),
            user("bob", Role::User),
        ]
    }

    #[test]
    fn owner_selects_everyone() {
        let actor = Session::new("root", Role::Owner);
        let users = roster();
        let mut sel = Selection::new();
        sel.set_all(&actor, &users, true);
        assert_eq!(sel.len(), 5);
        assert!(sel.all_selected(&actor, &users));
    }

    #[test]
    fn admin_selects_users_and_self_only() {
        let actor = Session::new("ada", Role::Admin);
        let users = roster();
        let mut sel = Selection::new();
        sel.set_all(&actor, &users, true);
        assert_eq!(sel.ordered_in(&users), vec!["ada", "alice", "bob"]);
        assert!(!sel.contains("max"));
        assert!(!sel.contains("root"));
    }

    #[test]
    fn plain_user_selects_nothing() {
        let actor = Session::new("alice", Role::User);
        let users = roster();
        let mut sel = Selection::new();
        sel.set_all(&actor, &users, true);
        assert!(sel.is_empty());
        assert!(!sel.all_selected(&actor, &users));
    }

    #[test]
    fn all_selected_false_on_empty_roster() {
        let actor = Session::new("root", Role::Owner);
        let sel = Selection::new();
        assert!(!sel.all_selected(&actor, &[]));
    }

    #[test]
    fn partial_selection_is_not_all() {
        let actor = Session::new("root", Role::Owner);
        let users = roster();
        let mut sel = Selection::new();
        assert!(sel.set(&actor, &users[3], true));
        assert!(!sel.all_selected(&actor, &users));
        sel.set_all(&actor, &users, false);
        assert!(sel.is_empty());
    }

    #[test]
    fn admin_cannot_check_other_admin() {
        let actor = Session::new("ada", Role::Admin);
        let users = roster();
        let mut sel = Selection::new();
        assert!(!sel.set(&actor, &users[2], true));
        assert!(sel.is_empty());
    }

    #[test]
    fn retain_drops_vanished_users() {
        let actor = Session::new("root", Role::Owner);
        let mut users = roster();
        let mut sel = Selection::new();
        sel.set_all(&actor, &users, true);
        users.retain(|u| u.username != "bob");
        sel.retain_eligible(&actor, &users);
        assert_eq!(sel.len(), 4);
        assert!(!sel.contains("bob"));
    }
}
