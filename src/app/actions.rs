//! Operator-facing operations.
//!
//! Handlers only touch view state and return the [`Command`] to dispatch.
//! `None` means nothing is sent: validation failed, the target is out of
//! scope, or the same action is already in flight.

use super::dispatch::{Command, FollowUp};
use super::{
    AffectedUser, AppState, GroupForm, GroupFormFocus, ModalKind, ModalState, NewUserForm,
    Notice, RowAction, Session,
};
use crate::api::{ActionKey, AdminAction, GroupAction};
use crate::model::{Role, User};

/// Row actions `actor` may perform on `target`, in menu order.
pub fn available_actions(actor: &Session, target: &User) -> Vec<RowAction> {
    let is_self = target.username == actor.username;
    let ban = if target.banned {
        RowAction::Unban
    } else {
        RowAction::Ban
    };
    let mut out = Vec::new();
    match actor.role {
        Role::Owner => {
            if !is_self {
                out.push(ban);
                match target.role {
                    Role::User => out.push(RowAction::SetAdmin),
                    Role::Admin => out.push(RowAction::CancelAdmin),
                    Role::Owner => {}
                }
            }
            out.extend([
                RowAction::ChangePassword,
                RowAction::ConfigureApis,
                RowAction::ConfigureGroups,
            ]);
            if !is_self {
                out.push(RowAction::Delete);
            }
        }
        Role::Admin if target.role == Role::User => {
            out.extend([
                ban,
                RowAction::ChangePassword,
                RowAction::ConfigureApis,
                RowAction::ConfigureGroups,
                RowAction::Delete,
            ]);
        }
        Role::Admin if is_self => out.push(RowAction::ChangePassword),
        Role::Admin | Role::User => {}
    }
    out
}

/// Add `value` if absent, remove it if present.
pub fn toggle_entry(list: &mut Vec<String>, value: &str) {
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
    } else {
        list.push(value.to_string());
    }
}

fn close_on_success(kind: ModalKind, target: Option<&str>) -> Option<(ModalKind, Option<String>)> {
    Some((kind, target.map(str::to_string)))
}

impl AppState {
    /// Mark the command busy and hand it out, unless it already is.
    fn issue(&mut self, command: Command) -> Option<Command> {
        if !self.loading.start(command.key.clone()) {
            tracing::debug!(key = %command.key, "already in flight");
            return None;
        }
        Some(command)
    }

    fn permits(&self, username: &str, action: RowAction) -> bool {
        self.config
            .find_user(username)
            .is_some_and(|u| available_actions(&self.session, u).contains(&action))
    }

    /// Owners and admins manage accounts; plain users only look.
    pub fn is_manager(&self) -> bool {
        self.session.role != Role::User
    }

    pub fn refresh(&mut self) -> Option<Command> {
        self.issue(Command::refresh())
    }

    // Registration

    /// Show `value` immediately and send it; a failure reverts the display.
    pub fn toggle_allow_register(&mut self, value: bool) -> Option<Command> {
        if !self.loaded
            || !self.is_manager()
            || self.loading.is_busy(&ActionKey::new("setAllowRegister"))
        {
            return None;
        }
        let seq = self.registration.begin(value)?;
        self.issue(Command::mutate(
            AdminAction::SetAllowRegister {
                allow_register: value,
            },
            FollowUp {
                registration: Some(seq),
                success: Some("Registration setting updated".to_string()),
                ..FollowUp::default()
            },
        ))
    }

    // Selection

    pub fn handle_select_user(&mut self, username: &str, checked: bool) -> bool {
        let Some(user) = self.config.find_user(username) else {
            return false;
        };
        self.selection.set(&self.session, user, checked)
    }

    pub fn handle_select_all_users(&mut self, checked: bool) {
        self.selection
            .set_all(&self.session, &self.config.user_config.users, checked);
    }

    pub fn toggle_current_user_selection(&mut self) {
        if let Some(name) = self.current_user().map(|u| u.username.clone()) {
            let checked = !self.selection.contains(&name);
            self.handle_select_user(&name, checked);
        }
    }

    // Row menus

    pub fn open_user_actions(&mut self, username: &str) {
        let Some(user) = self.config.find_user(username) else {
            return;
        };
        let options = available_actions(&self.session, user);
        if options.is_empty() {
            self.notice = Some(Notice::error(format!("No actions available for {username}")));
            return;
        }
        self.open_modal(ModalState::UserActions {
            username: username.to_string(),
            options,
            selected: 0,
        });
    }

    pub fn open_group_actions(&mut self, name: &str) {
        self.open_modal(ModalState::GroupActions {
            name: name.to_string(),
            selected: 0,
        });
    }

    /// Perform a menu choice: immediate actions return a command, the rest
    /// open their dialog.
    pub fn run_row_action(&mut self, username: &str, action: RowAction) -> Option<Command> {
        match action {
            RowAction::Ban => self.ban_user(username),
            RowAction::Unban => self.unban_user(username),
            RowAction::SetAdmin => self.set_admin(username),
            RowAction::CancelAdmin => self.remove_admin(username),
            RowAction::ChangePassword => {
                self.show_change_password_form(username);
                None
            }
            RowAction::ConfigureApis => {
                self.configure_user_apis(username);
                None
            }
            RowAction::ConfigureGroups => {
                self.configure_user_groups(username);
                None
            }
            RowAction::Delete => {
                self.request_delete_user(username);
                None
            }
        }
    }

    // Single-user actions

    fn user_action(&mut self, username: &str, action: RowAction, message: String) -> Option<Command> {
        if !self.permits(username, action) {
            return None;
        }
        let target_username = username.to_string();
        let request = match action {
            RowAction::Ban => AdminAction::Ban { target_username },
            RowAction::Unban => AdminAction::Unban { target_username },
            RowAction::SetAdmin => AdminAction::SetAdmin { target_username },
            RowAction::CancelAdmin => AdminAction::CancelAdmin { target_username },
            _ => return None,
        };
        let cmd = self.issue(Command::mutate(
            request,
            FollowUp {
                success: Some(message),
                ..FollowUp::default()
            },
        ))?;
        if self.modal.as_ref().is_some_and(|m| m.kind() == ModalKind::UserActions) {
            self.close_modal();
        }
        Some(cmd)
    }

    pub fn ban_user(&mut self, username: &str) -> Option<Command> {
        self.user_action(username, RowAction::Ban, format!("Banned {username}"))
    }

    pub fn unban_user(&mut self, username: &str) -> Option<Command> {
        self.user_action(username, RowAction::Unban, format!("Unbanned {username}"))
    }

    pub fn set_admin(&mut self, username: &str) -> Option<Command> {
        self.user_action(username, RowAction::SetAdmin, format!("{username} is now an admin"))
    }

    pub fn remove_admin(&mut self, username: &str) -> Option<Command> {
        self.user_action(username, RowAction::CancelAdmin, format!("{username} is no longer an admin"))
    }

    // Add user

    pub fn open_add_user(&mut self) {
        if !self.is_manager() {
            return;
        }
        self.open_modal(ModalState::AddUser(NewUserForm::default()));
    }

    /// Submit the new-user form. Username and password are both required.
    pub fn submit_add_user(&mut self) -> Option<Command> {
        let Some(ModalState::AddUser(form)) = &self.modal else {
            return None;
        };
        let username = form.username.clone();
        if username.trim().is_empty() || form.password.is_empty() {
            return None;
        }
        let action = AdminAction::AddUser {
            target_username: username.clone(),
            target_password: form.password.clone(),
            user_group: form.group.clone().filter(|g| !g.is_empty()),
        };
        self.issue(Command::mutate(
            action,
            FollowUp {
                close: close_on_success(ModalKind::AddUser, None),
                success: Some(format!("Added user {username}")),
                ..FollowUp::default()
            },
        ))
    }

    // Change password

    pub fn show_change_password_form(&mut self, username: &str) {
        if !self.permits(username, RowAction::ChangePassword) {
            return;
        }
        self.open_modal(ModalState::ChangePassword {
            username: username.to_string(),
            password: String::new(),
        });
    }

    pub fn submit_change_password(&mut self) -> Option<Command> {
        let Some(ModalState::ChangePassword { username, password }) = &self.modal else {
            return None;
        };
        if username.is_empty() || password.is_empty() {
            return None;
        }
        let username = username.clone();
        let action = AdminAction::ChangePassword {
            target_username: username.clone(),
            target_password: password.clone(),
        };
        self.issue(Command::mutate(
            action,
            FollowUp {
                close: close_on_success(ModalKind::ChangePassword, Some(&username)),
                success: Some(format!("Password changed for {username}")),
                ..FollowUp::default()
            },
        ))
    }

    // Delete user

    pub fn request_delete_user(&mut self, username: &str) {
        if !self.permits(username, RowAction::Delete) {
            return;
        }
        self.open_modal(ModalState::DeleteUser {
            username: username.to_string(),
            selected: 1,
        });
    }

    pub fn confirm_delete_user(&mut self) -> Option<Command> {
        let Some(ModalState::DeleteUser { username, .. }) = &self.modal else {
            return None;
        };
        let username = username.clone();
        self.issue(Command::mutate(
            AdminAction::DeleteUser {
                target_username: username.clone(),
            },
            FollowUp {
                close: close_on_success(ModalKind::DeleteUser, Some(&username)),
                success: Some(format!("Deleted user {username}")),
                ..FollowUp::default()
            },
        ))
    }

    // Per-user sources

    pub fn configure_user_apis(&mut self, username: &str) {
        if !self.permits(username, RowAction::ConfigureApis) {
            return;
        }
        let apis = self
            .config
            .find_user(username)
            .map(|u| u.enabled_apis().to_vec())
            .unwrap_or_default();
        self.open_modal(ModalState::ConfigureApis {
            username: username.to_string(),
            apis,
            cursor: 0,
        });
    }

    pub fn save_user_apis(&mut self) -> Option<Command> {
        let Some(ModalState::ConfigureApis { username, apis, .. }) = &self.modal else {
            return None;
        };
        let username = username.clone();
        let action = AdminAction::UpdateUserApis {
            target_username: username.clone(),
            enabled_apis: apis.clone(),
        };
        self.issue(Command::mutate(
            action,
            FollowUp {
                close: close_on_success(ModalKind::ConfigureApis, Some(&username)),
                success: Some(format!("Sources updated for {username}")),
                ..FollowUp::default()
            },
        ))
    }

    // Per-user groups

    pub fn configure_user_groups(&mut self, username: &str) {
        if !self.permits(username, RowAction::ConfigureGroups) {
            return;
        }
        let groups = self
            .config
            .find_user(username)
            .map(|u| u.tags().to_vec())
            .unwrap_or_default();
        self.open_modal(ModalState::ConfigureUserGroups {
            username: username.to_string(),
            groups,
            cursor: 0,
        });
    }

    /// Replace `username`'s group list with `groups`.
    pub fn assign_user_groups(&mut self, username: &str, groups: Vec<String>) -> Option<Command> {
        let action = AdminAction::UpdateUserGroups {
            target_username: username.to_string(),
            user_groups: groups,
        };
        self.issue(Command::mutate(
            action,
            FollowUp {
                close: close_on_success(ModalKind::ConfigureUserGroups, Some(username)),
                success: Some("User groups assigned".to_string()),
                ..FollowUp::default()
            },
        ))
    }

    pub fn save_user_groups(&mut self) -> Option<Command> {
        let Some(ModalState::ConfigureUserGroups { username, groups, .. }) = &self.modal else {
            return None;
        };
        let (username, groups) = (username.clone(), groups.clone());
        self.assign_user_groups(&username, groups)
    }

    // Batch assignment

    pub fn open_batch_user_group(&mut self) {
        if !self.is_manager() || self.selection.is_empty() {
            return;
        }
        self.open_modal(ModalState::BatchUserGroup { cursor: 0 });
    }

    /// Leaving the batch dialog without applying also drops the selection.
    pub fn cancel_batch_user_group(&mut self) {
        self.selection.clear();
        self.close_modal();
    }

    /// Give every selected user exactly `group` (or no group).
    pub fn batch_set_user_group(&mut self, group: Option<&str>) -> Option<Command> {
        if self.selection.is_empty() {
            return None;
        }
        let usernames = self.selection.ordered_in(&self.config.user_config.users);
        let count = usernames.len();
        let user_groups: Vec<String> = group.map(|g| vec![g.to_string()]).unwrap_or_default();
        let label = group.unwrap_or("none").to_string();
        self.issue(Command::mutate(
            AdminAction::BatchUpdateUserGroups {
                usernames,
                user_groups,
            },
            FollowUp {
                close: close_on_success(ModalKind::BatchUserGroup, None),
                clear_selection: true,
                success: Some(format!("Set user group for {count} users: {label}")),
                ..FollowUp::default()
            },
        ))
    }

    /// Apply the group under the batch dialog's cursor.
    pub fn submit_batch_user_group(&mut self) -> Option<Command> {
        let Some(ModalState::BatchUserGroup { cursor }) = &self.modal else {
            return None;
        };
        let group = match *cursor {
            0 => None,
            n => Some(self.config.user_config.tags.get(n - 1)?.name.clone()),
        };
        self.batch_set_user_group(group.as_deref())
    }

    // Group CRUD

    fn user_group_action(
        &mut self,
        action: GroupAction,
        name: &str,
        enabled_apis: Option<Vec<String>>,
    ) -> Option<Command> {
        let (close, message) = match action {
            GroupAction::Add => (close_on_success(ModalKind::AddGroup, None), "User group added"),
            GroupAction::Edit => (
                close_on_success(ModalKind::EditGroup, Some(name)),
                "User group updated",
            ),
            GroupAction::Delete => (
                close_on_success(ModalKind::DeleteGroup, Some(name)),
                "User group deleted",
            ),
        };
        self.issue(Command::mutate(
            AdminAction::UserGroup {
                group_action: action,
                group_name: name.to_string(),
                enabled_apis,
            },
            FollowUp {
                close,
                success: Some(message.to_string()),
                ..FollowUp::default()
            },
        ))
    }

    pub fn open_add_group(&mut self) {
        if !self.is_manager() {
            return;
        }
        self.open_modal(ModalState::AddGroup {
            form: GroupForm::default(),
            focus: GroupFormFocus::Name,
            cursor: 0,
        });
    }

    /// Create a group. Blank names are dropped without a request; others go as typed.
    pub fn add_user_group(&mut self, name: &str, enabled_apis: Vec<String>) -> Option<Command> {
        if name.trim().is_empty() {
            return None;
        }
        self.user_group_action(GroupAction::Add, name, Some(enabled_apis))
    }

    pub fn submit_add_group(&mut self) -> Option<Command> {
        let Some(ModalState::AddGroup { form, .. }) = &self.modal else {
            return None;
        };
        let form = form.clone();
        self.add_user_group(&form.name, form.enabled_apis)
    }

    pub fn start_edit_user_group(&mut self, name: &str) {
        let busy = self
            .loading
            .is_busy(&ActionKey::group(GroupAction::Edit, name));
        if !self.is_manager() || busy {
            return;
        }
        let Some(group) = self.config.find_group(name) else {
            return;
        };
        let form = GroupForm {
            name: group.name.clone(),
            enabled_apis: group.enabled_apis.clone(),
        };
        self.open_modal(ModalState::EditGroup { form, cursor: 0 });
    }

    /// Replace a group's whole source list.
    pub fn edit_user_group(&mut self, name: &str, enabled_apis: Vec<String>) -> Option<Command> {
        if name.trim().is_empty() {
            return None;
        }
        self.user_group_action(GroupAction::Edit, name, Some(enabled_apis))
    }

    pub fn submit_edit_group(&mut self) -> Option<Command> {
        let Some(ModalState::EditGroup { form, .. }) = &self.modal else {
            return None;
        };
        let form = form.clone();
        self.edit_user_group(&form.name, form.enabled_apis)
    }

    /// Open the delete confirmation listing every user tagged with `name`.
    pub fn request_delete_user_group(&mut self, name: &str) {
        if !self.is_manager() || self.config.find_group(name).is_none() {
            return;
        }
        let affected_users = self
            .config
            .users_in_group(name)
            .into_iter()
            .map(|u| AffectedUser {
                username: u.username.clone(),
                role: u.role,
            })
            .collect();
        self.open_modal(ModalState::DeleteGroup {
            name: name.to_string(),
            affected_users,
            selected: 1,
        });
    }

    pub fn confirm_delete_user_group(&mut self) -> Option<Command> {
        let Some(ModalState::DeleteGroup { name, .. }) = &self.modal else {
            return None;
        };
        let name = name.clone();
        self.user_group_action(GroupAction::Delete, &name, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, role: Role, banned: bool) -> User {
        User {
            username: name.into(),
            role,
            banned,
            tags: None,
            enabled_apis: None,
        }
    }

    #[test]
    fn owner_menu_for_plain_user() {
        let actor = Session::new("root", Role::Owner);
        let acts = available_actions(&actor, &user("alice", Role::User, false));
        assert_eq!(
            acts,
            vec![
                RowAction::Ban,
                RowAction::SetAdmin,
                RowAction::ChangePassword,
                RowAction::ConfigureApis,
                RowAction::ConfigureGroups,
                RowAction::Delete,
            ]
        );
    }

    #[test]
    fn owner_cannot_ban_or_delete_self() {
        let actor = Session::new("root", Role::Owner);
        let acts = available_actions(&actor, &user("root", Role::Owner, false));
        assert!(!acts.contains(&RowAction::Ban));
        assert!(!acts.contains(&RowAction::Delete));
        assert!(acts.contains(&RowAction::ChangePassword));
    }

    #[test]
    fn admin_scope() {
        let actor = Session::new("ada", Role::Admin);
        let banned = available_actions(&actor, &user("bob", Role::User, true));
        assert_eq!(banned[0], RowAction::Unban);
        assert!(!banned.contains(&RowAction::SetAdmin));
        assert_eq!(
            available_actions(&actor, &user("ada", Role::Admin, false)),
            vec![RowAction::ChangePassword]
        );
        assert!(available_actions(&actor, &user("max", Role::Admin, false)).is_empty());
        assert!(available_actions(&actor, &user("root", Role::Owner, false)).is_empty());
    }

    #[test]
    fn toggle_entry_adds_and_removes() {
        let mut v = vec!["a".to_string()];
        toggle_entry(&mut v, "b");
        toggle_entry(&mut v, "a");
        assert_eq!(v, vec!["b".to_string()]);
    }
}
