//! Mutation requests understood by the admin endpoint.
//!
//! Each variant serializes to the flat JSON body the server expects, with the
//! variant name carried in the `action` field and only the fields that action
//! needs.

use serde::Serialize;
use std::fmt;

/// Sub-operation of the `userGroup` action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupAction {
    Add,
    Edit,
    Delete,
}

impl GroupAction {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupAction::Add => "add",
            GroupAction::Edit => "edit",
            GroupAction::Delete => "delete",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all_fields = "camelCase")]
pub enum AdminAction {
    #[serde(rename = "add")]
    AddUser {
        target_username: String,
        target_password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_group: Option<String>,
    },
    #[serde(rename = "ban")]
    Ban { target_username: String },
    #[serde(rename = "unban")]
    Unban { target_username: String },
    #[serde(rename = "setAdmin")]
    SetAdmin { target_username: String },
    #[serde(rename = "cancelAdmin")]
    CancelAdmin { target_username: String },
    #[serde(rename = "changePassword")]
    ChangePassword {
        target_username: String,
        target_password: String,
    },
    #[serde(rename = "deleteUser")]
    DeleteUser { target_username: String },
    #[serde(rename = "userGroup")]
    UserGroup {
        group_action: GroupAction,
        group_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        enabled_apis: Option<Vec<String>>,
    },
    #[serde(rename = "updateUserGroups")]
    UpdateUserGroups {
        target_username: String,
        user_groups: Vec<String>,
    },
    #[serde(rename = "batchUpdateUserGroups")]
    BatchUpdateUserGroups {
        usernames: Vec<String>,
        user_groups: Vec<String>,
    },
    #[serde(rename = "updateUserApis")]
    UpdateUserApis {
        target_username: String,
        enabled_apis: Vec<String>,
    },
    #[serde(rename = "setAllowRegister")]
    SetAllowRegister { allow_register: bool },
}

impl AdminAction {
    /// Busy key for this action: the action name plus its target.
    pub fn key(&self) -> ActionKey {
        match self {
            AdminAction::AddUser { .. } => ActionKey::new("addUser"),
            AdminAction::Ban { target_username } => ActionKey::targeted("banUser", target_username),
            AdminAction::Unban { target_username } => {
                ActionKey::targeted("unbanUser", target_username)
            }
            AdminAction::SetAdmin { target_username } => {
                ActionKey::targeted("setAdmin", target_username)
            }
            AdminAction::CancelAdmin { target_username } => {
                ActionKey::targeted("removeAdmin", target_username)
            }
            AdminAction::ChangePassword { target_username, .. } => {
                ActionKey::targeted("changePassword", target_username)
            }
            AdminAction::DeleteUser { target_username } => {
                ActionKey::targeted("deleteUser", target_username)
            }
            AdminAction::UserGroup {
                group_action,
                group_name,
                ..
            } => ActionKey::group(*group_action, group_name),
            AdminAction::UpdateUserGroups { target_username, .. } => {
                ActionKey::targeted("saveUserGroups", target_username)
            }
            AdminAction::BatchUpdateUserGroups { .. } => ActionKey::new("batchSetUserGroup"),
            AdminAction::UpdateUserApis { target_username, .. } => {
                ActionKey::targeted("saveUserApis", target_username)
            }
            AdminAction::SetAllowRegister { .. } => ActionKey::new("setAllowRegister"),
        }
    }

    /// Wire name of the action, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            AdminAction::AddUser { .. } => "add",
            AdminAction::Ban { .. } => "ban",
            AdminAction::Unban { .. } => "unban",
            AdminAction::SetAdmin { .. } => "setAdmin",
            AdminAction::CancelAdmin { .. } => "cancelAdmin",
            AdminAction::ChangePassword { .. } => "changePassword",
            AdminAction::DeleteUser { .. } => "deleteUser",
            AdminAction::UserGroup { .. } => "userGroup",
            AdminAction::UpdateUserGroups { .. } => "updateUserGroups",
            AdminAction::BatchUpdateUserGroups { .. } => "batchUpdateUserGroups",
            AdminAction::UpdateUserApis { .. } => "updateUserApis",
            AdminAction::SetAllowRegister { .. } => "setAllowRegister",
        }
    }
}

/// What an in-flight operation is about, for per-row busy markers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyTarget {
    User(String),
    Group(String),
}

/// Identifies one in-flight operation, e.g. `banUser_alice`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKey {
    name: String,
    target: Option<KeyTarget>,
}

impl ActionKey {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: None,
        }
    }

    pub fn targeted(name: &str, username: &str) -> Self {
        Self {
            name: name.to_string(),
            target: Some(KeyTarget::User(username.to_string())),
        }
    }

    pub fn group(action: GroupAction, group: &str) -> Self {
        Self {
            name: format!("userGroup_{}", action.as_str()),
            target: Some(KeyTarget::Group(group.to_string())),
        }
    }

    pub fn refresh() -> Self {
        Self::new("refreshConfig")
    }

    pub fn target(&self) -> Option<&KeyTarget> {
        self.target.as_ref()
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            None => f.write_str(&self.name),
            Some(KeyTarget::User(t) | KeyTarget::Group(t)) => write!(f, "{}_{}", self.name, t),
        }
    }
}
