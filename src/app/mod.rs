//! Application state types and entry glue.
//!
//! `AppState` is the single owner of everything the screen shows. The server
//! snapshot in `config` is never edited locally; handlers in [`actions`]
//! produce [`dispatch::Command`]s and [`dispatch`] folds the answers back in.
//!
pub mod actions;
pub mod dispatch;
pub mod keymap;
pub mod loading;
pub mod registration;
pub mod selection;
pub mod theme;
pub mod update;

use std::time::{Duration, Instant};

use crate::model::{ConfigSnapshot, Role, User, UserGroup};

pub use keymap::Keymap;
pub use loading::LoadingTracker;
pub use registration::{RegistrationToggle, TogglePhase};
pub use selection::Selection;
pub use theme::Theme;

/// How long a success notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Who is operating the console. Passed in at startup, never looked up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Top-level active tab in the UI.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActiveTab {
    Users,
    Groups,
}

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Per-row operations offered in the user actions menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowAction {
    Ban,
    Unban,
    SetAdmin,
    CancelAdmin,
    ChangePassword,
    ConfigureApis,
    ConfigureGroups,
    Delete,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Ban => "Ban",
            RowAction::Unban => "Unban",
            RowAction::SetAdmin => "Promote to admin",
            RowAction::CancelAdmin => "Revoke admin",
            RowAction::ChangePassword => "Change password",
            RowAction::ConfigureApis => "Configure sources",
            RowAction::ConfigureGroups => "Configure groups",
            RowAction::Delete => "Delete",
        }
    }
}

/// Focusable fields of the new-user form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NewUserField {
    #[default]
    Username,
    Password,
    Group,
}

impl NewUserField {
    pub fn next(self) -> Self {
        match self {
            NewUserField::Username => NewUserField::Password,
            NewUserField::Password => NewUserField::Group,
            NewUserField::Group => NewUserField::Username,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewUserForm {
    pub username: String,
    pub password: String,
    /// Initial group; `None` means no group (unrestricted).
    pub group: Option<String>,
    pub focus: NewUserField,
}

/// Focus inside the add-group form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum GroupFormFocus {
    #[default]
    Name,
    Sources,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupForm {
    pub name: String,
    pub enabled_apis: Vec<String>,
}

/// A user shown in the delete-group confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectedUser {
    pub username: String,
    pub role: Role,
}

/// The one dialog currently open, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    UserActions {
        username: String,
        options: Vec<RowAction>,
        selected: usize,
    },
    GroupActions {
        name: String,
        selected: usize,
    },
    AddUser(NewUserForm),
    ChangePassword {
        username: String,
        password: String,
    },
    DeleteUser {
        username: String,
        selected: usize,
    },
    AddGroup {
        form: GroupForm,
        focus: GroupFormFocus,
        cursor: usize,
    },
    EditGroup {
        form: GroupForm,
        cursor: usize,
    },
    DeleteGroup {
        name: String,
        affected_users: Vec<AffectedUser>,
        selected: usize,
    },
    ConfigureApis {
        username: String,
        apis: Vec<String>,
        cursor: usize,
    },
    ConfigureUserGroups {
        username: String,
        groups: Vec<String>,
        cursor: usize,
    },
    /// Cursor 0 is "no group", `n` is the n-th tag.
    BatchUserGroup {
        cursor: usize,
    },
    Help {
        scroll: u16,
    },
}

/// Discriminant of [`ModalState`], used to close the right dialog on success.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModalKind {
    UserActions,
    GroupActions,
    AddUser,
    ChangePassword,
    DeleteUser,
    AddGroup,
    EditGroup,
    DeleteGroup,
    ConfigureApis,
    ConfigureUserGroups,
    BatchUserGroup,
    Help,
}

impl ModalState {
    pub fn kind(&self) -> ModalKind {
        match self {
            ModalState::UserActions { .. } => ModalKind::UserActions,
            ModalState::GroupActions { .. } => ModalKind::GroupActions,
            ModalState::AddUser(_) => ModalKind::AddUser,
            ModalState::ChangePassword { .. } => ModalKind::ChangePassword,
            ModalState::DeleteUser { .. } => ModalKind::DeleteUser,
            ModalState::AddGroup { .. } => ModalKind::AddGroup,
            ModalState::EditGroup { .. } => ModalKind::EditGroup,
            ModalState::DeleteGroup { .. } => ModalKind::DeleteGroup,
            ModalState::ConfigureApis { .. } => ModalKind::ConfigureApis,
            ModalState::ConfigureUserGroups { .. } => ModalKind::ConfigureUserGroups,
            ModalState::BatchUserGroup { .. } => ModalKind::BatchUserGroup,
            ModalState::Help { .. } => ModalKind::Help,
        }
    }

    /// The user or group this dialog is about, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            ModalState::UserActions { username, .. }
            | ModalState::ChangePassword { username, .. }
            | ModalState::DeleteUser { username, .. }
            | ModalState::ConfigureApis { username, .. }
            | ModalState::ConfigureUserGroups { username, .. } => Some(username),
            ModalState::GroupActions { name, .. } | ModalState::DeleteGroup { name, .. } => {
                Some(name)
            }
            ModalState::EditGroup { form, .. } => Some(&form.name),
            ModalState::AddUser(_)
            | ModalState::AddGroup { .. }
            | ModalState::BatchUserGroup { .. }
            | ModalState::Help { .. } => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message in the status bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: Instant,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    /// Success notices time out; errors wait for a key press.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.kind == NoticeKind::Success && now.duration_since(self.shown_at) >= NOTICE_TTL
    }
}

pub struct AppState {
    pub session: Session,
    pub config: ConfigSnapshot,
    /// False until the first snapshot arrives.
    pub loaded: bool,
    pub users: Vec<User>,
    pub groups: Vec<UserGroup>,
    pub active_tab: ActiveTab,
    pub selected_user_index: usize,
    pub selected_group_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub selection: Selection,
    pub loading: LoadingTracker,
    pub registration: RegistrationToggle,
    pub notice: Option<Notice>,
    pub should_quit: bool,
}

impl AppState {
    /// Empty state for `session`; the first refresh fills it in.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            config: ConfigSnapshot::default(),
            loaded: false,
            users: Vec::new(),
            groups: Vec::new(),
            active_tab: ActiveTab::Users,
            selected_user_index: 0,
            selected_group_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme: Theme::mocha(),
            keymap: Keymap::default(),
            modal: None,
            selection: Selection::new(),
            loading: LoadingTracker::new(),
            registration: RegistrationToggle::default(),
            notice: None,
            should_quit: false,
        }
    }

    /// State already reconciled against `config`.
    pub fn with_config(session: Session, config: ConfigSnapshot) -> Self {
        let mut app = Self::new(session);
        app.reconcile(config);
        app
    }

    pub fn current_user(&self) -> Option<&User> {
        self.users.get(self.selected_user_index)
    }

    pub fn current_group(&self) -> Option<&UserGroup> {
        self.groups.get(self.selected_group_index)
    }

    /// Header indicator: every selectable user is checked.
    pub fn select_all_users(&self) -> bool {
        self.selection
            .all_selected(&self.session, &self.config.user_config.users)
    }

    pub fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn expire_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
        }
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
