//! Mutate-then-refresh: every change is one POST followed by one snapshot
//! fetch, and the answer is folded back into `AppState` on the UI loop.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::{AppState, ModalKind, Notice};
use crate::api::{ActionError, ActionKey, AdminAction, AdminBackend};
use crate::model::ConfigSnapshot;
use crate::search::apply_search;

/// What to do locally once a command succeeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FollowUp {
    /// Dialog to close, and the user/group it must be about.
    pub close: Option<(ModalKind, Option<String>)>,
    pub clear_selection: bool,
    /// Registration transition this command settles.
    pub registration: Option<u64>,
    pub success: Option<String>,
}

/// One unit of work for the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub key: ActionKey,
    /// `None` means refresh only.
    pub action: Option<AdminAction>,
    pub follow_up: FollowUp,
}

impl Command {
    pub fn mutate(action: AdminAction, follow_up: FollowUp) -> Self {
        Self {
            key: action.key(),
            action: Some(action),
            follow_up,
        }
    }

    pub fn refresh() -> Self {
        Self {
            key: ActionKey::refresh(),
            action: None,
            follow_up: FollowUp::default(),
        }
    }
}

/// Result of a command, sent back to the UI loop.
#[derive(Clone, Debug)]
pub struct Completion {
    pub key: ActionKey,
    pub follow_up: FollowUp,
    pub result: Result<ConfigSnapshot, ActionError>,
}

/// Send `action` (if any), then fetch the snapshot. A failed POST skips the fetch.
pub async fn execute(
    backend: &dyn AdminBackend,
    action: Option<&AdminAction>,
) -> Result<ConfigSnapshot, ActionError> {
    if let Some(action) = action {
        backend.submit(action).await?;
    }
    backend.fetch_config().await
}

/// Run `command` on the runtime and report its completion on `tx`.
pub fn spawn(backend: Arc<dyn AdminBackend>, command: Command, tx: UnboundedSender<Completion>) {
    tokio::spawn(async move {
        tracing::info!(key = %command.key, "dispatching");
        let result = execute(backend.as_ref(), command.action.as_ref()).await;
        match &result {
            Ok(_) => tracing::info!(key = %command.key, "completed"),
            Err(e) => tracing::warn!(key = %command.key, error = %e, "failed"),
        }
        let done = Completion {
            key: command.key,
            follow_up: command.follow_up,
            result,
        };
        if tx.send(done).is_err() {
            tracing::debug!("ui loop gone; dropping completion");
        }
    });
}

impl AppState {
    /// Fold a finished command into the state.
    pub fn apply_completion(&mut self, done: Completion) {
        self.loading.finish(&done.key);
        match done.result {
            Ok(snapshot) => {
                if let Some(seq) = done.follow_up.registration {
                    self.registration.commit(seq);
                }
                self.reconcile(snapshot);
                if let Some((kind, target)) = &done.follow_up.close {
                    let still_open = self
                        .modal
                        .as_ref()
                        .is_some_and(|m| m.kind() == *kind && m.target() == target.as_deref());
                    if still_open {
                        self.close_modal();
                    }
                }
                if done.follow_up.clear_selection {
                    self.selection.clear();
                }
                if let Some(msg) = done.follow_up.success {
                    self.notice = Some(Notice::success(msg));
                }
            }
            Err(err) => {
                if let Some(seq) = done.follow_up.registration {
                    self.registration.roll_back(seq);
                }
                self.notice = Some(Notice::error(err.to_string()));
            }
        }
    }

    /// Replace the snapshot and re-derive everything shown from it.
    pub fn reconcile(&mut self, snapshot: ConfigSnapshot) {
        self.registration.sync(snapshot.user_config.allow_register);
        self.config = snapshot;
        self.loaded = true;
        self.selection
            .retain_eligible(&self.session, &self.config.user_config.users);
        apply_search(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Session;
    use crate::model::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        submitted: Mutex<Vec<AdminAction>>,
        fetches: Mutex<usize>,
        reject: bool,
    }

    #[async_trait]
    impl AdminBackend for Recorder {
        async fn submit(&self, action: &AdminAction) -> Result<(), ActionError> {
            self.submitted.lock().unwrap().push(action.clone());
            if self.reject {
                Err(ActionError::rejected(400, Some("nope".into())))
            } else {
                Ok(())
            }
        }

        async fn fetch_config(&self) -> Result<ConfigSnapshot, ActionError> {
            *self.fetches.lock().unwrap() += 1;
            Ok(ConfigSnapshot::default())
        }
    }

    #[tokio::test]
    async fn success_fetches_once() {
        let backend = Recorder::default();
        let action = AdminAction::Ban { target_username: "alice".into() };
        execute(&backend, Some(&action)).await.unwrap();
        assert_eq!(backend.submitted.lock().unwrap().len(), 1);
        assert_eq!(*backend.fetches.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn rejection_skips_refresh() {
        let backend = Recorder { reject: true, ..Default::default() };
        let action = AdminAction::Ban { target_username: "alice".into() };
        let err = execute(&backend, Some(&action)).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(*backend.fetches.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn spawned_command_reports_completion() {
        let backend: Arc<dyn AdminBackend> = Arc::new(Recorder::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        spawn(backend, Command::refresh(), tx);
        let done = rx.recv().await.unwrap();
        assert_eq!(done.key, ActionKey::refresh());
        assert!(done.result.is_ok());
    }

    #[test]
    fn failure_keeps_unrelated_state() {
        let mut app = AppState::new(Session::new("root", Role::Owner));
        let key = ActionKey::targeted("banUser", "alice");
        app.loading.start(key.clone());
        app.apply_completion(Completion {
            key: key.clone(),
            follow_up: FollowUp::default(),
            result: Err(ActionError::Network("timed out".into())),
        });
        assert!(!app.loading.is_busy(&key));
        assert_eq!(app.notice.as_ref().unwrap().message, "request failed: timed out");
        assert!(!app.loaded);
    }
}
