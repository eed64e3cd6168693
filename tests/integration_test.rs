// Integration tests for usrcfg-admin
// HTTP behaviour runs against a wiremock server; config files use temp paths.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use usrcfg_admin::api::{AdminAction, AdminBackend, HttpBackend};
use usrcfg_admin::app::dispatch::{self, Command, Completion, FollowUp, execute};
use usrcfg_admin::app::{AppState, Keymap, ModalKind, Session, Theme};
use usrcfg_admin::model::Role;

fn snapshot_json(allow_register: bool) -> serde_json::Value {
    json!({
        "UserConfig": {
            "AllowRegister": allow_register,
            "Users": [
                {"username": "root", "role": "owner"},
                {"username": "alice", "role": "user", "tags": ["vip"]},
                {"username": "bob", "role": "user", "tags": ["vip"], "banned": true}
            ],
            "Tags": [{"name": "vip", "enabledApis": ["douban"]}, {"name": "premium"}]
        },
        "SourceConfig": [
            {"key": "douban", "name": "Douban", "api": "https://movie.douban.example/api", "disabled": false}
        ]
    })
}

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&server.uri(), None, Duration::from_secs(5)).expect("client")
}

async fn mount_config(server: &MockServer, allow_register: bool, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/admin/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json(allow_register)))
        .expect(times)
        .mount(server)
        .await;
}

// 1) Successful mutation posts the body once and refreshes exactly once
#[tokio::test]
async fn batch_assignment_posts_then_refreshes_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/user"))
        .and(body_json(json!({
            "action": "batchUpdateUserGroups",
            "usernames": ["alice", "bob"],
            "userGroups": ["premium"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_config(&server, false, 1).await;

    let b = backend(&server);
    let action = AdminAction::BatchUpdateUserGroups {
        usernames: vec!["alice".into(), "bob".into()],
        user_groups: vec!["premium".into()],
    };
    let snap = execute(&b, Some(&action)).await.expect("mutation succeeds");
    assert_eq!(snap.user_config.users.len(), 3);
    assert_eq!(snap.source_config[0].display_label(), "Douban (movie.douban.example)");
}

// 2) Server-provided error text is surfaced and no refresh happens
#[tokio::test]
async fn rejection_uses_server_error_and_skips_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/user"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "user already exists"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_config(&server, false, 0).await;

    let b = backend(&server);
    let action = AdminAction::AddUser {
        target_username: "alice".into(),
        target_password: "pw".into(),
        user_group: None,
    };
    let err = execute(&b, Some(&action)).await.unwrap_err();
    assert_eq!(err.to_string(), "user already exists");
}

// 3) No error body: message is synthesized from the status
#[tokio::test]
async fn rejection_without_body_synthesizes_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/user"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let b = backend(&server);
    let action = AdminAction::Ban {
        target_username: "alice".into(),
    };
    let err = b.submit(&action).await.unwrap_err();
    assert_eq!(err.to_string(), "operation failed: 500");
}

// 4) Cookie is forwarded on both endpoints
#[tokio::test]
async fn auth_cookie_sent_with_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/user"))
        .and(header("cookie", "auth=abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/config"))
        .and(header("cookie", "auth=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json(true)))
        .expect(1)
        .mount(&server)
        .await;

    let b = HttpBackend::new(&server.uri(), Some("auth=abc".into()), Duration::from_secs(5))
        .expect("client");
    let action = AdminAction::SetAllowRegister {
        allow_register: true,
    };
    let snap = execute(&b, Some(&action)).await.expect("mutation succeeds");
    assert!(snap.user_config.allow_register);
}

// 5) Refresh failure after a good POST rolls the registration toggle back
#[tokio::test]
async fn failed_refresh_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/user"))
        .and(body_json(json!({"action": "setAllowRegister", "allowRegister": true})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/config"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "storage offline"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend: Arc<dyn AdminBackend> = Arc::new(backend(&server));
    let mut app = AppState::new(Session::new("root", Role::Owner));
    app.loaded = true;
    let cmd = app.toggle_allow_register(true).expect("toggle starts");
    assert!(app.registration.displayed());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Completion>();
    dispatch::spawn(backend, cmd, tx);
    let done = rx.recv().await.expect("completion");
    app.apply_completion(done);

    assert!(!app.registration.displayed());
    assert_eq!(app.notice.as_ref().unwrap().message, "storage offline");
    assert!(app.loading.is_empty());
}

// 6) Full loop: spawn a command, fold the completion into state
#[tokio::test]
async fn completion_reconciles_state_and_closes_dialog() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_config(&server, false, 1).await;

    let backend: Arc<dyn AdminBackend> = Arc::new(backend(&server));
    let mut app = AppState::new(Session::new("root", Role::Owner));
    app.open_modal(usrcfg_admin::app::ModalState::BatchUserGroup { cursor: 0 });
    let cmd = Command::mutate(
        AdminAction::BatchUpdateUserGroups {
            usernames: vec!["alice".into()],
            user_groups: vec![],
        },
        FollowUp {
            close: Some((ModalKind::BatchUserGroup, None)),
            clear_selection: true,
            ..FollowUp::default()
        },
    );
    assert!(app.loading.start(cmd.key.clone()));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Completion>();
    dispatch::spawn(backend, cmd, tx);
    let done = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("in time")
        .expect("completion");
    app.apply_completion(done);

    assert!(app.loaded);
    assert!(app.modal.is_none());
    assert_eq!(app.users.len(), 3);
    assert_eq!(app.groups.len(), 2);
}

// 7) Theme and keybinding files are created with defaults and read back
#[test]
fn theme_and_keymap_files_roundtrip() {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("usrcfg_{}_{}", std::process::id(), nonce));
    let theme_path = dir.join("theme.conf");
    let keys_path = dir.join("keybinds.conf");

    let created = Theme::load_or_init(&theme_path);
    assert!(theme_path.exists());
    assert_eq!(Theme::from_file(&theme_path).expect("read theme"), created);

    let km = Keymap::load_or_init(&keys_path);
    assert!(keys_path.exists());
    let reread = Keymap::from_file(&keys_path).expect("read keymap");
    for action in [
        usrcfg_admin::app::keymap::KeyAction::Quit,
        usrcfg_admin::app::keymap::KeyAction::BatchAssign,
        usrcfg_admin::app::keymap::KeyAction::Refresh,
    ] {
        assert_eq!(km.keys_for(action), reread.keys_for(action));
    }

    let _ = std::fs::remove_dir_all(&dir);
}
