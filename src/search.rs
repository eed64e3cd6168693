use crate::app::AppState;
use crate::model::{User, UserGroup};

fn user_matches(u: &User, q: &str) -> bool {
    u.username.to_lowercase().contains(q)
        || u.role.as_str().contains(q)
        || u.tags().iter().any(|t| t.to_lowercase().contains(q))
}

fn group_matches(g: &UserGroup, q: &str) -> bool {
    g.name.to_lowercase().contains(q)
        || g.enabled_apis.iter().any(|a| a.to_lowercase().contains(q))
}

/// Rebuild the visible user and group lists from the snapshot and the query.
pub fn apply_search(app: &mut AppState) {
    let q = app.search_query.trim().to_lowercase();
    let cfg = &app.config.user_config;
    if q.is_empty() {
        app.users = cfg.users.clone();
        app.groups = cfg.tags.clone();
    } else {
        app.users = cfg
            .users
            .iter()
            .filter(|u| user_matches(u, &q))
            .cloned()
            .collect();
        app.groups = cfg
            .tags
            .iter()
            .filter(|g| group_matches(g, &q))
            .cloned()
            .collect();
    }
    app.selected_user_index = app.selected_user_index.min(app.users.len().saturating_sub(1));
    app.selected_group_index = app
        .selected_group_index
        .min(app.groups.len().saturating_sub(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Session;
    use crate::model::{ConfigSnapshot, Role, UserConfig};

    fn mk_user(name: &str, role: Role, tags: &[&str]) -> User {
        User {
            username: name.to_string(),
            role,
            banned: false,
            tags: Some(tags.iter().map(|s| s.to_string()).collect()),
            enabled_apis: None,
        }
    }

    fn mk_group(name: &str, apis: &[&str]) -> UserGroup {
        UserGroup {
            name: name.to_string(),
            enabled_apis: apis.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn mk_app() -> AppState {
        let config = ConfigSnapshot {
            user_config: UserConfig {
                allow_register: false,
                users: vec![
                    mk_user("root", Role::Owner, &[]),
                    mk_user("alice", Role::User, &["vip"]),
                    mk_user("bob", Role::User, &["free"]),
                ],
                tags: vec![mk_group("vip", &["douban", "heimuer"]), mk_group("free", &[])],
            },
            source_config: vec![],
        };
        AppState::with_config(Session::new("root", Role::Owner), config)
    }

    #[test]
    fn search_users_by_name_role_or_tag() {
        let mut app = mk_app();
        app.search_query = "BoB".to_string();
        apply_search(&mut app);
        assert_eq!(app.users.len(), 1);
        assert_eq!(app.users[0].username, "bob");

        app.search_query = "vip".to_string();
        apply_search(&mut app);
        assert_eq!(app.users.len(), 1);
        assert_eq!(app.users[0].username, "alice");

        app.search_query = "owner".to_string();
        apply_search(&mut app);
        assert_eq!(app.users[0].username, "root");
    }

    #[test]
    fn search_groups_by_name_or_source() {
        let mut app = mk_app();
        app.search_query = "heim".to_string();
        apply_search(&mut app);
        assert_eq!(app.groups.len(), 1);
        assert_eq!(app.groups[0].name, "vip");
    }

    #[test]
    fn empty_query_restores_all_and_clamps_index() {
        let mut app = mk_app();
        app.selected_user_index = 2;
        app.search_query = "alice".to_string();
        apply_search(&mut app);
        assert_eq!(app.selected_user_index, 0);
        app.search_query.clear();
        apply_search(&mut app);
        assert_eq!(app.users.len(), 3);
    }
}
