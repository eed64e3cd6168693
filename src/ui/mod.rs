pub mod components;
pub mod groups;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{ActiveTab, AppState, InputMode, ModalState};

/// Header text: who is acting, the tabs, and global counters.
fn header_line(app: &AppState) -> Line<'static> {
    let tabs = match app.active_tab {
        ActiveTab::Users => "[Users]  Groups",
        ActiveTab::Groups => "Users  [Groups]",
    };
    let registration = if !app.loaded {
        "…".to_string()
    } else {
        let flag = if app.registration.displayed() {
            "on"
        } else {
            "off"
        };
        let pending = if app.registration.is_pending() {
            " (saving…)"
        } else {
            ""
        };
        format!("{flag}{pending}")
    };
    let all = if app.select_all_users() { " (all)" } else { "" };
    let mut spans = vec![
        Span::styled(
            format!("{} ({})", app.session.username, app.session.role),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {tabs}  registration:{registration}  users:{}  groups:{}  selected:{}{all}",
            app.config.user_config.users.len(),
            app.config.user_config.tags.len(),
            app.selection.len(),
        )),
    ];
    if app.input_mode == InputMode::Search {
        spans.push(Span::styled(
            format!("  Search: {}_", app.search_query),
            Style::default().fg(app.theme.highlight_fg),
        ));
    } else if !app.search_query.is_empty() {
        spans.push(Span::raw(format!("  filter: \"{}\"", app.search_query)));
    }
    Line::from(spans)
}

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(root[1]);

    let p = Paragraph::new(header_line(app))
        .block(
            Block::default()
                .title("usrcfg-admin")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(
            Style::default()
                .fg(app.theme.header_fg)
                .bg(app.theme.header_bg),
        );
    f.render_widget(p, root[0]);

    match app.active_tab {
        ActiveTab::Users => {
            users::render_users_table(f, body[0], app);
            users::render_user_details(f, body[1], app);
        }
        ActiveTab::Groups => {
            groups::render_groups_table(f, body[0], app);
            groups::render_group_details(f, body[1], app);
        }
    }

    components::render_status_bar(f, root[2], app);

    let area = f.area();
    if let Some(state) = &app.modal {
        render_modal(f, area, app, state);
    }
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    match state {
        ModalState::UserActions { .. }
        | ModalState::AddUser(_)
        | ModalState::ChangePassword { .. }
        | ModalState::DeleteUser { .. }
        | ModalState::ConfigureApis { .. }
        | ModalState::ConfigureUserGroups { .. }
        | ModalState::BatchUserGroup { .. } => users::render_user_modal(f, area, app, state),
        ModalState::GroupActions { .. }
        | ModalState::AddGroup { .. }
        | ModalState::EditGroup { .. }
        | ModalState::DeleteGroup { .. } => groups::render_group_modal(f, area, app, state),
        ModalState::Help { scroll } => components::render_help_modal(f, area, app, *scroll),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Session;
    use crate::model::{ConfigSnapshot, Role, User, UserConfig};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn app() -> AppState {
        let config = ConfigSnapshot {
            user_config: UserConfig {
                allow_register: true,
                users: vec![User {
                    username: "alice".into(),
                    role: Role::User,
                    banned: false,
                    tags: Some(vec!["vip".into()]),
                    enabled_apis: None,
                }],
                tags: vec![],
            },
            source_config: vec![],
        };
        AppState::with_config(Session::new("root", Role::Owner), config)
    }

    #[test]
    fn header_shows_registration_and_counts() {
        let mut a = app();
        let text: String = header_line(&a)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(text.contains("root (owner)"));
        assert!(text.contains("registration:on"));
        a.handle_select_all_users(true);
        let text: String = header_line(&a)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(text.contains("selected:1 (all)"));
    }

    #[test]
    fn renders_every_dialog_without_panicking() {
        let mut a = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        a.open_add_user();
        terminal.draw(|f| render(f, &mut a)).unwrap();
        a.request_delete_user("alice");
        terminal.draw(|f| render(f, &mut a)).unwrap();
        a.open_modal(ModalState::Help { scroll: 0 });
        terminal.draw(|f| render(f, &mut a)).unwrap();
        a.close_modal();
        a.active_tab = ActiveTab::Groups;
        a.open_add_group();
        terminal.draw(|f| render(f, &mut a)).unwrap();
    }

    #[test]
    fn picker_dialogs_fit_short_terminals() {
        use crate::app::{GroupForm, GroupFormFocus};

        let dialogs = [
            ModalState::BatchUserGroup { cursor: 0 },
            ModalState::ConfigureApis {
                username: "alice".into(),
                apis: vec![],
                cursor: 0,
            },
            ModalState::ConfigureUserGroups {
                username: "alice".into(),
                groups: vec!["vip".into()],
                cursor: 0,
            },
            ModalState::AddGroup {
                form: GroupForm::default(),
                focus: GroupFormFocus::Name,
                cursor: 0,
            },
            ModalState::EditGroup {
                form: GroupForm {
                    name: "vip".into(),
                    ..GroupForm::default()
                },
                cursor: 0,
            },
            ModalState::DeleteGroup {
                name: "vip".into(),
                affected_users: vec![],
                selected: 1,
            },
        ];
        for height in [3u16, 6, 8, 10, 12] {
            let mut terminal = Terminal::new(TestBackend::new(80, height)).unwrap();
            for dialog in &dialogs {
                let mut a = app();
                a.open_modal(dialog.clone());
                terminal.draw(|f| render(f, &mut a)).unwrap();
            }
        }
    }
}
