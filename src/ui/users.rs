use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::api::ActionKey;
use crate::app::selection::is_selectable;
use crate::app::{AppState, ModalState, NewUserField};
use crate::model::User;
use crate::ui::components::{
    checklist_lines, confirm_line, dialog_height, field_line, menu_lines, modal_block,
    render_dialog,
};

fn checkbox(app: &AppState, u: &User) -> &'static str {
    if app.selection.contains(&u.username) {
        "[x]"
    } else if is_selectable(&app.session, u) {
        "[ ]"
    } else {
        "   "
    }
}

fn sources_cell(u: &User) -> String {
    match u.enabled_apis().len() {
        0 => "-".to_string(),
        n => n.to_string(),
    }
}

pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let start = (app.selected_user_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(app.users.len());
    let slice = &app.users[start.min(end)..end];

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let absolute_index = start + i;
        let style = if absolute_index == app.selected_user_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else if u.banned {
            Style::default().fg(app.theme.muted)
        } else {
            Style::default().fg(app.theme.text)
        };
        let busy = if app.loading.any_for_user(&u.username) {
            "…"
        } else {
            ""
        };
        Row::new(vec![
            Cell::from(checkbox(app, u)),
            Cell::from(u.username.clone()),
            Cell::from(u.role.as_str()),
            Cell::from(if u.banned { "banned" } else { "active" }),
            Cell::from(u.tags().join(", ")),
            Cell::from(sources_cell(u)),
            Cell::from(busy),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(30),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Percentage(40),
        Constraint::Length(7),
        Constraint::Length(1),
    ];

    let header = Row::new(vec!["", "USER", "ROLE", "STATUS", "GROUPS", "SOURCES", ""]).style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );

    let title = if app.search_query.is_empty() {
        format!("Users ({})", app.users.len())
    } else {
        format!(
            "Users ({}/{}) matching \"{}\"",
            app.users.len(),
            app.config.user_config.users.len(),
            app.search_query
        )
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

fn source_label(app: &AppState, key: &str) -> String {
    app.config
        .source_config
        .iter()
        .find(|s| s.key == key)
        .map(|s| s.display_label())
        .unwrap_or_else(|| key.to_string())
}

pub fn render_user_details(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    if let Some(u) = app.current_user() {
        lines.push(Line::raw(format!("Username: {}", u.username)));
        lines.push(Line::raw(format!("Role: {}", u.role)));
        lines.push(Line::raw(format!(
            "Status: {}",
            if u.banned { "banned" } else { "active" }
        )));
        let groups = if u.tags().is_empty() {
            "(none)".to_string()
        } else {
            u.tags().join(", ")
        };
        lines.push(Line::raw(format!("Groups: {groups}")));
        lines.push(Line::raw(""));
        if u.enabled_apis().is_empty() {
            lines.push(Line::raw("Sources: from groups / unrestricted"));
        } else {
            lines.push(Line::raw("Sources:"));
            for key in u.enabled_apis() {
                lines.push(Line::raw(format!("  {}", source_label(app, key))));
            }
        }
    } else if !app.loaded {
        lines.push(Line::raw("Loading configuration…"));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

fn picker_height(area: Rect, items: usize) -> (u16, usize) {
    let height = dialog_height(items as u16 + 5, 7, area);
    (height, height.saturating_sub(5) as usize)
}

pub fn render_user_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let width = 60u16.min(area.width.saturating_sub(4)).max(36);
    match state {
        ModalState::UserActions {
            username,
            options,
            selected,
        } => {
            let labels: Vec<&str> = options.iter().map(|a| a.label()).collect();
            let title = format!("Actions: {username}");
            let lines = menu_lines(&labels, *selected, app);
            let busy = app.loading.any_for_user(username);
            render_dialog(
                f,
                area,
                (36, labels.len() as u16 + 2),
                modal_block(&title, busy, app),
                lines,
            );
        }
        ModalState::AddUser(form) => {
            let group = form.group.as_deref().unwrap_or("(none)");
            let lines = vec![
                field_line(
                    "Username",
                    &form.username,
                    form.focus == NewUserField::Username,
                    false,
                ),
                field_line(
                    "Password",
                    &form.password,
                    form.focus == NewUserField::Password,
                    true,
                ),
                field_line(
                    "Group (Left/Right)",
                    group,
                    form.focus == NewUserField::Group,
                    false,
                ),
                Line::raw(""),
                Line::styled(
                    "Tab: next field  Enter: create  Esc: cancel",
                    Style::default().fg(app.theme.muted),
                ),
            ];
            let busy = app.loading.is_busy(&ActionKey::new("addUser"));
            render_dialog(f, area, (width, 8), modal_block("New user", busy, app), lines);
        }
        ModalState::ChangePassword { username, password } => {
            let lines = vec![
                Line::raw(format!("User: {username}")),
                field_line("New password", password, true, true),
                Line::raw(""),
                Line::styled("Enter: save  Esc: cancel", Style::default().fg(app.theme.muted)),
            ];
            let busy = app
                .loading
                .is_busy(&ActionKey::targeted("changePassword", username));
            render_dialog(
                f,
                area,
                (width, 7),
                modal_block("Change password", busy, app),
                lines,
            );
        }
        ModalState::DeleteUser { username, selected } => {
            let lines = vec![
                Line::raw(format!("Delete user '{username}'? This cannot be undone.")),
                Line::raw(""),
                confirm_line(*selected),
            ];
            let busy = app
                .loading
                .is_busy(&ActionKey::targeted("deleteUser", username));
            render_dialog(
                f,
                area,
                (width, 6),
                modal_block("Confirm delete", busy, app),
                lines,
            );
        }
        ModalState::ConfigureApis {
            username,
            apis,
            cursor,
        } => {
            let items: Vec<(String, bool)> = app
                .config
                .source_config
                .iter()
                .map(|s| (s.display_label(), apis.contains(&s.key)))
                .collect();
            let (height, visible) = picker_height(area, items.len());
            let mut lines = vec![
                Line::raw(format!("Sources for {username} (none = unrestricted)")),
                Line::raw(""),
            ];
            lines.extend(checklist_lines(&items, *cursor, visible, app));
            let busy = app
                .loading
                .is_busy(&ActionKey::targeted("saveUserApis", username));
            render_dialog(
                f,
                area,
                (width, height),
                modal_block("Configure sources", busy, app),
                lines,
            );
        }
        ModalState::ConfigureUserGroups {
            username,
            groups,
            cursor,
        } => {
            let items: Vec<(String, bool)> = app
                .config
                .user_config
                .tags
                .iter()
                .map(|g| (format!("{} ({})", g.name, g.sources_label()), groups.contains(&g.name)))
                .collect();
            let (height, visible) = picker_height(area, items.len());
            let mut lines = vec![Line::raw(format!("Groups for {username}")), Line::raw("")];
            lines.extend(checklist_lines(&items, *cursor, visible, app));
            let busy = app
                .loading
                .is_busy(&ActionKey::targeted("saveUserGroups", username));
            render_dialog(
                f,
                area,
                (width, height),
                modal_block("Configure groups", busy, app),
                lines,
            );
        }
        ModalState::BatchUserGroup { cursor } => {
            let mut labels = vec!["(no group)".to_string()];
            labels.extend(
                app.config
                    .user_config
                    .tags
                    .iter()
                    .map(|g| format!("{} ({})", g.name, g.sources_label())),
            );
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let mut lines = vec![
                Line::raw(format!(
                    "Set the group of {} selected user(s) to:",
                    app.selection.len()
                )),
                Line::raw(""),
            ];
            lines.extend(menu_lines(&refs, *cursor, app));
            let busy = app.loading.is_busy(&ActionKey::new("batchSetUserGroup"));
            let (height, _) = picker_height(area, refs.len());
            render_dialog(
                f,
                area,
                (width, height),
                modal_block("Assign group", busy, app),
                lines,
            );
        }
        _ => {}
    }
}
