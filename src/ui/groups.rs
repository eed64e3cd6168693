use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::api::{ActionKey, GroupAction};
use crate::app::{AppState, GroupForm, GroupFormFocus, ModalState};
use crate::ui::components::{
    checklist_lines, confirm_line, dialog_height, field_line, menu_lines, modal_block,
    render_dialog,
};

pub fn render_groups_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let start = (app.selected_group_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(app.groups.len());
    let slice = &app.groups[start.min(end)..end];

    let rows = slice.iter().enumerate().map(|(i, g)| {
        let absolute_index = start + i;
        let style = if absolute_index == app.selected_group_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        let members = app.config.users_in_group(&g.name).len();
        let busy = if app.loading.any_for_group(&g.name) {
            "…"
        } else {
            ""
        };
        Row::new(vec![
            Cell::from(g.name.clone()),
            Cell::from(g.sources_label()),
            Cell::from(members.to_string()),
            Cell::from(busy),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Percentage(50),
        Constraint::Length(14),
        Constraint::Length(7),
        Constraint::Length(1),
    ];
    let header = Row::new(vec!["GROUP", "SOURCES", "MEMBERS", ""]).style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!("User groups ({})", app.groups.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);
    f.render_widget(table, area);
}

pub fn render_group_details(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();
    if let Some(g) = app.current_group() {
        lines.push(Line::raw(format!("Name: {}", g.name)));
        if g.is_unrestricted() {
            lines.push(Line::raw("Sources: unrestricted"));
        } else {
            lines.push(Line::raw("Sources:"));
            for key in &g.enabled_apis {
                let label = app
                    .config
                    .source_config
                    .iter()
                    .find(|s| &s.key == key)
                    .map(|s| s.display_label())
                    .unwrap_or_else(|| key.clone());
                lines.push(Line::raw(format!("  {label}")));
            }
        }
        lines.push(Line::raw(""));
        let members = app.config.users_in_group(&g.name);
        lines.push(Line::raw(format!("Members ({}):", members.len())));
        for u in members {
            lines.push(Line::raw(format!("  {} ({})", u.username, u.role)));
        }
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

fn source_items(app: &AppState, form: &GroupForm) -> Vec<(String, bool)> {
    app.config
        .source_config
        .iter()
        .map(|s| (s.display_label(), form.enabled_apis.contains(&s.key)))
        .collect()
}

pub fn render_group_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let width = 60u16.min(area.width.saturating_sub(4)).max(36);
    match state {
        ModalState::GroupActions { name, selected } => {
            let title = format!("Group: {name}");
            let lines = menu_lines(&["Edit sources", "Delete"], *selected, app);
            render_dialog(
                f,
                area,
                (32, 4),
                modal_block(&title, app.loading.any_for_group(name), app),
                lines,
            );
        }
        ModalState::AddGroup {
            form,
            focus,
            cursor,
        } => {
            let items = source_items(app, form);
            let height = dialog_height(items.len() as u16 + 7, 9, area);
            let visible = height.saturating_sub(7) as usize;
            let mut lines = vec![
                field_line("Name", &form.name, *focus == GroupFormFocus::Name, false),
                Line::raw(format!(
                    "{} Sources (none = unrestricted):",
                    if *focus == GroupFormFocus::Sources { "▶" } else { " " }
                )),
            ];
            lines.extend(checklist_lines(&items, *cursor, visible, app));
            lines.push(Line::styled(
                "Tab: switch  Space: toggle  Enter: create",
                Style::default().fg(app.theme.muted),
            ));
            let busy = app
                .loading
                .is_busy(&ActionKey::group(GroupAction::Add, &form.name));
            render_dialog(
                f,
                area,
                (width, height),
                modal_block("New user group", busy, app),
                lines,
            );
        }
        ModalState::EditGroup { form, cursor } => {
            let items = source_items(app, form);
            let height = dialog_height(items.len() as u16 + 6, 8, area);
            let visible = height.saturating_sub(6) as usize;
            let mut lines = vec![
                Line::raw(format!("Sources for '{}' (none = unrestricted):", form.name)),
                Line::raw(""),
            ];
            lines.extend(checklist_lines(&items, *cursor, visible, app));
            lines.push(Line::styled(
                "Space: toggle  Enter: save",
                Style::default().fg(app.theme.muted),
            ));
            let busy = app
                .loading
                .is_busy(&ActionKey::group(GroupAction::Edit, &form.name));
            render_dialog(
                f,
                area,
                (width, height),
                modal_block("Edit user group", busy, app),
                lines,
            );
        }
        ModalState::DeleteGroup {
            name,
            affected_users,
            selected,
        } => {
            let mut lines = vec![Line::raw(format!("Delete user group '{name}'?"))];
            if affected_users.is_empty() {
                lines.push(Line::raw("No users are in this group."));
            } else {
                lines.push(Line::raw(format!(
                    "{} user(s) will lose this group:",
                    affected_users.len()
                )));
                for u in affected_users {
                    lines.push(Line::raw(format!("  {} ({})", u.username, u.role)));
                }
            }
            lines.push(Line::raw(""));
            lines.push(confirm_line(*selected));
            let height = dialog_height(lines.len() as u16 + 2, 6, area);
            let busy = app
                .loading
                .is_busy(&ActionKey::group(GroupAction::Delete, name));
            render_dialog(
                f,
                area,
                (width, height),
                modal_block("Confirm delete", busy, app),
                lines,
            );
        }
        _ => {}
    }
}
