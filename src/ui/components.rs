//! Shared UI components (status bar, modal helpers).
//!
//! Contains small building blocks reused by users/groups screens.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, NoticeKind};

/// Render the bottom status bar: the current notice, or mode and hints.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let base = Style::default()
        .fg(app.theme.status_fg)
        .bg(app.theme.status_bg);
    let p = match &app.notice {
        Some(n) => {
            let fg = match n.kind {
                NoticeKind::Success => app.theme.success,
                NoticeKind::Error => app.theme.error,
            };
            Paragraph::new(n.message.clone()).style(base.fg(fg).add_modifier(Modifier::BOLD))
        }
        None => {
            let mode = match app.input_mode {
                InputMode::Normal => "NORMAL",
                InputMode::Search => "SEARCH",
                InputMode::Modal => "DIALOG",
            };
            let busy = if app.loading.is_empty() {
                String::new()
            } else {
                format!("  working:{}", app.loading.len())
            };
            let msg = format!(
                "mode: {mode}  rows/page:{}{busy}  ?: help  q: quit",
                app.rows_per_page
            );
            Paragraph::new(msg).style(base)
        }
    };
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Bordered block used by every dialog; `busy` appends a marker to the title.
pub fn modal_block<'a>(title: &'a str, busy: bool, app: &AppState) -> Block<'a> {
    let title = if busy {
        Line::from(vec![Span::raw(title), Span::raw(" (working…)")])
    } else {
        Line::from(title)
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
}

/// Dialog height: `wanted` capped to the screen, but never below `min`.
/// `centered_rect` trims whatever still does not fit.
pub fn dialog_height(wanted: u16, min: u16, area: Rect) -> u16 {
    wanted.min(area.height.saturating_sub(4)).max(min)
}

/// Draw `lines` in a cleared dialog box centered in `area`.
pub fn render_dialog(
    f: &mut Frame,
    area: Rect,
    (width, height): (u16, u16),
    block: Block<'_>,
    lines: Vec<Line<'_>>,
) {
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Menu lines with a marker on the selected entry.
pub fn menu_lines<'a>(options: &[&'a str], selected: usize, app: &AppState) -> Vec<Line<'a>> {
    options
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            if idx == selected {
                Line::from(Span::styled(
                    format!("▶ {label}"),
                    Style::default()
                        .fg(app.theme.highlight_fg)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::raw(format!("  {label}"))
            }
        })
        .collect()
}

/// Checkbox list scrolled so the cursor stays within `visible` rows.
pub fn checklist_lines(
    items: &[(String, bool)],
    cursor: usize,
    visible: usize,
    app: &AppState,
) -> Vec<Line<'static>> {
    if items.is_empty() {
        return vec![Line::styled(
            "  (nothing to choose from)",
            Style::default().fg(app.theme.muted),
        )];
    }
    let visible = visible.max(1);
    let start = cursor.saturating_sub(visible - 1).min(items.len());
    items[start..]
        .iter()
        .take(visible)
        .enumerate()
        .map(|(i, (label, checked))| {
            let mark = if *checked { "[x]" } else { "[ ]" };
            let text = format!("{} {mark} {label}", if start + i == cursor { "▶" } else { " " });
            if start + i == cursor {
                Line::styled(text, Style::default().fg(app.theme.highlight_fg))
            } else {
                Line::raw(text)
            }
        })
        .collect()
}

/// Yes/No buttons for confirmations; 0 is Yes.
pub fn confirm_line(selected: usize) -> Line<'static> {
    let yes = if selected == 0 { "[Yes]" } else { " Yes " };
    let no = if selected == 1 { "[No]" } else { " No " };
    Line::raw(format!("  {yes}    {no}"))
}

/// A text field line; `masked` hides the value.
pub fn field_line(label: &str, value: &str, focused: bool, masked: bool) -> Line<'static> {
    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let marker = if focused { "▶" } else { " " };
    let cursor = if focused { "_" } else { "" };
    Line::raw(format!("{marker} {label}: {shown}{cursor}"))
}

fn key_line(label: &str, keys: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
    ])
}

fn bound(app: &AppState, action: KeyAction) -> String {
    let keys = app.keymap.keys_for(action);
    if keys.is_empty() {
        "unbound".to_string()
    } else {
        keys.join(" / ")
    }
}

/// Render the help modal from the live keymap.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 72u16.min(area.width.saturating_sub(4)).max(50);
    let height = 26u16.min(area.height.saturating_sub(4)).max(12);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = vec![Line::styled("General", bold)];
    for (label, action) in [
        ("Switch tab", KeyAction::SwitchTab),
        ("Move up", KeyAction::MoveUp),
        ("Move down", KeyAction::MoveDown),
        ("Page up", KeyAction::PageUp),
        ("Page down", KeyAction::PageDown),
        ("Search", KeyAction::StartSearch),
        ("Refresh", KeyAction::Refresh),
        ("Toggle registration", KeyAction::ToggleRegistration),
        ("Help", KeyAction::OpenHelp),
        ("Quit", KeyAction::Quit),
    ] {
        lines.push(key_line(label, bound(app, action)));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("Users tab", bold));
    for (label, action) in [
        ("Row actions", KeyAction::EnterAction),
        ("Check / uncheck", KeyAction::ToggleSelect),
        ("Select all / none", KeyAction::SelectAll),
        ("Assign group to selection", KeyAction::BatchAssign),
        ("New user", KeyAction::New),
        ("Delete user", KeyAction::DeleteSelection),
    ] {
        lines.push(key_line(label, bound(app, action)));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("Groups tab", bold));
    for (label, action) in [
        ("Edit / delete", KeyAction::EnterAction),
        ("New group", KeyAction::New),
        ("Delete group", KeyAction::DeleteSelection),
    ] {
        lines.push(key_line(label, bound(app, action)));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("Dialogs", bold));
    for (label, keys) in [
        ("Confirm / save", "Enter"),
        ("Cancel", "Esc"),
        ("Next field", "Tab"),
        ("Toggle entry", "Space"),
        ("Choose group / Yes-No", "Left / Right"),
    ] {
        lines.push(key_line(label, keys.to_string()));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(modal_block("Help", false, app));
    let rect = centered_rect(width, height, area);
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
