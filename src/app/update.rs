use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::actions::toggle_entry;
use super::dispatch::{self, Command, Completion};
use super::keymap::KeyAction;
use crate::api::AdminBackend;
use crate::app::{
    ActiveTab, AppState, GroupFormFocus, InputMode, ModalKind, ModalState, NewUserField, NoticeKind,
};
use crate::search::apply_search;
use crate::ui;

/// Drive the UI until the operator quits.
///
/// Draws, folds in finished commands, then waits up to 100ms for a key.
pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    backend: Arc<dyn AdminBackend>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

    if let Some(cmd) = app.refresh() {
        dispatch::spawn(backend.clone(), cmd, tx.clone());
    }

    loop {
        app.expire_notice(Instant::now());
        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        while let Ok(done) = rx.try_recv() {
            app.apply_completion(done);
        }

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(cmd) = handle_key(app, key)
        {
            dispatch::spawn(backend.clone(), cmd, tx.clone());
        }

        if app.should_quit {
            break;
        }
    }

    tracing::info!("shutting down");
    Ok(())
}

/// Route one key press. Returns the command to dispatch, if any.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Option<Command> {
    if app
        .notice
        .as_ref()
        .is_some_and(|n| n.kind == NoticeKind::Error)
    {
        app.notice = None;
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Search => {
            handle_search_key(app, key.code);
            None
        }
        InputMode::Modal => handle_modal_key(app, key.code),
    }
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) -> Option<Command> {
    let action = app.keymap.resolve(&key)?;
    let on_users = app.active_tab == ActiveTab::Users;
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::Ignore => {}
        KeyAction::SwitchTab => {
            app.active_tab = match app.active_tab {
                ActiveTab::Users => ActiveTab::Groups,
                ActiveTab::Groups => ActiveTab::Users,
            };
        }
        KeyAction::MoveUp => move_row(app, -1),
        KeyAction::MoveDown => move_row(app, 1),
        KeyAction::PageUp => move_row(app, -(app.rows_per_page.max(1) as isize)),
        KeyAction::PageDown => move_row(app, app.rows_per_page.max(1) as isize),
        KeyAction::EnterAction => {
            if on_users {
                if let Some(name) = app.current_user().map(|u| u.username.clone()) {
                    app.open_user_actions(&name);
                }
            } else if app.is_manager()
                && let Some(name) = app.current_group().map(|g| g.name.clone())
            {
                app.open_group_actions(&name);
            }
        }
        KeyAction::ToggleSelect if on_users => app.toggle_current_user_selection(),
        KeyAction::SelectAll if on_users => {
            let all = app.select_all_users();
            app.handle_select_all_users(!all);
        }
        KeyAction::New => {
            if on_users {
                app.open_add_user();
            } else {
                app.open_add_group();
            }
        }
        KeyAction::DeleteSelection => {
            if on_users {
                if let Some(name) = app.current_user().map(|u| u.username.clone()) {
                    app.request_delete_user(&name);
                }
            } else if let Some(name) = app.current_group().map(|g| g.name.clone()) {
                app.request_delete_user_group(&name);
            }
        }
        KeyAction::BatchAssign => app.open_batch_user_group(),
        KeyAction::ToggleRegistration => {
            let next = !app.registration.displayed();
            return app.toggle_allow_register(next);
        }
        KeyAction::Refresh => return app.refresh(),
        KeyAction::StartSearch => {
            app.search_query.clear();
            apply_search(app);
            app.input_mode = InputMode::Search;
        }
        KeyAction::OpenHelp => app.open_modal(ModalState::Help { scroll: 0 }),
        KeyAction::ToggleSelect | KeyAction::SelectAll => {}
    }
    None
}

fn move_row(app: &mut AppState, delta: isize) {
    let (index, len) = match app.active_tab {
        ActiveTab::Users => (&mut app.selected_user_index, app.users.len()),
        ActiveTab::Groups => (&mut app.selected_group_index, app.groups.len()),
    };
    let max = len.saturating_sub(1);
    *index = index.saturating_add_signed(delta).min(max);
}

fn handle_search_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.search_query.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => app.search_query.push(c),
        _ => return,
    }
    apply_search(app);
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) -> Option<Command> {
    let Some(kind) = app.modal.as_ref().map(ModalState::kind) else {
        app.input_mode = InputMode::Normal;
        return None;
    };
    match code {
        KeyCode::Esc if kind == ModalKind::BatchUserGroup => app.cancel_batch_user_group(),
        KeyCode::Esc => app.close_modal(),
        KeyCode::Char('?') if kind == ModalKind::Help => app.close_modal(),
        KeyCode::Enter => return submit_modal(app, kind),
        _ => edit_modal(app, code),
    }
    None
}

/// Enter inside a dialog: confirm, submit, or follow the highlighted choice.
fn submit_modal(app: &mut AppState, kind: ModalKind) -> Option<Command> {
    match kind {
        ModalKind::UserActions => {
            let Some(ModalState::UserActions {
                username,
                options,
                selected,
            }) = &app.modal
            else {
                return None;
            };
            let action = options.get(*selected).copied()?;
            let username = username.clone();
            app.run_row_action(&username, action)
        }
        ModalKind::GroupActions => {
            let Some(ModalState::GroupActions { name, selected }) = &app.modal else {
                return None;
            };
            let (name, edit) = (name.clone(), *selected == 0);
            if edit {
                app.start_edit_user_group(&name);
            } else {
                app.request_delete_user_group(&name);
            }
            None
        }
        ModalKind::AddUser => app.submit_add_user(),
        ModalKind::ChangePassword => app.submit_change_password(),
        ModalKind::DeleteUser => {
            if matches!(app.modal, Some(ModalState::DeleteUser { selected: 0, .. })) {
                app.confirm_delete_user()
            } else {
                app.close_modal();
                None
            }
        }
        ModalKind::AddGroup => app.submit_add_group(),
        ModalKind::EditGroup => app.submit_edit_group(),
        ModalKind::DeleteGroup => {
            if matches!(app.modal, Some(ModalState::DeleteGroup { selected: 0, .. })) {
                app.confirm_delete_user_group()
            } else {
                app.close_modal();
                None
            }
        }
        ModalKind::ConfigureApis => app.save_user_apis(),
        ModalKind::ConfigureUserGroups => app.save_user_groups(),
        ModalKind::BatchUserGroup => app.submit_batch_user_group(),
        ModalKind::Help => {
            app.close_modal();
            None
        }
    }
}

fn step(cursor: &mut usize, len: usize, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => *cursor = cursor.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') if *cursor + 1 < len => *cursor += 1,
        _ => {}
    }
}

fn flip(selected: &mut usize, code: KeyCode) {
    if matches!(code, KeyCode::Left | KeyCode::Right | KeyCode::Tab) {
        *selected = if *selected == 0 { 1 } else { 0 };
    }
}

fn edit_text(field: &mut String, code: KeyCode) {
    match code {
        KeyCode::Backspace => {
            field.pop();
        }
        KeyCode::Char(c) => field.push(c),
        _ => {}
    }
}

/// Every other key inside a dialog: typing, cursor movement, toggles.
fn edit_modal(app: &mut AppState, code: KeyCode) {
    let sources = &app.config.source_config;
    let tags = &app.config.user_config.tags;
    match &mut app.modal {
        Some(ModalState::Help { scroll }) => match code {
            KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
            _ => {}
        },
        Some(ModalState::UserActions {
            options, selected, ..
        }) => step(selected, options.len(), code),
        Some(ModalState::GroupActions { selected, .. }) => step(selected, 2, code),
        Some(ModalState::AddUser(form)) => match (code, form.focus) {
            (KeyCode::Tab, _) => form.focus = form.focus.next(),
            (KeyCode::Left | KeyCode::Right, NewUserField::Group) => {
                // Options are "no group" followed by every defined group.
                let pos = form
                    .group
                    .as_ref()
                    .and_then(|g| tags.iter().position(|t| &t.name == g))
                    .map_or(0, |i| i + 1);
                let count = tags.len() + 1;
                let next = if code == KeyCode::Right {
                    (pos + 1) % count
                } else {
                    (pos + count - 1) % count
                };
                form.group = next.checked_sub(1).map(|i| tags[i].name.clone());
            }
            (_, NewUserField::Username) => edit_text(&mut form.username, code),
            (_, NewUserField::Password) => edit_text(&mut form.password, code),
            (_, NewUserField::Group) => {}
        },
        Some(ModalState::ChangePassword { password, .. }) => edit_text(password, code),
        Some(ModalState::DeleteUser { selected, .. })
        | Some(ModalState::DeleteGroup { selected, .. }) => flip(selected, code),
        Some(ModalState::AddGroup {
            form,
            focus,
            cursor,
        }) => match (code, *focus) {
            (KeyCode::Tab, GroupFormFocus::Name) => *focus = GroupFormFocus::Sources,
            (KeyCode::Tab, GroupFormFocus::Sources) => *focus = GroupFormFocus::Name,
            (_, GroupFormFocus::Name) => edit_text(&mut form.name, code),
            (KeyCode::Char(' '), GroupFormFocus::Sources) => {
                if let Some(src) = sources.get(*cursor) {
                    toggle_entry(&mut form.enabled_apis, &src.key);
                }
            }
            (_, GroupFormFocus::Sources) => step(cursor, sources.len(), code),
        },
        Some(ModalState::EditGroup { form, cursor }) => {
            if code == KeyCode::Char(' ') {
                if let Some(src) = sources.get(*cursor) {
                    toggle_entry(&mut form.enabled_apis, &src.key);
                }
            } else {
                step(cursor, sources.len(), code);
            }
        }
        Some(ModalState::ConfigureApis { apis, cursor, .. }) => {
            if code == KeyCode::Char(' ') {
                if let Some(src) = sources.get(*cursor) {
                    toggle_entry(apis, &src.key);
                }
            } else {
                step(cursor, sources.len(), code);
            }
        }
        Some(ModalState::ConfigureUserGroups { groups, cursor, .. }) => {
            if code == KeyCode::Char(' ') {
                if let Some(tag) = tags.get(*cursor) {
                    toggle_entry(groups, &tag.name);
                }
            } else {
                step(cursor, tags.len(), code);
            }
        }
        Some(ModalState::BatchUserGroup { cursor }) => step(cursor, tags.len() + 1, code),
        None => {}
    }
}
