//! usrcfg-admin binary entry point.
//!
//! Parses the command line, sets up logging, initializes the terminal in raw
//! mode, runs the TUI event loop, and restores the terminal state on exit.
//!
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::Arc;

use usrcfg_admin::api::{AdminBackend, HttpBackend};
use usrcfg_admin::app::{self, AppState, Keymap, Theme};
use usrcfg_admin::config::{self, Cli};
use usrcfg_admin::error::{Context, Result};

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let session = cli.session()?;
    config::init_logging(&cli.log_path())?;
    tracing::info!(actor = %session.username, role = %session.role, base_url = %cli.base_url, "starting");

    let backend: Arc<dyn AdminBackend> = Arc::new(
        HttpBackend::new(&cli.base_url, cli.auth_cookie.clone(), cli.timeout())
            .with_ctx(|| format!("build client for {}", cli.base_url))?,
    );

    let mut state = AppState::new(session);
    state.theme = Theme::load_or_init(&config::config_file_path("theme.conf"));
    state.keymap = Keymap::load_or_init(&config::config_file_path("keybinds.conf"));

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, &mut state, backend).await;

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}
