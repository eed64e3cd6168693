//! Startup configuration: command line, config directory and log output.

use clap::{Parser, ValueEnum};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::app::Session;
use crate::error::{Context, Result, simple_error};
use crate::model::Role;

const APP_DIR: &str = "usrcfg-admin";
const LOG_ENV: &str = "USRCFG_LOG";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Owner,
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Owner => Role::Owner,
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "usrcfg-admin")]
#[command(about = "Manage site users, user groups and registration policy", long_about = None)]
pub struct Cli {
    /// Base URL of the site exposing /api/admin
    #[arg(long, env = "USRCFG_BASE_URL", default_value = "http://127.0.0.1:3000")]
    pub base_url: String,

    /// Username of the operator
    #[arg(long, env = "USRCFG_ACTOR")]
    pub actor: String,

    /// Role of the operator
    #[arg(long, value_enum, env = "USRCFG_ROLE")]
    pub role: RoleArg,

    /// Cookie header sent with every request
    #[arg(long, env = "USRCFG_AUTH_COOKIE", hide_env_values = true)]
    pub auth_cookie: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log file (defaults to usrcfg-admin.log in the config directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn session(&self) -> Result<Session> {
        let actor = self.actor.trim();
        if actor.is_empty() {
            return Err(simple_error("--actor must not be empty"));
        }
        Ok(Session::new(actor, self.role.into()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| config_file_path("usrcfg-admin.log"))
    }
}

/// `$XDG_CONFIG_HOME/usrcfg-admin`, or `./usrcfg-admin` when there is none.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn config_file_path(name: &str) -> PathBuf {
    config_dir().join(name)
}

/// Send `tracing` output to `path`; the terminal belongs to the UI.
pub fn init_logging(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_ctx(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_ctx(|| format!("open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| simple_error(format!("init logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "usrcfg-admin",
            "--actor",
            "root",
            "--role",
            "owner",
            "--base-url",
            "http://site.test",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.base_url, "http://site.test");
        assert_eq!(cli.session().unwrap(), Session::new("root", Role::Owner));
        assert_eq!(cli.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_role() {
        let res = Cli::try_parse_from(["usrcfg-admin", "--actor", "x", "--role", "superuser"]);
        assert!(res.is_err());
    }

    #[test]
    fn blank_actor_is_an_error() {
        let cli =
            Cli::try_parse_from(["usrcfg-admin", "--actor", "  ", "--role", "admin"]).unwrap();
        assert!(cli.session().is_err());
    }
}
