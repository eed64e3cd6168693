//! Library crate for usrcfg-admin.
//!
//! This crate exposes the building blocks of the TUI:
//! - Configuration snapshot types (`model`)
//! - Admin API client and request bodies (`api`)
//! - Application state, action handlers and update loop (`app`)
//! - Command line, config directory and logging setup (`config`)
//! - Error and result types (`error`)
//! - In-memory search helpers (`search`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `usrcfg-admin` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod search;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
