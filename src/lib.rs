//! `procure-client` library crate.
//!
//! The binary (`procure`) is a thin wrapper around this library so that:
//!
//! - orchestration and rendering are testable without a terminal or a server
//! - the TUI and the headless subcommands share one code path
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod notify;
pub mod render;
pub mod tui;
