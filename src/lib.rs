//! # ZoneForge client
//!
//! Command-line front end for the ZoneForge backend. It edits zone records,
//! users, groups and roles through the same [`RowEditor`](zoneforge_editor::RowEditor)
//! the admin pages run in the browser, with terminal prompts in place of
//! browser dialogs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clap::Parser;
//! use zoneforge::cli::Cli;
//! use zoneforge::commands::App;
//! use zoneforge::config::Settings;
//! use zoneforge::dialogs::TerminalDialogs;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse_from(["zoneforge", "edit", "roles", "auditor", "--set", "name=auditors"]);
//!     let settings = Settings::new_with_cli(&cli)?;
//!     let dialogs = TerminalDialogs::new(settings.assume_yes);
//!
//!     let app = App::connect(settings).await?;
//!     println!("{}", app.execute(&cli.command, &dialogs).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **cli**: clap arguments and subcommands
//! - **config**: layered settings (file, environment, CLI)
//! - **client**: reqwest transport, login and listings
//! - **rows**: row snapshots and option catalogs from the list endpoints
//! - **dialogs**: terminal confirm/alert
//! - **commands**: subcommand runners

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod dialogs;
pub mod error;
pub mod rows;
