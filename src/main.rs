//! # ptrack - daily protocol tracker
//!
//! Enroll in multi-task protocols, check off today's tasks and watch progress
//! build up. Finishing your third task in a protocol unlocks an achievement.
//!
//! ## Quick Start
//!
//! ```bash
//! # See what you can enroll in
//! ptrack catalog
//!
//! # Enroll (by id or title); the new protocol becomes current
//! ptrack enroll "Morning Routine"
//!
//! # Check off tasks
//! ptrack today
//! ptrack toggle Hydration
//!
//! # Switch between enrolled protocols
//! ptrack enrolled
//! ptrack select up1
//! ```
//!
//! State is stored in `~/.ptrack/session.json`. A `catalog.json` placed next
//! to the session file replaces the built-in protocols.
//!
//! Logging goes to stderr and is controlled by `PTRACK_LOG`
//! (e.g. `PTRACK_LOG=debug`).

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use protocol_tracker::config::Config;

mod cli;
mod cmd;

use cli::Cli;
use cmd::*;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("PTRACK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Commands that don't need a session.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let config = match Config::resolve(cli.overrides()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    tracing::debug!(session = %config.session_path.display(), user = ?config.user_id, "resolved config");

    let mut store = match config.open_store() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open session: {e}");
            std::process::exit(1);
        }
    };

    let changed = match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),
        Commands::Catalog => {
            cmd_catalog(&store);
            false
        }
        Commands::Show { template } => {
            cmd_show(&store, template);
            false
        }
        Commands::Enroll { template } => cmd_enroll(&mut store, template),
        Commands::Enrolled { sort } => {
            cmd_enrolled(&store, sort);
            false
        }
        Commands::Select { protocol } => cmd_select(&mut store, protocol),
        Commands::Unenroll { protocol } => cmd_unenroll(&mut store, protocol),
        Commands::Today { filter } => {
            cmd_today(&store, filter);
            false
        }
        Commands::Toggle { task } => cmd_toggle(&mut store, task),
        Commands::Notification => {
            cmd_notification(&store);
            false
        }
        Commands::Dismiss => cmd_dismiss(&mut store),
    };

    if changed {
        if let Err(e) = config.save_store(&store) {
            eprintln!("Failed to save session: {e}");
            std::process::exit(1);
        }
    }
}
