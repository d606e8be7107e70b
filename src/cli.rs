use std::path::PathBuf;

use clap::Parser;

use protocol_tracker::config::Overrides;

use crate::cmd::Commands;

/// File-backed protocol tracker.
/// Storage defaults to ~/.ptrack/session.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "ptrack", version, about = "Daily protocol tracker")]
pub struct Cli {
    /// Path to the JSON session file.
    #[arg(long, env = "PTRACK_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Path to a JSON protocol catalog [default: built-in protocols].
    #[arg(long, env = "PTRACK_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// User id stamped on new enrollments [default: the session's user].
    #[arg(long, env = "PTRACK_USER", global = true)]
    pub user: Option<String>,

    /// How long notifications stay visible, in milliseconds.
    #[arg(long, env = "PTRACK_NOTIFY_MS", global = true)]
    pub notify_ms: Option<i64>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            // A session given via --db keeps its catalog.json next to it.
            data_dir: self
                .db
                .as_ref()
                .map(|db| db.parent().unwrap_or_else(|| std::path::Path::new(".")).to_path_buf()),
            session: self.db.clone(),
            catalog: self.catalog.clone(),
            user: self.user.clone(),
            notify_ms: self.notify_ms,
        }
    }
}
