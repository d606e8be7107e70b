//! Runtime configuration.
//!
//! Values come from command-line flags (which clap also fills from
//! `PTRACK_*` environment variables) layered over defaults rooted in
//! `~/.ptrack`.

use std::path::PathBuf;

use chrono::Duration;

use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::db::Session;
use crate::error::{Result, TrackerError};
use crate::notification::DEFAULT_DISPLAY_MS;
use crate::store::TrackingStore;

/// User of a new session when none is configured.
pub const DEFAULT_USER: &str = "user1";

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub session: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub user: Option<String>,
    pub notify_ms: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub session_path: PathBuf,
    /// `None` means the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    /// Explicit user. `None` keeps the session's saved user.
    pub user_id: Option<String>,
    pub notification_window: Duration,
}

impl Config {
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let data_dir = overrides.data_dir.unwrap_or_else(default_data_dir);
        let session_path = overrides.session.unwrap_or_else(|| data_dir.join("session.json"));

        let catalog_path = overrides.catalog.or_else(|| {
            let candidate = data_dir.join("catalog.json");
            candidate.exists().then_some(candidate)
        });

        let user_id = overrides.user;
        if user_id.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(TrackerError::Config("user id cannot be empty".into()));
        }

        let notify_ms = overrides.notify_ms.unwrap_or(DEFAULT_DISPLAY_MS);
        if notify_ms <= 0 {
            return Err(TrackerError::Config(format!(
                "notification duration must be positive, got {notify_ms}ms"
            )));
        }

        Ok(Config {
            data_dir,
            session_path,
            catalog_path,
            user_id,
            notification_window: Duration::milliseconds(notify_ms),
        })
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::seed()),
        }
    }

    /// Build the session store from the configured catalog and session file.
    ///
    /// An explicit user replaces the session's user, so new enrollments are
    /// stamped with it.
    pub fn open_store(&self) -> Result<TrackingStore> {
        self.open_store_with(Box::new(SystemClock))
    }

    pub fn open_store_with(&self, clock: Box<dyn Clock>) -> Result<TrackingStore> {
        let catalog = self.load_catalog()?;
        let new_user = self.user_id.as_deref().unwrap_or(DEFAULT_USER);
        let session = Session::load(&self.session_path, new_user)?;
        let mut store = TrackingStore::restore(catalog, session, clock, self.notification_window);
        if let Some(user) = self.user_id.as_deref() {
            if store.user_id() != user {
                tracing::info!(session_user = %store.user_id(), user, "switching session user");
                store.set_user(user);
            }
        }
        Ok(store)
    }

    pub fn save_store(&self, store: &TrackingStore) -> Result<()> {
        store.to_session().save(&self.session_path)
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".ptrack")
}
