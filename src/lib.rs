//! # ptrack - protocol tracker
//!
//! Followers enroll in multi-task protocols authored by instructors, check
//! off their daily tasks and collect achievements along the way.
//!
//! The library holds the tracking core:
//!
//! - [`catalog`]: the read-only protocol templates.
//! - [`store::TrackingStore`]: enrollment, current-protocol selection, task
//!   toggling with progress recalculation and milestone detection.
//! - [`notification`]: the single-slot toast with its auto-dismiss timer.
//! - [`db`]: the JSON session file the command-line front end persists to.
//!
//! ```no_run
//! use protocol_tracker::catalog::Catalog;
//! use protocol_tracker::clock::SystemClock;
//! use protocol_tracker::store::TrackingStore;
//!
//! let mut store = TrackingStore::new(Catalog::seed(), "user1", Box::new(SystemClock));
//! store.enroll("1");
//! let first = store.todays_tasks()[0].id.clone();
//! store.toggle_task(&first);
//! assert_eq!(store.current_protocol().unwrap().progress, 33);
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod db;
pub mod enrollment;
pub mod error;
pub mod fields;
pub mod notification;
pub mod store;
pub mod task;
