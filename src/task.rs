//! Task instance data structure.
//!
//! A `TaskInstance` is the user's copy of a catalog task inside an enrolled
//! protocol. It owns the completion flag and the completion date, and keeps
//! them consistent: `completed_date` is set if and only if `completed` is.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::TaskDefinition;
use crate::fields::{lenient_frequency, Frequency};

/// Title shown for tasks whose source record carried none.
pub const UNTITLED_TASK: &str = "Untitled Task";

/// A single toggleable unit of work within an enrolled protocol.
///
/// Every field defaults on deserialization because enrollment data may come
/// from partially specified sources. [`TaskInstance::normalized`] fills the
/// gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInstance {
    #[serde(default)]
    pub id: String,
    /// Id of the catalog task this instance was created from.
    #[serde(default)]
    pub protocol_task_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_frequency", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl TaskInstance {
    /// Create a fresh, incomplete instance of a catalog task.
    pub fn from_definition(id: String, def: &TaskDefinition) -> Self {
        TaskInstance {
            id,
            protocol_task_id: def.id.clone(),
            title: def.title.clone(),
            description: Some(def.description.clone()).filter(|d| !d.is_empty()),
            frequency: def.frequency,
            completed: false,
            completed_date: None,
            due_date: None,
        }
    }

    /// Flip completion, stamping or clearing the completion date.
    /// Returns the new completion state.
    pub fn toggle(&mut self, today: NaiveDate) -> bool {
        self.completed = !self.completed;
        self.completed_date = if self.completed { Some(today) } else { None };
        self.completed
    }

    /// Copy of this task with a usable id and title.
    pub fn normalized(&self, placeholder_id: impl FnOnce() -> String) -> TaskInstance {
        let mut task = self.clone();
        if task.id.trim().is_empty() {
            task.id = placeholder_id();
        }
        if task.title.trim().is_empty() {
            task.title = UNTITLED_TASK.to_string();
        }
        task
    }

    /// Restore the completed/completed-date invariant on ingested data.
    ///
    /// A completed task with no date is stamped with `fallback`; an open task
    /// loses any stale date.
    pub fn repair_completion(&mut self, fallback: NaiveDate) {
        match (self.completed, self.completed_date) {
            (true, None) => self.completed_date = Some(fallback),
            (false, Some(_)) => self.completed_date = None,
            _ => {}
        }
    }
}
