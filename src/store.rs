//! The session-scoped tracking store.
//!
//! `TrackingStore` owns the enrolled protocols, the current-protocol pointer
//! and the notification slot for one user session. It is constructed
//! explicitly and handed to whatever drives it; independent stores never
//! share state.
//!
//! The current protocol is held as an id and resolved against the enrolled
//! list on every read, so it can never point at a protocol that is no longer
//! enrolled. "Today's tasks" is computed on read from the current protocol.

use chrono::Duration;

use crate::catalog::{Catalog, ProtocolTemplate};
use crate::clock::Clock;
use crate::db::Session;
use crate::enrollment::{EnrolledProtocol, Milestone};
use crate::notification::{NotificationState, Notifier};
use crate::task::TaskInstance;

/// Whether an id lookup found its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found,
    Missing,
}

/// Result of [`TrackingStore::toggle_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No protocol is selected; nothing changed.
    NoCurrentProtocol,
    /// The current protocol has no task with that id; nothing changed.
    UnknownTask,
    Toggled {
        completed: bool,
        progress: u8,
        /// Achievement announced by this toggle, if any.
        milestone: Option<Milestone>,
    },
}

impl ToggleOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, ToggleOutcome::Toggled { .. })
    }
}

pub struct TrackingStore {
    catalog: Catalog,
    user_id: String,
    enrolled: Vec<EnrolledProtocol>,
    current: Option<String>,
    notifier: Notifier,
    clock: Box<dyn Clock>,
}

impl TrackingStore {
    /// An empty session for `user_id`.
    pub fn new(catalog: Catalog, user_id: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        TrackingStore {
            catalog,
            user_id: user_id.into(),
            enrolled: Vec::new(),
            current: None,
            notifier: Notifier::default(),
            clock,
        }
    }

    /// Rebuild a store from a saved session.
    ///
    /// Ingested protocols are repaired (placeholder ids, completion dates,
    /// progress), duplicate ids are dropped and a dangling current pointer is
    /// cleared. The notification keeps the default window and is not ticked;
    /// use [`TrackingStore::restore`] to reopen with a configured window.
    pub fn from_session(catalog: Catalog, session: Session, clock: Box<dyn Clock>) -> Self {
        let today = clock.today();
        let mut enrolled: Vec<EnrolledProtocol> = Vec::with_capacity(session.enrolled_protocols.len());
        for mut protocol in session.enrolled_protocols {
            if enrolled.iter().any(|p| p.id == protocol.id) {
                tracing::warn!(protocol = %protocol.id, "dropping duplicate enrolled protocol");
                continue;
            }
            protocol.repair(today);
            enrolled.push(protocol);
        }

        let current = session
            .current_protocol_id
            .filter(|id| enrolled.iter().any(|p| &p.id == id));

        TrackingStore {
            catalog,
            user_id: session.user_id,
            enrolled,
            current,
            notifier: session.notification,
            clock,
        }
    }

    /// Reopen a saved session with the given notification window, hiding a
    /// notification whose window has already elapsed.
    pub fn restore(catalog: Catalog, session: Session, clock: Box<dyn Clock>, window: Duration) -> Self {
        let mut store = TrackingStore::from_session(catalog, session, clock).with_notification_window(window);
        store.tick();
        store
    }

    /// Snapshot of the state worth persisting.
    pub fn to_session(&self) -> Session {
        Session {
            user_id: self.user_id.clone(),
            enrolled_protocols: self.enrolled.clone(),
            current_protocol_id: self.current.clone(),
            notification: self.notifier.clone(),
        }
    }

    pub fn with_notification_window(mut self, window: Duration) -> Self {
        self.notifier.set_window(window);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Change the user stamped on new enrollments. Existing enrollments keep
    /// their user id.
    pub fn set_user(&mut self, user_id: impl Into<String>) {
        self.user_id = user_id.into();
    }

    pub fn available_protocols(&self) -> &[ProtocolTemplate] {
        self.catalog.templates()
    }

    pub fn template(&self, id: &str) -> Option<&ProtocolTemplate> {
        self.catalog.get(id)
    }

    pub fn enrolled_protocols(&self) -> &[EnrolledProtocol] {
        &self.enrolled
    }

    pub fn current_protocol(&self) -> Option<&EnrolledProtocol> {
        let id = self.current.as_deref()?;
        self.enrolled.iter().find(|p| p.id == id)
    }

    /// Tasks of the current protocol, with placeholder ids and titles filled
    /// in. Empty when nothing is selected.
    pub fn todays_tasks(&self) -> Vec<TaskInstance> {
        let Some(protocol) = self.current_protocol() else {
            return Vec::new();
        };
        protocol
            .tasks
            .iter()
            .enumerate()
            .map(|(i, task)| task.normalized(|| protocol.placeholder_task_id(i)))
            .collect()
    }

    /// Enroll in the template with `template_id` and make it current.
    /// Returns `None`, changing nothing, if no such template exists.
    pub fn enroll(&mut self, template_id: &str) -> Option<&EnrolledProtocol> {
        let Some(template) = self.catalog.get(template_id) else {
            tracing::debug!(template = template_id, "enroll: unknown template");
            return None;
        };

        let seq = self.next_sequence();
        let protocol = EnrolledProtocol::from_template(
            format!("up{seq}"),
            seq,
            &self.user_id,
            template,
            self.clock.today(),
        );
        let message = format!("Enrolled in {}", template.title);
        tracing::info!(protocol = %protocol.id, template = template_id, "enrolled");

        self.current = Some(protocol.id.clone());
        self.enrolled.push(protocol);
        self.notifier.show(message, self.clock.now());
        self.enrolled.last()
    }

    /// Point the current-protocol selector at `protocol_id`.
    /// An unknown id clears the selection.
    pub fn select_current(&mut self, protocol_id: &str) -> Lookup {
        if self.enrolled.iter().any(|p| p.id == protocol_id) {
            tracing::debug!(protocol = protocol_id, "selected protocol");
            self.current = Some(protocol_id.to_string());
            Lookup::Found
        } else {
            tracing::debug!(protocol = protocol_id, "select: unknown protocol, clearing selection");
            self.current = None;
            Lookup::Missing
        }
    }

    /// Drop an enrollment. Clears the selection if it was current.
    pub fn unenroll(&mut self, protocol_id: &str) -> Lookup {
        let Some(idx) = self.enrolled.iter().position(|p| p.id == protocol_id) else {
            return Lookup::Missing;
        };
        self.enrolled.remove(idx);
        if self.current.as_deref() == Some(protocol_id) {
            self.current = None;
        }
        tracing::info!(protocol = protocol_id, "unenrolled");
        Lookup::Found
    }

    /// Toggle a task of the current protocol, refresh its progress and
    /// announce any milestone reached for the first time.
    pub fn toggle_task(&mut self, task_id: &str) -> ToggleOutcome {
        let Some(current) = self.current.as_deref() else {
            return ToggleOutcome::NoCurrentProtocol;
        };
        let Some(protocol) = self.enrolled.iter_mut().find(|p| p.id == current) else {
            return ToggleOutcome::NoCurrentProtocol;
        };

        let today = self.clock.today();
        let Some(completed) = protocol.toggle_task(task_id, today) else {
            tracing::debug!(task = task_id, "toggle: unknown task");
            return ToggleOutcome::UnknownTask;
        };
        let progress = protocol.progress;

        let milestone = Milestone::reached(protocol.completed_count())
            .filter(|m| protocol.award(*m));
        tracing::info!(protocol = %protocol.id, task = task_id, completed, progress, "task toggled");

        if let Some(m) = milestone {
            self.notifier.show(m.message(), self.clock.now());
        }
        ToggleOutcome::Toggled { completed, progress, milestone }
    }

    /// Current notification, with an elapsed display window treated as hidden.
    pub fn notification(&self) -> NotificationState {
        self.notifier.state_at(self.clock.now())
    }

    pub fn show_notification(&mut self, message: impl Into<String>) {
        self.notifier.show(message, self.clock.now());
    }

    pub fn dismiss_notification(&mut self) -> bool {
        self.notifier.dismiss()
    }

    /// Run the auto-dismiss timer against the store clock.
    pub fn tick(&mut self) -> bool {
        self.notifier.tick(self.clock.now())
    }

    fn next_sequence(&self) -> u64 {
        self.enrolled.iter().filter_map(|p| p.sequence()).max().unwrap_or(0) + 1
    }
}
