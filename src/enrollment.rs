//! Enrolled protocols: a user's running instance of a catalog template.
//!
//! An `EnrolledProtocol` owns its task instances and the progress derived from
//! them. Progress is stored as an integer percentage; older records that kept
//! a 0-1 fraction are converted when they are read.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::ProtocolTemplate;
use crate::task::TaskInstance;

/// Completed-task counts that earn an achievement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Milestone {
    /// Three tasks completed in one protocol.
    TaskMaster,
}

impl Milestone {
    /// The milestone earned by reaching exactly `completed` finished tasks.
    pub fn reached(completed: usize) -> Option<Milestone> {
        match completed {
            3 => Some(Milestone::TaskMaster),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Milestone::TaskMaster => "🏆 Achievement Unlocked: Task Master!",
        }
    }
}

/// A user's instance of a protocol template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledProtocol {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub template_id: String,
    /// Template title at enrollment time.
    #[serde(default)]
    pub title: String,
    pub start_date: NaiveDate,
    /// Completion percentage, 0 to 100.
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default)]
    pub tasks: Vec<TaskInstance>,
    /// Achievements already announced for this enrollment.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub milestones: BTreeSet<Milestone>,
}

impl EnrolledProtocol {
    /// Instantiate `template` for `user_id`. Task ids are `ut<seq>-<task id>`.
    pub fn from_template(
        id: String,
        seq: u64,
        user_id: &str,
        template: &ProtocolTemplate,
        start_date: NaiveDate,
    ) -> Self {
        let tasks = template
            .tasks
            .iter()
            .map(|def| TaskInstance::from_definition(format!("ut{}-{}", seq, def.id), def))
            .collect();
        EnrolledProtocol {
            id,
            user_id: user_id.to_string(),
            template_id: template.id.clone(),
            title: template.title.clone(),
            start_date,
            progress: 0,
            tasks,
            milestones: BTreeSet::new(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn recompute_progress(&mut self) {
        self.progress = progress_percent(self.completed_count(), self.tasks.len());
    }

    /// Toggle the task with `task_id` and refresh progress.
    /// Returns the task's new completion state, or `None` if no task matched.
    pub fn toggle_task(&mut self, task_id: &str, today: NaiveDate) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        let completed = task.toggle(today);
        self.recompute_progress();
        Some(completed)
    }

    /// Record `milestone`; returns false if it had already been awarded.
    pub fn award(&mut self, milestone: Milestone) -> bool {
        self.milestones.insert(milestone)
    }

    /// Placeholder id for the task at `index` when its record had none.
    /// A numeric suffix is added while another task already holds the id.
    pub fn placeholder_task_id(&self, index: usize) -> String {
        let base = format!("task-{}-{}", self.id, index);
        let mut id = base.clone();
        let mut n = 2;
        while self.tasks.iter().any(|t| t.id == id) {
            id = format!("{base}-{n}");
            n += 1;
        }
        id
    }

    /// Bring an ingested record in line with the invariants: every task has an
    /// id and title, completion dates match completion flags and progress
    /// matches the task list.
    pub fn repair(&mut self, today: NaiveDate) {
        for i in 0..self.tasks.len() {
            let placeholder = self.placeholder_task_id(i);
            let task = &mut self.tasks[i];
            *task = task.normalized(|| placeholder);
            task.repair_completion(today);
        }
        self.recompute_progress();
    }

    /// Numeric part of an `up<N>` id, used to pick the next free id.
    pub fn sequence(&self) -> Option<u64> {
        self.id.strip_prefix("up")?.parse().ok()
    }
}

/// `round(100 * completed / total)`, or 0 when there are no tasks.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    // Integer round-half-up of 100 * completed / total.
    ((200 * completed + total) / (2 * total)) as u8
}

/// Accept either a 0-100 percentage or a 0-1 fraction written as a float.
fn deserialize_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    let pct = match (n.as_u64(), n.as_f64()) {
        (Some(whole), _) => whole as f64,
        (None, Some(f)) if (0.0..=1.0).contains(&f) => f * 100.0,
        (None, Some(f)) => f,
        (None, None) => 0.0,
    };
    Ok(pct.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
    }

    fn enrolled() -> EnrolledProtocol {
        let catalog = Catalog::seed();
        EnrolledProtocol::from_template("up1".into(), 1, "user1", catalog.get("1").unwrap(), start())
    }

    #[test]
    fn test_from_template() {
        let p = enrolled();
        assert_eq!(p.template_id, "1");
        assert_eq!(p.title, "30-Day Fitness Challenge");
        assert_eq!(p.progress, 0);
        let ids: Vec<&str> = p.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["ut1-t1", "ut1-t2", "ut1-t3"]);
        assert!(p.tasks.iter().all(|t| !t.completed));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(1, 2), 50);
    }

    #[test]
    fn test_progress_matches_formula_for_all_counts() {
        for total in 0..=12usize {
            for done in 0..=total {
                let expected = if total == 0 {
                    0
                } else {
                    (100.0 * done as f64 / total as f64).round() as u8
                };
                let got = progress_percent(done, total);
                assert_eq!(got, expected, "{done}/{total}");
                assert!(got <= 100);
            }
        }
    }

    #[test]
    fn test_toggle_unknown_task() {
        let mut p = enrolled();
        let before = p.clone();
        assert_eq!(p.toggle_task("nope", start()), None);
        assert_eq!(p, before);
    }

    #[test]
    fn test_award_once() {
        let mut p = enrolled();
        assert!(p.award(Milestone::TaskMaster));
        assert!(!p.award(Milestone::TaskMaster));
    }

    #[test]
    fn test_milestone_reached_only_at_three() {
        assert_eq!(Milestone::reached(2), None);
        assert_eq!(Milestone::reached(3), Some(Milestone::TaskMaster));
        assert_eq!(Milestone::reached(4), None);
        assert!(Milestone::TaskMaster.message().contains("Task Master"));
    }

    #[test]
    fn test_fraction_progress_is_converted() {
        let json = r#"{"id": "up1", "userId": "user1", "templateId": "1",
                       "progress": 0.65, "startDate": "2025-02-15", "tasks": []}"#;
        let p: EnrolledProtocol = serde_json::from_str(json).unwrap();
        assert_eq!(p.progress, 65);

        let json = r#"{"id": "up2", "templateId": "1", "progress": 40, "startDate": "2025-02-15"}"#;
        let p: EnrolledProtocol = serde_json::from_str(json).unwrap();
        assert_eq!(p.progress, 40);

        let json = r#"{"id": "up3", "templateId": "1", "progress": 250, "startDate": "2025-02-15"}"#;
        let p: EnrolledProtocol = serde_json::from_str(json).unwrap();
        assert_eq!(p.progress, 100);
    }

    #[test]
    fn test_repair_fills_ids_and_recomputes_progress() {
        let json = r#"{"id": "up1", "templateId": "1", "progress": 0.65, "startDate": "2025-02-15",
                       "tasks": [{"id": "ut1", "title": "Morning Run", "completed": true,
                                  "completedDate": "2025-03-06"},
                                 {"title": "Meditation", "completed": true},
                                 {"id": "ut3", "completedDate": "2025-03-06"}]}"#;
        let mut p: EnrolledProtocol = serde_json::from_str(json).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        p.repair(today);
        assert_eq!(p.tasks[1].id, "task-up1-1");
        assert_eq!(p.tasks[1].completed_date, Some(today));
        assert_eq!(p.tasks[2].title, "Untitled Task");
        assert_eq!(p.tasks[2].completed_date, None);
        assert_eq!(p.progress, 67);
    }

    #[test]
    fn test_placeholder_skips_ids_already_taken() {
        let json = r#"{"id": "up1", "templateId": "1", "startDate": "2025-02-15",
                       "tasks": [{"id": "task-up1-1", "title": "A"}, {"title": "B"}]}"#;
        let mut p: EnrolledProtocol = serde_json::from_str(json).unwrap();
        p.repair(start());
        let ids: Vec<&str> = p.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["task-up1-1", "task-up1-1-2"]);

        let b = p.tasks[1].id.clone();
        assert_eq!(p.toggle_task(&b, start()), Some(true));
        let completed: Vec<bool> = p.tasks.iter().map(|t| t.completed).collect();
        assert_eq!(completed, [false, true]);
    }

    #[test]
    fn test_sequence() {
        assert_eq!(enrolled().sequence(), Some(1));
        let mut p = enrolled();
        p.id = "custom".into();
        assert_eq!(p.sequence(), None);
    }
}
