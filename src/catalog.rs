//! Protocol catalog: the read-only list of templates users can enroll in.
//!
//! Templates are loaded from a JSON array (the same camelCase shape the
//! mobile client consumes) or, when no catalog file is configured, taken from
//! the built-in seed list.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::fields::{lenient_frequency, Frequency};

/// A task inside a protocol template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_frequency", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    /// Free-form duration label, e.g. "10 min".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Short tips for getting the task done.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strategies: Vec<String>,
}

/// An instructor-authored protocol users can enroll in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Instructor who authored the template.
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
    /// Display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_count: Option<u32>,
}

/// In-memory template list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: Vec<ProtocolTemplate>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate template ids and duplicate task
    /// ids within a template.
    pub fn new(templates: Vec<ProtocolTemplate>) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in &templates {
            if !seen.insert(t.id.as_str()) {
                return Err(TrackerError::Config(format!("duplicate template id '{}'", t.id)));
            }
            let mut task_ids = HashSet::new();
            for task in &t.tasks {
                if !task_ids.insert(task.id.as_str()) {
                    return Err(TrackerError::Config(format!(
                        "duplicate task id '{}' in template '{}'",
                        task.id, t.id
                    )));
                }
            }
        }
        Ok(Catalog { templates })
    }

    /// Load templates from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = fs::read_to_string(path).map_err(|e| TrackerError::io(path, e))?;
        let templates: Vec<ProtocolTemplate> =
            serde_json::from_str(&buf).map_err(|e| TrackerError::parse(path, e))?;
        tracing::debug!(path = %path.display(), count = templates.len(), "loaded catalog");
        Catalog::new(templates)
    }

    pub fn templates(&self) -> &[ProtocolTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&ProtocolTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// The built-in templates.
    pub fn seed() -> Self {
        Catalog { templates: seed_templates() }
    }
}

fn task(id: &str, title: &str, description: &str, strategies: &[&str]) -> TaskDefinition {
    TaskDefinition {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        frequency: Some(Frequency::Daily),
        duration: None,
        strategies: strategies.iter().map(|s| s.to_string()).collect(),
    }
}

fn seed_templates() -> Vec<ProtocolTemplate> {
    vec![
        ProtocolTemplate {
            id: "4".into(),
            title: "Huberman Productivity Protocol".into(),
            description: "Optimize productivity using Andrew Huberman's scientifically-backed routine"
                .into(),
            created_by: "instructor1".into(),
            enrolled_count: Some(15),
            tasks: vec![
                task("h1", "Wake up early (5:30-6:00 AM)", "Consistent wake time optimizes circadian rhythm", &[]),
                task(
                    "h2",
                    "Morning sunlight exposure (10-30 min)",
                    "Go outside without sunglasses to set circadian rhythm",
                    &[],
                ),
                task(
                    "h3",
                    "Cold exposure (shower or face washing)",
                    "Brief cold exposure increases alertness and focus",
                    &[],
                ),
                task(
                    "h4",
                    "90-minute focused work blocks",
                    "Set timer for intense focus periods with breaks in between",
                    &[],
                ),
                task("h5", "Non-sleep deep rest (20 min)", "Mid-day meditation or relaxation to restore focus", &[]),
                task("h6", "Set up a distraction-free workspace", "Create environment conducive to deep work", &[]),
                task(
                    "h7",
                    "Wind down 1-2 hours before bed",
                    "Reduce blue light and mental stimulation before sleep",
                    &[],
                ),
            ],
        },
        ProtocolTemplate {
            id: "1".into(),
            title: "30-Day Fitness Challenge".into(),
            description: "Build strength and endurance over 30 days".into(),
            created_by: "instructor1".into(),
            enrolled_count: Some(12),
            tasks: vec![
                task("t1", "Morning Run", "Run 5K at a moderate pace", &[
                    "Start with a 5-minute warm-up",
                    "Cool down with stretching for 5 minutes",
                ]),
                task("t2", "Meditation", "Mindful meditation for 10 minutes", &[
                    "Find a quiet, comfortable spot",
                    "Schedule a consistent time each day",
                ]),
                task("t3", "Reading", "Read 20 pages of a book", &[]),
            ],
        },
        ProtocolTemplate {
            id: "2".into(),
            title: "Morning Routine".into(),
            description: "Start your day with energy and focus".into(),
            created_by: "instructor1".into(),
            enrolled_count: Some(8),
            tasks: vec![
                task("t4", "Hydration", "Drink 500ml of water upon waking", &[
                    "Keep a glass of water next to your bed",
                ]),
                task("t5", "Stretching", "10 minutes of full-body stretching", &[]),
                task("t6", "Journaling", "Write 3 things you're grateful for", &[]),
            ],
        },
        ProtocolTemplate {
            id: "3".into(),
            title: "Nutrition Plan".into(),
            description: "Balanced meals for optimal performance".into(),
            created_by: "instructor2".into(),
            enrolled_count: Some(5),
            tasks: vec![
                task("t7", "Protein Breakfast", "Eat a high-protein breakfast", &[]),
                task("t8", "Meal Prep", "Prepare meals for the next day", &[]),
                task("t9", "Water Intake", "Drink at least 2 liters of water", &[
                    "Set hourly reminders on your phone",
                    "Keep a reusable water bottle nearby",
                ]),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_seed_catalog() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.templates().len(), 4);
        assert!(Catalog::new(seed_templates()).is_ok());
        let huberman = catalog.get("4").unwrap();
        assert_eq!(huberman.tasks.len(), 7);
        let fitness = catalog.get("1").unwrap();
        assert_eq!(fitness.title, "30-Day Fitness Challenge");
        assert_eq!(fitness.tasks.len(), 3);
        assert!(catalog.get("404").is_none());
    }

    #[test]
    fn test_load_partial_records() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"id": "p1", "title": "Sleep", "createdBy": "coach",
                 "tasks": [{{"id": "s1", "title": "Lights out", "frequency": "Daily"}},
                           {{"id": "s2", "title": "No screens", "frequency": "most nights"}}]}}]"#
        )
        .unwrap();
        let catalog = Catalog::load(f.path()).unwrap();
        let t = catalog.get("p1").unwrap();
        assert_eq!(t.created_by, "coach");
        assert_eq!(t.description, "");
        assert_eq!(t.tasks[0].frequency, Some(Frequency::Daily));
        assert_eq!(t.tasks[1].frequency, None);
        assert!(t.tasks[1].strategies.is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{not json").unwrap();
        assert!(matches!(Catalog::load(f.path()), Err(TrackerError::Parse { .. })));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut templates = seed_templates();
        templates.push(templates[0].clone());
        assert!(matches!(Catalog::new(templates), Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_duplicate_task_ids_rejected() {
        let mut template = seed_templates().remove(1);
        template.tasks[1].id = template.tasks[0].id.clone();
        match Catalog::new(vec![template]) {
            Err(TrackerError::Config(msg)) => assert!(msg.contains("duplicate task id 't1'")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_same_task_id_in_different_templates_is_fine() {
        let mut a = seed_templates().remove(1);
        let mut b = seed_templates().remove(2);
        a.tasks.truncate(1);
        b.tasks.truncate(1);
        b.tasks[0].id = a.tasks[0].id.clone();
        assert!(Catalog::new(vec![a, b]).is_ok());
    }
}
