//! Command implementations for the CLI interface.
//!
//! Each handler works on an already opened [`TrackingStore`]. Handlers that
//! change state return `true` so `main` knows to write the session back.
//! Unknown ids print a message and exit with status 1.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use protocol_tracker::catalog::ProtocolTemplate;
use protocol_tracker::db::*;
use protocol_tracker::enrollment::EnrolledProtocol;
use protocol_tracker::fields::*;
use protocol_tracker::store::{Lookup, ToggleOutcome, TrackingStore};
use protocol_tracker::task::TaskInstance;

#[derive(Subcommand)]
pub enum Commands {
    /// List protocols available for enrollment.
    Catalog,

    /// Show a protocol template with its tasks and strategies.
    Show {
        /// Template ID or title.
        template: String,
    },

    /// Enroll in a protocol and make it current.
    Enroll {
        /// Template ID or title.
        template: String,
    },

    /// List enrolled protocols with their progress.
    Enrolled {
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Enrolled)]
        sort: SortKey,
    },

    /// Select the current protocol.
    Select {
        /// Enrolled protocol ID or title.
        protocol: String,
    },

    /// Leave a protocol, discarding its progress.
    Unenroll {
        /// Enrolled protocol ID or title.
        protocol: String,
    },

    /// Show today's tasks for the current protocol.
    Today {
        /// Which tasks to show.
        #[arg(long, value_enum, default_value_t = TaskFilter::All)]
        filter: TaskFilter,
    },

    /// Check or uncheck one of today's tasks.
    Toggle {
        /// Task ID or title.
        task: String,
    },

    /// Show the current notification, if one is visible.
    Notification,

    /// Dismiss the current notification.
    Dismiss,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Print the notification line if one is visible.
fn print_notification(store: &TrackingStore) {
    let n = store.notification();
    if n.is_visible {
        println!(">> {}", n.message);
    }
}

/// Resolve a template identifier (ID or title).
fn resolve_template<'a>(store: &'a TrackingStore, identifier: &str) -> &'a ProtocolTemplate {
    if let Some(t) = store.template(identifier) {
        return t;
    }
    let needle = identifier.to_lowercase();
    let matches: Vec<&ProtocolTemplate> = store
        .available_protocols()
        .iter()
        .filter(|t| t.title.to_lowercase() == needle)
        .collect();
    match matches.as_slice() {
        [one] => *one,
        [] => {
            eprintln!("No protocol found with id or title '{}'", identifier);
            std::process::exit(1);
        }
        _ => {
            eprintln!("Multiple protocols found with title '{}':", identifier);
            for t in &matches {
                eprintln!("  {}: {}", t.id, t.title);
            }
            eprintln!("Please use the specific ID instead.");
            std::process::exit(1);
        }
    }
}

fn resolve_enrolled(store: &TrackingStore, identifier: &str) -> String {
    match resolve_protocol_identifier(identifier, store.enrolled_protocols()) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error resolving protocol: {}", e);
            std::process::exit(1);
        }
    }
}

/// List the protocol catalog.
pub fn cmd_catalog(store: &TrackingStore) {
    println!("{:<6} {:<26} {:<6} {:<12} {}", "ID", "Title", "Tasks", "Author", "Description");
    for t in store.available_protocols() {
        println!(
            "{:<6} {:<26} {:<6} {:<12} {}",
            truncate(&t.id, 6),
            truncate(&t.title, 26),
            t.tasks.len(),
            truncate(&t.created_by, 12),
            t.description
        );
    }
}

/// Show a template in detail.
pub fn cmd_show(store: &TrackingStore, template: String) {
    let t = resolve_template(store, &template);
    println!("{} ({})", t.title, t.id);
    if !t.description.is_empty() {
        println!("{}", t.description);
    }
    if !t.created_by.is_empty() {
        println!("By: {}", t.created_by);
    }
    if let Some(count) = t.enrolled_count {
        println!("Enrolled: {}", count);
    }
    println!();
    for (i, task) in t.tasks.iter().enumerate() {
        let duration = task.duration.as_deref().map(|d| format!(", {d}")).unwrap_or_default();
        println!("{}. {} [{}{}]", i + 1, task.title, format_frequency(task.frequency), duration);
        if !task.description.is_empty() {
            println!("   {}", task.description);
        }
        for s in &task.strategies {
            println!("   - {}", s);
        }
    }
}

/// Enroll in a template.
pub fn cmd_enroll(store: &mut TrackingStore, template: String) -> bool {
    let template_id = resolve_template(store, &template).id.clone();
    match store.enroll(&template_id) {
        Some(p) => println!("Enrolled as {} ({} tasks)", p.id, p.tasks.len()),
        None => {
            eprintln!("Protocol {} not found.", template_id);
            std::process::exit(1);
        }
    }
    print_notification(store);
    true
}

/// List enrolled protocols.
pub fn cmd_enrolled(store: &TrackingStore, sort: SortKey) {
    let mut protocols: Vec<&EnrolledProtocol> = store.enrolled_protocols().iter().collect();
    if protocols.is_empty() {
        println!("Not enrolled in any protocol. Try `ptrack catalog`.");
        return;
    }
    match sort {
        SortKey::Enrolled => {}
        SortKey::Progress => protocols.sort_by(|a, b| b.progress.cmp(&a.progress)),
        SortKey::Start => protocols.sort_by_key(|p| p.start_date),
    }
    let current = store.current_protocol().map(|p| p.id.as_str());
    print_protocol_table(&protocols, current);
}

/// Select the current protocol.
pub fn cmd_select(store: &mut TrackingStore, protocol: String) -> bool {
    let id = resolve_enrolled(store, &protocol);
    if store.select_current(&id) == Lookup::Missing {
        eprintln!("Protocol {} not found.", id);
        std::process::exit(1);
    }
    if let Some(p) = store.current_protocol() {
        println!("Current protocol: {} ({}%)", p.title, p.progress);
    }
    true
}

/// Drop an enrollment.
pub fn cmd_unenroll(store: &mut TrackingStore, protocol: String) -> bool {
    let id = resolve_enrolled(store, &protocol);
    if store.unenroll(&id) == Lookup::Missing {
        eprintln!("Protocol {} not found.", id);
        std::process::exit(1);
    }
    println!("Unenrolled {}", id);
    true
}

/// Print today's tasks.
pub fn cmd_today(store: &TrackingStore, filter: TaskFilter) {
    let Some(protocol) = store.current_protocol() else {
        println!("No current protocol. Use `ptrack enroll` or `ptrack select`.");
        return;
    };
    let tasks = store.todays_tasks();
    println!(
        "{} {} {}% ({}/{})",
        protocol.title,
        progress_bar(protocol.progress, 20),
        protocol.progress,
        protocol.completed_count(),
        protocol.tasks.len()
    );
    let shown: Vec<&TaskInstance> = tasks.iter().filter(|t| filter.matches(t.completed)).collect();
    if shown.is_empty() {
        println!("Nothing to show.");
        return;
    }
    print_task_table(&shown);
    print_notification(store);
}

/// Toggle one of today's tasks.
pub fn cmd_toggle(store: &mut TrackingStore, task: String) -> bool {
    let tasks = store.todays_tasks();
    let task_id = match resolve_task_identifier(&task, &tasks) {
        Ok(id) => id,
        Err(e) => {
            if store.current_protocol().is_none() {
                eprintln!("No current protocol. Use `ptrack enroll` or `ptrack select`.");
            } else {
                eprintln!("Error resolving task: {}", e);
            }
            std::process::exit(1);
        }
    };
    let title = tasks
        .iter()
        .find(|t| t.id == task_id)
        .map(|t| t.title.clone())
        .unwrap_or_default();

    match store.toggle_task(&task_id) {
        ToggleOutcome::Toggled { completed, progress, .. } => {
            let verb = if completed { "Completed" } else { "Reopened" };
            println!("{} '{}' - progress {}%", verb, title, progress);
        }
        ToggleOutcome::NoCurrentProtocol => {
            eprintln!("No current protocol. Use `ptrack enroll` or `ptrack select`.");
            std::process::exit(1);
        }
        ToggleOutcome::UnknownTask => {
            eprintln!("Task {} not found.", task_id);
            std::process::exit(1);
        }
    }
    print_notification(store);
    true
}

/// Show the notification slot.
pub fn cmd_notification(store: &TrackingStore) {
    let n = store.notification();
    if n.is_visible {
        println!("{}", n.message);
    } else {
        println!("No notification.");
    }
}

/// Dismiss the notification.
pub fn cmd_dismiss(store: &mut TrackingStore) -> bool {
    if store.dismiss_notification() {
        println!("Dismissed.");
        true
    } else {
        println!("No notification.");
        false
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
