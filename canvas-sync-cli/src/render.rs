//! Colored terminal rendering of sync results using owo_colors.

use canvas_sync_core::todo::DueTime;
use canvas_sync_core::{SyncReport, TodoAction};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for TodoAction {
    fn render(&self) -> String {
        match self {
            TodoAction::Create { summary, due, .. } => format!(
                "{} {} {}",
                "+".green(),
                summary.green(),
                due_label(due.as_ref()).dimmed()
            ),
            TodoAction::UpdateDue {
                summary, old, new, ..
            } => format!(
                "{} {} {}",
                "~".yellow(),
                summary.yellow(),
                format!(
                    "{} → {}",
                    due_label(old.as_ref()),
                    due_label(new.as_ref())
                )
                .dimmed()
            ),
            TodoAction::Complete { summary, .. } => {
                format!("{} {}", "✓".blue(), summary.blue())
            }
        }
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .actions
            .iter()
            .map(|action| format!("   {}", action.render()))
            .collect();

        if lines.is_empty() {
            lines.push("   No changes".dimmed().to_string());
        }

        lines.push(String::new());
        lines.push(summary_line(self));

        if self.skipped_inactive > 0 {
            lines.push(
                format!(
                    "Skipped {} {} of inactive courses",
                    self.skipped_inactive,
                    pluralize("todo", self.skipped_inactive)
                )
                .yellow()
                .to_string(),
            );
        }

        lines.join("\n")
    }
}

fn summary_line(report: &SyncReport) -> String {
    format!(
        "Tracking {} {}: {} created, {} due dates updated, {} completed",
        report.tracked,
        pluralize("assignment", report.tracked),
        report.created(),
        report.due_updates(),
        report.completed()
    )
}

fn due_label(due: Option<&DueTime>) -> String {
    match due {
        Some(due) => format!("due {}", due),
        None => "no due date".to_string(),
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
