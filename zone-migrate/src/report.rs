use colored::Colorize;
use serde::Serialize;

use crate::batch::BatchOutcome;
use crate::changes::{format_summary, format_text, RuleChange};
use crate::garp::GarpPlan;
use crate::review::{ReasonCode, ReviewEntry};

/// Render review entries for terminal output.
pub fn render_reviews(reviews: &[ReviewEntry]) -> String {
    let mut out = vec![format!("review_entries={}", reviews.len())
        .cyan()
        .to_string()];
    for review in reviews {
        let line = review.to_string();
        let colored = match review.reason {
            ReasonCode::MalformedRule
            | ReasonCode::ResolutionCycle
            | ReasonCode::MisconfiguredSourceNat => line.red().to_string(),
            ReasonCode::ZoneNotFound => line.normal().to_string(),
            _ => line.yellow().to_string(),
        };
        out.push(colored);
    }
    out.join("\n")
}

/// Render rule changes for terminal output.
pub fn render_changes(changes: &[RuleChange]) -> String {
    let raw = format_text(changes);
    let mut out = Vec::new();

    for line in raw.lines() {
        let colored = if line.starts_with('+') {
            line.green().to_string()
        } else if line.starts_with('~') {
            line.yellow().to_string()
        } else {
            line.to_string()
        };
        out.push(colored);
    }

    out.join("\n")
}

/// Render change counts for terminal output.
pub fn render_change_summary(changes: &[RuleChange]) -> String {
    format_summary(changes).cyan().to_string()
}

/// Render a gARP plan as runnable commands grouped by origin.
pub fn render_garp(plan: &GarpPlan) -> String {
    let mut out = Vec::new();
    out.push("# interfaces".bold().to_string());
    out.extend(plan.interfaces.iter().map(ToString::to_string));
    out.push("# nat".bold().to_string());
    out.extend(plan.nat.iter().map(ToString::to_string));
    if !plan.reviews.is_empty() {
        out.push(String::new());
        out.push(render_reviews(&plan.reviews));
    }
    out.join("\n")
}

/// JSON payload for a migration run.
#[derive(Debug, Serialize)]
pub struct MigrationReport<'a> {
    pub rules: usize,
    pub reviews: &'a [ReviewEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<&'a [RuleChange]>,
}

impl<'a> MigrationReport<'a> {
    pub fn new(outcome: &'a BatchOutcome, changes: Option<&'a [RuleChange]>) -> Self {
        Self {
            rules: outcome.rules.len(),
            reviews: &outcome.reviews,
            changes,
        }
    }
}
