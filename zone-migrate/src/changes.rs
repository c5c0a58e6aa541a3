//! Rule-level preview of what a migration run changed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::batch::OutputRule;
use crate::model::{Direction, RuleRecord, SecurityRule};

/// One changed zone or address field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub before: String,
    pub after: String,
}

/// Outcome for one output rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleChange {
    /// Rule has no counterpart in the input (an east-west clone).
    Added { rule: String },
    Modified { rule: String, fields: Vec<FieldChange> },
    Unchanged { rule: String },
}

/// Compare output rules against the input they were produced from.
///
/// Rules are matched by name. Verbatim rules are always unchanged.
pub fn compare(input: &[RuleRecord], output: &[OutputRule]) -> Vec<RuleChange> {
    let originals: BTreeMap<&str, &SecurityRule> = input
        .iter()
        .filter_map(|record| record.as_ref().ok())
        .map(|rule| (rule.name.as_str(), rule))
        .collect();

    output
        .iter()
        .map(|out| {
            let name = out.name().to_string();
            let Some(rule) = out.as_rule() else {
                return RuleChange::Unchanged { rule: name };
            };
            match originals.get(rule.name.as_str()) {
                None => RuleChange::Added { rule: name },
                Some(before) => {
                    let fields = field_changes(before, rule);
                    if fields.is_empty() {
                        RuleChange::Unchanged { rule: name }
                    } else {
                        RuleChange::Modified { rule: name, fields }
                    }
                }
            }
        })
        .collect()
}

fn field_changes(before: &SecurityRule, after: &SecurityRule) -> Vec<FieldChange> {
    let mut fields = Vec::new();
    for direction in Direction::BOTH {
        let pairs = [
            (direction.zone_field(), before.zones(direction), after.zones(direction)),
            (
                direction.address_field(),
                before.addresses(direction),
                after.addresses(direction),
            ),
        ];
        for (field, old, new) in pairs {
            if old != new {
                fields.push(FieldChange {
                    field: field.to_string(),
                    before: old.to_string(),
                    after: new.to_string(),
                });
            }
        }
    }
    fields
}

/// Format changes as plain text.
pub fn format_text(changes: &[RuleChange]) -> String {
    let mut lines = Vec::with_capacity(changes.len());
    for change in changes {
        match change {
            RuleChange::Added { rule } => lines.push(format!("+ {rule}")),
            RuleChange::Modified { rule, fields } => {
                lines.push(format!("~ {rule}"));
                for field in fields {
                    lines.push(format!("  {}: {} -> {}", field.field, field.before, field.after));
                }
            }
            RuleChange::Unchanged { rule } => lines.push(format!("= {rule}")),
        }
    }
    lines.join("\n")
}

/// Format a one-line summary of change counts.
pub fn format_summary(changes: &[RuleChange]) -> String {
    let mut added = 0;
    let mut modified = 0;
    let mut unchanged = 0;

    for change in changes {
        match change {
            RuleChange::Added { .. } => added += 1,
            RuleChange::Modified { .. } => modified += 1,
            RuleChange::Unchanged { .. } => unchanged += 1,
        }
    }

    format!("added={added} modified={modified} unchanged={unchanged}")
}
