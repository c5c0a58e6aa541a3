//! Batch processing over a whole rulebase.
//!
//! Each rule is evaluated on its own and yields its output rules plus review
//! entries; the per-rule results are then concatenated in input order. The
//! processor holds only borrowed, read-only inputs, so running it twice on
//! the same rules gives the same outcome.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::{MalformedPolicy, MigrationPath, ZoneMigrationConfig};
use crate::eastwest::EastWestClassifier;
use crate::error::MigrateError;
use crate::intrazone::ZoneRewriter;
use crate::model::{AddressDirectory, MalformedRule, RuleRecord, SecurityRule};
use crate::review::{ReasonCode, ReviewEntry};

/// One rule in a batch result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "rule")]
pub enum OutputRule {
    Rule(SecurityRule),
    /// A malformed rule carried through untouched under `skip-rule`.
    Verbatim(MalformedRule),
}

impl OutputRule {
    pub fn name(&self) -> &str {
        match self {
            Self::Rule(rule) => &rule.name,
            Self::Verbatim(raw) => &raw.name,
        }
    }

    pub fn as_rule(&self) -> Option<&SecurityRule> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Verbatim(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub rules: Vec<OutputRule>,
    pub reviews: Vec<ReviewEntry>,
}

impl BatchOutcome {
    fn push(&mut self, rules: Vec<OutputRule>, reviews: Vec<ReviewEntry>) {
        self.rules.extend(rules);
        self.reviews.extend(reviews);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuleBatchProcessor<'a> {
    config: &'a ZoneMigrationConfig,
    directory: &'a AddressDirectory,
}

impl<'a> RuleBatchProcessor<'a> {
    pub fn new(config: &'a ZoneMigrationConfig, directory: &'a AddressDirectory) -> Self {
        Self { config, directory }
    }

    /// Rewrite every rule onto the intrazone zone, keeping input order.
    pub fn run_intrazone(&self, records: &[RuleRecord]) -> Result<BatchOutcome, MigrateError> {
        self.config.validate(MigrationPath::Intrazone)?;
        let rewriter = ZoneRewriter::new(&self.config.intrazone);
        let outcome = self.run(records, |rule, reviews| {
            vec![rewriter.rewrite(rule, reviews)]
        })?;
        tracing::info!(
            rules = outcome.rules.len(),
            reviews = outcome.reviews.len(),
            "intrazone migration finished"
        );
        Ok(outcome)
    }

    /// Add east-west clones, each placed immediately before its source rule.
    ///
    /// A clone whose name is already used by an input rule is not emitted;
    /// a `clone-name-taken` review is recorded instead.
    pub fn run_eastwest(&self, records: &[RuleRecord]) -> Result<BatchOutcome, MigrateError> {
        self.config.validate(MigrationPath::EastWest)?;
        let classifier = EastWestClassifier::new(self.config, self.directory);
        let taken: HashSet<&str> = records.iter().map(record_name).collect();
        let outcome = self.run(records, |rule, reviews| {
            match classifier.classify(rule, reviews) {
                Some(clone) if taken.contains(clone.name.as_str()) => {
                    tracing::warn!(rule = %rule.name, clone = %clone.name, "clone name already in use");
                    reviews.push(ReviewEntry::new(
                        Some(&rule.name),
                        clone.name.as_str(),
                        ReasonCode::CloneNameTaken,
                        format!(
                            "a rule named {} already exists; rule not cloned",
                            clone.name
                        ),
                    ));
                    vec![rule.clone()]
                }
                Some(clone) => vec![clone, rule.clone()],
                None => vec![rule.clone()],
            }
        })?;
        tracing::info!(
            rules = outcome.rules.len(),
            clones = outcome.rules.len() - records.len(),
            reviews = outcome.reviews.len(),
            "east-west migration finished"
        );
        Ok(outcome)
    }

    fn run<F>(&self, records: &[RuleRecord], per_rule: F) -> Result<BatchOutcome, MigrateError>
    where
        F: Fn(&SecurityRule, &mut Vec<ReviewEntry>) -> Vec<SecurityRule>,
    {
        let results = records
            .iter()
            .map(|record| self.evaluate(record, &per_rule))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcome = BatchOutcome::default();
        for (rules, reviews) in results {
            outcome.push(rules, reviews);
        }
        Ok(outcome)
    }

    fn evaluate<F>(
        &self,
        record: &RuleRecord,
        per_rule: &F,
    ) -> Result<(Vec<OutputRule>, Vec<ReviewEntry>), MigrateError>
    where
        F: Fn(&SecurityRule, &mut Vec<ReviewEntry>) -> Vec<SecurityRule>,
    {
        let rule = match record {
            Ok(rule) => rule,
            Err(malformed) => return self.handle_malformed(malformed),
        };
        let mut reviews = Vec::new();
        let rules = per_rule(rule, &mut reviews)
            .into_iter()
            .map(OutputRule::Rule)
            .collect();
        Ok((rules, reviews))
    }

    fn handle_malformed(
        &self,
        malformed: &MalformedRule,
    ) -> Result<(Vec<OutputRule>, Vec<ReviewEntry>), MigrateError> {
        match self.config.on_malformed {
            MalformedPolicy::AbortBatch => Err(MigrateError::MalformedRuleStructure {
                rule: malformed.name.clone(),
                field: malformed.field.clone(),
                reason: malformed.reason.clone(),
            }),
            MalformedPolicy::SkipRule => {
                tracing::warn!(rule = %malformed.name, field = %malformed.field, "carrying malformed rule through unchanged");
                let review = ReviewEntry::new(
                    Some(&malformed.name),
                    malformed.field.as_str(),
                    ReasonCode::MalformedRule,
                    format!(
                        "{}; rule left unchanged, commit or revert pending changes and rerun",
                        malformed.reason
                    ),
                );
                Ok((vec![OutputRule::Verbatim(malformed.clone())], vec![review]))
            }
        }
    }
}

fn record_name(record: &RuleRecord) -> &str {
    match record {
        Ok(rule) => &rule.name,
        Err(malformed) => &malformed.name,
    }
}
