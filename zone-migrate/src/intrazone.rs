//! Collapse legacy trusted zones into a single intrazone zone.

use crate::config::IntrazoneSettings;
use crate::model::{Direction, MemberList, SecurityRule};
use crate::review::ReviewEntry;

/// Rewrites rules so every mapped legacy zone becomes the intrazone zone.
///
/// For each direction, mapped zones are dropped and the intrazone zone is
/// appended once. When the paired address list is `any`, it is narrowed to
/// the address names configured for the matched zones, so the rule keeps
/// matching only the traffic it matched before the zones were merged.
#[derive(Debug, Clone, Copy)]
pub struct ZoneRewriter<'a> {
    settings: &'a IntrazoneSettings,
}

impl<'a> ZoneRewriter<'a> {
    pub fn new(settings: &'a IntrazoneSettings) -> Self {
        Self { settings }
    }

    /// Build the rewritten rule. `rule` is left untouched.
    ///
    /// Zones that are neither mapped nor already the intrazone zone are kept
    /// as they are and produce one `zone-not-found` review each.
    pub fn rewrite(&self, rule: &SecurityRule, reviews: &mut Vec<ReviewEntry>) -> SecurityRule {
        let mut out = rule.clone();
        for direction in Direction::BOTH {
            if let Some((zones, addresses)) = self.rewrite_direction(rule, direction, reviews) {
                out = out.with_direction(direction, zones, addresses);
            }
        }
        if out != *rule {
            tracing::debug!(rule = %rule.name, from = %out.from_zones, to = %out.to_zones, "rewrote zones");
        }
        out
    }

    fn rewrite_direction(
        &self,
        rule: &SecurityRule,
        direction: Direction,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Option<(MemberList, MemberList)> {
        let target = self.settings.zone.as_str();
        let mut kept = Vec::new();
        let mut mapped = Vec::new();

        for zone in rule.zones(direction).iter() {
            if zone == target {
                kept.push(zone);
            } else if let Some(address) = self.settings.legacy_zone_address(zone) {
                mapped.push(address);
            } else {
                reviews.push(ReviewEntry::zone_not_found(&rule.name, zone));
                kept.push(zone);
            }
        }

        if mapped.is_empty() {
            return None;
        }

        let zones = MemberList::new(kept.into_iter().chain([target]))?;
        let current = rule.addresses(direction);
        let addresses = if current.is_any() {
            MemberList::new(mapped)?
        } else {
            current.clone()
        };
        Some((zones, addresses))
    }
}
