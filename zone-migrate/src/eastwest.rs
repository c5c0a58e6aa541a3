//! East-west clone classification.
//!
//! A rule is cloned into the east-west zone when one of its directions names
//! the trust zone and either matches `any` address or names an address that
//! resolves inside the trust subnets. The clone swaps the trust zone for the
//! east-west zone in every direction that matched and keeps only the
//! addresses that fall inside the trust subnets. A trust-zone direction that
//! did not match keeps its addresses when none of them are inside the
//! subnets, so it never stops the other direction from being cloned. The
//! original rule is never touched; the caller places the clone right before
//! it.

use crate::config::ZoneMigrationConfig;
use crate::model::{AddressDirectory, Direction, MemberList, SecurityRule, ANY};
use crate::resolver::{is_contained_in_trust_subnets, AddressResolver};
use crate::review::{ReasonCode, ReviewEntry};

/// What one direction of a rule contributes to its clone.
#[derive(Debug, Default)]
struct DirectionScan {
    fired: bool,
    kept: Vec<String>,
    dropped: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct EastWestClassifier<'a> {
    config: &'a ZoneMigrationConfig,
    resolver: AddressResolver<'a>,
}

impl<'a> EastWestClassifier<'a> {
    pub fn new(config: &'a ZoneMigrationConfig, directory: &'a AddressDirectory) -> Self {
        Self {
            config,
            resolver: AddressResolver::new(directory),
        }
    }

    /// Return the east-west clone of `rule`, or `None` when it needs none.
    ///
    /// When a trust-zone direction that did not match has no address inside
    /// the trust subnets, the clone carries that list unchanged and a
    /// `clone-address-list-kept` review is recorded.
    pub fn classify(
        &self,
        rule: &SecurityRule,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Option<SecurityRule> {
        let mut scans = Vec::with_capacity(2);
        for direction in Direction::BOTH {
            if let Some(scan) = self.scan(rule, direction, reviews) {
                scans.push((direction, scan));
            }
        }
        if !scans.iter().any(|(_, scan)| scan.fired) {
            return None;
        }

        let settings = &self.config.eastwest;
        let mut clone = rule.renamed(format!("{}{}", rule.name, self.config.clone_suffix));
        for (direction, scan) in scans {
            // A direction that fired always keeps at least one address.
            let addresses = match MemberList::new(scan.kept) {
                Some(kept) => kept,
                None => {
                    reviews.push(ReviewEntry::new(
                        Some(&rule.name),
                        direction.address_field(),
                        ReasonCode::CloneAddressListKept,
                        format!(
                            "no {} address is inside the trust subnets; clone keeps {} unchanged",
                            direction.address_field(),
                            scan.dropped.join(", ")
                        ),
                    ));
                    rule.addresses(direction).clone()
                }
            };

            let zones = if scan.fired {
                rule.zones(direction)
                    .without(&settings.trust_zone)
                    .map(|zones| zones.with(&settings.zone))
                    .unwrap_or_else(|| MemberList::single(settings.zone.as_str()))
            } else {
                rule.zones(direction).clone()
            };
            clone = clone.with_direction(direction, zones, addresses);
        }

        tracing::debug!(rule = %rule.name, clone = %clone.name, "cloned rule into east-west zone");
        Some(clone)
    }

    /// Check one direction; `None` when it does not name the trust zone.
    fn scan(
        &self,
        rule: &SecurityRule,
        direction: Direction,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Option<DirectionScan> {
        if !rule.zones(direction).contains(&self.config.eastwest.trust_zone) {
            return None;
        }

        let single_ip = self.config.single_ip_mode();
        let subnets = &self.config.eastwest.trust_subnets;
        let mut scan = DirectionScan::default();

        for address in rule.addresses(direction).iter() {
            if address == ANY {
                // Single-host migrations only clone rules naming the host.
                scan.fired |= !single_ip;
                scan.kept.push(address.to_string());
                continue;
            }
            let ranges = self.resolver.resolve(address, Some(&rule.name), reviews);
            if is_contained_in_trust_subnets(&ranges, subnets) {
                scan.fired = true;
                scan.kept.push(address.to_string());
            } else {
                scan.dropped.push(address.to_string());
            }
        }
        Some(scan)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::EastWestSettings;
    use crate::model::{AddressKind, AddressObject};

    fn config(subnets: &[&str]) -> ZoneMigrationConfig {
        ZoneMigrationConfig {
            eastwest: EastWestSettings {
                trust_zone: "trust".to_string(),
                zone: "eastwest".to_string(),
                trust_subnets: subnets
                    .iter()
                    .map(|s| s.parse().expect("subnet"))
                    .collect(),
            },
            ..ZoneMigrationConfig::default()
        }
    }

    fn directory() -> AddressDirectory {
        AddressDirectory::new(
            vec![
                AddressObject {
                    name: "host-app".to_string(),
                    kind: AddressKind::IpNetmask,
                    values: vec!["10.1.1.5/32".to_string()],
                },
                AddressObject {
                    name: "partner-net".to_string(),
                    kind: AddressKind::IpNetmask,
                    values: vec!["192.168.50.0/24".to_string()],
                },
            ],
            Vec::new(),
        )
    }

    fn members(items: &[&str]) -> MemberList {
        MemberList::new(items.iter().copied()).expect("non-empty")
    }

    fn rule(name: &str, from: &[&str], to: &[&str], src: &[&str], dst: &[&str]) -> SecurityRule {
        SecurityRule {
            name: name.to_string(),
            from_zones: members(from),
            to_zones: members(to),
            sources: members(src),
            destinations: members(dst),
            attributes: BTreeMap::new(),
            passthrough: Vec::new(),
        }
    }

    #[test]
    fn contained_source_is_cloned_with_swapped_zone() {
        let cfg = config(&["10.1.1.0/24"]);
        let dir = directory();
        let input = rule("R2", &["trust"], &["untrust"], &["10.1.1.5/32"], &[ANY]);
        let before = input.clone();
        let mut reviews = Vec::new();

        let clone = EastWestClassifier::new(&cfg, &dir)
            .classify(&input, &mut reviews)
            .expect("clone");

        assert_eq!(clone.name, "R2-cloned");
        assert_eq!(clone.from_zones.as_slice(), ["eastwest"]);
        assert_eq!(clone.sources, input.sources);
        assert_eq!(clone.to_zones, input.to_zones);
        assert_eq!(input, before);
        assert!(reviews.is_empty());
    }

    #[test]
    fn single_ip_mode_skips_any_rules() {
        let cfg = config(&["10.1.1.5/32"]);
        let dir = directory();
        let input = rule("R4", &["trust"], &["untrust"], &[ANY], &[ANY]);
        let mut reviews = Vec::new();

        let clone = EastWestClassifier::new(&cfg, &dir).classify(&input, &mut reviews);

        assert!(clone.is_none());
        assert!(reviews.is_empty());
    }

    #[test]
    fn any_rule_is_cloned_outside_single_ip_mode() {
        let cfg = config(&["10.1.1.0/24"]);
        let dir = directory();
        let input = rule("allow-out", &["trust", "dmz"], &["untrust"], &[ANY], &[ANY]);
        let mut reviews = Vec::new();

        let clone = EastWestClassifier::new(&cfg, &dir)
            .classify(&input, &mut reviews)
            .expect("clone");

        assert_eq!(clone.from_zones.as_slice(), ["dmz", "eastwest"]);
        assert_eq!(clone.sources.as_slice(), [ANY]);
    }

    #[test]
    fn non_contained_addresses_are_dropped_from_clone() {
        let cfg = config(&["10.1.1.0/24"]);
        let dir = directory();
        let input = rule(
            "mixed",
            &["trust"],
            &["dmz"],
            &["host-app", "partner-net"],
            &[ANY],
        );
        let mut reviews = Vec::new();

        let clone = EastWestClassifier::new(&cfg, &dir)
            .classify(&input, &mut reviews)
            .expect("clone");

        assert_eq!(clone.sources.as_slice(), ["host-app"]);
        assert_eq!(input.sources.as_slice(), ["host-app", "partner-net"]);
    }

    #[test]
    fn rule_without_trust_zone_is_not_cloned() {
        let cfg = config(&["10.1.1.0/24"]);
        let dir = directory();
        let input = rule("dmz-out", &["dmz"], &["untrust"], &["10.1.1.5"], &[ANY]);
        let mut reviews = Vec::new();

        assert!(EastWestClassifier::new(&cfg, &dir)
            .classify(&input, &mut reviews)
            .is_none());
    }

    #[test]
    fn unmatched_source_does_not_block_destination_clone() {
        let cfg = config(&["10.1.1.0/24"]);
        let dir = directory();
        let input = rule(
            "to-app",
            &["trust"],
            &["trust"],
            &["partner-net"],
            &["host-app"],
        );
        let mut reviews = Vec::new();

        let clone = EastWestClassifier::new(&cfg, &dir)
            .classify(&input, &mut reviews)
            .expect("clone");

        assert_eq!(clone.name, "to-app-cloned");
        assert_eq!(clone.from_zones.as_slice(), ["trust"]);
        assert_eq!(clone.to_zones.as_slice(), ["eastwest"]);
        assert_eq!(clone.sources.as_slice(), ["partner-net"]);
        assert_eq!(clone.destinations.as_slice(), ["host-app"]);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].reason, ReasonCode::CloneAddressListKept);
        assert_eq!(reviews[0].subject, "source");
        assert_eq!(reviews[0].rule.as_deref(), Some("to-app"));
    }

    #[test]
    fn unmatched_destination_does_not_block_source_clone() {
        let cfg = config(&["10.1.1.0/24"]);
        let dir = directory();
        let input = rule(
            "from-app",
            &["trust"],
            &["trust"],
            &["host-app"],
            &["partner-net"],
        );
        let mut reviews = Vec::new();

        let clone = EastWestClassifier::new(&cfg, &dir)
            .classify(&input, &mut reviews)
            .expect("clone");

        assert_eq!(clone.from_zones.as_slice(), ["eastwest"]);
        assert_eq!(clone.to_zones.as_slice(), ["trust"]);
        assert_eq!(clone.destinations.as_slice(), ["partner-net"]);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].subject, "destination");
    }

    #[test]
    fn both_directions_can_fire() {
        let cfg = config(&["10.1.1.0/24"]);
        let dir = directory();
        let input = rule("lateral", &["trust"], &["trust"], &[ANY], &["host-app"]);
        let mut reviews = Vec::new();

        let clone = EastWestClassifier::new(&cfg, &dir)
            .classify(&input, &mut reviews)
            .expect("clone");

        assert_eq!(clone.from_zones.as_slice(), ["eastwest"]);
        assert_eq!(clone.to_zones.as_slice(), ["eastwest"]);
        assert_eq!(clone.destinations.as_slice(), ["host-app"]);
    }
}
