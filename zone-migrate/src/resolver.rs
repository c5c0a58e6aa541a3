//! Address object and group resolution.
//!
//! Names in a rule's source/destination list are resolved to concrete
//! networks so they can be tested against the trust subnets:
//!
//! - an `ip-netmask` object resolves to its value(s)
//! - any other object type (FQDN, range, wildcard) resolves to a placeholder
//!   and is flagged for review
//! - a static group resolves to the concatenation of its members, through any
//!   number of nested groups up to [`MAX_GROUP_DEPTH`]
//! - a name that matches nothing is taken to be a literal IP or CIDR
//!
//! Resolution never fails. Cycles, dynamic groups, and unparsable literals
//! come back as review entries alongside the best-effort result.

use std::fmt::{self, Display, Formatter};

use ipnetwork::IpNetwork;
use serde::Serialize;

use crate::model::{AddressDirectory, AddressGroup, AddressKind, GroupMembers};
use crate::review::{ReasonCode, ReviewEntry};

/// Deepest group nesting followed before giving up.
pub const MAX_GROUP_DEPTH: usize = 16;

/// One resolved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "value")]
pub enum AddressRange {
    Network(IpNetwork),
    /// Stand-in for an object that exists but cannot be resolved here.
    Placeholder(String),
    /// A literal that is not an IP or CIDR, or an unresolvable group member.
    Unparsed(String),
}

impl AddressRange {
    pub fn network(&self) -> Option<&IpNetwork> {
        match self {
            Self::Network(net) => Some(net),
            Self::Placeholder(_) | Self::Unparsed(_) => None,
        }
    }
}

impl Display for AddressRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(net) => write!(f, "{net}"),
            Self::Placeholder(object) => write!(f, "<placeholder:{object}>"),
            Self::Unparsed(raw) => write!(f, "<unparsed:{raw}>"),
        }
    }
}

/// Resolves names against a read-only [`AddressDirectory`].
#[derive(Debug, Clone, Copy)]
pub struct AddressResolver<'a> {
    directory: &'a AddressDirectory,
}

impl<'a> AddressResolver<'a> {
    pub fn new(directory: &'a AddressDirectory) -> Self {
        Self { directory }
    }

    /// Resolve a name that may be a group, an object, or a literal.
    pub fn resolve(
        &self,
        name: &str,
        rule: Option<&str>,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Vec<AddressRange> {
        self.resolve_group(name, rule, reviews)
            .unwrap_or_else(|| self.resolve_object(name, rule, reviews))
    }

    /// Resolve an address object, falling back to treating `name` as a literal.
    pub fn resolve_object(
        &self,
        name: &str,
        rule: Option<&str>,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Vec<AddressRange> {
        let Some(object) = self.directory.object(name) else {
            return vec![parse_literal(name, rule, reviews)];
        };

        if object.kind != AddressKind::IpNetmask {
            reviews.push(ReviewEntry::new(
                rule,
                name,
                ReasonCode::UnresolvedAddressType,
                format!(
                    "address object uses type '{}', only ip-netmask is resolved; check this object manually",
                    object.kind.as_str()
                ),
            ));
            return vec![AddressRange::Placeholder(name.to_string())];
        }

        if object.values.is_empty() {
            return vec![AddressRange::Unparsed(name.to_string())];
        }
        object
            .values
            .iter()
            .map(|value| parse_literal(value, rule, reviews))
            .collect()
    }

    /// Resolve an address group, or `None` when no group has this name.
    pub fn resolve_group(
        &self,
        name: &str,
        rule: Option<&str>,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Option<Vec<AddressRange>> {
        let group = self.directory.group(name)?;
        let mut path = Vec::new();
        Some(self.expand_group(group, &mut path, rule, reviews))
    }

    fn expand_group(
        &self,
        group: &AddressGroup,
        path: &mut Vec<String>,
        rule: Option<&str>,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Vec<AddressRange> {
        let members = match &group.members {
            GroupMembers::Static(members) => members,
            GroupMembers::Dynamic(filter) => {
                reviews.push(ReviewEntry::new(
                    rule,
                    &group.name,
                    ReasonCode::UnsupportedAddressShape,
                    format!("dynamic address group (filter {filter}) cannot be resolved offline"),
                ));
                return vec![AddressRange::Placeholder(group.name.clone())];
            }
        };

        path.push(group.name.clone());
        let mut out = Vec::new();
        for member in members {
            out.extend(self.expand_member(member, path, rule, reviews));
        }
        path.pop();
        out
    }

    fn expand_member(
        &self,
        member: &str,
        path: &mut Vec<String>,
        rule: Option<&str>,
        reviews: &mut Vec<ReviewEntry>,
    ) -> Vec<AddressRange> {
        if path.iter().any(|seen| seen == member) {
            reviews.push(ReviewEntry::new(
                rule,
                member,
                ReasonCode::ResolutionCycle,
                format!(
                    "address group cycle: {} -> {member}; member left unresolved",
                    path.join(" -> ")
                ),
            ));
            return vec![AddressRange::Unparsed(member.to_string())];
        }

        let Some(group) = self.directory.group(member) else {
            return self.resolve_object(member, rule, reviews);
        };

        if path.len() >= MAX_GROUP_DEPTH {
            reviews.push(ReviewEntry::new(
                rule,
                member,
                ReasonCode::ResolutionCycle,
                format!(
                    "address group nesting deeper than {MAX_GROUP_DEPTH} levels; member left unresolved"
                ),
            ));
            return vec![AddressRange::Unparsed(member.to_string())];
        }

        tracing::trace!(group = member, depth = path.len(), "expanding nested address group");
        self.expand_group(group, path, rule, reviews)
    }
}

fn parse_literal(raw: &str, rule: Option<&str>, reviews: &mut Vec<ReviewEntry>) -> AddressRange {
    match raw.trim().parse::<IpNetwork>() {
        Ok(net) => AddressRange::Network(net),
        Err(_) => {
            reviews.push(ReviewEntry::new(
                rule,
                raw,
                ReasonCode::UnparsableAddress,
                "not a known address object and not an IP or CIDR; check this address manually",
            ));
            AddressRange::Unparsed(raw.to_string())
        }
    }
}

/// True when any resolved network overlaps any trust subnet.
///
/// Overlap means one network contains the other, so both a host inside a
/// trust subnet and a supernet covering it count.
pub fn is_contained_in_trust_subnets(ranges: &[AddressRange], subnets: &[IpNetwork]) -> bool {
    ranges
        .iter()
        .filter_map(AddressRange::network)
        .any(|net| subnets.iter().any(|subnet| networks_overlap(net, subnet)))
}

/// True when `a` and `b` share any address. Mixed address families never do.
pub fn networks_overlap(a: &IpNetwork, b: &IpNetwork) -> bool {
    match (a, b) {
        (IpNetwork::V4(a), IpNetwork::V4(b)) => a.contains(b.network()) || b.contains(a.network()),
        (IpNetwork::V6(a), IpNetwork::V6(b)) => a.contains(b.network()) || b.contains(a.network()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressGroup, AddressObject};

    fn object(name: &str, kind: AddressKind, value: &str) -> AddressObject {
        AddressObject {
            name: name.to_string(),
            kind,
            values: vec![value.to_string()],
        }
    }

    fn group(name: &str, members: &[&str]) -> AddressGroup {
        AddressGroup {
            name: name.to_string(),
            members: GroupMembers::Static(members.iter().map(|m| m.to_string()).collect()),
        }
    }

    fn directory() -> AddressDirectory {
        AddressDirectory::new(
            vec![
                object("h1", AddressKind::IpNetmask, "10.1.1.5/32"),
                object("net2", AddressKind::IpNetmask, "192.168.50.0/24"),
                object("web", AddressKind::Fqdn, "www.example.com"),
            ],
            vec![
                group("servers", &["h1", "10.1.1.20"]),
                group("all", &["servers", "net2"]),
                group("loop-a", &["loop-b", "h1"]),
                group("loop-b", &["loop-a"]),
                AddressGroup {
                    name: "dyn".to_string(),
                    members: GroupMembers::Dynamic("'web'".to_string()),
                },
            ],
        )
    }

    fn net(raw: &str) -> IpNetwork {
        raw.parse().expect("network")
    }

    #[test]
    fn ip_netmask_object_resolves_to_value() {
        let dir = directory();
        let mut reviews = Vec::new();
        let ranges = AddressResolver::new(&dir).resolve_object("h1", Some("R"), &mut reviews);
        assert_eq!(ranges, vec![AddressRange::Network(net("10.1.1.5/32"))]);
        assert!(reviews.is_empty());
    }

    #[test]
    fn other_object_kind_yields_placeholder_and_review() {
        let dir = directory();
        let mut reviews = Vec::new();
        let ranges = AddressResolver::new(&dir).resolve_object("web", Some("R"), &mut reviews);
        assert_eq!(ranges, vec![AddressRange::Placeholder("web".to_string())]);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].reason, ReasonCode::UnresolvedAddressType);
        assert_eq!(reviews[0].rule.as_deref(), Some("R"));
    }

    #[test]
    fn unknown_name_passes_through_as_literal() {
        let dir = directory();
        let mut reviews = Vec::new();
        let resolver = AddressResolver::new(&dir);
        assert_eq!(
            resolver.resolve_object("10.9.9.0/24", None, &mut reviews),
            vec![AddressRange::Network(net("10.9.9.0/24"))]
        );
        assert!(reviews.is_empty());

        let ranges = resolver.resolve_object("no-such-object", None, &mut reviews);
        assert_eq!(ranges, vec![AddressRange::Unparsed("no-such-object".to_string())]);
        assert_eq!(reviews[0].reason, ReasonCode::UnparsableAddress);
    }

    #[test]
    fn group_lookup_misses_return_none() {
        let dir = directory();
        let mut reviews = Vec::new();
        assert!(AddressResolver::new(&dir)
            .resolve_group("h1", None, &mut reviews)
            .is_none());
    }

    #[test]
    fn nested_groups_concatenate_members() {
        let dir = directory();
        let mut reviews = Vec::new();
        let ranges = AddressResolver::new(&dir)
            .resolve_group("all", None, &mut reviews)
            .expect("group");
        assert_eq!(
            ranges,
            vec![
                AddressRange::Network(net("10.1.1.5/32")),
                AddressRange::Network(net("10.1.1.20")),
                AddressRange::Network(net("192.168.50.0/24")),
            ]
        );
        assert!(reviews.is_empty());
    }

    #[test]
    fn cycle_is_reported_not_followed() {
        let dir = directory();
        let mut reviews = Vec::new();
        let ranges = AddressResolver::new(&dir)
            .resolve_group("loop-a", Some("R"), &mut reviews)
            .expect("group");
        assert!(ranges.contains(&AddressRange::Unparsed("loop-a".to_string())));
        assert!(ranges.contains(&AddressRange::Network(net("10.1.1.5/32"))));
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].reason, ReasonCode::ResolutionCycle);
        assert!(reviews[0].detail.contains("loop-a -> loop-b -> loop-a"));
    }

    #[test]
    fn deep_nesting_stops_at_limit() {
        let groups: Vec<AddressGroup> = (0..=MAX_GROUP_DEPTH + 1)
            .map(|i| {
                let next = format!("g{}", i + 1);
                group(&format!("g{i}"), &[next.as_str()])
            })
            .collect();
        let dir = AddressDirectory::new(Vec::new(), groups);
        let mut reviews = Vec::new();
        let ranges = AddressResolver::new(&dir)
            .resolve_group("g0", None, &mut reviews)
            .expect("group");
        assert_eq!(ranges.len(), 1);
        assert!(matches!(ranges[0], AddressRange::Unparsed(_)));
        assert_eq!(reviews[0].reason, ReasonCode::ResolutionCycle);
    }

    #[test]
    fn dynamic_group_is_unsupported() {
        let dir = directory();
        let mut reviews = Vec::new();
        let ranges = AddressResolver::new(&dir).resolve("dyn", None, &mut reviews);
        assert_eq!(ranges, vec![AddressRange::Placeholder("dyn".to_string())]);
        assert_eq!(reviews[0].reason, ReasonCode::UnsupportedAddressShape);
    }

    #[test]
    fn resolution_is_repeatable() {
        let dir = directory();
        let resolver = AddressResolver::new(&dir);
        let mut first_reviews = Vec::new();
        let mut second_reviews = Vec::new();
        let first = resolver.resolve("loop-a", Some("R"), &mut first_reviews);
        let second = resolver.resolve("loop-a", Some("R"), &mut second_reviews);
        assert_eq!(first, second);
        assert_eq!(first_reviews, second_reviews);
    }

    #[test]
    fn containment_accepts_subnets_and_supernets() {
        let trust = vec![net("10.1.1.0/24")];
        let host = [AddressRange::Network(net("10.1.1.5/32"))];
        let supernet = [AddressRange::Network(net("10.0.0.0/8"))];
        let outside = [AddressRange::Network(net("10.1.2.0/24"))];
        let v6 = [AddressRange::Network(net("2001:db8::/32"))];
        let placeholder = [AddressRange::Placeholder("web".to_string())];

        assert!(is_contained_in_trust_subnets(&host, &trust));
        assert!(is_contained_in_trust_subnets(&supernet, &trust));
        assert!(!is_contained_in_trust_subnets(&outside, &trust));
        assert!(!is_contained_in_trust_subnets(&v6, &trust));
        assert!(!is_contained_in_trust_subnets(&placeholder, &trust));
    }
}
