//! Security rule and address directory model.
//!
//! Values here are produced once by [`crate::ingest`] and never mutated by the
//! engine afterwards. Rewritten and cloned rules are new values built from the
//! originals.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use panos_xml::XmlNode;
use serde::Serialize;

/// The literal member meaning "every address" / "every zone".
pub const ANY: &str = "any";

/// An ordered, non-empty, duplicate-free list of member names.
///
/// Zone and address fields are spelled either as a bare value or as a list in
/// device exports; ingestion normalizes both into this type so the engine
/// never has to care which shape it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MemberList(Vec<String>);

impl MemberList {
    /// Build a list, dropping later duplicates. Returns `None` when empty.
    pub fn new<I, S>(members: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for member in members {
            let member = member.into();
            if !out.contains(&member) {
                out.push(member);
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(Self(out))
        }
    }

    /// A single-member list.
    pub fn single(member: impl Into<String>) -> Self {
        Self(vec![member.into()])
    }

    /// True when the list is exactly `["any"]`.
    pub fn is_any(&self) -> bool {
        self.0.len() == 1 && self.0[0] == ANY
    }

    pub fn contains(&self, member: &str) -> bool {
        self.0.iter().any(|m| m == member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Return a copy without `member`, or `None` if nothing would remain.
    pub fn without(&self, member: &str) -> Option<Self> {
        Self::new(self.0.iter().filter(|m| *m != member).cloned())
    }

    /// Return a copy with `member` appended unless already present.
    pub fn with(&self, member: &str) -> Self {
        let mut out = self.0.clone();
        if !out.iter().any(|m| m == member) {
            out.push(member.to_string());
        }
        Self(out)
    }
}

impl Display for MemberList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Which half of a rule an operation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// `from` zones paired with `source` addresses.
    Source,
    /// `to` zones paired with `destination` addresses.
    Destination,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Source, Direction::Destination];

    /// XML tag of the zone field for this direction.
    pub fn zone_field(self) -> &'static str {
        match self {
            Direction::Source => "from",
            Direction::Destination => "to",
        }
    }

    /// XML tag of the address field for this direction.
    pub fn address_field(self) -> &'static str {
        match self {
            Direction::Source => "source",
            Direction::Destination => "destination",
        }
    }
}

/// One security policy rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityRule {
    pub name: String,
    pub from_zones: MemberList,
    pub to_zones: MemberList,
    pub sources: MemberList,
    pub destinations: MemberList,
    /// Attributes of the `<entry>` element other than `name`.
    pub attributes: BTreeMap<String, String>,
    /// Every other field (service, action, tag, ...) in document order.
    pub passthrough: Vec<XmlNode>,
}

impl SecurityRule {
    pub fn zones(&self, direction: Direction) -> &MemberList {
        match direction {
            Direction::Source => &self.from_zones,
            Direction::Destination => &self.to_zones,
        }
    }

    pub fn addresses(&self, direction: Direction) -> &MemberList {
        match direction {
            Direction::Source => &self.sources,
            Direction::Destination => &self.destinations,
        }
    }

    /// Build a copy with one direction's zone and address lists replaced.
    pub fn with_direction(
        &self,
        direction: Direction,
        zones: MemberList,
        addresses: MemberList,
    ) -> Self {
        let (from_zones, sources, to_zones, destinations) = match direction {
            Direction::Source => (
                zones,
                addresses,
                self.to_zones.clone(),
                self.destinations.clone(),
            ),
            Direction::Destination => (
                self.from_zones.clone(),
                self.sources.clone(),
                zones,
                addresses,
            ),
        };
        Self {
            name: self.name.clone(),
            from_zones,
            to_zones,
            sources,
            destinations,
            attributes: self.attributes.clone(),
            passthrough: self.passthrough.clone(),
        }
    }

    /// Build a copy under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// A rule whose zone/address fields are not plain member lists.
///
/// Uncommitted (candidate) configurations decorate members with change
/// tracking attributes; such rules are kept verbatim so they can be either
/// rejected or carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedRule {
    pub name: String,
    pub field: String,
    pub reason: String,
    pub raw: XmlNode,
}

/// Result of normalizing one `<entry>` from a rulebase.
pub type RuleRecord = Result<SecurityRule, MalformedRule>;

/// Address object type as stored on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressKind {
    IpNetmask,
    IpRange,
    IpWildcard,
    Fqdn,
    Other(String),
}

impl AddressKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ip-netmask" => Self::IpNetmask,
            "ip-range" => Self::IpRange,
            "ip-wildcard" => Self::IpWildcard,
            "fqdn" => Self::Fqdn,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::IpNetmask => "ip-netmask",
            Self::IpRange => "ip-range",
            Self::IpWildcard => "ip-wildcard",
            Self::Fqdn => "fqdn",
            Self::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressObject {
    pub name: String,
    pub kind: AddressKind,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupMembers {
    Static(Vec<String>),
    /// Tag-filter membership, evaluated on the device only.
    Dynamic(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressGroup {
    pub name: String,
    pub members: GroupMembers,
}

/// Read-only lookup of address objects and groups by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDirectory {
    objects: BTreeMap<String, AddressObject>,
    groups: BTreeMap<String, AddressGroup>,
}

impl AddressDirectory {
    pub fn new(objects: Vec<AddressObject>, groups: Vec<AddressGroup>) -> Self {
        let mut dir = Self::default();
        dir.extend(objects, groups);
        dir
    }

    /// Add definitions from another scope. Names already defined win, so the
    /// most specific scope should be merged first.
    pub fn merge(&mut self, other: AddressDirectory) {
        self.extend(other.objects.into_values(), other.groups.into_values());
    }

    fn extend(
        &mut self,
        objects: impl IntoIterator<Item = AddressObject>,
        groups: impl IntoIterator<Item = AddressGroup>,
    ) {
        for object in objects {
            self.objects.entry(object.name.clone()).or_insert(object);
        }
        for group in groups {
            self.groups.entry(group.name.clone()).or_insert(group);
        }
    }

    pub fn object(&self, name: &str) -> Option<&AddressObject> {
        self.objects.get(name)
    }

    pub fn group(&self, name: &str) -> Option<&AddressGroup> {
        self.groups.get(name)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
