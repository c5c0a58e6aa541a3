//! Items that need an operator's attention after a migration run.
//!
//! The engine never prints. Anything a human should look at is returned as a
//! [`ReviewEntry`] so callers can render, filter, or persist it.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCode {
    ZoneNotFound,
    UnresolvedAddressType,
    ResolutionCycle,
    UnsupportedAddressShape,
    UnparsableAddress,
    CloneAddressListKept,
    CloneNameTaken,
    MalformedRule,
    DisabledNatRule,
    DestinationNat,
    InterfaceNotFound,
    NoInterfaceAddress,
    MisconfiguredSourceNat,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZoneNotFound => "zone-not-found",
            Self::UnresolvedAddressType => "unresolved-address-type",
            Self::ResolutionCycle => "resolution-cycle",
            Self::UnsupportedAddressShape => "unsupported-address-shape",
            Self::UnparsableAddress => "unparsable-address",
            Self::CloneAddressListKept => "clone-address-list-kept",
            Self::CloneNameTaken => "clone-name-taken",
            Self::MalformedRule => "malformed-rule",
            Self::DisabledNatRule => "disabled-nat-rule",
            Self::DestinationNat => "destination-nat",
            Self::InterfaceNotFound => "interface-not-found",
            Self::NoInterfaceAddress => "no-interface-address",
            Self::MisconfiguredSourceNat => "misconfigured-source-nat",
        }
    }
}

impl Display for ReasonCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    /// Rule the finding belongs to, when there is one.
    pub rule: Option<String>,
    /// Zone, address, interface, or rule name the finding is about.
    pub subject: String,
    pub reason: ReasonCode,
    pub detail: String,
}

impl ReviewEntry {
    pub fn new(
        rule: Option<&str>,
        subject: impl Into<String>,
        reason: ReasonCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.map(ToString::to_string),
            subject: subject.into(),
            reason,
            detail: detail.into(),
        }
    }

    pub fn zone_not_found(rule: &str, zone: &str) -> Self {
        Self::new(
            Some(rule),
            zone,
            ReasonCode::ZoneNotFound,
            format!("{zone} zone not found, not updating this zone."),
        )
    }
}

impl Display for ReviewEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Some(rule) => write!(
                f,
                "[{}] rule={} subject={}: {}",
                self.reason, rule, self.subject, self.detail
            ),
            None => write!(
                f,
                "[{}] subject={}: {}",
                self.reason, self.subject, self.detail
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReasonCode, ReviewEntry};

    #[test]
    fn zone_not_found_detail_names_zone() {
        let entry = ReviewEntry::zone_not_found("R3", "dmz");
        assert_eq!(entry.detail, "dmz zone not found, not updating this zone.");
        assert_eq!(entry.rule.as_deref(), Some("R3"));
        assert_eq!(entry.reason, ReasonCode::ZoneNotFound);
    }

    #[test]
    fn reason_serializes_kebab_case() {
        let json = serde_json::to_string(&ReasonCode::UnresolvedAddressType).expect("json");
        assert_eq!(json, "\"unresolved-address-type\"");
        assert_eq!(
            ReasonCode::UnresolvedAddressType.to_string(),
            "unresolved-address-type"
        );
    }
}
