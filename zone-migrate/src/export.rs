//! Render output rules as a loadable partial configuration.

use std::path::Path;

use panos_xml::{write_file, write_string, WriteError, XmlNode};

use crate::batch::OutputRule;
use crate::model::{Direction, SecurityRule};

/// Build `<config><security><rules>` holding every output rule in order.
pub fn rules_document(rules: &[OutputRule]) -> XmlNode {
    let mut container = XmlNode::new("rules");
    container.children = rules.iter().map(output_entry).collect();

    let mut security = XmlNode::new("security");
    security.children.push(container);
    let mut config = XmlNode::new("config");
    config.children.push(security);
    config
}

fn output_entry(rule: &OutputRule) -> XmlNode {
    match rule {
        OutputRule::Rule(rule) => rule_entry(rule),
        OutputRule::Verbatim(raw) => raw.raw.clone(),
    }
}

/// Render one rule as an `<entry>`.
///
/// Zone and address fields come first as member lists, followed by the
/// pass-through fields in their original order.
pub fn rule_entry(rule: &SecurityRule) -> XmlNode {
    let mut entry = XmlNode::entry(rule.name.as_str());
    entry
        .attributes
        .extend(rule.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

    for direction in Direction::BOTH {
        entry.children.push(XmlNode::member_list(
            direction.zone_field(),
            rule.zones(direction).iter(),
        ));
    }
    for direction in Direction::BOTH {
        entry.children.push(XmlNode::member_list(
            direction.address_field(),
            rule.addresses(direction).iter(),
        ));
    }
    entry.children.extend(rule.passthrough.iter().cloned());
    entry
}

pub fn rules_to_string(rules: &[OutputRule]) -> Result<String, WriteError> {
    write_string(&rules_document(rules))
}

pub fn write_rules(rules: &[OutputRule], path: &Path) -> Result<(), WriteError> {
    write_file(&rules_document(rules), path)
}
