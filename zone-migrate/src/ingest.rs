//! Turning device exports into model values.
//!
//! This is the only place that deals with how a field happened to be spelled.
//! Rules come out with every zone and address field as a [`MemberList`], or as
//! a [`MalformedRule`] when the field is not a plain list of members.
//!
//! ## Accepted documents
//!
//! - API responses: `<response><result><rules><entry .../></rules></result></response>`
//! - Partial configs: `<config><security><rules>...`
//! - Full device configs (the first `security > rules` found)
//! - JSON exports in the `@name` / `member` shape produced by XML-to-dict
//!   converters, where a single member may be a bare string instead of a list

use std::fs;
use std::path::Path;

use panos_xml::{parse, ParseError, XmlNode, MEMBER_TAG};
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    AddressDirectory, AddressGroup, AddressKind, AddressObject, Direction, GroupMembers,
    MalformedRule, MemberList, RuleRecord, SecurityRule,
};

/// Errors returned while loading input documents.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Xml(#[from] ParseError),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no security rules found in document (expected a <rules> element)")]
    NoRules,
}

/// Address types the resolver understands, in lookup order.
const ADDRESS_KIND_TAGS: [&str; 4] = ["ip-netmask", "ip-range", "ip-wildcard", "fqdn"];

/// Load an XML or JSON document (chosen by file extension) as an XML tree.
pub fn load_document(path: &Path) -> Result<XmlNode, IngestError> {
    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let value: Value = serde_json::from_slice(&bytes)?;
        Ok(json_document(&value))
    } else {
        Ok(parse(&bytes)?)
    }
}

/// Convert an XML-to-dict style JSON document into an XML tree.
///
/// A top-level object with a single key becomes the root element; anything
/// else is wrapped in a `<document>` root.
pub fn json_document(value: &Value) -> XmlNode {
    if let Value::Object(map) = value {
        if map.len() == 1 {
            if let Some((key, inner)) = map.iter().next() {
                if !key.starts_with('@') && key != "#text" {
                    if let Value::Array(items) = inner {
                        let mut root = XmlNode::new("document");
                        root.children
                            .extend(items.iter().map(|item| json_element(key, item)));
                        return root;
                    }
                    return json_element(key, inner);
                }
            }
        }
    }
    json_element("document", value)
}

fn json_element(tag: &str, value: &Value) -> XmlNode {
    let mut node = XmlNode::new(tag);
    match value {
        Value::Null => {}
        Value::Bool(b) => node.text = Some(if *b { "yes" } else { "no" }.to_string()),
        Value::Number(n) => node.text = Some(n.to_string()),
        Value::String(s) => node.text = Some(s.clone()),
        Value::Array(items) => {
            // A bare array has no tag of its own; treat it as a member list.
            node.children
                .extend(items.iter().map(|item| json_element(MEMBER_TAG, item)));
        }
        Value::Object(map) => {
            for (key, inner) in map {
                if let Some(attr) = key.strip_prefix('@') {
                    node.attributes
                        .insert(attr.to_string(), json_scalar(inner));
                } else if key == "#text" {
                    node.text = Some(json_scalar(inner));
                } else if let Value::Array(items) = inner {
                    node.children
                        .extend(items.iter().map(|item| json_element(key, item)));
                } else {
                    node.children.push(json_element(key, inner));
                }
            }
        }
    }
    node
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Find the security `<rules>` container in a document.
pub fn locate_security_rules(root: &XmlNode) -> Option<&XmlNode> {
    if root.tag == "rules" {
        return Some(root);
    }
    root.find_descendants("security")
        .into_iter()
        .find_map(|security| security.get_child("rules"))
        .or_else(|| root.find_descendant("rules"))
}

/// Normalize every `<entry>` of the security rulebase in `root`.
pub fn rules_from_document(root: &XmlNode) -> Result<Vec<RuleRecord>, IngestError> {
    let rules = locate_security_rules(root).ok_or(IngestError::NoRules)?;
    let records: Vec<RuleRecord> = rules.entries().into_iter().map(rule_from_entry).collect();
    tracing::debug!(
        rules = records.len(),
        malformed = records.iter().filter(|r| r.is_err()).count(),
        "normalized security rules"
    );
    Ok(records)
}

/// Normalize one rule `<entry>`.
pub fn rule_from_entry(entry: &XmlNode) -> RuleRecord {
    let name = entry.entry_name().unwrap_or_default().to_string();
    let malformed = |field: &str, reason: String| MalformedRule {
        name: if name.is_empty() {
            "<unnamed>".to_string()
        } else {
            name.clone()
        },
        field: field.to_string(),
        reason,
        raw: entry.clone(),
    };

    if name.is_empty() {
        return Err(malformed("name", "rule entry has no name attribute".to_string()));
    }

    let field = |tag: &str| member_field(entry, tag).map_err(|reason| malformed(tag, reason));
    let from_zones = field("from")?;
    let to_zones = field("to")?;
    let sources = field("source")?;
    let destinations = field("destination")?;

    let mut attributes = entry.attributes.clone();
    attributes.remove("name");

    let passthrough = entry
        .children
        .iter()
        .filter(|child| !is_member_field(&child.tag))
        .cloned()
        .collect();

    Ok(SecurityRule {
        name,
        from_zones,
        to_zones,
        sources,
        destinations,
        attributes,
        passthrough,
    })
}

fn is_member_field(tag: &str) -> bool {
    Direction::BOTH
        .iter()
        .any(|d| d.zone_field() == tag || d.address_field() == tag)
}

/// Read a zone/address field as a member list, or explain why it is not one.
fn member_field(entry: &XmlNode, field: &str) -> Result<MemberList, String> {
    let node = entry
        .get_child(field)
        .ok_or_else(|| "field is missing".to_string())?;

    if !node.attributes.is_empty() {
        let attrs: Vec<&str> = node.attributes.keys().map(String::as_str).collect();
        return Err(format!("field carries attributes {}", attrs.join(", ")));
    }

    if node.children.is_empty() {
        // A bare value is a one-member list.
        return match node.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(MemberList::single(text)),
            _ => Err("member list is empty".to_string()),
        };
    }

    let mut members = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if child.tag != MEMBER_TAG {
            return Err(format!("unexpected <{}> element", child.tag));
        }
        let text = child.text.as_deref().map(str::trim).unwrap_or_default();
        if !child.attributes.is_empty() {
            let attrs: Vec<&str> = child.attributes.keys().map(String::as_str).collect();
            return Err(format!(
                "member '{text}' carries attributes {}",
                attrs.join(", ")
            ));
        }
        if !child.children.is_empty() {
            return Err(format!("member '{text}' has nested elements"));
        }
        if !text.is_empty() {
            members.push(text.to_string());
        }
    }

    MemberList::new(members).ok_or_else(|| "member list is empty".to_string())
}

/// Collect every address object and address group defined in `root`.
///
/// When a document holds several scopes (device group, parent, shared), the
/// first definition of a name in document order wins.
pub fn directory_from_document(root: &XmlNode) -> AddressDirectory {
    let objects = root
        .find_descendants("address")
        .into_iter()
        .flat_map(|container| container.entries())
        .filter_map(address_object_from_entry)
        .collect();
    let groups = root
        .find_descendants("address-group")
        .into_iter()
        .flat_map(|container| container.entries())
        .filter_map(address_group_from_entry)
        .collect();
    AddressDirectory::new(objects, groups)
}

fn address_object_from_entry(entry: &XmlNode) -> Option<AddressObject> {
    let Some(name) = entry.entry_name() else {
        tracing::warn!("skipping address object without a name");
        return None;
    };
    let typed = ADDRESS_KIND_TAGS
        .iter()
        .find_map(|tag| entry.get_child(tag))
        .or_else(|| {
            entry
                .children
                .iter()
                .find(|c| !matches!(c.tag.as_str(), "description" | "tag"))
        });
    let (kind, values) = match typed {
        Some(node) => {
            let members = node.member_texts();
            let values = if members.is_empty() {
                node.text
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| vec![t.to_string()])
                    .unwrap_or_default()
            } else {
                members.into_iter().map(ToString::to_string).collect()
            };
            (AddressKind::from_tag(&node.tag), values)
        }
        None => (AddressKind::Other("unknown".to_string()), Vec::new()),
    };
    Some(AddressObject {
        name: name.to_string(),
        kind,
        values,
    })
}

fn address_group_from_entry(entry: &XmlNode) -> Option<AddressGroup> {
    let Some(name) = entry.entry_name() else {
        tracing::warn!("skipping address group without a name");
        return None;
    };
    let members = if let Some(dynamic) = entry.get_child("dynamic") {
        let filter = dynamic
            .get_text(&["filter"])
            .or(dynamic.text.as_deref())
            .unwrap_or_default();
        GroupMembers::Dynamic(filter.trim().to_string())
    } else {
        let members = entry
            .get_child("static")
            .map(|s| s.member_texts())
            .unwrap_or_default();
        GroupMembers::Static(members.into_iter().map(ToString::to_string).collect())
    };
    Some(AddressGroup {
        name: name.to_string(),
        members,
    })
}
