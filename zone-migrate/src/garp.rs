//! Gratuitous ARP planning for firewall cutover.
//!
//! When a replacement firewall takes over, upstream devices still hold ARP
//! entries pointing at the old hardware. The planner walks a device config
//! and lists one `test arp gratuitous` command per address the new device
//! answers for: every static interface address, plus every source-NAT
//! translated address on the interface whose subnet holds it.

use std::fmt::{self, Display, Formatter};
use std::net::IpAddr;

use ipnetwork::IpNetwork;
use panos_xml::XmlNode;
use serde::Serialize;

use crate::model::AddressDirectory;
use crate::resolver::{AddressRange, AddressResolver};
use crate::review::{ReasonCode, ReviewEntry};

const INTERFACE_CONTAINERS: [&str; 2] = ["ethernet", "aggregate-ethernet"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GarpCommand {
    pub ip: IpAddr,
    pub interface: String,
    /// NAT rule the address came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_rule: Option<String>,
}

impl Display for GarpCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "test arp gratuitous ip {} interface {}",
            self.ip, self.interface
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GarpPlan {
    pub interfaces: Vec<GarpCommand>,
    pub nat: Vec<GarpCommand>,
    pub reviews: Vec<ReviewEntry>,
}

/// An address configured on a (sub-)interface.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InterfaceAddress {
    interface: String,
    network: IpNetwork,
}

/// Build the gARP plan for `config`, resolving object names in `directory`.
pub fn plan(config: &XmlNode, directory: &AddressDirectory) -> GarpPlan {
    let resolver = AddressResolver::new(directory);
    let mut plan = GarpPlan::default();

    let addresses = interface_addresses(config, &resolver, &mut plan.reviews);
    plan.interfaces = addresses
        .iter()
        .map(|addr| GarpCommand {
            ip: addr.network.ip(),
            interface: addr.interface.clone(),
            nat_rule: None,
        })
        .collect();

    for rule in nat_rules(config) {
        let commands = nat_commands(rule, &addresses, &resolver, &mut plan.reviews);
        plan.nat.extend(commands);
    }

    tracing::info!(
        interfaces = plan.interfaces.len(),
        nat = plan.nat.len(),
        reviews = plan.reviews.len(),
        "planned gratuitous ARP commands"
    );
    plan
}

fn interface_addresses(
    config: &XmlNode,
    resolver: &AddressResolver<'_>,
    reviews: &mut Vec<ReviewEntry>,
) -> Vec<InterfaceAddress> {
    let mut out = Vec::new();
    for container in INTERFACE_CONTAINERS {
        for node in config.find_descendants(container) {
            for entry in node.entries() {
                let Some(name) = entry.entry_name() else {
                    continue;
                };
                let before = out.len();
                collect_interface(entry, name, resolver, reviews, &mut out);
                if out.len() == before {
                    reviews.push(ReviewEntry::new(
                        None,
                        name,
                        ReasonCode::NoInterfaceAddress,
                        "no static layer3 address found (DHCP or not layer3?); no gARP command generated",
                    ));
                }
            }
        }
    }
    out
}

fn collect_interface(
    entry: &XmlNode,
    name: &str,
    resolver: &AddressResolver<'_>,
    reviews: &mut Vec<ReviewEntry>,
    out: &mut Vec<InterfaceAddress>,
) {
    let Some(layer3) = entry.get_child("layer3") else {
        return;
    };
    push_ip_entries(layer3, name, resolver, reviews, out);

    for unit in layer3.get_child("units").map(XmlNode::entries).unwrap_or_default() {
        if let Some(unit_name) = unit.entry_name() {
            push_ip_entries(unit, unit_name, resolver, reviews, out);
        }
    }
}

fn push_ip_entries(
    node: &XmlNode,
    interface: &str,
    resolver: &AddressResolver<'_>,
    reviews: &mut Vec<ReviewEntry>,
    out: &mut Vec<InterfaceAddress>,
) {
    let Some(ip) = node.get_child("ip") else {
        return;
    };
    for address in ip.entries().into_iter().filter_map(XmlNode::entry_name) {
        for network in networks(resolver.resolve(address, None, reviews)) {
            out.push(InterfaceAddress {
                interface: interface.to_string(),
                network,
            });
        }
    }
}

fn networks(ranges: Vec<AddressRange>) -> impl Iterator<Item = IpNetwork> {
    ranges.into_iter().filter_map(|range| match range {
        AddressRange::Network(net) => Some(net),
        AddressRange::Placeholder(_) | AddressRange::Unparsed(_) => None,
    })
}

fn nat_rules(config: &XmlNode) -> Vec<&XmlNode> {
    config
        .find_descendants("nat")
        .into_iter()
        .filter_map(|nat| nat.get_child("rules"))
        .flat_map(XmlNode::entries)
        .collect()
}

fn nat_commands(
    rule: &XmlNode,
    interfaces: &[InterfaceAddress],
    resolver: &AddressResolver<'_>,
    reviews: &mut Vec<ReviewEntry>,
) -> Vec<GarpCommand> {
    let name = rule.entry_name().unwrap_or("<unnamed>");
    let mut commands = Vec::new();

    if rule.get_text(&["disabled"]) == Some("yes") {
        reviews.push(ReviewEntry::new(
            Some(name),
            name,
            ReasonCode::DisabledNatRule,
            "NAT rule is disabled; check whether it should be enabled after cutover",
        ));
        return commands;
    }

    if rule.get_child("destination-translation").is_some()
        || rule.get_child("dynamic-destination-translation").is_some()
    {
        reviews.push(ReviewEntry::new(
            Some(name),
            name,
            ReasonCode::DestinationNat,
            "destination NAT is not planned; check this rule for addresses that need gARP",
        ));
    }

    let Some(source) = rule.get_child("source-translation") else {
        return commands;
    };

    // Interface-address translation without an explicit ip is already
    // covered by the interface's own command.
    let mut covered = false;

    if let Some(translated) = source.find_descendant("translated-address") {
        let members = node_values(translated);
        if members.len() > 1 {
            reviews.push(ReviewEntry::new(
                Some(name),
                name,
                ReasonCode::UnsupportedAddressShape,
                format!(
                    "source NAT translates to {} addresses (dynamic-PAT pool?); each is planned separately",
                    members.len()
                ),
            ));
        }
        for member in members {
            for network in networks(resolver.resolve(member, Some(name), reviews)) {
                let ip = network.ip();
                match interface_for(ip, interfaces) {
                    Some(interface) => commands.push(GarpCommand {
                        ip,
                        interface: interface.to_string(),
                        nat_rule: Some(name.to_string()),
                    }),
                    None => reviews.push(ReviewEntry::new(
                        Some(name),
                        ip.to_string(),
                        ReasonCode::InterfaceNotFound,
                        "no interface subnet contains this translated address",
                    )),
                }
            }
        }
    }

    if let Some(iface) = source.find_descendant("interface-address") {
        match (iface.get_text(&["interface"]), iface.get_text(&["ip"])) {
            (Some(interface), Some(ip)) => {
                for network in networks(resolver.resolve(ip, Some(name), reviews)) {
                    commands.push(GarpCommand {
                        ip: network.ip(),
                        interface: interface.to_string(),
                        nat_rule: Some(name.to_string()),
                    });
                }
            }
            (Some(_), None) => covered = true,
            (None, _) => {}
        }
    }

    if commands.is_empty() && !covered {
        reviews.push(ReviewEntry::new(
            Some(name),
            name,
            ReasonCode::MisconfiguredSourceNat,
            "source translation produced no gARP command; source NAT may be misconfigured",
        ));
    }
    commands
}

/// Members of a list field, or the bare text of a scalar one.
fn node_values(node: &XmlNode) -> Vec<&str> {
    let members = node.member_texts();
    if !members.is_empty() {
        return members;
    }
    node.text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .into_iter()
        .collect()
}

fn interface_for(ip: IpAddr, interfaces: &[InterfaceAddress]) -> Option<&str> {
    interfaces
        .iter()
        .find(|addr| addr.network.contains(ip))
        .map(|addr| addr.interface.as_str())
}
