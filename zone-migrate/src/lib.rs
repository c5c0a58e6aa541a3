//! Security-policy zone migration for PAN-OS style firewalls.
//!
//! Moving a firewall from a perimeter zone design to a segmented one means
//! touching every rule that names the old zones. This library automates the
//! two common moves and reports everything it could not decide on its own.
//!
//! # Architecture
//!
//! ## Input
//!
//! - [`ingest`] - Load rulebases (XML or JSON) and address objects, and
//!   normalize every zone/address field into a [`model::MemberList`]
//! - [`config`] - Migration settings loaded from TOML
//! - [`model`] - Rules, address objects, and groups
//!
//! ## Engine
//!
//! - [`resolver`] - Resolve address objects and nested groups to networks
//! - [`intrazone`] - Collapse legacy trusted zones into one intrazone zone
//! - [`eastwest`] - Clone trust-zone rules into a new east-west zone
//! - [`batch`] - Run either migration over a whole rulebase
//!
//! ## Output
//!
//! - [`export`] - Partial-config XML ready to load on the device
//! - [`changes`] - Rule-level preview of what changed
//! - [`garp`] - Gratuitous ARP commands for cutover
//! - [`review`] - Findings an operator must look at
//! - [`report`] - Terminal and JSON rendering
//!
//! # Workflow
//!
//! 1. **Load** the rulebase, address objects, and settings
//! 2. **Migrate** with [`batch::RuleBatchProcessor`]
//! 3. **Export** the output rules and review what was flagged
//! 4. **Plan** gratuitous ARP for the cutover window
//!
//! # Examples
//!
//! ```ignore
//! use std::path::Path;
//!
//! use zone_migrate::batch::RuleBatchProcessor;
//! use zone_migrate::config::load_config;
//! use zone_migrate::ingest::{directory_from_document, load_document, rules_from_document};
//!
//! let config = load_config(Path::new("zone_settings.toml"))?;
//! let rules = rules_from_document(&load_document(Path::new("rules.xml"))?)?;
//! let objects = directory_from_document(&load_document(Path::new("objects.xml"))?);
//!
//! let outcome = RuleBatchProcessor::new(&config, &objects).run_eastwest(&rules)?;
//! for review in &outcome.reviews {
//!     println!("{review}");
//! }
//! ```

pub mod batch;
pub mod changes;
pub mod config;
pub mod eastwest;
pub mod error;
pub mod export;
pub mod garp;
pub mod ingest;
pub mod intrazone;
pub mod model;
pub mod report;
pub mod resolver;
pub mod review;
