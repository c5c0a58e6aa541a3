//! XML tree primitives for PAN-OS style configuration documents.
//!
//! Firewall rule exports, API responses, and partial-config imports all share
//! the same shape: named `<entry name="...">` elements whose list-valued fields
//! are spelled as `<member>` children. This crate parses those documents into a
//! plain [`XmlNode`] tree, offers a few helpers for the `entry`/`member`
//! conventions, and writes trees back out. It knows nothing about zones or
//! rules; that lives in `zone-migrate`.

pub mod parser;
pub mod tree;
pub mod writer;

pub use parser::{parse, parse_file, ParseError};
pub use tree::{XmlNode, ENTRY_TAG, MEMBER_TAG};
pub use writer::{write, write_file, write_string, WriteError};
