use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Tag used for list items in PAN-OS documents (`<member>x</member>`).
pub const MEMBER_TAG: &str = "member";
/// Tag used for named objects in PAN-OS documents (`<entry name="x">`).
pub const ENTRY_TAG: &str = "entry";

/// A generic XML element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlNode {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements, in document order.
    pub children: Vec<XmlNode>,
    /// Optional text content.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create a new XML node with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a text-only element such as `<member>any</member>`.
    pub fn text_element(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.text = Some(text.into());
        node
    }

    /// Create a named `<entry name="...">` element.
    pub fn entry(name: impl Into<String>) -> Self {
        let mut node = Self::new(ENTRY_TAG);
        node.attributes.insert("name".to_string(), name.into());
        node
    }

    /// Create `<tag><member>a</member><member>b</member></tag>`.
    pub fn member_list<I, S>(tag: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut node = Self::new(tag);
        node.children = members
            .into_iter()
            .map(|m| Self::text_element(MEMBER_TAG, m))
            .collect();
        node
    }

    /// Return the first child with the provided tag.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Walk a nested child path and return terminal node text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        current.text.as_deref()
    }

    /// Return an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Return the `name` attribute, which identifies `<entry>` elements.
    pub fn entry_name(&self) -> Option<&str> {
        self.attr("name")
    }

    /// Return all `<entry>` children.
    pub fn entries(&self) -> Vec<&XmlNode> {
        self.get_children(ENTRY_TAG)
    }

    /// Return the `<entry>` child with the given name.
    pub fn find_entry(&self, name: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|c| c.tag == ENTRY_TAG && c.entry_name() == Some(name))
    }

    /// Return trimmed `<member>` texts of this node, skipping blanks.
    ///
    /// Only plain members are returned; callers that need to reject decorated
    /// members should inspect [`XmlNode::children`] directly.
    pub fn member_texts(&self) -> Vec<&str> {
        self.children
            .iter()
            .filter(|c| c.tag == MEMBER_TAG)
            .filter_map(|c| c.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Depth-first search for the first descendant (or self) with `tag`.
    pub fn find_descendant(&self, tag: &str) -> Option<&XmlNode> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_descendant(tag))
    }

    /// Depth-first collection of every descendant (or self) with `tag`.
    ///
    /// Matching nodes are not searched further, so a `tag` nested inside
    /// another `tag` is not reported twice.
    pub fn find_descendants<'a>(&'a self, tag: &str) -> Vec<&'a XmlNode> {
        let mut out = Vec::new();
        collect_descendants(self, tag, &mut out);
        out
    }
}

fn collect_descendants<'a>(node: &'a XmlNode, tag: &str, out: &mut Vec<&'a XmlNode>) {
    if node.tag == tag {
        out.push(node);
        return;
    }
    for child in &node.children {
        collect_descendants(child, tag, out);
    }
}

impl Display for XmlNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, value)?;
        }

        if self.children.is_empty() && self.text.is_none() {
            return write!(f, "/>");
        }

        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{}", text)?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::XmlNode;

    #[test]
    fn member_list_builds_member_children() {
        let node = XmlNode::member_list("from", ["trust", "dmz"]);
        assert_eq!(node.member_texts(), vec!["trust", "dmz"]);
        assert_eq!(
            node.to_string(),
            "<from><member>trust</member><member>dmz</member></from>"
        );
    }

    #[test]
    fn find_entry_matches_name_attribute() {
        let mut rules = XmlNode::new("rules");
        rules.children.push(XmlNode::entry("allow-web"));
        rules.children.push(XmlNode::entry("deny-all"));

        let found = rules.find_entry("deny-all").expect("entry");
        assert_eq!(found.entry_name(), Some("deny-all"));
        assert!(rules.find_entry("missing").is_none());
    }

    #[test]
    fn find_descendants_stops_at_first_match() {
        let mut outer = XmlNode::new("address");
        outer.children.push(XmlNode::new("address"));
        let mut root = XmlNode::new("config");
        root.children.push(outer);
        root.children.push(XmlNode::new("address"));

        assert_eq!(root.find_descendants("address").len(), 2);
    }
}
