//! Immutable document tree consumed by the loading engine.
//!
//! Nodes are shared through [`Rc`] so that tag handlers can build new trees
//! around existing subtrees (glob aggregation, stripped `!if` tags) without
//! copying or mutating the composed document.

use std::rc::Rc;

use crate::location::Mark;

/// Shape of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl NodeKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        }
    }
}

/// Content of a node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeValue {
    Scalar(String),
    Sequence(Vec<Rc<Node>>),
    /// Key/value pairs in document order. Duplicate keys are kept.
    Mapping(Vec<(Rc<Node>, Rc<Node>)>),
}

/// One element of the document tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    tag: String,
    value: NodeValue,
    mark: Mark,
}

impl Node {
    pub fn new(tag: impl Into<String>, value: NodeValue, mark: Mark) -> Self {
        Self {
            tag: tag.into(),
            value,
            mark,
        }
    }

    /// Untagged scalar with an unknown position.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::new("", NodeValue::Scalar(value.into()), Mark::unknown())
    }

    /// Untagged sequence with an unknown position.
    pub fn sequence(items: Vec<Rc<Node>>) -> Self {
        Self::new("", NodeValue::Sequence(items), Mark::unknown())
    }

    /// Untagged mapping with an unknown position.
    pub fn mapping(pairs: Vec<(Rc<Node>, Rc<Node>)>) -> Self {
        Self::new("", NodeValue::Mapping(pairs), Mark::unknown())
    }

    /// Same node with the given tag.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Same node at the given position.
    pub fn at(mut self, mark: Mark) -> Self {
        self.mark = mark;
        self
    }

    /// Shallow copy carrying another tag. Children are shared with `self`.
    pub fn retagged(&self, tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: self.value.clone(),
            mark: self.mark.clone(),
        }
    }

    /// Full tag as written in the document (`!import`), or an empty string.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn mark(&self) -> &Mark {
        &self.mark
    }

    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Scalar(_) => NodeKind::Scalar,
            NodeValue::Sequence(_) => NodeKind::Sequence,
            NodeValue::Mapping(_) => NodeKind::Mapping,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Rc<Node>]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Rc<Node>, Rc<Node>)]> {
        match &self.value {
            NodeValue::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retagged_shares_children() {
        let child = Rc::new(Node::scalar("value"));
        let node = Node::sequence(vec![child.clone()]).tagged("!if(debug)");
        let copy = node.retagged("");

        assert_eq!(node.tag(), "!if(debug)");
        assert_eq!(copy.tag(), "");
        let items = copy.as_sequence().expect("sequence");
        assert!(Rc::ptr_eq(&items[0], &child));
    }

    #[test]
    fn kind_accessors_match_value() {
        let scalar = Node::scalar("x");
        assert_eq!(scalar.kind(), NodeKind::Scalar);
        assert_eq!(scalar.as_scalar(), Some("x"));
        assert!(scalar.as_sequence().is_none());

        let mapping = Node::mapping(vec![(Rc::new(Node::scalar("k")), Rc::new(Node::scalar("v")))]);
        assert_eq!(mapping.kind(), NodeKind::Mapping);
        assert_eq!(mapping.as_mapping().map(<[_]>::len), Some(1));
        assert!(mapping.as_scalar().is_none());
    }
}
