//! Compose YAML text into a [`Node`] tree.
//!
//! Drives `saphyr_parser` directly and builds nodes from its event stream.
//! Aliases resolve to the anchored node itself (shared through `Rc`), so an
//! aliased subtree is composed once however often it is referenced.

use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;
use saphyr_parser::{Event, Parser, Tag};

use crate::budget::{Budget, BudgetEnforcer};
use crate::error::Error;
use crate::location::{mark_from_span, Mark};
use crate::node::{Node, NodeValue};
use crate::tags::render_tag;

/// Collection under construction.
enum Building {
    Sequence {
        head: Head,
        items: Vec<Rc<Node>>,
    },
    Mapping {
        head: Head,
        pairs: Vec<(Rc<Node>, Rc<Node>)>,
        key: Option<Rc<Node>>,
    },
}

/// What a collection start event tells about the node.
struct Head {
    tag: String,
    mark: Mark,
    anchor_id: usize,
}

fn tag_text(tag: Option<Cow<'_, Tag>>) -> String {
    tag.map(|tag| render_tag(&tag.handle, &tag.suffix))
        .unwrap_or_default()
}

/// Compose a single-document YAML text.
///
/// `name` becomes the source of every node mark. An empty stream composes to an
/// empty scalar. More than one document is an error.
pub fn compose(source: &str, name: &str, budget: Option<Budget>) -> Result<Rc<Node>, Error> {
    let name: Rc<str> = Rc::from(name);
    let mut enforcer = budget.map(BudgetEnforcer::new);
    let mut anchors: HashMap<usize, Rc<Node>> = HashMap::new();
    let mut stack: Vec<Building> = Vec::new();
    let mut root: Option<Rc<Node>> = None;
    let mut documents = 0usize;
    let mut last_mark = Mark::new(name.clone(), 1, 1);

    for item in Parser::new_from_str(source) {
        let (event, span) = item.map_err(|err| Error::from_scan_error(&name, err))?;
        let mark = mark_from_span(&name, &span);
        last_mark = mark.clone();

        if let Some(enforcer) = enforcer.as_mut() {
            enforcer
                .observe(&event)
                .map_err(|breach| Error::parse(format!("Budget exceeded: {breach}."), mark.clone()))?;
        }

        let complete = match event {
            Event::DocumentStart(_) => {
                documents += 1;
                if documents > 1 {
                    return Err(Error::parse(
                        "Expected a single document in the stream.",
                        mark,
                    ));
                }
                None
            }
            Event::Scalar(value, _style, anchor_id, tag) => {
                let node = Rc::new(Node::new(
                    tag_text(tag),
                    NodeValue::Scalar(value.into_owned()),
                    mark,
                ));
                if anchor_id != 0 {
                    anchors.insert(anchor_id, node.clone());
                }
                Some(node)
            }
            Event::Alias(anchor_id) => match anchors.get(&anchor_id) {
                Some(node) => Some(node.clone()),
                None => return Err(Error::parse("Unknown anchor.", mark)),
            },
            Event::SequenceStart(anchor_id, tag) => {
                stack.push(Building::Sequence {
                    head: Head {
                        tag: tag_text(tag),
                        mark,
                        anchor_id,
                    },
                    items: Vec::new(),
                });
                None
            }
            Event::MappingStart(anchor_id, tag) => {
                stack.push(Building::Mapping {
                    head: Head {
                        tag: tag_text(tag),
                        mark,
                        anchor_id,
                    },
                    pairs: Vec::new(),
                    key: None,
                });
                None
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let Some(building) = stack.pop() else {
                    return Err(Error::parse("Unbalanced collection end.", mark));
                };
                let (head, value) = match building {
                    Building::Sequence { head, items } => (head, NodeValue::Sequence(items)),
                    Building::Mapping { head, pairs, .. } => (head, NodeValue::Mapping(pairs)),
                };
                let node = Rc::new(Node::new(head.tag, value, head.mark));
                if head.anchor_id != 0 {
                    anchors.insert(head.anchor_id, node.clone());
                }
                Some(node)
            }
            _ => None,
        };

        let Some(node) = complete else {
            continue;
        };
        match stack.last_mut() {
            Some(Building::Sequence { items, .. }) => items.push(node),
            Some(Building::Mapping { pairs, key, .. }) => match key.take() {
                Some(key) => pairs.push((key, node)),
                None => *key = Some(node),
            },
            None => root = Some(node),
        }
    }

    if let Some(enforcer) = &enforcer {
        enforcer
            .finalize()
            .map_err(|breach| Error::parse(format!("Budget exceeded: {breach}."), last_mark.clone()))?;
    }

    trace!("composed {name}: {} anchor(s)", anchors.len());
    Ok(root.unwrap_or_else(|| Rc::new(Node::new("", NodeValue::Scalar(String::new()), last_mark))))
}
