//! Resource budget enforced while composing YAML text.
//!
//! The composer feeds every parser event to a [`BudgetEnforcer`] and stops at
//! the first breach, so pathological inputs (alias bombs, huge scalars, deep
//! nesting) fail before the node tree is built.

use std::fmt;

use ahash::AHashSet;
use saphyr_parser::Event;
use serde::{Deserialize, Serialize};

/// Limits for composing one YAML document.
///
/// Permissive for typical configuration files. A budget applies to every file
/// composed during a load (the root document, `!import`ed and `!glob`bed files),
/// each file being checked separately.
///
/// ```rust
/// use saphyr_marshal::{Budget, LoadOptions, StringField, load};
///
/// let options = LoadOptions {
///     budget: Some(Budget { max_nodes: 2, ..Budget::default() }),
///     ..LoadOptions::default()
/// };
/// assert!(load("[a, b, c]", &StringField::new(), options).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Maximum total parser events.
    ///
    /// Default: 1,000,000
    pub max_events: usize,
    /// Maximum number of alias (`*ref`) events.
    ///
    /// Default: 50,000
    pub max_aliases: usize,
    /// Maximum number of distinct anchors.
    ///
    /// Default: 50,000
    pub max_anchors: usize,
    /// Maximum nesting of sequences and mappings.
    ///
    /// Default: 2,000
    pub max_depth: usize,
    /// Maximum number of nodes (scalars, sequences and mappings).
    ///
    /// Default: 250,000
    pub max_nodes: usize,
    /// Maximum total bytes of scalar text.
    ///
    /// Default: 64 MiB
    pub max_total_scalar_bytes: usize,
    /// Reject documents where `aliases > alias_anchor_ratio_multiplier * anchors`,
    /// once at least `alias_anchor_min_aliases` aliases were seen.
    ///
    /// Default: true
    pub enforce_alias_anchor_ratio: bool,
    /// Default: 100
    pub alias_anchor_min_aliases: usize,
    /// Default: 10
    pub alias_anchor_ratio_multiplier: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            max_aliases: 50_000,
            max_anchors: 50_000,
            max_depth: 2_000,
            max_nodes: 250_000,
            max_total_scalar_bytes: 64 * 1024 * 1024,
            enforce_alias_anchor_ratio: true,
            alias_anchor_min_aliases: 100,
            alias_anchor_ratio_multiplier: 10,
        }
    }
}

/// The limit that was exceeded, with the count reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetBreach {
    Events { events: usize },
    Aliases { aliases: usize },
    Anchors { anchors: usize },
    Depth { depth: usize },
    Nodes { nodes: usize },
    ScalarBytes { total_scalar_bytes: usize },
    AliasAnchorRatio { aliases: usize, anchors: usize },
}

impl fmt::Display for BudgetBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetBreach::Events { events } => write!(f, "too many events ({events})"),
            BudgetBreach::Aliases { aliases } => write!(f, "too many aliases ({aliases})"),
            BudgetBreach::Anchors { anchors } => write!(f, "too many anchors ({anchors})"),
            BudgetBreach::Depth { depth } => write!(f, "nesting too deep ({depth})"),
            BudgetBreach::Nodes { nodes } => write!(f, "too many nodes ({nodes})"),
            BudgetBreach::ScalarBytes { total_scalar_bytes } => {
                write!(f, "scalar text too large ({total_scalar_bytes} bytes)")
            }
            BudgetBreach::AliasAnchorRatio { aliases, anchors } => {
                write!(f, "{aliases} aliases for {anchors} anchors")
            }
        }
    }
}

/// Stateful checker consuming a stream of parser events.
#[derive(Debug)]
pub(crate) struct BudgetEnforcer {
    budget: Budget,
    events: usize,
    aliases: usize,
    nodes: usize,
    depth: usize,
    scalar_bytes: usize,
    anchors: AHashSet<usize>,
}

impl BudgetEnforcer {
    pub(crate) fn new(budget: Budget) -> Self {
        Self {
            budget,
            events: 0,
            aliases: 0,
            nodes: 0,
            depth: 0,
            scalar_bytes: 0,
            anchors: AHashSet::new(),
        }
    }

    /// Account for one event. Fails as soon as a limit is exceeded.
    pub(crate) fn observe(&mut self, event: &Event<'_>) -> Result<(), BudgetBreach> {
        self.events += 1;
        if self.events > self.budget.max_events {
            return Err(BudgetBreach::Events {
                events: self.events,
            });
        }

        match event {
            Event::Alias(_) => {
                self.aliases += 1;
                if self.aliases > self.budget.max_aliases {
                    return Err(BudgetBreach::Aliases {
                        aliases: self.aliases,
                    });
                }
            }
            Event::Scalar(value, _, anchor_id, _) => {
                self.bump_nodes()?;
                self.scalar_bytes = self.scalar_bytes.saturating_add(value.len());
                if self.scalar_bytes > self.budget.max_total_scalar_bytes {
                    return Err(BudgetBreach::ScalarBytes {
                        total_scalar_bytes: self.scalar_bytes,
                    });
                }
                self.record_anchor(*anchor_id)?;
            }
            Event::SequenceStart(anchor_id, _) | Event::MappingStart(anchor_id, _) => {
                self.bump_nodes()?;
                self.depth += 1;
                if self.depth > self.budget.max_depth {
                    return Err(BudgetBreach::Depth { depth: self.depth });
                }
                self.record_anchor(*anchor_id)?;
            }
            Event::SequenceEnd | Event::MappingEnd => {
                self.depth = self.depth.saturating_sub(1);
            }
            _ => {}
        }
        Ok(())
    }

    /// Checks that need the whole stream.
    pub(crate) fn finalize(&self) -> Result<(), BudgetBreach> {
        let anchors = self.anchors.len();
        if self.budget.enforce_alias_anchor_ratio
            && self.aliases >= self.budget.alias_anchor_min_aliases
            && self.aliases > self.budget.alias_anchor_ratio_multiplier.saturating_mul(anchors)
        {
            return Err(BudgetBreach::AliasAnchorRatio {
                aliases: self.aliases,
                anchors,
            });
        }
        Ok(())
    }

    fn bump_nodes(&mut self) -> Result<(), BudgetBreach> {
        self.nodes += 1;
        if self.nodes > self.budget.max_nodes {
            return Err(BudgetBreach::Nodes { nodes: self.nodes });
        }
        Ok(())
    }

    fn record_anchor(&mut self, anchor_id: usize) -> Result<(), BudgetBreach> {
        if anchor_id != 0 && self.anchors.insert(anchor_id) && self.anchors.len() > self.budget.max_anchors {
            return Err(BudgetBreach::Anchors {
                anchors: self.anchors.len(),
            });
        }
        Ok(())
    }
}
