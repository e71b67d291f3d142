//! Intermediate tree used while decoding.
//!
//! Fragments built from single keys are merged into an accumulator of [`Node`]s. Lists
//! built from `a[3]=x` hold [`Node::Undefined`] in the slots nobody has written yet; the
//! final [`compact`] pass drops those slots and turns the tree into plain [`Value`]s.
//! `Undefined` exists only here, so it can never reach a caller.

use crate::{QsMap, Value};
use indexmap::IndexMap;
use std::mem;

pub(crate) type NodeMap = IndexMap<String, Node>;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    /// A list slot that has not been written.
    Undefined,
    /// A decoded leaf. Never looked into by merge or compaction.
    Scalar(Value),
    List(Vec<Node>),
    Map(NodeMap),
}

impl Node {
    /// Lifts a decoded leaf into the tree.
    ///
    /// Only the outer level of a list or map leaf becomes structure; anything below it
    /// stays an opaque scalar.
    pub(crate) fn from_leaf(value: Value) -> Node {
        match value {
            Value::List(items) => Node::List(items.into_iter().map(Node::Scalar).collect()),
            Value::Map(map) => Node::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Node::Scalar(v)))
                    .collect(),
            ),
            other => Node::Scalar(other),
        }
    }

    pub(crate) fn is_undefined(&self) -> bool {
        matches!(self, Node::Undefined)
    }

    fn is_map_or_undefined(&self) -> bool {
        matches!(self, Node::Map(_) | Node::Undefined)
    }
}

/// Pending merges: each slot still has to absorb its source node.
type Work<'a> = Vec<(&'a mut Node, Node)>;

/// Merges any fragment into a map, always producing a map.
///
/// A list is overlaid by index, a scalar becomes a key set to `true`, and a map is
/// merged key by key. Nested merges run off an explicit work stack, so two keys sharing
/// a deep path cannot exhaust the call stack. `parse_lists` decides whether a sparse list
/// that still has holes after the merge is kept as a list or turned into an index-keyed
/// map.
pub(crate) fn merge_into_map(mut map: NodeMap, source: Node, parse_lists: bool) -> NodeMap {
    let mut work = Vec::new();
    absorb(&mut map, source, &mut work);
    drain(work, parse_lists);
    map
}

fn drain(mut work: Work<'_>, parse_lists: bool) {
    while let Some((slot, source)) = work.pop() {
        merge_step(slot, source, parse_lists, &mut work);
    }
}

/// Merges one level of `source` into `slot` and queues the merges below it.
fn merge_step<'a>(slot: &'a mut Node, source: Node, parse_lists: bool, work: &mut Work<'a>) {
    let target = mem::replace(slot, Node::Undefined);
    match source {
        Node::Undefined | Node::Scalar(Value::Null) => *slot = target,
        Node::Map(source) => {
            let map = match target {
                Node::Map(map) => map,
                Node::List(items) => index_entries(items).collect(),
                Node::Undefined => {
                    *slot = Node::Map(source);
                    return;
                }
                scalar => {
                    *slot = Node::List(vec![scalar, Node::Map(source)]);
                    return;
                }
            };
            *slot = Node::Map(map);
            if let Node::Map(map) = slot {
                merge_entries(map, source, work);
            }
        }
        source => match target {
            Node::List(items) if items.iter().any(Node::is_undefined) => {
                overlay_sparse(slot, items, source, parse_lists, work);
            }
            Node::List(mut items) => match source {
                Node::List(mut incoming)
                    if items.iter().all(Node::is_map_or_undefined)
                        && incoming.iter().all(Node::is_map_or_undefined) =>
                {
                    let tail = incoming.split_off(incoming.len().min(items.len()));
                    items.extend(tail);
                    *slot = Node::List(items);
                    if let Node::List(items) = slot {
                        work.extend(items.iter_mut().zip(incoming));
                    }
                }
                Node::List(incoming) => {
                    items.extend(incoming.into_iter().filter(|n| !n.is_undefined()));
                    *slot = Node::List(items);
                }
                other => {
                    items.push(other);
                    *slot = Node::List(items);
                }
            },
            Node::Map(map) => {
                *slot = Node::Map(map);
                if let Node::Map(map) = slot {
                    absorb(map, source, work);
                }
            }
            Node::Undefined => *slot = source,
            scalar => {
                *slot = match source {
                    Node::List(incoming) => {
                        let mut items = Vec::with_capacity(incoming.len() + 1);
                        items.push(scalar);
                        items.extend(incoming.into_iter().filter(|n| !n.is_undefined()));
                        Node::List(items)
                    }
                    other => Node::List(vec![scalar, other]),
                }
            }
        },
    }
}

/// Folds any node into an existing map.
fn absorb<'a>(map: &'a mut NodeMap, source: Node, work: &mut Work<'a>) {
    match source {
        Node::Undefined | Node::Scalar(Value::Null) => {}
        Node::Scalar(value) => {
            map.insert(value.to_string(), Node::Scalar(Value::Bool(true)));
        }
        Node::List(items) => merge_entries(map, index_entries(items), work),
        Node::Map(source) => merge_entries(map, source, work),
    }
}

/// Written list slots keyed by their index.
fn index_entries(items: Vec<Node>) -> impl Iterator<Item = (String, Node)> {
    items
        .into_iter()
        .enumerate()
        .filter(|(_, n)| !n.is_undefined())
        .map(|(i, n)| (i.to_string(), n))
}

/// New keys are appended in source order; keys already present are queued for merging.
fn merge_entries<'a, I>(map: &'a mut NodeMap, entries: I, work: &mut Work<'a>)
where
    I: IntoIterator<Item = (String, Node)>,
{
    let mut pending = NodeMap::new();
    for (key, value) in entries {
        if map.contains_key(&key) {
            pending.insert(key, value);
        } else {
            map.insert(key, value);
        }
    }
    if pending.is_empty() {
        return;
    }
    for (key, slot) in map.iter_mut() {
        if let Some(value) = pending.swap_remove(key) {
            work.push((slot, value));
        }
    }
}

/// Writes `source` into the slots of a list that still has holes.
///
/// A map landing on a map is merged; anything else overwrites the slot.
fn overlay_sparse<'a>(
    slot: &'a mut Node,
    mut slots: Vec<Node>,
    source: Node,
    parse_lists: bool,
    work: &mut Work<'a>,
) {
    let mut pending: Vec<Option<Node>> = Vec::new();
    match source {
        Node::List(incoming) => {
            for (i, node) in incoming.into_iter().enumerate() {
                if node.is_undefined() {
                    continue;
                }
                if i >= slots.len() {
                    slots.resize_with(i + 1, || Node::Undefined);
                }
                if matches!((&slots[i], &node), (Node::Map(_), Node::Map(_))) {
                    if i >= pending.len() {
                        pending.resize_with(i + 1, || None);
                    }
                    pending[i] = Some(node);
                } else {
                    slots[i] = node;
                }
            }
        }
        other => slots.push(other),
    }
    pending.resize_with(slots.len(), || None);

    let as_map = !parse_lists && slots.iter().any(Node::is_undefined);
    let written = slots
        .into_iter()
        .zip(pending)
        .enumerate()
        .filter(|(_, (n, _))| !n.is_undefined());

    if as_map {
        let (entries, pending): (Vec<(String, Node)>, Vec<Option<Node>>) = written
            .map(|(i, (n, p))| ((i.to_string(), n), p))
            .unzip();
        *slot = Node::Map(entries.into_iter().collect());
        if let Node::Map(map) = slot {
            defer(map.values_mut(), pending, work);
        }
    } else {
        let (items, pending): (Vec<Node>, Vec<Option<Node>>) =
            written.map(|(_, pair)| pair).unzip();
        *slot = Node::List(items);
        if let Node::List(items) = slot {
            defer(items.iter_mut(), pending, work);
        }
    }
}

fn defer<'a>(
    slots: impl Iterator<Item = &'a mut Node>,
    sources: Vec<Option<Node>>,
    work: &mut Work<'a>,
) {
    for (slot, source) in slots.zip(sources) {
        if let Some(source) = source {
            work.push((slot, source));
        }
    }
}

enum Frame {
    List {
        rest: std::vec::IntoIter<Node>,
        out: Vec<Value>,
    },
    Map {
        rest: indexmap::map::IntoIter<String, Node>,
        out: QsMap,
        key: String,
    },
}

impl Frame {
    fn open(node: Node) -> Result<Frame, Option<Value>> {
        match node {
            Node::Undefined => Err(None),
            Node::Scalar(value) => Err(Some(value)),
            Node::List(items) => Ok(Frame::List {
                out: Vec::with_capacity(items.len()),
                rest: items.into_iter(),
            }),
            Node::Map(map) => Ok(Frame::Map {
                out: QsMap::with_capacity(map.len()),
                rest: map.into_iter(),
                key: String::new(),
            }),
        }
    }

    fn push(&mut self, value: Value) {
        match self {
            Frame::List { out, .. } => out.push(value),
            Frame::Map { out, key, .. } => {
                out.insert(mem::take(key), value);
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Frame::List { out, .. } => Value::List(out),
            Frame::Map { out, .. } => Value::Map(out),
        }
    }
}

/// Drops every unwritten slot and converts the tree into plain values.
///
/// Runs on an explicit stack so deeply nested keys cannot exhaust the call stack.
pub(crate) fn compact(root: NodeMap) -> QsMap {
    let mut stack = vec![Frame::Map {
        out: QsMap::with_capacity(root.len()),
        rest: root.into_iter(),
        key: String::new(),
    }];

    while let Some(top) = stack.last_mut() {
        let child = match top {
            Frame::List { rest, .. } => rest.next(),
            Frame::Map { rest, key, .. } => rest.next().map(|(k, node)| {
                *key = k;
                node
            }),
        };

        match child {
            Some(node) => match Frame::open(node) {
                Ok(frame) => stack.push(frame),
                Err(Some(value)) => top.push(value),
                Err(None) => {}
            },
            None => {
                let finished = match stack.pop() {
                    Some(frame) => frame.into_value(),
                    None => break,
                };
                match stack.last_mut() {
                    Some(parent) => parent.push(finished),
                    None => {
                        if let Value::Map(map) = finished {
                            return map;
                        }
                        break;
                    }
                }
            }
        }
    }
    QsMap::new()
}
