//! Hand-driven construction of a [`Value`], the encoding counterpart of
//! [`crate::de::Decoder`].
//!
//! Every container lives in one arena owned by the [`Encoder`]. A handle holds
//! the arena mutably together with the index of the node it writes to, so a
//! nested handle borrows from its parent and the parent is usable again once
//! the nested handle is dropped.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Code, Error, Result};
use crate::path::Path;
use crate::render;
use crate::ser::to_value;
use crate::value::{Map, Value};
use crate::{Mode, SUPER_KEY};

const ROOT: usize = 0;

#[derive(Default)]
enum Shape {
    #[default]
    Empty,
    Scalar(Value),
    Object,
    Array,
}

#[derive(Default)]
struct Node {
    shape: Shape,
    entries: IndexMap<String, usize>,
    elements: Vec<usize>,
}

struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn push(&mut self) -> usize {
        self.nodes.push(Node::default());
        self.nodes.len() - 1
    }

    fn set(&mut self, node: usize, value: Value) {
        self.nodes[node] = Node {
            shape: Shape::Scalar(value),
            ..Node::default()
        };
    }

    fn make_object(&mut self, node: usize) {
        let node = &mut self.nodes[node];
        if !matches!(node.shape, Shape::Object) {
            *node = Node {
                shape: Shape::Object,
                ..Node::default()
            };
        }
    }

    fn make_array(&mut self, node: usize) {
        let node = &mut self.nodes[node];
        if !matches!(node.shape, Shape::Array) {
            *node = Node {
                shape: Shape::Array,
                ..Node::default()
            };
        }
    }

    /// The child of an object node under `key`, created empty if missing.
    fn entry(&mut self, node: usize, key: &str) -> usize {
        if let Some(&child) = self.nodes[node].entries.get(key) {
            return child;
        }
        let child = self.push();
        self.nodes[node].entries.insert(key.to_owned(), child);
        child
    }

    fn append(&mut self, node: usize) -> usize {
        let child = self.push();
        self.nodes[node].elements.push(child);
        child
    }

    /// Slots that were requested but never written become `!n`.
    fn build(&self, node: usize) -> Value {
        let node = &self.nodes[node];
        match &node.shape {
            Shape::Empty => Value::Null,
            Shape::Scalar(value) => value.clone(),
            Shape::Object => Value::Object(
                node.entries
                    .iter()
                    .map(|(key, &child)| (key.clone(), self.build(child)))
                    .collect::<Map>(),
            ),
            Shape::Array => Value::Array(
                node.elements
                    .iter()
                    .map(|&child| self.build(child))
                    .collect(),
            ),
        }
    }
}

/// The root of an encode operation.
pub struct Encoder {
    mode: Mode,
    arena: Arena,
}

impl Encoder {
    pub fn new(mode: Mode) -> Self {
        Encoder {
            mode,
            arena: Arena {
                nodes: vec![Node::default()],
            },
        }
    }

    pub fn root(&mut self) -> ValueEncoder<'_> {
        ValueEncoder {
            arena: &mut self.arena,
            node: ROOT,
            path: Path::root(),
        }
    }

    pub fn keyed(&mut self) -> KeyedEncoder<'_> {
        self.root().keyed()
    }

    pub fn unkeyed(&mut self) -> UnkeyedEncoder<'_> {
        self.root().unkeyed()
    }

    pub fn single_value(&mut self) -> SingleValueEncoder<'_> {
        self.root().single_value()
    }

    /// Render everything written so far. Nothing written renders as the
    /// empty string.
    pub fn to_text(&self) -> String {
        tracing::trace!(mode = ?self.mode, nodes = self.arena.nodes.len(), "rendering encoder");
        if matches!(self.arena.nodes[ROOT].shape, Shape::Empty) {
            return String::new();
        }
        render::render(&self.arena.build(ROOT), self.mode)
    }

    pub fn into_value(self) -> Value {
        self.arena.build(ROOT)
    }
}

/// An unwritten slot that can become any kind of container or a scalar.
pub struct ValueEncoder<'a> {
    arena: &'a mut Arena,
    node: usize,
    path: Path,
}

impl<'a> ValueEncoder<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn the slot into an object. Entries already written are kept if it
    /// is one.
    pub fn keyed(self) -> KeyedEncoder<'a> {
        self.arena.make_object(self.node);
        KeyedEncoder {
            arena: self.arena,
            node: self.node,
            path: self.path,
        }
    }

    pub fn unkeyed(self) -> UnkeyedEncoder<'a> {
        self.arena.make_array(self.node);
        UnkeyedEncoder {
            arena: self.arena,
            node: self.node,
            path: self.path,
        }
    }

    pub fn single_value(self) -> SingleValueEncoder<'a> {
        SingleValueEncoder {
            arena: self.arena,
            node: self.node,
            path: self.path,
        }
    }
}

/// Writes entries into an object.
pub struct KeyedEncoder<'a> {
    arena: &'a mut Arena,
    node: usize,
    path: Path,
}

impl<'a> KeyedEncoder<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn child(&mut self, key: &str) -> Result<usize> {
        if key.is_empty() {
            return Err(Error::new(Code::EmptyKey).at(&self.path));
        }
        Ok(self.arena.entry(self.node, key))
    }

    pub fn encode_nil(&mut self, key: &str) -> Result<()> {
        let child = self.child(key)?;
        self.arena.set(child, Value::Null);
        Ok(())
    }

    pub fn encode<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let child = self.child(key)?;
        let value = to_value(value).map_err(|e| e.at(&self.path.key(key)))?;
        self.arena.set(child, value);
        Ok(())
    }

    fn nested(&mut self, key: &str) -> Result<ValueEncoder<'_>> {
        let node = self.child(key)?;
        Ok(ValueEncoder {
            arena: &mut *self.arena,
            node,
            path: self.path.key(key),
        })
    }

    pub fn nested_keyed(&mut self, key: &str) -> Result<KeyedEncoder<'_>> {
        Ok(self.nested(key)?.keyed())
    }

    pub fn nested_unkeyed(&mut self, key: &str) -> Result<UnkeyedEncoder<'_>> {
        Ok(self.nested(key)?.unkeyed())
    }

    /// A slot under [`SUPER_KEY`] for the supertype's fields.
    pub fn super_encoder(&mut self) -> Result<ValueEncoder<'_>> {
        self.super_encoder_for_key(SUPER_KEY)
    }

    /// The slot starts out as an empty object, so a supertype with no
    /// fields still encodes as `()`.
    pub fn super_encoder_for_key(&mut self, key: &str) -> Result<ValueEncoder<'_>> {
        let mut nested = self.nested(key)?;
        nested.arena.make_object(nested.node);
        Ok(nested)
    }
}

/// Appends elements to an array.
pub struct UnkeyedEncoder<'a> {
    arena: &'a mut Arena,
    node: usize,
    path: Path,
}

impl<'a> UnkeyedEncoder<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.arena.nodes[self.node].elements.len()
    }

    pub fn encode_nil(&mut self) {
        let child = self.arena.append(self.node);
        self.arena.set(child, Value::Null);
    }

    /// Nothing is appended when `value` cannot be encoded.
    pub fn encode<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = to_value(value).map_err(|e| e.at(&self.path.index(self.count())))?;
        let child = self.arena.append(self.node);
        self.arena.set(child, value);
        Ok(())
    }

    fn next(&mut self) -> ValueEncoder<'_> {
        let path = self.path.index(self.count());
        let node = self.arena.append(self.node);
        ValueEncoder {
            arena: &mut *self.arena,
            node,
            path,
        }
    }

    pub fn nested_keyed(&mut self) -> KeyedEncoder<'_> {
        self.next().keyed()
    }

    pub fn nested_unkeyed(&mut self) -> UnkeyedEncoder<'_> {
        self.next().unkeyed()
    }

    /// A fresh trailing slot for the supertype's fields, starting out as an
    /// empty array.
    pub fn super_encoder(&mut self) -> ValueEncoder<'_> {
        let mut next = self.next();
        next.arena.make_array(next.node);
        next
    }
}

/// Holds exactly one scalar or `!n`.
pub struct SingleValueEncoder<'a> {
    arena: &'a mut Arena,
    node: usize,
    path: Path,
}

impl<'a> SingleValueEncoder<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encode_nil(&mut self) {
        self.arena.set(self.node, Value::Null);
    }

    pub fn encode<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = to_value(value).map_err(|e| e.at(&self.path))?;
        if let Value::Array(_) | Value::Object(_) = value {
            return Err(Error::new(Code::CannotEncode("container in a single value")).at(&self.path));
        }
        self.arena.set(self.node, value);
        Ok(())
    }
}
