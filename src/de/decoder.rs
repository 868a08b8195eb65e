//! Hand-driven traversal of a parsed value, for decoding code that needs more
//! control than a serde derive gives: nesting a supertype's fields under a
//! delegation key, reading positional records, peeking at optional keys.

use serde::de::Deserialize;

use crate::de::deserialize_at;
use crate::error::{Code, Error, Result};
use crate::parse;
use crate::path::Path;
use crate::value::{Map, Value};
use crate::{Mode, SUPER_KEY};

/// The root of a decode operation. Text is parsed on first use and the
/// result kept for the rest of the operation.
pub struct Decoder {
    pending: Option<(String, Mode)>,
    value: Value,
}

impl Decoder {
    pub fn new(text: impl Into<String>, mode: Mode) -> Self {
        Decoder {
            pending: Some((text.into(), mode)),
            value: Value::Null,
        }
    }

    pub fn from_value(value: Value) -> Self {
        Decoder {
            pending: None,
            value,
        }
    }

    fn load(&mut self) -> Result<&Value> {
        if let Some((text, mode)) = &self.pending {
            tracing::trace!(?mode, len = text.len(), "parsing decoder input");
            self.value = parse::parse_with_mode(text, *mode)?;
            self.pending = None;
        }
        Ok(&self.value)
    }

    pub fn root(&mut self) -> Result<ValueDecoder<'_>> {
        Ok(ValueDecoder::new(self.load()?, Path::root()))
    }

    pub fn keyed(&mut self) -> Result<KeyedDecoder<'_>> {
        self.root()?.keyed()
    }

    pub fn unkeyed(&mut self) -> Result<UnkeyedDecoder<'_>> {
        self.root()?.unkeyed()
    }

    pub fn single_value(&mut self) -> Result<SingleValueDecoder<'_>> {
        Ok(self.root()?.single_value())
    }

    pub fn decode<'a, T>(&'a mut self) -> Result<T>
    where
        T: Deserialize<'a>,
    {
        self.root()?.decode()
    }
}

/// A value of unknown shape, from which any of the three container views can
/// be requested.
#[derive(Clone, Debug)]
pub struct ValueDecoder<'a> {
    value: &'a Value,
    path: Path,
}

impl<'a> ValueDecoder<'a> {
    pub(crate) fn new(value: &'a Value, path: Path) -> Self {
        ValueDecoder { value, path }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// View the value as an object. Fails with an invalid argument error for
    /// any other shape.
    pub fn keyed(self) -> Result<KeyedDecoder<'a>> {
        match self.value {
            Value::Object(object) => Ok(KeyedDecoder {
                object,
                path: self.path,
            }),
            other => Err(invalid_argument("object", other).at(&self.path)),
        }
    }

    pub fn unkeyed(self) -> Result<UnkeyedDecoder<'a>> {
        match self.value {
            Value::Array(array) => Ok(UnkeyedDecoder {
                array,
                index: 0,
                path: self.path,
            }),
            other => Err(invalid_argument("array", other).at(&self.path)),
        }
    }

    pub fn single_value(self) -> SingleValueDecoder<'a> {
        SingleValueDecoder {
            value: self.value,
            path: self.path,
        }
    }

    pub fn decode<T>(&self) -> Result<T>
    where
        T: Deserialize<'a>,
    {
        deserialize_at(self.value, &self.path)
    }
}

fn invalid_argument(expected: &'static str, found: &Value) -> Error {
    Error::new(Code::InvalidArgument {
        expected,
        found: found.kind().as_str(),
    })
}

/// An object, read by key.
#[derive(Clone, Debug)]
pub struct KeyedDecoder<'a> {
    object: &'a Map,
    path: Path,
}

impl<'a> KeyedDecoder<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.object.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.object.contains_key(key)
    }

    fn get(&self, key: &str) -> Result<&'a Value> {
        self.object
            .get(key)
            .ok_or_else(|| Error::new(Code::KeyNotFound(key.to_owned())).at(&self.path))
    }

    /// Whether the value under `key` is `!n`. The key must be present.
    pub fn decode_nil(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_null())
    }

    pub fn decode<T>(&self, key: &str) -> Result<T>
    where
        T: Deserialize<'a>,
    {
        let value = self.get(key)?;
        deserialize_at(value, &self.path.key(key))
    }

    /// `None` when `key` is absent or `!n`.
    pub fn decode_if_present<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: Deserialize<'a>,
    {
        match self.object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => deserialize_at(value, &self.path.key(key)).map(Some),
        }
    }

    fn nested(&self, key: &str) -> Result<ValueDecoder<'a>> {
        Ok(ValueDecoder::new(self.get(key)?, self.path.key(key)))
    }

    pub fn nested_keyed(&self, key: &str) -> Result<KeyedDecoder<'a>> {
        let nested = self.nested(key)?;
        match nested.value {
            Value::Object(_) => nested.keyed(),
            other => Err(other.mismatch("object").at(&nested.path)),
        }
    }

    pub fn nested_unkeyed(&self, key: &str) -> Result<UnkeyedDecoder<'a>> {
        let nested = self.nested(key)?;
        match nested.value {
            Value::Array(_) => nested.unkeyed(),
            other => Err(other.mismatch("array").at(&nested.path)),
        }
    }

    /// The supertype's fields, nested under [`SUPER_KEY`].
    pub fn super_decoder(&self) -> Result<ValueDecoder<'a>> {
        self.nested(SUPER_KEY)
    }

    /// The supertype's fields, nested under a caller-chosen key.
    pub fn super_decoder_for_key(&self, key: &str) -> Result<ValueDecoder<'a>> {
        self.nested(key)
    }
}

/// An array, read front to back.
#[derive(Clone, Debug)]
pub struct UnkeyedDecoder<'a> {
    array: &'a [Value],
    index: usize,
    path: Path,
}

impl<'a> UnkeyedDecoder<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.array.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.array.len()
    }

    fn current(&self) -> Result<&'a Value> {
        self.array
            .get(self.index)
            .ok_or_else(|| Error::new(Code::PastEnd).at(&self.path))
    }

    /// Whether the current element is `!n`; the cursor moves past it only if
    /// it is.
    pub fn decode_nil(&mut self) -> Result<bool> {
        let is_nil = self.current()?.is_null();
        if is_nil {
            self.index += 1;
        }
        Ok(is_nil)
    }

    pub fn decode<T>(&mut self) -> Result<T>
    where
        T: Deserialize<'a>,
    {
        let value = self.current()?;
        let ret = deserialize_at(value, &self.path.index(self.index))?;
        self.index += 1;
        Ok(ret)
    }

    /// `None` at the end of the array or for a `!n` element.
    pub fn decode_if_present<T>(&mut self) -> Result<Option<T>>
    where
        T: Deserialize<'a>,
    {
        if self.is_at_end() || self.decode_nil()? {
            return Ok(None);
        }
        self.decode().map(Some)
    }

    fn next_decoder(&mut self) -> Result<ValueDecoder<'a>> {
        let value = self.current()?;
        let decoder = ValueDecoder::new(value, self.path.index(self.index));
        self.index += 1;
        Ok(decoder)
    }

    /// The cursor stays put when the element is not an object.
    pub fn nested_keyed(&mut self) -> Result<KeyedDecoder<'a>> {
        match self.current()? {
            Value::Object(_) => self.next_decoder()?.keyed(),
            other => Err(other.mismatch("object").at(&self.path.index(self.index))),
        }
    }

    pub fn nested_unkeyed(&mut self) -> Result<UnkeyedDecoder<'a>> {
        match self.current()? {
            Value::Array(_) => self.next_decoder()?.unkeyed(),
            other => Err(other.mismatch("array").at(&self.path.index(self.index))),
        }
    }

    /// The supertype's fields, taken from the next element.
    pub fn super_decoder(&mut self) -> Result<ValueDecoder<'a>> {
        self.next_decoder()
    }
}

/// A single value of any shape.
#[derive(Clone, Debug)]
pub struct SingleValueDecoder<'a> {
    value: &'a Value,
    path: Path,
}

macro_rules! decode_number {
    ($($method:ident => $ty:ty,)*) => {
        $(
            pub fn $method(&self) -> Result<$ty> {
                self.number(stringify!($ty))
                    .and_then(|n| n.narrow::<$ty>(stringify!($ty)))
                    .map_err(|e| e.at(&self.path))
            }
        )*
    };
}

impl<'a> SingleValueDecoder<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn decode_nil(&self) -> bool {
        self.value.is_null()
    }

    pub fn decode_bool(&self) -> Result<bool> {
        self.value
            .as_bool()
            .ok_or_else(|| self.value.mismatch("bool").at(&self.path))
    }

    pub fn decode_str(&self) -> Result<&'a str> {
        match self.value {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string").at(&self.path)),
        }
    }

    fn number(&self, expected: &'static str) -> Result<&'a crate::Number> {
        self.value
            .as_number()
            .ok_or_else(|| self.value.mismatch(expected))
    }

    decode_number! {
        decode_i8 => i8,
        decode_i16 => i16,
        decode_i32 => i32,
        decode_i64 => i64,
        decode_isize => isize,
        decode_u8 => u8,
        decode_u16 => u16,
        decode_u32 => u32,
        decode_u64 => u64,
        decode_usize => usize,
    }

    pub fn decode_f32(&self) -> Result<f32> {
        self.number("f32")
            .and_then(|n| n.narrow_f32())
            .map_err(|e| e.at(&self.path))
    }

    pub fn decode_f64(&self) -> Result<f64> {
        self.number("f64")
            .map(|n| n.as_f64())
            .map_err(|e| e.at(&self.path))
    }

    pub fn decode<T>(&self) -> Result<T>
    where
        T: Deserialize<'a>,
    {
        deserialize_at(self.value, &self.path)
    }
}
