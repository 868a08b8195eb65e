use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};

use crate::error::{Error, Result};
use crate::parse;
use crate::path::Path;
use crate::value::{Map, Number, Value};
use crate::Mode;

mod decoder;

pub use decoder::{Decoder, KeyedDecoder, SingleValueDecoder, UnkeyedDecoder, ValueDecoder};

/// A serde `Deserializer` reading from a borrowed [`Value`].
pub struct ValueDeserializer<'de> {
    value: &'de Value,
    path: Path,
}

impl<'de> ValueDeserializer<'de> {
    pub fn new(value: &'de Value) -> Self {
        Self::with_path(value, Path::root())
    }

    pub(crate) fn with_path(value: &'de Value, path: Path) -> Self {
        Self { value, path }
    }

    fn number(&self, expected: &'static str) -> Result<&'de Number> {
        self.value
            .as_number()
            .ok_or_else(|| self.value.mismatch(expected))
    }
}

/// Deserialize `value` at `path`, recording the path on any error that does
/// not already carry a deeper one.
pub(crate) fn deserialize_at<'de, T>(value: &'de Value, path: &Path) -> Result<T>
where
    T: de::Deserialize<'de>,
{
    T::deserialize(ValueDeserializer::with_path(value, path.clone())).map_err(|e| e.at(path))
}

fn visit_array<'de, V>(array: &'de [Value], path: &Path, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let mut access = SeqAccess::new(array, path);
    let ret = visitor.visit_seq(&mut access)?;
    if access.index < array.len() {
        return Err(de::Error::invalid_length(
            array.len(),
            &"fewer elements in array",
        ));
    }
    Ok(ret)
}

fn visit_object<'de, V>(object: &'de Map, path: &Path, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let mut access = MapAccess::new(object, path);
    let ret = visitor.visit_map(&mut access)?;
    if access.iter.len() > 0 {
        return Err(de::Error::invalid_length(
            object.len(),
            &"fewer elements in map",
        ));
    }
    Ok(ret)
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident($ty:ty),)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                let n = self.number(stringify!($ty))?;
                visitor.$visit(n.narrow::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Number(n) => n.visit(visitor),
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Array(array) => visit_array(array, &self.path, visitor),
            Value::Object(object) => visit_object(object, &self.path, visitor),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Bool(b) => visitor.visit_bool(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f32(self.number("f32")?.narrow_f32()?)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.number("f64")?.as_f64())
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if let Value::String(s) = self.value {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return visitor.visit_char(c);
            }
        }
        Err(self.value.mismatch("char"))
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_borrowed_str(s),
            other => Err(other.mismatch("string")),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_borrowed_bytes(s.as_bytes()),
            Value::Array(array) => visit_array(array, &self.path, visitor),
            other => Err(other.mismatch("bytes")),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            other => Err(other.mismatch("null")),
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Array(array) => visit_array(array, &self.path, visitor),
            other => Err(other.mismatch("array")),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Object(object) => visit_object(object, &self.path, visitor),
            other => Err(other.mismatch("object")),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    /// Unit variants are bare strings; every other variant is an object with
    /// the variant name as its only key.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            Value::Object(object) if object.len() == 1 => {
                let Some((variant, value)) = object.iter().next() else {
                    return Err(self.value.mismatch("enum"));
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value,
                    path: self.path,
                })
            }
            other => Err(other.mismatch("enum")),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct MapAccess<'de, 'p> {
    iter: indexmap::map::Iter<'de, String, Value>,
    value: Option<(&'de str, &'de Value)>,
    path: &'p Path,
}

impl<'de, 'p> MapAccess<'de, 'p> {
    fn new(object: &'de Map, path: &'p Path) -> Self {
        MapAccess {
            iter: object.iter(),
            value: None,
            path,
        }
    }
}

impl<'de, 'p> de::MapAccess<'de> for MapAccess<'de, 'p> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some((key, value));
                seed.deserialize(BorrowedStrDeserializer::<Error>::new(key))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.value.take() else {
            return Err(de::Error::custom("value is missing"));
        };
        let path = self.path.key(key);
        seed.deserialize(ValueDeserializer::with_path(value, path.clone()))
            .map_err(|e| e.at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct SeqAccess<'de, 'p> {
    array: &'de [Value],
    index: usize,
    path: &'p Path,
}

impl<'de, 'p> SeqAccess<'de, 'p> {
    fn new(array: &'de [Value], path: &'p Path) -> Self {
        SeqAccess {
            array,
            index: 0,
            path,
        }
    }
}

impl<'de, 'p> de::SeqAccess<'de> for SeqAccess<'de, 'p> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        let Some(value) = self.array.get(self.index) else {
            return Ok(None);
        };
        let path = self.path.index(self.index);
        self.index += 1;
        seed.deserialize(ValueDeserializer::with_path(value, path.clone()))
            .map(Some)
            .map_err(|e| e.at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.array.len() - self.index)
    }
}

struct EnumDeserializer<'de> {
    variant: &'de str,
    value: &'de Value,
    path: Path,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = VariantDeserializer<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(self.variant))?;
        let path = self.path.key(self.variant);
        Ok((
            variant,
            VariantDeserializer {
                value: self.value,
                path,
            },
        ))
    }
}

struct VariantDeserializer<'de> {
    value: &'de Value,
    path: Path,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(other.mismatch("null").at(&self.path)),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::with_path(self.value, self.path.clone()))
            .map_err(|e| e.at(&self.path))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let ret = match self.value {
            Value::Array(array) => visit_array(array, &self.path, visitor),
            other => Err(other.mismatch("array")),
        };
        ret.map_err(|e| e.at(&self.path))
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let ret = match self.value {
            Value::Object(object) => visit_object(object, &self.path, visitor),
            other => Err(other.mismatch("object")),
        };
        ret.map_err(|e| e.at(&self.path))
    }
}

/// Deserialize a `T` from a parsed value.
pub fn from_value<'de, T>(value: &'de Value) -> Result<T>
where
    T: de::Deserialize<'de>,
{
    deserialize_at(value, &Path::root())
}

pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_str_with_mode(s, Mode::Standard)
}

/// Deserialize a `T` from O-rison or A-rison text without the caller having
/// to restore the outer punctuation.
pub fn from_str_with_mode<T>(s: &str, mode: Mode) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = parse::parse_with_mode(s, mode)?;
    from_value(&value)
}

pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = parse::parse_slice(v)?;
    from_value(&value)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_true() {
        let v: bool = super::from_str("!t").unwrap();

        assert!(v);
    }
    #[test]
    fn deserialize_false() {
        let v: bool = super::from_str("!f").unwrap();

        assert!(!v);
    }
    #[test]
    fn fail_deserialize_bool_trailing() {
        let v: super::Result<bool> = super::from_str("!ff");

        assert!(matches!(v, Err(_)));
    }
    #[test]
    fn fail_deserialize_bool_from_number() {
        let err = super::from_str::<bool>("1").unwrap_err();

        assert_eq!(err.to_string(), "type mismatch: expected bool, found number");
    }
    #[test]
    fn deserialize_quoted_empty_string() {
        let v: String = super::from_str("''").unwrap();

        assert_eq!(v, "");
    }
    #[test]
    fn deserialize_quoted_string() {
        let v: String = super::from_str("'hello, rison'").unwrap();

        assert_eq!(v, "hello, rison");
    }
    #[test]
    fn deserialize_quoted_string_with_escapes() {
        let v: String = super::from_str("'hello, !'rison!'!!'").unwrap();

        assert_eq!(v, "hello, 'rison'!");
    }
    #[test]
    fn deserialize_ident_string() {
        let v: String = super::from_str("hellorison").unwrap();

        assert_eq!(v, "hellorison");
    }
    #[test]
    fn deserialize_char() {
        let v: char = super::from_str("x").unwrap();

        assert_eq!(v, 'x');
        assert!(super::from_str::<char>("xy").is_err());
    }
    #[test]
    fn deserialize_none() {
        let v: Option<String> = super::from_str("!n").unwrap();

        assert_eq!(v, None);
    }
    #[test]
    fn deserialize_some_ident_string() {
        let v: Option<String> = super::from_str("hellorison").unwrap();

        assert_eq!(v, Some("hellorison".into()));
    }
    #[test]
    fn deserialize_u8_in_range() {
        let v: u8 = super::from_str("8").unwrap();

        assert_eq!(v, 8);
    }
    #[test]
    fn fail_deserialize_u8_out_of_range() {
        let err = super::from_str::<u8>("300").unwrap_err();

        assert!(err.is_data());
        assert_eq!(
            err.to_string(),
            "number out of range: 300 does not fit in u8"
        );
    }
    #[test]
    fn fail_deserialize_fraction_into_integer() {
        assert!(super::from_str::<i32>("2.5").is_err());
        assert_eq!(super::from_str::<i32>("2.0").unwrap(), 2);
    }
    #[test]
    fn deserialize_floats() {
        assert_eq!(super::from_str::<f64>("2.2").unwrap(), 2.2);
        assert_eq!(super::from_str::<f32>("1.1").unwrap(), 1.1);
        assert_eq!(super::from_str::<f64>("-3").unwrap(), -3.0);
        assert!(super::from_str::<f32>("1e300").is_err());
    }
    #[test]
    fn deserialize_wide_integers() {
        assert_eq!(super::from_str::<i128>("-5").unwrap(), -5);
        assert_eq!(
            super::from_str::<u128>("18446744073709551615").unwrap(),
            u128::from(u64::MAX)
        );
    }
    #[test]
    fn deserialize_empty_struct() {
        #[derive(serde::Deserialize)]
        struct Empty {}
        let _v: Empty = super::from_str("()").unwrap();
    }
    #[test]
    fn deserialize_struct() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Full {
            a: String,
            b: String,
        }
        let v: Full = super::from_str("(a:hello,b:world)").unwrap();

        assert_eq!(
            v,
            Full {
                a: "hello".into(),
                b: "world".into()
            }
        );
    }
    #[test]
    fn deserialize_struct_with_optional_present() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Full {
            a: String,
            b: Option<String>,
        }
        let v: Full = super::from_str("(a:hello,b:world)").unwrap();

        assert_eq!(
            v,
            Full {
                a: "hello".into(),
                b: Some("world".into())
            }
        );
    }
    #[test]
    fn deserialize_struct_with_optional_missing() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Full {
            a: String,
            b: Option<String>,
        }
        let v: Full = super::from_str("(a:hello)").unwrap();

        assert_eq!(
            v,
            Full {
                a: "hello".into(),
                b: None
            }
        );
    }
    #[test]
    fn fail_deserialize_struct_with_required_missing() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Full {
            a: String,
            b: String,
        }
        let err = super::from_str::<Full>("(a:hello)").unwrap_err();

        assert_eq!(err.to_string(), "missing field `b`");
    }
    #[test]
    fn fail_deserialize_nested_reports_path() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Person {
            name: String,
        }
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Team {
            people: Vec<Person>,
        }
        let err = super::from_str::<Team>("(people:!((name:a),(name:1)))").unwrap_err();

        assert_eq!(
            err.to_string(),
            "type mismatch: expected string, found number at `people[1].name`"
        );
    }
    #[test]
    fn deserialize_map() {
        let v: std::collections::HashMap<String, String> =
            super::from_str("(a:hello,b:world)").unwrap();

        let expected = vec![("a".into(), "hello".into()), ("b".into(), "world".into())]
            .into_iter()
            .collect();
        assert_eq!(v, expected);
    }
    #[test]
    fn deserialize_tuple() {
        let v: (String, String) = super::from_str("!(hello,world)").unwrap();

        assert_eq!(v, ("hello".into(), "world".into()));
    }
    #[test]
    fn fail_deserialize_tuple_too_long() {
        let v = super::from_str::<(String, String)>("!(a,b,c)");

        assert!(v.is_err());
    }
    #[test]
    fn deserialize_nil_array() {
        let v: Vec<Option<String>> = super::from_str("!(a,!n,c)").unwrap();

        assert_eq!(v, vec![Some("a".into()), None, Some("c".into())]);
    }
    #[test]
    fn deserialize_enum() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        #[serde(rename_all = "lowercase")]
        enum State {
            Active,
            Canceled,
        }
        #[derive(serde::Deserialize, Debug, PartialEq)]
        enum Shape {
            Circle(f64),
            Rect { w: u32, h: u32 },
            Pair(u8, u8),
        }
        assert_eq!(super::from_str::<State>("active").unwrap(), State::Active);
        assert_eq!(super::from_str::<State>("canceled").unwrap(), State::Canceled);
        assert_eq!(
            super::from_str::<Shape>("(Circle:1.5)").unwrap(),
            Shape::Circle(1.5)
        );
        assert_eq!(
            super::from_str::<Shape>("(Rect:(w:2,h:3))").unwrap(),
            Shape::Rect { w: 2, h: 3 }
        );
        assert_eq!(
            super::from_str::<Shape>("(Pair:!(1,2))").unwrap(),
            Shape::Pair(1, 2)
        );
        assert!(super::from_str::<State>("paused").is_err());
    }
    #[test]
    fn deserialize_object_mode() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Mock {
            array: Vec<i32>,
            email: String,
        }
        let v: Mock = super::from_str_with_mode(
            "array:!(1,2,3),email:mock%40email.com",
            super::Mode::Object,
        )
        .unwrap();

        assert_eq!(
            v,
            Mock {
                array: vec![1, 2, 3],
                email: "mock%40email.com".into()
            }
        );
    }
    #[test]
    fn deserialize_array_mode() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Mock {
            name: String,
        }
        let v: Vec<Mock> =
            super::from_str_with_mode("(name:one),(name:two),(name:three)", super::Mode::Array)
                .unwrap();

        let names: Vec<_> = v.into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["one", "two", "three"]);
    }
    #[test]
    fn deserialize_value_string() {
        let v: serde_json::Value = super::from_str("helloworld").unwrap();

        assert_eq!(v, serde_json::Value::String("helloworld".into()));
    }
    #[test]
    fn deserialize_value_map() {
        let v: serde_json::Value = super::from_str("(hello:!(a,b,c),world:'it works')").unwrap();

        assert_eq!(
            v,
            serde_json::json!({"hello": ["a", "b", "c"], "world": "it works"})
        );
    }
    #[test]
    fn deserialize_value_map_from_slice() {
        let v: serde_json::Value =
            super::from_slice(b"(hello:!(a,b,c),world:'it works')").unwrap();

        assert_eq!(
            v,
            serde_json::json!({"hello": ["a", "b", "c"], "world": "it works"})
        );
    }
    #[test]
    fn deserialize_borrowed_from_value() {
        #[derive(serde::Deserialize)]
        struct Borrowed<'a> {
            name: &'a str,
        }
        let value = crate::parse("(name:zero-copy)").unwrap();
        let v: Borrowed<'_> = super::from_value(&value).unwrap();

        assert_eq!(v.name, "zero-copy");
    }
}
