//! Rison text to [`Value`].

use crate::error::{Code, Error, Result};
use crate::read::StrRead;
use crate::value::{Map, Number, Value};
use crate::Mode;

/// The whitespace set conventionally used when whitespace skipping is wanted.
pub const WHITESPACE: &str = " \t\n\r\x0c";

/// Parse a rison value in standard mode.
pub fn parse(text: &str) -> Result<Value> {
    Parser::new(text).parse()
}

/// Parse a rison value written in `mode`. O-rison text is read as the body of
/// an object and A-rison text as the body of an array.
pub fn parse_with_mode(text: &str, mode: Mode) -> Result<Value> {
    Parser::new(text).mode(mode).parse()
}

/// Parse rison from bytes, which must be UTF-8.
pub fn parse_slice(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::syntax(Code::InvalidUtf8, e.valid_up_to()))?;
    parse(text)
}

#[derive(Clone, Copy)]
enum State {
    Int,
    Frac,
    Exp,
}

/// A configurable rison parser.
///
/// ```
/// use rison::{parse::Parser, Mode, Value};
///
/// let value = Parser::new("a: 1, b: !t")
///     .mode(Mode::Object)
///     .whitespace(rison::parse::WHITESPACE)
///     .parse()
///     .unwrap();
/// assert_eq!(value.as_object().unwrap()["b"], Value::Bool(true));
/// ```
pub struct Parser<'a> {
    text: &'a str,
    mode: Mode,
    whitespace: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Parser {
            text,
            mode: Mode::Standard,
            whitespace: "",
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip any of these characters between tokens. Rison is whitespace
    /// significant unless this is set.
    pub fn whitespace(mut self, whitespace: &'a str) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn parse(self) -> Result<Value> {
        tracing::trace!(mode = ?self.mode, len = self.text.len(), "parsing rison");
        let wrapped;
        let (text, prefix) = match self.mode {
            Mode::Standard => (self.text, ""),
            Mode::Object => {
                wrapped = format!("({})", self.text);
                (wrapped.as_str(), "(")
            }
            Mode::Array => {
                wrapped = format!("!({})", self.text);
                (wrapped.as_str(), "!(")
            }
        };
        let mut de = Deserializer {
            read: StrRead::new(text).with_whitespace(self.whitespace),
        };
        let result = de
            .parse_value()
            .and_then(|value| {
                if !prefix.is_empty() && de.read.position() < text.len() {
                    // A `)` in the caller's text closed the implied container.
                    return Err(Error::syntax(
                        Code::TrailingCharacters,
                        de.read.position() - 1,
                    ));
                }
                de.end()?;
                Ok(value)
            })
            .map_err(|err| err.unshift(prefix.len()));
        if let Err(err) = &result {
            tracing::debug!(error = %err, "rison parse failed");
        }
        result
    }
}

struct Deserializer<'a> {
    read: StrRead<'a>,
}

impl<'a> Deserializer<'a> {
    fn peek(&mut self) -> Option<u8> {
        self.read.peek_token()
    }

    fn eat_char(&mut self) {
        self.read.discard();
    }

    fn end(&mut self) -> Result<()> {
        match self.peek() {
            Some(_) => Err(self.read.error(Code::TrailingCharacters)),
            None => Ok(()),
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some(b'!') => {
                self.eat_char();
                match self.read.peek_char() {
                    Some('t') => {
                        self.eat_char();
                        Ok(Value::Bool(true))
                    }
                    Some('f') => {
                        self.eat_char();
                        Ok(Value::Bool(false))
                    }
                    Some('n') => {
                        self.eat_char();
                        Ok(Value::Null)
                    }
                    Some('(') => {
                        self.eat_char();
                        self.parse_array()
                    }
                    Some(c) => Err(self.read.error(Code::UnknownLiteral(c))),
                    None => Err(self.read.error(Code::BangAtEnd)),
                }
            }
            Some(b'(') => {
                self.eat_char();
                self.parse_object()
            }
            Some(b'\'') => {
                self.eat_char();
                self.read.parse_str().map(Value::String)
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number().map(Value::Number),
            Some(_) => {
                let ident = self.read.parse_ident();
                if ident.is_empty() {
                    let c = self.read.peek_char().unwrap_or_default();
                    return Err(self.read.error(Code::InvalidCharacter(c)));
                }
                Ok(Value::String(ident.to_owned()))
            }
            None => Err(self.read.error(Code::EmptyExpression)),
        }
    }

    /// Handle the separator before the next element of an array or object.
    /// Returns `false` once the closing `)` has been consumed.
    fn next_element(&mut self, first: bool, unmatched: Code) -> Result<bool> {
        match self.peek() {
            Some(b')') => {
                self.eat_char();
                Ok(false)
            }
            Some(b',') => {
                if first {
                    return Err(self.read.error(Code::ExtraComma));
                }
                self.eat_char();
                match self.peek() {
                    Some(b',' | b')') => Err(self.read.error(Code::ExtraComma)),
                    _ => Ok(true),
                }
            }
            Some(_) if !first => Err(self.read.error(Code::MissingComma)),
            Some(_) => Ok(true),
            None => Err(self.read.error(unmatched)),
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        let mut array = Vec::new();
        while self.next_element(array.is_empty(), Code::UnmatchedArray)? {
            array.push(self.parse_value()?);
        }
        Ok(Value::Array(array))
    }

    fn parse_object(&mut self) -> Result<Value> {
        let mut object = Map::new();
        while self.next_element(object.is_empty(), Code::UnmatchedObject)? {
            let start = self.read.position();
            let key = match self.parse_value()? {
                Value::String(key) if !key.is_empty() => key,
                _ => return Err(Error::syntax(Code::InvalidKey, start)),
            };
            match self.peek() {
                Some(b':') => self.eat_char(),
                _ => return Err(self.read.error(Code::MissingColon)),
            }
            let value = self.parse_value()?;
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }

    fn parse_number(&mut self) -> Result<Number> {
        let start = self.read.position();
        // The leading `-` or digit.
        self.eat_char();
        let mut state = State::Int;
        let mut permit_sign = false;
        while let Some(ch) = self.read.peek() {
            match (ch, state) {
                (b'0'..=b'9', _) => permit_sign = false,
                (b'-', _) if permit_sign => permit_sign = false,
                (b'.', State::Int) => state = State::Frac,
                (b'e' | b'E', State::Int | State::Frac) => {
                    state = State::Exp;
                    permit_sign = true;
                    self.eat_char();
                    continue;
                }
                _ => break,
            }
            self.eat_char();
        }

        let s = self.read.slice_from(start);
        let invalid = || Error::syntax(Code::InvalidNumber, start);
        if s == "-" {
            return Err(invalid());
        }
        if let State::Int = state {
            let int = if s.starts_with('-') {
                s.parse::<i64>().ok().map(Number::from)
            } else {
                s.parse::<u64>().ok().map(Number::from)
            };
            if let Some(n) = int {
                return Ok(n);
            }
        }
        s.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(invalid)
    }
}
