use std::fmt;

use crate::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// Malformed rison text.
    Syntax,
    /// The text ended while a value, string or container was still open.
    Eof,
    /// The text was well formed but did not have the shape the caller asked
    /// for, or a value could not be encoded.
    Data,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum Code {
    #[error("{0}")]
    Message(String),
    #[error("empty expression")]
    EmptyExpression,
    #[error("'!' at end of input")]
    BangAtEnd,
    #[error("unmatched quote")]
    UnmatchedQuote,
    #[error("unmatched '!('")]
    UnmatchedArray,
    #[error("unmatched '('")]
    UnmatchedObject,
    #[error("invalid character: '{0}'")]
    InvalidCharacter(char),
    #[error("unknown literal: '!{0}'")]
    UnknownLiteral(char),
    #[error("invalid string escape: '!{0}'")]
    InvalidEscape(char),
    #[error("invalid number")]
    InvalidNumber,
    #[error("invalid key")]
    InvalidKey,
    #[error("missing ':'")]
    MissingColon,
    #[error("missing ','")]
    MissingComma,
    #[error("extra ','")]
    ExtraComma,
    #[error("trailing characters")]
    TrailingCharacters,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("key not found: `{0}`")]
    KeyNotFound(String),
    #[error("past end of container")]
    PastEnd,
    #[error("invalid argument: expected {expected}, found {found}")]
    InvalidArgument {
        expected: &'static str,
        found: &'static str,
    },
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("number out of range: {value} does not fit in {target}")]
    NumberOutOfRange { value: String, target: &'static str },
    #[error("cannot encode value: {0}")]
    CannotEncode(&'static str),
    #[error("key must be a string")]
    KeyMustBeString,
    #[error("object keys must not be empty")]
    EmptyKey,
}

#[derive(Debug)]
pub struct Error {
    pub(crate) code: Code,
    position: Option<usize>,
    path: Option<Path>,
}

impl Error {
    pub(crate) fn new(code: Code) -> Self {
        Error {
            code,
            position: None,
            path: None,
        }
    }

    pub(crate) fn syntax(code: Code, position: usize) -> Self {
        Error {
            code,
            position: Some(position),
            path: None,
        }
    }

    /// Move a parse position back by `offset` bytes, for input that was
    /// parsed behind a prefix the caller never wrote.
    pub(crate) fn unshift(mut self, offset: usize) -> Self {
        self.position = self.position.map(|p| p.saturating_sub(offset));
        self
    }

    /// Attach the location of the value being decoded or encoded, unless a
    /// deeper location has already been recorded.
    pub(crate) fn at(mut self, path: &Path) -> Self {
        if self.path.is_none() {
            self.path = Some(path.clone());
        }
        self
    }

    pub fn classify(&self) -> Category {
        match self.code {
            Code::EmptyExpression
            | Code::BangAtEnd
            | Code::UnmatchedQuote
            | Code::UnmatchedArray
            | Code::UnmatchedObject => Category::Eof,
            Code::InvalidCharacter(_)
            | Code::UnknownLiteral(_)
            | Code::InvalidEscape(_)
            | Code::InvalidNumber
            | Code::InvalidKey
            | Code::MissingColon
            | Code::MissingComma
            | Code::ExtraComma
            | Code::TrailingCharacters
            | Code::InvalidUtf8 => Category::Syntax,
            Code::Message(_)
            | Code::KeyNotFound(_)
            | Code::PastEnd
            | Code::InvalidArgument { .. }
            | Code::TypeMismatch { .. }
            | Code::NumberOutOfRange { .. }
            | Code::CannotEncode(_)
            | Code::KeyMustBeString
            | Code::EmptyKey => Category::Data,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self.classify(), Category::Syntax)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.classify(), Category::Eof)
    }

    pub fn is_data(&self) -> bool {
        matches!(self.classify(), Category::Data)
    }

    /// Byte offset into the input at which a parse error was detected.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Location of the offending value for errors raised while decoding or
    /// encoding.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.code, f)?;
        if let Some(position) = self.position {
            write!(f, " at position {position}")?;
        }
        match &self.path {
            Some(path) if !path.is_root() => write!(f, " at `{path}`"),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for Error {}

impl serde::de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::new(Code::Message(msg.to_string()))
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::new(Code::Message(msg.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
