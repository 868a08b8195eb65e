use crate::error::{Code, Error, Result};

/// Characters that can never appear in a bare identifier.
pub(crate) const NOT_ID_CHARS: &[u8] = b" '!:(),*@$";

/// Characters that additionally cannot start a bare identifier.
pub(crate) const NOT_ID_START_CHARS: &[u8] = b"-0123456789";

/// A forward-only cursor over rison text.
///
/// All delimiters are ASCII, so every scan stops on a `char` boundary and the
/// slices handed out are always valid `str`s.
pub struct StrRead<'a> {
    input: &'a str,
    /// Index of the *next* byte that will be returned by next() or peek().
    index: usize,
    whitespace: &'a str,
}

impl<'a> StrRead<'a> {
    pub fn new(input: &'a str) -> Self {
        StrRead {
            input,
            index: 0,
            whitespace: "",
        }
    }

    /// Skip any of `whitespace` between tokens. Empty by default.
    pub fn with_whitespace(mut self, whitespace: &'a str) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.index).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.input[self.index..].chars().next()
    }

    pub fn discard(&mut self) {
        self.index += 1;
    }

    pub fn skip_whitespace(&mut self) {
        if self.whitespace.is_empty() {
            return;
        }
        while let Some(ch) = self.peek_char() {
            if !self.whitespace.contains(ch) {
                break;
            }
            self.index += ch.len_utf8();
        }
    }

    /// Peek at the next byte that is not whitespace.
    pub fn peek_token(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.peek()
    }

    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.input[start..self.index]
    }

    pub fn error(&self, code: Code) -> Error {
        Error::syntax(code, self.index)
    }

    /// Parse the body of a quoted string. The opening `'` has already been
    /// consumed; the closing one is consumed here.
    pub fn parse_str(&mut self) -> Result<String> {
        let bytes = self.input.as_bytes();
        let mut scratch = String::new();
        let mut start = self.index;
        loop {
            while self.index < bytes.len() && !is_control(bytes[self.index]) {
                self.index += 1;
            }
            if self.index == bytes.len() {
                return Err(self.error(Code::UnmatchedQuote));
            }
            scratch.push_str(&self.input[start..self.index]);
            match bytes[self.index] {
                b'\'' => {
                    self.index += 1;
                    return Ok(scratch);
                }
                _ => {
                    self.index += 1;
                    match self.peek_char() {
                        Some(c @ ('!' | '\'')) => {
                            scratch.push(c);
                            self.index += 1;
                        }
                        Some(c) => return Err(self.error(Code::InvalidEscape(c))),
                        None => return Err(self.error(Code::UnmatchedQuote)),
                    }
                    start = self.index;
                }
            }
        }
    }

    /// Scan the longest bare identifier starting at the cursor. Returns an
    /// empty string when the next character cannot start one.
    pub fn parse_ident(&mut self) -> &'a str {
        let start = self.index;
        match self.peek() {
            Some(b) if !NOT_ID_START_CHARS.contains(&b) => {}
            _ => return "",
        }
        while let Some(ch) = self.peek_char() {
            if is_not_id_char(ch) || self.whitespace.contains(ch) {
                break;
            }
            self.index += ch.len_utf8();
        }
        self.slice_from(start)
    }
}

pub(crate) fn is_not_id_char(ch: char) -> bool {
    ch.is_ascii() && NOT_ID_CHARS.contains(&(ch as u8))
}

pub(crate) fn is_control(b: u8) -> bool {
    b == b'\'' || b == b'!'
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ident_stops_at_delimiter() {
        let mut read = StrRead::new("hello-world2:rest");

        assert_eq!(read.parse_ident(), "hello-world2");
        assert_eq!(read.peek(), Some(b':'));
    }

    #[test]
    fn ident_cannot_start_with_digit_or_dash() {
        assert_eq!(StrRead::new("1abc").parse_ident(), "");
        assert_eq!(StrRead::new("-abc").parse_ident(), "");
    }

    #[test]
    fn ident_keeps_percent_escapes() {
        let mut read = StrRead::new("mock%40email.com");

        assert_eq!(read.parse_ident(), "mock%40email.com");
    }

    #[test]
    fn ident_accepts_non_ascii() {
        let mut read = StrRead::new("café)");

        assert_eq!(read.parse_ident(), "café");
        assert_eq!(read.peek(), Some(b')'));
    }

    #[test]
    fn ident_stops_at_configured_whitespace() {
        let mut read = StrRead::new("a\tb").with_whitespace("\t");

        assert_eq!(read.parse_ident(), "a");
    }

    #[test]
    fn str_with_escapes() {
        let mut read = StrRead::new("it!'s!!'rest");

        assert_eq!(read.parse_str().unwrap(), "it's!");
        assert_eq!(read.peek(), Some(b'r'));
    }

    #[test]
    fn str_invalid_escape() {
        let err = StrRead::new("a!b'").parse_str().unwrap_err();

        assert_eq!(err.to_string(), "invalid string escape: '!b' at position 2");
    }

    #[test]
    fn str_unterminated() {
        assert!(StrRead::new("abc").parse_str().unwrap_err().is_eof());
        assert!(StrRead::new("abc!").parse_str().unwrap_err().is_eof());
    }

    #[test]
    fn whitespace_skipping_is_opt_in() {
        let mut plain = StrRead::new("  x");
        let mut skipping = StrRead::new("  x").with_whitespace(" ");

        assert_eq!(plain.peek_token(), Some(b' '));
        assert_eq!(skipping.peek_token(), Some(b'x'));
    }
}
