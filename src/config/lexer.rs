//! Byte-level scanner for `config.cat`.
//!
//! Every byte is classified through a 256-entry table. Tokens are returned
//! as `&'a str` slices of the input, so scanning never allocates.

use super::error::{ParseError, ParseErrorKind};

const IDENT: u8 = 1;
const SPACE: u8 = 2;
const SEPARATOR: u8 = 4;
const DELIM: u8 = 8;

static CLASSES: [u8; 256] = build_classes();

const fn build_classes() -> [u8; 256] {
    let mut table = [0u8; 256];

    let mut c = b'0';
    while c <= b'9' {
        table[c as usize] = IDENT;
        c += 1;
    }
    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = IDENT;
        table[(c - b'a' + b'A') as usize] = IDENT;
        c += 1;
    }

    let punct = b"_-/.*=+,@%~";
    let mut i = 0;
    while i < punct.len() {
        table[punct[i] as usize] = IDENT;
        i += 1;
    }

    table[b' ' as usize] = SPACE;
    table[b'\t' as usize] = SPACE;
    table[b'\r' as usize] = SPACE;
    table[b'\n' as usize] = SPACE;

    table[b':' as usize] = SEPARATOR;

    table[b'{' as usize] = DELIM;
    table[b'}' as usize] = DELIM;
    table[b'[' as usize] = DELIM;
    table[b']' as usize] = DELIM;

    table
}

#[inline]
pub fn is_ident(b: u8) -> bool {
    CLASSES[b as usize] & IDENT != 0
}

#[inline]
pub fn is_space(b: u8) -> bool {
    CLASSES[b as usize] & SPACE != 0
}

#[inline]
pub fn is_separator(b: u8) -> bool {
    CLASSES[b as usize] & SEPARATOR != 0
}

#[inline]
pub fn is_delim(b: u8) -> bool {
    CLASSES[b as usize] & DELIM != 0
}

/// Forward-only cursor over the configuration text.
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    pub fn bump(&mut self) {
        if self.pos < self.src.len() {
            self.pos += 1;
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
    }

    /// Consumes the longest run of identifier bytes. The run may be empty.
    ///
    /// Identifier bytes are all ASCII, so the slice always ends on a char
    /// boundary.
    pub fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Consumes `expected` or fails describing what was found instead.
    pub fn expect(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(ParseErrorKind::Expected {
                expected: format!("`{}`", expected as char),
                found: self.describe_next(),
            })),
        }
    }

    /// Consumes an identifier equal to `keyword`.
    pub fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        let start = self.pos;
        let word = self.ident();
        if word == keyword {
            return Ok(());
        }
        self.pos = start;
        Err(self.error(ParseErrorKind::Expected {
            expected: format!("`{keyword}`"),
            found: self.describe_next(),
        }))
    }

    /// Human description of the token at the cursor, for error messages.
    pub fn describe_next(&self) -> String {
        let rest = &self.src[self.pos..];
        let Some(first) = rest.chars().next() else {
            return "end of input".to_string();
        };

        let word: String = rest
            .bytes()
            .take_while(|&b| is_ident(b))
            .map(char::from)
            .take(32)
            .collect();

        if word.is_empty() {
            format!("`{}`", first.escape_default())
        } else {
            format!("`{word}`")
        }
    }

    /// Error for the byte at the cursor when it starts no valid token.
    pub fn unexpected(&self) -> ParseError {
        let kind = match self.src[self.pos..].chars().next() {
            None => ParseErrorKind::UnexpectedEof,
            Some(c) => ParseErrorKind::UnexpectedChar(c),
        };
        self.error(kind)
    }

    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.pos, kind)
    }

    /// Builds an error located at byte offset `pos`, counting lines and
    /// columns over everything consumed before it.
    pub fn error_at(&self, pos: usize, kind: ParseErrorKind) -> ParseError {
        let (line, column) = location(self.src, pos);
        ParseError { line, column, kind }
    }
}

/// 1-based line and column of byte offset `pos`.
pub fn location(src: &str, pos: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for &b in &src.as_bytes()[..pos.min(src.len())] {
        if b == b'\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
