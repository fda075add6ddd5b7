//! Character-level scanner that classifies text into protected and
//! unprotected regions.
//!
//! Two independent pieces of state drive the classification:
//! - `in_wildcard`, toggled by every `__` delimiter pair
//! - `paren_depth`, raised by `(` and lowered by `)`
//!
//! A character is protected when it sits inside a wildcard token or inside
//! parentheses. The two conditions are OR-combined, so `(__name__)` is simply
//! protected twice over.

use serde::Serialize;
use std::iter::Peekable;
use std::str::CharIndices;

/// What role a scanned character plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CharKind {
    /// One half of a `__` delimiter pair.
    Delimiter,
    OpenParen,
    CloseParen,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned {
    pub ch: char,
    pub kind: CharKind,
    pub protected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Input ended while a `__` delimiter was still open.
    MalformedWildcard,
    /// A `)` arrived with no open parenthesis.
    ParenUnderflow,
}

/// Terminal scanner fault. `offset` is the byte offset of the offending
/// delimiter or parenthesis, `line` its 1-based line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanFault {
    pub kind: FaultKind,
    pub offset: usize,
    pub line: usize,
}

impl ScanFault {
    pub fn into_error(self, document: &str) -> crate::Error {
        match self.kind {
            FaultKind::MalformedWildcard => {
                crate::Error::malformed_wildcard(document, self.offset, self.line)
            }
            FaultKind::ParenUnderflow => {
                crate::Error::paren_underflow(document, self.offset, self.line)
            }
        }
    }
}

/// Lazy scanner over a text. Yields one `Scanned` per character, then either
/// ends cleanly or yields a single `Err(ScanFault)` and stops.
pub struct TokenScanner<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    in_wildcard: bool,
    paren_depth: usize,
    /// Byte offset of the delimiter that opened the current wildcard.
    open_at: usize,
    /// Second half of a delimiter pair still to be emitted.
    pending: Option<Scanned>,
    finished: bool,
}

impl<'a> TokenScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
            in_wildcard: false,
            paren_depth: 0,
            open_at: 0,
            pending: None,
            finished: false,
        }
    }

    pub fn paren_depth(&self) -> usize {
        self.paren_depth
    }

    fn protected(&self) -> bool {
        self.in_wildcard || self.paren_depth > 0
    }

    fn fault(&mut self, kind: FaultKind, offset: usize) -> Option<Result<Scanned, ScanFault>> {
        self.finished = true;
        Some(Err(ScanFault {
            kind,
            offset,
            line: line_at(self.text, offset),
        }))
    }
}

impl Iterator for TokenScanner<'_> {
    type Item = Result<Scanned, ScanFault>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(second) = self.pending.take() {
            return Some(Ok(second));
        }

        let Some((offset, ch)) = self.chars.next() else {
            self.finished = true;
            if self.in_wildcard {
                return self.fault(FaultKind::MalformedWildcard, self.open_at);
            }
            return None;
        };

        match ch {
            '_' if matches!(self.chars.peek(), Some((_, '_'))) => {
                self.chars.next();
                self.in_wildcard = !self.in_wildcard;
                if self.in_wildcard {
                    self.open_at = offset;
                }
                let half = Scanned {
                    ch: '_',
                    kind: CharKind::Delimiter,
                    protected: true,
                };
                self.pending = Some(half);
                Some(Ok(half))
            }
            '(' => {
                self.paren_depth += 1;
                Some(Ok(Scanned {
                    ch,
                    kind: CharKind::OpenParen,
                    protected: true,
                }))
            }
            ')' => {
                if self.paren_depth == 0 {
                    return self.fault(FaultKind::ParenUnderflow, offset);
                }
                self.paren_depth -= 1;
                Some(Ok(Scanned {
                    ch,
                    kind: CharKind::CloseParen,
                    protected: true,
                }))
            }
            _ => Some(Ok(Scanned {
                ch,
                kind: CharKind::Text,
                protected: self.protected(),
            })),
        }
    }
}

/// Scan the whole text, failing on the first fault.
pub fn scan(text: &str) -> Result<Vec<Scanned>, ScanFault> {
    TokenScanner::new(text).collect()
}

/// 1-based line of a byte offset.
pub fn line_at(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}
