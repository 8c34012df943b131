//! Razor bracket matcher
//!
//! Scans template source once, left to right, and pairs every tracked bracket
//! with its partner. `(` `[` `{` always nest; `<` `>` pair only where a type
//! argument list could start, so comparisons inside expressions are left alone.
//! In string-aware mode quoted text is masked out of the matching entirely.
//!
//! # Example
//!
//! ```
//! use razor_matcher::{match_brackets, ScanMode, Slot};
//!
//! let map = match_brackets("@if (a > b) { <p>x</p> }", ScanMode::StringAware).unwrap();
//! assert_eq!(map.partner(4), Some(10));
//! assert_eq!(map.slot(7), Slot::Plain); // `>` used as a comparison
//! ```

pub mod position;
pub mod scanner;

pub use position::{LineIndex, PositionMap, Slot, Span};
pub use scanner::{match_brackets, match_chars, BracketScanner, ScanMode};

/// Bracket matching error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Bracket error at line {line}, column {column}: {kind}")]
pub struct MatchError {
    pub kind: MatchErrorKind,
    /// Character offset of the offending bracket.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// What went wrong while pairing brackets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchErrorKind {
    /// A `{` opened directly inside an indexer `[`.
    #[error("`{{` cannot open inside `[`")]
    BraceInIndexer,

    /// A closer met an opener of a different shape.
    #[error("`{open}` closed by `{close}`")]
    Mismatched { open: char, close: char },

    /// A closer with nothing open.
    #[error("unexpected `{0}`")]
    UnexpectedClose(char),

    /// An opener still pending at end of input.
    #[error("unclosed `{0}`")]
    Unclosed(char),
}
