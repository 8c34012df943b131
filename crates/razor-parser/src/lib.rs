//! Razor template parser
//!
//! Parses a template that mixes HTML markup, literal text and Razor `@`
//! constructs into a document tree. Each node records whether its text is
//! markup, code or literal text, and nodes nest the way the constructs do.
//!
//! Also exposes a small extractor that pulls the `@` expressions out of a
//! single HTML tag.
//!
//! ```text
//! source → match_brackets() → PositionMap → TreeBuilder → Document
//! ```
//!
//! # Example
//!
//! ```
//! use razor_parser::{parse, NodeKind};
//!
//! let doc = parse("<a>hi</a>").unwrap();
//! assert_eq!(doc.nodes[0].kind, NodeKind::Html);
//! assert_eq!(doc.nodes[0].end.as_deref(), Some("</a>"));
//! ```

pub mod ast;
pub mod attribute;
pub mod parser;

pub use ast::{Document, Node, NodeKind};
pub use attribute::extract_attribute_expressions;
pub use parser::TreeBuilder;
pub use razor_matcher::{match_brackets, PositionMap, ScanMode, Slot, Span};

use razor_matcher::MatchError;

/// Default limit on how deeply constructs may nest.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Character offset the error was raised at.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ParseErrorKind::Syntax { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// Any grammar violation. The first one aborts the parse.
    #[error("syntax error: {message}")]
    Syntax { message: String },

    /// Nesting went deeper than `ParseOptions::max_depth`.
    #[error("nesting deeper than {limit} levels")]
    DepthLimit { limit: usize },
}

impl From<MatchError> for ParseError {
    fn from(e: MatchError) -> Self {
        ParseError {
            kind: ParseErrorKind::Syntax {
                message: e.kind.to_string(),
            },
            offset: e.offset,
            line: e.line,
            column: e.column,
        }
    }
}

/// Options for parsing templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum recursion depth of the tree builder.
    pub max_depth: usize,
    /// Accept an element whose closing tag is never found before end of input.
    pub allow_unclosed_elements: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_unclosed_elements: true,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reject elements left open at end of input.
    pub fn strict(mut self) -> Self {
        self.allow_unclosed_elements = false;
        self
    }
}

/// Parse a template into a document tree.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    parse_with_options(source, ParseOptions::default())
}

/// Parse a template with custom options.
pub fn parse_with_options(source: &str, options: ParseOptions) -> Result<Document, ParseError> {
    TreeBuilder::new(source, options)?.build()
}
