//! Document tree builder.
//!
//! Runs the string-aware bracket matcher once, then walks the source with a
//! single recursive function that builds one node of an expected kind,
//! appends it to its parent's children and returns the index of the last
//! character it consumed. Callers resume at that index plus one.
//!
//! Razor constructs are told apart by the character after `@`:
//!
//! ```text
//! @@            escaped at sign
//! @* ... *@     comment
//! @( ... )      expression
//! @{ ... }      code block, kept opaque
//! @if (c) {}    control block (if / else / for / foreach / while / do)
//! @a[i].b(...)  reference, optionally with a block argument
//! ```

use crate::ast::{Document, Node, NodeKind};
use crate::{ParseError, ParseErrorKind, ParseOptions};
use razor_matcher::{match_chars, LineIndex, PositionMap, ScanMode, Span};

/// Keywords that open a control block after `@`.
const CONTROL_KEYWORDS: &[&str] = &["if", "for", "foreach", "while", "do"];

/// Recursive-descent builder for one template.
pub struct TreeBuilder {
    chars: Vec<char>,
    map: PositionMap,
    lines: LineIndex,
    options: ParseOptions,
}

impl TreeBuilder {
    /// Decode `source` and match its brackets.
    pub fn new(source: &str, options: ParseOptions) -> Result<Self, ParseError> {
        let chars: Vec<char> = source.chars().collect();
        let map = match_chars(&chars, ScanMode::StringAware)?;
        let lines = LineIndex::new(&chars);
        Ok(Self {
            chars,
            map,
            lines,
            options,
        })
    }

    pub fn position_map(&self) -> &PositionMap {
        &self.map
    }

    /// Build the whole document.
    pub fn build(&self) -> Result<Document, ParseError> {
        let mut nodes = Vec::new();
        let mut index = 0;

        while index < self.chars.len() {
            let next = match self.chars[index] {
                c if c.is_whitespace() => index,
                '<' => self.consume(&mut nodes, index, NodeKind::Html, false, 0)?,
                '@' => self.consume(&mut nodes, index, NodeKind::Razor, false, 0)?,
                _ => self.consume(&mut nodes, index, NodeKind::Text, false, 0)?,
            };
            index = next + 1;
        }

        let doc = Document { nodes };
        tracing::debug!(
            chars = self.chars.len(),
            nodes = doc.node_count(),
            "parsed template"
        );
        Ok(doc)
    }

    /// Build one node of `kind` at `start` and append it to `siblings`.
    ///
    /// With `continuation` set the builder is already past any `@`: `start`
    /// is the first character of code inside a block, or a chained `else`.
    fn consume(
        &self,
        siblings: &mut Vec<Node>,
        start: usize,
        kind: NodeKind,
        continuation: bool,
        depth: usize,
    ) -> Result<usize, ParseError> {
        if depth >= self.options.max_depth {
            return Err(self.error(
                ParseErrorKind::DepthLimit {
                    limit: self.options.max_depth,
                },
                start,
            ));
        }

        let last = match kind {
            NodeKind::Html => self.consume_html(siblings, start, depth)?,
            NodeKind::Razor => self.consume_razor(siblings, start, continuation, depth)?,
            NodeKind::Text => self.consume_text(siblings, start),
        };
        tracing::trace!(%kind, start, last, "consumed node");
        Ok(last)
    }

    // =========================================================================
    // Html
    // =========================================================================

    fn consume_html(
        &self,
        siblings: &mut Vec<Node>,
        start: usize,
        depth: usize,
    ) -> Result<usize, ParseError> {
        let close = match self.map.partner(start) {
            Some(close) if self.chars[start] == '<' && self.chars[close] == '>' => close,
            _ => return Err(self.syntax(start, "unmatched `<`")),
        };

        if self.is_self_closing(start, close) || self.is_comment(start, close) {
            siblings.push(Node::leaf(
                NodeKind::Html,
                self.text(start, close + 1),
                self.span(start, close + 1),
            ));
            return Ok(close);
        }

        let name_end = (start + 1..close)
            .find(|&i| self.chars[i].is_whitespace())
            .unwrap_or(close);
        let name = self.text(start + 1, name_end);
        if !is_tag_name(&name) {
            return Err(self.syntax(start + 1, format!("invalid tag name `{name}`")));
        }

        let mut node = Node::leaf(NodeKind::Html, self.text(start, close + 1), Span::default());
        let mut last = close;
        let mut index = close + 1;

        while index < self.chars.len() {
            let next = match self.chars[index] {
                '<' if self.char_at(index + 1) == Some('/') => {
                    let closer = self.closing_tag(index, &name)?;
                    node.end = Some(self.text(index, closer + 1));
                    last = closer;
                    break;
                }
                '<' => self.consume(&mut node.children, index, NodeKind::Html, false, depth + 1)?,
                '@' => self.consume(&mut node.children, index, NodeKind::Razor, false, depth + 1)?,
                _ => self.consume(&mut node.children, index, NodeKind::Text, false, depth + 1)?,
            };
            last = next;
            index = next + 1;
        }

        if node.end.is_none() {
            if !self.options.allow_unclosed_elements {
                return Err(self.syntax(start, format!("unclosed element <{name}>")));
            }
            tracing::debug!(tag = %name, start, "element left open at end of input");
        }

        node.span = self.span(start, last + 1);
        siblings.push(node);
        Ok(last)
    }

    /// `<... />`
    fn is_self_closing(&self, start: usize, close: usize) -> bool {
        close > start + 1 && self.chars[close - 1] == '/'
    }

    /// `<!-- ... -->`
    fn is_comment(&self, start: usize, close: usize) -> bool {
        close > start + 5
            && self.text(start + 1, start + 4) == "!--"
            && self.text(close - 2, close) == "--"
    }

    /// Check the `</name>` at `index` against the open tag and return the
    /// index of its `>`.
    fn closing_tag(&self, index: usize, name: &str) -> Result<usize, ParseError> {
        let closer = match self.map.partner(index) {
            Some(closer) if self.chars[closer] == '>' => closer,
            _ => return Err(self.syntax(index, "unmatched closing tag")),
        };
        let found = self.text(index + 2, closer);
        if found != name {
            return Err(self.syntax(index, format!("expected </{name}>, found </{found}>")));
        }
        Ok(closer)
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Literal text up to the next paired `<`, the next `@`, or end of input.
    fn consume_text(&self, siblings: &mut Vec<Node>, start: usize) -> usize {
        let end = (start + 1..self.chars.len())
            .find(|&i| {
                self.chars[i] == '@' || (self.chars[i] == '<' && self.map.partner(i).is_some())
            })
            .unwrap_or(self.chars.len());

        siblings.push(Node::leaf(
            NodeKind::Text,
            self.text(start, end),
            self.span(start, end),
        ));
        end - 1
    }

    // =========================================================================
    // Razor
    // =========================================================================

    fn consume_razor(
        &self,
        siblings: &mut Vec<Node>,
        start: usize,
        continuation: bool,
        depth: usize,
    ) -> Result<usize, ParseError> {
        let from = if continuation {
            // a chained `@else` keeps its sigil inside the span
            if self.char_at(start) == Some('@') {
                start + 1
            } else {
                start
            }
        } else {
            match self.char_at(start + 1) {
                Some('@') => {
                    siblings.push(Node::leaf(
                        NodeKind::Razor,
                        "@@",
                        self.span(start, start + 2),
                    ));
                    return Ok(start + 1);
                }
                Some('*') => {
                    let close = self
                        .find_str("*@", start + 2)
                        .ok_or_else(|| self.syntax(start, "unterminated `@*` comment"))?;
                    siblings.push(Node::leaf(
                        NodeKind::Razor,
                        self.text(start, close + 2),
                        self.span(start, close + 2),
                    ));
                    return Ok(close + 1);
                }
                Some(_) => start + 1,
                None => return Err(self.syntax(start, "dangling `@` at end of input")),
            }
        };

        let lead = self.skip_whitespace(from);
        let Some(c) = self.char_at(lead) else {
            return Err(self.syntax(start, "expected code after `@`"));
        };

        match c {
            c if is_ident_start(c) => {
                let ident_end = self.scan_ident(lead);
                let word = self.text(lead, ident_end);
                if CONTROL_KEYWORDS.contains(&word.as_str()) || (continuation && word == "else") {
                    self.consume_control(siblings, start, lead, ident_end, &word, depth)
                } else {
                    self.consume_reference(siblings, start, lead, ident_end, depth)
                }
            }
            '(' | '{' => {
                let close = self.partner_of(lead)?;
                siblings.push(Node::leaf(
                    NodeKind::Razor,
                    self.text(lead, close + 1),
                    self.span(start, close + 1),
                ));
                Ok(close)
            }
            other if continuation => {
                Err(self.syntax(lead, format!("unexpected `{other}` in code block")))
            }
            other => Err(self.syntax(lead, format!("unexpected `{other}` after `@`"))),
        }
    }

    /// `if (...) { ... }` and friends. `begin` runs through the opening `{`,
    /// `end` from the closing `}` through any trailing `while (...)`.
    fn consume_control(
        &self,
        siblings: &mut Vec<Node>,
        start: usize,
        lead: usize,
        ident_end: usize,
        keyword: &str,
        depth: usize,
    ) -> Result<usize, ParseError> {
        let open = self
            .find_unquoted('{', ident_end, self.chars.len())
            .ok_or_else(|| self.syntax(lead, format!("`{keyword}` without a `{{` block")))?;
        let close = self.partner_of(open)?;

        let mut node = Node::leaf(NodeKind::Razor, self.text(lead, open + 1), Span::default());
        self.consume_block_body(&mut node.children, open + 1, close, depth)?;

        let last = if keyword == "do" {
            self.while_clause(close)?
        } else {
            close
        };
        node.end = Some(self.text(close, last + 1));
        node.span = self.span(start, last + 1);
        siblings.push(node);

        if keyword == "if" {
            self.consume_else_chain(siblings, last, depth)
        } else {
            Ok(last)
        }
    }

    /// Children of a `{ ... }` body ending at `until`. Markup is Html, an `@`
    /// starts an ordinary Razor construct and anything else is more code.
    fn consume_block_body(
        &self,
        children: &mut Vec<Node>,
        from: usize,
        until: usize,
        depth: usize,
    ) -> Result<(), ParseError> {
        let mut index = from;

        while index < until {
            let next = match self.chars[index] {
                c if c.is_whitespace() => index,
                '<' => self.consume(children, index, NodeKind::Html, false, depth + 1)?,
                '@' => self.consume(children, index, NodeKind::Razor, false, depth + 1)?,
                _ => self.consume(children, index, NodeKind::Razor, true, depth + 1)?,
            };
            if next >= until {
                return Err(self.syntax(index, "construct runs past the end of its block"));
            }
            index = next + 1;
        }

        Ok(())
    }

    /// `else` and `else if` clauses following an `if`, appended as siblings.
    fn consume_else_chain(
        &self,
        siblings: &mut Vec<Node>,
        mut last: usize,
        depth: usize,
    ) -> Result<usize, ParseError> {
        while let Some((start, at)) = self.following_else(last + 1) {
            let else_if = self.word_at(self.skip_whitespace(at + 4)) == "if";
            last = self.consume(siblings, start, NodeKind::Razor, true, depth)?;
            if !else_if {
                break;
            }
        }
        Ok(last)
    }

    /// A whole-word `else` separated from `from` only by whitespace and an
    /// optional `@`. Returns where the clause starts and where the word is.
    fn following_else(&self, from: usize) -> Option<(usize, usize)> {
        let start = self.skip_whitespace(from);
        let at = if self.char_at(start) == Some('@') {
            self.skip_whitespace(start + 1)
        } else {
            start
        };
        let is_else =
            self.text(at, at + 4) == "else" && !self.char_at(at + 4).is_some_and(is_ident_char);
        is_else.then_some((start, at))
    }

    /// The `while (...)` after a `do` body; returns the index of its `)`.
    fn while_clause(&self, close: usize) -> Result<usize, ParseError> {
        let missing = || self.syntax(close, "`do` block without a `while (...)` clause");
        let paren = self
            .find_unquoted('(', close + 1, self.chars.len())
            .ok_or_else(missing)?;
        if self.text(close + 1, paren).trim() != "while" {
            return Err(missing());
        }
        self.partner_of(paren)
    }

    /// `name`, `name[i]`, `name.member`, `name.method(...)`, and
    /// `name.method(..., { ... })` whose block is parsed like a control body.
    fn consume_reference(
        &self,
        siblings: &mut Vec<Node>,
        start: usize,
        lead: usize,
        ident_end: usize,
        depth: usize,
    ) -> Result<usize, ParseError> {
        let mut last = ident_end - 1;

        if self.char_at(last + 1) == Some('[') {
            last = self.partner_of(last + 1)?;
        }

        if self.char_at(last + 1) == Some('.') {
            last = self.scan_ident(last + 2) - 1;
            let call = self.skip_whitespace(last + 1);
            if self.char_at(call) == Some('(') {
                let call_close = self.partner_of(call)?;
                if let Some(open) = self.find_unquoted('{', call + 1, call_close) {
                    let close = self.partner_of(open)?;
                    let mut node =
                        Node::leaf(NodeKind::Razor, self.text(lead, open + 1), Span::default());
                    self.consume_block_body(&mut node.children, open + 1, close, depth)?;
                    node.end = Some(self.text(close, call_close + 1));
                    node.span = self.span(start, call_close + 1);
                    siblings.push(node);
                    return Ok(call_close);
                }
                last = call_close;
            }
        }

        siblings.push(Node::leaf(
            NodeKind::Razor,
            self.text(lead, last + 1),
            self.span(start, last + 1),
        ));
        Ok(last)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Characters `from..to`, clamped to the source.
    fn text(&self, from: usize, to: usize) -> String {
        let to = to.min(self.chars.len());
        let from = from.min(to);
        self.chars[from..to].iter().collect()
    }

    fn span(&self, start: usize, end: usize) -> Span {
        self.lines.span(start, end)
    }

    fn skip_whitespace(&self, from: usize) -> usize {
        (from..self.chars.len())
            .find(|&i| !self.chars[i].is_whitespace())
            .unwrap_or(self.chars.len().max(from))
    }

    /// End (exclusive) of the identifier starting at `from`.
    fn scan_ident(&self, from: usize) -> usize {
        (from..self.chars.len())
            .find(|&i| !is_ident_char(self.chars[i]))
            .unwrap_or(self.chars.len().max(from))
    }

    fn word_at(&self, from: usize) -> String {
        self.text(from, self.scan_ident(from))
    }

    fn find_unquoted(&self, target: char, from: usize, to: usize) -> Option<usize> {
        (from..to.min(self.chars.len()))
            .find(|&i| self.chars[i] == target && !self.map.is_quoted(i))
    }

    fn find_str(&self, needle: &str, from: usize) -> Option<usize> {
        let needle: Vec<char> = needle.chars().collect();
        (from..self.chars.len()).find(|&i| self.chars[i..].starts_with(&needle))
    }

    fn partner_of(&self, index: usize) -> Result<usize, ParseError> {
        self.map.partner(index).ok_or_else(|| {
            let c = self.char_at(index).unwrap_or(' ');
            self.syntax(index, format!("unmatched `{c}`"))
        })
    }

    fn syntax(&self, offset: usize, message: impl Into<String>) -> ParseError {
        self.error(
            ParseErrorKind::Syntax {
                message: message.into(),
            },
            offset,
        )
    }

    fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        let (line, column) = self.lines.locate(offset.min(self.chars.len()));
        ParseError {
            kind,
            offset,
            line,
            column,
        }
    }
}

fn is_tag_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphabetic() || c.is_whitespace())
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '$' || c == '_'
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '$' || c == '_'
}
