//! `@` expressions inside a single HTML tag.
//!
//! Independent of the tree builder: works on one tag's text and returns the
//! code of each expression in order. Recognized shapes:
//!
//! ```text
//! @@              -> "@"
//! @(expr)         -> "(expr)"
//! @name           -> "name"
//! @name[i]        -> "name[i]"
//! @name.member    -> "name.member"
//! @name.call(...) -> "name.call(...)"
//! ```

use crate::parser::{is_ident_char, is_ident_start};
use crate::{ParseError, ParseErrorKind};
use razor_matcher::{match_chars, LineIndex, PositionMap, ScanMode};

/// Extract every `@` expression from `tag`, which must look like `<...>`
/// and be at least five characters long.
pub fn extract_attribute_expressions(tag: &str) -> Result<Vec<String>, ParseError> {
    Extractor::new(tag)?.run()
}

struct Extractor {
    chars: Vec<char>,
    /// Matched over the tag's interior, so indices are shifted by one.
    inner: PositionMap,
    lines: LineIndex,
}

impl Extractor {
    fn new(tag: &str) -> Result<Self, ParseError> {
        let chars: Vec<char> = tag.chars().collect();
        let lines = LineIndex::new(&chars);

        let len = chars.len();
        if len < 5 || chars[0] != '<' || chars[len - 1] != '>' {
            let (line, column) = lines.locate(0);
            return Err(ParseError {
                kind: ParseErrorKind::Syntax {
                    message: "expected a complete `<...>` tag".into(),
                },
                offset: 0,
                line,
                column,
            });
        }

        let inner = match_chars(&chars[1..len - 1], ScanMode::Plain).map_err(|e| {
            let offset = e.offset + 1;
            let (line, column) = lines.locate(offset);
            ParseError {
                offset,
                line,
                column,
                ..ParseError::from(e)
            }
        })?;

        Ok(Self {
            chars,
            inner,
            lines,
        })
    }

    fn run(&self) -> Result<Vec<String>, ParseError> {
        let mut expressions = Vec::new();
        let mut index = 0;

        while let Some(at) = (index..self.chars.len()).find(|&i| self.chars[i] == '@') {
            if self.chars.get(at + 1) == Some(&'@') {
                expressions.push("@".to_string());
                index = at + 2;
                continue;
            }

            let lead = self.skip_whitespace(at + 1);
            let c = self.chars[lead];
            let last = if c == '(' {
                self.partner_of(lead)?
            } else if is_ident_start(c) {
                self.reference_end(lead)?
            } else {
                return Err(self.syntax(lead, format!("unexpected `{c}` after `@`")));
            };

            expressions.push(self.chars[lead..=last].iter().collect());
            index = last + 1;
        }

        Ok(expressions)
    }

    /// Last index of `name`, `name[i]`, `name.member` or `name.call(...)`.
    fn reference_end(&self, lead: usize) -> Result<usize, ParseError> {
        let mut last = self.scan_ident(lead) - 1;

        if self.chars.get(last + 1) == Some(&'[') {
            last = self.partner_of(last + 1)?;
        }

        if self.chars.get(last + 1) == Some(&'.') {
            last = self.scan_ident(last + 2) - 1;
            let call = self.skip_whitespace(last + 1);
            if self.chars.get(call) == Some(&'(') {
                last = self.partner_of(call)?;
            }
        }

        Ok(last)
    }

    /// First non-whitespace index at or after `from`. The closing `>` stops
    /// the scan, so the result is always in bounds.
    fn skip_whitespace(&self, from: usize) -> usize {
        (from..self.chars.len())
            .find(|&i| !self.chars[i].is_whitespace())
            .unwrap_or(self.chars.len() - 1)
    }

    fn scan_ident(&self, from: usize) -> usize {
        (from..self.chars.len())
            .find(|&i| !is_ident_char(self.chars[i]))
            .unwrap_or(self.chars.len())
    }

    fn partner_of(&self, index: usize) -> Result<usize, ParseError> {
        index
            .checked_sub(1)
            .and_then(|i| self.inner.partner(i))
            .map(|i| i + 1)
            .ok_or_else(|| self.syntax(index, format!("unmatched `{}`", self.chars[index])))
    }

    fn syntax(&self, offset: usize, message: String) -> ParseError {
        let (line, column) = self.lines.locate(offset);
        ParseError {
            kind: ParseErrorKind::Syntax { message },
            offset,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(tag: &str) -> Vec<String> {
        extract_attribute_expressions(tag).unwrap()
    }

    fn message(tag: &str) -> String {
        match extract_attribute_expressions(tag).unwrap_err().kind {
            ParseErrorKind::Syntax { message } => message,
            other => panic!("Expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_expressions() {
        assert!(extract("<a href=\"/x\">").is_empty());
    }

    #[test]
    fn test_simple_reference() {
        assert_eq!(extract("<a href=\"@url\">"), vec!["url"]);
    }

    #[test]
    fn test_parenthesized() {
        assert_eq!(extract("<a class=\"@(on ? 1 : 2)\">"), vec!["(on ? 1 : 2)"]);
    }

    #[test]
    fn test_indexer_member_and_call() {
        assert_eq!(
            extract("<img src=\"@imgs[i].Src\" alt=\"@item.Title(2)\">"),
            vec!["imgs[i].Src", "item.Title(2)"]
        );
    }

    #[test]
    fn test_escaped_at() {
        assert_eq!(extract("<a title=\"me@@x.org\">"), vec!["@"]);
    }

    #[test]
    fn test_whitespace_after_at() {
        assert_eq!(extract("<a b=\"@ name\">"), vec!["name"]);
    }

    #[test]
    fn test_single_member_hop() {
        assert_eq!(extract("<a b=\"@a.b.c\">"), vec!["a.b"]);
    }

    #[test]
    fn test_order_is_left_to_right() {
        assert_eq!(
            extract("<p id=\"@first\" class=\"@(second)\" data-x=\"@third\">"),
            vec!["first", "(second)", "third"]
        );
    }

    #[test]
    fn test_rejects_short_or_unbracketed_input() {
        assert_eq!(message("<a>"), "expected a complete `<...>` tag");
        assert_eq!(message("abcde"), "expected a complete `<...>` tag");
        assert_eq!(message("<abcd"), "expected a complete `<...>` tag");
    }

    #[test]
    fn test_rejects_bad_lead() {
        assert_eq!(message("<a b=\"@#\">"), "unexpected `#` after `@`");
        assert_eq!(message("<a b=@>"), "unexpected `>` after `@`");
    }

    #[test]
    fn test_unbalanced_expression() {
        let err = extract_attribute_expressions("<a b=\"@(x\">").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.offset, 7);
    }
}
