use crate::position::{LineIndex, PositionMap, Slot};
use crate::{MatchError, MatchErrorKind};

/// Whether quoted text takes part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Quotes are ordinary characters.
    Plain,
    /// `'...'` and `"..."` are string literals; every character inside them,
    /// quotes included, is marked `Quoted` and never matched.
    StringAware,
}

/// Single-pass bracket scanner.
///
/// Keeps one stack of open-bracket indices:
/// - `(` `[` `{` push, except directly inside a `<` where they are ignored
///   (unparsed type-argument syntax need not balance) and `{` directly inside `[`
///   which is rejected
/// - `<` pushes only at a block boundary (empty stack or `{` on top), so a
///   less-than inside an expression is never taken for an opener
/// - `>` pops a `<`; on top of `(` or `[` it is a comparison and is skipped
/// - `)` `]` `}` must meet their own opener, so one inside a `<` is an error
pub struct BracketScanner<'a> {
    chars: &'a [char],
    mode: ScanMode,
    slots: Vec<Slot>,
    stack: Vec<usize>,
    quote: Option<char>,
}

impl<'a> BracketScanner<'a> {
    pub fn new(chars: &'a [char], mode: ScanMode) -> Self {
        Self {
            chars,
            mode,
            slots: Vec::with_capacity(chars.len()),
            stack: Vec::new(),
            quote: None,
        }
    }

    /// Run the scan to completion.
    pub fn scan(mut self) -> Result<PositionMap, MatchError> {
        for (index, &ch) in self.chars.iter().enumerate() {
            if let Err(kind) = self.step(index, ch) {
                return Err(self.error(kind, index));
            }
        }

        if let Some(&open) = self.stack.last() {
            return Err(self.error(MatchErrorKind::Unclosed(self.chars[open]), open));
        }

        Ok(PositionMap::new(self.slots))
    }

    fn step(&mut self, index: usize, ch: char) -> Result<(), MatchErrorKind> {
        if self.mode == ScanMode::StringAware {
            // A backslash does not escape the closing quote.
            if let Some(quote) = self.quote {
                self.slots.push(Slot::Quoted);
                if ch == quote {
                    self.quote = None;
                }
                return Ok(());
            }
            if ch == '\'' || ch == '"' {
                self.quote = Some(ch);
                self.slots.push(Slot::Quoted);
                return Ok(());
            }
        }

        self.slots.push(Slot::Plain);

        match ch {
            '(' | '[' | '{' => match self.top() {
                Some('[') if ch == '{' => return Err(MatchErrorKind::BraceInIndexer),
                Some('<') => {}
                _ => self.stack.push(index),
            },
            '<' => {
                if matches!(self.top(), None | Some('{')) {
                    self.stack.push(index);
                }
            }
            '>' => match self.top() {
                Some('<') => self.pop_pair(index),
                Some('{') => {
                    return Err(MatchErrorKind::Mismatched {
                        open: '{',
                        close: '>',
                    })
                }
                Some(_) => {}
                None => return Err(MatchErrorKind::UnexpectedClose('>')),
            },
            ')' | ']' | '}' => match self.top() {
                Some(open) if open == opener_of(ch) => self.pop_pair(index),
                Some(open) => return Err(MatchErrorKind::Mismatched { open, close: ch }),
                None => return Err(MatchErrorKind::UnexpectedClose(ch)),
            },
            _ => {}
        }

        Ok(())
    }

    fn top(&self) -> Option<char> {
        self.stack.last().map(|&open| self.chars[open])
    }

    fn pop_pair(&mut self, close: usize) {
        if let Some(open) = self.stack.pop() {
            self.slots[open] = Slot::Paired(close);
            self.slots[close] = Slot::Paired(open);
        }
    }

    fn error(&self, kind: MatchErrorKind, offset: usize) -> MatchError {
        let (line, column) = LineIndex::new(self.chars).locate(offset);
        let error = MatchError {
            kind,
            offset,
            line,
            column,
        };
        tracing::trace!(kind = %error.kind, offset, "bracket matching failed");
        error
    }
}

fn opener_of(close: char) -> char {
    match close {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

/// Match the brackets of `text`.
pub fn match_brackets(text: &str, mode: ScanMode) -> Result<PositionMap, MatchError> {
    let chars: Vec<char> = text.chars().collect();
    match_chars(&chars, mode)
}

/// Match the brackets of an already decoded character buffer.
pub fn match_chars(chars: &[char], mode: ScanMode) -> Result<PositionMap, MatchError> {
    BracketScanner::new(chars, mode).scan()
}
