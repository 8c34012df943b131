/// A range of source text in character offsets, with the line and column of
/// its first character for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Classification of one source character after matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Not a tracked bracket, or a `<`/`>` used as an operator.
    Plain,
    /// Inside a string literal, quotes included.
    Quoted,
    /// A bracket paired with the character at this index.
    Paired(usize),
}

/// Per-character bracket pairing for a whole source text.
///
/// Built once per scan and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap {
    slots: Vec<Slot>,
}

impl PositionMap {
    pub(crate) fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at `index`; out-of-range indices read as `Plain`.
    pub fn slot(&self, index: usize) -> Slot {
        self.slots.get(index).copied().unwrap_or(Slot::Plain)
    }

    /// Index of the bracket paired with `index`, if any.
    pub fn partner(&self, index: usize) -> Option<usize> {
        match self.slot(index) {
            Slot::Paired(other) => Some(other),
            _ => None,
        }
    }

    pub fn is_quoted(&self, index: usize) -> bool {
        self.slot(index) == Slot::Quoted
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

/// Maps character offsets to 1-based line and column numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(chars: &[char]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            chars
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Line and column of the character at `offset`.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let column = offset - self.line_starts[line - 1] + 1;
        (line, column)
    }

    /// Span over `start..end` positioned at `start`.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.locate(start);
        Span::new(start, end, line, column)
    }
}
