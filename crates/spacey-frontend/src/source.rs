//! Source buffers, source ranges and the diagnostic sink.
//!
//! Every AST node carries a [`SourceRange`] naming the buffer it came from,
//! so diagnostics and lazily compiled functions can always find their way
//! back to the original text.

use std::fmt;
use std::sync::Arc;

/// Identifies a source buffer registered with a [`SourceManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u32);

impl BufferId {
    /// Returns the raw index of this buffer.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A byte range inside one source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    /// The buffer holding the text
    pub buffer: BufferId,
    /// Start byte offset (inclusive)
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
}

impl SourceRange {
    /// Creates a new range.
    pub fn new(buffer: BufferId, start: usize, end: usize) -> Self {
        Self {
            buffer,
            start: start as u32,
            end: end as u32,
        }
    }

    /// Creates a range covering both `self` and `other`.
    pub fn to(self, other: SourceRange) -> Self {
        Self {
            buffer: self.buffer,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the length of the range in bytes.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Returns true if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A registered source buffer.
#[derive(Debug)]
struct SourceBuffer {
    name: String,
    text: Arc<str>,
    line_starts: Vec<u32>,
}

/// Owns every source buffer seen by a frontend.
#[derive(Debug, Default)]
pub struct SourceManager {
    buffers: Vec<SourceBuffer>,
}

impl SourceManager {
    /// Creates an empty source manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a buffer and returns its id.
    pub fn add_buffer(&mut self, name: impl Into<String>, text: impl Into<Arc<str>>) -> BufferId {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(offset, _)| offset as u32 + 1),
        );

        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(SourceBuffer {
            name: name.into(),
            text,
            line_starts,
        });
        id
    }

    /// Returns the full text of a buffer.
    pub fn text(&self, buffer: BufferId) -> &str {
        &self.buffers[buffer.index()].text
    }

    /// Returns a shared handle to the text of a buffer.
    pub fn shared_text(&self, buffer: BufferId) -> Arc<str> {
        Arc::clone(&self.buffers[buffer.index()].text)
    }

    /// Returns the name a buffer was registered under.
    pub fn name(&self, buffer: BufferId) -> &str {
        &self.buffers[buffer.index()].name
    }

    /// Returns the text covered by a range.
    pub fn slice(&self, range: SourceRange) -> &str {
        &self.text(range.buffer)[range.start as usize..range.end as usize]
    }

    /// Returns the 1-based line and column of the start of a range.
    pub fn line_col(&self, range: SourceRange) -> (usize, usize) {
        let buffer = &self.buffers[range.buffer.index()];
        let line = match buffer.line_starts.binary_search(&range.start) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = buffer.line_starts[line] as usize;
        let column = buffer.text[line_start..range.start as usize].chars().count();
        (line + 1, column + 1)
    }

    /// Returns the number of registered buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if no buffer has been registered.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A hard error; compilation fails
    Error,
    /// Extra context attached to the preceding error
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A single message reported against a source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error or note
    pub severity: Severity,
    /// Where the problem is
    pub range: SourceRange,
    /// Human readable message
    pub message: String,
}

/// Collects diagnostics and counts errors.
///
/// Once `max_errors` errors have been recorded, further errors (and the
/// notes that would follow them) are counted but not stored.
#[derive(Debug)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    error_count: usize,
    max_errors: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl Diagnostics {
    /// Creates a sink that stores at most `max_errors` errors.
    pub fn new(max_errors: usize) -> Self {
        Self {
            items: Vec::new(),
            error_count: 0,
            max_errors,
        }
    }

    /// Reports an error.
    pub fn error(&mut self, range: SourceRange, message: impl Into<String>) {
        self.error_count += 1;
        if self.error_count <= self.max_errors {
            self.items.push(Diagnostic {
                severity: Severity::Error,
                range,
                message: message.into(),
            });
        }
    }

    /// Attaches a note to the most recent error.
    pub fn note(&mut self, range: SourceRange, message: impl Into<String>) {
        if self.error_count <= self.max_errors {
            self.items.push(Diagnostic {
                severity: Severity::Note,
                range,
                message: message.into(),
            });
        }
    }

    /// Returns the number of errors reported so far, stored or not.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Returns the stored diagnostics in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Returns stored diagnostics reported after the first `skip` items.
    pub fn since(&self, skip: usize) -> &[Diagnostic] {
        &self.items[skip.min(self.items.len())..]
    }

    /// Returns the number of stored diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every stored diagnostic and resets the error count.
    pub fn clear(&mut self) {
        self.items.clear();
        self.error_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let mut sources = SourceManager::new();
        let id = sources.add_buffer("a.js", "var a;\nvar bb;\n  x");
        assert_eq!(sources.line_col(SourceRange::new(id, 0, 1)), (1, 1));
        assert_eq!(sources.line_col(SourceRange::new(id, 11, 13)), (2, 5));
        assert_eq!(sources.line_col(SourceRange::new(id, 17, 18)), (3, 3));
        assert_eq!(sources.slice(SourceRange::new(id, 11, 13)), "bb");
    }

    #[test]
    fn test_error_limit() {
        let mut sources = SourceManager::new();
        let id = sources.add_buffer("a.js", "x");
        let range = SourceRange::new(id, 0, 1);

        let mut diags = Diagnostics::new(1);
        diags.error(range, "first");
        diags.note(range, "context");
        diags.error(range, "second");
        diags.note(range, "dropped");

        assert_eq!(diags.error_count(), 2);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.iter().last().map(|d| d.severity), Some(Severity::Note));
    }
}
