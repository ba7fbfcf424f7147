//! Scope stack
//!
//!     The scanner's only cross-line state. The bottom frame stands for the grammar itself and
//!     is never popped; every other frame is a region whose begin pattern matched and whose end
//!     pattern has not matched yet. A stack returned in [ScanOutput](super::ScanOutput) can be
//!     handed back to a later scan to resume exactly where the previous one stopped.

use crate::grammar::{Pattern, Repository, RuleId};
use std::sync::Arc;

/// One live region.
#[derive(Debug, Clone)]
pub struct Frame {
    pub rule: RuleId,
    /// Scopes from the rule's `name`; these also cover the delimiters.
    pub name_scopes: Vec<String>,
    /// Scopes from `contentName`; these cover only what lies between the delimiters.
    pub content_scopes: Vec<String>,
    /// The end pattern with begin backreferences already substituted. `None` for the bottom
    /// frame, which only ends with the buffer.
    pub end: Option<Arc<Pattern>>,
    /// Offset of the begin match in the buffer of the scan that opened the frame.
    pub start: usize,
    /// Whether the begin match consumed the end of its line.
    pub begin_captured_eol: bool,
    /// The `\G` anchor in effect before this frame was pushed, restored when it pops.
    pub(crate) parent_anchor: Option<usize>,
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule
            && self.name_scopes == other.name_scopes
            && self.content_scopes == other.content_scopes
            && self.end.as_ref().map(|p| p.source()) == other.end.as_ref().map(|p| p.source())
            && self.start == other.start
            && self.begin_captured_eol == other.begin_captured_eol
            && self.parent_anchor == other.parent_anchor
    }
}

impl Frame {
    /// The bottom frame for a rule list, scoped with `scopes`.
    pub fn bottom(rule: RuleId, scopes: Vec<String>) -> Self {
        Self {
            rule,
            name_scopes: scopes,
            content_scopes: Vec::new(),
            end: None,
            start: 0,
            begin_captured_eol: false,
            parent_anchor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    /// A fresh stack for a full scan of a buffer.
    pub fn new(repository: &Repository) -> Self {
        let root = repository.rule(repository.root());
        Self::with_bottom(Frame::bottom(root.id, root.scopes.clone()))
    }

    pub(crate) fn with_bottom(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
        }
    }

    pub fn top(&self) -> &Frame {
        // The bottom frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames, the bottom frame included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True when no region is open.
    pub fn is_bottom(&self) -> bool {
        self.frames.len() == 1
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the top region. The bottom frame stays put.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.is_bottom() {
            None
        } else {
            self.frames.pop()
        }
    }

    /// The full scope path for text inside the top frame.
    pub fn scopes(&self) -> Vec<String> {
        self.frames
            .iter()
            .flat_map(|f| f.name_scopes.iter().chain(&f.content_scopes))
            .cloned()
            .collect()
    }

    /// The scope path for the top frame's own delimiters: its content scopes excluded.
    pub fn delimiter_scopes(&self) -> Vec<String> {
        let Some((top, below)) = self.frames.split_last() else {
            return Vec::new();
        };
        below
            .iter()
            .flat_map(|f| f.name_scopes.iter().chain(&f.content_scopes))
            .chain(&top.name_scopes)
            .cloned()
            .collect()
    }

    /// Regions still open, innermost last.
    pub fn open_regions(&self) -> &[Frame] {
        &self.frames[1..]
    }

    /// Regions opened at buffer offset `start`, innermost first. Stops at the first frame
    /// opened anywhere else.
    pub fn opened_at(&self, start: usize) -> impl Iterator<Item = &Frame> {
        self.open_regions()
            .iter()
            .rev()
            .take_while(move |frame| frame.start == start)
    }

    pub(crate) fn clear_anchors(&mut self) {
        for frame in &mut self.frames {
            frame.parent_anchor = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{RawGrammar, RawRule};

    fn frame(rule: RuleId, name: &str, content: &str) -> Frame {
        Frame {
            rule,
            name_scopes: vec![name.to_string()],
            content_scopes: vec![content.to_string()],
            end: Some(Arc::new(Pattern::new("x", 1000).unwrap())),
            start: 3,
            begin_captured_eol: false,
            parent_anchor: None,
        }
    }

    fn repository() -> Repository {
        let grammar = RawGrammar::new("source.t").pattern(RawRule::matching("a"));
        Repository::new(&grammar, 1000).unwrap()
    }

    #[test]
    fn test_bottom_frame_is_never_popped() {
        let repository = repository();
        let mut stack = ScopeStack::new(&repository);
        assert!(stack.is_bottom());
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.scopes(), vec!["source.t"]);
    }

    #[test]
    fn test_scopes_and_delimiter_scopes() {
        let repository = repository();
        let mut stack = ScopeStack::new(&repository);
        stack.push(frame(repository.root(), "string", "string.content"));

        assert_eq!(stack.scopes(), vec!["source.t", "string", "string.content"]);
        assert_eq!(stack.delimiter_scopes(), vec!["source.t", "string"]);
        assert_eq!(stack.open_regions().len(), 1);

        let popped = stack.pop().unwrap();
        assert_eq!(popped.start, 3);
        assert!(stack.is_bottom());
    }

    #[test]
    fn test_opened_at_walks_only_the_top_run() {
        let repository = repository();
        let mut stack = ScopeStack::new(&repository);
        let mut early = frame(repository.root(), "early", "c");
        early.start = 5;
        stack.push(early.clone());
        stack.push(frame(repository.root(), "outer", "c"));
        stack.push(early);

        let names: Vec<_> = stack.opened_at(5).map(|f| f.name_scopes[0].as_str()).collect();
        assert_eq!(names, vec!["early"]);
        assert_eq!(stack.opened_at(0).count(), 0);
    }

    #[test]
    fn test_frames_compare_by_end_source() {
        let repository = repository();
        let a = frame(repository.root(), "s", "c");
        let mut b = a.clone();
        b.end = Some(Arc::new(Pattern::new("x", 1000).unwrap()));
        assert_eq!(a, b);
        b.end = Some(Arc::new(Pattern::new("y", 1000).unwrap()));
        assert_ne!(a, b);
    }
}
