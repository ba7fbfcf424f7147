//! Capture resolver
//!
//!     Splits one match into tokens according to a capture map. Groups are visited in
//!     ascending order; since a group opens no later than the groups nested inside it, a
//!     stack of open groups is enough to nest scopes correctly. Text of the match outside
//!     every mapped group keeps the match's own scopes.
//!
//!     A capture with its own rule list is scanned again, restricted to the capture's text,
//!     with a bottom frame carrying the capture's scopes. Regions opened inside it close
//!     with the capture.

use super::state::{Frame, ScopeStack};
use super::token::TokenSink;
use super::{LineScan, Scanner};
use crate::grammar::{CaptureMap, Groups};

/// How deep captures may re-enter the scanner inside one another.
const MAX_REENTRY: usize = 16;

impl<'g> Scanner<'g> {
    /// Emit the tokens of one match, tagging groups on top of `scopes`.
    pub(crate) fn resolve_captures(
        &mut self,
        scan: &mut LineScan<'_>,
        groups: &Groups,
        captures: &CaptureMap,
        scopes: &[String],
    ) {
        let whole = groups.whole();
        let line = scan.line;
        let mut open: Vec<(usize, Vec<String>)> = Vec::new();

        for (&index, capture) in captures {
            let Some(span) = groups.get(index) else {
                continue;
            };
            if span.is_empty() || span.start < whole.start || span.start >= whole.end {
                continue;
            }
            if capture.scopes.is_empty() && capture.rule.is_none() {
                continue;
            }
            let end = span.end.min(whole.end);

            close(scan.sink, &mut open, span.start);
            let parent = open.last().map_or(scopes, |(_, scopes)| scopes.as_slice());
            scan.sink.produce(span.start, parent);
            let mut nested = parent.to_vec();
            nested.extend(capture.scopes.iter().cloned());

            match capture.rule {
                Some(rule) if scan.depth < MAX_REENTRY => {
                    let mut stack = ScopeStack::with_bottom(Frame::bottom(rule, nested));
                    let mut inner = LineScan {
                        line: &line[..end],
                        offset: scan.offset,
                        sink: &mut *scan.sink,
                        diagnostics: &mut *scan.diagnostics,
                        depth: scan.depth + 1,
                    };
                    self.scan_line(&mut inner, span.start, None, &mut stack);
                    if !stack.is_bottom() {
                        tracing::trace!(
                            open = stack.open_regions().len(),
                            "regions inside a capture closed with it"
                        );
                    }
                }
                _ => open.push((end, nested)),
            }
        }

        close(scan.sink, &mut open, usize::MAX);
        scan.sink.produce(whole.end, scopes);
    }
}

/// Emit every open group that ends at or before `position`.
fn close(sink: &mut TokenSink, open: &mut Vec<(usize, Vec<String>)>, position: usize) {
    while open.last().is_some_and(|(end, _)| *end <= position) {
        if let Some((end, scopes)) = open.pop() {
            sink.produce(end, &scopes);
        }
    }
}
