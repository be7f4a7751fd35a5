use super::{edit_track, item_ref, schema_mismatch};
use crate::mutations::MutationError;
use splice_timeline::{Composable, Stack, Timeline, Track, TrackItem};

/// Wrap items `[start, end)` in a new Stack holding one inner Track of the
/// same kind, placed where the slice was.
pub fn nest_items(
    doc: &Timeline,
    track_index: usize,
    start: usize,
    end: usize,
    name: &str,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        let len = track.children.len();
        if start >= end || end > len {
            return Err(MutationError::InvalidNestRange { start, end, len });
        }

        let moved = track.children.drain(start..end).collect();
        let inner = Track::new(name, track.kind).with_children(moved);
        let mut stack = Stack::new(name);
        stack.children.push(Composable::Track(inner));

        track.children.insert(start, TrackItem::Stack(stack));
        Ok(())
    })
}

/// Replace a nested Stack with its contents.
///
/// Only the Stack's first child is considered. A Track contributes its
/// items in place of the Stack; a Stack is inlined as a single item. Any
/// further children are discarded. An empty Stack is simply removed.
pub fn flatten_stack(
    doc: &Timeline,
    track_index: usize,
    stack_index: usize,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        let stack = match item_ref(track, stack_index)? {
            TrackItem::Stack(stack) => stack,
            other => return Err(schema_mismatch(stack_index, "Stack", other.schema_name())),
        };

        if stack.children.len() > 1 {
            tracing::debug!(
                stack = %stack.name,
                dropped = stack.children.len() - 1,
                "flattening keeps only the first child"
            );
        }

        let replacement: Vec<TrackItem> = match stack.children.first() {
            Some(Composable::Track(inner)) => inner.children.clone(),
            Some(Composable::Stack(nested)) => vec![TrackItem::Stack(nested.clone())],
            None => Vec::new(),
        };

        track.children.splice(stack_index..=stack_index, replacement);
        Ok(())
    })
}
