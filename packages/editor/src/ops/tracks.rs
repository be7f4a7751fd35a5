use super::{edit_track, out_of_range, track_ref};
use crate::mutations::{Collection, MutationError};
use splice_timeline::{Composable, Timeline, Track, TrackKind};

/// Insert a new empty track at `index`, or append when `index` is `None`.
/// Unnamed tracks are called `"<Kind> <n>"` after the new track count.
pub fn add_track(
    doc: &Timeline,
    name: Option<&str>,
    kind: TrackKind,
    index: Option<usize>,
) -> Result<Timeline, MutationError> {
    let len = doc.tracks.children.len();
    let at = match index {
        Some(i) if i > len => return Err(out_of_range(Collection::Track, i, len)),
        Some(i) => i,
        None => len,
    };

    let name = match name {
        Some(name) => name.to_string(),
        None => format!("{} {}", kind, len + 1),
    };

    let mut next = doc.clone();
    next.tracks.children.insert(at, Composable::Track(Track::new(name, kind)));
    Ok(next)
}

pub fn remove_track(doc: &Timeline, track_index: usize) -> Result<Timeline, MutationError> {
    track_ref(doc, track_index)?;

    let mut next = doc.clone();
    next.tracks.children.remove(track_index);
    Ok(next)
}

pub fn rename_track(
    doc: &Timeline,
    track_index: usize,
    name: &str,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        track.name = name.to_string();
        Ok(())
    })
}

/// Rearrange the root stack so that new position `i` holds old `order[i]`
pub fn reorder_tracks(doc: &Timeline, order: &[usize]) -> Result<Timeline, MutationError> {
    let len = doc.tracks.children.len();
    let invalid = || MutationError::InvalidPermutation {
        order: order.to_vec(),
        len,
    };

    if order.len() != len {
        return Err(invalid());
    }

    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return Err(invalid());
        }
        seen[i] = true;
    }

    let mut next = doc.clone();
    next.tracks.children = order.iter().map(|&i| doc.tracks.children[i].clone()).collect();
    Ok(next)
}

pub fn clear_track(doc: &Timeline, track_index: usize) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        track.children.clear();
        Ok(())
    })
}
