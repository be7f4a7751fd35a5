use super::{check_time, edit_track, expect_item, item_mut, schema_mismatch};
use crate::mutations::MutationError;
use splice_timeline::{effective_rate, RationalTime, Timeline, Track, TrackItem, Transition};

/// Insert a transition so that it sits between the items currently at
/// `position - 1` and `position`.
///
/// Offsets default to half a second, rounded to whole frames at the
/// document's rate.
pub fn add_transition(
    doc: &Timeline,
    track_index: usize,
    position: usize,
    transition_type: &str,
    in_offset: Option<RationalTime>,
    out_offset: Option<RationalTime>,
) -> Result<Timeline, MutationError> {
    check_offsets(in_offset.as_ref(), out_offset.as_ref())?;
    let rate = effective_rate(doc);
    let half = RationalTime::new((rate / 2.0).round(), rate);

    edit_track(doc, track_index, |track| {
        check_placement(track, position)?;

        let transition = Transition::new(
            transition_type,
            in_offset.unwrap_or(half),
            out_offset.unwrap_or(half),
        );
        track.children.insert(position, TrackItem::Transition(transition));
        Ok(())
    })
}

fn check_offsets(
    in_offset: Option<&RationalTime>,
    out_offset: Option<&RationalTime>,
) -> Result<(), MutationError> {
    in_offset.into_iter().chain(out_offset).try_for_each(check_time)
}

fn check_placement(track: &Track, position: usize) -> Result<(), MutationError> {
    let len = track.children.len();
    let reject = |reason: &str| {
        Err(MutationError::InvalidTransitionPlacement {
            position,
            reason: reason.to_string(),
        })
    };

    if position < 1 {
        return reject("a transition cannot open a track");
    }
    if position >= len {
        return reject("a transition cannot close a track");
    }
    if track.children[position - 1].is_transition() || track.children[position].is_transition() {
        return reject("neighbouring item is already a transition");
    }
    Ok(())
}

/// Update only the fields that are given
pub fn modify_transition(
    doc: &Timeline,
    track_index: usize,
    transition_index: usize,
    transition_type: Option<&str>,
    in_offset: Option<RationalTime>,
    out_offset: Option<RationalTime>,
) -> Result<Timeline, MutationError> {
    check_offsets(in_offset.as_ref(), out_offset.as_ref())?;

    edit_track(doc, track_index, |track| {
        let transition = match item_mut(track, transition_index)? {
            TrackItem::Transition(transition) => transition,
            other => {
                return Err(schema_mismatch(transition_index, "Transition", other.schema_name()));
            }
        };

        if let Some(transition_type) = transition_type {
            transition.transition_type = transition_type.to_string();
        }
        if let Some(in_offset) = in_offset {
            transition.in_offset = in_offset;
        }
        if let Some(out_offset) = out_offset {
            transition.out_offset = out_offset;
        }
        Ok(())
    })
}

pub fn remove_transition(
    doc: &Timeline,
    track_index: usize,
    transition_index: usize,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        expect_item(track, transition_index, "Transition")?;
        track.children.remove(transition_index);
        Ok(())
    })
}
