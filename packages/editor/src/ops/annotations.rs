//! Marker and effect edits.
//!
//! `item_index` of `None` targets the track itself; otherwise the item at
//! that position. Transitions carry neither list.

use super::{check_range, edit_track, item_mut, out_of_range};
use crate::mutations::{Collection, MutationError};
use splice_timeline::{Effect, Marker, Timeline, Track};

fn markers_of(
    track: &mut Track,
    item_index: Option<usize>,
) -> Result<&mut Vec<Marker>, MutationError> {
    let Some(index) = item_index else {
        return Ok(&mut track.markers);
    };

    let item = item_mut(track, index)?;
    let schema = item.schema_name();
    item.markers_mut().ok_or_else(|| unsupported(schema, "markers"))
}

fn effects_of(
    track: &mut Track,
    item_index: Option<usize>,
) -> Result<&mut Vec<Effect>, MutationError> {
    let Some(index) = item_index else {
        return Ok(&mut track.effects);
    };

    let item = item_mut(track, index)?;
    let schema = item.schema_name();
    item.effects_mut().ok_or_else(|| unsupported(schema, "effects"))
}

fn unsupported(schema: &str, field: &str) -> MutationError {
    MutationError::UnsupportedField {
        schema: schema.to_string(),
        field: field.to_string(),
    }
}

pub fn add_marker(
    doc: &Timeline,
    track_index: usize,
    item_index: Option<usize>,
    marker: &Marker,
) -> Result<Timeline, MutationError> {
    check_range(&marker.marked_range)?;

    edit_track(doc, track_index, |track| {
        markers_of(track, item_index)?.push(marker.clone());
        Ok(())
    })
}

pub fn remove_marker(
    doc: &Timeline,
    track_index: usize,
    item_index: Option<usize>,
    marker_index: usize,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        let markers = markers_of(track, item_index)?;
        if marker_index >= markers.len() {
            return Err(out_of_range(Collection::Marker, marker_index, markers.len()));
        }
        markers.remove(marker_index);
        Ok(())
    })
}

pub fn add_effect(
    doc: &Timeline,
    track_index: usize,
    item_index: Option<usize>,
    effect: &Effect,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        effects_of(track, item_index)?.push(effect.clone());
        Ok(())
    })
}

pub fn remove_effect(
    doc: &Timeline,
    track_index: usize,
    item_index: Option<usize>,
    effect_index: usize,
) -> Result<Timeline, MutationError> {
    edit_track(doc, track_index, |track| {
        let effects = effects_of(track, item_index)?;
        if effect_index >= effects.len() {
            return Err(out_of_range(Collection::Effect, effect_index, effects.len()));
        }
        effects.remove(effect_index);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{clips::add_clip, transitions::add_transition};
    use splice_timeline::{Composable, MarkerColor, Metadata, TimeRange, TrackItem};

    fn clip_transition_clip() -> Timeline {
        let doc = Timeline::new("t", 24.0);
        let range = TimeRange::from_frames(0.0, 48.0, 24.0);
        let doc = add_clip(&doc, 0, "a", range, None, None).unwrap();
        let doc = add_clip(&doc, 0, "b", range, None, None).unwrap();
        add_transition(&doc, 0, 1, "SMPTE_Dissolve", None, None).unwrap()
    }

    fn track(doc: &Timeline) -> &Track {
        match &doc.tracks.children[0] {
            Composable::Track(track) => track,
            Composable::Stack(_) => panic!("Expected track"),
        }
    }

    fn marker() -> Marker {
        Marker::new("beat", TimeRange::from_frames(4.0, 0.0, 24.0), MarkerColor::Yellow)
    }

    fn blur() -> Effect {
        Effect::Generic {
            name: "soft".into(),
            effect_name: "Blur".into(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_marker_on_clip_and_track() {
        let doc = clip_transition_clip();
        let doc = add_marker(&doc, 0, Some(0), &marker()).unwrap();
        let doc = add_marker(&doc, 0, None, &marker()).unwrap();

        assert_eq!(track(&doc).markers.len(), 1);
        assert_eq!(track(&doc).children[0].markers().map(Vec::len), Some(1));

        let doc = remove_marker(&doc, 0, Some(0), 0).unwrap();
        assert_eq!(track(&doc).children[0].markers().map(Vec::len), Some(0));
    }

    #[test]
    fn test_marker_range_needs_a_positive_rate() {
        let doc = clip_transition_clip();
        let bad = Marker::new("beat", TimeRange::from_frames(4.0, 1.0, -1.0), MarkerColor::Red);
        assert_eq!(
            add_marker(&doc, 0, Some(0), &bad).unwrap_err(),
            MutationError::InvalidTime { value: 4.0, rate: -1.0 }
        );
        assert_eq!(track(&doc).children[0].markers().map(Vec::len), Some(0));
    }

    #[test]
    fn test_transition_has_no_markers_or_effects() {
        let doc = clip_transition_clip();
        assert_eq!(
            add_marker(&doc, 0, Some(1), &marker()).unwrap_err(),
            MutationError::UnsupportedField {
                schema: "Transition".into(),
                field: "markers".into()
            }
        );
        assert_eq!(
            add_effect(&doc, 0, Some(1), &blur()).unwrap_err(),
            MutationError::UnsupportedField {
                schema: "Transition".into(),
                field: "effects".into()
            }
        );
    }

    #[test]
    fn test_remove_missing_annotation() {
        let doc = clip_transition_clip();
        assert_eq!(
            remove_marker(&doc, 0, Some(2), 0).unwrap_err(),
            MutationError::IndexOutOfRange {
                collection: Collection::Marker,
                index: 0,
                len: 0
            }
        );
        assert_eq!(
            remove_effect(&doc, 0, None, 3).unwrap_err(),
            MutationError::IndexOutOfRange {
                collection: Collection::Effect,
                index: 3,
                len: 0
            }
        );
    }

    #[test]
    fn test_effects_keep_order() {
        let doc = clip_transition_clip();
        let freeze = Effect::FreezeFrame {
            name: String::new(),
            metadata: Metadata::new(),
        };
        let doc = add_effect(&doc, 0, Some(2), &blur()).unwrap();
        let doc = add_effect(&doc, 0, Some(2), &freeze).unwrap();

        let TrackItem::Clip(clip) = &track(&doc).children[2] else {
            panic!("Expected clip");
        };
        let names: Vec<&str> = clip.effects.iter().map(Effect::effect_name).collect();
        assert_eq!(names, vec!["Blur", "FreezeFrame"]);

        let doc = remove_effect(&doc, 0, Some(2), 0).unwrap();
        let TrackItem::Clip(clip) = &track(&doc).children[2] else {
            panic!("Expected clip");
        };
        assert_eq!(clip.effects, vec![freeze]);
    }
}
