//! Loading documents written by other OTIO-speaking tools

use splice_timeline::{
    collect_asset_ids, effective_rate, timeline_duration, track_duration, Composable, MarkerColor,
    Timeline, TrackItem, TrackKind,
};

const TWO_TRACK_EDIT: &str = r#"{
    "OTIO_SCHEMA": "Timeline.1",
    "name": "Two track edit",
    "global_start_time": { "OTIO_SCHEMA": "RationalTime.1", "value": 86400, "rate": 24 },
    "metadata": {},
    "tracks": {
        "OTIO_SCHEMA": "Stack.1",
        "name": "tracks",
        "children": [
            {
                "OTIO_SCHEMA": "Track.1",
                "name": "V1",
                "kind": "Video",
                "children": [
                    {
                        "OTIO_SCHEMA": "Clip.2",
                        "name": "interview",
                        "enabled": true,
                        "source_range": {
                            "OTIO_SCHEMA": "TimeRange.1",
                            "start_time": {
                                "OTIO_SCHEMA": "RationalTime.1", "value": 100, "rate": 25
                            },
                            "duration": {
                                "OTIO_SCHEMA": "RationalTime.1", "value": 250, "rate": 25
                            }
                        },
                        "media_reference": {
                            "OTIO_SCHEMA": "ExternalReference.1",
                            "asset_id": "asset-interview"
                        },
                        "markers": [
                            {
                                "OTIO_SCHEMA": "Marker.2",
                                "name": "laugh",
                                "color": "GREEN",
                                "marked_range": {
                                    "start_time": { "value": 120, "rate": 25 },
                                    "duration": { "value": 0, "rate": 25 }
                                }
                            }
                        ]
                    },
                    {
                        "OTIO_SCHEMA": "Transition.1",
                        "name": "",
                        "transition_type": "SMPTE_Dissolve",
                        "in_offset": { "value": 10, "rate": 25 },
                        "out_offset": { "value": 10, "rate": 25 }
                    },
                    {
                        "OTIO_SCHEMA": "Gap.1",
                        "source_range": {
                            "start_time": { "value": 0, "rate": 25 },
                            "duration": { "value": 50, "rate": 25 }
                        }
                    }
                ]
            },
            {
                "OTIO_SCHEMA": "Track.1",
                "name": "A1",
                "kind": "Audio",
                "children": [
                    {
                        "OTIO_SCHEMA": "Clip.2",
                        "name": "music",
                        "source_range": {
                            "start_time": { "value": 0, "rate": 25 },
                            "duration": { "value": 500, "rate": 25 }
                        },
                        "media_reference": {
                            "OTIO_SCHEMA": "GeneratorReference.1",
                            "generator_kind": "SolidTone",
                            "parameters": { "frequency": 440 }
                        }
                    }
                ]
            }
        ]
    }
}"#;

#[test]
fn test_load_two_track_edit() {
    let timeline = Timeline::from_json(TWO_TRACK_EDIT).unwrap();

    assert_eq!(timeline.name, "Two track edit");
    assert_eq!(timeline.tracks.children.len(), 2);

    let Composable::Track(video) = &timeline.tracks.children[0] else {
        panic!("Expected video track");
    };
    assert_eq!(video.kind, TrackKind::Video);
    assert_eq!(video.children.len(), 3);
    assert!(matches!(video.children[1], TrackItem::Transition(_)));

    let TrackItem::Clip(interview) = &video.children[0] else {
        panic!("Expected clip");
    };
    assert_eq!(interview.markers[0].color, MarkerColor::Green);

    // 250 + 50 frames; the dissolve adds nothing
    assert_eq!(track_duration(video).value, 300.0);
    assert_eq!(timeline_duration(&timeline).to_seconds(), 20.0);
}

#[test]
fn test_rate_discovered_from_items_when_metadata_is_empty() {
    let timeline = Timeline::from_json(TWO_TRACK_EDIT).unwrap();
    assert_eq!(effective_rate(&timeline), 25.0);
}

#[test]
fn test_generator_references_are_not_assets() {
    let timeline = Timeline::from_json(TWO_TRACK_EDIT).unwrap();
    assert_eq!(collect_asset_ids(&timeline), vec!["asset-interview"]);
}

#[test]
fn test_unknown_schema_tag_is_rejected() {
    let broken = TWO_TRACK_EDIT.replace("\"Gap.1\"", "\"Hole.1\"");
    assert!(Timeline::from_json(&broken).is_err());
}
