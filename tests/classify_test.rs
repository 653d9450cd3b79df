//! Response classifier tests
//!
//! Priority order of the unlock rules, magnet detection, and the
//! path-specific rules for streaming and delayed responses.

use downlink::api::{DelayedData, Envelope, StreamingData, UnlockData};
use downlink::resolve::classify::{classify, classify_streaming, delayed_snapshot};
use downlink::{DelayedPhase, DownloadResult, ResolutionOutcome, ServiceError, StreamingOutcome};

const MAGNET: &str = "magnet:?xt=urn:btih:ABC";
const HOSTED: &str = "https://1fichier.com/?abcdef";

fn unlock(json: &str) -> Envelope<UnlockData> {
    serde_json::from_str(json).unwrap()
}

// =============================================================================
// Error Priority
// =============================================================================

#[test]
fn test_error_status_wins_over_everything() {
    let response = unlock(
        r#"{
            "status": "error",
            "error": { "code": "LINK_HOST_NOT_SUPPORTED", "message": "This host is not supported" },
            "data": {
                "link": "https://x/f.mp4",
                "filesize": 100,
                "delayed": "42",
                "streams": [{ "id": "s1", "type": "video", "quality": "1080p", "filesize": 10 }]
            }
        }"#,
    );

    for input in [MAGNET, HOSTED] {
        assert_eq!(
            classify(&response, input),
            ResolutionOutcome::ServiceError(ServiceError::new("This host is not supported"))
        );
    }
}

// =============================================================================
// Instant Links and Magnets
// =============================================================================

#[test]
fn test_direct_url_with_size_is_instant() {
    let response = unlock(
        r#"{"status":"success","data":{"id":"9fa31","filename":"movie.mkv","filesize":734003200,"link":"https://x/movie.mkv"}}"#,
    );

    assert_eq!(
        classify(&response, HOSTED),
        ResolutionOutcome::InstantLink {
            id: Some("9fa31".into()),
            name: Some("movie.mkv".into()),
            size_bytes: Some(734003200),
            url: "https://x/movie.mkv".into(),
        }
    );
    // Nonzero size is instant even for magnets
    assert!(matches!(
        classify(&response, MAGNET),
        ResolutionOutcome::InstantLink { .. }
    ));
}

#[test]
fn test_zero_size_magnet_needs_upload() {
    let response = unlock(r#"{"status":"success","data":{"link":"https://x","filesize":0}}"#);

    assert_eq!(
        classify(&response, MAGNET),
        ResolutionOutcome::NeedsUpload {
            raw_link: MAGNET.into()
        }
    );
}

#[test]
fn test_zero_size_non_magnet_is_instant() {
    let response = unlock(r#"{"status":"success","data":{"link":"https://x","filesize":0}}"#);

    assert_eq!(
        classify(&response, HOSTED),
        ResolutionOutcome::InstantLink {
            id: None,
            name: None,
            size_bytes: Some(0),
            url: "https://x".into(),
        }
    );
}

#[test]
fn test_missing_size_is_not_zero() {
    let response = unlock(r#"{"status":"success","data":{"link":"https://x/f"}}"#);

    // No upload for a magnet whose size simply was not reported
    for input in [MAGNET, HOSTED] {
        assert_eq!(
            classify(&response, input),
            ResolutionOutcome::InstantLink {
                id: None,
                name: None,
                size_bytes: None,
                url: "https://x/f".into(),
            }
        );
    }
}

#[test]
fn test_url_wins_over_delayed_and_streams() {
    let response = unlock(
        r#"{"status":"success","data":{
            "id":"1","link":"https://x/f","filesize":5,"delayed":"42",
            "streams":[{"id":"s1","quality":"720p"}]
        }}"#,
    );
    assert!(matches!(
        classify(&response, HOSTED),
        ResolutionOutcome::InstantLink { .. }
    ));
}

// =============================================================================
// Delayed and Streams
// =============================================================================

#[test]
fn test_delayed_wins_over_streams() {
    let response = unlock(
        r#"{"status":"success","data":{"id":"1","delayed":42,"streams":[{"id":"s1"}]}}"#,
    );
    assert_eq!(
        classify(&response, HOSTED),
        ResolutionOutcome::Delayed { id: "42".into() }
    );
}

#[test]
fn test_numeric_zero_delayed_is_not_a_delayed_link() {
    let response = unlock(
        r#"{"status":"success","data":{"id":"9fa31","delayed":0,"streams":[{"id":"s1","quality":"720p"}]}}"#,
    );
    assert!(matches!(
        classify(&response, HOSTED),
        ResolutionOutcome::StreamList { .. }
    ));
}

#[test]
fn test_stream_list() {
    let response = unlock(
        r#"{"status":"success","data":{
            "id":"9fa31","filename":"Big Buck Bunny",
            "streams":[
                {"id":"s1","type":"video","quality":1080,"filesize":1073741824},
                {"id":"s2","type":"video","quality":720,"filesize":536870912}
            ]
        }}"#,
    );

    match classify(&response, "https://www.youtube.com/watch?v=aqz-KE-bpKQ") {
        ResolutionOutcome::StreamList { id, name, items } => {
            assert_eq!(id, "9fa31");
            assert_eq!(name.as_deref(), Some("Big Buck Bunny"));
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].stream_id, "s1");
            assert_eq!(items[0].kind.as_deref(), Some("video"));
            assert_eq!(items[0].quality.as_deref(), Some("1080"));
            assert_eq!(items[0].size_bytes, Some(1073741824));
        }
        other => panic!("Expected StreamList, got {:?}", other),
    }
}

#[test]
fn test_unrecognized_shape_not_supported() {
    let response = unlock(r#"{"status":"success","data":{"id":"1","filename":"x"}}"#);
    assert_eq!(
        classify(&response, HOSTED),
        ResolutionOutcome::ServiceError(ServiceError::new("Not supported"))
    );
}

// =============================================================================
// Streaming Responses
// =============================================================================

fn streaming(json: &str) -> Envelope<StreamingData> {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_streaming_link_is_download() {
    let response = streaming(r#"{"status":"success","data":{"link":"https://x/f.mp4"}}"#);
    assert_eq!(
        classify_streaming(&response, "9fa31"),
        StreamingOutcome::Download(DownloadResult {
            id: Some("9fa31".into()),
            url: Some("https://x/f.mp4".into()),
            ..Default::default()
        })
    );
}

#[test]
fn test_streaming_delayed_redirects() {
    let response = streaming(r#"{"status":"success","data":{"delayed":"42"}}"#);
    assert_eq!(
        classify_streaming(&response, "9fa31"),
        StreamingOutcome::Delayed { id: "42".into() }
    );
}

#[test]
fn test_streaming_error_short_circuits() {
    let response = streaming(
        r#"{"status":"error","error":{"message":"Stream not found"},"data":{"link":"https://x/f.mp4"}}"#,
    );
    assert_eq!(
        classify_streaming(&response, "9fa31"),
        StreamingOutcome::ServiceError(ServiceError::new("Stream not found"))
    );
}

// =============================================================================
// Delayed Status
// =============================================================================

fn delayed(json: &str) -> Envelope<DelayedData> {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_delayed_code_zero_normalizes_to_pending() {
    let status =
        delayed_snapshot("42", &delayed(r#"{"status":"success","data":{"status":0,"time_left":20}}"#))
            .unwrap();
    assert_eq!(status.phase, DelayedPhase::Pending);
    assert_eq!(status.phase, DelayedPhase::from_code(1, false));
}

#[test]
fn test_delayed_code_three_always_fatal() {
    for body in [
        r#"{"status":"success","data":{"status":3}}"#,
        r#"{"status":"success","data":{"status":3,"link":"https://x/f.mp4"}}"#,
    ] {
        let err = delayed_snapshot("42", &delayed(body)).unwrap_err();
        assert_eq!(err.message, "Could not generate download link");
    }
}

#[test]
fn test_delayed_ready_derives_name() {
    let status = delayed_snapshot(
        "42",
        &delayed(r#"{"status":"success","data":{"status":2,"time_left":0,"link":"https://x/dl/Big%20Buck%20Bunny.mp4"}}"#),
    )
    .unwrap();
    assert_eq!(status.phase, DelayedPhase::Ready);
    assert_eq!(status.name().as_deref(), Some("Big Buck Bunny.mp4"));
}
