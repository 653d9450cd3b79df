//! Scripted in-memory resolution service for driver and resolver tests
//!
//! Replies are queued per endpoint; the last reply of a queue is repeated
//! forever so poll loops can be scripted with a final steady state. Every call
//! is recorded with its offset on the (usually paused) tokio clock.

#![allow(dead_code)]

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use downlink::api::{
    DelayedData, Envelope, StreamingData, TorrentStatusData, UnlockData, UploadData,
};
use downlink::{ResolutionService, TransportError};

pub const UNLOCK: &str = "unlock";
pub const UPLOAD: &str = "upload";
pub const TORRENT: &str = "torrent";
pub const STREAMING: &str = "streaming";
pub const DELAYED: &str = "delayed";

type Reply = (Duration, Result<serde_json::Value, TransportError>);

#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: &'static str,
    pub args: Vec<String>,
    /// Time since the service was created
    pub at: Duration,
}

pub struct ScriptedService {
    replies: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    start: Instant,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            start: Instant::now(),
        }
    }

    pub fn reply(self, endpoint: &'static str, json: &str) -> Self {
        self.reply_after(endpoint, Duration::ZERO, json)
    }

    /// Reply only after `delay` has passed on the tokio clock
    pub fn reply_after(self, endpoint: &'static str, delay: Duration, json: &str) -> Self {
        let value: serde_json::Value = serde_json::from_str(json).expect("fixture must be JSON");
        self.push(endpoint, (delay, Ok(value)))
    }

    pub fn fail(self, endpoint: &'static str, err: TransportError) -> Self {
        self.push(endpoint, (Duration::ZERO, Err(err)))
    }

    fn push(self, endpoint: &'static str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }

    /// Seconds (since creation) at which `endpoint` was called
    pub fn call_times(&self, endpoint: &str) -> Vec<u64> {
        self.calls_to(endpoint).iter().map(|c| c.at.as_secs()).collect()
    }

    /// Highest number of requests that were outstanding at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn respond<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        args: &[&str],
    ) -> Result<Envelope<T>, TransportError> {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            args: args.iter().map(|a| a.to_string()).collect(),
            at: self.start.elapsed(),
        });

        let (delay, reply) = {
            let mut replies = self.replies.lock().unwrap();
            let queue = replies
                .get_mut(endpoint)
                .unwrap_or_else(|| panic!("no reply scripted for {}", endpoint));
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let value = reply?;
        Ok(serde_json::from_value(value).expect("fixture must match the payload type"))
    }
}

#[async_trait]
impl ResolutionService for ScriptedService {
    async fn unlock(&self, link: &str) -> Result<Envelope<UnlockData>, TransportError> {
        self.respond(UNLOCK, &[link]).await
    }

    async fn upload_magnet(&self, link: &str) -> Result<Envelope<UploadData>, TransportError> {
        self.respond(UPLOAD, &[link]).await
    }

    async fn torrent_status(&self, id: &str) -> Result<Envelope<TorrentStatusData>, TransportError> {
        self.respond(TORRENT, &[id]).await
    }

    async fn streaming_link(
        &self,
        id: &str,
        stream_id: &str,
    ) -> Result<Envelope<StreamingData>, TransportError> {
        self.respond(STREAMING, &[id, stream_id]).await
    }

    async fn delayed_status(&self, id: &str) -> Result<Envelope<DelayedData>, TransportError> {
        self.respond(DELAYED, &[id]).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// `magnet/status` reply with the given status text and links
pub fn torrent_reply(status: &str, links: &[&str]) -> String {
    let links: Vec<serde_json::Value> = links
        .iter()
        .map(|l| serde_json::json!({ "link": l, "filename": "ubuntu.iso", "size": 4_000_000_000u64 }))
        .collect();
    serde_json::json!({
        "status": "success",
        "data": {
            "magnets": {
                "id": 7,
                "filename": "ubuntu.iso",
                "size": 4_000_000_000u64,
                "downloaded": 1_000_000_000u64,
                "status": status,
                "statusCode": if status == "Ready" { 4 } else { 1 },
                "links": links
            }
        }
    })
    .to_string()
}

/// `link/delayed` reply
pub fn delayed_reply(code: i64, time_left: u64, link: Option<&str>) -> String {
    serde_json::json!({
        "status": "success",
        "data": { "status": code, "time_left": time_left, "link": link }
    })
    .to_string()
}

pub fn error_reply(message: &str) -> String {
    serde_json::json!({
        "status": "error",
        "error": { "code": "GENERIC", "message": message }
    })
    .to_string()
}
