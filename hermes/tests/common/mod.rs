#![allow(dead_code)]

use hermes::config::{EmptyReadPolicy, SessionSettings};
use hermes::source::{SampleBatch, SourceConnection, SourceError, StreamDescriptor, StreamSource};
use hermes::transport::{Transport, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Counters shared between a `ScriptedSource`, its connections and the test.
#[derive(Clone, Default)]
pub struct Probe {
    pulls: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    connects: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

/// Source whose reads come from a fixed script, then repeat `then` forever.
pub struct ScriptedSource {
    streams: Vec<String>,
    channels: Vec<String>,
    sample_rate: f64,
    reads: Vec<Option<SampleBatch>>,
    then: Option<SampleBatch>,
    refuse: bool,
    pub probe: Probe,
}

impl ScriptedSource {
    pub fn new(streams: &[&str]) -> Self {
        Self {
            streams: streams.iter().map(|s| s.to_string()).collect(),
            channels: names(&["C1", "C2", "C3"]),
            sample_rate: 100.0,
            reads: Vec::new(),
            then: None,
            refuse: false,
            probe: Probe::default(),
        }
    }

    pub fn with_channels(mut self, channels: &[&str]) -> Self {
        self.channels = names(channels);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_reads(mut self, reads: Vec<Option<SampleBatch>>) -> Self {
        self.reads = reads;
        self
    }

    pub fn then_repeat(mut self, batch: Option<SampleBatch>) -> Self {
        self.then = batch;
        self
    }

    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }
}

impl StreamSource for ScriptedSource {
    type Connection = ScriptedConnection;

    fn find_streams(&self) -> Vec<StreamDescriptor> {
        self.streams.iter().map(|s| StreamDescriptor::new(s.as_str())).collect()
    }

    fn connect(&self, stream_name: &str, _buffer_size: usize) -> Result<ScriptedConnection, SourceError> {
        self.probe.connects.lock().unwrap().push(stream_name.to_string());
        if self.refuse {
            return Err(SourceError::Unavailable(stream_name.to_string()));
        }
        Ok(ScriptedConnection {
            channels: self.channels.clone(),
            sample_rate: self.sample_rate,
            reads: self.reads.clone().into(),
            then: self.then.clone(),
            probe: self.probe.clone(),
        })
    }
}

pub struct ScriptedConnection {
    channels: Vec<String>,
    sample_rate: f64,
    reads: VecDeque<Option<SampleBatch>>,
    then: Option<SampleBatch>,
    probe: Probe,
}

impl SourceConnection for ScriptedConnection {
    fn channel_names(&self) -> &[String] {
        &self.channels
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn get_data(&mut self, _window_secs: f64, _picks: &[String]) -> Option<SampleBatch> {
        self.probe.pulls.fetch_add(1, Ordering::SeqCst);
        self.reads.pop_front().unwrap_or_else(|| self.then.clone())
    }

    fn disconnect(&mut self) {
        self.probe.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Server half of an in-memory connection.
pub struct ChannelTransport {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl Transport for ChannelTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.to_client.send(text).map_err(|_| TransportError::Closed)
    }

    async fn recv_text(&mut self) -> Result<String, TransportError> {
        self.from_client.recv().await.ok_or(TransportError::Closed)
    }

    async fn close(&mut self) {
        self.from_client.close();
    }
}

/// Client half of an in-memory connection. Dropping it closes the connection.
pub struct ClientEnd {
    from_server: mpsc::UnboundedReceiver<String>,
    to_server: mpsc::UnboundedSender<String>,
}

impl ClientEnd {
    pub fn send(&self, text: &str) {
        let _ = self.to_server.send(text.to_string());
    }

    /// Next message as JSON, `None` once the server side is gone.
    pub async fn next_json(&mut self) -> Option<serde_json::Value> {
        let text = self.from_server.recv().await?;
        Some(serde_json::from_str(&text).expect("server sent invalid JSON"))
    }

    /// Everything the server sends until it drops its side.
    pub async fn collect_all(&mut self) -> Vec<serde_json::Value> {
        let mut messages = Vec::new();
        while let Some(message) = self.next_json().await {
            messages.push(message);
        }
        messages
    }
}

pub fn channel_pair() -> (ChannelTransport, ClientEnd) {
    let (to_client, from_server) = mpsc::unbounded_channel();
    let (to_server, from_client) = mpsc::unbounded_channel();
    (
        ChannelTransport {
            to_client,
            from_client,
        },
        ClientEnd {
            from_server,
            to_server,
        },
    )
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `rows` samples of `width` channels, timestamps starting at `t0` and 250 ms apart.
pub fn batch(rows: usize, width: usize, t0: f64) -> SampleBatch {
    SampleBatch::new(
        (0..rows).map(|i| t0 + i as f64 * 0.25).collect(),
        (0..rows)
            .map(|i| (0..width).map(|c| (i * width + c) as f64).collect())
            .collect(),
    )
}

pub fn settings() -> SessionSettings {
    SessionSettings::default()
}

pub fn immediate_settings() -> SessionSettings {
    SessionSettings::default().with_empty_reads(EmptyReadPolicy::immediate())
}

pub fn backoff_settings(backoff: Duration, max_consecutive: Option<u32>) -> SessionSettings {
    SessionSettings::default().with_empty_reads(
        EmptyReadPolicy::immediate()
            .with_backoff(backoff)
            .with_max_consecutive(max_consecutive),
    )
}
