//! In-process EEG simulator implementing `StreamSource`.
//! Each connection synthesizes samples from elapsed time on the tokio clock into a ring buffer of `buffer_size` rows.

use super::{SampleBatch, SourceConnection, SourceError, StreamDescriptor, StreamSource};
use crate::constants::FALLBACK_INTERVAL_SECS;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::collections::VecDeque;
use std::f64::consts::PI;
use tokio::time::Instant;
use tracing::debug;

/// 10-20 system labels used by the default 8-channel stream.
const TEN_TWENTY_LABELS: [&str; 8] = ["Fp1", "Fp2", "C3", "C4", "P7", "P8", "O1", "O2"];

/// Standard deviation of the additive noise, in microvolts.
const NOISE_STD_UV: f64 = 2.0;

/// Catalogue entry for one simulated stream.
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct SimulatedStream {
    #[new(into)]
    name: String,
    channel_names: Vec<String>,
    sample_rate: f64,
}

/// Fixed catalogue of synthetic streams. Immutable after construction, so one instance serves every session.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    streams: Vec<SimulatedStream>,
    seed: u64,
}

impl SimulatedSource {
    pub fn new(streams: Vec<SimulatedStream>) -> Self {
        Self { streams, seed: 0x5EED }
    }

    /// An 8-channel 250 Hz stream and a 4-channel stream with no nominal rate.
    pub fn with_default_streams() -> Self {
        Self::new(vec![
            SimulatedStream::new(
                "SimulatedEEG",
                TEN_TWENTY_LABELS.iter().map(|s| s.to_string()).collect(),
                250.0,
            ),
            SimulatedStream::new(
                "SimulatedEEG-Irregular",
                (1..=4).map(|i| format!("Ch{}", i)).collect(),
                0.0,
            ),
        ])
    }

    /// Seed for the noise generator, so runs are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl StreamSource for SimulatedSource {
    type Connection = SimulatedConnection;

    fn find_streams(&self) -> Vec<StreamDescriptor> {
        self.streams
            .iter()
            .map(|s| StreamDescriptor::new(s.name.clone()))
            .collect()
    }

    fn connect(&self, stream_name: &str, buffer_size: usize) -> Result<SimulatedConnection, SourceError> {
        if buffer_size == 0 {
            return Err(SourceError::InvalidBufferSize(buffer_size));
        }
        let stream = self
            .streams
            .iter()
            .find(|s| s.name == stream_name)
            .ok_or_else(|| SourceError::UnknownStream(stream_name.to_string()))?;
        debug!(stream = %stream.name, buffer_size, "simulator connection opened");
        Ok(SimulatedConnection::new(stream, buffer_size, self.seed))
    }
}

/// Live connection to a simulated stream.
pub struct SimulatedConnection {
    channel_names: Vec<String>,
    sample_rate: f64,
    capacity: usize,
    buffer: VecDeque<(f64, Vec<f64>)>,
    started: Instant,
    produced: u64,
    rng: StdRng,
    connected: bool,
}

impl SimulatedConnection {
    fn new(stream: &SimulatedStream, capacity: usize, seed: u64) -> Self {
        Self {
            channel_names: stream.channel_names.clone(),
            sample_rate: stream.sample_rate,
            capacity,
            buffer: VecDeque::with_capacity(capacity),
            started: Instant::now(),
            produced: 0,
            rng: StdRng::seed_from_u64(seed),
            connected: true,
        }
    }

    /// Rate samples are generated at. Irregular streams tick once per fallback interval.
    fn generation_rate(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.sample_rate
        } else {
            1.0 / FALLBACK_INTERVAL_SECS
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    // Brings the ring buffer up to the current time. Samples older than the buffer are never generated.
    fn fill(&mut self) {
        let rate = self.generation_rate();
        let due = (self.started.elapsed().as_secs_f64() * rate).floor() as u64;
        if due <= self.produced {
            return;
        }
        if due - self.produced > self.capacity as u64 {
            self.buffer.clear();
            self.produced = due - self.capacity as u64;
        }
        while self.produced < due {
            let t = self.produced as f64 / rate;
            let row = (0..self.channel_names.len())
                .map(|ch| {
                    let phase = ch as f64 * 0.5;
                    // alpha (10 Hz) + beta (20 Hz) + noise
                    10.0 * (2.0 * PI * 10.0 * t + phase).sin()
                        + 5.0 * (2.0 * PI * 20.0 * t + 2.0 * phase).sin()
                        + NOISE_STD_UV * self.rng.sample::<f64, _>(StandardNormal)
                })
                .collect();
            self.buffer.push_back((t, row));
            if self.buffer.len() > self.capacity {
                self.buffer.pop_front();
            }
            self.produced += 1;
        }
    }

    fn pick_columns(&self, picks: &[String]) -> Option<Vec<usize>> {
        if picks.is_empty() {
            return Some((0..self.channel_names.len()).collect());
        }
        picks
            .iter()
            .map(|pick| self.channel_names.iter().position(|name| name == pick))
            .collect()
    }
}

impl SourceConnection for SimulatedConnection {
    fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn get_data(&mut self, window_secs: f64, picks: &[String]) -> Option<SampleBatch> {
        if !self.connected {
            return None;
        }
        let columns = self.pick_columns(picks)?;
        self.fill();

        let wanted = if self.sample_rate > 0.0 {
            (window_secs * self.sample_rate).round().max(0.0) as usize
        } else {
            self.buffer.len()
        };
        let skip = self.buffer.len().saturating_sub(wanted);

        let mut batch = SampleBatch::default();
        for (t, row) in self.buffer.iter().skip(skip) {
            batch.timestamps.push(*t);
            batch.data.push(columns.iter().map(|&c| row[c]).collect());
        }
        Some(batch)
    }

    fn disconnect(&mut self) {
        if self.connected {
            debug!(channels = self.channel_names.len(), "simulator connection closed");
        }
        self.connected = false;
        self.buffer.clear();
    }
}
