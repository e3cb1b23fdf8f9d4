use serde::{Deserialize, Serialize};
use std::fmt;

/// One pull worth of samples: `data[i]` was recorded at `timestamps[i]`, columns follow the channel list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleBatch {
    pub timestamps: Vec<f64>,
    pub data: Vec<Vec<f64>>,
}

/// Why a batch was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchDefect {
    /// The read returned nothing at all
    Missing,
    NoTimestamps,
    NoRows,
    /// Rows and timestamps disagree in length
    RowCountMismatch { rows: usize, timestamps: usize },
    /// A row does not have one value per channel
    RowWidthMismatch { row: usize, width: usize, channels: usize },
}

impl fmt::Display for BatchDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no data returned"),
            Self::NoTimestamps => write!(f, "no timestamps"),
            Self::NoRows => write!(f, "no rows"),
            Self::RowCountMismatch { rows, timestamps } => {
                write!(f, "{} rows but {} timestamps", rows, timestamps)
            }
            Self::RowWidthMismatch { row, width, channels } => {
                write!(f, "row {} has {} values, expected {}", row, width, channels)
            }
        }
    }
}

impl SampleBatch {
    pub fn new(timestamps: Vec<f64>, data: Vec<Vec<f64>>) -> Self {
        Self { timestamps, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.timestamps.is_empty()
    }

    /// Checks that the batch can be forwarded against a channel list of `channel_count` columns.
    pub fn validate(&self, channel_count: usize) -> Result<(), BatchDefect> {
        if self.timestamps.is_empty() {
            return Err(BatchDefect::NoTimestamps);
        }
        if self.data.is_empty() {
            return Err(BatchDefect::NoRows);
        }
        if self.data.len() != self.timestamps.len() {
            return Err(BatchDefect::RowCountMismatch {
                rows: self.data.len(),
                timestamps: self.timestamps.len(),
            });
        }
        if let Some((row, values)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != channel_count)
        {
            return Err(BatchDefect::RowWidthMismatch {
                row,
                width: values.len(),
                channels: channel_count,
            });
        }
        Ok(())
    }
}
