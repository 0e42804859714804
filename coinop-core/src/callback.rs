//! Telemetry sinks receiving step and episode events.
use crate::record::{Record, RecordValue};
use anyhow::Result;
use std::{fs::File, path::Path};

/// Receives training events from the [`Trainer`](crate::Trainer).
///
/// Step records carry `"reward"`, `"episode_step_count"` and, when an
/// optimization step ran, `"loss"`. Episode records carry
/// `"episode_reward"` and `"episode_length"`.
pub trait Callback {
    /// Called after every environment step.
    fn on_step_end(&mut self, step: usize, record: &Record) {
        let _ = (step, record);
    }

    /// Called at every episode boundary.
    fn on_episode_end(&mut self, episode: usize, record: &Record) {
        let _ = (episode, record);
    }
}

/// A callback that discards all events.
pub struct NullCallback;

impl Callback for NullCallback {}

/// Writes episode summaries to a CSV file.
///
/// One row per episode: `episode, episode_reward, episode_length, datetime`.
/// Rows are flushed as they are written so a crashed run keeps its log.
pub struct CsvLogger {
    wtr: csv::Writer<File>,
}

impl CsvLogger {
    /// Creates a logger writing to the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&["episode", "episode_reward", "episode_length", "datetime"])?;
        wtr.flush()?;
        Ok(Self { wtr })
    }
}

impl Callback for CsvLogger {
    fn on_episode_end(&mut self, episode: usize, record: &Record) {
        let scalar = |k: &str| match record.get(k) {
            Some(RecordValue::Scalar(v)) => *v,
            _ => f32::NAN,
        };
        let datetime = match record.get("datetime") {
            Some(RecordValue::DateTime(t)) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
            _ => String::new(),
        };
        let row = [
            episode.to_string(),
            scalar("episode_reward").to_string(),
            scalar("episode_length").to_string(),
            datetime,
        ];
        if self.wtr.write_record(&row).and_then(|_| Ok(self.wtr.flush()?)).is_err() {
            log::warn!("Failed to write episode {} to the CSV log", episode);
        }
    }
}
