//! Status snapshot and event log publishing.
//!
//! The operational loop is the only component that touches the filesystem.
//! It publishes two artifacts under the configured output directory:
//!
//! - `latest_status.json` — overwritten each successful cycle, consumed by
//!   the dashboard; written atomically (write-then-rename) so readers never
//!   observe a half-written snapshot.
//! - `event_log.json` — append-only JSON array of significant (non-NORMAL)
//!   events.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::types::{EventRecord, LatestStatus};

const STATUS_FILE: &str = "latest_status.json";
const EVENT_LOG_FILE: &str = "event_log.json";

/// Writes the published artifacts for downstream consumers.
pub struct StatusPublisher {
    output_dir: PathBuf,
}

impl StatusPublisher {
    /// Create the publisher, ensuring the output directory exists.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn status_path(&self) -> PathBuf {
        self.output_dir.join(STATUS_FILE)
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.output_dir.join(EVENT_LOG_FILE)
    }

    /// Atomically replace `latest_status.json`.
    pub fn publish(&self, status: &LatestStatus) -> Result<()> {
        let path = self.status_path();
        let tmp = self.output_dir.join(format!("{STATUS_FILE}.tmp"));
        let json = serde_json::to_string_pretty(status).context("serializing status snapshot")?;
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("replacing {}", path.display()))?;
        debug!(path = %path.display(), status = %status.risk_text, "Status snapshot published");
        Ok(())
    }

    /// Append a significant event to the event log.
    ///
    /// The log is a single JSON array, re-read and re-written on each append
    /// so it stays valid JSON for consumers at all times.
    pub fn log_event(&self, event: &EventRecord) -> Result<()> {
        let path = self.event_log_path();
        let mut events: Vec<EventRecord> = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Vec::new()
        };

        events.push(event.clone());
        let json = serde_json::to_string_pretty(&events).context("serializing event log")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), total = events.len(), "Event logged");
        Ok(())
    }

    /// Load the previously published snapshot, if one exists and parses.
    ///
    /// Used at startup to seed the last-known-good state across restarts.
    pub fn load_last_status(&self) -> Option<LatestStatus> {
        let contents = fs::read_to_string(self.status_path()).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_status(level: u8, text: &str) -> LatestStatus {
        LatestStatus {
            timestamp_utc: Utc::now(),
            region: "Jawa Timur".to_string(),
            risk_level: level,
            risk_text: text.to_string(),
            risk_value: f64::from(level),
            observation_time: Utc::now(),
            narration: "test".to_string(),
        }
    }

    #[test]
    fn test_publish_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = StatusPublisher::new(dir.path()).unwrap();

        publisher.publish(&sample_status(2, "PERINGATAN DINI")).unwrap();
        let loaded = publisher.load_last_status().unwrap();
        assert_eq!(loaded.risk_level, 2);
        assert_eq!(loaded.risk_text, "PERINGATAN DINI");
    }

    #[test]
    fn test_publish_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = StatusPublisher::new(dir.path()).unwrap();

        publisher.publish(&sample_status(1, "WASPADA CUACA EKSTREM")).unwrap();
        publisher.publish(&sample_status(0, "NORMAL")).unwrap();
        assert_eq!(publisher.load_last_status().unwrap().risk_level, 0);
    }

    #[test]
    fn test_event_log_appends_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = StatusPublisher::new(dir.path()).unwrap();

        for i in 0..3 {
            publisher
                .log_event(&EventRecord {
                    time_utc: Utc::now(),
                    region: "Jawa Timur".to_string(),
                    status: "WASPADA CUACA EKSTREM".to_string(),
                    narrative: format!("event {i}"),
                })
                .unwrap();
        }

        let contents = fs::read_to_string(publisher.event_log_path()).unwrap();
        let events: Vec<EventRecord> = serde_json::from_str(&contents).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].narrative, "event 2");
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = StatusPublisher::new(dir.path()).unwrap();
        assert!(publisher.load_last_status().is_none());
    }
}
