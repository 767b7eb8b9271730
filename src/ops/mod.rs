//! Operational cycle loop.
//!
//! Drives the detection pipeline on a fixed interval: fetch → preprocess →
//! subset → detect → narrate → publish. A failed cycle is logged and skipped
//! — the long-running process never dies with it, and the previous
//! successful status remains published as the last known-good state for
//! downstream consumers. Retry simply happens on the next scheduled cycle.

mod status;

pub use status::StatusPublisher;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SigapConfig;
use crate::narrator::narrate;
use crate::pipeline::DetectionPipeline;
use crate::preprocess::preprocess_satellite;
use crate::source::GridSource;
use crate::types::{AlertStatus, EventRecord, LatestStatus};

/// Counters reported when the loop shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub events_logged: u64,
}

/// Owns everything one deployment needs to run detection cycles.
pub struct OperationalLoop<S: GridSource> {
    source: S,
    pipeline: DetectionPipeline,
    config: SigapConfig,
    publisher: StatusPublisher,
    last_known_good: Option<LatestStatus>,
    stats: LoopStats,
}

impl<S: GridSource> OperationalLoop<S> {
    /// Build the loop from a validated config and an input source.
    ///
    /// Seeds the last-known-good state from a previously published snapshot
    /// so a restart does not blank the dashboard.
    pub fn new(config: SigapConfig, source: S) -> Result<Self> {
        let pipeline = DetectionPipeline::new(config.detection.clone())
            .context("invalid detection configuration")?;
        let publisher = StatusPublisher::new(&config.runtime.output_dir)?;
        let last_known_good = publisher.load_last_status();
        if let Some(prev) = &last_known_good {
            info!(
                status = %prev.risk_text,
                observed = %prev.observation_time,
                "Restored last known-good status from previous run"
            );
        }
        Ok(Self {
            source,
            pipeline,
            config,
            publisher,
            last_known_good,
            stats: LoopStats::default(),
        })
    }

    pub fn last_known_good(&self) -> Option<&LatestStatus> {
        self.last_known_good.as_ref()
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Run one full detection cycle and publish its result.
    pub fn run_cycle(&mut self) -> Result<LatestStatus> {
        let region = &self.config.region;

        let raw = self.source.fetch().context("fetching input grid")?;
        let clean = preprocess_satellite(&raw).context("preprocessing input grid")?;
        let regional = clean
            .subset(&region.name, &region.bbox)
            .context("subsetting grid to region")?;

        let bundle = self.pipeline.run(&regional).context("detection run")?;
        let narration = narrate(&bundle, &region.name);

        let latest = bundle
            .latest()
            .context("detection produced an empty decision series")?;

        let status = LatestStatus {
            timestamp_utc: Utc::now(),
            region: region.name.clone(),
            risk_level: latest.status.level(),
            risk_text: latest.status.label().to_string(),
            risk_value: latest.risk_value,
            observation_time: latest.time,
            narration,
        };

        self.publisher.publish(&status)?;
        if latest.status != AlertStatus::Normal {
            self.publisher.log_event(&EventRecord {
                time_utc: status.timestamp_utc,
                region: status.region.clone(),
                status: status.risk_text.clone(),
                narrative: status.narration.clone(),
            })?;
            self.stats.events_logged += 1;
        }

        self.last_known_good = Some(status.clone());
        Ok(status)
    }

    /// Run cycles on the configured interval until cancelled.
    ///
    /// The first cycle runs immediately. Failures are logged and counted;
    /// the loop keeps going.
    pub async fn run(&mut self, cancel: CancellationToken) -> LoopStats {
        let interval_minutes = self.config.runtime.interval_minutes.max(1);
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_minutes * 60));

        info!(
            source = self.source.source_name(),
            region = %self.config.region.name,
            interval_minutes,
            "Operational loop starting"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Operational loop cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_cycle() {
                        Ok(status) => {
                            self.stats.cycles_completed += 1;
                            info!(
                                status = %status.risk_text,
                                risk_value = status.risk_value,
                                "Cycle complete"
                            );
                        }
                        Err(e) => {
                            self.stats.cycles_failed += 1;
                            error!(error = %e, "Cycle failed — retaining last known-good status");
                            if self.last_known_good.is_none() {
                                warn!("No known-good status available yet");
                            }
                        }
                    }
                }
            }
        }

        info!(
            completed = self.stats.cycles_completed,
            failed = self.stats.cycles_failed,
            events = self.stats.events_logged,
            "Operational loop stopped"
        );
        self.stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{var, BoundingBox, Grid};
    use chrono::TimeZone;

    /// Source yielding a fixed preloaded grid, or an error.
    struct FixedSource {
        grid: Option<Grid>,
    }

    impl GridSource for FixedSource {
        fn fetch(&mut self) -> Result<Grid> {
            self.grid
                .clone()
                .ok_or_else(|| anyhow::anyhow!("feed unavailable"))
        }

        fn source_name(&self) -> &str {
            "fixed"
        }
    }

    fn test_config(output_dir: &std::path::Path) -> SigapConfig {
        let mut config = SigapConfig::default();
        config.runtime.output_dir = output_dir.to_path_buf();
        config.region.bbox = BoundingBox {
            lat_min: -9.0,
            lat_max: -7.0,
            lon_min: 111.0,
            lon_max: 114.0,
        };
        config
    }

    fn flat_grid(bt: f64) -> Grid {
        let times = (0..4)
            .map(|i| {
                chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(10 * i)
            })
            .collect();
        let mut grid = Grid::new(times, vec![-8.0, -7.5], vec![112.0, 112.5]).unwrap();
        grid.insert(var::BT, vec![bt; 16]).unwrap();
        grid
    }

    #[test]
    fn test_cycle_publishes_normal_without_event() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixedSource {
            grid: Some(flat_grid(290.0)),
        };
        let mut ops = OperationalLoop::new(test_config(dir.path()), source).unwrap();

        let status = ops.run_cycle().unwrap();
        assert_eq!(status.risk_text, "NORMAL");
        assert!(ops.publisher.status_path().exists());
        assert!(!ops.publisher.event_log_path().exists());
        assert_eq!(ops.last_known_good().unwrap().risk_level, 0);
    }

    #[test]
    fn test_failed_cycle_keeps_previous_status() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixedSource {
            grid: Some(flat_grid(290.0)),
        };
        let mut ops = OperationalLoop::new(test_config(dir.path()), source).unwrap();
        ops.run_cycle().unwrap();

        // Feed goes down; the cycle fails but the snapshot survives
        ops.source.grid = None;
        assert!(ops.run_cycle().is_err());
        assert_eq!(ops.last_known_good().unwrap().risk_text, "NORMAL");
        assert!(ops.publisher.load_last_status().is_some());
    }

    #[test]
    fn test_warning_cycle_logs_event() {
        let dir = tempfile::tempdir().unwrap();
        // One cell plunges to deep convection and holds, rest stay warm
        let mut grid = flat_grid(290.0);
        let shape = grid.shape();
        let bt = grid.field_mut(var::BT).unwrap();
        for (t, target) in [(1, 250.0), (2, 210.0), (3, 208.0)] {
            bt[shape.idx(t, 0, 0)] = target;
        }

        let source = FixedSource { grid: Some(grid) };
        let mut ops = OperationalLoop::new(test_config(dir.path()), source).unwrap();
        let status = ops.run_cycle().unwrap();

        assert_eq!(status.risk_text, "PERINGATAN DINI");
        assert!(ops.publisher.event_log_path().exists());
        assert_eq!(ops.stats().events_logged, 1);
    }

    #[test]
    fn test_restart_restores_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        {
            let source = FixedSource {
                grid: Some(flat_grid(290.0)),
            };
            let mut ops = OperationalLoop::new(test_config(dir.path()), source).unwrap();
            ops.run_cycle().unwrap();
        }

        // New process, same output dir
        let source = FixedSource { grid: None };
        let ops = OperationalLoop::new(test_config(dir.path()), source).unwrap();
        assert_eq!(ops.last_known_good().unwrap().risk_text, "NORMAL");
    }
}
