// Copyright (C) 2025-present The Alpenglow Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Query Pipeline Module
//!
//! This module implements the `QueryPipelineActor`, which drives the whole
//! generate → ingest → project → notify cycle on a strict one-tick-per-second
//! cadence.
//!
//! The pipeline is a single actor: it owns the generator, the trailing
//! ingest-time window, and the listener, and it is controlled exclusively
//! through command messages. One tick generates `records_per_second` events;
//! each event is ingested into the window individually and the listener fires
//! with the projected window snapshot after every ingestion, reproducing the
//! reference behavior of
//! `SELECT peak_name, trip_leader, result, amount_people, ets, its
//!  FROM MountainEvent#ext_timed(extractTimestamp(its), 3 sec)`.
//!
//! ## Actor Lifecycle
//!
//! 1. **Creation**: [QueryPipelineHandle::new] validates the configuration
//!    and spawns the actor.
//! 2. **Running**: the actor loops until its wall-clock deadline, checking
//!    for commands once per tick; a pending `Shutdown` wakes the inter-tick
//!    sleep early.
//! 3. **Completion**: the actor resolves with a [PipelineRunReport], whether
//!    it ran to its deadline or was shut down.

use crate::{clock, generator::ExpeditionGenerator, WindowListener};
use alpenglow_analytics::windowing::ExternalTimeWindow;
use alpenglow_expedition_pkt::{ExpeditionEvent, WindowRecord};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, trace, warn};

/// Width of the trailing ingest-time window, fixed by the query definition.
pub const WINDOW_WIDTH: Duration = Duration::from_secs(3);

const RECORDS_PER_SECOND_DEFAULT: u32 = 2;
const DURATION_SECONDS_DEFAULT: u64 = 5;
const CMD_BUFFER_SIZE: usize = 16;

const fn default_records_per_second() -> u32 {
    RECORDS_PER_SECOND_DEFAULT
}

const fn default_duration_seconds() -> u64 {
    DURATION_SECONDS_DEFAULT
}

/// Run parameters for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How many events to generate per one-second tick.
    #[serde(default = "default_records_per_second")]
    pub records_per_second: u32,
    /// Wall-clock bound on the run; the last tick may be cut short.
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            records_per_second: RECORDS_PER_SECOND_DEFAULT,
            duration_seconds: DURATION_SECONDS_DEFAULT,
        }
    }
}

impl PipelineConfig {
    /// Rejects unusable parameters before any event is generated.
    pub const fn validate(&self) -> Result<(), InvalidPipelineConfig> {
        if self.records_per_second == 0 {
            return Err(InvalidPipelineConfig::ZeroRecordsPerSecond);
        }
        if self.duration_seconds == 0 {
            return Err(InvalidPipelineConfig::ZeroDurationSeconds);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum InvalidPipelineConfig {
    #[strum(to_string = "records_per_second must be a positive integer")]
    ZeroRecordsPerSecond,
    #[strum(to_string = "duration_seconds must be a positive integer")]
    ZeroDurationSeconds,
}

impl std::error::Error for InvalidPipelineConfig {}

/// Commands that can be sent to the pipeline actor.
#[derive(Debug, strum_macros::Display)]
enum QueryPipelineActorCommand {
    /// Stop after the in-flight tick and acknowledge with the run report.
    Shutdown(mpsc::Sender<PipelineRunReport>),
}

#[derive(Debug, strum_macros::Display)]
pub enum QueryPipelineActorError {
    #[strum(to_string = "command channel closed while the pipeline was still running")]
    CommandChannelClosed,
}

impl std::error::Error for QueryPipelineActorError {
    fn description(&self) -> &str {
        match self {
            Self::CommandChannelClosed => "command channel closed",
        }
    }

    fn cause(&self) -> Option<&dyn std::error::Error> {
        None
    }
}

/// Counters summarizing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineRunReport {
    /// Completed generation ticks.
    pub ticks: u64,
    /// Events generated and ingested into the window.
    pub generated: u64,
}

struct QueryPipelineActor<R> {
    config: PipelineConfig,
    cmd_rx: mpsc::Receiver<QueryPipelineActorCommand>,
    generator: ExpeditionGenerator<R>,
    window: ExternalTimeWindow<ExpeditionEvent>,
    listener: WindowListener,
}

impl<R: Rng> QueryPipelineActor<R> {
    fn new(
        config: PipelineConfig,
        cmd_rx: mpsc::Receiver<QueryPipelineActorCommand>,
        generator: ExpeditionGenerator<R>,
        listener: WindowListener,
    ) -> Self {
        Self {
            config,
            cmd_rx,
            generator,
            window: ExternalTimeWindow::new(WINDOW_WIDTH),
            listener,
        }
    }

    /// Generates one tick's batch, ingesting each event and notifying the
    /// listener with the window snapshot after every ingestion.
    fn run_batch(&mut self, report: &mut PipelineRunReport) {
        for _ in 0..self.config.records_per_second {
            match self.generator.generate_one() {
                Ok(event) => {
                    let snapshot: Vec<WindowRecord> =
                        self.window.ingest(event).map(WindowRecord::from).collect();
                    report.generated += 1;
                    trace!(
                        "window holds {} events after ingestion {}",
                        snapshot.len(),
                        report.generated
                    );
                    (self.listener)(&snapshot);
                }
                Err(err) => {
                    // A bad record is dropped; buffered window state stays valid.
                    warn!("skipping malformed generated event: {err}");
                }
            }
        }
        report.ticks += 1;
    }

    async fn run(mut self) -> Result<PipelineRunReport, QueryPipelineActorError> {
        let mut report = PipelineRunReport::default();
        let deadline =
            Utc::now() + chrono::Duration::seconds(self.config.duration_seconds as i64);
        info!(
            "query pipeline started: {} records/sec for {} sec, {:?} window",
            self.config.records_per_second, self.config.duration_seconds, WINDOW_WIDTH
        );
        while Utc::now() < deadline {
            self.run_batch(&mut report);
            tokio::select! {
                biased; // Prioritize command messages
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(QueryPipelineActorCommand::Shutdown(tx)) => {
                            info!(
                                "received shutdown command after {} ticks, stopping",
                                report.ticks
                            );
                            let _ = tx.send(report).await;
                            return Ok(report);
                        }
                        None => return Err(QueryPipelineActorError::CommandChannelClosed),
                    }
                }
                () = clock::sleep_until_next_second() => {}
            }
        }
        info!(
            "query pipeline reached its deadline: {} events over {} ticks",
            report.generated, report.ticks
        );
        Ok(report)
    }
}

#[derive(Debug, strum_macros::Display)]
pub enum QueryPipelineHandleError {
    #[strum(to_string = "error sending command to the pipeline actor")]
    SendError,
    #[strum(to_string = "error receiving response from the pipeline actor")]
    ReceiveError,
}

impl std::error::Error for QueryPipelineHandleError {
    fn description(&self) -> &str {
        match self {
            Self::SendError => "error sending command to the pipeline actor",
            Self::ReceiveError => "error receiving response from the pipeline actor",
        }
    }

    fn cause(&self) -> Option<&dyn std::error::Error> {
        None
    }
}

/// Public interface for a running pipeline actor.
///
/// Cloneable; every clone talks to the same actor through its command
/// channel.
#[derive(Debug, Clone)]
pub struct QueryPipelineHandle {
    cmd_tx: mpsc::Sender<QueryPipelineActorCommand>,
}

impl QueryPipelineHandle {
    /// Validates the configuration and spawns the pipeline actor with an
    /// OS-seeded generator.
    #[allow(clippy::type_complexity)]
    pub fn new(
        config: PipelineConfig,
        listener: WindowListener,
    ) -> Result<
        (
            JoinHandle<Result<PipelineRunReport, QueryPipelineActorError>>,
            Self,
        ),
        InvalidPipelineConfig,
    > {
        Self::with_generator(config, listener, ExpeditionGenerator::from_os_rng())
    }

    /// Spawns the actor with a caller-supplied generator; tests inject a
    /// seeded random source here.
    #[allow(clippy::type_complexity)]
    pub fn with_generator<R: Rng + Send + 'static>(
        config: PipelineConfig,
        listener: WindowListener,
        generator: ExpeditionGenerator<R>,
    ) -> Result<
        (
            JoinHandle<Result<PipelineRunReport, QueryPipelineActorError>>,
            Self,
        ),
        InvalidPipelineConfig,
    > {
        config.validate()?;
        let (cmd_tx, cmd_rx) = mpsc::channel(CMD_BUFFER_SIZE);
        let actor = QueryPipelineActor::new(config, cmd_rx, generator, listener);
        let join_handle = tokio::spawn(actor.run());
        Ok((join_handle, Self { cmd_tx }))
    }

    /// Requests a graceful stop. The in-flight tick completes; a pipeline
    /// sleeping between ticks wakes immediately. Resolves with the run
    /// report once the actor has stopped.
    pub async fn shutdown(&self) -> Result<PipelineRunReport, QueryPipelineHandleError> {
        let (tx, mut rx) = mpsc::channel(1);
        self.cmd_tx
            .send(QueryPipelineActorCommand::Shutdown(tx))
            .await
            .map_err(|_| QueryPipelineHandleError::SendError)?;
        rx.recv().await.ok_or(QueryPipelineHandleError::ReceiveError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};
    use std::sync::{Arc, Mutex};

    fn collecting_listener() -> (WindowListener, Arc<Mutex<Vec<Vec<WindowRecord>>>>) {
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let captured = snapshots.clone();
        let listener: WindowListener = Arc::new(move |records: &[WindowRecord]| {
            captured.lock().unwrap().push(records.to_vec());
        });
        (listener, snapshots)
    }

    fn seeded() -> ExpeditionGenerator<SmallRng> {
        ExpeditionGenerator::new(SmallRng::seed_from_u64(7))
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
        let config = PipelineConfig {
            records_per_second: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(InvalidPipelineConfig::ZeroRecordsPerSecond)
        );
        let config = PipelineConfig {
            duration_seconds: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(InvalidPipelineConfig::ZeroDurationSeconds)
        );
    }

    #[test]
    fn test_invalid_config_is_rejected_before_spawn() {
        let (listener, _) = collecting_listener();
        let config = PipelineConfig {
            records_per_second: 0,
            duration_seconds: 5,
        };
        let spawned = QueryPipelineHandle::with_generator(config, listener, seeded());
        assert!(matches!(
            spawned,
            Err(InvalidPipelineConfig::ZeroRecordsPerSecond)
        ));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_run_cadence_and_notification_granularity() {
        let config = PipelineConfig {
            records_per_second: 3,
            duration_seconds: 1,
        };
        let (listener, snapshots) = collecting_listener();
        let (join_handle, _handle) =
            QueryPipelineHandle::with_generator(config, listener, seeded()).unwrap();
        let report = join_handle.await.unwrap().unwrap();

        // The wall-clock bound allows one extra partial tick at most
        assert!(report.generated >= 3 && report.generated <= 6);
        assert_eq!(report.ticks, report.generated / 3);

        let snapshots = snapshots.lock().unwrap();
        // One listener call per ingested event
        assert_eq!(snapshots.len() as u64, report.generated);
        // The first tick's batch shares an ingest time: nothing is evicted,
        // so snapshots grow by one event each
        for (i, snapshot) in snapshots.iter().take(3).enumerate() {
            assert_eq!(snapshot.len(), i + 1);
        }
        for snapshot in snapshots.iter() {
            for record in snapshot {
                assert!(!record.peak_name.is_empty());
                assert!(!record.trip_leader.is_empty());
                assert!((1..=12).contains(&record.amount_people));
            }
        }
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_shutdown_wakes_the_inter_tick_sleep() {
        let config = PipelineConfig {
            records_per_second: 1,
            duration_seconds: 60,
        };
        let (listener, _) = collecting_listener();
        let (join_handle, handle) =
            QueryPipelineHandle::with_generator(config, listener, seeded()).unwrap();

        // Let the actor finish its first batch and enter the sleep
        tokio::time::sleep(Duration::from_millis(50)).await;
        let report = tokio::time::timeout(Duration::from_secs(5), async {
            let acked = handle.shutdown().await.unwrap();
            let joined = join_handle.await.unwrap().unwrap();
            assert_eq!(acked, joined);
            joined
        })
        .await
        .expect("shutdown should stop the run well before the 60s deadline");
        assert!(report.ticks >= 1);
    }
}
