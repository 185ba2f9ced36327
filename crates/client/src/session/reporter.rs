// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Position reporting loop.
//!
//! Runs only while a channel is open: the coordinator starts one on open and
//! stops it on close. Two sampling strategies are supported:
//! - `Poll`: request one fresh reading per tick
//! - `Watch`: consume the provider's continuous stream, dropping readings
//!   that arrive sooner than the effective interval after the last report
//!
//! Either way the cadence is never tighter than the server's minimum.

use std::sync::Arc;
use std::time::Duration;

use busline_core::{is_valid_coordinate, ClientMessage, SessionIdentity};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::channel::ChannelSender;
use crate::config::{ReportStrategy, ReportingConfig};
use crate::services::{FixStream, PositionFix, PositionProvider};

/// Floor for the report period; tokio intervals reject zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running reporting loop.
pub(crate) struct Reporter {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Reporter {
    /// Spawns the loop for one open channel.
    pub fn start(
        provider: Arc<dyn PositionProvider>,
        sender: ChannelSender,
        identity: SessionIdentity,
        config: &ReportingConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let report_loop = ReportLoop {
            provider,
            sender,
            identity,
            strategy: config.strategy,
            period: config.effective_interval().max(MIN_PERIOD),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(report_loop.run());

        Reporter {
            cancel,
            task: Some(task),
        }
    }

    /// Stops the loop and waits for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "position reporter ended abnormally");
            }
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// How a watch loop finished.
enum StreamEnd {
    /// Cancelled, or the channel can no longer send.
    Stopped,
    /// The provider closed the stream; `last_sent` is the last report made from it.
    Ended { last_sent: Option<Instant> },
}

struct ReportLoop {
    provider: Arc<dyn PositionProvider>,
    sender: ChannelSender,
    identity: SessionIdentity,
    strategy: ReportStrategy,
    period: Duration,
    cancel: CancellationToken,
}

impl ReportLoop {
    async fn run(self) {
        info!(
            strategy = ?self.strategy,
            interval_ms = self.period.as_millis() as u64,
            "position reporting started"
        );

        match self.strategy {
            ReportStrategy::Poll => self.poll(Instant::now()).await,
            ReportStrategy::Watch => match self.provider.watch_positions() {
                Some(stream) => {
                    if let StreamEnd::Ended { last_sent } = self.watch(stream).await {
                        info!("position stream ended, falling back to polling");
                        let first = last_sent.map_or_else(Instant::now, |sent| sent + self.period);
                        self.poll(first).await;
                    }
                }
                None => {
                    warn!("position provider has no continuous stream, falling back to polling");
                    self.poll(Instant::now()).await;
                }
            },
        }

        info!("position reporting stopped");
    }

    /// Requests one reading per tick, the first at `first`.
    async fn poll(&self, first: Instant) {
        let mut interval = tokio::time::interval_at(first, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = interval.tick() => {}
            }

            let reading = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                reading = self.provider.current_position() => reading,
            };

            match reading {
                Ok(fix) => {
                    if !self.report(fix) {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "failed to read position, skipping tick"),
            }
        }
    }

    /// Consumes a continuous stream until it ends or reporting must stop.
    async fn watch(&self, mut stream: FixStream) -> StreamEnd {
        let mut last_sent: Option<Instant> = None;

        loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return StreamEnd::Stopped,
                item = stream.recv() => item,
            };

            match item {
                None => return StreamEnd::Ended { last_sent },
                Some(Err(e)) => warn!(error = %e, "position stream reported an error"),
                Some(Ok(fix)) => {
                    if last_sent.is_some_and(|sent| sent.elapsed() < self.period) {
                        trace!("throttled position reading");
                        continue;
                    }
                    if !self.report(fix) {
                        return StreamEnd::Stopped;
                    }
                    last_sent = Some(Instant::now());
                }
            }
        }
    }

    /// Sends one reading. Returns false once the channel can no longer send.
    fn report(&self, fix: PositionFix) -> bool {
        if !is_valid_coordinate(fix.latitude, fix.longitude) {
            debug!(
                latitude = fix.latitude,
                longitude = fix.longitude,
                "skipping invalid position reading"
            );
            return true;
        }
        if !self.sender.is_open() {
            debug!("channel closed, stopping position reports");
            return false;
        }

        let msg = ClientMessage::location_report(
            self.identity.user_id.clone(),
            self.identity.organization_id.clone(),
            fix.latitude,
            fix.longitude,
            fix.recorded_at,
        );
        debug!(
            latitude = fix.latitude,
            longitude = fix.longitude,
            "reporting position"
        );
        self.sender.send(msg)
    }
}
