// FlowLink - Pulse flow telemetry over LoRa
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.


//! Sensor node main loop
//!
//! [`SenderNode`] owns every piece of main-context state: the sampler with
//! its running volume, the statistics window, the radio and the tick/epoch
//! timers. The only thing it shares is the [`PulseCounter`], handed to the
//! pin interrupt through [`SenderNode::pulse_counter`].
//!
//! ```text
//! pin ISR ──on_edge──► PulseCounter
//!                           │ drain (every tick)
//!                           ▼
//!                      FlowSampler ──► StatisticsWindow
//!                                            │ build_and_reset (every epoch)
//!                                            ▼
//!                                     TelemetryFrame ──► RadioLink
//! ```

use crate::clock::Clock;
use crate::codec::StatisticsRecord;
use crate::config::NodeConfig;
use crate::error::{FlowError, LinkError, Result};
use crate::pulse::PulseCounter;
use crate::radio::{RadioConfig, RadioLink};
use crate::recovery::with_retry_counted;
use crate::sampler::{FlowSample, FlowSampler};
use crate::window::StatisticsWindow;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// What happened at the end of an epoch
#[derive(Debug, Clone, PartialEq)]
pub enum EpochOutcome {
    /// No samples were collected; nothing was transmitted
    NoData,
    /// The record was handed to the radio
    Sent(StatisticsRecord),
    /// The radio refused the datagram; the record is gone
    SendFailed {
        record: StatisticsRecord,
        error: LinkError,
    },
}

/// Result of one pass through the main loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    /// Sample taken on this pass, if a tick was due
    pub sample: Option<FlowSample>,
    /// Epoch closed on this pass, if one was due
    pub epoch: Option<EpochOutcome>,
}

impl PollReport {
    /// True if neither a tick nor an epoch was due
    pub fn is_idle(&self) -> bool {
        self.sample.is_none() && self.epoch.is_none()
    }
}

/// Sender counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Sampling ticks processed
    pub ticks: u64,
    /// Records handed to the radio
    pub records_sent: u64,
    /// Epochs that closed without samples
    pub empty_epochs: u64,
    /// Records the radio refused
    pub send_failures: u64,
    /// Samples refused by a full window
    pub samples_dropped: u64,
}

/// Flowmeter node: sampling, aggregation and transmission
#[derive(Debug)]
pub struct SenderNode<R, C> {
    config: NodeConfig,
    radio_config: RadioConfig,
    radio: R,
    clock: C,
    counter: Arc<PulseCounter>,
    sampler: FlowSampler,
    window: StatisticsWindow,
    previous_tick_ms: u32,
    last_epoch_ms: u32,
    stats: SenderStats,
}

impl<R: RadioLink, C: Clock> SenderNode<R, C> {
    /// Build a node; the radio is not touched until [`start`](Self::start)
    pub fn new(config: NodeConfig, radio_config: RadioConfig, radio: R, clock: C) -> Result<Self> {
        config.validate()?;

        let now = clock.now_ms();
        Ok(Self {
            counter: Arc::new(PulseCounter::new(now, config.debounce_floor_ms)),
            sampler: FlowSampler::new(&config),
            window: StatisticsWindow::new(config.window_capacity),
            previous_tick_ms: now,
            last_epoch_ms: now,
            stats: SenderStats::default(),
            config,
            radio_config,
            radio,
            clock,
        })
    }

    /// Handle for the sensor pin's interrupt handler
    pub fn pulse_counter(&self) -> Arc<PulseCounter> {
        Arc::clone(&self.counter)
    }

    /// Bring the radio up
    ///
    /// Retries under `config.link_init_retry`. Running out of attempts is
    /// fatal: the node has nothing to do without its link. Returns the
    /// number of attempts it took.
    pub fn start(&mut self) -> Result<u32> {
        let radio = &mut self.radio;
        let radio_config = &self.radio_config;
        let result = with_retry_counted(&self.config.link_init_retry, || {
            radio.begin(radio_config).map_err(|e| {
                debug!("Radio init attempt failed: {}", e);
                e
            })
        });

        match result {
            Ok(done) => {
                info!(
                    "Radio up at {} Hz, sync word 0x{:02X} ({} attempt(s))",
                    self.radio_config.frequency_hz, self.radio_config.sync_word, done.attempts
                );
                let now = self.clock.now_ms();
                self.previous_tick_ms = now;
                self.last_epoch_ms = now;
                Ok(done.attempts)
            }
            Err(exhausted) => {
                error!(
                    "Radio unavailable after {} attempt(s): {}",
                    exhausted.attempts, exhausted.error
                );
                Err(FlowError::Link(exhausted.error))
            }
        }
    }

    /// One pass of the main loop
    ///
    /// Takes a sample if a tick is due, then closes the epoch if one is due.
    /// Radio failures here are reported and the record dropped; they never
    /// stop the node.
    pub fn poll(&mut self) -> PollReport {
        let now = self.clock.now_ms();
        let mut report = PollReport::default();

        if now.wrapping_sub(self.previous_tick_ms) >= self.config.tick_interval_ms {
            report.sample = Some(self.tick(now));
            self.previous_tick_ms = now;
        }

        if now.wrapping_sub(self.last_epoch_ms) >= self.config.epoch_ms {
            report.epoch = Some(self.close_epoch(now));
            self.last_epoch_ms = now;
        }

        report
    }

    fn tick(&mut self, now: u32) -> FlowSample {
        let drain = self.counter.drain(now);
        let sample = self.sampler.sample(drain, now);
        self.stats.ticks += 1;

        if drain.count > 0 || self.sampler.is_flowing() {
            debug!(
                "Pulses: {}, flow rate: {:.3}/min, since last pulse: {} ms",
                drain.count, sample.rate, drain.since_last_edge_ms
            );
        }

        if let Err(e) = self.window.push(sample) {
            warn!("Sample at {} ms dropped: {}", now, e);
            self.stats.samples_dropped += 1;
        }
        sample
    }

    fn close_epoch(&mut self, now: u32) -> EpochOutcome {
        let samples = self.window.len();
        let record = match self.window.build_and_reset(now) {
            Some(record) => record,
            None => {
                debug!("No samples collected for epoch ending at {} ms", now);
                self.stats.empty_epochs += 1;
                return EpochOutcome::NoData;
            }
        };

        let frame = record.encode();
        match self.radio.send(frame.as_ref()) {
            Ok(()) => {
                info!(
                    "Frame sent: {} ({} samples, {} bytes)",
                    record,
                    samples,
                    frame.as_ref().len()
                );
                self.stats.records_sent += 1;
                EpochOutcome::Sent(record)
            }
            Err(error) => {
                warn!("Frame dropped, radio refused it: {}", error);
                self.stats.send_failures += 1;
                EpochOutcome::SendFailed { record, error }
            }
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// Volume measured since start
    pub fn total_volume(&self) -> f64 {
        self.sampler.total_volume()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
