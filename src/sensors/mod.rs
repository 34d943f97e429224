//! Acquisition subsystem — reference tracking and per-channel pipelines.
//!
//! [`AcquisitionManager`] owns the [`ReferenceTracker`] and every
//! [`ChannelProcessor`].  On device the parts are split across tasks with
//! [`AcquisitionManager::into_parts`]; tests drive whole cycles
//! synchronously with [`AcquisitionManager::run_cycle`].

pub mod channel;
pub mod divider;
pub mod history;
pub mod reference;

use heapless::Vec;
use log::{debug, info};

use crate::app::ports::{ConfigError, StoragePort, VoltageSampler};
use crate::config::{MAX_CHANNELS, SystemConfig};
use crate::error::Error;
use crate::events::{INBOX_DEPTH, NotificationFabric, ReferenceSnapshot};

use channel::{ChannelOutput, ChannelProcessor};
use divider::VoltageDivider;
use reference::{ReferenceProbe, ReferenceTracker};

pub type Processors = Vec<ChannelProcessor, MAX_CHANNELS>;

/// Everything one cycle can produce: a full inbox on every channel.
pub type CycleOutputs = Vec<ChannelOutput, { INBOX_DEPTH * MAX_CHANNELS }>;

pub struct AcquisitionManager {
    tracker: ReferenceTracker,
    channels: Processors,
}

impl AcquisitionManager {
    /// Build the tracker and `cfg.channel_count` processors.
    ///
    /// `hw_channels[i]` is the ADC channel of pressure channel `i`.
    pub fn new(
        cfg: &SystemConfig,
        reference_hw: u8,
        hw_channels: &[u8],
        storage: &impl StoragePort,
    ) -> Result<Self, Error> {
        cfg.validate().map_err(|e| match e {
            ConfigError::ValidationFailed(msg) => Error::Config(msg),
            _ => Error::Config("invalid configuration"),
        })?;

        let count = cfg.channel_count as usize;
        if hw_channels.len() < count {
            return Err(Error::Init("fewer ADC channels than configured"));
        }

        let divider = VoltageDivider::new(cfg.reference_divider, cfg.divider_rounding)
            .ok_or(Error::Config("reference divider has no ground leg"))?;
        let probe = ReferenceProbe::new(reference_hw, divider);

        let mut channels = Processors::new();
        for (index, &hw) in hw_channels.iter().take(count).enumerate() {
            let processor = ChannelProcessor::new(index as u8, hw, probe, cfg, storage)?;
            channels
                .push(processor)
                .map_err(|_| Error::Init("channel table full"))?;
        }
        info!(
            "acquisition: {} channels, window {}, cycle {} ms",
            count, cfg.history_len, cfg.cycle_period_ms
        );

        Ok(Self {
            tracker: ReferenceTracker::new(probe),
            channels,
        })
    }

    /// Mark every owned channel live in the fabric.
    pub fn register(&self, fabric: &NotificationFabric) {
        for p in &self.channels {
            fabric.register_channel(p.index());
        }
    }

    pub fn channel(&self, index: u8) -> Option<&ChannelProcessor> {
        self.channels.iter().find(|p| p.index() == index)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// One full cycle: reference tick, then every processor drains its inbox.
    ///
    /// Pressure changes go through [`NotificationFabric::try_publish`].
    pub fn run_cycle(
        &mut self,
        sampler: &mut impl VoltageSampler,
        storage: &mut impl StoragePort,
        fabric: &NotificationFabric,
    ) -> (ReferenceSnapshot, CycleOutputs) {
        let snapshot = self.tracker.tick(sampler, fabric);
        let mut outputs = CycleOutputs::new();

        for p in &mut self.channels {
            while let Some(notice) = fabric.try_next_notice(p.index()) {
                let Some(out) = p.handle(notice, sampler, storage) else {
                    continue;
                };
                if let ChannelOutput::Changed(ev) = out {
                    fabric.try_publish(ev);
                }
                if outputs.push(out).is_err() {
                    debug!("acquisition: ch{} output not collected", p.index());
                }
            }
        }
        (snapshot, outputs)
    }

    pub fn into_parts(self) -> (ReferenceTracker, Processors) {
        (self.tracker, self.channels)
    }
}
