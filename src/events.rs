//! Notification fabric.
//!
//! Three signalling paths bind acquisition, control, and display:
//!
//! ```text
//!                       ReferenceMeasured (fan-out)
//! ┌──────────────────┐ ─────────────────────────▶ ┌──────────────────┐
//! │ ReferenceTracker │   per-channel inboxes        │ ChannelProcessor │ ×N
//! └──────────────────┘ ◀── CalibrationRequested ── └──────────────────┘
//!                           (MonitorService)                │
//!                                                           │ PressureEvent
//!                                                           ▼ (bounded wait)
//!                                   ┌──────────────────────────────────┐
//!                                   │  pressure bus (pub/sub, by value) │
//!                                   └──────────────────────────────────┘
//!                                        │                   │
//!                                 RelayController       monitor / display
//! ```
//!
//! The reference cell is written before any inbox is woken, so every
//! processor in a cycle sees the same snapshot.  The pressure board and
//! relay flag are single-writer atomics for non-blocking reads.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU32, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};
use log::{debug, warn};

use crate::app::ports::RelayState;
use crate::config::MAX_CHANNELS;
use crate::pressure::{PressureEvent, PressureValue, RAW_SENSOR_ABSENT};

/// Pending notices per channel inbox.
pub const INBOX_DEPTH: usize = 4;

/// Pressure events buffered on the bus.
pub const BUS_CAPACITY: usize = 8;
/// Concurrent pressure-bus subscribers (relay, monitor, spares).
pub const BUS_SUBSCRIBERS: usize = 4;
/// Concurrent pressure-bus publishers (one per channel).
pub const BUS_PUBLISHERS: usize = MAX_CHANNELS;

/// One reference measurement, stamped with its acquisition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSnapshot {
    pub cycle: u32,
    pub millivolts: u32,
}

/// Directed wake-up delivered to one channel processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelNotice {
    ReferenceMeasured(ReferenceSnapshot),
    CalibrationRequested,
}

/// Result of a bounded publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Delivered,
    Dropped,
}

pub type Inbox = Channel<CriticalSectionRawMutex, ChannelNotice, INBOX_DEPTH>;
pub type PressureBus =
    PubSubChannel<CriticalSectionRawMutex, PressureEvent, BUS_CAPACITY, BUS_SUBSCRIBERS, BUS_PUBLISHERS>;
pub type PressureSubscriber<'a> = Subscriber<
    'a,
    CriticalSectionRawMutex,
    PressureEvent,
    BUS_CAPACITY,
    BUS_SUBSCRIBERS,
    BUS_PUBLISHERS,
>;
pub type PressurePublisher<'a> = Publisher<
    'a,
    CriticalSectionRawMutex,
    PressureEvent,
    BUS_CAPACITY,
    BUS_SUBSCRIBERS,
    BUS_PUBLISHERS,
>;

pub struct NotificationFabric {
    inboxes: [Inbox; MAX_CHANNELS],
    live: AtomicU8,
    reference_mv: AtomicU32,
    reference_cycle: AtomicU32,
    bus: PressureBus,
    board: [AtomicI32; MAX_CHANNELS],
    relay_on: AtomicBool,
    dropped: AtomicU32,
}

impl Default for NotificationFabric {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationFabric {
    pub const fn new() -> Self {
        Self {
            inboxes: [const { Channel::new() }; MAX_CHANNELS],
            live: AtomicU8::new(0),
            reference_mv: AtomicU32::new(0),
            reference_cycle: AtomicU32::new(0),
            bus: PubSubChannel::new(),
            board: [const { AtomicI32::new(RAW_SENSOR_ABSENT) }; MAX_CHANNELS],
            relay_on: AtomicBool::new(false),
            dropped: AtomicU32::new(0),
        }
    }

    // ── Channel registry ─────────────────────────────────────

    /// Mark a channel live so it receives reference fan-out.
    pub fn register_channel(&self, channel: u8) -> bool {
        if channel as usize >= MAX_CHANNELS {
            return false;
        }
        self.live.fetch_or(1 << channel, Ordering::AcqRel);
        true
    }

    pub fn is_live(&self, channel: u8) -> bool {
        (channel as usize) < MAX_CHANNELS && self.live.load(Ordering::Acquire) & (1 << channel) != 0
    }

    pub fn inbox(&self, channel: u8) -> Option<&Inbox> {
        self.inboxes.get(channel as usize)
    }

    // ── Reference fan-out ────────────────────────────────────

    /// Publish a new reference voltage and wake every live channel.
    ///
    /// A full inbox drops that channel's wake-up; the next cycle catches up.
    pub fn broadcast_reference(&self, millivolts: u32) -> ReferenceSnapshot {
        let cycle = self.reference_cycle.load(Ordering::Relaxed).wrapping_add(1);
        self.reference_mv.store(millivolts, Ordering::Relaxed);
        self.reference_cycle.store(cycle, Ordering::Release);
        let snapshot = ReferenceSnapshot { cycle, millivolts };

        let live = self.live.load(Ordering::Acquire);
        for (ch, inbox) in self.inboxes.iter().enumerate() {
            if live & (1 << ch) == 0 {
                continue;
            }
            if inbox
                .try_send(ChannelNotice::ReferenceMeasured(snapshot))
                .is_err()
            {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("fabric: ch{} inbox full, cycle {} skipped", ch, cycle);
            }
        }
        snapshot
    }

    /// Latest reference snapshot.
    pub fn reference(&self) -> ReferenceSnapshot {
        let cycle = self.reference_cycle.load(Ordering::Acquire);
        ReferenceSnapshot {
            cycle,
            millivolts: self.reference_mv.load(Ordering::Relaxed),
        }
    }

    // ── Calibration requests ─────────────────────────────────

    /// Route a calibration request to a channel's inbox.
    ///
    /// Returns `false` if the channel is not live or its inbox is full.
    pub fn request_calibration(&self, channel: u8) -> bool {
        if !self.is_live(channel) {
            warn!("fabric: calibration for inactive ch{} ignored", channel);
            return false;
        }
        match self.inboxes[channel as usize].try_send(ChannelNotice::CalibrationRequested) {
            Ok(()) => true,
            Err(_) => {
                warn!("fabric: ch{} inbox full, calibration request dropped", channel);
                false
            }
        }
    }

    pub fn try_next_notice(&self, channel: u8) -> Option<ChannelNotice> {
        self.inbox(channel)?.try_receive().ok()
    }

    // ── Pressure bus ─────────────────────────────────────────

    pub fn subscriber(&self) -> Option<PressureSubscriber<'_>> {
        self.bus.subscriber().ok()
    }

    pub fn publisher(&self) -> Option<PressurePublisher<'_>> {
        self.bus.publisher().ok()
    }

    /// Record and try to enqueue without waiting.
    pub fn try_publish(&self, event: PressureEvent) -> PublishOutcome {
        self.record_pressure(event);
        match self.bus.immediate_publisher().try_publish(event) {
            Ok(()) => PublishOutcome::Delivered,
            Err(_) => self.note_drop(event),
        }
    }

    /// Record and enqueue, waiting at most `bound` for bus space.
    pub async fn publish_bounded(
        &self,
        publisher: &PressurePublisher<'_>,
        event: PressureEvent,
        bound: Duration,
    ) -> PublishOutcome {
        self.record_pressure(event);
        if publisher.try_publish(event).is_ok() {
            return PublishOutcome::Delivered;
        }

        let delivered = futures_lite::future::or(
            async {
                publisher.publish(event).await;
                true
            },
            async {
                async_io_mini::Timer::after(bound).await;
                false
            },
        )
        .await;

        if delivered {
            PublishOutcome::Delivered
        } else {
            self.note_drop(event)
        }
    }

    fn note_drop(&self, event: PressureEvent) -> PublishOutcome {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            "fabric: pressure bus full, ch{} {} dropped",
            event.channel, event.pressure
        );
        PublishOutcome::Dropped
    }

    /// Notifications dropped since boot (inbox or bus full).
    pub fn dropped_count(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    // ── Read-side board ──────────────────────────────────────

    pub fn record_pressure(&self, event: PressureEvent) {
        if let Some(slot) = self.board.get(event.channel as usize) {
            slot.store(event.pressure.as_raw(), Ordering::Release);
        }
    }

    /// Latest reported value; unknown channels read as absent.
    pub fn get_pressure(&self, channel: u8) -> PressureValue {
        self.board
            .get(channel as usize)
            .map_or(PressureValue::SensorAbsent, |slot| {
                PressureValue::from_raw(slot.load(Ordering::Acquire))
            })
    }

    pub fn record_relay_state(&self, state: RelayState) {
        self.relay_on.store(state.is_on(), Ordering::Release);
    }

    pub fn get_relay_state(&self) -> RelayState {
        if self.relay_on.load(Ordering::Acquire) {
            RelayState::On
        } else {
            RelayState::Off
        }
    }
}
