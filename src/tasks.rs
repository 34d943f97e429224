//! Async task bodies and executor wiring.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │  futures_lite::block_on (async-io-mini reactor: timers)      │
//!  │  ┌────────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                          │  │
//!  │  │   reference_loop ──▶ channel_loop ×N ──▶ relay_loop     │  │
//!  │  │                                     └──▶ monitor_loop   │  │
//!  │  └────────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every task parks on an inbox, the pressure bus, or a reactor timer;
//! none of them polls.  Adapters used by several tasks are shared through
//! `Rc<RefCell<_>>` and are never borrowed across an `.await`.

use core::cell::RefCell;
use core::time::Duration;

use std::rc::Rc;

use async_io_mini::Timer;
use edge_executor::LocalExecutor;
use embassy_sync::pubsub::WaitResult;
use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, Clock, EventSink, StoragePort, VoltageSampler};
use crate::config::SystemConfig;
use crate::control::relay::{RelayController, RelayInput};
use crate::events::NotificationFabric;
use crate::pressure::PressureEvent;
use crate::sensors::channel::{ChannelOutput, ChannelProcessor};
use crate::sensors::reference::ReferenceTracker;
use crate::sensors::AcquisitionManager;

/// Executor slots: reference + up to 8 channels + relay + monitor, with room.
pub const TASK_SLOTS: usize = 16;

type Shared<T> = Rc<RefCell<T>>;

/// Adapters handed to the task set.
pub struct Ports<S, St, A, E, C> {
    pub sampler: S,
    pub storage: St,
    pub actuator: A,
    pub sink: E,
    pub clock: C,
}

// ── Task bodies ──────────────────────────────────────────────

/// Acquisition clock: sample the reference and fan it out every period.
async fn reference_loop<S: VoltageSampler>(
    mut tracker: ReferenceTracker,
    sampler: Shared<S>,
    fabric: &NotificationFabric,
    period: Duration,
) {
    loop {
        tracker.tick(&mut *sampler.borrow_mut(), fabric);
        Timer::after(period).await;
    }
}

async fn channel_loop<S: VoltageSampler, St: StoragePort, E: EventSink>(
    mut processor: ChannelProcessor,
    sampler: Shared<S>,
    storage: Shared<St>,
    sink: Shared<E>,
    fabric: &NotificationFabric,
    publish_bound: Duration,
) {
    let index = processor.index();
    let (Some(inbox), Some(publisher)) = (fabric.inbox(index), fabric.publisher()) else {
        error!("ch{}: no inbox or bus publisher, task not started", index);
        return;
    };

    loop {
        let notice = inbox.receive().await;
        let output = processor.handle(
            notice,
            &mut *sampler.borrow_mut(),
            &mut *storage.borrow_mut(),
        );
        match output {
            Some(ChannelOutput::Changed(ev)) => {
                fabric.publish_bounded(&publisher, ev, publish_bound).await;
            }
            Some(ChannelOutput::Calibrated { channel, shift }) => {
                sink.borrow_mut()
                    .emit(&AppEvent::Calibrated { channel, shift });
            }
            None => {}
        }
    }
}

/// Relay controller: waits for pressure events or the armed watchdog,
/// whichever comes first.
async fn relay_loop<A: ActuatorPort, E: EventSink, C: Clock>(
    mut controller: RelayController,
    mut actuator: A,
    sink: Shared<E>,
    clock: C,
    fabric: &NotificationFabric,
    startup_delay: Duration,
) {
    Timer::after(startup_delay).await;
    let Some(mut subscriber) = fabric.subscriber() else {
        error!("relay: no bus subscriber slot, task not started");
        return;
    };
    let channel = controller.monitored_channel();
    info!("relay: watching ch{}", channel);

    // Changes published during the delay never reached us; start from the
    // board's current value so a pressure that has already settled counts.
    let seed = RelayInput::Pressure(PressureEvent {
        channel,
        pressure: fabric.get_pressure(channel),
    });
    let now = clock.now_ms();
    if let Some(state) = controller.handle(seed, now, &mut actuator, &mut *sink.borrow_mut()) {
        fabric.record_relay_state(state);
    }

    loop {
        let now = clock.now_ms();
        let input = match controller.next_deadline_ms() {
            Some(deadline) if deadline <= now => controller.due_timer(now).map(RelayInput::TimerFired),
            Some(deadline) => {
                let wait = Duration::from_millis(deadline - now);
                futures_lite::future::or(
                    async { Some(RelayInput::Pressure(subscriber.next_message_pure().await)) },
                    async {
                        Timer::after(wait).await;
                        None
                    },
                )
                .await
            }
            None => Some(RelayInput::Pressure(subscriber.next_message_pure().await)),
        };

        // `None`: the watchdog wait elapsed; the next pass fires it.
        let Some(input) = input else { continue };
        let switched = controller.handle(input, clock.now_ms(), &mut actuator, &mut *sink.borrow_mut());
        if let Some(state) = switched {
            fabric.record_relay_state(state);
        }
    }
}

/// Display / telemetry consumer.
async fn monitor_loop<E: EventSink>(sink: Shared<E>, fabric: &NotificationFabric) {
    let Some(mut subscriber) = fabric.subscriber() else {
        error!("monitor: no bus subscriber slot, task not started");
        return;
    };
    loop {
        match subscriber.next_message().await {
            WaitResult::Message(ev) => sink.borrow_mut().emit(&AppEvent::PressureChanged(ev)),
            WaitResult::Lagged(missed) => warn!("monitor: lagged, {} events missed", missed),
        }
    }
}

// ── Wiring ───────────────────────────────────────────────────

/// Register channels and spawn every task onto `executor`.
pub fn spawn<'a, S, St, A, E, C>(
    executor: &LocalExecutor<'a, TASK_SLOTS>,
    cfg: &SystemConfig,
    manager: AcquisitionManager,
    ports: Ports<S, St, A, E, C>,
    fabric: &'a NotificationFabric,
) where
    S: VoltageSampler + 'a,
    St: StoragePort + 'a,
    A: ActuatorPort + 'a,
    E: EventSink + 'a,
    C: Clock + 'a,
{
    manager.register(fabric);
    let (tracker, processors) = manager.into_parts();
    let channels = processors.len() as u8;

    let sampler = Rc::new(RefCell::new(ports.sampler));
    let storage = Rc::new(RefCell::new(ports.storage));
    let sink = Rc::new(RefCell::new(ports.sink));
    let bound = Duration::from_millis(cfg.publish_timeout_ms as u64);

    executor.spawn(monitor_loop(sink.clone(), fabric)).detach();
    executor
        .spawn(relay_loop(
            RelayController::new(cfg.relay),
            ports.actuator,
            sink.clone(),
            ports.clock,
            fabric,
            Duration::from_millis(cfg.relay.startup_delay_ms as u64),
        ))
        .detach();
    for processor in processors {
        executor
            .spawn(channel_loop(
                processor,
                sampler.clone(),
                storage.clone(),
                sink.clone(),
                fabric,
                bound,
            ))
            .detach();
    }
    executor
        .spawn(reference_loop(
            tracker,
            sampler,
            fabric,
            Duration::from_millis(cfg.cycle_period_ms as u64),
        ))
        .detach();

    sink.borrow_mut().emit(&AppEvent::Started { channels });
}

/// Spawn everything and drive the executor forever.
pub fn run<S, St, A, E, C>(
    cfg: &SystemConfig,
    manager: AcquisitionManager,
    ports: Ports<S, St, A, E, C>,
    fabric: &NotificationFabric,
) where
    S: VoltageSampler,
    St: StoragePort,
    A: ActuatorPort,
    E: EventSink,
    C: Clock,
{
    let executor: LocalExecutor<'_, TASK_SLOTS> = LocalExecutor::new();
    spawn(&executor, cfg, manager, ports, fabric);
    info!("tasks: started, cycle {} ms", cfg.cycle_period_ms);

    // The reactor behind `block_on` drives the timers; the executor
    // drives the tasks.
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}
