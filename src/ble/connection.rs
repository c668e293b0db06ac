//! Connection owner.
//!
//! `Connection` owns the [`GattLink`] and is the only thing that changes
//! [`ConnectionState`]. Host callbacks enter through [`Connection::notify`]
//! and are applied in order by [`Connection::run`], which must be polled
//! for as long as the connection is in use (spawn it next to the app's
//! other tasks).

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_sync::watch::{Receiver, Watch};
use embassy_time::with_timeout;

use super::machine::{self, Effect, Step};
use super::{
    BdAddr, CharacteristicRef, Completion, ConnectionState, GattLink, Generation, LinkEvent,
    ReadyGate, TaggedEvent,
};
use crate::config::{SessionConfig, BLE_EVENT_QUEUE_DEPTH, STATE_OBSERVERS};
use crate::error::{Error, FailureReason};
use crate::params::{ParamId, SERVICE_UUID};

/// What the in-flight GATT op is told when it wakes.
#[derive(Debug)]
pub(super) enum OpOutcome {
    Done(Completion),
    Aborted(Error),
}

#[derive(Clone, Copy)]
struct Status {
    state: ConnectionState,
    target: BdAddr,
}

pub struct Connection<M: RawMutex, L: GattLink> {
    link: BlockingMutex<M, RefCell<L>>,
    events: Channel<M, TaggedEvent, BLE_EVENT_QUEUE_DEPTH>,
    status: BlockingMutex<M, Cell<Status>>,
    watch: Watch<M, ConnectionState, STATE_OBSERVERS>,
    pub(super) gate: ReadyGate<M>,
    /// Held for the whole of one read/write.
    pub(super) io: Mutex<M, ()>,
    pub(super) op: Signal<M, OpOutcome>,
    config: SessionConfig,
}

impl<M: RawMutex, L: GattLink> Connection<M, L> {
    pub fn new(link: L, config: SessionConfig) -> Self {
        let conn = Self {
            link: BlockingMutex::new(RefCell::new(link)),
            events: Channel::new(),
            status: BlockingMutex::new(Cell::new(Status {
                state: ConnectionState::Disconnected,
                target: BdAddr::default(),
            })),
            watch: Watch::new(),
            gate: ReadyGate::new(),
            io: Mutex::new(()),
            op: Signal::new(),
            config,
        };
        conn.watch.sender().send(ConnectionState::Disconnected);
        conn
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.status.lock(|s| s.get().state)
    }

    /// Observe state changes. `None` once `STATE_OBSERVERS` receivers exist.
    pub fn subscribe(&self) -> Option<Receiver<'_, M, ConnectionState, STATE_OBSERVERS>> {
        self.watch.receiver()
    }

    /// Feed a host-stack callback. Safe to call from any context that can
    /// take the raw mutex; never blocks.
    pub fn notify(&self, generation: Generation, event: LinkEvent) {
        if self
            .events
            .try_send(TaggedEvent { generation, event })
            .is_err()
        {
            log_warn!("Link event queue full, dropping event (gen {})", generation);
        }
    }

    /// Connect to `addr` and wait until services are discovered.
    ///
    /// Any previous attempt is torn down first; its waiters get
    /// `Cancelled`. Fails with the discovery status, a link error,
    /// `Cancelled` if the link drops or `disconnect()` is called, or
    /// `Timeout` once `connect_timeout` elapses.
    pub async fn connect(&self, addr: BdAddr) -> Result<(), Error> {
        if matches!(
            self.state(),
            ConnectionState::Connecting | ConnectionState::Connected(_)
        ) {
            log_info!("Tearing down previous connection");
            self.close_link(true);
        }

        let generation = self.gate.begin();
        self.op.signal(OpOutcome::Aborted(Error::Cancelled));
        self.status.lock(|s| {
            s.set(Status {
                state: s.get().state,
                target: addr,
            })
        });
        self.set_state(ConnectionState::Connecting);
        log_info!("Connecting to {} (gen {})", addr, generation);

        if let Err(e) = self
            .link
            .lock(|l| l.borrow_mut().connect(addr, generation))
        {
            log_error!("Connect to {} refused: {}", addr, e);
            self.gate.fail(generation, e.into());
            self.set_state(ConnectionState::Failed(FailureReason::Link(e)));
            return Err(e.into());
        }

        let ready = self.gate.wait(generation);
        let Some(limit) = self.config.connect_timeout else {
            return ready.await;
        };

        match with_timeout(limit, ready).await {
            Ok(result) => result,
            Err(_) => {
                // Only tear down if nobody started a newer attempt meanwhile.
                if self.gate.fail(generation, Error::Timeout) {
                    log_warn!("Connect to {} timed out", addr);
                    self.op.signal(OpOutcome::Aborted(Error::Cancelled));
                    self.close_link(true);
                    self.set_state(ConnectionState::Failed(FailureReason::Timeout));
                }
                Err(Error::Timeout)
            }
        }
    }

    /// Drop the link and cancel every waiter.
    pub fn disconnect(&self) {
        log_info!("Disconnecting");
        self.close_link(true);
        self.gate.retire();
        self.op.signal(OpOutcome::Aborted(Error::Cancelled));
        self.set_state(ConnectionState::Disconnected);
    }

    /// Apply queued link events forever.
    pub async fn run(&self) -> ! {
        loop {
            let TaggedEvent { generation, event } = self.events.receive().await;
            if generation != self.gate.current() {
                log_debug!(
                    "Dropping '{}' from stale generation {}",
                    event.name(),
                    generation
                );
                continue;
            }
            self.apply(generation, event);
        }
    }

    fn apply(&self, generation: Generation, event: LinkEvent) {
        let Status { state, target } = self.status.lock(|s| s.get());
        let Step { next, effect } = machine::step(state, &event, target);

        if let LinkEvent::MtuChanged { mtu, status } = event {
            log_info!("MTU is now {} (status {})", mtu, status);
        }
        self.set_state(next);

        match effect {
            Effect::None => {}
            Effect::DiscoverServices => {
                log_info!("Link up, discovering services");
                if let Err(e) = self.link.lock(|l| l.borrow_mut().discover_services()) {
                    log_error!("Service discovery refused: {}", e);
                    self.fail(generation, FailureReason::Link(e));
                }
            }
            Effect::ServicesReady => {
                self.gate.open(generation);
                log_info!("Services ready on {}", target);
                // Best-effort.
                if let Err(e) = self
                    .link
                    .lock(|l| l.borrow_mut().request_mtu(self.config.mtu))
                {
                    log_warn!("MTU request refused: {}", e);
                }
            }
            Effect::LinkLost => {
                log_info!("Link lost");
                self.gate.retire();
                self.op.signal(OpOutcome::Aborted(Error::Cancelled));
                self.close_link(false);
            }
            Effect::Fail(reason) => {
                log_error!("Connection failed: {}", reason);
                self.gate.fail(generation, reason.error());
                self.op.signal(OpOutcome::Aborted(Error::Cancelled));
                self.close_link(true);
            }
            Effect::Deliver => {
                if let Some(completion) = event.into_completion() {
                    self.op.signal(OpOutcome::Done(completion));
                }
            }
        }
    }

    /// Drop the link after a GATT op of `generation` went unanswered.
    /// Later ops get `Link(NotConnected)` instead of queuing behind it.
    pub(super) fn abandon(&self, generation: Generation) {
        if self.gate.current() != generation {
            return;
        }
        log_error!("GATT op unanswered, dropping link (gen {})", generation);
        self.gate.retire();
        self.close_link(true);
        self.set_state(ConnectionState::Failed(FailureReason::Timeout));
    }

    /// Fail outside the reducer (host refused a step).
    fn fail(&self, generation: Generation, reason: FailureReason) {
        self.gate.fail(generation, reason.error());
        self.op.signal(OpOutcome::Aborted(Error::Cancelled));
        self.close_link(true);
        self.set_state(ConnectionState::Failed(reason));
    }

    fn close_link(&self, disconnect: bool) {
        self.link.lock(|l| {
            let mut link = l.borrow_mut();
            if disconnect {
                link.disconnect();
            }
            link.close();
        });
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = self.status.lock(|s| {
            let mut status = s.get();
            let changed = status.state != next;
            status.state = next;
            s.set(status);
            changed
        });
        if changed {
            log_debug!("State -> {}", next);
            self.watch.sender().send(next);
        }
    }

    /// Find `id` in the discovered tree: primary service first, then any
    /// other service exposing the same UUID.
    pub(super) fn locate(&self, id: ParamId) -> Result<CharacteristicRef, Error> {
        let uuid = id.uuid();
        self.link.lock(|l| {
            let link = l.borrow();
            let services = link.services();
            services
                .iter()
                .filter(|s| s.uuid == SERVICE_UUID)
                .chain(services.iter().filter(|s| s.uuid != SERVICE_UUID))
                .find(|s| s.characteristics.contains(&uuid))
                .map(|s| CharacteristicRef {
                    service: s.uuid,
                    characteristic: uuid,
                })
                .ok_or(Error::NotFound(id))
        })
    }

    /// Run `f` against the link.
    pub(super) fn with_link<R>(&self, f: impl FnOnce(&mut L) -> R) -> R {
        self.link.lock(|l| f(&mut l.borrow_mut()))
    }
}
