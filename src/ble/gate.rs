//! Services-ready gate.
//!
//! A one-shot per connection attempt. `begin()` starts a new generation;
//! the gate then resolves at most once for that generation, either
//! `open` (services discovered) or `fail`. Tasks waiting on an older
//! generation are woken and get [`Error::Cancelled`], so a new
//! `connect()` can never hand a stale waiter the wrong outcome.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

use super::Generation;
use crate::config::READY_WAITERS;
use crate::error::{Error, LinkError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Pending,
    Ready,
    Failed(Error),
}

struct Inner {
    generation: Generation,
    status: Status,
    waiters: MultiWakerRegistration<READY_WAITERS>,
}

impl Inner {
    fn settle(&mut self, status: Status) {
        self.status = status;
        self.waiters.wake();
    }
}

pub struct ReadyGate<M: RawMutex> {
    inner: Mutex<M, RefCell<Inner>>,
}

impl<M: RawMutex> ReadyGate<M> {
    /// Closed gate; waiters get `Link(NotConnected)` until the first `begin()`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                generation: 0,
                status: Status::Failed(Error::Link(LinkError::NotConnected)),
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    pub fn current(&self) -> Generation {
        self.inner.lock(|i| i.borrow().generation)
    }

    /// Start a new generation in the pending state.
    pub fn begin(&self) -> Generation {
        self.inner.lock(|i| {
            let mut i = i.borrow_mut();
            i.generation = i.generation.wrapping_add(1);
            i.settle(Status::Pending);
            i.generation
        })
    }

    /// Leave the current generation without starting a new attempt.
    /// Current waiters are cancelled; later callers see `Link(NotConnected)`.
    pub fn retire(&self) {
        self.inner.lock(|i| {
            let mut i = i.borrow_mut();
            i.generation = i.generation.wrapping_add(1);
            i.settle(Status::Failed(Error::Link(LinkError::NotConnected)));
        })
    }

    /// Mark `generation` ready. Ignored if it is no longer current or
    /// already resolved.
    pub fn open(&self, generation: Generation) -> bool {
        self.resolve(generation, Status::Ready)
    }

    /// Fail `generation` with `error`. Ignored if it is no longer current
    /// or already resolved.
    pub fn fail(&self, generation: Generation, error: Error) -> bool {
        self.resolve(generation, Status::Failed(error))
    }

    fn resolve(&self, generation: Generation, status: Status) -> bool {
        self.inner.lock(|i| {
            let mut i = i.borrow_mut();
            if i.generation != generation || i.status != Status::Pending {
                return false;
            }
            i.settle(status);
            true
        })
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock(|i| i.borrow().status == Status::Ready)
    }

    /// Wait until `generation` resolves.
    pub async fn wait(&self, generation: Generation) -> Result<(), Error> {
        poll_fn(|cx| {
            self.inner.lock(|i| {
                let mut i = i.borrow_mut();
                if i.generation != generation {
                    return Poll::Ready(Err(Error::Cancelled));
                }
                match i.status {
                    Status::Ready => Poll::Ready(Ok(())),
                    Status::Failed(e) => Poll::Ready(Err(e)),
                    Status::Pending => {
                        let _ = i.waiters.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        })
        .await
    }
}

impl<M: RawMutex> Default for ReadyGate<M> {
    fn default() -> Self {
        Self::new()
    }
}
