//! Connection state machine.
//!
//! `step` is a pure function: it decides the next state and names the side
//! effect, and [`super::Connection`] carries the effect out. Keeping it pure
//! lets every transition be tested without a link.
//!
//! | From         | Event                       | Next                 | Effect            |
//! |--------------|-----------------------------|----------------------|-------------------|
//! | Connecting   | LinkUp                      | Connecting           | DiscoverServices  |
//! | Connecting   | LinkConnecting              | Connecting           | -                 |
//! | Connecting   | ServicesDiscovered(0)       | Connected(target)    | ServicesReady     |
//! | Connecting   | ServicesDiscovered(status)  | Failed(Discovery)    | Fail              |
//! | any          | LinkDown                    | Disconnected         | LinkLost          |
//! | any          | Unrecognized                | Failed(Unknown...)   | Fail              |
//! | !Connecting  | LinkUp / ServicesDiscovered | Failed(OutOfOrder)   | Fail              |
//! | any          | MtuChanged                  | unchanged            | -                 |
//! | any          | Read/WriteComplete          | unchanged            | Deliver           |

use super::{BdAddr, ConnectionState, LinkEvent};
use crate::error::FailureReason;

/// GATT success status.
pub const GATT_SUCCESS: u16 = 0;

/// Side effect requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    None,
    /// Link is up: start service discovery.
    DiscoverServices,
    /// Discovery succeeded: open the gate, then request the MTU.
    ServicesReady,
    /// Link gone: cancel waiters and the in-flight op, release the handle.
    LinkLost,
    /// Fail waiters and the in-flight op, disconnect and release the handle.
    Fail(FailureReason),
    /// Hand the GATT completion to the in-flight op.
    Deliver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub next: ConnectionState,
    pub effect: Effect,
}

impl Step {
    const fn stay(state: ConnectionState) -> Self {
        Step {
            next: state,
            effect: Effect::None,
        }
    }

    const fn fail(reason: FailureReason) -> Self {
        Step {
            next: ConnectionState::Failed(reason),
            effect: Effect::Fail(reason),
        }
    }
}

/// Apply `event` to `state`. `target` is the address passed to `connect()`.
pub fn step(state: ConnectionState, event: &LinkEvent, target: BdAddr) -> Step {
    use ConnectionState::*;

    match (state, event) {
        (_, LinkEvent::LinkDown { .. }) => Step {
            next: Disconnected,
            effect: Effect::LinkLost,
        },
        (_, LinkEvent::Unrecognized { state: code, status }) => {
            Step::fail(FailureReason::UnknownLinkState {
                state: *code,
                status: *status,
            })
        }
        (_, LinkEvent::MtuChanged { .. }) => Step::stay(state),
        (_, LinkEvent::ReadComplete { .. } | LinkEvent::WriteComplete { .. }) => Step {
            next: state,
            effect: Effect::Deliver,
        },

        (Connecting, LinkEvent::LinkUp) => Step {
            next: Connecting,
            effect: Effect::DiscoverServices,
        },
        (Connecting, LinkEvent::LinkConnecting) => Step::stay(Connecting),
        (Connecting, LinkEvent::ServicesDiscovered { status }) => {
            if *status == GATT_SUCCESS {
                Step {
                    next: Connected(target),
                    effect: Effect::ServicesReady,
                }
            } else {
                Step::fail(FailureReason::Discovery(*status))
            }
        }

        (
            _,
            LinkEvent::LinkUp | LinkEvent::LinkConnecting | LinkEvent::ServicesDiscovered { .. },
        ) => Step::fail(FailureReason::OutOfOrder(event.name())),
    }
}
