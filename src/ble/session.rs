//! Typed, serialized parameter I/O.
//!
//! A `DeviceSession` borrows a [`Connection`]; any number of sessions (or
//! clones of one) can share it, and the connection's I/O lock keeps at
//! most one GATT operation in flight.

use alloc::vec::Vec;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::with_timeout;
use uuid::Uuid;

use super::connection::OpOutcome;
use super::machine::GATT_SUCCESS;
use super::{Completion, Connection, GattLink, OpKind};
use crate::config::LED_COUNT;
use crate::error::Error;
use crate::params::{self, codec, Color, ColorSlot, Param, ParamId, Rgb888};
use crate::settings::{self, VisualizerSettings};

enum Request<'b> {
    Read,
    Write(&'b [u8]),
}

impl Request<'_> {
    fn kind(&self) -> OpKind {
        match self {
            Request::Read => OpKind::Read,
            Request::Write(_) => OpKind::Write,
        }
    }
}

pub struct DeviceSession<'a, M: RawMutex, L: GattLink> {
    conn: &'a Connection<M, L>,
}

impl<M: RawMutex, L: GattLink> Clone for DeviceSession<'_, M, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, L: GattLink> Copy for DeviceSession<'_, M, L> {}

impl<'a, M: RawMutex, L: GattLink> DeviceSession<'a, M, L> {
    pub fn new(conn: &'a Connection<M, L>) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'a Connection<M, L> {
        self.conn
    }

    /// Read and decode `param`.
    pub async fn read<P: Param>(&self, param: P) -> Result<P::Value, Error> {
        let bytes = self.transfer(param.id(), Request::Read).await?;
        codec::decode(param, &bytes)
    }

    /// Encode and write `value` to `param`.
    pub async fn write<P: Param>(&self, param: P, value: &P::Value) -> Result<(), Error> {
        let bytes = codec::encode(param, value)?;
        self.transfer(param.id(), Request::Write(&bytes)).await?;
        Ok(())
    }

    async fn transfer(&self, id: ParamId, request: Request<'_>) -> Result<Vec<u8>, Error> {
        let conn = self.conn;
        let kind = request.kind();

        let generation = conn.gate.current();
        conn.gate.wait(generation).await?;

        let _io = conn.io.lock().await;
        conn.op.reset();

        // The link may have dropped or been replaced while we queued.
        if !conn.state().is_connected() || conn.gate.current() != generation {
            return Err(Error::Cancelled);
        }

        let target = conn.locate(id)?;
        conn.with_link(|link| match request {
            Request::Read => link.read(&target),
            Request::Write(bytes) => link.write(&target, bytes),
        })?;
        log_debug!("GATT {} {} started", kind, id);

        let completion = match conn.config().op_timeout {
            Some(limit) => {
                match with_timeout(limit, self.completion(kind, target.characteristic)).await {
                    Ok(completion) => completion?,
                    Err(_) => {
                        // The host still owns the stalled op.
                        log_warn!("GATT {} {} timed out", kind, id);
                        conn.abandon(generation);
                        return Err(Error::Timeout);
                    }
                }
            }
            None => self.completion(kind, target.characteristic).await?,
        };

        if completion.status != GATT_SUCCESS {
            log_warn!("GATT {} {} failed (status {})", kind, id, completion.status);
            return Err(Error::Device(completion.status));
        }
        Ok(completion.value)
    }

    /// Wait for the completion of the op just issued.
    async fn completion(&self, kind: OpKind, characteristic: Uuid) -> Result<Completion, Error> {
        loop {
            match self.conn.op.wait().await {
                OpOutcome::Aborted(e) => return Err(e),
                OpOutcome::Done(c) if c.matches(kind, &characteristic) => return Ok(c),
                OpOutcome::Done(c) => {
                    log_warn!("Discarding stale {} completion", c.kind);
                }
            }
        }
    }

    // Composite operations

    /// Read every writable setting.
    pub async fn read_settings(&self) -> Result<VisualizerSettings, Error> {
        Ok(VisualizerSettings {
            smooth_size: self.read(params::SmoothSize).await?,
            gain: self.read(params::Gain).await?,
            fps: self.read(params::Fps).await?,
            colors: [
                self.read(Color(ColorSlot::One)).await?,
                self.read(Color(ColorSlot::Two)).await?,
                self.read(Color(ColorSlot::Three)).await?,
            ],
            fft_size: self.read(params::FftSize).await?,
            frequencies: self.read(params::Frequencies).await?,
            gains: self.read(params::Gains).await?,
            skew: self.read(params::Skew).await?,
            brightness: self.read(params::Brightness).await?,
            display_mode: self.read(params::Display).await?,
            animation_mode: self.read(params::Animation).await?,
        })
    }

    /// Write every setting, in registry order. Stops at the first error.
    pub async fn write_settings(&self, s: &VisualizerSettings) -> Result<(), Error> {
        self.write(params::SmoothSize, &s.smooth_size).await?;
        self.write(params::Gain, &s.gain).await?;
        self.write(params::Fps, &s.fps).await?;
        for (slot, color) in ColorSlot::ALL.into_iter().zip(s.colors.iter()) {
            self.write(Color(slot), color).await?;
        }
        self.write(params::FftSize, &s.fft_size).await?;
        self.write(params::Frequencies, &s.frequencies).await?;
        self.write(params::Gains, &s.gains).await?;
        self.write(params::Skew, &s.skew).await?;
        self.write(params::Brightness, &s.brightness).await?;
        self.write(params::Display, &s.display_mode).await?;
        self.write(params::Animation, &s.animation_mode).await
    }

    /// Read both framebuffer halves as `LED_COUNT` pixels.
    pub async fn read_led_frame(&self) -> Result<Vec<Rgb888>, Error> {
        let first = self.read(params::LedsBuffer).await?;
        let second = self.read(params::LedsBuffer2).await?;
        let frame = settings::led_frame(&first, &second)?;
        debug_assert_eq!(frame.len(), LED_COUNT);
        Ok(frame)
    }
}
