// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::{self, Write},
          sync::{Arc, MutexGuard}};

use crate::{OutputDevice, StdMutex, lock_or_recover, lock_output_device_as_mut, ok};

/// The process' text output sink. It is a cloneable slot that holds the
/// [`OutputDevice`] that plain text should currently go to.
///
/// - Normally the slot holds the real terminal (see [`Self::new_stdout()`]).
/// - While a [`crate::ReadlineBuffer`] is running, the slot holds a
///   [`crate::OutputInterceptor`] instead, which keeps the prompt intact.
///
/// All clones share the same slot, so swapping the device is seen by every
/// [`ConsoleWriter`] in the process immediately.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct ConsoleOutput {
    pub safe_slot: Arc<StdMutex<OutputDevice>>,
}

impl ConsoleOutput {
    #[must_use]
    pub fn new(device: OutputDevice) -> Self {
        Self {
            safe_slot: Arc::new(StdMutex::new(device)),
        }
    }

    #[must_use]
    pub fn new_stdout() -> Self { Self::new(OutputDevice::new_stdout()) }

    /// The device that is in the slot right now.
    #[must_use]
    pub fn current(&self) -> OutputDevice { lock_or_recover!(self.safe_slot).clone() }

    /// Put `device` in the slot and return whatever was there before.
    #[must_use]
    pub fn replace(&self, device: OutputDevice) -> OutputDevice {
        std::mem::replace(&mut *self.lock(), device)
    }

    /// Hold the slot. No [`ConsoleWriter`] can emit anything, and nobody can swap the
    /// device, until the guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, OutputDevice> { lock_or_recover!(self.safe_slot) }

    /// Get a new writer that sends its output to this slot.
    #[must_use]
    pub fn writer(&self) -> ConsoleWriter {
        ConsoleWriter {
            buffer: Vec::new(),
            console: self.clone(),
        }
    }
}

/// Implements [`Write`] on top of a [`ConsoleOutput`]. Each writer has its own buffer,
/// which is handed to the device in the slot (and that device is flushed) when:
/// 1. the buffer ends with a newline,
/// 2. [`Write::flush()`] is called,
/// 3. the writer is dropped.
///
/// The write and flush happen while the slot is held, so output from one writer is never
/// split across a device swap. The buffer is handed off once: if the device fails, the
/// error is returned and those bytes are not sent again.
#[allow(missing_debug_implementations)]
pub struct ConsoleWriter {
    pub buffer: Vec<u8>,
    console: ConsoleOutput,
}

impl Clone for ConsoleWriter {
    /// Each clone gets its own (empty) buffer, and shares the slot.
    fn clone(&self) -> Self { self.console.writer() }
}

impl ConsoleWriter {
    fn forward(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return ok!();
        }
        let data = std::mem::take(&mut self.buffer);
        let slot = self.console.lock();
        let term = lock_output_device_as_mut!(slot);
        term.write_all(&data)?;
        term.flush()?;
        ok!()
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(payload);
        if self.buffer.ends_with(b"\n") {
            self.forward()?;
        }
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> { self.forward() }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        // We don't care about the result of this operation.
        self.forward().ok();
    }
}
