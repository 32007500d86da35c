// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::{Arc, MutexGuard};

use crate::{SafeRawTerminal, SendRawTerminal, StdMutex, lock_or_recover};

pub type LockedOutputDevice<'a> = &'a mut dyn std::io::Write;

/// Macro to simplify locking and getting a mutable reference to the output device.
/// Don't call this again in the same scope, it will deadlock! A safe approach is
/// to use this macro in a separate block scope.
///
/// Usage example:
/// ```
/// use r3bl_readline_mux::{lock_output_device_as_mut, OutputDevice, LockedOutputDevice};
/// let device = OutputDevice::new_stdout();
/// { // Start a new block scope to avoid deadlock.
///     let mut_ref: LockedOutputDevice<'_> = lock_output_device_as_mut!(device);
///     let _ = mut_ref.write_all(b"Hello, world!\n");
/// } // The lock is released here.
/// ```
#[macro_export]
macro_rules! lock_output_device_as_mut {
    ($device:expr) => {
        &mut *$device.lock()
    };
}

/// This struct represents an output device that can be used to write to the terminal.
/// - It is safe to clone. Clones share the same underlying resource.
/// - To write to it, see [`Self::lock()`] or the [`lock_output_device_as_mut`] macro.
///
/// The [`crate::ConsoleOutput`] slot holds one of these. So does the
/// [`crate::ReadlineBuffer`], which renders the prompt to the device it captured in
/// [`crate::ReadlineBuffer::start()`].
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct OutputDevice {
    pub resource: SafeRawTerminal,
    pub is_mock: bool,
}

impl Default for OutputDevice {
    fn default() -> Self { Self::new_stdout() }
}

impl OutputDevice {
    #[must_use]
    pub fn new_stdout() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(std::io::stdout())),
            is_mock: false,
        }
    }

    #[must_use]
    pub fn new_stderr() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(std::io::stderr())),
            is_mock: false,
        }
    }

    /// Wrap any [`std::io::Write`] implementation. This is how the
    /// [`crate::OutputInterceptor`] is installed into the [`crate::ConsoleOutput`] slot.
    pub fn new_from(writer: impl std::io::Write + Send + 'static) -> Self {
        Self {
            resource: Arc::new(StdMutex::new(writer)),
            is_mock: false,
        }
    }
}

impl OutputDevice {
    /// Locks the output device for writing. To use it, use the following code:
    ///
    /// ```
    /// use r3bl_readline_mux::{OutputDevice, LockedOutputDevice};
    ///
    /// let device = OutputDevice::new_stdout();
    /// let mut_ref: LockedOutputDevice<'_> = &mut *device.lock();
    /// let _ = mut_ref.write_all(b"Hello, world!\n");
    /// ```
    ///
    /// If some other thread panicked while holding the lock, the lock is recovered
    /// rather than propagating the panic.
    pub fn lock(&self) -> MutexGuard<'_, SendRawTerminal> {
        lock_or_recover!(self.resource)
    }

    /// Two devices are the same if they share the same underlying resource.
    #[must_use]
    pub fn is_same_device(&self, other: &OutputDevice) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}
