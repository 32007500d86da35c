// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io, time::Duration};

use crossterm::{event::{self, Event},
                terminal};

use crate::DEFAULT_TERMINAL_SIZE;

/// The result of polling an [`InputSource`] once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPoll {
    /// An event is ready.
    Event(Event),
    /// Nothing arrived before the timeout expired.
    Idle,
    /// The source is closed and will never produce another event.
    Closed,
}

/// Something that produces terminal input events without blocking for longer than the
/// timeout it is given. This is the seam that allows the [`crate::ReadlineBuffer`] to be
/// driven by a real terminal ([`CrosstermInputSource`]) or by a scripted mock in tests
/// ([`crate::MockInputSource`]).
pub trait InputSource {
    /// Wait at most `timeout` for the next event.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails in a way that isn't end of input.
    fn poll_input(&mut self, timeout: Duration) -> io::Result<InputPoll>;

    /// Switch the terminal in or out of raw mode (no echo, no line buffering).
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal mode can't be changed.
    fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()>;

    /// Columns and rows of the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the size can't be queried.
    fn terminal_size(&self) -> io::Result<(u16, u16)>;
}

pub type SendInputSource = dyn InputSource + Send;

/// This struct represents an input device that can be used to read from the terminal. See
/// [`crate::InputDeviceExtMock`] for testing features.
#[allow(missing_debug_implementations)]
pub struct InputDevice {
    pub resource: Box<SendInputSource>,
    pub is_mock: bool,
}

impl InputDevice {
    #[must_use]
    pub fn new_crossterm() -> InputDevice {
        InputDevice {
            resource: Box::new(CrosstermInputSource::default()),
            is_mock: false,
        }
    }

    pub fn new_from(source: impl InputSource + Send + 'static) -> InputDevice {
        InputDevice {
            resource: Box::new(source),
            is_mock: false,
        }
    }
}

impl InputDevice {
    /// # Errors
    ///
    /// Returns an error if the underlying [`InputSource`] fails.
    pub fn poll_input(&mut self, timeout: Duration) -> io::Result<InputPoll> {
        self.resource.poll_input(timeout)
    }

    /// # Errors
    ///
    /// Returns an error if the underlying [`InputSource`] fails.
    pub fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()> {
        self.resource.set_raw_mode(enabled)
    }

    /// Falls back to [`DEFAULT_TERMINAL_SIZE`] when the size can't be queried, eg: when
    /// running in CI without a terminal.
    #[must_use]
    pub fn terminal_size_or_default(&self) -> (u16, u16) {
        match self.resource.terminal_size() {
            Ok((0, _) | (_, 0)) | Err(_) => DEFAULT_TERMINAL_SIZE,
            Ok(size) => size,
        }
    }
}

/// Reads events from the process' terminal using [`crossterm::event`].
#[derive(Debug, Default)]
pub struct CrosstermInputSource {
    is_raw_mode: bool,
}

impl InputSource for CrosstermInputSource {
    fn poll_input(&mut self, timeout: Duration) -> io::Result<InputPoll> {
        if !event::poll(timeout)? {
            return Ok(InputPoll::Idle);
        }
        match event::read() {
            Ok(event) => Ok(InputPoll::Event(event)),
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                Ok(InputPoll::Closed)
            }
            Err(error) => Err(error),
        }
    }

    fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()> {
        if enabled == self.is_raw_mode {
            return Ok(());
        }
        if enabled {
            terminal::enable_raw_mode()?;
        } else {
            terminal::disable_raw_mode()?;
        }
        self.is_raw_mode = enabled;
        Ok(())
    }

    fn terminal_size(&self) -> io::Result<(u16, u16)> { terminal::size() }
}

impl Drop for CrosstermInputSource {
    fn drop(&mut self) {
        if self.is_raw_mode {
            // We don't care about the result of this operation.
            terminal::disable_raw_mode().ok();
        }
    }
}
