// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque, io, sync::Arc, time::Duration};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use crate::{InputDevice, InputPoll, InputSource, StdMutex, lock_or_recover};

/// Size reported by [`MockInputSource::terminal_size()`].
pub const MOCK_TERMINAL_SIZE: (u16, u16) = (100, 100);

#[derive(Debug, Default)]
pub struct MockInputQueue {
    pub events: VecDeque<Event>,
    /// Once the queue is drained, report [`InputPoll::Closed`] instead of
    /// [`InputPoll::Idle`].
    pub is_closed: bool,
    pub is_raw_mode: bool,
    pub raw_mode_toggle_count: usize,
}

/// An [`InputSource`] that replays a script of events. It never waits, the timeout
/// passed to [`InputSource::poll_input()`] is ignored.
#[derive(Debug, Clone, Default)]
pub struct MockInputSource {
    pub safe_queue: Arc<StdMutex<MockInputQueue>>,
}

impl InputSource for MockInputSource {
    fn poll_input(&mut self, _timeout: Duration) -> io::Result<InputPoll> {
        let mut queue = lock_or_recover!(self.safe_queue);
        Ok(match queue.events.pop_front() {
            Some(event) => InputPoll::Event(event),
            None if queue.is_closed => InputPoll::Closed,
            None => InputPoll::Idle,
        })
    }

    fn set_raw_mode(&mut self, enabled: bool) -> io::Result<()> {
        let mut queue = lock_or_recover!(self.safe_queue);
        queue.is_raw_mode = enabled;
        queue.raw_mode_toggle_count += 1;
        Ok(())
    }

    fn terminal_size(&self) -> io::Result<(u16, u16)> { Ok(MOCK_TERMINAL_SIZE) }
}

/// Lets a test feed more input to a [`MockInputSource`] after it has been moved into an
/// [`InputDevice`], possibly from another thread.
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    pub safe_queue: Arc<StdMutex<MockInputQueue>>,
}

impl MockInputHandle {
    pub fn push_event(&self, event: Event) {
        lock_or_recover!(self.safe_queue).events.push_back(event);
    }

    pub fn push_key(&self, code: KeyCode, modifiers: KeyModifiers) {
        self.push_event(key_event(code, modifiers));
    }

    /// Each char becomes a key press.
    pub fn push_str(&self, text: &str) {
        let mut queue = lock_or_recover!(self.safe_queue);
        queue
            .events
            .extend(text.chars().map(|ch| key_event(KeyCode::Char(ch), KeyModifiers::NONE)));
    }

    /// Type `text` and press <kbd>Enter</kbd>.
    pub fn push_line(&self, text: &str) {
        self.push_str(text);
        self.push_key(KeyCode::Enter, KeyModifiers::NONE);
    }

    /// Simulate the input stream going away, eg: stdin was closed.
    pub fn close(&self) { lock_or_recover!(self.safe_queue).is_closed = true; }

    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        lock_or_recover!(self.safe_queue).events.len()
    }

    #[must_use]
    pub fn is_raw_mode(&self) -> bool { lock_or_recover!(self.safe_queue).is_raw_mode }

    #[must_use]
    pub fn raw_mode_toggle_count(&self) -> usize {
        lock_or_recover!(self.safe_queue).raw_mode_toggle_count
    }
}

#[must_use]
pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
    Event::Key(KeyEvent::new(code, modifiers))
}

pub trait InputDeviceExtMock {
    fn new_mock(events: impl IntoIterator<Item = Event>) -> (InputDevice, MockInputHandle);
}

impl InputDeviceExtMock for InputDevice {
    fn new_mock(events: impl IntoIterator<Item = Event>) -> (InputDevice, MockInputHandle) {
        let source = MockInputSource::default();
        lock_or_recover!(source.safe_queue).events.extend(events);
        let handle = MockInputHandle {
            safe_queue: source.safe_queue.clone(),
        };
        let device = InputDevice {
            resource: Box::new(source),
            is_mock: true,
        };
        (device, handle)
    }
}
