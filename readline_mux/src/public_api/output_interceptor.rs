// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::{self, Write};

use crate::{OutputDevice, ReadlineError, SafeReadlineState, lock_or_recover,
            lock_output_device_as_mut, ok};

/// Sits in the [`crate::ConsoleOutput`] slot while the [`crate::ReadlineBuffer`] is
/// running. Other threads' text accumulates here, and on [`Write::flush()`] it is
/// printed above the prompt:
/// 1. Take the editor lock, so no key press can be rendered in the middle of this.
/// 2. Erase the prompt line (if anything is drawn).
/// 3. Emit the pending bytes to the original device, in order. Newlines also return the
///    carriage since the terminal is in raw mode, and a missing trailing newline is
///    added so the prompt starts on its own line.
/// 4. Redraw the prompt and the edit buffer, then release the lock.
///
/// When the editor isn't running (eg: it was stopped while a writer still held a clone
/// of this device) the pending bytes go straight to the original device.
///
/// Pending bytes are handed off once. If writing them fails the error is returned and
/// they are not retried, so a partial write is never repeated.
#[allow(missing_debug_implementations)]
pub struct OutputInterceptor {
    pub pending: Vec<u8>,
    pub original: OutputDevice,
    pub safe_state: SafeReadlineState,
}

impl OutputInterceptor {
    #[must_use]
    pub fn new(original: OutputDevice, safe_state: SafeReadlineState) -> Self {
        Self {
            pending: Vec::new(),
            original,
            safe_state,
        }
    }

    fn drain_pending(&mut self) -> Result<(), ReadlineError> {
        if self.pending.is_empty() {
            return ok!();
        }

        let data = std::mem::take(&mut self.pending);
        let mut state = lock_or_recover!(self.safe_state);
        let term = lock_output_device_as_mut!(self.original);

        if state.editor_state.output_redirect_active {
            state.line_state.print_data_and_flush(&data, term)?;
        } else {
            term.write_all(&data)?;
            term.flush()?;
        }

        ok!()
    }
}

impl Write for OutputInterceptor {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(payload);
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(self.drain_pending()?) }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{MOCK_TERMINAL_SIZE, OutputDeviceExt, ReadlineConfig, ReadlineState,
                StdMutex};

    fn new_interceptor(prompt: &str, running: bool) -> (OutputInterceptor, crate::StdoutMock) {
        let (original, stdout_mock) = OutputDevice::new_mock();
        let mut state = ReadlineState::new(ReadlineConfig::default(), MOCK_TERMINAL_SIZE);
        state.editor_state.running = running;
        state.editor_state.output_redirect_active = running;
        state.line_state.prompt = prompt.to_string();
        state.line_state.move_cursor(0);
        let safe_state = Arc::new(StdMutex::new(state));
        (OutputInterceptor::new(original, safe_state), stdout_mock)
    }

    #[test]
    fn test_write_is_held_until_flush() {
        let (mut interceptor, stdout_mock) = new_interceptor("> ", true);

        interceptor.write_all(b"hello\n").unwrap();
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "");
        assert_eq!(interceptor.pending, b"hello\n");

        interceptor.flush().unwrap();
        assert!(interceptor.pending.is_empty());
        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string_strip_ansi(),
            "hello\n> "
        );
    }

    #[test]
    fn test_flush_with_nothing_pending_is_noop() {
        let (mut interceptor, stdout_mock) = new_interceptor("> ", true);
        interceptor.flush().unwrap();
        assert!(stdout_mock.get_copy_of_buffer().is_empty());
    }

    #[test]
    fn test_edit_buffer_survives_output() {
        let (mut interceptor, stdout_mock) = new_interceptor("> ", true);
        {
            let mut state = interceptor.safe_state.lock().unwrap();
            state.line_state.line = "half typed".into();
            state.line_state.move_cursor(100_000);
        }

        interceptor.write_all(b"tick\n").unwrap();
        interceptor.flush().unwrap();

        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string_strip_ansi(),
            "tick\n> half typed"
        );
        let state = interceptor.safe_state.lock().unwrap();
        assert_eq!(state.line_state.line, "half typed");
        assert_eq!(state.line_state.current_column, 12);
    }

    #[test]
    fn test_not_running_writes_straight_through() {
        let (mut interceptor, stdout_mock) = new_interceptor("> ", false);

        interceptor.write_all(b"plain").unwrap();
        interceptor.flush().unwrap();

        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "plain");
    }

    struct BrokenPipeWriter;

    impl Write for BrokenPipeWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn test_failed_flush_drops_pending_bytes() {
        let state = ReadlineState::new(ReadlineConfig::default(), MOCK_TERMINAL_SIZE);
        let safe_state = Arc::new(StdMutex::new(state));
        let mut interceptor =
            OutputInterceptor::new(OutputDevice::new_from(BrokenPipeWriter), safe_state);

        interceptor.write_all(b"lost\n").unwrap();
        assert!(interceptor.flush().is_err());
        assert!(interceptor.pending.is_empty());

        let (original, stdout_mock) = OutputDevice::new_mock();
        interceptor.original = original;
        interceptor.write_all(b"next\n").unwrap();
        interceptor.flush().unwrap();
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "next\n");
    }
}
