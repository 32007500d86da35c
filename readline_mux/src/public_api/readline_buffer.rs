// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::ErrorKind,
          sync::Arc};

use crossterm::{QueueableCommand, cursor,
                terminal::{Clear, ClearType}};

use crate::{CommonResultWithError, ConsoleOutput, DEBUG_READLINE_MUX, InputDevice,
            InputPoll, LineStatus, OutputDevice, OutputInterceptor, PumpState,
            ReadlineConfig, ReadlineError, ReadlineState, SafeReadlineState, StdMutex,
            StepOutcome, SuspendReadline, apply_event, finalize_line, lock_or_recover,
            lock_output_device_as_mut, ok, visible_width};

/// # Mental model and overview
///
/// This is a replacement for a [`std::io::BufRead::read_line`] function that doesn't
/// block, and that lets other threads keep writing to the terminal while the user is
/// typing.
///
/// - There is no background thread. The host calls [`Self::get_line()`] in a loop from
///   its "console" thread. Each call waits at most [`ReadlineConfig::pump_timeout`] for a
///   key press, feeds it to the line editor, and returns a [`LineStatus`].
/// - Between [`Self::start()`] and [`Self::stop()`] the [`ConsoleOutput`] slot holds an
///   [`OutputInterceptor`], so that everything written through a
///   [`crate::ConsoleWriter`] is printed above the prompt, and the prompt is redrawn
///   below it.
///
/// # Locks
///
/// All the editor state lives behind one lock ([`SafeReadlineState`]). Key handling and
/// the interceptor's redraw both hold it while they touch the line or the terminal, so
/// they take turns. Locks are always acquired in this order:
/// 1. the [`ConsoleOutput`] slot,
/// 2. the interceptor device,
/// 3. the editor state,
/// 4. the original output device.
///
/// The input device has its own lock, which is taken last. [`Self::get_line()`] releases
/// the editor state while it waits for a key press, so other threads' output isn't held
/// up. An event that arrives after [`Self::stop()`] ran during that wait is parked, and
/// applied by the first [`Self::get_line()`] after the next [`Self::start()`].
///
/// # Lifecycle
///
/// [`Self::start()`] and [`Self::stop()`] are idempotent, and can be called any number of
/// times. The prompt that was set with [`Self::set_prompt()`] survives a restart.
/// Dropping the buffer stops it.
#[allow(missing_debug_implementations)]
pub struct ReadlineBuffer {
    pub console: ConsoleOutput,
    pub safe_state: SafeReadlineState,
    pub safe_input: Arc<StdMutex<InputDevice>>,
}

impl ReadlineBuffer {
    /// Nothing happens to the terminal until [`Self::start()`] is called.
    #[must_use]
    pub fn new(
        console: ConsoleOutput,
        /* move */ input_device: InputDevice,
        config: ReadlineConfig,
    ) -> Self {
        let term_size = input_device.terminal_size_or_default();
        let state = ReadlineState::new(config, term_size);
        Self {
            console,
            safe_state: Arc::new(StdMutex::new(state)),
            safe_input: Arc::new(StdMutex::new(input_device)),
        }
    }

    /// Put the terminal in raw mode, redirect the [`ConsoleOutput`] through an
    /// [`OutputInterceptor`], and draw the prompt. Does nothing if already running.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode can't be enabled, or the prompt can't be drawn.
    pub fn start(&self) -> CommonResultWithError<(), ReadlineError> {
        {
            let mut slot = self.console.lock();
            let mut state = lock_or_recover!(self.safe_state);
            if state.editor_state.running {
                return ok!();
            }

            let term_size = {
                let mut input_device = lock_or_recover!(self.safe_input);
                input_device.set_raw_mode(true)?;
                input_device.terminal_size_or_default()
            };

            let original = slot.clone();
            *slot = OutputDevice::new_from(OutputInterceptor::new(
                original.clone(),
                self.safe_state.clone(),
            ));

            let state = &mut *state;
            state.editor_state.running = true;
            state.editor_state.output_redirect_active = true;
            state.editor_state.input_exhausted = false;
            state.pump_state = PumpState::Idle;
            state.is_last_key_tab = false;
            state.history.set_max_size(state.config.history_max_size);
            state.maybe_original_output = Some(original.clone());

            let line_state = &mut state.line_state;
            line_state.term_size = term_size;
            line_state.line.clear();
            line_state.cluster_buffer.clear();
            line_state.last_line_completed = true;
            line_state.last_line_length = 0;
            line_state.prompt.clone_from(&state.editor_state.prompt);
            line_state.move_cursor(-100_000);

            let term = lock_output_device_as_mut!(original);
            line_state.render_and_flush(term)?;
        }

        tracing::debug!(message = "readline_mux started");
        ok!()
    }

    /// Put the original device back in the [`ConsoleOutput`] slot, print whatever is
    /// still pending in the interceptor, erase the prompt, and leave raw mode. Does
    /// nothing if not running.
    ///
    /// # Errors
    ///
    /// Returns the first error from draining the interceptor, erasing the prompt, or
    /// leaving raw mode. The editor is stopped regardless.
    pub fn stop(&self) -> CommonResultWithError<(), ReadlineError> {
        let result = {
            let mut slot = self.console.lock();

            let Some(original) = ({
                let state = lock_or_recover!(self.safe_state);
                if !state.editor_state.running {
                    return ok!();
                }
                state.maybe_original_output.clone()
            }) else {
                return ok!();
            };

            let interceptor = std::mem::replace(&mut *slot, original.clone());
            let drain_result = lock_output_device_as_mut!(interceptor).flush();

            let exit_result = {
                let mut state = lock_or_recover!(self.safe_state);
                state.editor_state.running = false;
                state.editor_state.output_redirect_active = false;
                state.pump_state = PumpState::Idle;
                state.maybe_original_output = None;
                let term = lock_output_device_as_mut!(original);
                state.line_state.blank(term)
            };

            let raw_mode_result = lock_or_recover!(self.safe_input).set_raw_mode(false);

            drain_result
                .map_err(ReadlineError::from)
                .and(exit_result)
                .and(raw_mode_result.map_err(ReadlineError::from))
        };

        tracing::debug!(message = "readline_mux stopped", ?result);
        result
    }

    /// Pump at most one input event through the line editor.
    ///
    /// - Not running: [`LineStatus::Full`] with an empty string, right away.
    /// - Input closed (now or earlier): [`LineStatus::Empty`].
    /// - <kbd>Enter</kbd> was pressed: [`LineStatus::Full`] with the trimmed line.
    /// - Anything else: [`LineStatus::Partial`].
    ///
    /// # Errors
    ///
    /// Returns [`ReadlineError::InputClosed`] if the input device is disconnected, or
    /// another error if reading input, or rendering, fails.
    pub fn get_line(&self) -> CommonResultWithError<LineStatus, ReadlineError> {
        let (timeout, maybe_parked_event) = {
            let mut state = lock_or_recover!(self.safe_state);
            state.pump_state = PumpState::Idle;
            if !state.editor_state.running {
                return ok!(LineStatus::Full(String::new()));
            }
            if state.editor_state.input_exhausted {
                return ok!(LineStatus::Empty);
            }
            (state.config.pump_timeout, state.maybe_parked_event.take())
        };

        let poll = match maybe_parked_event {
            Some(event) => InputPoll::Event(event),
            None => lock_or_recover!(self.safe_input)
                .poll_input(timeout)
                .map_err(|error| match error.kind() {
                    ErrorKind::BrokenPipe | ErrorKind::NotConnected => {
                        ReadlineError::InputClosed(error.to_string())
                    }
                    _ => ReadlineError::IO(error),
                })?,
        };

        let status = {
            let mut state = lock_or_recover!(self.safe_state);
            // Stopped while waiting for input. Keep the event for the next start.
            let Some(original) = state.maybe_original_output.clone() else {
                if let InputPoll::Event(event) = poll {
                    state.maybe_parked_event = Some(event);
                }
                return ok!(LineStatus::Full(String::new()));
            };
            let term = lock_output_device_as_mut!(original);

            let outcome = match poll {
                InputPoll::Event(event) => apply_event(&mut state, event, term)?,
                InputPoll::Idle => StepOutcome::Continue,
                InputPoll::Closed => finalize_line(&mut state, None, term)?,
            };

            match outcome {
                StepOutcome::Continue => LineStatus::Partial,
                StepOutcome::Finalized => state
                    .pump_state
                    .take_line()
                    .map_or(LineStatus::Partial, LineStatus::from),
            }
        };

        match &status {
            LineStatus::Partial if DEBUG_READLINE_MUX => {
                tracing::debug!(message = "get_line", %status);
            }
            LineStatus::Partial => {}
            LineStatus::Full(line) => {
                tracing::debug!(message = "line finalized", len = line.len());
            }
            LineStatus::Empty => tracing::debug!(message = "input closed"),
        }

        ok!(status)
    }

    /// Change the prompt. The old prompt is overwritten with spaces first, so nothing
    /// of it is left behind if the new one is shorter. Does nothing if not running.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt can't be drawn.
    pub fn set_prompt(&self, text: &str) -> CommonResultWithError<(), ReadlineError> {
        let mut state = lock_or_recover!(self.safe_state);
        if !state.editor_state.running {
            return ok!();
        }
        let Some(original) = state.maybe_original_output.clone() else {
            return ok!();
        };
        let term = lock_output_device_as_mut!(original);

        let blank = " ".repeat(state.editor_state.prompt_visible_length);
        state.line_state.update_prompt(&blank, term)?;
        state.line_state.update_prompt(text, term)?;

        state.editor_state.prompt_visible_length = usize::from(visible_width(text));
        state.editor_state.prompt = text.to_string();

        ok!()
    }

    /// Wipe the terminal. While running, the prompt is drawn again at the top.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn clear_screen(&self) -> CommonResultWithError<(), ReadlineError> {
        {
            let mut state = lock_or_recover!(self.safe_state);
            if let Some(original) = state.maybe_original_output.clone() {
                let term = lock_output_device_as_mut!(original);
                state.line_state.clear_screen_and_flush(term)?;
                return ok!();
            }
        }

        let slot = self.console.lock();
        let term = lock_output_device_as_mut!(slot);
        term.queue(Clear(ClearType::All))?
            .queue(cursor::MoveTo(0, 0))?;
        term.flush()?;

        ok!()
    }

    /// Register a command for <kbd>Tab</kbd> completion. Returns `false` if it was
    /// already there.
    pub fn add_completion(&self, command: impl Into<String>) -> bool {
        lock_or_recover!(self.safe_state).completions.add(command)
    }

    #[must_use]
    pub fn get_completions(&self) -> Vec<String> {
        lock_or_recover!(self.safe_state).completions.all().to_vec()
    }

    /// Submitted lines, newest first.
    #[must_use]
    pub fn history_entries(&self) -> Vec<String> {
        lock_or_recover!(self.safe_state)
            .history
            .entries
            .iter()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock_or_recover!(self.safe_state).editor_state.running
    }

    /// Stop the editor until the returned guard is dropped. See [`SuspendReadline`].
    #[must_use]
    pub fn suspend(&self) -> SuspendReadline<'_> { SuspendReadline::new(Some(self)) }
}

impl Drop for ReadlineBuffer {
    fn drop(&mut self) {
        // We don't care about the result of this operation.
        self.stop().ok();
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, thread};

    use crossterm::event::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;
    use crate::{InputDeviceExtMock, MockInputHandle, OutputDeviceExt, StdoutMock,
                console_println};

    struct Fixture {
        readline: ReadlineBuffer,
        console: ConsoleOutput,
        original: OutputDevice,
        stdout_mock: StdoutMock,
        input: MockInputHandle,
    }

    fn new_fixture() -> Fixture {
        let (original, stdout_mock) = OutputDevice::new_mock();
        let console = ConsoleOutput::new(original.clone());
        let (input_device, input) = InputDevice::new_mock([]);
        let readline =
            ReadlineBuffer::new(console.clone(), input_device, ReadlineConfig::default());
        Fixture {
            readline,
            console,
            original,
            stdout_mock,
            input,
        }
    }

    /// Poll until something other than [`LineStatus::Partial`] comes back.
    fn pump(readline: &ReadlineBuffer) -> LineStatus {
        for _ in 0..1_000 {
            match readline.get_line().unwrap() {
                LineStatus::Partial => {}
                it => return it,
            }
        }
        LineStatus::Partial
    }

    #[test]
    fn test_get_line_before_start_is_full_empty() {
        let fixture = new_fixture();
        fixture.input.push_line("ignored");

        assert_eq!(fixture.readline.get_line().unwrap(), LineStatus::Full(String::new()));
        assert_eq!(fixture.input.pending_event_count(), 8);
        assert!(fixture.stdout_mock.get_copy_of_buffer().is_empty());
    }

    #[test]
    fn test_start_and_stop_swap_the_sink() {
        let fixture = new_fixture();

        fixture.readline.start().unwrap();
        assert!(!fixture.console.current().is_same_device(&fixture.original));
        assert!(fixture.input.is_raw_mode());

        // Second start is a no-op, the interceptor isn't wrapped again.
        let interceptor = fixture.console.current();
        fixture.readline.start().unwrap();
        assert!(fixture.console.current().is_same_device(&interceptor));

        fixture.readline.stop().unwrap();
        assert!(fixture.console.current().is_same_device(&fixture.original));
        assert!(!fixture.input.is_raw_mode());

        fixture.readline.stop().unwrap();
        assert!(fixture.console.current().is_same_device(&fixture.original));
        assert_eq!(fixture.input.raw_mode_toggle_count(), 2);
        assert!(!fixture.readline.is_running());
    }

    #[test]
    fn test_output_while_stopped_has_no_prompt() {
        let fixture = new_fixture();
        console_println!(fixture.console, "plain");
        assert_eq!(fixture.stdout_mock.get_copy_of_buffer_as_string(), "plain\n");
    }

    #[test]
    fn test_output_while_running_goes_above_prompt() {
        let fixture = new_fixture();
        fixture.readline.start().unwrap();
        fixture.readline.set_prompt("> ").unwrap();
        fixture.input.push_str("ab");
        pump_n(&fixture.readline, 2);
        fixture.stdout_mock.clear();

        console_println!(fixture.console, "background");

        assert_eq!(
            fixture.stdout_mock.get_copy_of_buffer_as_string_strip_ansi(),
            "background\n> ab"
        );
    }

    fn pump_n(readline: &ReadlineBuffer, count: usize) {
        for _ in 0..count {
            assert_eq!(readline.get_line().unwrap(), LineStatus::Partial);
        }
    }

    #[test]
    fn test_line_is_trimmed_and_recorded() {
        let fixture = new_fixture();
        fixture.readline.start().unwrap();
        fixture.input.push_line("balance   ");

        assert_eq!(pump(&fixture.readline), LineStatus::Full("balance".into()));
        assert_eq!(fixture.readline.history_entries(), ["balance"]);

        fixture.input.push_line("");
        assert_eq!(pump(&fixture.readline), LineStatus::Full(String::new()));
        assert_eq!(fixture.readline.history_entries(), ["balance"]);
    }

    #[test]
    fn test_closed_input_is_empty_every_time() {
        let fixture = new_fixture();
        fixture.readline.start().unwrap();
        fixture.input.close();

        assert_eq!(fixture.readline.get_line().unwrap(), LineStatus::Empty);
        assert_eq!(fixture.readline.get_line().unwrap(), LineStatus::Empty);

        // A restart clears the latch.
        fixture.readline.stop().unwrap();
        fixture.readline.start().unwrap();
        fixture.input.push_line("again");
        {
            let mut queue = fixture.input.safe_queue.lock().unwrap();
            queue.is_closed = false;
        }
        assert_eq!(pump(&fixture.readline), LineStatus::Full("again".into()));
    }

    struct DisconnectedSource;

    impl crate::InputSource for DisconnectedSource {
        fn poll_input(&mut self, _: std::time::Duration) -> std::io::Result<InputPoll> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn set_raw_mode(&mut self, _: bool) -> std::io::Result<()> { Ok(()) }

        fn terminal_size(&self) -> std::io::Result<(u16, u16)> { Ok((80, 24)) }
    }

    #[test]
    fn test_disconnected_input_is_an_error() {
        let (original, _) = OutputDevice::new_mock();
        let readline = ReadlineBuffer::new(
            ConsoleOutput::new(original),
            InputDevice::new_from(DisconnectedSource),
            ReadlineConfig::default(),
        );
        readline.start().unwrap();

        assert!(matches!(
            readline.get_line(),
            Err(ReadlineError::InputClosed(_))
        ));
    }

    /// Blocks inside [`crate::InputSource::poll_input()`] until the test opens the gate,
    /// then yields a single `x` key press.
    struct GatedSource {
        entered: std::sync::mpsc::Sender<()>,
        gate: std::sync::mpsc::Receiver<()>,
        fired: bool,
    }

    impl crate::InputSource for GatedSource {
        fn poll_input(&mut self, _: std::time::Duration) -> std::io::Result<InputPoll> {
            if self.fired {
                return Ok(InputPoll::Idle);
            }
            self.entered.send(()).ok();
            self.gate.recv().ok();
            self.fired = true;
            Ok(InputPoll::Event(crate::key_event(
                KeyCode::Char('x'),
                KeyModifiers::NONE,
            )))
        }

        fn set_raw_mode(&mut self, _: bool) -> std::io::Result<()> { Ok(()) }

        fn terminal_size(&self) -> std::io::Result<(u16, u16)> { Ok((80, 24)) }
    }

    #[test]
    fn test_key_read_during_stop_is_replayed_after_restart() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (gate_tx, gate_rx) = std::sync::mpsc::channel();
        let (original, _) = OutputDevice::new_mock();
        let readline = ReadlineBuffer::new(
            ConsoleOutput::new(original),
            InputDevice::new_from(GatedSource {
                entered: entered_tx,
                gate: gate_rx,
                fired: false,
            }),
            ReadlineConfig::default(),
        );
        readline.start().unwrap();

        thread::scope(|scope| {
            let poller = scope.spawn(|| readline.get_line().unwrap());
            entered_rx.recv().unwrap();

            // stop() waits for the input lock, which the poller holds.
            let stopper = scope.spawn(|| readline.stop().unwrap());
            while readline.is_running() {
                thread::yield_now();
            }
            gate_tx.send(()).unwrap();

            assert_eq!(poller.join().unwrap(), LineStatus::Full(String::new()));
            stopper.join().unwrap();
        });

        assert!(
            lock_or_recover!(readline.safe_state)
                .maybe_parked_event
                .is_some()
        );

        readline.start().unwrap();
        for _ in 0..3 {
            assert_eq!(readline.get_line().unwrap(), LineStatus::Partial);
        }
        let state = lock_or_recover!(readline.safe_state);
        assert_eq!(state.line_state.line, "x");
        assert!(state.maybe_parked_event.is_none());
    }

    #[test]
    fn test_tab_completion_end_to_end() {
        let fixture = new_fixture();
        assert!(fixture.readline.add_completion("sync"));
        assert!(!fixture.readline.add_completion("sync"));
        assert_eq!(fixture.readline.get_completions(), ["exit", "sync"]);

        fixture.readline.start().unwrap();
        fixture.input.push_str("s");
        fixture.input.push_key(KeyCode::Tab, KeyModifiers::NONE);
        fixture.input.push_key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(pump(&fixture.readline), LineStatus::Full("sync".into()));

        fixture.input.push_str("e");
        fixture.input.push_key(KeyCode::Tab, KeyModifiers::NONE);
        fixture.input.push_key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(pump(&fixture.readline), LineStatus::Full("exit".into()));
    }

    #[test]
    fn test_set_prompt_is_noop_while_stopped() {
        let fixture = new_fixture();
        fixture.readline.set_prompt("> ").unwrap();
        assert!(fixture.stdout_mock.get_copy_of_buffer().is_empty());
        assert_eq!(
            fixture.readline.safe_state.lock().unwrap().editor_state.prompt,
            ""
        );
    }

    #[test]
    fn test_set_prompt_blanks_old_prompt_and_tracks_width() {
        let fixture = new_fixture();
        fixture.readline.start().unwrap();
        fixture.readline.set_prompt("wallet [locked]> ").unwrap();
        fixture.stdout_mock.clear();

        fixture.readline.set_prompt("\x1b[32m> \x1b[0m").unwrap();

        let output = fixture.stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert_eq!(output, format!("{}> ", " ".repeat(17)));
        let state = fixture.readline.safe_state.lock().unwrap();
        assert_eq!(state.editor_state.prompt_visible_length, 2);
    }

    #[test]
    fn test_prompt_survives_restart() {
        let fixture = new_fixture();
        fixture.readline.start().unwrap();
        fixture.readline.set_prompt("> ").unwrap();
        fixture.readline.stop().unwrap();
        fixture.stdout_mock.clear();

        fixture.readline.start().unwrap();

        assert_eq!(fixture.stdout_mock.get_copy_of_buffer_as_string_strip_ansi(), "> ");
    }

    #[test]
    fn test_stop_drains_pending_output() {
        let fixture = new_fixture();
        fixture.readline.start().unwrap();

        // Bypass the `ConsoleWriter`, so nothing flushes the interceptor.
        let interceptor = fixture.console.current();
        lock_output_device_as_mut!(interceptor).write_all(b"unflushed").unwrap();
        assert_eq!(
            fixture.stdout_mock.get_copy_of_buffer_as_string_strip_ansi(),
            ""
        );

        fixture.readline.stop().unwrap();
        assert!(
            fixture
                .stdout_mock
                .get_copy_of_buffer_as_string_strip_ansi()
                .contains("unflushed\n")
        );
    }

    #[test]
    fn test_clear_screen_redraws_prompt() {
        let fixture = new_fixture();
        fixture.readline.clear_screen().unwrap();
        assert_eq!(
            fixture.stdout_mock.get_copy_of_buffer_as_string(),
            "\x1b[2J\x1b[1;1H"
        );

        fixture.readline.start().unwrap();
        fixture.readline.set_prompt("> ").unwrap();
        fixture.stdout_mock.clear();
        fixture.readline.clear_screen().unwrap();
        assert_eq!(fixture.stdout_mock.get_copy_of_buffer_as_string_strip_ansi(), "> ");
    }

    #[test]
    fn test_drop_restores_sink() {
        let fixture = new_fixture();
        fixture.readline.start().unwrap();
        let Fixture {
            readline,
            console,
            original,
            ..
        } = fixture;

        drop(readline);

        assert!(console.current().is_same_device(&original));
    }

    #[test]
    #[serial]
    fn test_concurrent_writes_are_emitted_once_and_in_order() {
        const THREADS: usize = 4;
        const LINES: usize = 50;

        let fixture = new_fixture();
        fixture.readline.start().unwrap();
        fixture.readline.set_prompt("> ").unwrap();
        fixture.input.push_str("typing");

        let handles = (0..THREADS)
            .map(|thread_id| {
                let console = fixture.console.clone();
                thread::spawn(move || {
                    for line_id in 0..LINES {
                        console_println!(console, "<t{thread_id}:{line_id:03}>");
                    }
                })
            })
            .collect::<Vec<_>>();

        while handles.iter().any(|it| !it.is_finished()) {
            assert!(matches!(
                fixture.readline.get_line().unwrap(),
                LineStatus::Partial
            ));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        pump_n(&fixture.readline, fixture.input.pending_event_count());
        fixture.readline.stop().unwrap();

        let output = fixture.stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        for thread_id in 0..THREADS {
            let mut last_position = 0;
            for line_id in 0..LINES {
                let needle = format!("<t{thread_id}:{line_id:03}>\n");
                assert_eq!(output.matches(&needle).count(), 1, "{needle}");
                let position = output.find(&needle).unwrap();
                assert!(position >= last_position);
                last_position = position;
            }
        }
        assert_eq!(
            fixture.readline.safe_state.lock().unwrap().line_state.line,
            ""
        );
    }
}
