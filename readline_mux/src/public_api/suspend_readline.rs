// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::ReadlineBuffer;

/// Scope guard that takes the terminal away from a running [`ReadlineBuffer`], eg: to ask
/// a yes / no question with plain blocking I/O. The editor is stopped when the guard is
/// created, and started again when it is dropped (on every exit path, including `?` and
/// panics).
///
/// - If the editor wasn't running, the guard does nothing, and it won't start it on drop
///   either.
/// - [`None`] is accepted, for code paths that may or may not have an editor.
/// - Guards can be nested. Only the outermost one restarts the editor.
///
/// ```
/// use r3bl_readline_mux::{ConsoleOutput, InputDevice, InputDeviceExtMock, OutputDevice,
///                         OutputDeviceExt, ReadlineBuffer, ReadlineConfig,
///                         SuspendReadline};
///
/// let (device, _stdout_mock) = OutputDevice::new_mock();
/// let (input_device, _input) = InputDevice::new_mock([]);
/// let readline =
///     ReadlineBuffer::new(ConsoleOutput::new(device), input_device, ReadlineConfig::default());
/// readline.start().unwrap();
/// {
///     let _guard = SuspendReadline::new(Some(&readline));
///     assert!(!readline.is_running());
/// }
/// assert!(readline.is_running());
/// ```
#[allow(missing_debug_implementations)]
pub struct SuspendReadline<'a> {
    maybe_readline: Option<&'a ReadlineBuffer>,
    should_restart: bool,
}

impl<'a> SuspendReadline<'a> {
    #[must_use]
    pub fn new(maybe_readline: Option<&'a ReadlineBuffer>) -> Self {
        let mut should_restart = false;

        if let Some(readline) = maybe_readline
            && readline.is_running()
        {
            should_restart = true;
            tracing::debug!(message = "suspending readline");
            if let Err(error) = readline.stop() {
                tracing::warn!(message = "could not suspend readline", ?error);
            }
        }

        Self {
            maybe_readline,
            should_restart,
        }
    }
}

impl Drop for SuspendReadline<'_> {
    fn drop(&mut self) {
        if !self.should_restart {
            return;
        }
        if let Some(readline) = self.maybe_readline
            && let Err(error) = readline.start()
        {
            tracing::warn!(message = "could not resume readline", ?error);
        }
    }
}
