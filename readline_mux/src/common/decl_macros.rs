// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Simple macro to create a [`Result`] with an [`Ok`] variant. It is just syntactic sugar
/// that helps having to write `Ok(())`.
/// - If no arg is passed in then it will return `Ok(())`.
/// - If an arg is passed in then it will return `Ok($arg)`.
#[macro_export]
macro_rules! ok {
    // No args.
    () => {
        Ok(())
    };
    // With arg.
    ($value:expr) => {
        Ok($value)
    };
}

/// Lock a [`std::sync::Mutex`], and if a thread panicked while holding it, keep going
/// with the inner value. A panic in one writer must not take the terminal away from
/// everyone else.
#[macro_export]
macro_rules! lock_or_recover {
    ($mutex:expr) => {
        $mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Write a line to a [`crate::ConsoleOutput`]. When the [`crate::ReadlineBuffer`] is
/// running this ends up above the prompt, otherwise it goes straight to the terminal.
///
/// ```
/// use r3bl_readline_mux::{ConsoleOutput, OutputDevice, OutputDeviceExt, console_println};
///
/// let (device, stdout_mock) = OutputDevice::new_mock();
/// let console = ConsoleOutput::new(device);
/// console_println!(console, "hello {}", "world");
/// assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "hello world\n");
/// ```
#[macro_export]
macro_rules! console_println {
    (
        $console:expr,
        $($format:tt)*
    ) => {{
        use std::io::Write as _;
        let mut writer = $console.writer();
        _ = writeln!(writer, $($format)*);
    }};
}

/// Same as [`console_println!`] without the trailing newline. The text is flushed
/// immediately, so it shows up above the prompt on its own line.
#[macro_export]
macro_rules! console_print {
    (
        $console:expr,
        $($format:tt)*
    ) => {{
        use std::io::Write as _;
        let mut writer = $console.writer();
        _ = write!(writer, $($format)*);
        _ = writer.flush();
    }};
}
