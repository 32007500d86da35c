// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Introduction
//!
//! `r3bl_readline_mux` lets a console program accept keystrokes through a line editor,
//! while any other thread in the process concurrently writes plain text to the same
//! terminal. The two streams never corrupt each other's rendering: background output is
//! printed *above* the live prompt, and the prompt (with whatever the user has typed so
//! far) is redrawn underneath it.
//!
//! There is no background task or thread. The host drives the editor from one "console"
//! thread by polling [`ReadlineBuffer::get_line()`] in a loop. Each poll pumps at most
//! one input event and returns a [`LineStatus`]:
//!
//! - [`LineStatus::Partial`] - nothing complete yet, poll again.
//! - [`LineStatus::Full`] - the user pressed <kbd>Enter</kbd>, here's the line.
//! - [`LineStatus::Empty`] - input is closed, no more lines will ever arrive.
//!
//! # The text output sink
//!
//! Rust has no process wide output stream that can be swapped out at runtime. This
//! crate provides one: [`ConsoleOutput`] is a cloneable slot that holds the current
//! output device. Code that wants its output to cooperate with the prompt writes through
//! a [`ConsoleWriter`] (obtained from [`ConsoleOutput::writer()`]), or the
//! [`console_println!`] macro.
//!
//! - While the [`ReadlineBuffer`] is stopped, the slot holds the real terminal device
//!   (usually `stdout`), and writes go straight through.
//! - [`ReadlineBuffer::start()`] swaps an [`OutputInterceptor`] into the slot. On every
//!   flush it takes the editor lock, erases the prompt line, emits the pending text, and
//!   redraws the prompt.
//! - [`ReadlineBuffer::stop()`] puts the original device back.
//!
//! # Nested prompts
//!
//! Use [`SuspendReadline`] (or [`ReadlineBuffer::suspend()`]) when you need to take over
//! the terminal for a synchronous sub-prompt. The editor is stopped for the lifetime of
//! the guard and restarted when it is dropped, on every exit path.
//!
//! ```no_run
//! use r3bl_readline_mux::{ConsoleOutput, InputDevice, LineStatus, ReadlineBuffer,
//!                         ReadlineConfig, console_println};
//!
//! # fn main() -> miette::Result<()> {
//! let console = ConsoleOutput::new_stdout();
//! let readline = ReadlineBuffer::new(
//!     console.clone(),
//!     InputDevice::new_crossterm(),
//!     ReadlineConfig::default(),
//! );
//! readline.add_completion("status");
//! readline.start()?;
//! readline.set_prompt("> ")?;
//!
//! loop {
//!     match readline.get_line()? {
//!         LineStatus::Partial => continue,
//!         LineStatus::Empty => break,
//!         LineStatus::Full(line) => {
//!             if line == "exit" {
//!                 break;
//!             }
//!             console_println!(console, "you typed: {line}");
//!         }
//!     }
//! }
//!
//! readline.stop()?;
//! # Ok(())
//! # }
//! ```

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod common;
pub mod public_api;
pub mod readline_impl;
pub mod terminal_io;
pub mod test_fixtures;
pub mod tracing_logging;

// Re-export the public API.
pub use common::*;
pub use public_api::*;
pub use readline_impl::*;
pub use terminal_io::*;
pub use test_fixtures::*;
pub use tracing_logging::*;

// External crates.
use std::sync::Arc;

// Type aliases.
pub type SafeReadlineState = Arc<StdMutex<ReadlineState>>;

// Constants.
pub const HISTORY_SIZE_MAX: usize = 500;
pub const DEFAULT_TERMINAL_SIZE: (u16, u16) = (80, 24);

/// Flip this to see internal state transitions in the logs.
pub const DEBUG_READLINE_MUX: bool = false;
