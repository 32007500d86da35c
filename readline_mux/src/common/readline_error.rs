// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::Report as ErrorReport;
use std::io;
use thiserror::Error;

/// Error returned from [`crate::ReadlineBuffer`] operations. Reaching the end of input
/// is *not* an error, it is reported as [`crate::LineStatus::Empty`].
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ReadlineError {
    /// An internal I/O error occurred while reading input or drawing the prompt.
    #[error(transparent)]
    #[diagnostic(code(r3bl_readline_mux::io))]
    IO(#[from] io::Error),

    /// The input source went away in a way that can't be treated as end of input.
    #[error("input device closed unexpectedly: {0}")]
    #[diagnostic(
        code(r3bl_readline_mux::input_closed),
        help("is stdin attached to a terminal?")
    )]
    InputClosed(String),
}

/// For convenience, convert [`ErrorReport`] to [`ReadlineError`],
/// so that `into_diagnostic()` works.
impl From<ErrorReport> for ReadlineError {
    fn from(report: ErrorReport) -> Self {
        ReadlineError::IO(io::Error::other(format!("{report}")))
    }
}

/// Convert back to [`io::Error`], so that the [`crate::OutputInterceptor`] can report
/// failures through the [`std::io::Write`] trait.
impl From<ReadlineError> for io::Error {
    fn from(error: ReadlineError) -> Self {
        match error {
            ReadlineError::IO(it) => it,
            ReadlineError::InputClosed(message) => {
                io::Error::new(io::ErrorKind::UnexpectedEof, message)
            }
        }
    }
}
