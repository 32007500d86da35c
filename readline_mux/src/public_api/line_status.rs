// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::Display;

use crate::FinalizedLine;

/// Result of one [`crate::ReadlineBuffer::get_line()`] poll.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LineStatus {
    /// Input is closed. Every later poll returns this too, until the editor is
    /// restarted.
    Empty,
    /// Nothing is complete yet. Poll again.
    Partial,
    /// A line was submitted, with trailing whitespace removed. May be empty.
    Full(String),
}

impl From<FinalizedLine> for LineStatus {
    fn from(line: FinalizedLine) -> Self {
        match line {
            FinalizedLine::Line(text) => LineStatus::Full(text),
            FinalizedLine::EndOfInput => LineStatus::Empty,
        }
    }
}
