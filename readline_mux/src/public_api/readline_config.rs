// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::Duration;

use crate::HISTORY_SIZE_MAX;

/// How long [`crate::ReadlineBuffer::get_line()`] waits for a key press before it
/// returns [`crate::LineStatus::Partial`].
pub const DEFAULT_PUMP_TIMEOUT: Duration = Duration::from_millis(50);

/// Knobs for the [`crate::ReadlineBuffer`]. Use [`Default`] and override what you need.
///
/// ```
/// use std::time::Duration;
/// use r3bl_readline_mux::ReadlineConfig;
///
/// let config = ReadlineConfig {
///     pump_timeout: Duration::from_millis(10),
///     ..Default::default()
/// };
/// assert!(config.is_terminator("q"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadlineConfig {
    /// Number of submitted lines kept in memory.
    pub history_max_size: usize,
    /// Upper bound on the time a single poll blocks.
    pub pump_timeout: Duration,
    /// Lines that make the editor stop drawing the prompt. The host still decides
    /// whether to actually quit.
    pub terminator_keywords: Vec<String>,
    /// After pressing <kbd>Enter</kbd>, leave the prompt and the submitted line on
    /// screen.
    pub print_line_on_enter: bool,
}

impl Default for ReadlineConfig {
    fn default() -> Self {
        Self {
            history_max_size: HISTORY_SIZE_MAX,
            pump_timeout: DEFAULT_PUMP_TIMEOUT,
            terminator_keywords: vec!["exit".into(), "q".into()],
            print_line_on_enter: true,
        }
    }
}

impl ReadlineConfig {
    #[must_use]
    pub fn is_terminator(&self, line: &str) -> bool {
        self.terminator_keywords.iter().any(|it| it == line)
    }
}
