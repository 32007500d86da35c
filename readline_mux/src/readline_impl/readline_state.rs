// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crossterm::event::Event;

use crate::{CompletionRegistry, CompletionScan, History, LineState, OutputDevice,
            ReadlineConfig};

/// Lifecycle flags of the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    /// Set between [`crate::ReadlineBuffer::start()`] and
    /// [`crate::ReadlineBuffer::stop()`].
    pub running: bool,
    /// The [`crate::OutputInterceptor`] is installed in the console slot. While set,
    /// flushed output is printed above the prompt.
    pub output_redirect_active: bool,
    /// Visible width of the last prompt passed to
    /// [`crate::ReadlineBuffer::set_prompt()`].
    pub prompt_visible_length: usize,
    /// The input source is closed. Latched until the next start.
    pub input_exhausted: bool,
    /// Last prompt the host asked for. Drawn again on restart.
    pub prompt: String,
}

/// What a finalized line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizedLine {
    Line(String),
    EndOfInput,
}

/// Where the engine is in the current poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PumpState {
    #[default]
    Idle,
    Pumping,
    /// Single slot hand-off. [`crate::ReadlineBuffer::get_line()`] takes the line out in
    /// the same call that put it here.
    LineReady(FinalizedLine),
}

impl PumpState {
    /// Take the finalized line out of the slot, leaving [`PumpState::Idle`] behind.
    pub fn take_line(&mut self) -> Option<FinalizedLine> {
        match std::mem::take(self) {
            PumpState::LineReady(line) => Some(line),
            _ => None,
        }
    }
}

/// Everything the shared lock protects. Input processing and the output interceptor's
/// redraw both need `&mut` access to this, and they get it one at a time.
#[allow(missing_debug_implementations)]
pub struct ReadlineState {
    pub editor_state: EditorState,
    pub pump_state: PumpState,
    pub line_state: LineState,
    pub history: History,
    pub completions: CompletionRegistry,
    pub completion_scan: CompletionScan,
    /// Two <kbd>Tab</kbd> presses in a row list the candidates.
    pub is_last_key_tab: bool,
    pub config: ReadlineConfig,
    /// The device that was in the console slot before
    /// [`crate::ReadlineBuffer::start()`]. This is where the prompt is rendered, and
    /// where intercepted output ends up. [`None`] while stopped.
    pub maybe_original_output: Option<OutputDevice>,
    /// Read from the input device while the editor was being stopped. Replayed by the
    /// first [`crate::ReadlineBuffer::get_line()`] after a restart.
    pub maybe_parked_event: Option<Event>,
}

impl ReadlineState {
    #[must_use]
    pub fn new(config: ReadlineConfig, term_size: (u16, u16)) -> Self {
        Self {
            editor_state: EditorState::default(),
            pump_state: PumpState::default(),
            line_state: LineState::new(String::new(), term_size),
            history: History::new(config.history_max_size),
            completions: CompletionRegistry::default(),
            completion_scan: CompletionScan::default(),
            is_last_key_tab: false,
            config,
            maybe_original_output: None,
            maybe_parked_event: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_TERMINAL_SIZE;

    #[test]
    fn test_new_state_is_stopped() {
        let state = ReadlineState::new(ReadlineConfig::default(), DEFAULT_TERMINAL_SIZE);

        assert_eq!(state.editor_state, EditorState::default());
        assert_eq!(state.pump_state, PumpState::Idle);
        assert_eq!(state.line_state.term_size, DEFAULT_TERMINAL_SIZE);
        assert_eq!(state.completions.all(), ["exit"]);
        assert!(state.maybe_original_output.is_none());
        assert!(state.maybe_parked_event.is_none());
    }

    #[test]
    fn test_take_line_empties_the_slot() {
        let mut pump_state = PumpState::LineReady(FinalizedLine::Line("sync".into()));
        assert_eq!(
            pump_state.take_line(),
            Some(FinalizedLine::Line("sync".into()))
        );
        assert_eq!(pump_state, PumpState::Idle);
        assert_eq!(pump_state.take_line(), None);

        let mut pump_state = PumpState::Pumping;
        assert_eq!(pump_state.take_line(), None);
        assert_eq!(pump_state, PumpState::Idle);
    }
}
