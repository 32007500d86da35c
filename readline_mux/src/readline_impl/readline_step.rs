// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! One step of the line editor: a single input event goes in, the edit buffer and the
//! screen are updated, and at most one line comes out. Every function here expects the
//! caller to hold the lock on [`ReadlineState`] for the duration of the step.

use std::io::Write;

use crossterm::event::{Event, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{FinalizedLine, PumpState, ReadlineError, ReadlineState, ok};

/// What happened to the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still editing. Nothing to hand to the host yet.
    Continue,
    /// A line (or end of input) was parked in [`PumpState::LineReady`].
    Finalized,
}

/// Dispatch `event` to the matching key handler and render the result to `term`.
///
/// # Errors
///
/// Returns an error if writing to `term` fails.
pub fn apply_event(
    state: &mut ReadlineState,
    event: Event,
    term: &mut dyn Write,
) -> Result<StepOutcome, ReadlineError> {
    use apply_event_helper::{handle_control_key, handle_regular_key, handle_resize};

    state.pump_state = PumpState::Pumping;

    match event {
        // Control Keys.
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            ..
        }) => {
            state.is_last_key_tab = false;
            handle_control_key(state, code, term)
        }
        // Other Modifiers (None, Shift, Control+Alt).
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) => {
            let was_last_key_tab = std::mem::replace(&mut state.is_last_key_tab, false);
            handle_regular_key(state, code, was_last_key_tab, term)
        }
        Event::Resize(x, y) => handle_resize(state, x, y, term),
        _ => ok!(StepOutcome::Continue),
    }
}

/// Finish the current line. `None` means the input is closed.
/// - Trailing whitespace is trimmed.
/// - A non empty line goes into the history, and history browsing starts over from the
///   newest entry.
/// - A terminator keyword (see [`crate::ReadlineConfig::terminator_keywords`]) blanks the
///   prompt, so it isn't drawn again under the host's goodbye message.
/// - End of input blanks the prompt, and is latched in
///   [`crate::EditorState::input_exhausted`].
///
/// The result is parked in [`PumpState::LineReady`].
///
/// # Errors
///
/// Returns an error if writing to `term` fails.
pub fn finalize_line(
    state: &mut ReadlineState,
    maybe_line: Option<String>,
    term: &mut dyn Write,
) -> Result<StepOutcome, ReadlineError> {
    let finalized = match maybe_line {
        None => {
            state.line_state.blank(term)?;
            state.editor_state.input_exhausted = true;
            FinalizedLine::EndOfInput
        }
        Some(line) => {
            let trimmed = line.trim_end().to_string();
            if !trimmed.is_empty() {
                state.history.add(trimmed.clone());
            }
            state.history.reset_position();

            if state.config.is_terminator(&trimmed) {
                state.line_state.blank(term)?;
            } else {
                let line_state = &mut state.line_state;
                line_state.clear(term)?;
                line_state.cluster_buffer.clear();
                line_state.move_cursor(-100_000);
                line_state.render_and_flush(term)?;
            }
            FinalizedLine::Line(trimmed)
        }
    };

    state.pump_state = PumpState::LineReady(finalized);
    ok!(StepOutcome::Finalized)
}

mod apply_event_helper {
    use std::io::Write;

    use crossterm::event::KeyCode;
    use unicode_segmentation::UnicodeSegmentation;

    use super::{StepOutcome, finalize_line};
    use crate::{LineState, ReadlineError, ReadlineState, longest_common_prefix, ok};

    /// Handle control key events (Ctrl+key combinations).
    pub fn handle_control_key(
        state: &mut ReadlineState,
        code: KeyCode,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        let line_state = &mut state.line_state;
        match code {
            KeyCode::Char('d') => {
                if line_state.line.is_empty() {
                    return finalize_line(state, None, term);
                }
                handle_delete(line_state, term)
            }
            KeyCode::Char('c') => handle_ctrl_c(state, term),
            KeyCode::Char('l') => {
                line_state.clear_screen_and_flush(term)?;
                ok!(StepOutcome::Continue)
            }
            KeyCode::Char('u') => handle_ctrl_u(line_state, term),
            KeyCode::Char('w') => handle_ctrl_w(line_state, term),
            #[cfg(feature = "emacs")]
            KeyCode::Char('a') => handle_home(line_state, term),
            #[cfg(feature = "emacs")]
            KeyCode::Char('e') => handle_end(line_state, term),
            KeyCode::Left => {
                let cursor = line_state.cursor_byte_offset();
                let target = previous_word_start(&line_state.line[..cursor]);
                jump_to_byte(line_state, target, term)
            }
            KeyCode::Right => {
                let cursor = line_state.cursor_byte_offset();
                let target = next_word_end(&line_state.line, cursor);
                jump_to_byte(line_state, target, term)
            }
            _ => ok!(StepOutcome::Continue),
        }
    }

    /// Handle regular key events (no modifiers or non-Control modifiers).
    pub fn handle_regular_key(
        state: &mut ReadlineState,
        code: KeyCode,
        was_last_key_tab: bool,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        match code {
            KeyCode::Enter => handle_enter(state, term),
            KeyCode::Tab => handle_tab(state, was_last_key_tab, term),
            KeyCode::Backspace => handle_backspace(&mut state.line_state, term),
            KeyCode::Delete => handle_delete(&mut state.line_state, term),
            KeyCode::Left => handle_left_right(&mut state.line_state, -1, term),
            KeyCode::Right => handle_left_right(&mut state.line_state, 1, term),
            KeyCode::Home => handle_home(&mut state.line_state, term),
            KeyCode::End => handle_end(&mut state.line_state, term),
            // Search for next history item, replace line if found.
            KeyCode::Up => {
                if let Some(line) = state.history.search_next() {
                    state.line_state.replace_line(line, term)?;
                }
                ok!(StepOutcome::Continue)
            }
            KeyCode::Down => {
                if let Some(line) = state.history.search_previous() {
                    state.line_state.replace_line(line, term)?;
                }
                ok!(StepOutcome::Continue)
            }
            KeyCode::Char(c) => handle_char(&mut state.line_state, c, term),
            _ => ok!(StepOutcome::Continue),
        }
    }

    /// Handle terminal resize events.
    pub fn handle_resize(
        state: &mut ReadlineState,
        x: u16,
        y: u16,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        let line_state = &mut state.line_state;
        line_state.term_size = (x, y);
        line_state.clear_and_render_and_flush(term)?;
        ok!(StepOutcome::Continue)
    }

    fn handle_enter(
        state: &mut ReadlineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        let line_state = &mut state.line_state;

        // Print line so you can see what commands you've typed.
        if state.config.print_line_on_enter {
            let echo = format!("{}{}\n", line_state.prompt, line_state.line);
            line_state.print_and_flush(&echo, term)?;
        }

        let line = std::mem::take(&mut line_state.line);
        finalize_line(state, Some(line), term)
    }

    /// Abandon the current edit, and start over on a fresh prompt.
    fn handle_ctrl_c(
        state: &mut ReadlineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        let line_state = &mut state.line_state;
        let echo = format!("{}{}^C\n", line_state.prompt, line_state.line);
        line_state.print_and_flush(&echo, term)?;
        line_state.exit(term)?;
        line_state.render_and_flush(term)?;
        state.history.reset_position();
        ok!(StepOutcome::Continue)
    }

    /// Complete the word before the cursor using the registry.
    /// - One match replaces the word, followed by a space.
    /// - Several matches extend the word to their longest common prefix. If that doesn't
    ///   add anything, and this is the second <kbd>Tab</kbd> in a row, the candidates are
    ///   printed above the prompt.
    fn handle_tab(
        state: &mut ReadlineState,
        was_last_key_tab: bool,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        let cursor = state.line_state.cursor_byte_offset();
        let word_start = state.line_state.line[..cursor]
            .rfind(' ')
            .map_or(0, |index| index + 1);
        let word = state.line_state.line[word_start..cursor].to_string();

        let matches = state
            .completion_scan
            .collect_matches(&state.completions, &word);

        match matches.as_slice() {
            [] => {}
            [single] => {
                let replacement = format!("{single} ");
                replace_range(&mut state.line_state, word_start, cursor, &replacement, term)?;
            }
            many => {
                let common = longest_common_prefix(many);
                if common.len() > word.len() {
                    replace_range(&mut state.line_state, word_start, cursor, common, term)?;
                } else if was_last_key_tab {
                    let listing = format!("{}\n", many.join("  "));
                    state.line_state.print_and_flush(&listing, term)?;
                }
            }
        }

        state.is_last_key_tab = true;
        ok!(StepOutcome::Continue)
    }

    fn replace_range(
        line_state: &mut LineState,
        start: usize,
        end: usize,
        replacement: &str,
        term: &mut dyn Write,
    ) -> Result<(), ReadlineError> {
        line_state.clear(term)?;
        line_state.line.replace_range(start..end, replacement);
        set_cursor_to_byte(line_state, start + replacement.len());
        line_state.render_and_flush(term)?;
        ok!()
    }

    fn set_cursor_to_byte(line_state: &mut LineState, byte: usize) {
        line_state.line_cursor_grapheme = line_state.line[..byte].graphemes(true).count();
        line_state.move_cursor(0);
    }

    fn jump_to_byte(
        line_state: &mut LineState,
        byte: usize,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        line_state.reset_cursor(term)?;
        set_cursor_to_byte(line_state, byte);
        line_state.set_cursor(term)?;
        term.flush()?;
        ok!(StepOutcome::Continue)
    }

    /// Byte offset where the word that ends at the end of `before_cursor` starts.
    /// Spaces right before the cursor are skipped first.
    fn previous_word_start(before_cursor: &str) -> usize {
        before_cursor
            .trim_end_matches(' ')
            .rfind(' ')
            .map_or(0, |index| index + 1)
    }

    /// Byte offset of the first space after the word that follows `cursor`.
    fn next_word_end(line: &str, cursor: usize) -> usize {
        let rest = &line[cursor..];
        let skipped = rest.len() - rest.trim_start_matches(' ').len();
        rest[skipped..]
            .find(' ')
            .map_or(line.len(), |index| cursor + skipped + index)
    }

    // Clear to start.
    fn handle_ctrl_u(
        line_state: &mut LineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        let cursor = line_state.cursor_byte_offset();
        if cursor > 0 {
            replace_range(line_state, 0, cursor, "", term)?;
        }
        ok!(StepOutcome::Continue)
    }

    // Clear last word.
    fn handle_ctrl_w(
        line_state: &mut LineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        let cursor = line_state.cursor_byte_offset();
        let start = previous_word_start(&line_state.line[..cursor]);
        if start < cursor {
            replace_range(line_state, start, cursor, "", term)?;
        }
        ok!(StepOutcome::Continue)
    }

    // Delete (backspace) character from line.
    fn handle_backspace(
        line_state: &mut LineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        if let Some((pos, str)) = line_state.current_grapheme() {
            let end = pos + str.len();
            replace_range(line_state, pos, end, "", term)?;
        }
        ok!(StepOutcome::Continue)
    }

    // Delete character from line.
    fn handle_delete(
        line_state: &mut LineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        if let Some((pos, str)) = line_state.next_grapheme() {
            let len = pos + str.len();
            line_state.clear(term)?;
            line_state.line.replace_range(pos..len, "");
            line_state.render_and_flush(term)?;
        }
        ok!(StepOutcome::Continue)
    }

    fn handle_left_right(
        line_state: &mut LineState,
        change: isize,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        line_state.reset_cursor(term)?;
        line_state.move_cursor(change);
        line_state.set_cursor(term)?;
        term.flush()?;
        ok!(StepOutcome::Continue)
    }

    fn handle_home(
        line_state: &mut LineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        handle_left_right(line_state, -100_000, term)
    }

    fn handle_end(
        line_state: &mut LineState,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        handle_left_right(line_state, 100_000, term)
    }

    // Add character to line and output.
    fn handle_char(
        line_state: &mut LineState,
        c: char,
        term: &mut dyn Write,
    ) -> Result<StepOutcome, ReadlineError> {
        line_state.clear(term)?;
        let prev_len = line_state.cluster_buffer.graphemes(true).count();
        line_state.cluster_buffer.push(c);
        let new_len = line_state.cluster_buffer.graphemes(true).count();

        let pos = line_state.cursor_byte_offset();
        line_state.line.insert(pos, c);

        if prev_len != new_len {
            line_state.move_cursor(1);
            if prev_len > 0
                && let Some((pos, str)) =
                    line_state.cluster_buffer.grapheme_indices(true).next()
            {
                let len = str.len();
                line_state.cluster_buffer.replace_range(pos..len, "");
            }
        } else {
            // The char joined the grapheme under the cursor.
            line_state.move_cursor(0);
        }

        line_state.render_and_flush(term)?;
        ok!(StepOutcome::Continue)
    }

    #[cfg(test)]
    mod tests {
        use test_case::test_case;

        use super::*;

        #[test_case("sync  ", 0 ; "trailing spaces")]
        #[test_case("set log", 4 ; "second word")]
        #[test_case("", 0 ; "empty")]
        #[test_case("a b ", 2 ; "space before cursor")]
        fn test_previous_word_start(before_cursor: &str, expected: usize) {
            assert_eq!(previous_word_start(before_cursor), expected);
        }

        #[test_case("set log level", 0, 3 ; "from start")]
        #[test_case("set log level", 3, 7 ; "from space")]
        #[test_case("set log", 4, 7 ; "last word")]
        fn test_next_word_end(line: &str, cursor: usize, expected: usize) {
            assert_eq!(next_word_end(line, cursor), expected);
        }
    }
}
