// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::{self, Write};

use crossterm::{QueueableCommand, cursor,
                terminal::{Clear,
                           ClearType::{All, FromCursorDown}}};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::{ReadlineError, ok};

/// Number of terminal columns that `text` occupies once ANSI escape sequences are
/// removed. Saturates at [`u16::MAX`].
#[must_use]
pub fn visible_width(text: &str) -> u16 {
    let plain = strip_ansi_escapes::strip_str(text);
    u16::try_from(UnicodeWidthStr::width(plain.as_str())).unwrap_or(u16::MAX)
}

/// This struct actually handles the line editing, and rendering. The
/// [`crate::ReadlineBuffer`] owns one (inside [`crate::ReadlineState`]) and only ever
/// touches it while holding the shared lock, which is what keeps the prompt and the
/// [`crate::OutputInterceptor`] from painting over each other.
#[derive(Debug)]
pub struct LineState {
    /// Unicode line.
    pub line: String,

    /// Index of grapheme in line.
    pub line_cursor_grapheme: usize,

    /// Column of grapheme in line.
    pub current_column: u16,

    /// Buffer for holding partial grapheme clusters as they come in.
    pub cluster_buffer: String,

    pub prompt: String,

    /// Number of chars already on the cursor row, written by output that didn't end
    /// with a newline.
    pub last_line_length: usize,
    pub last_line_completed: bool,

    pub term_size: (u16, u16),
}

impl LineState {
    #[must_use]
    pub fn new(prompt: String, term_size: (u16, u16)) -> Self {
        let current_column = visible_width(&prompt);
        Self {
            prompt,
            last_line_completed: true,
            term_size,
            current_column,
            line: String::new(),
            line_cursor_grapheme: 0,
            cluster_buffer: String::new(),
            last_line_length: 0,
        }
    }

    /// Is there anything on screen that has to be erased before other output can be
    /// printed?
    #[must_use]
    pub fn is_visible(&self) -> bool { !self.prompt.is_empty() || !self.line.is_empty() }

    fn term_width(&self) -> u16 { self.term_size.0.max(1) }

    /// Gets the number of lines wrapped.
    fn line_height(&self, pos: u16) -> u16 { pos / self.term_width() }

    /// Move from a position on the line to the start.
    fn move_to_beginning(&self, term: &mut dyn Write, from: u16) -> io::Result<()> {
        let move_up = self.line_height(from.saturating_sub(1));
        term.queue(cursor::MoveToColumn(0))?;
        if move_up != 0 {
            term.queue(cursor::MoveUp(move_up))?;
        }

        ok!()
    }

    /// Move from the start of the line to some position.
    fn move_from_beginning(&self, term: &mut dyn Write, to: u16) -> io::Result<()> {
        let line_height = self.line_height(to.saturating_sub(1));
        let line_remaining_len = to % self.term_width();
        if line_height != 0 {
            term.queue(cursor::MoveDown(line_height))?;
        }
        if line_remaining_len != 0 {
            term.queue(cursor::MoveRight(line_remaining_len))?;
        }

        ok!()
    }

    /// Move cursor by one unicode grapheme either left (negative) or right (positive).
    pub fn move_cursor(&mut self, change: isize) {
        if change > 0 {
            let count = self.line.graphemes(true).count();
            self.line_cursor_grapheme = usize::min(
                self.line_cursor_grapheme.saturating_add(change.unsigned_abs()),
                count,
            );
        } else {
            self.line_cursor_grapheme = self
                .line_cursor_grapheme
                .saturating_sub(change.unsigned_abs());
        }

        let (pos, str) = self.current_grapheme().unwrap_or((0, ""));
        let pos = pos + str.len();

        self.current_column =
            visible_width(&self.prompt).saturating_add(visible_width(&self.line[0..pos]));
    }

    #[must_use]
    pub fn current_grapheme(&self) -> Option<(usize, &str)> {
        self.line
            .grapheme_indices(true)
            .take(self.line_cursor_grapheme)
            .last()
    }

    #[must_use]
    pub fn next_grapheme(&self) -> Option<(usize, &str)> {
        let total = self.line.grapheme_indices(true).count();
        if self.line_cursor_grapheme == total {
            return None;
        }
        self.line
            .grapheme_indices(true)
            .take(self.line_cursor_grapheme + 1)
            .last()
    }

    /// Byte offset in [`Self::line`] where the cursor is.
    #[must_use]
    pub fn cursor_byte_offset(&self) -> usize {
        self.current_grapheme()
            .map_or(0, |(pos, str)| pos + str.len())
    }

    pub fn reset_cursor(&self, term: &mut dyn Write) -> io::Result<()> {
        self.move_to_beginning(term, self.current_column)
    }

    pub fn set_cursor(&self, term: &mut dyn Write) -> io::Result<()> {
        self.move_from_beginning(term, self.current_column)
    }

    /// Clear current line.
    pub fn clear(&self, term: &mut dyn Write) -> io::Result<()> {
        self.move_to_beginning(term, self.current_column)?;
        term.queue(Clear(FromCursorDown))?;

        ok!()
    }

    /// Render line (prompt + line) and flush.
    pub fn render_and_flush(&mut self, term: &mut dyn Write) -> io::Result<()> {
        write!(term, "{}{}", self.prompt, self.line)?;

        let total_line_len =
            visible_width(&self.prompt).saturating_add(visible_width(&self.line));

        self.move_to_beginning(term, total_line_len)?;
        self.move_from_beginning(term, self.current_column)?;

        term.flush()?;

        ok!()
    }

    /// Clear line and render.
    pub fn clear_and_render_and_flush(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.clear(term)?;
        self.render_and_flush(term)?;

        ok!()
    }

    /// Erase the prompt, print `data` in its place, and draw the prompt again underneath
    /// it. This is how output from other threads ends up above the line being edited.
    pub fn print_data_and_flush(
        &mut self,
        data: &[u8],
        term: &mut dyn Write,
    ) -> Result<(), ReadlineError> {
        if self.is_visible() {
            self.clear(term)?;
        }

        // If last written data was not newline, restore the cursor.
        if !self.last_line_completed {
            let last_line_length = u16::try_from(self.last_line_length).unwrap_or(u16::MAX);
            term.queue(cursor::MoveUp(1))?
                .queue(cursor::MoveToColumn(0))?;
            if last_line_length != 0 {
                term.queue(cursor::MoveRight(last_line_length))?;
            }
        }

        // Raw mode: newlines don't return the carriage on their own.
        for line in data.split_inclusive(|b| *b == b'\n') {
            term.write_all(line)?;
            term.queue(cursor::MoveToColumn(0))?;
        }

        self.last_line_completed = data.ends_with(b"\n");

        if self.last_line_completed {
            self.last_line_length = 0;
        } else {
            // Only the text after the last newline stays on the cursor's row.
            let tail = data.rsplit(|b| *b == b'\n').next().unwrap_or_default();
            let tail_width = usize::from(visible_width(&String::from_utf8_lossy(tail)));
            if data.contains(&b'\n') {
                self.last_line_length = tail_width;
            } else {
                self.last_line_length += tail_width;
            }
            let width = usize::from(self.term_width());
            if self.last_line_length >= width {
                self.last_line_length %= width;
                writeln!(term)?;
            }
            // The prompt goes on a fresh line.
            writeln!(term)?;
        }

        term.queue(cursor::MoveToColumn(0))?;
        self.render_and_flush(term)?;

        ok!()
    }

    pub fn print_and_flush(
        &mut self,
        string: &str,
        term: &mut dyn Write,
    ) -> Result<(), ReadlineError> {
        self.print_data_and_flush(string.as_bytes(), term)
    }

    pub fn update_prompt(
        &mut self,
        prompt: &str,
        term: &mut dyn Write,
    ) -> Result<(), ReadlineError> {
        self.clear(term)?;
        self.prompt.clear();
        self.prompt.push_str(prompt);

        // Recalculates column.
        self.move_cursor(0);
        self.render_and_flush(term)?;

        ok!()
    }

    /// Throw away the edit buffer, and erase the prompt line from the screen. The
    /// prompt text itself is kept, the next render shows it again.
    pub fn exit(&mut self, term: &mut dyn Write) -> Result<(), ReadlineError> {
        self.clear(term)?;
        self.line.clear();
        self.cluster_buffer.clear();
        self.move_cursor(-100_000);

        term.queue(cursor::MoveToColumn(0))?;
        term.flush()?;

        ok!()
    }

    /// Like [`Self::exit()`], and the prompt text is dropped too, so nothing is drawn
    /// until a new prompt is set.
    pub fn blank(&mut self, term: &mut dyn Write) -> Result<(), ReadlineError> {
        self.exit(term)?;
        self.prompt.clear();
        self.move_cursor(0);

        ok!()
    }

    /// Wipe the whole terminal and draw the prompt at the top left.
    pub fn clear_screen_and_flush(&mut self, term: &mut dyn Write) -> io::Result<()> {
        term.queue(Clear(All))?.queue(cursor::MoveTo(0, 0))?;
        self.last_line_completed = true;
        self.last_line_length = 0;
        self.render_and_flush(term)?;

        ok!()
    }

    /// Replace the whole edit buffer and put the cursor at the end of it.
    pub fn replace_line(&mut self, text: &str, term: &mut dyn Write) -> io::Result<()> {
        self.clear(term)?;
        self.line.clear();
        self.line.push_str(text);
        self.move_cursor(100_000);
        self.render_and_flush(term)?;

        ok!()
    }
}
