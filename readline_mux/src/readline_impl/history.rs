// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::collections::VecDeque;

use crate::HISTORY_SIZE_MAX;

/// Bounded, in-memory ring of submitted lines. Newest entry is at the front. Nothing is
/// persisted across process restarts.
#[derive(Debug)]
pub struct History {
    pub entries: VecDeque<String>,
    pub max_size: usize,
    current_position: Option<usize>,
}

impl Default for History {
    fn default() -> Self { Self::new(HISTORY_SIZE_MAX) }
}

impl History {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::default(),
            max_size,
            current_position: Option::default(),
        }
    }
}

impl History {
    /// Add an entry to the front of the history, dropping the oldest one if the ring is
    /// full. Empty lines are ignored.
    pub fn add(&mut self, line: String) {
        if line.is_empty() {
            return;
        }
        self.entries.push_front(line);
        self.reset_position();
        self.entries.truncate(self.max_size);
    }

    /// Next [`Self::search_next()`] starts from the newest entry again.
    pub fn reset_position(&mut self) { self.current_position = None; }

    /// Shrink (or grow) the ring. Excess oldest entries are dropped immediately.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.entries.truncate(max_size);
        if let Some(index) = self.current_position
            && index >= self.entries.len()
        {
            self.current_position = None;
        }
    }

    /// Walk one step towards older entries (<kbd>Up</kbd>).
    pub fn search_next(&mut self) -> Option<&str> {
        if let Some(index) = &mut self.current_position {
            if *index + 1 < self.entries.len() {
                *index += 1;
            }
            Some(&self.entries[*index])
        } else if !self.entries.is_empty() {
            self.current_position = Some(0);
            Some(&self.entries[0])
        } else {
            None
        }
    }

    /// Walk one step towards newer entries (<kbd>Down</kbd>). Walking past the newest
    /// entry yields an empty line.
    pub fn search_previous(&mut self) -> Option<&str> {
        if let Some(index) = &mut self.current_position {
            if *index == 0 {
                self.current_position = None;
                return Some("");
            }
            *index -= 1;
            Some(&self.entries[*index])
        } else {
            None
        }
    }
}
