// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// This entry is always present, so that there is always something to complete to.
pub const BUILTIN_COMPLETION: &str = "exit";

/// Ordered, de-duplicated list of command strings that <kbd>Tab</kbd> can complete to.
/// Insertion order is preserved, and that is the order in which matches are offered.
///
/// The registry lives inside [`crate::ReadlineState`], so it is only ever read or
/// mutated while holding the same lock as the line editor. Use
/// [`crate::ReadlineBuffer::add_completion()`] to register commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRegistry {
    commands: Vec<String>,
}

impl Default for CompletionRegistry {
    fn default() -> Self {
        Self {
            commands: vec![BUILTIN_COMPLETION.to_string()],
        }
    }
}

impl CompletionRegistry {
    /// Append `command` unless it is already registered (exact match). Returns `true`
    /// if it was added.
    pub fn add(&mut self, command: impl Into<String>) -> bool {
        let command = command.into();
        if self.commands.contains(&command) {
            return false;
        }
        self.commands.push(command);
        true
    }

    #[must_use]
    pub fn all(&self) -> &[String] { &self.commands }

    #[must_use]
    pub fn len(&self) -> usize { self.commands.len() }

    /// Always `false` in practice, since [`BUILTIN_COMPLETION`] can't be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.commands.is_empty() }
}
