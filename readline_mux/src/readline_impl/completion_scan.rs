// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CompletionRegistry, InlineVec};

/// Generator that walks the [`CompletionRegistry`] one match at a time. It is called
/// repeatedly for a single completion request:
/// - `state == 0` starts a new request, the scan cursor goes back to the start of the
///   registry and the length of the typed word is remembered.
/// - Each call resumes from where the previous one stopped, and returns the next command
///   that starts with the typed word.
/// - [`None`] means the registry is exhausted.
///
/// Only the registry is consulted. There's no fallback to file name completion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompletionScan {
    list_index: usize,
    prefix_len: usize,
}

impl CompletionScan {
    pub fn next_match<'a>(
        &mut self,
        registry: &'a CompletionRegistry,
        text: &str,
        state: usize,
    ) -> Option<&'a str> {
        if state == 0 {
            self.list_index = 0;
            self.prefix_len = text.len();
        }

        let prefix = text.get(..self.prefix_len).unwrap_or(text);
        let commands = registry.all();
        while self.list_index < commands.len() {
            let command = &commands[self.list_index];
            self.list_index += 1;
            if command.starts_with(prefix) {
                return Some(command);
            }
        }

        None
    }

    /// Run a whole completion request, and collect every match in registry order.
    pub fn collect_matches(
        &mut self,
        registry: &CompletionRegistry,
        text: &str,
    ) -> InlineVec<String> {
        let mut acc = InlineVec::new();
        let mut state = 0;
        while let Some(it) = self.next_match(registry, text, state) {
            acc.push(it.to_string());
            state += 1;
        }
        acc
    }
}

/// The longest prefix that all `matches` share, respecting char boundaries.
#[must_use]
pub fn longest_common_prefix(matches: &[String]) -> &str {
    let Some((first, rest)) = matches.split_first() else {
        return "";
    };
    let mut end = first.len();
    for other in rest {
        end = first
            .char_indices()
            .zip(other.chars())
            .take_while(|((_, lhs), rhs)| lhs == rhs)
            .last()
            .map_or(0, |((index, ch), _)| index + ch.len_utf8())
            .min(end);
    }
    &first[..end]
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn registry_with(commands: &[&str]) -> CompletionRegistry {
        let mut registry = CompletionRegistry::default();
        for command in commands {
            registry.add(*command);
        }
        registry
    }

    #[test_case("s", &["sync"] ; "prefix s")]
    #[test_case("e", &["exit"] ; "prefix e")]
    #[test_case("x", &[] ; "no match")]
    fn test_exit_and_sync(prefix: &str, expected: &[&str]) {
        let registry = registry_with(&["sync"]);
        let matches = CompletionScan::default().collect_matches(&registry, prefix);
        assert_eq!(matches.as_slice(), expected);
    }

    #[test]
    fn test_generator_resumes_from_cursor() {
        let registry = registry_with(&["start", "status", "stop", "help"]);
        let mut scan = CompletionScan::default();

        assert_eq!(scan.next_match(&registry, "st", 0), Some("start"));
        assert_eq!(scan.next_match(&registry, "st", 1), Some("status"));
        assert_eq!(scan.next_match(&registry, "st", 2), Some("stop"));
        assert_eq!(scan.next_match(&registry, "st", 3), None);
        assert_eq!(scan.next_match(&registry, "st", 4), None);
    }

    #[test]
    fn test_repeated_requests_enumerate_each_match_once() {
        let registry = registry_with(&["set_log", "status", "save", "set_limit", "sync"]);
        let mut scan = CompletionScan::default();

        let first = scan.collect_matches(&registry, "s");
        let second = scan.collect_matches(&registry, "s");

        pretty_assertions::assert_eq!(
            first.as_slice(),
            ["set_log", "status", "save", "set_limit", "sync"]
        );
        pretty_assertions::assert_eq!(first, second);
    }

    #[test]
    fn test_empty_prefix_matches_everything() {
        let registry = registry_with(&["help"]);
        let matches = CompletionScan::default().collect_matches(&registry, "");
        assert_eq!(matches.as_slice(), ["exit", "help"]);
    }

    #[test_case(&["set_log", "set_limit"], "set_l" ; "shared prefix")]
    #[test_case(&["status"], "status" ; "single")]
    #[test_case(&["abc", "xyz"], "" ; "nothing shared")]
    #[test_case(&[], "" ; "empty")]
    #[test_case(&["héllo", "hélp"], "hél" ; "multibyte")]
    fn test_longest_common_prefix(matches: &[&str], expected: &str) {
        let matches = matches.iter().map(|it| (*it).to_string()).collect::<Vec<_>>();
        assert_eq!(longest_common_prefix(&matches), expected);
    }
}
