// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use smallvec::SmallVec;

/// Disambiguate the type of `StdMutex` from stdlib and tokio to avoid conflicts.
pub type StdMutex<T> = std::sync::Mutex<T>;

/// Type alias for a `Send`-able output device (raw terminal, interceptor, mock, etc).
pub type SendRawTerminal = dyn std::io::Write + Send;
/// Type alias for a `Send`-able raw terminal wrapped in an `Arc<StdMutex>`.
pub type SafeRawTerminal = std::sync::Arc<StdMutex<SendRawTerminal>>;

/// Most completion requests match a handful of candidates.
pub type InlineVec<T> = SmallVec<[T; DEFAULT_INLINE_VEC_SIZE]>;
pub const DEFAULT_INLINE_VEC_SIZE: usize = 8;

/// Result type that lets the caller pick the error type. See [`crate::ReadlineError`].
pub type CommonResultWithError<T, E> = Result<T, E>;
