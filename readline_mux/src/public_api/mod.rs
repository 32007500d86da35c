// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod line_status;
pub mod output_interceptor;
pub mod readline_buffer;
pub mod readline_config;
pub mod suspend_readline;

// Re-export.
pub use line_status::*;
pub use output_interceptor::*;
pub use readline_buffer::*;
pub use readline_config::*;
pub use suspend_readline::*;
