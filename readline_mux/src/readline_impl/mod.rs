// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod completion_registry;
pub mod completion_scan;
pub mod history;
pub mod line_state;
pub mod readline_state;
pub mod readline_step;

// Re-export.
pub use completion_registry::*;
pub use completion_scan::*;
pub use history::*;
pub use line_state::*;
pub use readline_state::*;
pub use readline_step::*;
