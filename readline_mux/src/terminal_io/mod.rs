// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Private modules (hide internal structure).
mod console_output;
mod input_device;
mod output_device;

// Re-exports for flat public API.
pub use console_output::*;
pub use input_device::*;
pub use output_device::*;
