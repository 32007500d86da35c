// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Mocks for the input and output devices, so that the line editor can be driven by a
//! script and its rendered output inspected, without a real terminal.

// Attach.
pub mod input_device_mock;
pub mod output_device_ext;
pub mod stdout_mock;

// Re-export.
pub use input_device_mock::*;
pub use output_device_ext::*;
pub use stdout_mock::*;
