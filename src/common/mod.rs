//! Shared infrastructure used across the OLE, PPT and XLS layers.

pub mod binary;
pub mod error;
