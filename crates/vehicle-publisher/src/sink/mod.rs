//! # Sink Module
//!
//! Synchronous observers that map snapshots onto the published payload.

pub mod console;
pub mod file;
pub mod memory;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use memory::{MemoryHandle, MemorySink};
