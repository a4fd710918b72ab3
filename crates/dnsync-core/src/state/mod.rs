// # Store Implementations
//
// This module provides implementations of the Store trait for
// different persistence strategies.

pub mod dataset;
pub mod file;
pub mod memory;

pub use dataset::Dataset;
pub use file::FileStore;
pub use memory::MemoryStore;
