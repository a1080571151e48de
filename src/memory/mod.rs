//! Heap memory management for a small-footprint byte-code interpreter
pub mod alloc;
pub mod error;
pub mod header;
pub mod heap;
pub mod marshal;
pub mod object;
pub mod region;
pub mod runtime;
