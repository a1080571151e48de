//! Host-side simulation of the interpreter heap
pub mod config;
pub mod error;
pub mod options;
pub mod script;
pub mod simulate;
pub mod statistics;
