extern crate structopt;
extern crate thiserror;

pub mod driver;
pub mod memory;

pub use memory::{
    alloc::HeapScan,
    error::HeapError,
    header::ElementType,
    heap::{Heap, HeapSettings},
    marshal::Width,
    object::{ArrayRef, ObjectRef, RawRef, ReallocError},
    runtime::{ClassSizes, Runtime},
};
