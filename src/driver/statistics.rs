//! Capture and report statistics for a simulated run

use std::fmt::Display;

use crate::memory::{alloc::HeapScan, heap::Heap, runtime::Runtime};

/// Operation counts and the final state of the heap
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    objects: u64,
    arrays: u64,
    frees: u64,
    reallocs: u64,
    failures: u64,
    heap_size: usize,
    heap_free: usize,
    regions: usize,
    scan: Option<HeapScan>,
}

impl Statistics {
    pub fn record_object(&mut self) {
        self.objects += 1;
    }

    pub fn record_array(&mut self) {
        self.arrays += 1;
    }

    pub fn record_free(&mut self) {
        self.frees += 1;
    }

    pub fn record_realloc(&mut self) {
        self.reallocs += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Capture sizes and a scan of the heap as it stands
    pub fn snapshot<R: Runtime>(&mut self, heap: &Heap<R>) {
        self.heap_size = heap.heap_size();
        self.heap_free = heap.heap_free();
        self.regions = heap.region_count();
        self.scan = heap.scan().ok();
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Objects        : {:10}", self.objects)?;
        writeln!(f, "Arrays         : {:10}", self.arrays)?;
        writeln!(f, "Frees          : {:10}", self.frees)?;
        writeln!(f, "Reallocs       : {:10}", self.reallocs)?;
        writeln!(f, "Failures       : {:10}", self.failures)?;
        writeln!(f)?;
        writeln!(f, "Regions        : {:10}", self.regions)?;
        writeln!(f, "Heap Size      : {:10}", self.heap_size)?;
        writeln!(f, "Heap Free      : {:10}", self.heap_free)?;
        match &self.scan {
            Some(scan) => {
                writeln!(f, "Blocks         : {:10}", scan.blocks)?;
                writeln!(f, "Free Blocks    : {:10}", scan.free_blocks)?;
                writeln!(f, "Largest Free   : {:10}", scan.largest_free_words * 2)
            }
            None => writeln!(f, "Blocks         :    corrupt"),
        }
    }
}
