//! Memory regions that make up the heap
//!
//! Each region reserves its first two words for the chain: the word
//! index of the next region (or [`NULL_INDEX`]) and the index of its
//! own end. Contents follow and begin life as a single free block.
//! Regions are prepended, so the most recently added region is the
//! first one scanned.

use std::fmt;

use log::debug;

use super::{
    error::HeapError,
    header::{Header, MAX_FREE_WORDS, WORD_BYTES},
};

/// Chain terminator
pub const NULL_INDEX: u16 = 0xffff;

/// Words of chain bookkeeping at the start of each region
pub const REGION_HEADER_WORDS: usize = 2;

/// A registered extent of heap memory, in word indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    base: usize,
    next: Option<usize>,
    end: usize,
}

impl Region {
    fn read(memory: &[u16], base: usize) -> Region {
        let next = memory[base];
        Region {
            base,
            next: (next != NULL_INDEX).then(|| usize::from(next)),
            end: usize::from(memory[base + 1]),
        }
    }

    /// Index of the first block
    pub fn contents(&self) -> usize {
        self.base + REGION_HEADER_WORDS
    }

    /// Index one past the last word
    pub fn end(&self) -> usize {
        self.end
    }

    /// Words available for blocks
    pub fn words(&self) -> usize {
        self.end - self.contents()
    }

    pub(crate) fn next(&self) -> Option<usize> {
        self.next
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#06x}..{:#06x} ({} words)",
            self.base * WORD_BYTES,
            self.end * WORD_BYTES,
            self.words()
        )
    }
}

/// Walks the region chain
pub struct Regions<'a> {
    memory: &'a [u16],
    next: Option<usize>,
}

impl<'a> Iterator for Regions<'a> {
    type Item = Region;

    fn next(&mut self) -> Option<Region> {
        let region = Region::read(self.memory, self.next?);
        self.next = region.next;
        Some(region)
    }
}

/// Chain head and space accounting for the heap
#[derive(Debug, Clone)]
pub struct RegionRegistry {
    head: Option<usize>,
    count: usize,
    total_words: usize,
    free_words: usize,
    segmented: bool,
}

impl RegionRegistry {
    /// Empty registry; a registry that is not `segmented` accepts only
    /// one region
    pub fn new(segmented: bool) -> Self {
        RegionRegistry {
            head: None,
            count: 0,
            total_words: 0,
            free_words: 0,
            segmented,
        }
    }

    /// Forget all regions and reset accounting to an empty heap
    pub fn init(&mut self) {
        self.head = None;
        self.count = 0;
        self.total_words = 0;
        self.free_words = 0;
    }

    /// Register the byte extent `start..end` of `memory`
    ///
    /// The start is rounded up and the end rounded down to whole words.
    /// The region's contents become one free block.
    pub fn add_region(
        &mut self,
        memory: &mut [u16],
        start: usize,
        end: usize,
    ) -> Result<Region, HeapError> {
        let invalid = |reason| HeapError::InvalidRegion { start, end, reason };

        if !self.segmented && self.count > 0 {
            return Err(HeapError::RegionLimit);
        }

        let base = (start + 1) / WORD_BYTES;
        let top = end / WORD_BYTES;

        if top > memory.len() {
            return Err(invalid("extends past the end of memory"));
        }
        if top >= usize::from(NULL_INDEX) {
            return Err(invalid("extends past the addressable range"));
        }
        if top <= base + REGION_HEADER_WORDS {
            return Err(invalid("too small to hold a block"));
        }
        let words = top - base - REGION_HEADER_WORDS;
        if words > MAX_FREE_WORDS {
            return Err(invalid("larger than a single free run"));
        }
        if self
            .iter(memory)
            .any(|region| base < region.end && region.base < top)
        {
            return Err(invalid("overlaps a registered region"));
        }

        memory[base] = self.head.map_or(NULL_INDEX, |head| head as u16);
        memory[base + 1] = top as u16;
        memory[base + REGION_HEADER_WORDS] = Header::Free { size: words as u16 }.encode();

        self.head = Some(base);
        self.count += 1;
        self.total_words += words;
        self.free_words += words;

        let region = Region::read(memory, base);
        debug!("added region {region}, heap now {} words", self.total_words);
        Ok(region)
    }

    /// Total heap size in bytes
    pub fn heap_size(&self) -> usize {
        self.total_words * WORD_BYTES
    }

    /// Free heap space in bytes
    pub fn heap_free(&self) -> usize {
        self.free_words * WORD_BYTES
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    pub fn free_words(&self) -> usize {
        self.free_words
    }

    /// Number of registered regions
    pub fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn head(&self) -> Option<usize> {
        self.head
    }

    /// Regions in scan order
    pub fn iter<'a>(&self, memory: &'a [u16]) -> Regions<'a> {
        Regions {
            memory,
            next: self.head,
        }
    }

    pub(crate) fn claim(&mut self, words: usize) {
        debug_assert!(words <= self.free_words);
        self.free_words -= words;
    }

    pub(crate) fn release(&mut self, words: usize) {
        self.free_words += words;
        debug_assert!(self.free_words <= self.total_words);
    }

    pub(crate) fn region_at(memory: &[u16], base: usize) -> Region {
        Region::read(memory, base)
    }
}
