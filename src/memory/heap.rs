//! The heap context
//!
//! A [`Heap`] owns no memory of its own. It borrows the word array
//! supplied at bring-up, registers regions within it and carves
//! objects and arrays out of them on behalf of a [`Runtime`].

use log::warn;

use super::{
    alloc::{BlockAddr, BlockAllocator, HeapScan},
    error::HeapError,
    header::{Header, WORD_BYTES},
    region::{Region, Regions},
    runtime::Runtime,
};

/// Largest supported alignment granularity, in words
pub const MAX_ALIGNMENT: u16 = 16;

/// Heap behaviour fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapSettings {
    /// Block sizes are rounded up to a multiple of this many words
    pub alignment: u16,
    /// Merge adjacent free blocks while scanning for space
    pub coalesce: bool,
    /// Allow more than one region
    pub segmented: bool,
}

impl Default for HeapSettings {
    fn default() -> Self {
        HeapSettings {
            alignment: 2,
            coalesce: true,
            segmented: true,
        }
    }
}

impl HeapSettings {
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.alignment.is_power_of_two() && self.alignment <= MAX_ALIGNMENT {
            Ok(())
        } else {
            Err(HeapError::InvalidAlignment(self.alignment))
        }
    }
}

/// Heap built over borrowed memory
pub struct Heap<'m, R: Runtime> {
    memory: &'m mut [u16],
    allocator: BlockAllocator,
    runtime: R,
    settings: HeapSettings,
}

impl<'m, R: Runtime> Heap<'m, R> {
    /// Empty heap with default settings
    pub fn new(memory: &'m mut [u16], runtime: R) -> Self {
        let settings = HeapSettings::default();
        Heap {
            memory,
            allocator: BlockAllocator::new(&settings),
            runtime,
            settings,
        }
    }

    /// Empty heap with the specified settings
    pub fn with_settings(
        memory: &'m mut [u16],
        runtime: R,
        settings: HeapSettings,
    ) -> Result<Self, HeapError> {
        settings.validate()?;
        Ok(Heap {
            memory,
            allocator: BlockAllocator::new(&settings),
            runtime,
            settings,
        })
    }

    /// Forget every region, leaving an empty heap
    pub fn init(&mut self) {
        self.allocator.registry_mut().init();
    }

    /// Register the byte range `start..end` of the borrowed memory
    pub fn add_region(&mut self, start: usize, end: usize) -> Result<Region, HeapError> {
        self.allocator
            .registry_mut()
            .add_region(&mut *self.memory, start, end)
    }

    /// Total size of all regions in bytes
    pub fn heap_size(&self) -> usize {
        self.allocator.registry().heap_size()
    }

    /// Free space in bytes
    pub fn heap_free(&self) -> usize {
        self.allocator.registry().heap_free()
    }

    pub fn region_count(&self) -> usize {
        self.allocator.registry().count()
    }

    /// Registered regions, most recently added first
    pub fn regions(&self) -> Regions<'_> {
        self.allocator.registry().iter(&*self.memory)
    }

    /// Walk all blocks, reporting free space and fragmentation
    pub fn scan(&self) -> Result<HeapScan, HeapError> {
        self.allocator.scan(&*self.memory, &self.runtime)
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    /// Allocate a block for `header`, tag it and zero its contents
    ///
    /// Exhaustion is signalled to the runtime before it is returned.
    pub(crate) fn allocate(&mut self, header: Header) -> Result<BlockAddr, HeapError> {
        let words = header.block_words(&self.runtime);
        match self.allocator.allocate(&mut *self.memory, &self.runtime, words) {
            Ok(block) => {
                self.tag(block, header, words);
                Ok(block)
            }
            Err(e @ HeapError::OutOfMemory { .. }) => {
                warn!("{e}");
                self.runtime.out_of_memory();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn tag(&mut self, block: BlockAddr, header: Header, words: usize) {
        let start = block.index();
        let end = start + self.allocator.align(words);
        self.memory[start] = header.encode();
        self.memory[start + 1..end].fill(0);
    }

    /// Release a block with the size recorded in its header
    pub(crate) fn release(&mut self, block: BlockAddr, header: Header) {
        let words = header.block_words(&self.runtime);
        self.allocator.deallocate(&mut *self.memory, block, words);
    }

    /// Header of an allocated block
    pub(crate) fn header(&self, block: BlockAddr) -> Result<Header, HeapError> {
        let word = self.memory[block.index()];
        Header::decode(word).map_err(|_| HeapError::CorruptHeader {
            address: block.index(),
            header: word,
        })
    }

    /// Find the allocated block whose header is at `index`, walking its
    /// region so that only true block boundaries are accepted
    pub(crate) fn find_block(&self, index: usize) -> Option<(BlockAddr, Header)> {
        let region = self
            .regions()
            .find(|region| region.contents() <= index && index < region.end())?;

        let mut cursor = region.contents();
        while cursor < index {
            let header = Header::decode(self.memory[cursor]).ok()?;
            let words = match header {
                Header::Free { size } => usize::from(size),
                allocated => self
                    .allocator
                    .align(allocated.block_words(&self.runtime)),
            };
            if words == 0 {
                return None;
            }
            cursor += words;
        }

        if cursor != index || !Header::is_allocated(self.memory[index]) {
            return None;
        }
        let header = Header::decode(self.memory[index]).ok()?;
        Some((BlockAddr::new(index), header))
    }

    pub(crate) fn read_bytes(&self, address: usize, out: &mut [u8]) {
        for (offset, byte) in out.iter_mut().enumerate() {
            *byte = self.read_byte(address + offset);
        }
    }

    pub(crate) fn write_bytes(&mut self, address: usize, bytes: &[u8]) {
        for (offset, byte) in bytes.iter().enumerate() {
            self.write_byte(address + offset, *byte);
        }
    }

    /// Copy `count` bytes between non-overlapping payloads
    pub(crate) fn copy_bytes(&mut self, from: usize, to: usize, count: usize) {
        for offset in 0..count {
            let byte = self.read_byte(from + offset);
            self.write_byte(to + offset, byte);
        }
    }

    /// Even byte addresses are the high byte of their word
    fn read_byte(&self, address: usize) -> u8 {
        let word = self.memory[address / WORD_BYTES];
        if address % WORD_BYTES == 0 {
            (word >> 8) as u8
        } else {
            word as u8
        }
    }

    fn write_byte(&mut self, address: usize, byte: u8) {
        let word = &mut self.memory[address / WORD_BYTES];
        *word = if address % WORD_BYTES == 0 {
            (*word & 0x00ff) | (u16::from(byte) << 8)
        } else {
            (*word & 0xff00) | u16::from(byte)
        };
    }
}
