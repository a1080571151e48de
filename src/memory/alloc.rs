//! First-fit block allocation over the region chain
//!
//! Free space is never indexed. Each request walks the regions block
//! by block, reading headers to step over allocated blocks and
//! merging runs of adjacent free blocks as it passes them. A free run
//! that fits is split so that its low end stays free and its high end
//! becomes the new block, which keeps the free header of a depleting
//! run at a stable address.

use log::{debug, trace};

use super::{
    error::HeapError,
    header::{align_words, Header, MAX_FREE_WORDS, WORD_BYTES},
    heap::HeapSettings,
    region::{Region, RegionRegistry},
    runtime::Runtime,
};

/// Word index of a block header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockAddr(u16);

impl BlockAddr {
    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(index < usize::from(u16::MAX));
        BlockAddr(index as u16)
    }

    /// Word index of the header
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Byte address of the header
    pub fn byte_address(self) -> u32 {
        u32::from(self.0) * WORD_BYTES as u32
    }
}

/// Result of a read-only walk over every region
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapScan {
    pub regions: usize,
    pub blocks: usize,
    pub free_blocks: usize,
    pub free_words: usize,
    /// Largest request that would currently succeed, in words
    pub largest_free_words: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct BlockAllocator {
    registry: RegionRegistry,
    alignment: usize,
    coalesce: bool,
}

impl BlockAllocator {
    /// Allocator for validated settings
    pub fn new(settings: &HeapSettings) -> Self {
        BlockAllocator {
            registry: RegionRegistry::new(settings.segmented),
            alignment: usize::from(settings.alignment),
            coalesce: settings.coalesce,
        }
    }

    pub fn align(&self, words: usize) -> usize {
        align_words(words, self.alignment)
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RegionRegistry {
        &mut self.registry
    }

    /// Find and claim a block of at least `words` words
    ///
    /// The returned block still carries whatever header the split left
    /// behind; the caller must tag it before memory is walked again.
    pub fn allocate<R: Runtime + ?Sized>(
        &mut self,
        memory: &mut [u16],
        runtime: &R,
        words: usize,
    ) -> Result<BlockAddr, HeapError> {
        let words = self.align(words.max(1));
        let out_of_memory = |free| HeapError::OutOfMemory {
            requested: words,
            free,
        };

        if words > MAX_FREE_WORDS {
            return Err(out_of_memory(self.registry.free_words()));
        }

        let mut next = self.registry.head();
        while let Some(base) = next {
            let region = RegionRegistry::region_at(memory, base);
            if let Some(block) = self.allocate_in(memory, runtime, &region, words)? {
                self.registry.claim(words);
                debug!(
                    "allocated {} words at {:#06x}, {} words free",
                    words,
                    block.byte_address(),
                    self.registry.free_words()
                );
                return Ok(block);
            }
            next = region.next();
        }

        Err(out_of_memory(self.registry.free_words()))
    }

    fn allocate_in<R: Runtime + ?Sized>(
        &self,
        memory: &mut [u16],
        runtime: &R,
        region: &Region,
        words: usize,
    ) -> Result<Option<BlockAddr>, HeapError> {
        let end = region.end();
        let mut cursor = region.contents();

        while cursor < end {
            match read_header(memory, cursor)? {
                Header::Free { size } => {
                    let mut size = usize::from(size);
                    if self.coalesce {
                        size = coalesce_at(memory, cursor, end, size);
                    }
                    if size >= words {
                        let remaining = size - words;
                        if remaining > 0 {
                            memory[cursor] = free_header(remaining);
                            trace!(
                                "split free run at word {cursor}: {remaining} free, {words} taken"
                            );
                        }
                        return Ok(Some(BlockAddr::new(cursor + remaining)));
                    }
                    trace!("free run of {size} words at word {cursor} too small");
                    cursor += size;
                }
                allocated => {
                    cursor += self.align(allocated.block_words(runtime));
                }
            }
        }

        Ok(None)
    }

    /// Return a block of `words` words to free space
    ///
    /// `words` must be the size the block was allocated with. Callers
    /// recompute it from the block header, never from outside input.
    pub(crate) fn deallocate(&mut self, memory: &mut [u16], block: BlockAddr, words: usize) {
        let words = self.align(words.max(1));
        memory[block.index()] = free_header(words);
        self.registry.release(words);
        debug!(
            "released {} words at {:#06x}, {} words free",
            words,
            block.byte_address(),
            self.registry.free_words()
        );
    }

    /// Walk every region without modifying it
    ///
    /// Fails if any walk does not end exactly at its region's end.
    pub fn scan<R: Runtime + ?Sized>(
        &self,
        memory: &[u16],
        runtime: &R,
    ) -> Result<HeapScan, HeapError> {
        let mut scan = HeapScan::default();

        for region in self.registry.iter(memory) {
            scan.regions += 1;
            let end = region.end();
            let mut cursor = region.contents();
            let mut last = cursor;
            let mut run = 0;

            while cursor < end {
                last = cursor;
                scan.blocks += 1;
                match read_header(memory, cursor)? {
                    Header::Free { size } => {
                        let size = usize::from(size);
                        scan.free_blocks += 1;
                        scan.free_words += size;
                        run = if self.coalesce { run + size } else { size };
                        scan.largest_free_words = scan.largest_free_words.max(run);
                        cursor += size;
                    }
                    allocated => {
                        run = 0;
                        cursor += self.align(allocated.block_words(runtime));
                    }
                }
            }

            if cursor != end {
                return Err(HeapError::CorruptHeader {
                    address: last,
                    header: memory[last],
                });
            }
        }

        Ok(scan)
    }
}

fn free_header(words: usize) -> u16 {
    debug_assert!(words <= MAX_FREE_WORDS);
    Header::Free { size: words as u16 }.encode()
}

/// Decode the header at `index`, treating undecodable words and empty
/// free runs as corruption
fn read_header(memory: &[u16], index: usize) -> Result<Header, HeapError> {
    let word = memory[index];
    let corrupt = HeapError::CorruptHeader {
        address: index,
        header: word,
    };
    match Header::decode(word) {
        Ok(Header::Free { size: 0 }) | Err(_) => Err(corrupt),
        Ok(header) => Ok(header),
    }
}

/// Merge the free blocks following the run at `cursor` into it,
/// returning the combined size
fn coalesce_at(memory: &mut [u16], cursor: usize, end: usize, mut size: usize) -> usize {
    loop {
        let next = cursor + size;
        if next >= end {
            break;
        }
        let following = match Header::decode(memory[next]) {
            Ok(Header::Free { size }) if size > 0 => usize::from(size),
            _ => break,
        };
        if size + following > MAX_FREE_WORDS {
            break;
        }
        size += following;
        memory[cursor] = free_header(size);
        trace!("merged free run at word {next} into word {cursor}, now {size} words");
    }
    size
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::memory::{
        header::{array_words, ElementType},
        runtime::ClassSizes,
    };

    fn allocator(coalesce: bool) -> (Vec<u16>, BlockAllocator) {
        let settings = HeapSettings {
            coalesce,
            ..HeapSettings::default()
        };
        let mut memory = vec![0u16; 64];
        let mut allocator = BlockAllocator::new(&settings);
        allocator
            .registry_mut()
            .add_region(&mut memory, 0, 128)
            .unwrap();
        (memory, allocator)
    }

    /// Allocate and tag as a byte array spanning exactly `words` words
    fn take(memory: &mut [u16], allocator: &mut BlockAllocator, words: usize) -> BlockAddr {
        let block = allocator
            .allocate(memory, &ClassSizes::default(), words)
            .unwrap();
        let length = ((words - 2) * WORD_BYTES) as u32;
        let header = Header::array(ElementType::Byte, length).unwrap();
        assert_eq!(array_words(ElementType::Byte, length as u16), words);
        memory[block.index()] = header.encode();
        block
    }

    #[test]
    pub fn test_split_takes_high_end() {
        let (mut memory, mut allocator) = allocator(true);

        let first = take(&mut memory, &mut allocator, 10);
        assert_eq!(first.index(), 54);
        assert_eq!(Header::decode(memory[2]).unwrap(), Header::Free { size: 52 });

        let second = take(&mut memory, &mut allocator, 10);
        assert_eq!(second.index(), 44);
        assert_eq!(Header::decode(memory[2]).unwrap(), Header::Free { size: 42 });
        assert_eq!(allocator.registry().free_words(), 42);
    }

    #[test]
    pub fn test_exact_fit_takes_whole_run() {
        let (mut memory, mut allocator) = allocator(true);
        let block = take(&mut memory, &mut allocator, 62);
        assert_eq!(block.index(), 2);
        assert_eq!(allocator.registry().free_words(), 0);
    }

    #[test]
    pub fn test_requests_are_rounded_to_alignment() {
        let (mut memory, mut allocator) = allocator(true);
        let classes = ClassSizes::default();
        let block = allocator.allocate(&mut memory, &classes, 5).unwrap();
        assert_eq!(block.index(), 56);
        assert_eq!(allocator.registry().free_words(), 56);
    }

    #[test]
    pub fn test_coalescing_merges_adjacent_frees() {
        let (mut memory, mut allocator) = allocator(true);
        let a = take(&mut memory, &mut allocator, 20);
        let b = take(&mut memory, &mut allocator, 20);
        let _c = take(&mut memory, &mut allocator, 22);
        assert_eq!((a.index(), b.index()), (44, 24));

        allocator.deallocate(&mut memory, a, 20);
        allocator.deallocate(&mut memory, b, 20);
        assert_eq!(allocator.registry().free_words(), 40);

        let merged = allocator
            .allocate(&mut memory, &ClassSizes::default(), 40)
            .unwrap();
        assert_eq!(merged.index(), 24);
    }

    #[test]
    pub fn test_fragmentation_without_coalescing() {
        let (mut memory, mut allocator) = allocator(false);
        let a = take(&mut memory, &mut allocator, 20);
        let b = take(&mut memory, &mut allocator, 20);
        let _c = take(&mut memory, &mut allocator, 22);

        allocator.deallocate(&mut memory, a, 20);
        allocator.deallocate(&mut memory, b, 20);

        let classes = ClassSizes::default();
        assert_eq!(
            allocator.allocate(&mut memory, &classes, 40),
            Err(HeapError::OutOfMemory {
                requested: 40,
                free: 40
            })
        );
        assert!(allocator.allocate(&mut memory, &classes, 20).is_ok());
    }

    #[test]
    pub fn test_accounting_round_trip() {
        let (mut memory, mut allocator) = allocator(true);
        let before = allocator.registry().heap_free();

        let blocks: Vec<(BlockAddr, usize)> = [4, 6, 10, 8]
            .iter()
            .map(|&words| (take(&mut memory, &mut allocator, words), words))
            .collect();
        assert_eq!(allocator.registry().free_words(), 62 - 28);

        for (block, words) in blocks.into_iter().rev() {
            allocator.deallocate(&mut memory, block, words);
        }
        assert_eq!(allocator.registry().heap_free(), before);

        let scan = allocator.scan(&memory, &ClassSizes::default()).unwrap();
        assert_eq!(scan.free_words, 62);
        assert_eq!(scan.largest_free_words, 62);
    }

    #[test]
    pub fn test_scan_reports_blocks() {
        let (mut memory, mut allocator) = allocator(true);
        take(&mut memory, &mut allocator, 10);
        take(&mut memory, &mut allocator, 10);

        let scan = allocator.scan(&memory, &ClassSizes::default()).unwrap();
        assert_eq!(
            scan,
            HeapScan {
                regions: 1,
                blocks: 3,
                free_blocks: 1,
                free_words: 42,
                largest_free_words: 42,
            }
        );
    }

    #[test]
    pub fn test_corrupt_header_detected() {
        let (mut memory, mut allocator) = allocator(true);
        memory[2] = 0;
        let classes = ClassSizes::default();
        assert_eq!(
            allocator.allocate(&mut memory, &classes, 4),
            Err(HeapError::CorruptHeader {
                address: 2,
                header: 0
            })
        );
        assert!(allocator.scan(&memory, &classes).is_err());
    }

    #[test]
    pub fn test_later_region_used_when_first_is_full() {
        let settings = HeapSettings::default();
        let mut memory = vec![0u16; 64];
        let mut allocator = BlockAllocator::new(&settings);
        allocator
            .registry_mut()
            .add_region(&mut memory, 0, 40)
            .unwrap();
        allocator
            .registry_mut()
            .add_region(&mut memory, 64, 128)
            .unwrap();

        // newest region (30 words) first, then the older one (18 words)
        let big = take(&mut memory, &mut allocator, 30);
        assert_eq!(big.index(), 34);
        let small = take(&mut memory, &mut allocator, 18);
        assert_eq!(small.index(), 2);
    }
}
