//! The interpreter services the heap depends on

use super::header::HEADER_WORDS;

/// Collaborators consumed by the heap
///
/// The class table is assumed stable for the life of the heap: the
/// allocator relies on it to step over allocated objects.
pub trait Runtime {
    /// Total size in words of an instance of the class, header included
    fn class_size(&self, class_index: u8) -> u16;

    /// Raise the interpreter's out-of-memory condition
    fn out_of_memory(&mut self);
}

/// A class table of instance sizes
///
/// Counts out-of-memory signals rather than raising anything.
#[derive(Debug, Clone, Default)]
pub struct ClassSizes {
    sizes: Vec<u16>,
    oom_raised: usize,
}

impl ClassSizes {
    pub fn new(sizes: Vec<u16>) -> Self {
        ClassSizes {
            sizes,
            oom_raised: 0,
        }
    }

    /// Number of classes in the table
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Out-of-memory signals raised so far
    pub fn oom_raised(&self) -> usize {
        self.oom_raised
    }
}

impl Runtime for ClassSizes {
    /// Unknown classes are sized as a bare header
    fn class_size(&self, class_index: u8) -> u16 {
        self.sizes
            .get(usize::from(class_index))
            .copied()
            .unwrap_or(HEADER_WORDS as u16)
    }

    fn out_of_memory(&mut self) {
        self.oom_raised += 1;
    }
}
