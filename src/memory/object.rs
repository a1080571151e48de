//! Objects and arrays
//!
//! Constructors hand out owning handles. [`ObjectRef`] and [`ArrayRef`]
//! are neither `Copy` nor `Clone` and freeing consumes them, so a
//! handle cannot be released twice. The interpreter's own view of a
//! reference is a [`RawRef`], the block's byte address, which converts
//! back to a handle only after the header at that address is checked.

use std::{cmp::min, fmt};

use log::{debug, warn};
use thiserror::Error;

use super::{
    alloc::BlockAddr,
    error::HeapError,
    header::{ElementType, Header, HEADER_WORDS, WORD_BYTES},
    heap::Heap,
    marshal::{bytes_from_word, unsigned_word_from_bytes, word_from_bytes, Width},
    runtime::Runtime,
};

const HEADER_BYTES: usize = HEADER_WORDS * WORD_BYTES;

/// A reference as stored on the operand stack or in a reference array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawRef(u32);

impl RawRef {
    pub const NULL: RawRef = RawRef(0);

    pub fn new(address: u32) -> Self {
        RawRef(address)
    }

    /// Byte address of the block header
    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RawRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{:#06x}", self.0)
        }
    }
}

/// Owning handle to an object block
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectRef(BlockAddr);

impl ObjectRef {
    pub fn raw(&self) -> RawRef {
        RawRef(self.0.byte_address())
    }

    fn payload(&self) -> usize {
        self.0.byte_address() as usize + HEADER_BYTES
    }
}

/// Owning handle to an array block
#[derive(Debug, PartialEq, Eq)]
pub struct ArrayRef(BlockAddr);

impl ArrayRef {
    pub fn raw(&self) -> RawRef {
        RawRef(self.0.byte_address())
    }

    /// Give up the handle, leaving only the raw reference
    pub fn into_raw(self) -> RawRef {
        self.raw()
    }

    fn payload(&self) -> usize {
        self.0.byte_address() as usize + HEADER_BYTES
    }
}

/// Failed reallocation; the original array is returned untouched
#[derive(Debug, Error)]
#[error("cannot reallocate array: {error}")]
pub struct ReallocError {
    pub array: ArrayRef,
    #[source]
    pub error: HeapError,
}

impl<'m, R: Runtime> Heap<'m, R> {
    /// Allocate a zeroed instance of a class
    pub fn new_object(&mut self, class_index: u8) -> Result<ObjectRef, HeapError> {
        let block = self.allocate(Header::Object { class_index })?;
        debug!("new object of class {class_index} at {:#06x}", block.byte_address());
        Ok(ObjectRef(block))
    }

    /// Allocate a zeroed one-dimensional array
    ///
    /// Lengths beyond the header's length field are reported to the
    /// runtime as out of memory without touching the heap.
    pub fn new_primitive_array(
        &mut self,
        element_type: ElementType,
        length: u32,
    ) -> Result<ArrayRef, HeapError> {
        let header = match Header::array(element_type, length) {
            Ok(header) => header,
            Err(e) => {
                warn!("{e}");
                self.runtime_mut().out_of_memory();
                return Err(e);
            }
        };
        let block = self.allocate(header)?;
        debug!(
            "new {element_type}[{length}] at {:#06x}",
            block.byte_address()
        );
        Ok(ArrayRef(block))
    }

    /// Allocate an array of arrays, materialising `requested` of the
    /// `total` dimensions
    ///
    /// Returns `None` when no dimensions are requested. Inner arrays are
    /// built in ascending index order, slot 0 first, so earlier slots sit
    /// at higher addresses. Dimensions beyond those requested are left
    /// as null references. If an inner allocation fails, the outer
    /// array and the lower-indexed inner arrays already built stay
    /// allocated.
    pub fn new_multi_array(
        &mut self,
        element_type: ElementType,
        total: u8,
        requested: u8,
        lengths: &[u32],
    ) -> Result<Option<ArrayRef>, HeapError> {
        if requested == 0 {
            return Ok(None);
        }
        if total == 0 || requested > total || lengths.len() < usize::from(requested) {
            return Err(HeapError::InvalidDimensions {
                total,
                requested,
                lengths: lengths.len(),
            });
        }
        if total == 1 {
            return self.new_primitive_array(element_type, lengths[0]).map(Some);
        }

        let outer = self.new_primitive_array(ElementType::Reference, lengths[0])?;
        for index in 0..lengths[0] {
            let inner =
                self.new_multi_array(element_type, total - 1, requested - 1, &lengths[1..])?;
            if let Some(inner) = inner {
                let address = outer.payload() + index as usize * ElementType::Reference.size();
                self.store(address, inner.into_raw().get() as i32, Width::Int);
            }
        }
        Ok(Some(outer))
    }

    /// Release an array
    ///
    /// A block already released through an aliasing handle is refused
    /// with `WrongKind` and the heap is left unchanged.
    pub fn free_array(&mut self, array: ArrayRef) -> Result<(), HeapError> {
        match self.header(array.0)? {
            header @ Header::Array { .. } => {
                self.release(array.0, header);
                Ok(())
            }
            _ => Err(HeapError::WrongKind {
                reference: array.raw().get(),
                expected: "an array",
            }),
        }
    }

    /// Release an object
    pub fn free_object(&mut self, object: ObjectRef) -> Result<(), HeapError> {
        match self.header(object.0)? {
            header @ Header::Object { .. } => {
                self.release(object.0, header);
                Ok(())
            }
            _ => Err(HeapError::WrongKind {
                reference: object.raw().get(),
                expected: "an object",
            }),
        }
    }

    /// Move an array's contents into a new array of `length` elements
    ///
    /// The first `min(old, new)` elements are copied and any further
    /// elements are zero. On failure the old array is handed back as it
    /// was.
    pub fn reallocate_array(
        &mut self,
        array: ArrayRef,
        length: u32,
    ) -> Result<ArrayRef, ReallocError> {
        let header = match self.header(array.0) {
            Ok(header) => header,
            Err(error) => return Err(ReallocError { array, error }),
        };
        let (element_type, old_length) = match header {
            Header::Array {
                element_type,
                length,
            } => (element_type, length),
            _ => {
                let error = HeapError::WrongKind {
                    reference: array.raw().get(),
                    expected: "an array",
                };
                return Err(ReallocError { array, error });
            }
        };

        let fresh = match self.new_primitive_array(element_type, length) {
            Ok(fresh) => fresh,
            Err(error) => return Err(ReallocError { array, error }),
        };

        let kept = min(u32::from(old_length), length) as usize;
        self.copy_bytes(array.payload(), fresh.payload(), kept * element_type.size());
        self.release(array.0, header);
        Ok(fresh)
    }

    /// Checked conversion of a raw reference to an array handle
    ///
    /// The handle returned aliases whatever handle originally owned the
    /// block. Freeing both is refused the second time with `WrongKind`.
    pub fn array_ref(&self, raw: RawRef) -> Result<ArrayRef, HeapError> {
        match self.block_for(raw) {
            Some((block, Header::Array { .. })) => Ok(ArrayRef(block)),
            _ => Err(HeapError::WrongKind {
                reference: raw.get(),
                expected: "an array",
            }),
        }
    }

    /// Checked conversion of a raw reference to an object handle
    pub fn object_ref(&self, raw: RawRef) -> Result<ObjectRef, HeapError> {
        match self.block_for(raw) {
            Some((block, Header::Object { .. })) => Ok(ObjectRef(block)),
            _ => Err(HeapError::WrongKind {
                reference: raw.get(),
                expected: "an object",
            }),
        }
    }

    fn block_for(&self, raw: RawRef) -> Option<(BlockAddr, Header)> {
        let address = raw.get() as usize;
        if raw.is_null() || address % WORD_BYTES != 0 {
            return None;
        }
        self.find_block(address / WORD_BYTES)
    }

    pub fn array_length(&self, array: &ArrayRef) -> Result<u16, HeapError> {
        self.array_header(array).map(|(_, length)| length)
    }

    pub fn element_type(&self, array: &ArrayRef) -> Result<ElementType, HeapError> {
        self.array_header(array).map(|(element_type, _)| element_type)
    }

    pub fn class_index(&self, object: &ObjectRef) -> Result<u8, HeapError> {
        match self.header(object.0)? {
            Header::Object { class_index } => Ok(class_index),
            _ => Err(HeapError::WrongKind {
                reference: object.raw().get(),
                expected: "an object",
            }),
        }
    }

    /// Copy of an array's payload bytes
    pub fn array_payload(&self, array: &ArrayRef) -> Result<Vec<u8>, HeapError> {
        let (element_type, length) = self.array_header(array)?;
        let mut bytes = vec![0u8; usize::from(length) * element_type.size()];
        self.read_bytes(array.payload(), &mut bytes);
        Ok(bytes)
    }

    /// Copy of an object's payload bytes
    pub fn object_payload(&self, object: &ObjectRef) -> Result<Vec<u8>, HeapError> {
        let header = self.header(object.0)?;
        let words = header.block_words(self.runtime()) - HEADER_WORDS;
        let mut bytes = vec![0u8; words * WORD_BYTES];
        self.read_bytes(object.payload(), &mut bytes);
        Ok(bytes)
    }

    fn array_header(&self, array: &ArrayRef) -> Result<(ElementType, u16), HeapError> {
        match self.header(array.0)? {
            Header::Array {
                element_type,
                length,
            } => Ok((element_type, length)),
            _ => Err(HeapError::WrongKind {
                reference: array.raw().get(),
                expected: "an array",
            }),
        }
    }

    /// Byte address of element `index`, checking bounds and that the
    /// element is `width` bytes wide
    fn element(&self, array: &ArrayRef, index: u32, width: usize) -> Result<usize, HeapError> {
        let (element_type, length) = self.array_header(array)?;
        if index >= u32::from(length) {
            return Err(HeapError::IndexOutOfBounds {
                index,
                length: u32::from(length),
            });
        }
        if element_type.size() != width {
            return Err(HeapError::WidthMismatch {
                element_type,
                width,
            });
        }
        Ok(array.payload() + index as usize * width)
    }

    /// Load an element of at most four bytes as a stack word
    ///
    /// `char` elements are zero extended, all others sign extended.
    pub fn array_load(&self, array: &ArrayRef, index: u32) -> Result<i32, HeapError> {
        let (element_type, _) = self.array_header(array)?;
        let width = narrow_width(element_type)?;
        let address = self.element(array, index, width.bytes())?;
        if element_type == ElementType::Char {
            let mut bytes = [0u8; 4];
            self.read_bytes(address, &mut bytes[..width.bytes()]);
            Ok(unsigned_word_from_bytes(&bytes, width))
        } else {
            Ok(self.load(address, width))
        }
    }

    /// Store the low bytes of a stack word into an element of at most
    /// four bytes
    pub fn array_store(
        &mut self,
        array: &ArrayRef,
        index: u32,
        value: i32,
    ) -> Result<(), HeapError> {
        let (element_type, _) = self.array_header(array)?;
        let width = narrow_width(element_type)?;
        let address = self.element(array, index, width.bytes())?;
        self.store(address, value, width);
        Ok(())
    }

    /// Load a `long` or `double` element as its 64 bits
    pub fn array_load_wide(&self, array: &ArrayRef, index: u32) -> Result<i64, HeapError> {
        let address = self.element(array, index, 8)?;
        let high = self.load(address, Width::Int);
        let low = self.load(address + 4, Width::Int);
        Ok((i64::from(high) << 32) | i64::from(low as u32))
    }

    /// Store a `long` or `double` element from its 64 bits
    pub fn array_store_wide(
        &mut self,
        array: &ArrayRef,
        index: u32,
        value: i64,
    ) -> Result<(), HeapError> {
        let address = self.element(array, index, 8)?;
        self.store(address, (value >> 32) as i32, Width::Int);
        self.store(address + 4, value as i32, Width::Int);
        Ok(())
    }

    /// Load a field at a byte offset into an object's payload
    pub fn field_load(
        &self,
        object: &ObjectRef,
        offset: u16,
        width: Width,
    ) -> Result<i32, HeapError> {
        let address = self.field(object, offset, width)?;
        Ok(self.load(address, width))
    }

    /// Store a field at a byte offset into an object's payload
    pub fn field_store(
        &mut self,
        object: &ObjectRef,
        offset: u16,
        width: Width,
        value: i32,
    ) -> Result<(), HeapError> {
        let address = self.field(object, offset, width)?;
        self.store(address, value, width);
        Ok(())
    }

    fn field(&self, object: &ObjectRef, offset: u16, width: Width) -> Result<usize, HeapError> {
        let header = self.header(object.0)?;
        let payload_bytes = (header.block_words(self.runtime()) - HEADER_WORDS) * WORD_BYTES;
        if usize::from(offset) + width.bytes() > payload_bytes {
            return Err(HeapError::IndexOutOfBounds {
                index: u32::from(offset),
                length: payload_bytes as u32,
            });
        }
        Ok(object.payload() + usize::from(offset))
    }

    fn load(&self, address: usize, width: Width) -> i32 {
        let mut bytes = [0u8; 4];
        self.read_bytes(address, &mut bytes[..width.bytes()]);
        word_from_bytes(&bytes, width)
    }

    fn store(&mut self, address: usize, value: i32, width: Width) {
        let mut bytes = [0u8; 4];
        bytes_from_word(value, width, &mut bytes);
        self.write_bytes(address, &bytes[..width.bytes()]);
    }
}

fn narrow_width(element_type: ElementType) -> Result<Width, HeapError> {
    Width::for_size(element_type.size()).ok_or(HeapError::WidthMismatch {
        element_type,
        width: Width::Int.bytes(),
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::memory::runtime::ClassSizes;

    fn with_heap<F>(words: usize, classes: Vec<u16>, f: F)
    where
        F: FnOnce(&mut Heap<ClassSizes>),
    {
        let mut memory = vec![0u16; words];
        let mut heap = Heap::new(&mut memory, ClassSizes::new(classes));
        heap.add_region(0, words * WORD_BYTES).unwrap();
        f(&mut heap);
    }

    #[test]
    pub fn test_array_reports_type_and_length() {
        with_heap(256, vec![], |heap| {
            let array = heap.new_primitive_array(ElementType::Short, 17).unwrap();
            assert_eq!(heap.element_type(&array).unwrap(), ElementType::Short);
            assert_eq!(heap.array_length(&array).unwrap(), 17);
            for index in 0..17 {
                assert_eq!(heap.array_load(&array, index).unwrap(), 0);
            }
        });
    }

    #[test]
    pub fn test_over_long_array_signals_out_of_memory() {
        with_heap(256, vec![], |heap| {
            let free = heap.heap_free();
            assert!(matches!(
                heap.new_primitive_array(ElementType::Byte, 1024),
                Err(HeapError::ArrayTooLong { .. })
            ));
            assert_eq!(heap.runtime().oom_raised(), 1);
            assert_eq!(heap.heap_free(), free);
        });
    }

    #[test]
    pub fn test_object_fields() {
        with_heap(256, vec![6], |heap| {
            let object = heap.new_object(0).unwrap();
            assert_eq!(heap.class_index(&object).unwrap(), 0);

            heap.field_store(&object, 0, Width::Int, -5).unwrap();
            heap.field_store(&object, 4, Width::Short, 0x1234).unwrap();
            heap.field_store(&object, 6, Width::Byte, 0x80).unwrap();
            assert_eq!(heap.field_load(&object, 0, Width::Int).unwrap(), -5);
            assert_eq!(heap.field_load(&object, 4, Width::Short).unwrap(), 0x1234);
            assert_eq!(heap.field_load(&object, 6, Width::Byte).unwrap(), -128);
            assert!(matches!(
                heap.field_load(&object, 6, Width::Int),
                Err(HeapError::IndexOutOfBounds { index: 6, length: 8 })
            ));

            let free = heap.heap_free();
            heap.free_object(object).unwrap();
            assert_eq!(heap.heap_free(), free + 6 * WORD_BYTES);
        });
    }

    #[test]
    pub fn test_element_access() {
        with_heap(256, vec![], |heap| {
            let chars = heap.new_primitive_array(ElementType::Char, 4).unwrap();
            heap.array_store(&chars, 1, 0xfffe).unwrap();
            assert_eq!(heap.array_load(&chars, 1).unwrap(), 0xfffe);

            let shorts = heap.new_primitive_array(ElementType::Short, 4).unwrap();
            heap.array_store(&shorts, 3, 0xfffe).unwrap();
            assert_eq!(heap.array_load(&shorts, 3).unwrap(), -2);
            assert_eq!(
                heap.array_load(&shorts, 4),
                Err(HeapError::IndexOutOfBounds {
                    index: 4,
                    length: 4
                })
            );

            let longs = heap.new_primitive_array(ElementType::Long, 2).unwrap();
            heap.array_store_wide(&longs, 1, -0x1234_5678_9abc).unwrap();
            assert_eq!(heap.array_load_wide(&longs, 1).unwrap(), -0x1234_5678_9abc);
            assert_eq!(heap.array_load_wide(&longs, 0).unwrap(), 0);
            assert!(matches!(
                heap.array_load(&longs, 0),
                Err(HeapError::WidthMismatch { .. })
            ));
            assert!(matches!(
                heap.array_load_wide(&shorts, 0),
                Err(HeapError::WidthMismatch { .. })
            ));
        });
    }

    #[test]
    pub fn test_payload_bytes_are_big_endian() {
        with_heap(256, vec![4], |heap| {
            let ints = heap.new_primitive_array(ElementType::Int, 2).unwrap();
            heap.array_store(&ints, 1, 0x0102_0304).unwrap();
            assert_eq!(
                heap.array_payload(&ints).unwrap(),
                vec![0, 0, 0, 0, 1, 2, 3, 4]
            );

            let object = heap.new_object(0).unwrap();
            heap.field_store(&object, 2, Width::Short, -1).unwrap();
            assert_eq!(heap.object_payload(&object).unwrap(), vec![0, 0, 0xff, 0xff]);
        });
    }

    #[test]
    pub fn test_raw_references_are_checked() {
        with_heap(256, vec![4], |heap| {
            let array = heap.new_primitive_array(ElementType::Int, 3).unwrap();
            let object = heap.new_object(0).unwrap();

            assert_eq!(heap.array_ref(array.raw()).unwrap(), array);
            assert_eq!(heap.object_ref(object.raw()).unwrap(), object);
            assert!(heap.array_ref(object.raw()).is_err());
            assert!(heap.object_ref(array.raw()).is_err());
            assert!(heap.array_ref(RawRef::NULL).is_err());
            assert!(heap.array_ref(RawRef::new(array.raw().get() + 2)).is_err());
            assert!(heap.array_ref(RawRef::new(array.raw().get() + 1)).is_err());
        });
    }

    #[test]
    pub fn test_multi_array_builds_tree() {
        with_heap(512, vec![], |heap| {
            let outer = heap
                .new_multi_array(ElementType::Int, 2, 2, &[3, 5])
                .unwrap()
                .unwrap();
            assert_eq!(heap.element_type(&outer).unwrap(), ElementType::Reference);
            assert_eq!(heap.array_length(&outer).unwrap(), 3);

            for index in 0..3 {
                let raw = RawRef::new(heap.array_load(&outer, index).unwrap() as u32);
                let inner = heap.array_ref(raw).unwrap();
                assert_eq!(heap.element_type(&inner).unwrap(), ElementType::Int);
                assert_eq!(heap.array_length(&inner).unwrap(), 5);
            }
        });
    }

    #[test]
    pub fn test_multi_array_partial_dimensions_left_null() {
        with_heap(512, vec![], |heap| {
            let outer = heap
                .new_multi_array(ElementType::Byte, 3, 1, &[4])
                .unwrap()
                .unwrap();
            assert_eq!(heap.array_length(&outer).unwrap(), 4);
            for index in 0..4 {
                assert_eq!(heap.array_load(&outer, index).unwrap(), 0);
            }
        });
    }

    #[test]
    pub fn test_multi_array_zero_dimensions_allocates_nothing() {
        with_heap(256, vec![], |heap| {
            let free = heap.heap_free();
            assert_eq!(
                heap.new_multi_array(ElementType::Int, 2, 0, &[]).unwrap(),
                None
            );
            assert_eq!(heap.heap_free(), free);
        });
    }

    #[test]
    pub fn test_multi_array_bad_dimensions() {
        with_heap(256, vec![], |heap| {
            assert_eq!(
                heap.new_multi_array(ElementType::Int, 1, 2, &[1, 1]),
                Err(HeapError::InvalidDimensions {
                    total: 1,
                    requested: 2,
                    lengths: 2
                })
            );
            assert!(heap.new_multi_array(ElementType::Int, 2, 2, &[1]).is_err());
        });
    }

    #[test]
    pub fn test_multi_array_failure_leaks_built_siblings() {
        // 62 free words: outer ref[3] takes 8, each int[20] takes 42
        with_heap(64, vec![], |heap| {
            let free = heap.heap_free();
            let result = heap.new_multi_array(ElementType::Int, 2, 2, &[3, 20]);
            assert!(matches!(result, Err(HeapError::OutOfMemory { .. })));
            assert_eq!(heap.runtime().oom_raised(), 1);
            // outer array and the first inner array (2 + 40 words) stay allocated
            assert_eq!(heap.heap_free(), free - (8 + 42) * WORD_BYTES);
        });
    }

    #[test]
    pub fn test_free_through_alias_after_original_is_refused() {
        with_heap(256, vec![4], |heap| {
            let array = heap.new_primitive_array(ElementType::Int, 4).unwrap();
            let alias = heap.array_ref(array.raw()).unwrap();
            heap.free_array(array).unwrap();
            let free = heap.heap_free();
            assert!(matches!(
                heap.free_array(alias),
                Err(HeapError::WrongKind { .. })
            ));
            assert_eq!(heap.heap_free(), free);

            let object = heap.new_object(0).unwrap();
            let alias = heap.object_ref(object.raw()).unwrap();
            heap.free_object(object).unwrap();
            let free = heap.heap_free();
            assert!(matches!(
                heap.free_object(alias),
                Err(HeapError::WrongKind { .. })
            ));
            assert_eq!(heap.heap_free(), free);
            assert_eq!(heap.heap_free(), heap.heap_size());
            assert_eq!(heap.scan().unwrap().free_words * 2, heap.heap_free());
        });
    }

    #[test]
    pub fn test_free_rejects_handle_of_other_kind() {
        with_heap(256, vec![4], |heap| {
            let object = heap.new_object(0).unwrap();
            let array = heap.new_primitive_array(ElementType::Byte, 3).unwrap();
            let free = heap.heap_free();
            // an array handle now pointing at an object block
            let misfit = ArrayRef(object.0);
            assert!(heap.free_array(misfit).is_err());
            assert_eq!(heap.heap_free(), free);
            heap.free_array(array).unwrap();
        });
    }

    #[test]
    pub fn test_realloc_grow_and_shrink() {
        with_heap(256, vec![], |heap| {
            let array = heap.new_primitive_array(ElementType::Int, 4).unwrap();
            for index in 0..4 {
                heap.array_store(&array, index, (index as i32 + 1) * -1000).unwrap();
            }

            let grown = heap.reallocate_array(array, 8).unwrap();
            assert_eq!(heap.array_length(&grown).unwrap(), 8);
            for index in 0..4 {
                assert_eq!(
                    heap.array_load(&grown, index).unwrap(),
                    (index as i32 + 1) * -1000
                );
            }
            for index in 4..8 {
                assert_eq!(heap.array_load(&grown, index).unwrap(), 0);
            }

            let shrunk = heap.reallocate_array(grown, 2).unwrap();
            assert_eq!(heap.array_length(&shrunk).unwrap(), 2);
            assert_eq!(heap.array_load(&shrunk, 0).unwrap(), -1000);
            assert_eq!(heap.array_load(&shrunk, 1).unwrap(), -2000);

            heap.free_array(shrunk).unwrap();
            assert_eq!(heap.heap_free(), heap.heap_size());
        });
    }

    #[test]
    pub fn test_failed_realloc_keeps_array() {
        with_heap(32, vec![], |heap| {
            let array = heap.new_primitive_array(ElementType::Byte, 4).unwrap();
            heap.array_store(&array, 2, 7).unwrap();

            let failed = heap.reallocate_array(array, 200).unwrap_err();
            assert!(matches!(failed.error, HeapError::OutOfMemory { .. }));
            let array = failed.array;
            assert_eq!(heap.array_length(&array).unwrap(), 4);
            assert_eq!(heap.array_load(&array, 2).unwrap(), 7);
        });
    }
}
