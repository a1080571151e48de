//! Heap errors

use thiserror::Error;

use super::header::ElementType;

/// Errors raised by the allocator, the region registry and the object
/// constructors
///
/// Exhaustion and over-long arrays are reported to the runtime as an
/// out-of-memory condition by the constructors before being returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// No free run anywhere in the heap can hold the request
    #[error("out of memory: no free run of {requested} words ({free} words free)")]
    OutOfMemory { requested: usize, free: usize },
    /// Array length does not fit in the header length field
    #[error("array length {length} exceeds maximum of {max}")]
    ArrayTooLong { length: u32, max: u16 },
    /// Region extent rejected at registration
    #[error("invalid region {start:#x}..{end:#x}: {reason}")]
    InvalidRegion {
        start: usize,
        end: usize,
        reason: &'static str,
    },
    /// Single-region heap already has its region
    #[error("single-region heap already has a region")]
    RegionLimit,
    /// Alignment setting is not a small power of two
    #[error("alignment {0} is not a power of two between 1 and 16")]
    InvalidAlignment(u16),
    /// Four bit element type code with no element type
    #[error("unknown element type code {0}")]
    UnknownElementType(u8),
    /// A block header that cannot be walked
    #[error("corrupt block header {header:#06x} at word {address}")]
    CorruptHeader { address: usize, header: u16 },
    /// A reference whose header is not of the expected kind
    #[error("reference {reference:#x} does not point to {expected}")]
    WrongKind {
        reference: u32,
        expected: &'static str,
    },
    /// Multi-dimensional array request with inconsistent dimensions
    #[error("invalid dimensions: {requested} of {total} requested with {lengths} lengths")]
    InvalidDimensions {
        total: u8,
        requested: u8,
        lengths: usize,
    },
    /// Element index or field offset past the end of a block
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: u32, length: u32 },
    /// Element accessed with the wrong width
    #[error("{element_type} element cannot be accessed as {width} bytes")]
    WidthMismatch {
        element_type: ElementType,
        width: usize,
    },
}
