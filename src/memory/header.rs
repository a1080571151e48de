//! Header for all heap blocks
//!
//! Every block begins with a single 16 bit header word and the header
//! alone determines the size of the block, so a region can always be
//! walked from its start to its end with no external index.
//!
//! ```text
//!  15  14  13..10     9..0
//! [ 0 | free run size in words (15 bits)     ]  free
//! [ 1 | 0 | ......... | class index (8 bits) ]  object
//! [ 1 | 1 | elem type | length (10 bits)     ]  array
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use super::{error::HeapError, runtime::Runtime};

/// Bytes per heap word
pub const WORD_BYTES: usize = 2;

/// Words in an object or array header: the header word and the
/// synchronisation word
pub const HEADER_WORDS: usize = 2;

bitflags! {
    /// Tag bits of a block header
    pub struct HeaderFlags: u16 {
        /// Block is in use
        const ALLOCATED = 0x8000;
        /// Block holds an array rather than a class instance
        const ARRAY = 0x4000;
    }
}

const FREE_SIZE_MASK: u16 = 0x7fff;
const CLASS_INDEX_MASK: u16 = 0x00ff;
const ELEMENT_TYPE_MASK: u16 = 0x3c00;
const ELEMENT_TYPE_SHIFT: u16 = 10;
const ARRAY_LENGTH_MASK: u16 = 0x03ff;

/// Largest free run a single header can describe
pub const MAX_FREE_WORDS: usize = FREE_SIZE_MASK as usize;

/// Largest array length the header can encode
pub const MAX_ARRAY_LENGTH: u16 = ARRAY_LENGTH_MASK;

/// Primitive kind stored in an array
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Object reference, sized as a 4 byte primitive
    Reference = 0,
    Boolean = 4,
    Char = 5,
    Float = 6,
    Double = 7,
    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,
}

impl ElementType {
    /// Size of one element in bytes
    pub fn size(self) -> usize {
        match self {
            ElementType::Boolean | ElementType::Byte => 1,
            ElementType::Char | ElementType::Short => 2,
            ElementType::Reference | ElementType::Float | ElementType::Int => 4,
            ElementType::Double | ElementType::Long => 8,
        }
    }

    /// Four bit code stored in array headers
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ElementType {
    type Error = HeapError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ElementType::Reference),
            4 => Ok(ElementType::Boolean),
            5 => Ok(ElementType::Char),
            6 => Ok(ElementType::Float),
            7 => Ok(ElementType::Double),
            8 => Ok(ElementType::Byte),
            9 => Ok(ElementType::Short),
            10 => Ok(ElementType::Int),
            11 => Ok(ElementType::Long),
            _ => Err(HeapError::UnknownElementType(code)),
        }
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ref" | "reference" => Ok(ElementType::Reference),
            "boolean" => Ok(ElementType::Boolean),
            "char" => Ok(ElementType::Char),
            "float" => Ok(ElementType::Float),
            "double" => Ok(ElementType::Double),
            "byte" => Ok(ElementType::Byte),
            "short" => Ok(ElementType::Short),
            "int" => Ok(ElementType::Int),
            "long" => Ok(ElementType::Long),
            _ => Err(format!("unknown element type: {s}")),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Reference => "ref",
            ElementType::Boolean => "boolean",
            ElementType::Char => "char",
            ElementType::Float => "float",
            ElementType::Double => "double",
            ElementType::Byte => "byte",
            ElementType::Short => "short",
            ElementType::Int => "int",
            ElementType::Long => "long",
        };
        write!(f, "{name}")
    }
}

/// Decoded block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    /// Free run of `size` words, header included
    Free { size: u16 },
    /// Class instance; size comes from the class table
    Object { class_index: u8 },
    /// Array of `length` elements
    Array {
        element_type: ElementType,
        length: u16,
    },
}

impl Header {
    /// Array header, rejecting lengths the length field cannot hold
    pub fn array(element_type: ElementType, length: u32) -> Result<Header, HeapError> {
        if length > u32::from(MAX_ARRAY_LENGTH) {
            return Err(HeapError::ArrayTooLong {
                length,
                max: MAX_ARRAY_LENGTH,
            });
        }
        Ok(Header::Array {
            element_type,
            length: length as u16,
        })
    }

    /// Pack into a header word
    pub fn encode(self) -> u16 {
        match self {
            Header::Free { size } => {
                debug_assert!(size <= FREE_SIZE_MASK);
                size & FREE_SIZE_MASK
            }
            Header::Object { class_index } => {
                HeaderFlags::ALLOCATED.bits() | u16::from(class_index)
            }
            Header::Array {
                element_type,
                length,
            } => {
                debug_assert!(length <= MAX_ARRAY_LENGTH);
                (HeaderFlags::ALLOCATED | HeaderFlags::ARRAY).bits()
                    | (u16::from(element_type.code()) << ELEMENT_TYPE_SHIFT)
                    | (length & ARRAY_LENGTH_MASK)
            }
        }
    }

    /// Unpack a header word
    pub fn decode(word: u16) -> Result<Header, HeapError> {
        let flags = HeaderFlags::from_bits_truncate(word);
        if !flags.contains(HeaderFlags::ALLOCATED) {
            Ok(Header::Free {
                size: word & FREE_SIZE_MASK,
            })
        } else if flags.contains(HeaderFlags::ARRAY) {
            let code = ((word & ELEMENT_TYPE_MASK) >> ELEMENT_TYPE_SHIFT) as u8;
            Ok(Header::Array {
                element_type: ElementType::try_from(code)?,
                length: word & ARRAY_LENGTH_MASK,
            })
        } else {
            Ok(Header::Object {
                class_index: (word & CLASS_INDEX_MASK) as u8,
            })
        }
    }

    /// Whether a raw header word marks its block as in use
    pub fn is_allocated(word: u16) -> bool {
        HeaderFlags::from_bits_truncate(word).contains(HeaderFlags::ALLOCATED)
    }

    /// Size of the block in words before alignment
    ///
    /// Object sizes are looked up in the class table and never fall
    /// below the object header itself.
    pub fn block_words<R: Runtime + ?Sized>(self, runtime: &R) -> usize {
        match self {
            Header::Free { size } => usize::from(size),
            Header::Object { class_index } => {
                usize::from(runtime.class_size(class_index)).max(HEADER_WORDS)
            }
            Header::Array {
                element_type,
                length,
            } => array_words(element_type, length),
        }
    }
}

/// Words occupied by an array: header plus payload rounded up to a
/// whole word
pub fn array_words(element_type: ElementType, length: u16) -> usize {
    let bytes = usize::from(length) * element_type.size();
    HEADER_WORDS + (bytes + WORD_BYTES - 1) / WORD_BYTES
}

/// Round a word count up to the alignment granularity (a power of two)
pub fn align_words(words: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (words + (alignment - 1)) & !(alignment - 1)
}
