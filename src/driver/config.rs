//! Heap layout files
//!
//! A layout describes the simulated address space, the heap settings,
//! the regions handed to the heap and the class table:
//!
//! ```toml
//! [heap]
//! memory = "4K"
//! alignment = 2
//! coalesce = true
//! segmented = true
//! regions = [ { start = 0, end = "2K" }, { start = "2K", end = "4K" } ]
//! classes = [4, 6, 10]
//! ```
//!
//! Every key is optional. Without `regions` the whole of `memory`
//! becomes a single region.

use std::{fs, path::Path};

use toml::Value;

use super::error::DriverError;
use crate::memory::{
    header::WORD_BYTES,
    heap::{Heap, HeapSettings},
    region::NULL_INDEX,
    runtime::ClassSizes,
};

pub const DEFAULT_MEMORY_BYTES: usize = 4096;

/// Largest address space the heap can index
pub const MAX_MEMORY_BYTES: usize = NULL_INDEX as usize * WORD_BYTES;

/// Number of class indices a header can carry
pub const MAX_CLASSES: usize = 256;

/// Byte range to register as a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapLayout {
    /// Simulated memory in bytes
    pub memory: usize,
    pub settings: HeapSettings,
    pub regions: Vec<RegionSpec>,
    /// Instance size in words for each class index
    pub classes: Vec<u16>,
}

impl Default for HeapLayout {
    fn default() -> Self {
        HeapLayout {
            memory: DEFAULT_MEMORY_BYTES,
            settings: HeapSettings::default(),
            regions: vec![],
            classes: vec![],
        }
    }
}

impl HeapLayout {
    /// Read a layout file
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = fs::read_to_string(path)?;
        HeapLayout::from_toml(&text)
    }

    /// Parse layout text
    pub fn from_toml(text: &str) -> Result<Self, DriverError> {
        let value = text
            .parse::<Value>()
            .map_err(|e| DriverError::InvalidToml(e.to_string()))?;

        let mut layout = HeapLayout::default();
        let heap = match value.get("heap") {
            None => return Ok(layout),
            Some(Value::Table(table)) => table,
            Some(_) => return Err(DriverError::layout("heap", "expected a table")),
        };

        for (key, value) in heap {
            match key.as_str() {
                "memory" => layout.memory = size(key, value)?,
                "alignment" => {
                    layout.settings.alignment = u16::try_from(integer(key, value)?)
                        .map_err(|_| DriverError::layout(key, "out of range"))?
                }
                "coalesce" => layout.settings.coalesce = boolean(key, value)?,
                "segmented" => layout.settings.segmented = boolean(key, value)?,
                "regions" => layout.regions = regions(value)?,
                "classes" => layout.classes = classes(value)?,
                _ => return Err(DriverError::layout(key, "unknown key")),
            }
        }

        if layout.memory > MAX_MEMORY_BYTES {
            return Err(DriverError::layout(
                "memory",
                format!("larger than {MAX_MEMORY_BYTES} bytes"),
            ));
        }
        layout.settings.validate()?;
        Ok(layout)
    }

    /// Words of simulated memory
    pub fn words(&self) -> usize {
        (self.memory + WORD_BYTES - 1) / WORD_BYTES
    }

    /// Build a heap over `memory` and register the layout's regions
    pub fn build<'m>(&self, memory: &'m mut [u16]) -> Result<Heap<'m, ClassSizes>, DriverError> {
        let classes = ClassSizes::new(self.classes.clone());
        let mut heap = Heap::with_settings(memory, classes, self.settings)?;
        heap.init();
        if self.regions.is_empty() {
            heap.add_region(0, self.memory)?;
        } else {
            for region in &self.regions {
                heap.add_region(region.start, region.end)?;
            }
        }
        Ok(heap)
    }
}

/// Parse a byte size: decimal or `0x` hexadecimal with an optional `K`
/// suffix for multiples of 1024
pub fn parse_size(text: &str) -> Result<usize, String> {
    let trimmed = text.trim();
    let (digits, scale) = match trimmed.strip_suffix(|c: char| c == 'K' || c == 'k') {
        Some(digits) => (digits, 1024),
        None => (trimmed, 1),
    };
    let value = match digits.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => digits.parse::<usize>(),
    };
    value
        .ok()
        .and_then(|v| v.checked_mul(scale))
        .ok_or_else(|| format!("invalid size: {text}"))
}

fn integer(key: &str, value: &Value) -> Result<i64, DriverError> {
    value
        .as_integer()
        .ok_or_else(|| DriverError::layout(key, "expected an integer"))
}

fn boolean(key: &str, value: &Value) -> Result<bool, DriverError> {
    value
        .as_bool()
        .ok_or_else(|| DriverError::layout(key, "expected true or false"))
}

fn size(key: &str, value: &Value) -> Result<usize, DriverError> {
    match value {
        Value::Integer(n) => {
            usize::try_from(*n).map_err(|_| DriverError::layout(key, "must not be negative"))
        }
        Value::String(s) => parse_size(s).map_err(|e| DriverError::layout(key, e)),
        _ => Err(DriverError::layout(key, "expected a size")),
    }
}

fn regions(value: &Value) -> Result<Vec<RegionSpec>, DriverError> {
    let entries = value
        .as_array()
        .ok_or_else(|| DriverError::layout("regions", "expected an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let key = format!("regions[{i}]");
            let bound = |name: &str| {
                let bound_key = format!("{key}.{name}");
                entry
                    .get(name)
                    .ok_or_else(|| DriverError::layout(&bound_key, "missing"))
                    .and_then(|v| size(&bound_key, v))
            };
            Ok(RegionSpec {
                start: bound("start")?,
                end: bound("end")?,
            })
        })
        .collect()
}

fn classes(value: &Value) -> Result<Vec<u16>, DriverError> {
    let entries = value
        .as_array()
        .ok_or_else(|| DriverError::layout("classes", "expected an array"))?;
    if entries.len() > MAX_CLASSES {
        return Err(DriverError::layout(
            "classes",
            format!("at most {MAX_CLASSES} classes"),
        ));
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let key = format!("classes[{i}]");
            u16::try_from(integer(&key, entry)?)
                .map_err(|_| DriverError::layout(&key, "out of range"))
        })
        .collect()
}
