//! Allocation scripts and the session that replays them

use std::{io::Write, str::FromStr};

use itertools::Itertools;
use pretty_hex::simple_hex;

use super::{error::DriverError, statistics::Statistics};
use crate::memory::{
    error::HeapError,
    header::ElementType,
    heap::Heap,
    marshal::Width,
    object::{ArrayRef, ObjectRef},
    runtime::ClassSizes,
};

/// A script command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Object(u8),
    Array(ElementType, u32),
    Multi {
        element_type: ElementType,
        total: u8,
        requested: u8,
        lengths: Vec<u32>,
    },
    Free(usize),
    Realloc(usize, u32),
    Store(usize, u32, i64),
    Load(usize, u32),
    Dump(usize),
    Scan,
}

fn arg<T: FromStr>(args: &[&str], index: usize, what: &str) -> Result<T, String> {
    let text = args
        .get(index)
        .ok_or_else(|| format!("missing {what}"))?;
    text.parse::<T>()
        .map_err(|_| format!("invalid {what}: {text}"))
}

fn handle(args: &[&str], index: usize) -> Result<usize, String> {
    let text = args.get(index).ok_or("missing handle")?;
    text.strip_prefix('$')
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| format!("invalid handle: {text}"))
}

fn arity(args: &[&str], count: usize) -> Result<(), String> {
    if args.len() > count {
        Err(format!("unexpected argument: {}", args[count]))
    } else {
        Ok(())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();
        let (name, args) = words.split_first().ok_or("empty command")?;

        let command = match *name {
            "object" => {
                arity(args, 1)?;
                Command::Object(arg(args, 0, "class index")?)
            }
            "array" => {
                arity(args, 2)?;
                Command::Array(arg(args, 0, "element type")?, arg(args, 1, "length")?)
            }
            "multi" => {
                let lengths = args
                    .iter()
                    .skip(3)
                    .map(|l| l.parse::<u32>().map_err(|_| format!("invalid length: {l}")))
                    .collect::<Result<Vec<u32>, String>>()?;
                Command::Multi {
                    element_type: arg(args, 0, "element type")?,
                    total: arg(args, 1, "dimension count")?,
                    requested: arg(args, 2, "requested dimension count")?,
                    lengths,
                }
            }
            "free" => {
                arity(args, 1)?;
                Command::Free(handle(args, 0)?)
            }
            "realloc" => {
                arity(args, 2)?;
                Command::Realloc(handle(args, 0)?, arg(args, 1, "length")?)
            }
            "store" => {
                arity(args, 3)?;
                Command::Store(handle(args, 0)?, arg(args, 1, "index")?, arg(args, 2, "value")?)
            }
            "load" => {
                arity(args, 2)?;
                Command::Load(handle(args, 0)?, arg(args, 1, "index")?)
            }
            "dump" => {
                arity(args, 1)?;
                Command::Dump(handle(args, 0)?)
            }
            "scan" => {
                arity(args, 0)?;
                Command::Scan
            }
            _ => return Err(format!("unknown command: {name}")),
        };
        Ok(command)
    }
}

/// Parse a whole script into numbered commands, skipping blank lines
/// and `#` comments
pub fn parse_script(text: &str) -> Result<Vec<(usize, Command)>, DriverError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line, command)| {
            command
                .parse::<Command>()
                .map(|c| (line, c))
                .map_err(|message| DriverError::Script { line, message })
        })
        .collect()
}

/// What a script handle refers to
#[derive(Debug)]
enum Handle {
    Object(ObjectRef),
    Array(ArrayRef),
    Null,
    Freed,
}

/// A handle that can be read or written through
enum Live<'a> {
    Object(&'a ObjectRef),
    Array(&'a ArrayRef),
}

fn live(handles: &[Handle], line: usize, n: usize) -> Result<Live<'_>, DriverError> {
    match handles.get(n) {
        None => Err(script(line, format!("no such handle {}", name(n)))),
        Some(Handle::Object(object)) => Ok(Live::Object(object)),
        Some(Handle::Array(array)) => Ok(Live::Array(array)),
        Some(Handle::Freed) => Err(script(line, format!("{} has been freed", name(n)))),
        Some(Handle::Null) => Err(script(line, format!("{} is null", name(n)))),
    }
}

/// A heap and the handles a script has created in it
pub struct Session<'m> {
    heap: Heap<'m, ClassSizes>,
    handles: Vec<Handle>,
    statistics: Statistics,
}

impl<'m> Session<'m> {
    pub fn new(heap: Heap<'m, ClassSizes>) -> Self {
        Session {
            heap,
            handles: vec![],
            statistics: Statistics::default(),
        }
    }

    pub fn heap(&self) -> &Heap<'m, ClassSizes> {
        &self.heap
    }

    /// Statistics so far, with a snapshot of the heap
    pub fn statistics(&self) -> Statistics {
        let mut statistics = self.statistics.clone();
        statistics.snapshot(&self.heap);
        statistics
    }

    /// Replay commands, reporting each failed command and carrying on
    ///
    /// Returns the number of failed commands.
    pub fn run<W: Write>(
        &mut self,
        commands: &[(usize, Command)],
        out: &mut W,
    ) -> Result<u64, DriverError> {
        for (line, command) in commands {
            if let Err(e) = self.execute(*line, command, out) {
                match e {
                    DriverError::Io(_) => return Err(e),
                    e => {
                        self.statistics.record_failure();
                        writeln!(out, "error: {e}")?;
                    }
                }
            }
        }
        Ok(self.statistics.failures())
    }

    /// Execute a single command, writing its result to `out`
    pub fn execute<W: Write>(
        &mut self,
        line: usize,
        command: &Command,
        out: &mut W,
    ) -> Result<(), DriverError> {
        let op = |source: HeapError| DriverError::Operation { line, source };

        match command {
            Command::Object(class_index) => {
                let object = self.heap.new_object(*class_index).map_err(op)?;
                self.statistics.record_object();
                let n = self.push(Handle::Object(object));
                writeln!(out, "{} = {}", name(n), self.describe(n)?)?;
            }
            Command::Array(element_type, length) => {
                let array = self
                    .heap
                    .new_primitive_array(*element_type, *length)
                    .map_err(op)?;
                self.statistics.record_array();
                let n = self.push(Handle::Array(array));
                writeln!(out, "{} = {}", name(n), self.describe(n)?)?;
            }
            Command::Multi {
                element_type,
                total,
                requested,
                lengths,
            } => {
                let array = self
                    .heap
                    .new_multi_array(*element_type, *total, *requested, lengths)
                    .map_err(op)?;
                self.statistics.record_array();
                let n = self.push(array.map_or(Handle::Null, Handle::Array));
                writeln!(
                    out,
                    "{} = {} ({}{})",
                    name(n),
                    self.describe(n)?,
                    element_type,
                    lengths
                        .iter()
                        .take(usize::from(*total))
                        .map(|l| format!("[{l}]"))
                        .join("")
                )?;
            }
            Command::Free(n) => {
                match self.take(line, *n)? {
                    Handle::Object(object) => self.heap.free_object(object).map_err(op)?,
                    Handle::Array(array) => self.heap.free_array(array).map_err(op)?,
                    Handle::Null | Handle::Freed => {}
                }
                self.statistics.record_free();
                writeln!(out, "freed {}, {} bytes free", name(*n), self.heap.heap_free())?;
            }
            Command::Realloc(n, length) => {
                let array = match self.take(line, *n)? {
                    Handle::Array(array) => array,
                    other => {
                        self.handles[*n] = other;
                        return Err(script(line, format!("{} is not an array", name(*n))));
                    }
                };
                match self.heap.reallocate_array(array, *length) {
                    Ok(array) => {
                        self.handles[*n] = Handle::Array(array);
                        self.statistics.record_realloc();
                        writeln!(out, "{} = {}", name(*n), self.describe(*n)?)?;
                    }
                    Err(failed) => {
                        self.handles[*n] = Handle::Array(failed.array);
                        return Err(op(failed.error));
                    }
                }
            }
            Command::Store(n, index, value) => {
                let stored = match live(&self.handles, line, *n)? {
                    Live::Object(object) => {
                        let offset = field_offset(line, *index)?;
                        self.heap
                            .field_store(object, offset, Width::Int, narrow(line, *value)?)
                    }
                    Live::Array(array) => match self.heap.element_type(array).map_err(op)? {
                        ElementType::Long | ElementType::Double => {
                            self.heap.array_store_wide(array, *index, *value)
                        }
                        _ => self
                            .heap
                            .array_store(array, *index, narrow(line, *value)?),
                    },
                };
                stored.map_err(op)?;
                writeln!(out, "{}[{}] = {}", name(*n), index, value)?;
            }
            Command::Load(n, index) => {
                let value = match live(&self.handles, line, *n)? {
                    Live::Object(object) => {
                        let offset = field_offset(line, *index)?;
                        self.heap
                            .field_load(object, offset, Width::Int)
                            .map(i64::from)
                    }
                    Live::Array(array) => match self.heap.element_type(array).map_err(op)? {
                        ElementType::Long | ElementType::Double => {
                            self.heap.array_load_wide(array, *index)
                        }
                        _ => self.heap.array_load(array, *index).map(i64::from),
                    },
                }
                .map_err(op)?;
                writeln!(out, "{}[{}] -> {}", name(*n), index, value)?;
            }
            Command::Dump(n) => {
                let bytes = match live(&self.handles, line, *n)? {
                    Live::Object(object) => self.heap.object_payload(object),
                    Live::Array(array) => self.heap.array_payload(array),
                }
                .map_err(op)?;
                writeln!(out, "{} = {} [{}]", name(*n), self.describe(*n)?, simple_hex(&bytes))?;
            }
            Command::Scan => {
                let scan = self.heap.scan().map_err(op)?;
                writeln!(
                    out,
                    "scan: {} regions ({}), {} blocks, {} free in {} blocks, largest free run {} words",
                    scan.regions,
                    self.heap.regions().map(|r| r.to_string()).join(", "),
                    scan.blocks,
                    scan.free_words,
                    scan.free_blocks,
                    scan.largest_free_words
                )?;
            }
        }
        Ok(())
    }

    fn push(&mut self, handle: Handle) -> usize {
        self.handles.push(handle);
        self.handles.len() - 1
    }

    /// Take ownership of a handle, leaving it marked freed
    fn take(&mut self, line: usize, n: usize) -> Result<Handle, DriverError> {
        match self.handles.get_mut(n) {
            None => Err(script(line, format!("no such handle {}", name(n)))),
            Some(Handle::Freed) => Err(script(line, format!("{} has been freed", name(n)))),
            Some(slot) => Ok(std::mem::replace(slot, Handle::Freed)),
        }
    }

    fn describe(&self, n: usize) -> Result<String, HeapError> {
        Ok(match &self.handles[n] {
            Handle::Object(object) => format!(
                "object {} @ {}",
                self.heap.class_index(object)?,
                object.raw()
            ),
            Handle::Array(array) => format!(
                "{}[{}] @ {}",
                self.heap.element_type(array)?,
                self.heap.array_length(array)?,
                array.raw()
            ),
            Handle::Null => "null".to_string(),
            Handle::Freed => "freed".to_string(),
        })
    }
}

fn name(n: usize) -> String {
    format!("${n}")
}

fn script(line: usize, message: String) -> DriverError {
    DriverError::Script { line, message }
}

fn narrow(line: usize, value: i64) -> Result<i32, DriverError> {
    i32::try_from(value).map_err(|_| script(line, format!("value {value} does not fit a word")))
}

fn field_offset(line: usize, index: u32) -> Result<u16, DriverError> {
    u16::try_from(index).map_err(|_| script(line, format!("field offset {index} out of range")))
}
