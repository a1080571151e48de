//! Build a heap from a layout and replay a script against it

use std::{
    fs,
    io::{self, Read, Write},
};

use log::debug;

use super::{
    config::HeapLayout, error::DriverError, options::HeapSimOptions, script::parse_script,
    script::Session, statistics::Statistics,
};

/// Outcome of a replay
#[derive(Debug)]
pub struct Replay {
    /// Commands that failed
    pub failures: u64,
    pub statistics: Statistics,
}

impl Replay {
    pub fn exit_code(&self) -> i32 {
        if self.failures == 0 {
            0
        } else {
            1
        }
    }
}

/// Replay the script named by the options, or standard input
pub fn simulate<W: Write>(opt: &HeapSimOptions, out: &mut W) -> Result<Replay, DriverError> {
    let mut layout = match opt.layout_path() {
        Some(path) => HeapLayout::load(path)?,
        None => HeapLayout::default(),
    };
    opt.apply(&mut layout);
    layout.settings.validate()?;

    let script = match opt.script_path() {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    replay(&layout, &script, out)
}

/// Replay script text against a fresh heap with the given layout
pub fn replay<W: Write>(
    layout: &HeapLayout,
    script: &str,
    out: &mut W,
) -> Result<Replay, DriverError> {
    let commands = parse_script(script)?;
    let mut memory = vec![0u16; layout.words()];
    let heap = layout.build(&mut memory)?;
    debug!(
        "replaying {} commands against {} bytes of heap",
        commands.len(),
        heap.heap_size()
    );

    let mut session = Session::new(heap);
    let failures = session.run(&commands, out)?;
    Ok(Replay {
        failures,
        statistics: session.statistics(),
    })
}
