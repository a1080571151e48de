extern crate mcuheap;

use std::{
    io::{self, Write},
    process,
};

use structopt::StructOpt;

use mcuheap::driver::{
    options::HeapSimOptions,
    simulate::simulate,
    statistics::Statistics,
};

pub fn main() {
    env_logger::init();
    let opt = HeapSimOptions::from_args();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = simulate(&opt, &mut out);
    let _ = out.flush();

    match result {
        Ok(replay) => exit(&opt, replay.exit_code(), Some(&replay.statistics)),
        Err(e) => {
            eprintln!("{e}");
            exit(&opt, e.exit_code(), None)
        }
    }
}

/// Optionally dump stats to stderr then exit
pub fn exit(opts: &HeapSimOptions, code: i32, stats: Option<&Statistics>) -> ! {
    if let (true, Some(stats)) = (opts.statistics(), stats) {
        eprintln!();
        eprintln!("~~~~~~~~~~");
        eprintln!("STATISTICS");
        eprintln!("~~~~~~~~~~");
        eprintln!();
        eprintln!("{stats}");
    }
    process::exit(code)
}
