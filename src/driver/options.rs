//! Command line options for `heapsim`

use std::path::{Path, PathBuf};

use structopt::StructOpt;

use super::config::HeapLayout;

/// Replay allocation scripts against a simulated interpreter heap
///
/// Script commands, one per line (`#` starts a comment):
///
///   object <class>
///   array <type> <length>
///   multi <type> <total-dims> <requested-dims> <length>...
///   free <handle>
///   realloc <handle> <length>
///   store <handle> <index> <value>
///   load <handle> <index>
///   dump <handle>
///   scan
///
/// Handles are written `$n`, numbered in creation order. For objects,
/// `store` and `load` address an int field by byte offset.
#[derive(StructOpt, Debug, Clone, Default)]
#[structopt(name = "heapsim", verbatim_doc_comment)]
pub struct HeapSimOptions {
    /// Heap layout file (TOML)
    #[structopt(short = "l", long = "layout", parse(from_os_str))]
    pub layout: Option<PathBuf>,

    /// Override the layout's alignment, in words
    #[structopt(short = "a", long = "alignment")]
    pub alignment: Option<u16>,

    /// Do not merge adjacent free blocks
    #[structopt(long = "no-coalesce")]
    pub no_coalesce: bool,

    /// Print heap statistics to stderr before exiting
    #[structopt(short = "S", long = "statistics")]
    pub statistics: bool,

    /// Script to replay; standard input when absent
    #[structopt(parse(from_os_str))]
    pub script: Option<PathBuf>,
}

impl HeapSimOptions {
    pub fn layout_path(&self) -> Option<&Path> {
        self.layout.as_deref()
    }

    pub fn script_path(&self) -> Option<&Path> {
        self.script.as_deref()
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }

    /// Apply command line overrides to a layout
    pub fn apply(&self, layout: &mut HeapLayout) {
        if let Some(alignment) = self.alignment {
            layout.settings.alignment = alignment;
        }
        if self.no_coalesce {
            layout.settings.coalesce = false;
        }
    }
}
