use clap::Parser;

use crate::zip::CompressionLevel;

#[derive(Parser, Debug)]
#[command(name = "ziparc")]
#[command(version)]
#[command(about = "List, test, extract, create and update ZIP archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  ziparc data1.zip -x joe        extract all files except joe from data1.zip\n  \
  ziparc -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  ziparc -c src out.zip          archive the src directory into out.zip\n  \
  ziparc out.zip -a notes.txt    add or replace notes.txt in out.zip\n  \
  ziparc out.zip -D old.txt      delete old.txt from out.zip")]
pub struct Cli {
    /// ZIP file path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely/show version info
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive integrity by checking every entry's CRC-32
    #[arg(short = 't')]
    pub test: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Create FILE from the contents of a directory
    #[arg(short = 'c', value_name = "SRC_DIR", conflicts_with_all = ["add", "delete"])]
    pub create_from: Option<String>,

    /// With -c: store names under the source directory's own name
    #[arg(long = "base-dir", requires = "create_from")]
    pub include_base_directory: bool,

    /// Compression level for new entries: optimal, fastest or store
    #[arg(long = "level", value_name = "LEVEL", default_value = "optimal")]
    pub level: CompressionLevel,

    /// Add files to FILE, replacing entries with the same name
    #[arg(short = 'a', value_name = "PATH", num_args = 1..)]
    pub add: Vec<String>,

    /// Delete entries from FILE
    #[arg(short = 'D', value_name = "NAME", num_args = 1..)]
    pub delete: Vec<String>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Log library internals to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Whether the command changes FILE rather than reading it.
    pub fn is_update(&self) -> bool {
        !self.add.is_empty() || !self.delete.is_empty()
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet > 0 {
            "error"
        } else {
            "warn"
        }
    }
}
