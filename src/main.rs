//! `msproj`: point every Visual Studio project under a directory at one
//! shared output layout.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use msproj_rs::batch;
use msproj_rs::logging::init_logging;
use msproj_rs::options::{DEFAULT_OUTPUT_ROOT, LinkSettings, Options, TestFramework};

#[derive(Parser)]
#[command(
    name = "msproj",
    version,
    about = "Batch-edit .vcxproj/.csproj files to use a shared output, intermediate and log layout"
)]
struct Cli {
    /// Directory searched recursively for *.*proj files
    #[arg(short = 'r', long = "root", value_name = "DIRECTORY")]
    root: PathBuf,

    /// Platform toolset written to native projects (e.g. v100)
    #[arg(long = "ptver", value_name = "VERSION")]
    toolset: Option<String>,

    /// Add test-framework include, library and dependency settings
    #[arg(long = "gt")]
    test_framework: bool,

    /// Test-framework include directories. Only used with --gt.
    #[arg(long = "gtinc", value_name = "DIRS", default_value = "")]
    include_dirs: String,

    /// Release library directories. Only used with --gt.
    #[arg(long = "gtlibdirs", value_name = "DIRS", default_value = "")]
    release_library_dirs: String,

    /// Debug library directories. Only used with --gt.
    #[arg(long = "gtlibdirsd", value_name = "DIRS", default_value = "")]
    debug_library_dirs: String,

    /// Release dependencies. Only used with --gt.
    #[arg(long = "gtdepends", value_name = "LIBS", default_value = "")]
    release_dependencies: String,

    /// Debug dependencies. Only used with --gt.
    #[arg(long = "gtdependsd", value_name = "LIBS", default_value = "")]
    debug_dependencies: String,

    /// Release default libraries to ignore. Only used with --gt.
    #[arg(long = "ignorelibs", value_name = "LIBS", default_value = "")]
    release_ignored_libraries: String,

    /// Debug default libraries to ignore. Only used with --gt.
    #[arg(long = "ignorelibsd", value_name = "LIBS", default_value = "")]
    debug_ignored_libraries: String,

    /// Base directory of the shared layout
    #[arg(long = "output-root", value_name = "DIR", default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: String,

    /// Increase log verbosity (repeatable); MSPROJ_LOG overrides
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> Options {
        let test_framework = self.test_framework.then(|| TestFramework {
            include_dirs: self.include_dirs.clone(),
            release: LinkSettings {
                library_dirs: self.release_library_dirs.clone(),
                dependencies: self.release_dependencies.clone(),
                ignored_libraries: self.release_ignored_libraries.clone(),
            },
            debug: LinkSettings {
                library_dirs: self.debug_library_dirs.clone(),
                dependencies: self.debug_dependencies.clone(),
                ignored_libraries: self.debug_ignored_libraries.clone(),
            },
        });
        Options {
            toolset: self.toolset.clone(),
            output_root: self.output_root.clone(),
            test_framework,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.root.is_dir() {
        println!("Specific path does not exist.");
        return Ok(ExitCode::FAILURE);
    }

    let options = cli.options();
    let stdout = io::stdout();
    let stderr = io::stderr();
    batch::run(&cli.root, &options, &mut stdout.lock(), &mut stderr.lock())
        .with_context(|| format!("Failed to write progress for {}", cli.root.display()))?;

    Ok(ExitCode::SUCCESS)
}
