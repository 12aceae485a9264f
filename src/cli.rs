use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::filter::ExtensionSet;
use crate::report::ReportFormat;
use crate::scanner::ScanConfig;

#[derive(Parser, Debug)]
#[command(name = "tree-audit")]
#[command(version, about = "Directory tree utilities: duplicate analysis and folder copies")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a directory tree: count matching files, their size and duplicates
    Analyze(AnalyzeArgs),
    /// Mirror a shared folder (e.g. a synced drive share) into a local folder
    Mirror {
        /// The shared folder to pull down
        #[arg(long)]
        share_folder: PathBuf,

        /// The local folder to mirror into
        #[arg(long)]
        local_folder: PathBuf,

        /// Do not fail if the local folder already exists
        #[arg(long)]
        exists_ok: bool,
    },
    /// Copy a tree of files from one location to another
    CopyTree {
        /// The folder to copy from
        #[arg(long)]
        source_folder: PathBuf,

        /// The folder to copy to
        #[arg(long)]
        destination_folder: PathBuf,

        /// Do not fail if the destination folder already exists
        #[arg(long)]
        exists_ok: bool,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// The directory to analyze
    #[arg(long)]
    pub directory: PathBuf,

    /// Save the file index (hash -> files) to this path; a `.zst` suffix compresses it
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Extensions to count, case insensitive and the dot is optional
    #[arg(long, num_args = 0.., default_values = ["jpg", "jpeg"])]
    pub extensions: Vec<String>,

    /// Only dump duplicate groups to the output file
    #[arg(long)]
    pub only_dump_duplicates: bool,

    /// Format of the output file
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    pub format: ReportFormat,

    /// Show a progress spinner on stderr
    #[arg(long)]
    pub progress: bool,
}

impl From<AnalyzeArgs> for ScanConfig {
    fn from(args: AnalyzeArgs) -> Self {
        Self {
            root: args.directory,
            extensions: ExtensionSet::new(&args.extensions),
            output: args.output_file,
            only_duplicates: args.only_dump_duplicates,
            format: args.format,
            show_progress: args.progress,
        }
    }
}
