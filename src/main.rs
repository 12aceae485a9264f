use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug, error, info};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use time::macros::format_description;

use tree_audit::{Cli, Commands, ConsoleSummary, ScanConfig, analyze, copy_tree, format_human_elapsed};

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_time_format_custom(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .build();
    // Logs go to stderr so stdout only carries the JSON summary.
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Failed to initialize logger: {}", e);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze(args) => {
            let config = ScanConfig::from(args);
            let result = analyze(&config)?;
            let summary = ConsoleSummary::from(&result.summary);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Mirror {
            share_folder,
            local_folder,
            exists_ok,
        } => {
            copy_tree(&share_folder, &local_folder, exists_ok)?;
        }
        Commands::CopyTree {
            source_folder,
            destination_folder,
            exists_ok,
        } => {
            copy_tree(&source_folder, &destination_folder, exists_ok)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let start_time = Instant::now();
    let cli = Cli::parse();
    init_logger(cli.verbose);

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    match run(cli) {
        Ok(()) => {
            info!("Completed in {}", format_human_elapsed(start_time.elapsed()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
