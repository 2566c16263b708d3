#![allow(clippy::too_many_lines, clippy::needless_pass_by_value)]

use std::process;

use clap::Parser;
use colored::Colorize;

use sectormer::{
    cli::{Args, Cli, Command, MergeArgs},
    config::RunConfig,
    input::Input,
    merge, pipeline,
};

/// Initialize the tracing subscriber with environment filter.
///
/// Set `RUST_LOG=sectormer=debug` to see debug output.
#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn main() {
    #[cfg(feature = "tracing")]
    init_tracing();

    // `merge` is the only subcommand; everything else is the default
    // counting path, parsed as a flat `Args` (matching the corpus's own
    // split between a subcommand-only `Cli` and a flat default `Args`).
    let raw: Vec<String> = std::env::args().collect();
    if raw.get(1).is_some_and(|arg| arg == "merge") {
        let cli = Cli::parse();
        if let Some(Command::Merge(merge_args)) = cli.command {
            run_merge_command(&merge_args);
        }
        return;
    }

    run_count(&Args::parse());
}

fn run_count(args: &Args) {
    let input = args.input();

    if let Input::File(ref path) = input {
        if !path.exists() {
            report_and_exit("Problem with arguments:", &format!("file not found: {}", path.display()));
        }
    }

    let config = RunConfig::from_args(args).unwrap_or_else(|e| {
        report_and_exit("Invalid configuration:", &e.to_string());
    });

    if !args.quiet {
        eprintln!("{}: {}", "input".bold(), input.to_string().underline().blue().bold());
        eprintln!("{}: {}", "format".bold(), args.resolved_input_format().to_string().blue().bold());
        eprintln!(
            "{}: {}..={}",
            "lengths".bold(),
            config.pipeline.min_len.to_string().blue().bold(),
            config.pipeline.max_len.to_string().blue().bold()
        );
        eprintln!("{}: {} MB", "maxmem".bold(), args.maxmem.to_string().blue().bold());
        eprintln!("{}: {} GB", "maxdisk".bold(), args.maxdisk.to_string().blue().bold());
        eprintln!("{}: {}", "cores".bold(), config.pipeline.workers.to_string().blue().bold());
        eprintln!("{}: {}", "min-abundance".bold(), args.min_abundance.to_string().blue().bold());
        eprintln!("{}: {}", "out".bold(), config.out_prefix.display().to_string().green().bold());
        eprintln!();
    }

    if let Err(e) = pipeline::run(&input, &config.out_prefix, &config.pipeline) {
        report_and_exit("Application error:", &e.to_string());
    }

    if !args.quiet {
        eprintln!("{}", "done".green().bold());
    }
}

fn run_merge_command(args: &MergeArgs) {
    let lengths: Vec<u32> = args.lengths().into_iter().map(|l| l as u32).collect();
    if let Err(e) = merge::run_merge(&args.inputs, &args.out, &lengths, args.min_abundance) {
        report_and_exit("Merge error:", &e.to_string());
    }
}

fn report_and_exit(heading: &str, detail: &str) -> ! {
    eprintln!("{}\n {}", heading.red().bold(), detail.red());
    process::exit(1);
}
