//! The main entry point for the `webpify` command-line application.
//!
//! Parses arguments, sets up logging and dispatches to the library. Any error
//! that reaches this point ends the process with exit status 1.

use anyhow::Context;
use env_logger::Env;
use std::process;
use webpify::cli::{self, Commands};
use webpify::config::ConfigLoader;
use webpify::errors::Error;
use webpify::output_formatter::OutputFormat;
use webpify::{deleter, orchestrator, replacer};

fn main() {
    let args = cli::parse_args();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::new().filter_or("WEBPIFY_LOG", default_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(args) {
        report_fatal(&e);
        process::exit(1);
    }
}

fn run(args: cli::Args) -> anyhow::Result<()> {
    let working_dir = std::env::current_dir().context("cannot read the current directory")?;
    let settings = ConfigLoader::resolve(args.config.as_deref(), &working_dir)?;

    let result = match args.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => orchestrator::run_interactive(settings).map(|_| ()),
        Commands::Convert {
            dir,
            quality,
            preset,
            exclude,
            update_refs,
            delete_originals,
        } => orchestrator::run_convert(
            dir,
            quality.or(preset.map(|p| p.quality())),
            exclude,
            update_refs,
            delete_originals,
            settings,
        )
        .map(|_| ()),
        Commands::Refs {
            dir,
            dry_run,
            format,
        } => replacer::run_refs(dir, dry_run, OutputFormat::from(format.as_str()), &settings),
        Commands::Delete {
            dir,
            dry_run,
            exclude,
        } => deleter::run_delete(dir, dry_run, exclude, &settings),
    };
    Ok(result?)
}

fn report_fatal(e: &anyhow::Error) {
    match e.downcast_ref::<Error>() {
        Some(Error::NoImages { root }) => {
            eprintln!("\n❌ No images found in selected directory!");
            eprintln!("📝 No supported images (.jpg, .jpeg, .png) found in: {}", root.display());
            eprintln!("\n💡 Please:");
            eprintln!("   • Check the directory path");
            eprintln!("   • Make sure images have supported extensions (.jpg, .jpeg, .png)");
            eprintln!("   • Try running the command again with a different directory");
        }
        _ => eprintln!("❌ An error occurred: {e:#}"),
    }
}
