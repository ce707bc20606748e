use clap::Parser;
use std::sync::Arc;

mod cli;
mod commands;

use cli::{Args, Commands};
use commands::{run_mapper, RunOptions};
use mapperfs::config::load_config;
use mapperfs::error;
use mapperfs::source::{ArgsSource, ListingSource, PathSource, PlaylistSource};

const LOG_ENV: &str = "MAPPERFS_LOG";

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => {
            std::process::exit(code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> error::Result<i32> {
    let args = Args::parse();

    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string()))
        .with_writer(std::io::stderr)
        .init();

    let (source, mount_point) = match args.command {
        Commands::Config { action } => {
            commands::handle_config_command(action)?;
            return Ok(0);
        }
        Commands::Mount {
            mount_point,
            inputs,
        } => {
            cli::validate_inputs(&inputs)?;
            let source: Arc<dyn PathSource> = Arc::new(ListingSource::new(inputs)?);
            (source, mount_point)
        }
        Commands::Files { mount_point, paths } => {
            let source: Arc<dyn PathSource> = Arc::new(ArgsSource::new(paths));
            (source, mount_point)
        }
        Commands::Playlist {
            file,
            playlist,
            mount_point,
        } => {
            cli::validate_inputs(std::slice::from_ref(&file))?;
            let source: Arc<dyn PathSource> = Arc::new(PlaylistSource::new(file, playlist));
            (source, mount_point)
        }
    };

    let config = load_config()?;
    let options = RunOptions::resolve(&config, args.mapper, args.once, args.dry_run);
    tracing::debug!("running with {:?}", options);

    run_mapper(source, &mount_point, options, &config).await
}
