use clap::Parser;
use ipfs_wayback::{ArchiverConfig, Wayback};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match ArchiverConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ArchiverConfig::default(),
    };
    let config = args.apply(config.apply_env());

    ::log::info!(
        "Archiving {} links with {} publisher",
        args.urls.len(),
        config.publish_mode.as_str()
    );

    let wayback = match Wayback::from_config(config) {
        Ok(wayback) => wayback,
        Err(e) => {
            ::log::error!("Invalid JavaScript rule list: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let results = match wayback.run(&args.urls).await {
        Ok(results) => results,
        Err(e) => {
            ::log::error!("Batch failed: {}", e);
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                ::log::error!("Failed to encode results: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        // Keep the input order on screen
        for link in &args.urls {
            if let Some(destination) = results.get(link) {
                println!("{} => {}", link, destination);
            }
        }
    }

    ExitCode::SUCCESS
}
