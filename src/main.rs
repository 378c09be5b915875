mod cli;

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use chunkfetch::Downloader;
use chunkfetch::config::Config;
use chunkfetch::events::{JobEvent, Outcome};
use chunkfetch::job::{JobError, JobRequest};
use chunkfetch::observability::init_tracing;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<ExitCode, AnyError> {
    let cli = Cli::parse();
    let config = Config::load_with(cli.config)?;

    init_tracing(&config.telemetry.log_level);

    let request = match cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Download(args) => JobRequest::new(args.chunks, args.filename),
        Commands::Run(args) => {
            let raw = read_job(&args.job)?;
            let parsed = serde_json::from_str(&raw)
                .map_err(JobError::from)
                .and_then(JobRequest::from_value);

            match parsed {
                Ok(request) => request,
                Err(reason) => {
                    println!("{}", Outcome::Failure { reason }.to_json());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    };

    let downloader = Downloader::from_config(&config)?;
    let mut handle = downloader.submit(request);

    let mut succeeded = false;
    while let Some(event) = handle.next_event().await {
        if let JobEvent::Terminal(outcome) = &event {
            succeeded = outcome.is_success();
        }
        println!("{}", event.to_json());
    }

    info!(metrics = ?downloader.metrics(), "Done");

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_job(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path)
    }
}
