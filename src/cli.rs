use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chunkfetch")]
#[command(about = "Download a chunked file and reassemble it", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $CHUNKFETCH_CONFIG or config/chunkfetch.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the given chunk URLs, in order, into one output file
    Download(DownloadArgs),
    /// Run a JSON job description: {"chunks": [...], "filename": "..."}
    Run(RunArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// Output name, relative to the storage root
    #[arg(long, short)]
    pub filename: String,

    /// Chunk locations in assembly order
    pub chunks: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Job file, or `-` for stdin
    pub job: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download() {
        let cli = Cli::parse_from([
            "chunkfetch",
            "download",
            "--filename",
            "bundle.bin",
            "http://x/a",
            "http://x/b",
        ]);

        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.filename, "bundle.bin");
                assert_eq!(args.chunks, vec!["http://x/a", "http://x/b"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["chunkfetch", "run", "job.json", "--config", "custom.toml"]);

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Run(RunArgs { ref job }) if job == &PathBuf::from("job.json")));
    }
}
