use anyhow::Result;
use clap::Parser;
use iceberg::cli::{self, Command};
use iceberg::commands::{self, MapRequest};
use iceberg::config::Config;
use iceberg::logging;
use iceberg::resolver::CancellationToken;

fn main() -> Result<()> {
    logging::init_tracing();
    let args = cli::Args::parse();
    let config = Config::from_env();
    let cancel = CancellationToken::new();

    match args.command {
        Command::Map {
            target,
            flow,
            distance,
            output,
            format,
        } => {
            let request = MapRequest {
                flow,
                distance,
                output,
                format,
            };
            if let Some(summary) = commands::run_map(&target, &request, &config, &cancel)? {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Ok(())
        }
        Command::EntryPoints { target } => {
            let records = commands::run_entry_points(&target, &config, &cancel)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
    }
}
