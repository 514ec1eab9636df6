use clap::Parser;
use parley::core::config;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "parley", about = "Streaming terminal chat client")]
struct Args {
    /// Completion endpoint URL (overrides config file and PARLEY_ENDPOINT)
    #[arg(short, long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to parley.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("parley.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!("Parley starting up");

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("parley: {e}");
            std::process::exit(1);
        }
    };
    let resolved = config::resolve(&file_config, args.endpoint.as_deref());
    log::info!("Using endpoint: {}", resolved.endpoint);

    parley::tui::run(resolved)
}
