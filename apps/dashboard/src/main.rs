use clinic_shared::config::Config;
use clinic_shared::fixtures::DirFixtures;
use clinic_shared::storage::FileStorage;
use clinic_shared::AppState;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{Command, Flow};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Using fixtures from {} and storage in {}",
        config.data_dir.display(),
        config.storage_dir.display()
    );

    // Build the stores once; everything below borrows them
    let storage = FileStorage::open(&config.storage_dir)?;
    let mut state = AppState::new(DirFixtures::new(&config.data_dir), storage);
    state.appointments.load().await;

    // A command on the command line runs once; otherwise read commands from stdin
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let command = Command::parse(&args.join(" "));
        commands::execute(&mut state, command).await;
        return Ok(());
    }

    println!("Clinic dashboard. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Flow::Quit = commands::execute(&mut state, Command::parse(&line)).await {
            break;
        }
    }

    Ok(())
}
