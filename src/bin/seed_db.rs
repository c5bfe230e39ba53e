use std::path::PathBuf;

use anyhow::Result;
use chrono::{Duration, Local};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use docqa::seed::{create_sample_database, DAYS};

#[derive(Parser, Debug)]
#[command(name = "seed_db")]
#[command(about = "Create the sample employee attendance database")]
struct Cli {
    #[arg(long, env = "DATABASE_PATH", default_value = "attendance.db")]
    path: PathBuf,
    /// Fixed RNG seed for reproducible data.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let start = Local::now().date_naive() - Duration::days(DAYS);

    let summary = create_sample_database(&cli.path, &mut rng, start).await?;

    println!("Database created: {}", cli.path.display());
    println!("  departments: {}", summary.departments);
    println!("  employees:   {}", summary.employees);
    println!("  attendance:  {}", summary.attendance);

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
