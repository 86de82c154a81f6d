mod db;
mod fetch;
mod pipeline;
mod table;

use std::time::Instant;

use clap::{Parser, Subcommand};
use config::Config;

#[derive(Parser)]
#[command(name = "azure_pricing", about = "Azure VM pricing catalog scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the pricing page and refresh the catalog for one region
    Run {
        /// Region slug to resolve prices for (e.g. "us-east", "us-west")
        #[arg(short, long, default_value = "us-east")]
        region: String,
    },
    /// Saved catalog table
    Show {
        /// Filter by region slug
        #[arg(short, long)]
        region: Option<String>,
        /// Only SKUs with at least one GPU
        #[arg(long)]
        gpus: bool,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Catalog statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Config::builder()
        .add_source(config::Environment::with_prefix("PRICING"))
        .build()
        .unwrap_or_default();

    let result = match cli.command {
        Commands::Run { region } => {
            let url = settings
                .get_string("url")
                .unwrap_or_else(|_| fetch::PRICING_URL.to_string());
            let fetcher = fetch::HttpFetcher::new(url);
            let catalog = pipeline::run(&fetcher, &region)?;
            if catalog.is_empty() {
                println!("No SKU rows found on the pricing page for {}.", region);
                return Ok(());
            }

            let conn = db::connect(&db_path(&settings))?;
            db::init_schema(&conn)?;
            let saved = db::save_catalog(&conn, &catalog)?;
            println!("Saved {} SKUs for {}.", saved, region);
            Ok(())
        }
        Commands::Show { region, gpus, limit } => {
            let conn = db::connect(&db_path(&settings))?;
            db::init_schema(&conn)?;
            let rows = db::fetch_catalog(&conn, region.as_deref(), gpus, limit)?;
            if rows.is_empty() {
                println!("No SKUs found. Run 'run' first.");
                return Ok(());
            }

            // Compact, readable table
            println!(
                "{:>3} | {:<20} | {:<10} | {:>5} | {:>9} | {:<10} | {:>10} | {:>8} | {:>9}",
                "#", "SKU", "Region", "CPUs", "RAM GB", "GPU", "GPU RAM GB", "$/hr", "Spot $/hr"
            );
            println!("{}", "-".repeat(108));

            for (i, r) in rows.iter().enumerate() {
                let name = truncate(r.name.as_deref().unwrap_or("-"), 20);
                let cpus = r.cpus.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
                let gpu = if r.gpus > 0 {
                    format!("{}x {}", r.gpus, r.gpu_name.as_deref().unwrap_or("?"))
                } else {
                    "-".into()
                };
                let price = fmt_price(r.price_hr);
                let spot = fmt_price(r.spot_hr);

                println!(
                    "{:>3} | {:<20} | {:<10} | {:>5} | {:>9} | {:<10} | {:>10} | {:>8} | {:>9}",
                    i + 1, name, r.region, cpus, r.ram_gb, gpu, r.gpu_ram_gb, price, spot
                );
            }

            println!("\n{} SKUs", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&db_path(&settings))?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("SKUs:        {}", s.total);
            println!("Regions:     {}", s.regions);
            println!("With GPU:    {}", s.with_gpu);
            println!("Priced:      {}", s.priced);
            println!("Spot priced: {}", s.spot_priced);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn db_path(settings: &Config) -> String {
    settings
        .get_string("db")
        .unwrap_or_else(|_| db::DEFAULT_DB_PATH.to_string())
}

fn fmt_price(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "-".into())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
