mod config;
mod db;
mod models;
mod mongo;
mod provider;
mod search;
mod store;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, Credentials};
use db::Database;
use mongo::MongoStore;
use provider::NubelaClient;
use search::{employee_urls, SearchStats, Searcher};
use std::path::{Path, PathBuf};
use store::Store;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prospect")]
#[command(about = "Pull LinkedIn company and employee data through Nubela, cached in a document store")]
struct Cli {
    /// Path to the config file (companies, employment status)
    #[arg(short, long, default_value = "config.yml", global = true)]
    config: PathBuf,

    /// Path to the credentials file (API key, MongoDB login)
    #[arg(long, default_value = ".credentials.yml", global = true)]
    credentials: PathBuf,

    /// Use a local SQLite cache instead of MongoDB (optionally at PATH)
    #[arg(long, value_name = "PATH", num_args = 0..=1, global = true)]
    sqlite: Option<Option<PathBuf>>,

    /// MongoDB database name
    #[arg(long, default_value = mongo::DEFAULT_DATABASE, global = true)]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch employee listings for configured companies, then profiles for every stored employee
    Run,

    /// Fetch employee listings for configured companies only
    Companies,

    /// Fetch profiles for every employee of every stored company
    Profiles,

    /// List stored companies
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.sqlite {
        Some(path) => {
            let db = Database::open(path.as_deref())?;
            tracing::info!("Using SQLite cache at {}", db.path().display());
            execute(&cli, db, None)
        }
        None => {
            let credentials = Credentials::load(&cli.credentials)?;
            let store = MongoStore::connect(&credentials.atlas_uri()?, &cli.database)?;
            execute(&cli, store, Some(credentials))
        }
    }
}

fn execute<S: Store>(cli: &Cli, store: S, credentials: Option<Credentials>) -> Result<()> {
    match cli.command {
        Commands::List => list_companies(&store)?,

        Commands::Run => {
            let config = load_config(&cli.config)?;
            let searcher = searcher(cli, &config, store, credentials)?;
            let summary = searcher.run(&config)?;
            println!("\nResults:");
            print_stats("Companies", summary.companies);
            println!("  Employee URLs:  {}", summary.profile_urls);
            print_stats("Profiles", summary.profiles);
            println!("  Profiles total: {}", searcher.store().profile_count()?);
        }

        Commands::Companies => {
            let config = load_config(&cli.config)?;
            let searcher = searcher(cli, &config, store, credentials)?;
            let stats =
                searcher.search_employee_listing(&config.companies, &config.employment_status)?;
            println!("\nResults:");
            print_stats("Companies", stats);
        }

        Commands::Profiles => {
            let config = load_config(&cli.config)?;
            let searcher = searcher(cli, &config, store, credentials)?;
            let urls = searcher.stored_employee_urls()?;
            let stats = searcher.search_profile_details(&urls)?;
            println!("\nResults:");
            println!("  Employee URLs:  {}", urls.len());
            print_stats("Profiles", stats);
        }
    }

    Ok(())
}

fn searcher<S: Store>(
    cli: &Cli,
    config: &Config,
    store: S,
    credentials: Option<Credentials>,
) -> Result<Searcher<NubelaClient, S>> {
    let credentials = match credentials {
        Some(c) => c,
        None => Credentials::load(&cli.credentials)?,
    };
    let provider = NubelaClient::new(&credentials.nubela_api_key, config.request_timeout())
        .context("Failed to set up HTTP client")?;
    Ok(Searcher::new(provider, store))
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    if config.companies.is_empty() {
        tracing::warn!("No companies listed in {}", path.display());
    }
    Ok(config)
}

fn list_companies<S: Store>(store: &S) -> Result<()> {
    let companies = store.companies()?;
    if companies.is_empty() {
        println!("No companies stored.");
    } else {
        println!("{:<30} {:>10} {:<20} {}", "COMPANY", "EMPLOYEES", "SEARCHED", "URL");
        println!("{}", "-".repeat(100));
        for company in &companies {
            println!(
                "{:<30} {:>10} {:<20} {}",
                truncate(&company.company_name, 28),
                company.employees.len(),
                company.date_searched.format("%Y-%m-%d %H:%M:%S"),
                company.company_url
            );
        }
    }

    println!(
        "\n{} employee URLs across {} companies, {} profiles stored",
        employee_urls(&companies).len(),
        companies.len(),
        store.profile_count()?
    );
    Ok(())
}

fn print_stats(label: &str, stats: SearchStats) {
    println!("  {:<15} {} fetched, {} already stored", format!("{}:", label), stats.fetched, stats.skipped);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
