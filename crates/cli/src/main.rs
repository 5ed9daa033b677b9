//! # leverage: command-line client for the assistant services
//!
//! Exercises both services over HTTP and seeds a local Anti-To-Do database.

mod api_client;
mod chat;
mod ui;

use anyhow::{bail, Context, Result};
use api_client::ApiClient;
use clap::{Args, Parser, Subcommand};
use leverage::{
    providers::db::sqlite::SqliteProvider,
    store::threads::{create_thread_with_messages, NewThread},
    types::SenderType,
};
use serde_json::Value;
use std::fs::File;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const ANTITODO_URL: &str = "http://localhost:8000";
const OWNERSHIP_URL: &str = "http://localhost:8001";

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the service (defaults to the service's local port)
    #[arg(long, global = true, env = "LEVERAGE_API_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that a service is up
    Health {
        /// Check the ownership service instead of Anti-To-Do
        #[arg(long)]
        ownership: bool,
    },
    /// Create an Anti-To-Do session
    Onboard(IntakeArgs),
    /// Fetch recommendations for a session
    Recommend {
        #[arg(long)]
        thread_id: i64,
    },
    /// Chat interactively with the Anti-To-Do assistant
    Chat {
        /// Continue an existing session instead of creating one
        #[arg(long)]
        thread_id: Option<i64>,
        #[command(flatten)]
        intake: IntakeArgs,
    },
    /// Ownership resolution commands
    Ownership(OwnershipArgs),
    /// Seed a local Anti-To-Do database with a sample session
    Seed {
        #[arg(long, env = "DATABASE_URL", default_value = "anti_todo.db")]
        database_url: String,
    },
}

#[derive(Args, Debug)]
struct IntakeArgs {
    #[arg(long, default_value = "Product Manager")]
    role: String,
    #[arg(long, default_value = "SaaS")]
    industry: String,
    #[arg(long, default_value = "Too many meetings")]
    pains: String,
}

#[derive(Args, Debug)]
struct OwnershipArgs {
    /// Route prefix of the versioned endpoints
    #[arg(long, global = true, default_value = "/api/v1")]
    prefix: String,
    #[command(subcommand)]
    command: OwnershipCommands,
}

#[derive(Subcommand, Debug)]
enum OwnershipCommands {
    /// Ask who owns a product area
    Query {
        query: String,
        #[arg(long)]
        context: Option<String>,
        /// Resolve through the knowledge base instead of the stored mappings
        #[arg(long)]
        retrieval: bool,
    },
    /// Ingest records from a JSON file
    Ingest {
        #[arg(long)]
        file: String,
        #[arg(long, default_value = "product_matrix")]
        source: String,
    },
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let log_file = File::create("leverage-cli.log")?;
    let subscriber = fmt::Subscriber::builder()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let url_or = |default: &str| cli.url.clone().unwrap_or_else(|| default.to_string());

    match cli.command {
        Commands::Health { ownership } => {
            let url = url_or(if ownership { OWNERSHIP_URL } else { ANTITODO_URL });
            let health = ApiClient::new(&url).health().await?;
            println!("{health}");
        }
        Commands::Onboard(intake) => {
            let client = ApiClient::new(&url_or(ANTITODO_URL));
            let session = client
                .onboard(&intake.role, &intake.industry, &intake.pains)
                .await?;
            println!("Thread ID: {}", session.thread_id);
            if let Some(role) = session.role_normalized {
                println!("Normalized role: {role}");
            }
        }
        Commands::Recommend { thread_id } => {
            let client = ApiClient::new(&url_or(ANTITODO_URL));
            let recs = client.recommendations(thread_id).await?;
            print!("{}", ui::format_recommendations(&recs.items));
        }
        Commands::Chat { thread_id, intake } => {
            let client = ApiClient::new(&url_or(ANTITODO_URL));
            chat::run(
                &client,
                thread_id,
                chat::Intake {
                    role: intake.role,
                    industry: intake.industry,
                    pains: intake.pains,
                },
            )
            .await?;
        }
        Commands::Ownership(args) => {
            let client = ApiClient::new(&url_or(OWNERSHIP_URL));
            handle_ownership(&client, args).await?;
        }
        Commands::Seed { database_url } => {
            let thread_id = seed(&database_url).await?;
            println!("Seeded thread {thread_id} into '{database_url}'.");
        }
    }

    Ok(())
}

// --- Command Handlers ---

async fn handle_ownership(client: &ApiClient, args: OwnershipArgs) -> Result<()> {
    match args.command {
        OwnershipCommands::Query {
            query,
            context,
            retrieval,
        } => {
            let prefix = retrieval.then_some(args.prefix.as_str());
            let resolution = client
                .ownership_query(&query, context.as_deref(), prefix)
                .await?;
            print!("{}", ui::format_resolution(&resolution));
        }
        OwnershipCommands::Ingest { file, source } => {
            let records = read_records(&file)?;
            info!(file = %file, records = records.len(), "Ingesting records.");
            let result = client
                .ingest(&source, records, Some(args.prefix.as_str()))
                .await?;
            println!(
                "Ingested {} new mappings from '{}'.",
                result.records_ingested, result.source
            );
        }
    }
    Ok(())
}

/// Reads either a bare array of records or a `{"data": [...]}` object.
fn read_records(path: &str) -> Result<Vec<Value>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read '{path}'"))?;
    let value: Value =
        serde_json::from_str(&content).with_context(|| format!("'{path}' is not valid JSON"))?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => bail!("'{path}' has no \"data\" array"),
        },
        _ => bail!("'{path}' must contain an array of records"),
    }
}

/// Writes one onboarded sample thread to a local database.
async fn seed(database_url: &str) -> Result<i64> {
    let provider = SqliteProvider::new(database_url).await?;
    provider.initialize_schema().await?;

    let (role, industry, pains) = (
        "Senior Product Manager",
        "Fitness Tech",
        "Too many context pings; manual release notes; planning churn",
    );
    let intake = format!("Role={role}; Industry={industry}; Pains={pains}");
    let thread = create_thread_with_messages(
        &provider.db,
        NewThread {
            role_raw: role,
            industry_raw: industry,
            pains_raw: pains,
            role_normalized: Some("Product Manager"),
            onet_code: None,
        },
        &[
            (SenderType::System, "Anti-To-Do assistant initialized."),
            (SenderType::User, intake.as_str()),
        ],
    )
    .await?;
    Ok(thread.id)
}
