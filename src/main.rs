use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use webshop::config::ShopConfig;
use webshop::domain::ports::PaymentGatewayRef;
use webshop::infrastructure::Backend;
use webshop::infrastructure::in_memory::InMemoryStore;
use webshop::infrastructure::sandbox_gateway::SandboxGateway;
use webshop::infrastructure::timeout_gateway::TimeoutGateway;
use webshop::interfaces::api::{ShopApi, error_response};
use webshop::interfaces::csv::product_reader::ProductReader;
use webshop::interfaces::csv::report_writer::ReportWriter;
use webshop::interfaces::jsonl::request_reader::RequestReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input requests file, one JSON object per line
    requests: PathBuf,

    /// Catalog CSV to load before processing requests
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Currency code for provider payments
    #[arg(long, default_value = "EUR")]
    currency: String,

    /// Base URL the provider redirects back to
    #[arg(long, default_value = "http://localhost:5173")]
    return_base_url: String,

    /// Upper bound for a single provider call
    #[arg(long, default_value_t = 10_000)]
    provider_timeout_ms: u64,

    /// Payer ids the sandbox provider declines
    #[arg(long = "declined-payer")]
    declined_payers: Vec<String>,

    /// Write all orders as CSV when done
    #[arg(long)]
    orders_report: Option<PathBuf>,

    /// Write final product stock as CSV when done
    #[arg(long)]
    stock_report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ShopConfig {
        currency: cli.currency,
        return_base_url: cli.return_base_url,
        provider_timeout: Duration::from_millis(cli.provider_timeout_ms),
    };

    let backend = open_backend(cli.db_path.as_deref())?;
    if let Some(catalog) = &cli.catalog {
        load_catalog(&backend, catalog).await?;
    }

    let gateway: PaymentGatewayRef = Arc::new(TimeoutGateway::new(
        SandboxGateway::with_declined_payers(cli.declined_payers),
        config.provider_timeout,
    ));
    let api = ShopApi::new(&backend, gateway, config);

    let file = File::open(&cli.requests).into_diagnostic()?;
    let reader = RequestReader::new(BufReader::new(file));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for request in reader.requests() {
        match request {
            Ok(request) => {
                let response = api.handle(request).await;
                writeln!(out, "{response}").into_diagnostic()?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error reading request");
                writeln!(out, "{}", error_response(&e)).into_diagnostic()?;
            }
        }
    }
    out.flush().into_diagnostic()?;

    if let Some(path) = &cli.orders_report {
        let orders = backend.orders.all_orders().await.into_diagnostic()?;
        let file = File::create(path).into_diagnostic()?;
        ReportWriter::new(file).write_orders(&orders).into_diagnostic()?;
    }
    if let Some(path) = &cli.stock_report {
        let products = backend.catalog.all_products().await.into_diagnostic()?;
        let file = File::create(path).into_diagnostic()?;
        ReportWriter::new(file).write_stock(&products).into_diagnostic()?;
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_backend(db_path: Option<&Path>) -> Result<Backend> {
    use webshop::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            tracing::info!(path = %path.display(), "using RocksDB storage");
            Ok(Backend::from_store(store))
        }
        None => Ok(Backend::from_store(InMemoryStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_backend(db_path: Option<&Path>) -> Result<Backend> {
    if db_path.is_some() {
        tracing::warn!(
            "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
        );
    }
    Ok(Backend::from_store(InMemoryStore::new()))
}

async fn load_catalog(backend: &Backend, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    let mut loaded = 0usize;
    for product in ProductReader::new(file).products() {
        match product {
            Ok(product) => {
                backend
                    .catalog_writer
                    .upsert_product(product)
                    .await
                    .into_diagnostic()?;
                loaded += 1;
            }
            Err(e) => tracing::warn!(error = %e, "skipping catalog row"),
        }
    }
    tracing::info!(loaded, "catalog loaded");
    Ok(())
}
