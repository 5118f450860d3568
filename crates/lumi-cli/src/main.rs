use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use lumi_catalog::{category_catalog, load_listings, CatalogQuery, CatalogView};
use lumi_core::{CategoryFilter, ImageRef, PriceBucket, SubmissionIntent};
use lumi_draft::{
    AcquireError, AcquireVia, AttachmentSource, DraftField, DraftSession, DraftSnapshot, SubmissionSink,
    SubmitOutcome,
};
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "lumi")]
#[command(about = "Lumivana commissions command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Filter the commission listing.
    Browse(BrowseArgs),
    /// List the category chips and price buckets.
    Filters,
    /// Submit a commission request.
    Request(DraftArgs),
    /// Submit a commission offer.
    Offer(DraftArgs),
}

#[derive(Debug, Args, Default)]
struct BrowseArgs {
    /// Listing file (JSON or YAML); defaults to LUMI_LISTINGS_PATH.
    #[arg(long)]
    listings: Option<PathBuf>,
    #[arg(long, default_value = "")]
    search: String,
    /// `all` or a category tag.
    #[arg(long, default_value = "all")]
    category: String,
    /// `any`, `low`, `mid` or `high`.
    #[arg(long, default_value = "any")]
    price: String,
    /// Print the visible listings as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct DraftArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Calendar date, `YYYY-MM-DD`.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    contact: String,
    /// Image reference to attach; repeatable.
    #[arg(long = "attachment")]
    attachments: Vec<String>,
    /// Attachment index to remove after attaching; repeatable.
    #[arg(long = "remove")]
    removals: Vec<usize>,
}

#[derive(Debug, Clone)]
struct CliConfig {
    listings_path: PathBuf,
    log_json: bool,
}

impl CliConfig {
    fn from_env() -> Self {
        Self {
            listings_path: std::env::var("LUMI_LISTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("fixtures/listings.json")),
            log_json: std::env::var("LUMI_LOG_JSON")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
        }
    }
}

fn init_tracing(config: &CliConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!config.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Hands out the `--attachment` values one pick at a time.
struct QueuedSource {
    queue: Mutex<VecDeque<ImageRef>>,
}

impl QueuedSource {
    fn new(refs: &[String]) -> Self {
        Self {
            queue: Mutex::new(refs.iter().map(|r| ImageRef::new(r.as_str())).collect()),
        }
    }

    fn next(&self) -> Result<ImageRef, AcquireError> {
        let mut queue = self.queue.lock().map_err(|_| AcquireError::UserCancelled)?;
        queue.pop_front().ok_or(AcquireError::UserCancelled)
    }
}

#[async_trait]
impl AttachmentSource for QueuedSource {
    async fn pick_from_library(&self) -> Result<ImageRef, AcquireError> {
        self.next()
    }

    async fn capture_from_camera(&self) -> Result<ImageRef, AcquireError> {
        Err(AcquireError::PermissionDenied)
    }
}

struct StdoutSink;

impl SubmissionSink for StdoutSink {
    fn hand_off(&self, snapshot: DraftSnapshot) {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(err) => error!(error = %err, "failed to render submission"),
        }
    }
}

fn browse(config: &CliConfig, args: BrowseArgs) -> Result<()> {
    let path = args.listings.unwrap_or_else(|| config.listings_path.clone());
    let listings = load_listings(&path)?;
    let query = CatalogQuery {
        search_text: args.search,
        category: CategoryFilter::from_tag(&args.category),
        price_bucket: PriceBucket::from_tag(&args.price),
    };
    if let CategoryFilter::Unrecognized(tag) = &query.category {
        warn!(category = %tag, "unknown category; nothing will match");
    }
    if let PriceBucket::Unrecognized(tag) = &query.price_bucket {
        warn!(price = %tag, "unknown price bucket; nothing will match");
    }
    let view = CatalogView::with_query(listings, query);

    if args.json {
        println!("{}", serde_json::to_string_pretty(view.visible())?);
        return Ok(());
    }
    println!("{} results", view.results_count());
    for listing in view.visible() {
        println!(
            "{:<4} {:<32} {:<9} {}",
            listing.id,
            listing.title,
            listing.category,
            listing.display_price()
        );
    }
    Ok(())
}

async fn submit_draft(intent: SubmissionIntent, args: DraftArgs) -> Result<()> {
    let mut session = DraftSession::new(intent);
    session.set_field(DraftField::CommissionName, args.name)?;
    session.set_field(DraftField::Description, args.description)?;
    session.set_field(DraftField::Category, args.category)?;
    session.set_field(DraftField::ContactInfo, args.contact)?;
    session.apply_date_selection(args.date)?;

    let source = QueuedSource::new(&args.attachments);
    for _ in &args.attachments {
        session.acquire(&source, AcquireVia::Library).await?;
    }
    for index in args.removals {
        session.request_removal(index)?;
        if let Err(err) = session.confirm_removal() {
            warn!(error = %err, "attachment not removed");
        }
    }

    match session.submit_to(&StdoutSink)? {
        SubmitOutcome::Submitted(_) => {
            eprintln!("{} {}", intent.sent_title(), intent.sent_message());
            Ok(())
        }
        SubmitOutcome::MissingFields(missing) => {
            let labels = missing.missing.iter().map(|f| f.label()).collect::<Vec<_>>();
            bail!("Missing Info: {} ({})", missing.message(), labels.join(", "))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CliConfig::from_env();
    init_tracing(&config);
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Browse(BrowseArgs {
        category: "all".to_string(),
        price: "any".to_string(),
        ..BrowseArgs::default()
    })) {
        Commands::Browse(args) => browse(&config, args)?,
        Commands::Filters => {
            for chip in category_catalog() {
                println!("{} {:<9} {:<18} {}", chip.icon, chip.filter.as_tag(), chip.title, chip.description);
            }
            for bucket in PriceBucket::CHOICES {
                println!("{:<5} {}", bucket.as_tag(), bucket.label());
            }
        }
        Commands::Request(args) => submit_draft(SubmissionIntent::Request, args).await?,
        Commands::Offer(args) => submit_draft(SubmissionIntent::Offer, args).await?,
    }

    Ok(())
}
