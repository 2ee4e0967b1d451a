mod cli;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use exn::{OptionExt, ResultExt};
use tome_cache::{BookRecord, Database, Repository};
use tome_config::Config;
use tome_library::Ingestor;
use tome_storage::covers::LocalCoverStore;
use tome_storage::index::LocalIndex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", e.raise(ErrorKind::Config));
            return ExitCode::FAILURE;
        },
    };
    init_tracing(&config.log_level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn open(config: &Config, dry_run: bool) -> Result<(Database, Repository)> {
    if let Some(parent) = config.database.parent() {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
    }
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
    let repo = Repository::new(db.pool().clone(), dry_run);
    Ok((db, repo))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let (db, repo) = open(&config, cli.dry_run).await?;
    let result = match cli.command {
        Command::Scan => scan(&config, repo).await,
        Command::List => {
            let books = repo.list_all().await.or_raise(|| ErrorKind::Query)?;
            books.iter().for_each(print_line);
            Ok(())
        },
        Command::Show { id } => {
            let book = repo.get_by_id(id).await.or_raise(|| ErrorKind::Query)?.ok_or_raise(|| ErrorKind::NotFound(id))?;
            print_details(&book);
            Ok(())
        },
        Command::Related { id } => {
            repo.get_by_id(id).await.or_raise(|| ErrorKind::Query)?.ok_or_raise(|| ErrorKind::NotFound(id))?;
            let books = repo.list_related(id).await.or_raise(|| ErrorKind::Query)?;
            books.iter().for_each(print_line);
            Ok(())
        },
        Command::Favourite { id, unset } => {
            if !repo.set_favourite(id, !unset).await.or_raise(|| ErrorKind::Query)? {
                exn::bail!(ErrorKind::NotFound(id));
            }
            Ok(())
        },
        Command::Delete { id } => {
            if !repo.delete(id).await.or_raise(|| ErrorKind::Query)? {
                exn::bail!(ErrorKind::NotFound(id));
            }
            Ok(())
        },
    };
    db.close().await;
    result
}

async fn scan(config: &Config, repo: Repository) -> Result<()> {
    let roots = config.require_roots().or_raise(|| ErrorKind::Config)?;
    let index = LocalIndex::new(roots.iter().cloned()).or_raise(|| ErrorKind::Storage)?;
    let covers = LocalCoverStore::new(&config.covers).or_raise(|| ErrorKind::Storage)?;
    let ingestor = Ingestor::new(Arc::new(index), repo, Arc::new(covers));

    tokio::select! {
        summary = ingestor.run() => {
            let summary = summary.or_raise(|| ErrorKind::Scan)?;
            println!(
                "{} found, {} new, {} already catalogued, {} skipped",
                summary.discovered, summary.ingested, summary.duplicates, summary.skipped
            );
        },
        _ = tokio::signal::ctrl_c() => {
            // Dropping the scan abandons the batch; nothing was written.
            warn!("scan interrupted");
        },
    }
    info!(books = ingestor.books().borrow().len(), "catalogue updated");
    Ok(())
}

fn print_line(book: &BookRecord) {
    let id = book.id.map(|id| id.to_string()).unwrap_or_default();
    let star = if book.is_favourite == Some(true) { "*" } else { " " };
    match &book.author_name {
        Some(author) => println!("{id:>5} {star} {} ({author})", book.title),
        None => println!("{id:>5} {star} {}", book.title),
    }
}

fn print_details(book: &BookRecord) {
    let path = |p: &Option<std::path::PathBuf>| p.as_ref().map(|p| p.display().to_string());
    let fields = [
        ("Author", book.author_name.clone()),
        ("Translator", book.translator.clone()),
        ("Series", book.series.clone()),
        ("Volume", book.volume_number.clone()),
        ("Publisher", book.publisher.clone()),
        ("Year", book.year.clone()),
        ("Language", book.lang.clone()),
        ("ISBN", book.isbn.clone()),
        ("Keywords", book.keywords.clone()),
        ("File", path(&book.file_path)),
        ("Cover", path(&book.cover_path)),
    ];
    println!("{}", book.title);
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {label:<11}{value}");
        }
    }
    println!("  {:<11}{}", "Hash", book.hash);
    if book.is_favourite == Some(true) {
        println!("  {:<11}yes", "Favourite");
    }
    if let Some(annotation) = &book.annotation {
        println!("\n{annotation}");
    }
}
