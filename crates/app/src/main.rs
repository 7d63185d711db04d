use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tally::{AppConfig, FileOutcome, Session, UploadedFile};
use tally_core::{grand_total, Category, CategoryBucket, StatementId, TransactionId};
use tally_document::{default_backend, DocumentPipeline};
use tally_storage::SqliteStore;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tally", about = "Upload bank statements and categorize spending.")]
struct Cli {
    /// Config file (default: platform config dir / config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import statement files (.csv, .tsv, .txt, .pdf); one statement per file.
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List statements, newest upload first.
    Statements,
    /// Show a statement's transactions.
    Show {
        /// Position in `tally statements` (default: the selected statement)
        statement: Option<usize>,
    },
    /// Set a transaction's category.
    Categorize {
        transaction: Uuid,
        #[arg(value_parser = parse_category)]
        category: Category,
        /// Also remember the merchant as a rule
        #[arg(long)]
        learn: bool,
    },
    /// Clear a transaction's category.
    Uncategorize { transaction: Uuid },
    /// Per-category and per-day totals for a statement.
    Totals { statement: Option<usize> },
    /// Write a statement as CSV.
    Export {
        statement: Option<usize>,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Remove a statement and its transactions.
    Remove { statement: usize },
    /// Make a statement the selected one.
    Select { statement: usize },
    /// Manage learned rules.
    Rules {
        #[command(subcommand)]
        command: Option<RulesCommands>,
    },
}

#[derive(Subcommand)]
enum RulesCommands {
    /// List rules in match order.
    List,
    /// Delete the rule at a position in `tally rules list`.
    Delete { index: usize },
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    let db_path = config.database_path()?;
    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let mut session = Session::load(store, DocumentPipeline::with_backend(default_backend())).await?;
    if let Some(seed) = config.load_rules_seed()? {
        session.seed_rules(seed).await?;
    }

    match cli.command {
        Commands::Import { files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let file = UploadedFile::from_path(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                uploads.push(file);
            }
            let report = session.ingest(uploads).await?;
            for file in &report.files {
                match &file.outcome {
                    FileOutcome::Imported { statement_id, count } => {
                        let label = session.statement(*statement_id).map(|s| s.label.as_str())?;
                        println!("{}: {count} transactions → {label}", file.name);
                    }
                    FileOutcome::Skipped(e) => println!("{}: skipped ({e})", file.name),
                }
            }
        }
        Commands::Statements => {
            let selected = session.selected_statement();
            for (i, statement) in session.statements().iter().enumerate() {
                let marker = if Some(statement.id) == selected { "*" } else { " " };
                let count = session.statement_transactions(statement.id).len();
                println!("{marker} {:>3}  {}  ({count} transactions)", i + 1, statement.label);
            }
        }
        Commands::Show { statement } => {
            let id = resolve_statement(&session, statement)?;
            for tx in session.statement_transactions(id) {
                let category = tx.category.map(|c| c.to_string()).unwrap_or_default();
                println!("{}  {:<12} {:>10}  {:<12} {}", tx.id, tx.date, tx.amount.to_string(), category, tx.merchant);
            }
        }
        Commands::Categorize { transaction, category, learn } => {
            session
                .assign_category(TransactionId(transaction), Some(category), learn)
                .await?;
        }
        Commands::Uncategorize { transaction } => {
            session.assign_category(TransactionId(transaction), None, false).await?;
        }
        Commands::Totals { statement } => {
            let id = resolve_statement(&session, statement)?;
            let totals = session.totals_by_category(id);
            for (bucket, amount) in &totals {
                println!("{:<14} {:>12}", bucket.to_string(), amount.to_string());
            }
            println!("{:<14} {:>12}", "total", grand_total(&totals).to_string());
            if !totals.contains_key(&CategoryBucket::Uncategorized) {
                println!("(all transactions categorized)");
            }

            println!();
            print!("{:<12}", "date");
            for category in Category::ALL {
                print!(" {:>11}", category.as_str());
            }
            println!();
            for row in session.totals_by_date_and_category(id) {
                print!("{:<12}", row.date);
                for category in Category::ALL {
                    print!(" {:>11}", row.get(category).to_string());
                }
                println!();
            }
        }
        Commands::Export { statement, output } => {
            let id = resolve_statement(&session, statement)?;
            let csv = session.export_categorized(id)?;
            match output {
                Some(path) => std::fs::write(&path, csv)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{csv}"),
            }
        }
        Commands::Remove { statement } => {
            let id = resolve_statement(&session, Some(statement))?;
            session.remove_statement(id).await?;
        }
        Commands::Select { statement } => {
            let id = resolve_statement(&session, Some(statement))?;
            session.select_statement(id).await?;
        }
        Commands::Rules { command } => match command.unwrap_or(RulesCommands::List) {
            RulesCommands::List => {
                for (i, rule) in session.rules().iter().enumerate() {
                    println!("{:>3}  {:<40} {}", i + 1, rule.merchant, rule.category);
                }
            }
            RulesCommands::Delete { index } => {
                let removed = match index.checked_sub(1) {
                    Some(i) => session.delete_rule(i).await?,
                    None => None,
                };
                if removed.is_none() {
                    bail!("No rule at position {index}");
                }
            }
        },
    }

    Ok(())
}

/// 1-based position in the statement list, or the selected statement.
fn resolve_statement<S: tally_storage::StateStore>(
    session: &Session<S>,
    position: Option<usize>,
) -> Result<StatementId> {
    match position {
        Some(n) => match n.checked_sub(1).and_then(|i| session.statements().get(i)) {
            Some(statement) => Ok(statement.id),
            None => bail!("No statement at position {n}"),
        },
        None => session
            .selected_statement()
            .context("No statement selected; import a file first"),
    }
}
