//! BandUP CLI
//!
//! Command-line interface for BandUP:
//! - Check an essay and print its band scores
//! - Count words against the minimum
//! - Run the writing timer
//! - Browse the seeded lists
//! - Show pricing, server status and the default config

use bandup::config::Config;
use bandup::listing::{
    parse_facet, AccountType, Catalog, EssayFacet, EssayKind, EssayStatus, ListQuery,
    PostCategory, SortKey, TransactionStatus, UserFacet, UserStatus,
};
use bandup::pricing::{format_usd, plans, quote, BillingCycle, PlanTier};
use bandup::store::Store;
use bandup::submission::{
    word_count, words_needed, Draft, FeedbackReport, Submission, SubmissionFlow,
};
use bandup::timer::{format_clock, TimerDriver, TimerModel};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Parser)]
#[command(name = "bandup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "IELTS Writing practice with instant band-score feedback")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score an essay
    Check {
        /// Essay text file
        file: PathBuf,
        /// Task prompt
        #[arg(short, long, default_value = "")]
        topic: String,
        /// Seconds spent writing
        #[arg(long)]
        time_spent: Option<f64>,
    },

    /// Count words in an essay
    Words {
        /// Essay text file
        file: PathBuf,
    },

    /// Run the writing timer
    Timer {
        /// Countdown length in minutes
        #[arg(short, long, default_value = "60")]
        minutes: u32,
        /// Count up instead of down
        #[arg(long)]
        stopwatch: bool,
    },

    /// Browse a list
    List {
        /// Which list
        #[arg(value_enum)]
        list: ListKind,
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
        /// Status filter (essays, users, transactions)
        #[arg(long)]
        status: Option<String>,
        /// Category (posts), type (essays) or plan (users)
        #[arg(long)]
        kind: Option<String>,
        /// Sort order (recent, popular)
        #[arg(long)]
        sort: Option<String>,
    },

    /// Show the plan table
    Pricing {
        /// Billing cycle (monthly, yearly)
        #[arg(long, default_value = "monthly")]
        cycle: String,
        /// Discount percentage to apply to each plan
        #[arg(long)]
        discount: Option<u8>,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ListKind {
    Posts,
    Essays,
    Users,
    Transactions,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    match cli.command {
        Commands::Check {
            file,
            topic,
            time_spent,
        } => {
            config.logging.init();
            let content = std::fs::read_to_string(&file)?;
            let mut draft = Draft::new(topic, content);
            if let Some(secs) = time_spent {
                draft = draft.time_spent(secs);
            }

            let scorer = config.scoring.build_scorer()?;
            let mut store = Store::default();
            let mut flow = SubmissionFlow::new();

            match flow.submit(&draft, &mut store, scorer.as_ref()).await? {
                Submission::Scored(essay) => {
                    if cli.format == "json" {
                        println!("{}", serde_json::to_string_pretty(&essay)?);
                    } else {
                        print!("{}", FeedbackReport::from(essay.as_ref()).render_text());
                    }
                }
                Submission::Rejected(reason) => {
                    eprintln!("{}", reason);
                    std::process::exit(1);
                }
                Submission::Blocked => {
                    eprintln!("No free checks left");
                    std::process::exit(1);
                }
            }
        }

        Commands::Words { file } => {
            let content = std::fs::read_to_string(&file)?;
            let count = word_count(&content);
            match words_needed(&content) {
                0 => println!("{} words", count),
                missing => println!("{} words ({} more needed)", count, missing),
            }
        }

        Commands::Timer { minutes, stopwatch } => {
            run_timer(minutes, stopwatch).await;
        }

        Commands::List {
            list,
            search,
            status,
            kind,
            sort,
        } => {
            let catalog = Catalog::seeded();
            let search = search.unwrap_or_default();
            let sort = sort.as_deref().map(str::parse::<SortKey>).transpose()?;

            match list {
                ListKind::Posts => {
                    let mut query = ListQuery::new()
                        .search(search)
                        .facet_opt(parse_facet::<PostCategory>(kind.as_deref())?);
                    if let Some(key) = sort {
                        query = query.sort(key);
                    }
                    let rows: Vec<Vec<String>> = query
                        .apply(&catalog.posts)
                        .into_iter()
                        .map(|p| {
                            vec![
                                p.id,
                                p.title,
                                p.category.to_string(),
                                p.likes.to_string(),
                                pinned_mark(p.is_pinned),
                            ]
                        })
                        .collect();
                    output(&cli.format, &["ID", "Title", "Category", "Likes", ""], rows)?;
                }
                ListKind::Essays => {
                    let status = parse_facet::<EssayStatus>(status.as_deref())?;
                    let essay_kind = parse_facet::<EssayKind>(kind.as_deref())?;
                    let mut query = ListQuery::new()
                        .search(search)
                        .facet_opt(status.map(EssayFacet::Status))
                        .facet_opt(essay_kind.map(EssayFacet::Kind));
                    if let Some(key) = sort {
                        query = query.sort(key);
                    }
                    let rows = query
                        .apply(&catalog.essays)
                        .into_iter()
                        .map(|e| {
                            vec![
                                e.id,
                                e.title,
                                e.status.to_string(),
                                e.kind.to_string(),
                                e.score.map(|s| format!("{:.1}", s)).unwrap_or_default(),
                            ]
                        })
                        .collect();
                    output(&cli.format, &["ID", "Title", "Status", "Type", "Score"], rows)?;
                }
                ListKind::Users => {
                    let status = parse_facet::<UserStatus>(status.as_deref())?;
                    let plan = parse_facet::<AccountType>(kind.as_deref())?;
                    let mut query = ListQuery::new()
                        .search(search)
                        .facet_opt(status.map(UserFacet::Status))
                        .facet_opt(plan.map(UserFacet::Account));
                    if let Some(key) = sort {
                        query = query.sort(key);
                    }
                    let rows = query
                        .apply(&catalog.users)
                        .into_iter()
                        .map(|u| {
                            vec![
                                u.name,
                                u.email,
                                u.status.to_string(),
                                u.account.to_string(),
                                u.essays.to_string(),
                            ]
                        })
                        .collect();
                    output(&cli.format, &["Name", "Email", "Status", "Plan", "Essays"], rows)?;
                }
                ListKind::Transactions => {
                    let status = parse_facet::<TransactionStatus>(status.as_deref())?;
                    let mut query = ListQuery::new().search(search).facet_opt(status);
                    if let Some(key) = sort {
                        query = query.sort(key);
                    }
                    let rows = query
                        .apply(&catalog.transactions)
                        .into_iter()
                        .map(|t| {
                            vec![
                                t.id,
                                t.user_name,
                                format_usd(t.amount_cents),
                                t.status.to_string(),
                                t.created_at.format("%Y-%m-%d").to_string(),
                            ]
                        })
                        .collect();
                    output(&cli.format, &["ID", "User", "Amount", "Status", "Date"], rows)?;
                }
            }
        }

        Commands::Pricing { cycle, discount } => {
            let cycle: BillingCycle = cycle.parse()?;
            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&plans(cycle))?);
                return Ok(());
            }

            let suffix = match cycle {
                BillingCycle::Monthly => "/mo",
                BillingCycle::Yearly => "/yr",
            };
            for tier in PlanTier::all() {
                let offer = tier.offer(cycle);
                let q = quote(*tier, cycle, discount.unwrap_or(0));
                print!("{:<12} {}{}", offer.name, format_usd(q.total_cents), suffix);
                if q.discount_cents > 0 {
                    print!("  (was {})", format_usd(q.list_cents));
                }
                if offer.save_cents > 0 {
                    print!("  save {}", format_usd(offer.save_cents));
                }
                println!();
                for feature in offer.features {
                    println!("  - {}", feature);
                }
            }
        }

        Commands::Status => {
            let response = reqwest::Client::new()
                .get(format!("{}/health", cli.api_url))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;
                    println!("BandUP v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!("Scorer: {}", health["scorer"].as_str().unwrap_or("unknown"));
                    println!("Sessions: {}", health["sessions"].as_u64().unwrap_or(0));
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_uptime(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to API at {}: {}", cli.api_url, e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = bandup::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Tick the timer on screen until it completes or Ctrl+C
async fn run_timer(minutes: u32, stopwatch: bool) {
    let mut model = if stopwatch {
        TimerModel::stopwatch()
    } else {
        TimerModel::countdown(minutes)
    };
    model.start();

    let done = Arc::new(Notify::new());
    let notify = done.clone();
    let driver = TimerDriver::spawn(model, move || notify.notify_one());

    let mut refresh = tokio::time::interval(std::time::Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = done.notified() => break,
            _ = tokio::signal::ctrl_c() => break,
            _ = refresh.tick() => {
                let snapshot = driver.snapshot().await;
                let warning = if snapshot.is_warning() { "  (less than 5 minutes left)" } else { "" };
                eprint!("\r{}{}   ", format_clock(snapshot.display_ms()), warning);
            }
        }
    }

    let last = driver.stop().await;
    eprintln!("\r{}", format_clock(last.display_ms()));
    if last.remaining_ms() == 0 && !stopwatch {
        println!("Time is up");
    }
}

fn pinned_mark(pinned: bool) -> String {
    let mark = if pinned { "pinned" } else { "" };
    mark.to_string()
}

fn output(
    format: &str,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> Result<(), serde_json::Error> {
    if format == "json" {
        let records: Vec<BTreeMap<&str, &str>> = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row)
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, v)| (*h, v.as_str()))
                    .collect()
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    print_table(headers, &rows);
    Ok(())
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("No matching entries");
        return;
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r.get(i).map_or(0, |v| v.chars().count()))
                .max()
                .unwrap_or(0)
                .max(h.len())
        })
        .collect();

    for (h, w) in headers.iter().zip(&widths) {
        print!("{:<width$}  ", h, width = w);
    }
    println!();
    println!("{}", "-".repeat(widths.iter().map(|w| w + 2).sum()));

    for row in rows {
        for (v, w) in row.iter().zip(&widths) {
            print!("{:<width$}  ", v, width = w);
        }
        println!();
    }
}

fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
