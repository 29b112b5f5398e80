//! # Demo Ledger Seeder
//!
//! Runs one business day end to end against a database for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database for today
//! cargo run -p tyre-ledger --bin seed
//!
//! # Specify database path and day
//! cargo run -p tyre-ledger --bin seed -- --db ./data/tyres.db --date 2026-03-14
//! ```
//!
//! ## What It Does
//! 1. Receives stock for a handful of tyre sizes
//! 2. Records sales against some of them
//! 3. Closes the day
//! 4. Rolls the closing balance over to the next day

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tyre_core::{Actor, AddStockRequest, RecordSaleRequest, Role};
use tyre_db::Database;
use tyre_ledger::{LedgerConfig, SaleProcessor, StockLedger, TracingNotifier};

/// (tyre size, quantity, price per unit in cents, selling price in cents)
const RECEIPTS: &[(&str, i64, i64, i64)] = &[
    ("185/65R15", 50, 1_000, 1_300),
    ("195/55R16", 24, 1_450, 1_800),
    ("205/55R16", 32, 1_600, 2_050),
    ("225/45R17", 12, 2_300, 2_900),
    ("LT265/70R17", 8, 3_800, 4_600),
];

/// (tyre size, quantity, price per unit in cents, customer)
const SALES: &[(&str, i64, i64, &str)] = &[
    ("185/65R15", 10, 1_200, "Ayesha Khan"),
    ("185/65R15", 4, 1_250, "Bilal Ahmed"),
    ("205/55R16", 4, 2_000, "Sara Malik"),
    ("LT265/70R17", 2, 4_500, "Usman Transport"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut date = Utc::now().date_naive();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--date" => {
                if i + 1 < args.len() {
                    date = NaiveDate::parse_from_str(&args[i + 1], "%Y-%m-%d")
                        .with_context(|| format!("invalid --date '{}'", args[i + 1]))?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tyre Ledger Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: from config)");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("      --date <YYYY-MM-DD> Business day to seed (default: today, UTC)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = LedgerConfig::load(config_path).context("loading configuration")?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("Tyre Ledger Seeder");
    println!("==================");
    println!("Database: {}", config.database.path.display());
    println!("Day:      {}", date);
    println!();

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let ledger = StockLedger::from_config(db, &config, Arc::new(TracingNotifier));
    let sales = SaleProcessor::new(ledger.clone());
    let owner = Actor::new("seed-owner", Role::Owner);

    println!();
    println!("Receiving stock...");
    for (tyre_size, quantity, price, ssp) in RECEIPTS {
        let req = AddStockRequest {
            date,
            tyre_size: tyre_size.to_string(),
            quantity: *quantity,
            ssp_cents: *ssp,
            total_amount_cents: quantity * price,
            price_per_unit_cents: *price,
            location: "Main Warehouse".to_string(),
        };

        match ledger.add_stock(&owner, req).await {
            Ok(record) => println!("  {:<12} {:>4} on hand ({})", record.tyre_size, record.quantity, record.status),
            Err(e) => eprintln!("  Failed to receive {}: {}", tyre_size, e),
        }
    }

    println!();
    println!("Recording sales...");
    for (tyre_size, quantity, price, customer) in SALES {
        let req = RecordSaleRequest {
            date: Some(date),
            tyre_size: tyre_size.to_string(),
            quantity: *quantity,
            customer_name: customer.to_string(),
            phone_number: None,
            comment: None,
            price_per_unit_cents: *price,
        };

        match sales.record_sale(&owner, req).await {
            Ok(sale) => println!("  {:<12} {:>4} × {} = {}", sale.tyre_size, sale.quantity, sale.price_per_unit_cents, sale.total_amount()),
            Err(e) => eprintln!("  Sale of {} rejected: {}", tyre_size, e),
        }
    }

    let summary = sales.sales_summary(date).await?;
    println!();
    println!(
        "✓ {} sale(s), {} unit(s), revenue {} cents",
        summary.sale_count, summary.quantity, summary.total_amount_cents
    );

    println!();
    println!("Closing {}...", date);
    match ledger.close_day(date).await {
        Ok(closed) => {
            for record in &closed {
                println!("  {:<12} closed at {:>4}", record.tyre_size, record.quantity);
            }
        }
        Err(e) => eprintln!("  Nothing closed: {}", e),
    }

    let next = date + Duration::days(1);
    println!();
    println!("Rolling over to {}...", next);
    match ledger.rollover_open_stock(next).await {
        Ok(open) => {
            for record in &open {
                println!("  {:<12} opened with {:>4}", record.tyre_size, record.quantity);
            }
        }
        Err(e) => eprintln!("  Rollover produced no stock: {}", e),
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tyre=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
