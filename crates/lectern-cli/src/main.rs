//! Lectern CLI
//!
//! Command-line host for the review scheduler: import items, rate them,
//! inspect the queue and forecast upcoming work.

mod commands;
mod settings;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lectern_core::ItemKind;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Lectern - incremental reading review scheduler
#[derive(Parser)]
#[command(name = "lectern")]
#[command(author = "Lectern Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Lectern review scheduler")]
#[command(long_about = "Lectern schedules reading and learning items with the FSRS-5 memory model.\n\nRatings 1-5 map to AGAIN, HARD, GOOD, GOOD and EASY.")]
struct Cli {
    /// Custom data directory (database and config.json)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Scheduling config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a new item
    Add {
        /// Display title
        title: String,
        /// Item kind (document, extract, learning_item)
        #[arg(long, default_value = "learning_item")]
        kind: ItemKind,
        /// Queue priority (0-100)
        #[arg(long, default_value = "50")]
        priority: u8,
        /// Category ID
        #[arg(long)]
        category: Option<i64>,
        /// Mark as favorite
        #[arg(long)]
        favorite: bool,
    },

    /// Rate an item (1 = again, 2 = hard, 3/4 = good, 5 = easy)
    Review {
        /// Item ID
        id: i64,
        /// Raw rating
        #[arg(allow_negative_numbers = true)]
        rating: i64,
    },

    /// Show what each grade would schedule, without saving
    Preview {
        /// Item ID
        id: i64,
    },

    /// Show the review queue in presentation order
    Queue {
        /// Only items in this category
        #[arg(long)]
        category: Option<i64>,
        /// Only items of this kind
        #[arg(long)]
        kind: Option<ItemKind>,
        /// Include items that are not yet due
        #[arg(long)]
        all: bool,
        /// Only favorites
        #[arg(long)]
        favorites: bool,
        /// Maximum number of items shown
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Randomness factor 0-1 (defaults to the configured value)
        #[arg(long)]
        randomness: Option<f64>,
        /// Seed for reproducible shuffling
        #[arg(long)]
        seed: Option<u64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show queue statistics
    Stats,

    /// Show the number of items due per day
    Forecast {
        /// Days to look ahead
        #[arg(long, default_value = "14")]
        days: u32,
    },

    /// List items that keep lapsing
    Leeches {
        /// Minimum number of AGAIN ratings
        #[arg(long, default_value_t = lectern_core::queue::DEFAULT_LEECH_THRESHOLD)]
        threshold: u32,
    },

    /// Show the rating log of an item
    History {
        /// Item ID
        id: i64,
    },

    /// Show review performance metrics of an item
    Metrics {
        /// Item ID
        id: i64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Override an item's priority
    Priority {
        /// Item ID
        id: i64,
        /// New priority (0-100)
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Move an item's due date
    Reschedule {
        /// Item ID
        id: i64,
        /// Days from now
        #[arg(long)]
        in_days: i64,
    },

    /// Print the effective scheduling config, or validate a file
    Config {
        /// Config file to validate
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let settings = Settings::resolve(cli.data_dir, cli.config)?;

    match cli.command {
        Commands::Add {
            title,
            kind,
            priority,
            category,
            favorite,
        } => commands::run_add(&settings, title, kind, priority, category, favorite),
        Commands::Review { id, rating } => commands::run_review(&settings, id, rating),
        Commands::Preview { id } => commands::run_preview(&settings, id),
        Commands::Queue {
            category,
            kind,
            all,
            favorites,
            limit,
            randomness,
            seed,
            json,
        } => commands::run_queue(
            &settings,
            commands::QueueOptions {
                category,
                kind,
                due_only: !all,
                favorites,
                limit,
                randomness,
                seed,
                json,
            },
        ),
        Commands::Stats => commands::run_stats(&settings),
        Commands::Forecast { days } => commands::run_forecast(&settings, days),
        Commands::Leeches { threshold } => commands::run_leeches(&settings, threshold),
        Commands::History { id } => commands::run_history(&settings, id),
        Commands::Metrics { id, json } => commands::run_metrics(&settings, id, json),
        Commands::Priority { id, value } => commands::run_priority(&settings, id, value),
        Commands::Reschedule { id, in_days } => commands::run_reschedule(&settings, id, in_days),
        Commands::Config { check } => commands::run_config(&settings, check),
    }
}
