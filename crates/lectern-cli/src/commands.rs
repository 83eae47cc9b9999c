//! Subcommand implementations

use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use colored::Colorize;
use lectern_core::fsrs::StateUpdate;
use lectern_core::{
    ConfigError, Item, ItemFilter, ItemKind, ItemStore, NewItem, RawSchedulingConfig, ReviewEngine,
    SeededRandom, SqliteItemStore,
};

use crate::settings::Settings;

type Engine = ReviewEngine<SqliteItemStore>;

fn open_engine(settings: &Settings) -> anyhow::Result<Engine> {
    let config = settings.load_config()?;
    let store = SqliteItemStore::new(Some(settings.db_path()))?;
    Ok(ReviewEngine::new(store, config))
}

fn format_due(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match due {
        None => "new".cyan().to_string(),
        Some(due) if due <= now => {
            let days = (now - due).num_days();
            if days > 0 {
                format!("{} ({}d overdue)", due.format("%Y-%m-%d"), days)
                    .red()
                    .to_string()
            } else {
                format!("{} (due)", due.format("%Y-%m-%d")).yellow().to_string()
            }
        }
        Some(due) => due.format("%Y-%m-%d").to_string(),
    }
}

fn print_item_line(rank: usize, item: &Item, now: DateTime<Utc>) {
    let star = if item.favorite { "*" } else { " " };
    println!(
        "{:>3}. {}{:>5}  {:>3}  {:<13} {}  {}",
        rank,
        star.yellow(),
        item.id,
        item.priority,
        item.kind.as_str(),
        format_due(item.next_due_at, now),
        item.title.white().bold()
    );
}

/// Print a distribution bar
fn print_distribution_bar(label: &str, count: usize, total: usize, color: &str) {
    let percentage = if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let bar_width: usize = 30;
    let filled = ((percentage / 100.0) * bar_width as f64) as usize;
    let empty = bar_width.saturating_sub(filled);

    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));
    let colored_bar = match color {
        "green" => bar.green(),
        "yellow" => bar.yellow(),
        "red" => bar.red(),
        "cyan" => bar.cyan(),
        _ => bar.white(),
    };

    println!(
        "  {:15} [{:30}] {:>4} ({:>5.1}%)",
        label, colored_bar, count, percentage
    );
}

// ============================================================================
// ITEMS AND RATINGS
// ============================================================================

/// Run add command
pub fn run_add(
    settings: &Settings,
    title: String,
    kind: ItemKind,
    priority: u8,
    category_id: Option<i64>,
    favorite: bool,
) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let item = engine.add_item(NewItem {
        title,
        kind,
        priority,
        category_id,
        favorite,
    })?;

    println!(
        "{} item {} ({}, priority {})",
        "Added".green().bold(),
        item.id,
        item.kind,
        item.priority
    );
    Ok(())
}

/// Run review command
pub fn run_review(settings: &Settings, id: i64, rating: i64) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let outcome = engine.review(id, rating)?;

    println!("{}", format!("=== Reviewed: {} ===", outcome.item.title).cyan().bold());
    println!("{}: {}", "Grade".white().bold(), outcome.grade.as_str().to_uppercase());
    println!(
        "{}: {} day(s), due {}",
        "Next Review".white().bold(),
        outcome.interval_days,
        outcome.next_due_at.format("%Y-%m-%d %H:%M")
    );
    println!("{}: {:.2} days", "Stability".white().bold(), outcome.stability);
    println!("{}: {:.2}", "Difficulty".white().bold(), outcome.difficulty);
    println!(
        "{}: {:.1}%",
        "Recall at Review".white().bold(),
        outcome.retrievability * 100.0
    );
    println!("{}: {}", "Reviews".white().bold(), outcome.review_count);
    Ok(())
}

fn print_preview_row(label: &str, update: &StateUpdate) {
    println!(
        "  {:6} {:>5}d  {}  S={:<8.2} D={:.2}",
        label,
        update.interval_days,
        update.next_due_at.format("%Y-%m-%d"),
        update.stability,
        update.difficulty
    );
}

/// Run preview command
pub fn run_preview(settings: &Settings, id: i64) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let now = Utc::now();
    let preview = engine.preview(id, now)?;

    println!("{}", format!("=== Preview for item {} ===", id).cyan().bold());
    print_preview_row(&"Again".red().to_string(), &preview.again);
    print_preview_row(&"Hard".yellow().to_string(), &preview.hard);
    print_preview_row(&"Good".green().to_string(), &preview.good);
    print_preview_row(&"Easy".cyan().to_string(), &preview.easy);
    Ok(())
}

/// Run history command
pub fn run_history(settings: &Settings, id: i64) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let events = engine.rating_history(id)?;

    println!("{}", format!("=== Rating history for item {} ===", id).cyan().bold());
    if events.is_empty() {
        println!("{}", "No ratings yet.".dimmed());
        return Ok(());
    }
    for event in events {
        println!(
            "  {}  {} ({})  R={:>5.1}%  -> {}d  S={:.2} D={:.2}",
            event.timestamp.format("%Y-%m-%d %H:%M"),
            event.grade.as_str().to_uppercase(),
            event.raw_rating,
            event.retrievability * 100.0,
            event.resulting_interval_days,
            event.stability_after,
            event.difficulty_after
        );
    }
    Ok(())
}

/// Run metrics command
pub fn run_metrics(settings: &Settings, id: i64, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let metrics = engine.item_metrics(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("{}", format!("=== Metrics for item {} ===", id).cyan().bold());
    println!("  Reviews:          {}", metrics.total_reviews);
    println!("  Success rate:     {:.1}%", metrics.success_rate * 100.0);
    println!("  Retention rate:   {:.1}%", metrics.retention_rate * 100.0);
    println!("  Average gap:      {:.1} days", metrics.average_gap_days);
    let failures = metrics.recent_failures.to_string();
    println!(
        "  Recent failures:  {}",
        if metrics.recent_failures > 0 {
            failures.red()
        } else {
            failures.normal()
        }
    );
    println!("  Trend:            {}", metrics.trend.as_str());
    Ok(())
}

// ============================================================================
// QUEUE
// ============================================================================

/// Options for the queue command
pub struct QueueOptions {
    pub category: Option<i64>,
    pub kind: Option<ItemKind>,
    pub due_only: bool,
    pub favorites: bool,
    pub limit: usize,
    pub randomness: Option<f64>,
    pub seed: Option<u64>,
    pub json: bool,
}

impl QueueOptions {
    fn filter(&self, now: DateTime<Utc>) -> ItemFilter {
        let mut filter = ItemFilter::all();
        if let Some(category) = self.category {
            filter = filter.category(category);
        }
        if let Some(kind) = self.kind {
            filter = filter.kind(kind);
        }
        if self.due_only {
            filter = filter.due_only(now);
        }
        if self.favorites {
            filter = filter.favorites();
        }
        filter
    }
}

/// Run queue command
pub fn run_queue(settings: &Settings, options: QueueOptions) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let now = Utc::now();

    let mut random = match options.seed {
        Some(seed) => SeededRandom::new(seed),
        None => SeededRandom::from_entropy(),
    };
    let randomness = options
        .randomness
        .unwrap_or_else(|| engine.config().randomness_factor());

    let mut queue = engine.next_items_with(&options.filter(now), randomness, now, &mut random)?;
    queue.truncate(options.limit);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&queue)?);
        return Ok(());
    }

    println!("{}", "=== Review Queue ===".cyan().bold());
    if queue.is_empty() {
        println!("{}", "Nothing to review.".dimmed());
        return Ok(());
    }
    println!(
        "{}",
        format!("{:>3}   {:>5}  {:>3}  {:<13} {}", "#", "ID", "PRI", "KIND", "DUE").dimmed()
    );
    for (rank, item) in queue.iter().enumerate() {
        print_item_line(rank + 1, item, now);
    }
    Ok(())
}

// ============================================================================
// ANALYTICS
// ============================================================================

/// Run stats command
pub fn run_stats(settings: &Settings) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let stats = engine.queue_stats(Utc::now())?;

    println!("{}", "=== Lectern Queue Statistics ===".cyan().bold());
    println!();
    println!("{}: {}", "Total Items".white().bold(), stats.total);
    println!("{}: {}", "New".white().bold(), stats.new_items);
    println!("{}: {}", "Due Now".white().bold(), stats.due_now);
    println!("{}: {}", "Due Today".white().bold(), stats.due_today);
    println!("{}: {}", "Due This Week".white().bold(), stats.due_this_week);
    println!("{}: {}", "Overdue".white().bold(), stats.overdue);
    println!("{}: {:.1}", "Average Priority".white().bold(), stats.average_priority);

    if stats.total > 0 {
        let scheduled = stats.total - stats.new_items;
        let later = scheduled.saturating_sub(stats.due_this_week);

        println!();
        println!("{}", "=== Distribution ===".yellow().bold());
        print_distribution_bar("New", stats.new_items, stats.total, "cyan");
        print_distribution_bar("Overdue", stats.overdue, stats.total, "red");
        print_distribution_bar("This week", stats.due_this_week, stats.total, "yellow");
        print_distribution_bar("Later", later, stats.total, "green");
    }
    Ok(())
}

/// Run forecast command
pub fn run_forecast(settings: &Settings, days: u32) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let forecast = engine.due_forecast(Utc::now(), days)?;

    println!("{}", format!("=== Due Forecast ({} days) ===", days).cyan().bold());
    println!();

    let total = forecast.overdue.len() + forecast.scheduled_count();
    print_distribution_bar("Overdue", forecast.overdue.len(), total, "red");
    for day in &forecast.days {
        let label = day.date.format("%a %Y-%m-%d").to_string();
        print_distribution_bar(&label, day.item_ids.len(), total, "green");
    }
    println!();
    println!("{}: {}", "New (unscheduled)".white().bold(), forecast.new.len());
    Ok(())
}

/// Run leeches command
pub fn run_leeches(settings: &Settings, threshold: u32) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let leeches = engine.leeches(threshold)?;

    println!(
        "{}",
        format!("=== Leeches (>= {} lapses) ===", threshold).magenta().bold()
    );
    if leeches.is_empty() {
        println!("{}", "No leeches found.".dimmed());
        return Ok(());
    }

    let now = Utc::now();
    for (rank, id) in leeches.iter().enumerate() {
        if let Some(item) = engine.store().load_item(*id)? {
            print_item_line(rank + 1, &item, now);
        }
    }
    println!();
    println!(
        "{}",
        "Consider rewriting these items or lowering their priority.".dimmed()
    );
    Ok(())
}

// ============================================================================
// OVERRIDES
// ============================================================================

/// Run priority command
pub fn run_priority(settings: &Settings, id: i64, value: i64) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let item = engine.set_priority(id, value)?;
    println!(
        "{} priority of item {} to {}",
        "Set".green().bold(),
        item.id,
        item.priority
    );
    Ok(())
}

fn due_in_days(now: DateTime<Utc>, in_days: i64) -> anyhow::Result<DateTime<Utc>> {
    match TimeDelta::try_days(in_days).and_then(|delta| now.checked_add_signed(delta)) {
        Some(due) => Ok(due),
        None => anyhow::bail!("--in-days {} is out of range", in_days),
    }
}

/// Run reschedule command
pub fn run_reschedule(settings: &Settings, id: i64, in_days: i64) -> anyhow::Result<()> {
    let engine = open_engine(settings)?;
    let due = due_in_days(Utc::now(), in_days)?;
    let item = engine.reschedule(id, due)?;
    println!(
        "{} item {} to {}",
        "Rescheduled".green().bold(),
        item.id,
        format_due(item.next_due_at, Utc::now())
    );
    Ok(())
}

// ============================================================================
// CONFIG
// ============================================================================

/// Run config command
pub fn run_config(settings: &Settings, check: Option<PathBuf>) -> anyhow::Result<()> {
    let Some(path) = check else {
        let config = settings.load_config()?;
        println!("{}", serde_json::to_string_pretty(&config.to_raw())?);
        return Ok(());
    };

    let result = RawSchedulingConfig::from_path(&path).and_then(|raw| raw.validate());
    match result {
        Ok(_) => {
            println!("{} {}", "Valid:".green().bold(), path.display());
            Ok(())
        }
        Err(ConfigError { violations }) => {
            println!("{} {}", "Invalid:".red().bold(), path.display());
            for violation in &violations {
                println!("  {} {}", "-".red(), violation);
            }
            anyhow::bail!("{} violation(s) in {}", violations.len(), path.display())
        }
    }
}
