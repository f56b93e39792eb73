use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod db;
mod error;
mod export;
mod models;
mod progression;
mod report;
mod search;
mod stats;

use config::Config;
use export::ExportFormat;
use models::{Location, NewReport};

#[derive(Parser)]
#[command(name = "aedes-watch")]
#[command(about = "Community reporting of mosquito breeding sites with points and titles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the title for a point total without touching the database
    Title {
        #[arg(allow_negative_numbers = true)]
        points: i64,
    },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that need a database connection.
#[derive(Subcommand)]
enum StoreCommand {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo profiles and reports
    Seed,
    /// Register a new participant
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Submit a breeding site report and collect points
    Submit {
        #[arg(long)]
        email: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Edit one of your own reports; points are unchanged
    Edit {
        #[arg(long)]
        email: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, conflicts_with = "clear_image")]
        image_url: Option<String>,
        #[arg(long)]
        clear_image: bool,
    },
    /// Delete one of your own reports
    Delete {
        #[arg(long)]
        email: String,
        #[arg(long)]
        id: Uuid,
    },
    /// List reports, newest first
    List {
        #[arg(long)]
        email: Option<String>,
        /// Case-insensitive match on title, description or address
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show title and progress toward the next one
    Progress {
        #[arg(long)]
        email: String,
    },
    /// Show the leaderboard
    Ranking {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show activity statistics for a participant
    Stats {
        #[arg(long)]
        email: String,
    },
    /// Export all reports without author details
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Directory the export file is written into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Import reports from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown summary for a participant
    Summary {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "summary.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Title { points } => {
            print_progress(progression::checked_points(points)?);
            return Ok(());
        }
        Commands::Store(command) => command,
    };

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    info!(max_connections = config.max_connections, "connected to Postgres");

    run(command, &pool).await
}

async fn run(command: StoreCommand, pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let today = now.date_naive();

    match command {
        StoreCommand::InitDb => {
            db::init_db(pool).await?;
            println!("Schema ready.");
        }
        StoreCommand::Seed => {
            db::seed(pool).await?;
            println!("Seed data inserted.");
        }
        StoreCommand::Register { name, email } => {
            let profile = db::register_profile(pool, &name, &email).await?;
            println!(
                "Registered {} ({}) as {}.",
                profile.name,
                profile.email,
                progression::resolve_title(profile.points)
            );
        }
        StoreCommand::Submit {
            email,
            title,
            description,
            latitude,
            longitude,
            address,
            image_url,
        } => {
            let report = NewReport {
                title,
                description,
                location: Location::new(latitude, longitude, address)?,
                image_url,
            };
            let outcome = db::submit_report(pool, &email, &report).await?;

            if outcome.bonus > 0 {
                println!(
                    "Report {} added! +{} point. Bonus: +{} points!",
                    outcome.report_id,
                    progression::POINTS_PER_REPORT,
                    outcome.bonus
                );
            } else {
                println!(
                    "Report {} added! +{} point.",
                    outcome.report_id,
                    progression::POINTS_PER_REPORT
                );
            }

            let before = progression::resolve_title(outcome.previous_points);
            let after = progression::resolve_title(outcome.total_points);
            println!("Total: {} points ({after}).", outcome.total_points);
            if before != after {
                println!("New title unlocked: {after}!");
            }
        }
        StoreCommand::Edit {
            email,
            id,
            title,
            description,
            latitude,
            longitude,
            address,
            image_url,
            clear_image,
        } => {
            let report = NewReport {
                title,
                description,
                location: Location::new(latitude, longitude, address)?,
                image_url,
            };
            db::update_report(pool, &email, id, &report, clear_image).await?;
            println!("Report {id} updated.");
        }
        StoreCommand::Delete { email, id } => {
            let image_url = db::delete_report(pool, &email, id).await?;
            println!("Report {id} deleted.");
            if let Some(url) = image_url {
                println!("The report referenced an image at {url}; remove it from storage if no longer needed.");
            }
        }
        StoreCommand::List {
            email,
            search: term,
            limit,
        } => {
            let reports = db::fetch_reports(pool, email.as_deref()).await?;
            let matching = search::filter_reports(&reports, term.as_deref());

            if matching.is_empty() {
                println!("No reports found.");
                return Ok(());
            }

            println!(
                "{} reports ({} in the last 30 days):",
                matching.len(),
                stats::recent_count(matching.iter().copied(), now, 30)
            );
            for report in matching.iter().take(limit) {
                println!(
                    "- [{}] {} by {} at {} ({:.5}, {:.5}) on {}",
                    report.id,
                    report.title,
                    report.user_name,
                    report.location.address,
                    report.location.latitude,
                    report.location.longitude,
                    report.created_at.date_naive()
                );
            }
        }
        StoreCommand::Progress { email } => {
            let profile = db::fetch_profile(pool, &email).await?;
            println!(
                "{} has {} points (member since {}).",
                profile.name,
                profile.points,
                profile.created_at.date_naive()
            );
            print_progress(profile.points);
        }
        StoreCommand::Ranking { limit } => {
            let entries = db::fetch_ranking(pool, limit.max(1)).await?;
            print!("{}", report::build_ranking_report(&entries));
        }
        StoreCommand::Stats { email } => {
            let reports = db::fetch_reports(pool, Some(email.as_str())).await?;
            let activity = stats::report_stats(&reports, now);

            println!("Total reports: {}", activity.total);
            println!(
                "Today: {} ({})",
                activity.today,
                report::trend_label(activity.trend)
            );
            println!(
                "Averages: {:.1}/day, {:.1}/week, {:.1}/month",
                activity.daily_average, activity.weekly_average, activity.monthly_average
            );

            println!("Last 7 days:");
            for day in stats::daily_counts(&reports, today, 7) {
                println!("  {} {}", day.date.format("%a %d/%m"), day.count);
            }

            println!("Months of {}:", today.year());
            for (month, count) in stats::monthly_counts(&reports, today.year())
                .iter()
                .enumerate()
            {
                println!("  {:02} {}", month + 1, count);
            }
        }
        StoreCommand::Export { format, out_dir } => {
            let reports = db::fetch_reports(pool, None).await?;
            let file = export::export_reports(&reports, format, today)?;
            let path = out_dir.join(&file.filename);
            std::fs::write(&path, &file.content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(content_type = file.content_type, count = reports.len(), "export written");
            println!("Exported {} reports to {}.", reports.len(), path.display());
        }
        StoreCommand::Import { csv } => {
            let inserted = db::import_csv(pool, &csv).await?;
            println!("Inserted {inserted} reports from {}.", csv.display());
        }
        StoreCommand::Summary { email, out } => {
            let profile = db::fetch_profile(pool, &email).await?;
            let reports = db::fetch_reports(pool, Some(email.as_str())).await?;
            let summary = report::build_user_report(&profile, &reports, now);
            std::fs::write(&out, summary)?;
            println!("Summary written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_progress(points: u32) {
    let progress = progression::resolve_progress(points);

    println!("Title: {}", progress.current_title);
    println!("Next title: {}", progress.next_title_label());
    if progress.is_max_level() {
        println!("Maximum level reached!");
    } else {
        println!(
            "Progress: {}% ({} points needed)",
            progress.rounded_percent(),
            progress.points_to_next
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_parsed_outside_the_store_commands() {
        let cli = Cli::try_parse_from(["aedes-watch", "title", "-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Title { points: -5 }));
    }

    #[test]
    fn edit_takes_report_fields_and_image_flags() {
        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "aedes-watch",
            "edit",
            "--email",
            "kiara.patel@aedeswatch.org",
            "--id",
            &id,
            "--title",
            "Clogged gutter",
            "--latitude",
            "-8.05",
            "--longitude",
            "-34.9",
            "--clear-image",
        ])
        .unwrap();

        match cli.command {
            Commands::Store(StoreCommand::Edit {
                latitude,
                clear_image,
                image_url,
                ..
            }) => {
                assert_eq!(latitude, -8.05);
                assert!(clear_image);
                assert!(image_url.is_none());
            }
            _ => panic!("expected edit command"),
        }

        let conflicting = Cli::try_parse_from([
            "aedes-watch",
            "edit",
            "--email",
            "a@b.org",
            "--id",
            &id,
            "--title",
            "t",
            "--latitude",
            "0",
            "--longitude",
            "0",
            "--image-url",
            "https://img.example/x.png",
            "--clear-image",
        ]);
        assert!(conflicting.is_err());
    }

    #[test]
    fn list_accepts_search_term() {
        let cli = Cli::try_parse_from(["aedes-watch", "list", "--search", "Boa Viagem"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::List { search: Some(ref term), .. }) if term == "Boa Viagem"
        ));
    }
}
