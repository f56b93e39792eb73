use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Location, NewReport, Profile, RankEntry, Report, SubmissionOutcome};
use crate::progression;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let profiles = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery Lee",
            "avery.lee@aedeswatch.org",
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules Moreno",
            "jules.moreno@aedeswatch.org",
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara Patel",
            "kiara.patel@aedeswatch.org",
        ),
    ];

    for (id, name, email) in profiles {
        sqlx::query(
            r#"
            INSERT INTO aedes_watch.profiles (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;
    }

    let reports = vec![
        (
            "seed-001",
            "avery.lee@aedeswatch.org",
            "Tyres collecting rainwater",
            "Stack of old tyres behind the mechanic shop",
            -8.0476,
            -34.8770,
            "Rua da Aurora, 120",
            Utc.with_ymd_and_hms(2026, 2, 2, 14, 0, 0)
                .single()
                .context("invalid timestamp")?,
        ),
        (
            "seed-002",
            "jules.moreno@aedeswatch.org",
            "Uncovered water tank",
            "Rooftop tank without a lid",
            -8.0631,
            -34.8711,
            "Avenida Boa Viagem, 45",
            Utc.with_ymd_and_hms(2026, 1, 30, 9, 15, 0)
                .single()
                .context("invalid timestamp")?,
        ),
        (
            "seed-003",
            "kiara.patel@aedeswatch.org",
            "Clogged gutter",
            "Gutter holding stagnant water for a week",
            -8.0522,
            -34.9286,
            "Rua do Futuro, 8",
            Utc.with_ymd_and_hms(2026, 1, 28, 17, 40, 0)
                .single()
                .context("invalid timestamp")?,
        ),
    ];

    let mut inserted = 0usize;
    for (source_key, email, title, description, latitude, longitude, address, created_at) in
        reports
    {
        let report = NewReport {
            title: title.to_string(),
            description: description.to_string(),
            location: Location::new(latitude, longitude, address.to_string())?,
            image_url: None,
        };

        let mut tx = pool.begin().await?;
        let profile = lock_profile(&mut tx, email).await?;
        let outcome =
            record_report(&mut tx, &profile, &report, Some(source_key), Some(created_at)).await?;
        tx.commit().await?;

        if outcome.is_some() {
            inserted += 1;
        }
    }

    info!(inserted, "seed reports loaded");
    Ok(())
}

pub async fn register_profile(pool: &PgPool, name: &str, email: &str) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        r#"
        INSERT INTO aedes_watch.profiles (id, name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id, name, email, points, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or_else(|| AppError::EmailInUse(email.to_string()))?;
    let profile = profile_from_row(&row)?;
    info!(email, "profile registered");
    Ok(profile)
}

pub async fn fetch_profile(pool: &PgPool, email: &str) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        "SELECT id, name, email, points, created_at FROM aedes_watch.profiles WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::ProfileNotFound(email.to_string()))?;

    profile_from_row(&row)
}

/// Stores the report and awards its points in one transaction. The profile
/// row stays locked until commit so concurrent submissions for the same user
/// apply their awards one after another.
pub async fn submit_report(
    pool: &PgPool,
    email: &str,
    report: &NewReport,
) -> anyhow::Result<SubmissionOutcome> {
    let mut tx = pool.begin().await?;
    let profile = lock_profile(&mut tx, email).await?;
    let outcome = record_report(&mut tx, &profile, report, None, None)
        .await?
        .context("report insert did not return a row")?;
    tx.commit().await?;

    info!(
        email,
        report_id = %outcome.report_id,
        total_points = outcome.total_points,
        bonus = outcome.bonus,
        "report submitted"
    );
    Ok(outcome)
}

/// Deletes a report owned by `email`. Points already awarded are kept.
/// Returns the image URL the report referenced, if any.
pub async fn delete_report(
    pool: &PgPool,
    email: &str,
    report_id: Uuid,
) -> anyhow::Result<Option<String>> {
    let row = sqlx::query(
        r#"
        DELETE FROM aedes_watch.reports r
        USING aedes_watch.profiles p
        WHERE r.id = $1 AND p.id = r.user_id AND p.email = $2
        RETURNING r.image_url
        "#,
    )
    .bind(report_id)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Err(unmatched_report(pool, report_id).await?.into());
    };
    let image_url: Option<String> = row.get("image_url");

    info!(email, %report_id, "report deleted");
    Ok(image_url)
}

/// Replaces the editable fields of a report owned by `email`. Points are not
/// touched. A `None` image keeps the stored one unless `clear_image` is set.
pub async fn update_report(
    pool: &PgPool,
    email: &str,
    report_id: Uuid,
    report: &NewReport,
    clear_image: bool,
) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE aedes_watch.reports r
        SET title = $3,
            description = $4,
            latitude = $5,
            longitude = $6,
            address = $7,
            image_url = CASE WHEN $9 THEN NULL ELSE COALESCE($8, r.image_url) END
        FROM aedes_watch.profiles p
        WHERE r.id = $1 AND p.id = r.user_id AND p.email = $2
        "#,
    )
    .bind(report_id)
    .bind(email)
    .bind(&report.title)
    .bind(&report.description)
    .bind(report.location.latitude)
    .bind(report.location.longitude)
    .bind(&report.location.address)
    .bind(report.image_url.as_deref())
    .bind(clear_image)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(unmatched_report(pool, report_id).await?.into());
    }

    info!(email, %report_id, "report updated");
    Ok(())
}

pub async fn fetch_reports(pool: &PgPool, owner: Option<&str>) -> anyhow::Result<Vec<Report>> {
    let rows = sqlx::query(
        r#"
        SELECT r.id, r.title, r.description, r.latitude, r.longitude, r.address,
               r.image_url, r.created_at,
               COALESCE(NULLIF(p.name, ''), 'User') AS user_name
        FROM aedes_watch.reports r
        JOIN aedes_watch.profiles p ON p.id = r.user_id
        WHERE $1::TEXT IS NULL OR p.email = $1
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    let mut reports = Vec::with_capacity(rows.len());
    for row in rows {
        reports.push(Report {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            location: Location {
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                address: row.get("address"),
            },
            image_url: row.get("image_url"),
            created_at: row.get("created_at"),
            user_name: row.get("user_name"),
        });
    }

    debug!(count = reports.len(), "reports fetched");
    Ok(reports)
}

pub async fn fetch_ranking(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<RankEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT p.name, p.points, COUNT(r.id) AS report_count
        FROM aedes_watch.profiles p
        LEFT JOIN aedes_watch.reports r ON r.user_id = p.id
        GROUP BY p.id, p.name, p.points
        ORDER BY p.points DESC, p.name
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let points = progression::checked_points(i64::from(row.get::<i32, _>("points")))?;
        entries.push(RankEntry {
            name: row.get("name"),
            points,
            report_count: row.get("report_count"),
            title: progression::resolve_title(points),
        });
    }

    Ok(entries)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        name: String,
        email: String,
        title: String,
        description: String,
        latitude: f64,
        longitude: f64,
        address: String,
        image_url: Option<String>,
        created_at: Option<DateTime<Utc>>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid CSV record {}", index + 1))?;
        let report = NewReport {
            title: row.title,
            description: row.description,
            location: Location::new(row.latitude, row.longitude, row.address)?,
            image_url: row.image_url.filter(|url| !url.is_empty()),
        };
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        sqlx::query(
            r#"
            INSERT INTO aedes_watch.profiles (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.name)
        .bind(&row.email)
        .execute(pool)
        .await?;

        let mut tx = pool.begin().await?;
        let profile = lock_profile(&mut tx, &row.email).await?;
        let outcome =
            record_report(&mut tx, &profile, &report, Some(source_key.as_str()), row.created_at).await?;
        tx.commit().await?;

        match outcome {
            Some(_) => inserted += 1,
            None => debug!(source_key = %source_key, "report already imported"),
        }
    }

    info!(inserted, path = %csv_path.display(), "csv import finished");
    Ok(inserted)
}

async fn unmatched_report(pool: &PgPool, report_id: Uuid) -> anyhow::Result<AppError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM aedes_watch.reports WHERE id = $1)")
            .bind(report_id)
            .fetch_one(pool)
            .await?;

    Ok(AppError::unmatched_report(report_id, exists))
}

async fn lock_profile(conn: &mut PgConnection, email: &str) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        r#"
        SELECT id, name, email, points, created_at
        FROM aedes_watch.profiles
        WHERE email = $1
        FOR UPDATE
        "#,
    )
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::ProfileNotFound(email.to_string()))?;

    profile_from_row(&row)
}

/// Inserts the report for an already locked profile and persists the awarded
/// total. Returns `None` when `source_key` was already loaded.
async fn record_report(
    conn: &mut PgConnection,
    profile: &Profile,
    report: &NewReport,
    source_key: Option<&str>,
    created_at: Option<DateTime<Utc>>,
) -> anyhow::Result<Option<SubmissionOutcome>> {
    let report_id = Uuid::new_v4();
    let result = sqlx::query(
        r#"
        INSERT INTO aedes_watch.reports
        (id, user_id, title, description, latitude, longitude, address, image_url, source_key, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, now()))
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(report_id)
    .bind(profile.id)
    .bind(&report.title)
    .bind(&report.description)
    .bind(report.location.latitude)
    .bind(report.location.longitude)
    .bind(&report.location.address)
    .bind(report.image_url.as_deref())
    .bind(source_key)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let award = progression::award_report(profile.points);
    let stored = i32::try_from(award.total)
        .map_err(|_| AppError::PointsOutOfRange(i64::from(award.total)))?;

    sqlx::query("UPDATE aedes_watch.profiles SET points = $1 WHERE id = $2")
        .bind(stored)
        .bind(profile.id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(SubmissionOutcome {
        report_id,
        previous_points: profile.points,
        bonus: award.bonus,
        total_points: award.total,
    }))
}

fn profile_from_row(row: &PgRow) -> anyhow::Result<Profile> {
    let points: i32 = row.get("points");
    Ok(Profile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        points: progression::checked_points(i64::from(points))?,
        created_at: row.get("created_at"),
    })
}
