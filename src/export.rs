use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Location, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub content: String,
    pub filename: String,
    pub content_type: &'static str,
}

/// Report fields safe to publish; author identity is left out.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicReport<'a> {
    id: Uuid,
    title: &'a str,
    description: &'a str,
    location: &'a Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: Uuid,
    title: &'a str,
    description: &'a str,
    latitude: f64,
    longitude: f64,
    address: &'a str,
    image: &'a str,
    created_at: String,
}

pub fn export_reports(
    reports: &[Report],
    format: ExportFormat,
    today: NaiveDate,
) -> anyhow::Result<ExportFile> {
    let content = match format {
        ExportFormat::Json => to_json(reports)?,
        ExportFormat::Csv => to_csv(reports)?,
    };

    Ok(ExportFile {
        content,
        filename: format!("aedes-reports-{}.{}", today, format.extension()),
        content_type: format.content_type(),
    })
}

fn to_json(reports: &[Report]) -> anyhow::Result<String> {
    let public: Vec<PublicReport<'_>> = reports
        .iter()
        .map(|report| PublicReport {
            id: report.id,
            title: &report.title,
            description: &report.description,
            location: &report.location,
            image_url: report.image_url.as_deref(),
            created_at: report.created_at,
        })
        .collect();

    Ok(serde_json::to_string_pretty(&public)?)
}

fn to_csv(reports: &[Report]) -> anyhow::Result<String> {
    // Header is written by hand so an empty export still carries it.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        "id",
        "title",
        "description",
        "latitude",
        "longitude",
        "address",
        "image",
        "created_at",
    ])?;

    for report in reports {
        writer.serialize(CsvRow {
            id: report.id,
            title: &report.title,
            description: &report.description,
            latitude: report.location.latitude,
            longitude: report.location.longitude,
            address: &report.location.address,
            image: report.image_url.as_deref().unwrap_or(""),
            created_at: report.created_at.to_rfc3339(),
        })?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_report() -> Report {
        Report {
            id: Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2").unwrap(),
            title: "Open water tank".to_string(),
            description: "Tank without lid, \"full\" of larvae".to_string(),
            location: Location {
                latitude: -8.05,
                longitude: -34.9,
                address: "Rua da Aurora, 100".to_string(),
            },
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            user_name: "Avery Lee".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn json_export_omits_author() {
        let file = export_reports(&[sample_report()], ExportFormat::Json, today()).unwrap();
        assert_eq!(file.filename, "aedes-reports-2026-03-10.json");
        assert_eq!(file.content_type, "application/json");
        assert!(!file.content.contains("Avery Lee"));
        assert!(!file.content.contains("userId"));

        let parsed: serde_json::Value = serde_json::from_str(&file.content).unwrap();
        assert_eq!(parsed[0]["title"], "Open water tank");
        assert_eq!(parsed[0]["location"]["address"], "Rua da Aurora, 100");
        assert!(parsed[0].get("imageUrl").is_none());
    }

    #[test]
    fn csv_export_quotes_fields() {
        let file = export_reports(&[sample_report()], ExportFormat::Csv, today()).unwrap();
        assert_eq!(file.filename, "aedes-reports-2026-03-10.csv");

        let mut lines = file.content.lines();
        assert_eq!(
            lines.next(),
            Some("id,title,description,latitude,longitude,address,image,created_at")
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"Rua da Aurora, 100\""));
        assert!(row.contains("\"Tank without lid, \"\"full\"\" of larvae\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_csv_export_keeps_header() {
        let file = export_reports(&[], ExportFormat::Csv, today()).unwrap();
        assert_eq!(
            file.content.trim_end(),
            "id,title,description,latitude,longitude,address,image,created_at"
        );
    }
}
