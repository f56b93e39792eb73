use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub points: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, address: String) -> Result<Self, AppError> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(AppError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            address,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Location,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
}

/// A report as submitted, before the store assigns identity and ownership.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub location: Location,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub report_id: Uuid,
    pub previous_points: u32,
    pub bonus: u32,
    pub total_points: u32,
}

#[derive(Debug, Clone)]
pub struct RankEntry {
    pub name: String,
    pub points: u32,
    pub report_count: i64,
    pub title: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone)]
pub struct ReportStats {
    pub total: usize,
    pub today: usize,
    pub daily_average: f64,
    pub weekly_average: f64,
    pub monthly_average: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub date: chrono::NaiveDate,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_rejects_out_of_range_coordinates() {
        assert!(Location::new(-23.5, -46.6, "Sao Paulo".to_string()).is_ok());
        assert!(Location::new(91.0, 0.0, String::new()).is_err());
        assert!(Location::new(0.0, -180.5, String::new()).is_err());
        assert!(Location::new(f64::NAN, 0.0, String::new()).is_err());
    }
}
