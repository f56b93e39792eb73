use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("point values cannot be negative (got {0})")]
    NegativePoints(i64),

    #[error("point value {0} is out of range")]
    PointsOutOfRange(i64),

    #[error("no profile registered for {0}")]
    ProfileNotFound(String),

    #[error("email already in use: {0}")]
    EmailInUse(String),

    #[error("report {0} not found")]
    ReportNotFound(Uuid),

    #[error("report {0} belongs to another user")]
    NotReportOwner(Uuid),

    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl AppError {
    /// Error for an owner-scoped write that matched no row: either the report
    /// is gone or it belongs to someone else.
    pub fn unmatched_report(report_id: Uuid, exists: bool) -> Self {
        if exists {
            AppError::NotReportOwner(report_id)
        } else {
            AppError::ReportNotFound(report_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_report_distinguishes_missing_from_foreign() {
        let id = Uuid::new_v4();
        assert!(matches!(
            AppError::unmatched_report(id, false),
            AppError::ReportNotFound(found) if found == id
        ));
        assert!(matches!(
            AppError::unmatched_report(id, true),
            AppError::NotReportOwner(found) if found == id
        ));
    }
}
