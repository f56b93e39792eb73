use crate::models::Report;

/// Case-insensitive substring match on title, description or address.
/// A blank term matches every report.
pub fn matches_search(report: &Report, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }

    [
        report.title.as_str(),
        report.description.as_str(),
        report.location.address.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

pub fn filter_reports<'a>(reports: &'a [Report], term: Option<&str>) -> Vec<&'a Report> {
    match term {
        Some(term) => reports
            .iter()
            .filter(|report| matches_search(report, term))
            .collect(),
        None => reports.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_report() -> Report {
        Report {
            id: Uuid::new_v4(),
            title: "Uncovered Water Tank".to_string(),
            description: "Rooftop tank without a lid".to_string(),
            location: Location {
                latitude: -8.0631,
                longitude: -34.8711,
                address: "Avenida Boa Viagem, 45".to_string(),
            },
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 30, 9, 15, 0).unwrap(),
            user_name: "Jules Moreno".to_string(),
        }
    }

    #[test]
    fn search_ignores_case() {
        let report = sample_report();
        assert!(matches_search(&report, "water tank"));
        assert!(matches_search(&report, "ROOFTOP"));
        assert!(!matches_search(&report, "gutter"));
    }

    #[test]
    fn search_matches_address_alone() {
        let report = sample_report();
        assert!(matches_search(&report, "boa viagem"));
    }

    #[test]
    fn blank_term_keeps_everything() {
        let reports = vec![sample_report(), sample_report()];
        assert!(matches_search(&reports[0], "   "));
        assert_eq!(filter_reports(&reports, None).len(), 2);
        assert_eq!(filter_reports(&reports, Some("gutter")).len(), 0);
    }
}
