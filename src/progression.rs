//! Point and title progression.
//!
//! Every submitted report is worth one point, with milestone bonuses on top.
//! Titles are resolved from a fixed tier table; both the bonus calculator and
//! the resolvers are pure and read only the static table below.

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub min_points: u32,
    pub title: &'static str,
}

/// Ordered by `min_points`, strictly increasing, starting at zero.
pub static TITLE_TABLE: [Tier; 21] = [
    Tier { min_points: 0, title: "Beginner Watcher" },
    Tier { min_points: 10, title: "Larva Hunter" },
    Tier { min_points: 25, title: "Health Squire" },
    Tier { min_points: 40, title: "Breeding Site Observer" },
    Tier { min_points: 60, title: "Neighborhood Patroller" },
    Tier { min_points: 80, title: "Sprayer Hero" },
    Tier { min_points: 100, title: "Analyst for Good" },
    Tier { min_points: 130, title: "Gutter Explorer" },
    Tier { min_points: 160, title: "Watcher of the Tropical Shadows" },
    Tier { min_points: 200, title: "Community Guardian" },
    Tier { min_points: 250, title: "Anti-Aedes Commander" },
    Tier { min_points: 300, title: "Fogging Swordsman" },
    Tier { min_points: 350, title: "Mosquito Slaying Master" },
    Tier { min_points: 400, title: "Rooftop Sentinel" },
    Tier { min_points: 450, title: "Knight of Public Health" },
    Tier { min_points: 500, title: "Zero Dengue Ambassador" },
    Tier { min_points: 600, title: "Tamer of Still Waters" },
    Tier { min_points: 700, title: "Urban Legend of Prevention" },
    Tier { min_points: 800, title: "Grand Watcher of Clear Skies" },
    Tier { min_points: 900, title: "Regional Champion of the Resistance" },
    Tier { min_points: 1000, title: "Eternal Legend of Tropical Combat" },
];

pub const MAX_LEVEL_LABEL: &str = "Max Level Reached";

const MILESTONE_FIVE_BONUS: u32 = 2;
const MILESTONE_TEN_BONUS: u32 = 3;
const MILESTONE_FIFTY_BONUS: u32 = 5;

/// Points earned by a single submitted report, before bonuses.
pub const POINTS_PER_REPORT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointAward {
    /// Total before bonuses (previous total plus the report point).
    pub raw: u32,
    pub bonus: u32,
    /// New authoritative total to persist.
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub level: usize,
    pub current_title: &'static str,
    /// `None` once the last tier is reached.
    pub next_title: Option<&'static str>,
    pub progress_percent: f64,
    pub points_to_next: u32,
}

impl ProgressSnapshot {
    pub fn next_title_label(&self) -> &'static str {
        self.next_title.unwrap_or(MAX_LEVEL_LABEL)
    }

    pub fn is_max_level(&self) -> bool {
        self.next_title.is_none()
    }

    pub fn rounded_percent(&self) -> u32 {
        self.progress_percent.round() as u32
    }
}

/// Applies milestone bonuses for `count`. The bonuses stack: 50 earns both
/// the multiple-of-ten and the multiple-of-fifty bonus.
pub fn bonus_adjusted_points(count: u32) -> u32 {
    let mut total = count;

    if count % 10 == 5 {
        total = total.saturating_add(MILESTONE_FIVE_BONUS);
    }
    if count > 0 && count % 10 == 0 {
        total = total.saturating_add(MILESTONE_TEN_BONUS);
    }
    if count > 0 && count % 50 == 0 {
        total = total.saturating_add(MILESTONE_FIFTY_BONUS);
    }

    total
}

/// Points for one new report on top of `current`.
pub fn award_report(current: u32) -> PointAward {
    let raw = current.saturating_add(POINTS_PER_REPORT);
    let total = bonus_adjusted_points(raw);
    PointAward {
        raw,
        bonus: total - raw,
        total,
    }
}

pub fn level_index(points: u32) -> usize {
    // The first tier starts at zero, so at least one tier always matches.
    TITLE_TABLE
        .partition_point(|tier| tier.min_points <= points)
        .saturating_sub(1)
}

pub fn resolve_title(points: u32) -> &'static str {
    TITLE_TABLE[level_index(points)].title
}

pub fn resolve_progress(points: u32) -> ProgressSnapshot {
    let level = level_index(points);
    let current = TITLE_TABLE[level];

    let Some(next) = TITLE_TABLE.get(level + 1) else {
        return ProgressSnapshot {
            level,
            current_title: current.title,
            next_title: None,
            progress_percent: 100.0,
            points_to_next: 0,
        };
    };

    let span = f64::from(next.min_points - current.min_points);
    let earned = f64::from(points - current.min_points);

    ProgressSnapshot {
        level,
        current_title: current.title,
        next_title: Some(next.title),
        progress_percent: earned / span * 100.0,
        points_to_next: next.min_points - points,
    }
}

/// Converts a stored or user-supplied point value, rejecting negatives.
pub fn checked_points(value: i64) -> Result<u32, AppError> {
    if value < 0 {
        return Err(AppError::NegativePoints(value));
    }
    u32::try_from(value).map_err(|_| AppError::PointsOutOfRange(value))
}
