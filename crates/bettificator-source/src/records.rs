//! Structured records produced from source pages

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Played,
    Scheduled,
    Postponed,
}

/// One fixture or result on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    /// Kick-off time as printed (`HH:MM`), when shown
    pub time: Option<String>,
    pub competition: Option<String>,
    pub home: String,
    pub away: String,
    pub home_goals: Option<u8>,
    pub away_goals: Option<u8>,
    pub status: MatchStatus,
    pub url: Option<String>,
}

/// One club listed on a catalog page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubRecord {
    pub name: String,
    pub country: Option<String>,
    pub url: Option<String>,
    /// Catalog page the club was listed on (`A`..`Z` or `1`)
    pub catalog_key: String,
}
