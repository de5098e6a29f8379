//! Normalized records produced by the transform stage and written by the loader.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::processing::columns::{METRIC_COUNT, metric_index};

/// Batch-local player key.
///
/// Assigned in first-appearance order by [`crate::processing::keys::KeyRegistry`] and only
/// meaningful within one [`TransformOutput`]. The loader resolves it to the store's surrogate id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerKey(u32);

impl PlayerKey {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub key: PlayerKey,
    pub name: String,
    pub age: Option<i64>,
    pub team: Option<String>,
    pub position: Option<String>,
    /// Secondary natural identifier supplied by the source (e.g. `jamesle01`).
    pub player_additional: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// One statistical line for a player in a season.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonStat {
    /// Owning player in the same batch.
    pub player_key: PlayerKey,
    pub season: String,
    pub games_played: Option<i64>,
    pub games_started: Option<i64>,
    /// Per-game metrics, aligned with [`crate::processing::columns::METRIC_COLUMNS`].
    pub metrics: [Option<f64>; METRIC_COUNT],
    pub awards: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl SeasonStat {
    /// Metric value by store column name (`"points"`, `"assists"`, ...).
    ///
    /// `None` for an unknown name or a null value.
    pub fn metric(&self, name: &str) -> Option<f64> {
        metric_index(name).and_then(|idx| self.metrics[idx])
    }

    pub fn points(&self) -> Option<f64> {
        self.metric("points")
    }

    pub fn minutes_per_game(&self) -> Option<f64> {
        self.metric("minutes_per_game")
    }
}

/// Output of the transform stage: players plus the season stats that reference them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    pub players: Vec<Player>,
    pub stats: Vec<SeasonStat>,
}

impl TransformOutput {
    /// Total number of records across both sets.
    pub fn record_count(&self) -> usize {
        self.players.len() + self.stats.len()
    }

    /// The player a stat row belongs to, if it is in this batch.
    pub fn player_for(&self, stat: &SeasonStat) -> Option<&Player> {
        self.players.iter().find(|p| p.key == stat.player_key)
    }
}
