//! Column catalog and header normalization.
//!
//! Source headers are reduced to a canonical label ([`canonical_label`]) and matched against the
//! catalog by store column name or alias, so `Player-additional`, `player additional` and
//! `PLAYER_ADDITIONAL` all land on `player_additional`.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{TransformationError, TransformationResult};
use crate::types::{DataType, Schema};

/// One column of the normalized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Store column name. Also accepted as a source label.
    pub name: &'static str,
    /// Additional canonical source labels.
    pub aliases: &'static [&'static str],
    pub data_type: DataType,
    /// Transform fails with [`TransformationError::MissingColumn`] when absent.
    pub required: bool,
}

impl ColumnSpec {
    const fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        data_type: DataType,
        required: bool,
    ) -> Self {
        Self {
            name,
            aliases,
            data_type,
            required,
        }
    }

    /// Whether a canonical source label names this column.
    pub fn matches(&self, label: &str) -> bool {
        self.name == label || self.aliases.contains(&label)
    }

    fn accepted(&self) -> Vec<String> {
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .map(str::to_owned)
            .collect()
    }
}

const fn metric(name: &'static str, aliases: &'static [&'static str], required: bool) -> ColumnSpec {
    ColumnSpec::new(name, aliases, DataType::Float64, required)
}

pub const PLAYER_NAME: ColumnSpec = ColumnSpec::new("player_name", &["player", "name"], DataType::Utf8, true);
pub const AGE: ColumnSpec = ColumnSpec::new("age", &[], DataType::Int64, true);
pub const TEAM: ColumnSpec = ColumnSpec::new("team", &["tm"], DataType::Utf8, true);
pub const POSITION: ColumnSpec = ColumnSpec::new("position", &["pos"], DataType::Utf8, true);
pub const PLAYER_ADDITIONAL: ColumnSpec = ColumnSpec::new(
    "player_additional",
    &["player_id", "additional"],
    DataType::Utf8,
    false,
);

/// Identity columns, in store order.
pub static IDENTITY_COLUMNS: [ColumnSpec; 5] = [PLAYER_NAME, AGE, TEAM, POSITION, PLAYER_ADDITIONAL];

/// Optional per-row season label; the configured season is used when absent.
pub const SEASON: ColumnSpec = ColumnSpec::new("season", &["year"], DataType::Utf8, false);
pub const GAMES_PLAYED: ColumnSpec = ColumnSpec::new("games_played", &["g", "gp", "games"], DataType::Int64, true);
pub const GAMES_STARTED: ColumnSpec = ColumnSpec::new("games_started", &["gs"], DataType::Int64, true);
pub const AWARDS: ColumnSpec = ColumnSpec::new("awards", &[], DataType::Utf8, false);

/// Number of per-game metric columns.
pub const METRIC_COUNT: usize = 23;

/// Per-game statistical columns, in store order.
pub static METRIC_COLUMNS: [ColumnSpec; METRIC_COUNT] = [
    metric("minutes_per_game", &["mp", "min", "mpg"], true),
    metric("field_goals", &["fg"], false),
    metric("field_goal_attempts", &["fga"], false),
    metric("field_goal_pct", &["fg%", "fg_pct"], false),
    metric("three_pt_made", &["3p", "3pm", "fg3"], false),
    metric("three_pt_attempts", &["3pa", "fg3a"], false),
    metric("three_pt_pct", &["3p%", "fg3_pct"], false),
    metric("two_pt_made", &["2p", "fg2"], false),
    metric("two_pt_attempts", &["2pa", "fg2a"], false),
    metric("two_pt_pct", &["2p%", "fg2_pct"], false),
    metric("effective_fg_pct", &["efg%", "efg_pct"], false),
    metric("ft_made", &["ft"], false),
    metric("ft_attempts", &["fta"], false),
    metric("ft_pct", &["ft%"], false),
    metric("offensive_rebounds", &["orb", "oreb"], false),
    metric("defensive_rebounds", &["drb", "dreb"], false),
    metric("total_rebounds", &["trb", "reb"], false),
    metric("assists", &["ast"], false),
    metric("steals", &["stl"], false),
    metric("blocks", &["blk"], false),
    metric("turnovers", &["tov", "to"], false),
    metric("personal_fouls", &["pf"], false),
    metric("points", &["pts"], true),
];

/// Position of a metric column in [`METRIC_COLUMNS`].
pub fn metric_index(name: &str) -> Option<usize> {
    METRIC_COLUMNS.iter().position(|c| c.name == name)
}

/// Every catalog column: identity, season, games, metrics, awards.
pub fn catalog() -> impl Iterator<Item = &'static ColumnSpec> {
    IDENTITY_COLUMNS
        .iter()
        .chain([&SEASON, &GAMES_PLAYED, &GAMES_STARTED])
        .chain(METRIC_COLUMNS.iter())
        .chain(std::iter::once(&AWARDS))
}

/// Reduce a raw header to its canonical label.
///
/// Trims, drops a stray byte order mark, lowercases, and collapses runs of whitespace, `-`, `_`
/// and `.` into a single `_`.
pub fn canonical_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().trim_start_matches('\u{feff}').chars() {
        if ch.is_whitespace() || matches!(ch, '-' | '_' | '.') {
            pending_sep = !out.is_empty();
            continue;
        }
        if pending_sep {
            out.push('_');
            pending_sep = false;
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Binding of catalog columns to source column indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    bound: HashMap<&'static str, usize>,
}

impl ColumnMap {
    /// Bind every catalog column present in `schema`.
    ///
    /// Fails on a missing required column or when two headers land on the same column.
    /// Unknown headers are ignored.
    pub fn resolve(schema: &Schema) -> TransformationResult<Self> {
        let labels: Vec<String> = schema.field_names().map(canonical_label).collect();
        let mut bound: HashMap<&'static str, usize> = HashMap::new();

        for (idx, label) in labels.iter().enumerate() {
            let Some(spec) = catalog().find(|c| c.matches(label)) else {
                debug!(header = %schema.fields[idx].name, "ignoring column outside the catalog");
                continue;
            };
            if let Some(&prev) = bound.get(spec.name) {
                return Err(TransformationError::DuplicateColumn {
                    column: spec.name.to_string(),
                    first: schema.fields[prev].name.clone(),
                    second: schema.fields[idx].name.clone(),
                });
            }
            bound.insert(spec.name, idx);
        }

        if let Some(spec) = catalog().find(|c| c.required && !bound.contains_key(c.name)) {
            return Err(TransformationError::MissingColumn {
                column: spec.name.to_string(),
                accepted: spec.accepted(),
                headers: labels,
            });
        }

        let absent: Vec<&str> = catalog()
            .filter(|c| c.name != SEASON.name && !bound.contains_key(c.name))
            .map(|c| c.name)
            .collect();
        if !absent.is_empty() {
            warn!(columns = ?absent, "optional columns absent from source; values will be null");
        }

        Ok(Self { bound })
    }

    /// Source index of `spec`, if bound.
    pub fn index(&self, spec: &ColumnSpec) -> Option<usize> {
        self.bound.get(spec.name).copied()
    }
}
