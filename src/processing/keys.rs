//! Natural-key recognition and batch-local player keys.

use std::collections::HashMap;

use crate::model::PlayerKey;

/// Attributes that identify "the same player" across rows of one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    /// Name plus the source's secondary identifier.
    Secondary { name: String, secondary: String },
    /// Name plus team, used when the row has no secondary identifier.
    Team { name: String, team: Option<String> },
}

impl NaturalKey {
    pub fn derive(name: &str, secondary: Option<&str>, team: Option<&str>) -> Self {
        match secondary {
            Some(secondary) => Self::Secondary {
                name: name.to_owned(),
                secondary: secondary.to_owned(),
            },
            None => Self::Team {
                name: name.to_owned(),
                team: team.map(str::to_owned),
            },
        }
    }
}

/// Whether [`KeyRegistry::resolve`] saw the key before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    New(PlayerKey),
    Existing(PlayerKey),
}

/// Maps natural keys to sequential [`PlayerKey`]s (1, 2, ...) in first-appearance order.
///
/// Lives for one transform call; the same input always yields the same keys.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    keys: HashMap<NaturalKey, PlayerKey>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, key: NaturalKey) -> Resolved {
        if let Some(&existing) = self.keys.get(&key) {
            return Resolved::Existing(existing);
        }
        let next = PlayerKey::new(self.keys.len() as u32 + 1);
        self.keys.insert(key, next);
        Resolved::New(next)
    }
}
