use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Progress through one multi-part arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ArcState {
    pub(crate) next_part: u32,
    pub(crate) total_parts: u32,
}

/// Show title -> arc base -> progress. Persisted between runs as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct ContinuityStore {
    shows: BTreeMap<String, BTreeMap<String, ArcState>>,
}

impl ContinuityStore {
    /// Reads the store at `path`. A missing or blank file is an empty store.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read continuity file {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse continuity file {}", path.display()))
    }

    /// Writes the store next to `path` and renames it into place.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create continuity directory {}", parent.display())
            })?;
        }
        let json =
            serde_json::to_string_pretty(self).context("failed to serialize continuity data")?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)
            .with_context(|| format!("failed to write continuity file {}", staging.display()))?;
        fs::rename(&staging, path).with_context(|| {
            format!(
                "failed to move {} into place at {}",
                staging.display(),
                path.display()
            )
        })?;
        Ok(())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub(crate) fn has_arcs(&self, show: &str) -> bool {
        self.shows.contains_key(show)
    }

    pub(crate) fn arc(&self, show: &str, base: &str) -> Option<ArcState> {
        self.shows.get(show)?.get(base).copied()
    }

    /// The part expected next for an arc in progress.
    pub(crate) fn ready_part(&self, show: &str, base: &str) -> Option<u32> {
        self.arc(show, base).map(|state| state.next_part)
    }

    /// Records that `part` of the arc has been selected.
    ///
    /// Part 1 (re)starts the arc. A later part only counts when it is the
    /// expected one; anything else leaves the store untouched.
    pub(crate) fn advance(&mut self, show: &str, base: &str, part: u32) {
        let current = self.arc(show, base);
        let updated = match (part, current) {
            (1, existing) => Some(ArcState {
                next_part: 2,
                total_parts: existing.map_or(2, |state| state.total_parts.max(2)),
            }),
            (part, Some(state)) if part == state.next_part => {
                let advanced = ArcState {
                    next_part: part + 1,
                    ..state
                };
                (advanced.next_part <= advanced.total_parts).then_some(advanced)
            }
            _ => return,
        };

        match updated {
            Some(state) => self.put(show, base, state),
            None => self.remove(show, base),
        }
    }

    /// Raises the known length of an arc in progress after seeing `highest_part`.
    pub(crate) fn observe(&mut self, show: &str, base: &str, highest_part: u32) {
        let Some(state) = self.arc(show, base) else {
            return;
        };
        if highest_part > state.total_parts {
            self.put(
                show,
                base,
                ArcState {
                    total_parts: highest_part,
                    ..state
                },
            );
        }
    }

    /// Every arc in progress, ordered by show then arc.
    pub(crate) fn arcs(&self) -> impl Iterator<Item = (&str, &str, ArcState)> {
        self.shows.iter().flat_map(|(show, arcs)| {
            arcs.iter()
                .map(move |(base, state)| (show.as_str(), base.as_str(), *state))
        })
    }

    fn put(&mut self, show: &str, base: &str, state: ArcState) {
        self.shows
            .entry(show.to_string())
            .or_default()
            .insert(base.to_string(), state);
    }

    fn remove(&mut self, show: &str, base: &str) {
        let Some(arcs) = self.shows.get_mut(show) else {
            return;
        };
        arcs.remove(base);
        if arcs.is_empty() {
            self.shows.remove(show);
        }
    }
}
