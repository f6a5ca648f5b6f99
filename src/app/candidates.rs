use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use thiserror::Error;

use super::catalog::{Episode, MediaCatalog, Show};

/// Duration limits, in minutes, applied to every selection decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SelectionBudget {
    pub(crate) max_total_duration: u32,
    pub(crate) min_episode_length: u32,
    pub(crate) max_episode_length: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum BudgetError {
    #[error("min_episode_length must be at least 1 minute")]
    ZeroMinLength,
    #[error("min_episode_length {min} exceeds max_episode_length {max}")]
    MinExceedsMax { min: u32, max: u32 },
    #[error("max_episode_length {max} exceeds max_duration {total}")]
    EpisodeExceedsTotal { max: u32, total: u32 },
}

impl SelectionBudget {
    pub(crate) fn validate(self) -> Result<Self, BudgetError> {
        if self.min_episode_length == 0 {
            return Err(BudgetError::ZeroMinLength);
        }
        if self.min_episode_length > self.max_episode_length {
            return Err(BudgetError::MinExceedsMax {
                min: self.min_episode_length,
                max: self.max_episode_length,
            });
        }
        if self.max_episode_length > self.max_total_duration {
            return Err(BudgetError::EpisodeExceedsTotal {
                max: self.max_episode_length,
                total: self.max_total_duration,
            });
        }
        Ok(self)
    }

    pub(crate) fn fits_episode(&self, minutes: f64) -> bool {
        f64::from(self.min_episode_length) <= minutes
            && minutes <= f64::from(self.max_episode_length)
    }

    pub(crate) fn fits_total(&self, running_total: f64, minutes: f64) -> bool {
        running_total + minutes <= f64::from(self.max_total_duration)
    }

    /// Whether any eligible episode could still be added on top of `running_total`.
    pub(crate) fn has_room(&self, running_total: f64) -> bool {
        self.fits_total(running_total, f64::from(self.min_episode_length))
    }
}

/// Show titles to skip, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExcludeSet {
    titles: HashSet<String>,
}

impl ExcludeSet {
    pub(crate) fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            titles: titles
                .into_iter()
                .map(|title| title.as_ref().trim().to_lowercase())
                .filter(|title| !title.is_empty())
                .collect(),
        }
    }

    pub(crate) fn contains(&self, show_title: &str) -> bool {
        self.titles.contains(&show_title.trim().to_lowercase())
    }
}

/// Episodes fetched during one run, at most one catalog call per show.
#[derive(Debug, Default)]
pub(crate) struct EpisodeCache {
    by_show: HashMap<String, Rc<[Rc<Episode>]>>,
}

impl EpisodeCache {
    /// All episodes of `show`. A failed fetch is logged once and yields nothing.
    pub(crate) fn episodes<C: MediaCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        show: &Show,
    ) -> Rc<[Rc<Episode>]> {
        if let Some(cached) = self.by_show.get(&show.key) {
            return Rc::clone(cached);
        }
        let fetched: Rc<[Rc<Episode>]> = match catalog.episodes(show) {
            Ok(episodes) => episodes.into_iter().map(Rc::new).collect(),
            Err(err) => {
                log::error!("Error listing episodes for show '{}': {err}", show.title);
                Rc::from(Vec::new())
            }
        };
        self.by_show.insert(show.key.clone(), Rc::clone(&fetched));
        fetched
    }
}

/// Episodes of `show` that may be selected under `budget`.
pub(crate) fn eligible(
    show: &Show,
    episodes: &[Rc<Episode>],
    budget: &SelectionBudget,
    exclude: &ExcludeSet,
) -> Vec<Rc<Episode>> {
    if exclude.contains(&show.title) {
        return Vec::new();
    }
    episodes
        .iter()
        .filter(|episode| {
            episode
                .minutes()
                .is_some_and(|minutes| budget.fits_episode(minutes))
        })
        .cloned()
        .collect()
}
