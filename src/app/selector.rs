use std::collections::HashSet;
use std::rc::Rc;

use rand::Rng;
use rand::seq::SliceRandom;

use super::arc::{ArcPart, classify, highest_part};
use super::candidates::{EpisodeCache, ExcludeSet, SelectionBudget, eligible};
use super::catalog::{Episode, ItemKind, MediaCatalog, PlaylistItem, Show};
use super::continuity::ContinuityStore;

pub(crate) struct SelectionRequest<'a> {
    pub(crate) cartoons: &'a [Show],
    pub(crate) live_action: &'a [Show],
    pub(crate) budget: SelectionBudget,
    pub(crate) exclude: &'a ExcludeSet,
    pub(crate) include_live_action: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Selection {
    pub(crate) items: Vec<PlaylistItem>,
    pub(crate) total_minutes: f64,
}

impl Selection {
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push(&mut self, episode: Rc<Episode>, minutes: f64, kind: ItemKind) {
        log::info!(
            "Added {}: {} - {} ({minutes:.1} min, section '{}')",
            kind.label(),
            episode.show,
            episode.title,
            episode.section
        );
        self.total_minutes += minutes;
        self.items.push(PlaylistItem {
            episode,
            minutes,
            kind,
        });
    }
}

/// Picks the episodes for one playlist and advances arc continuity in `store`.
///
/// Runs three passes in order: one pending arc continuation, at most one
/// live-action episode, then one cartoon per remaining show while the budget
/// allows. Items come back in selection order; arranging is a separate step.
pub(crate) fn select<C, R>(
    catalog: &C,
    cache: &mut EpisodeCache,
    request: &SelectionRequest<'_>,
    store: &mut ContinuityStore,
    rng: &mut R,
) -> Selection
where
    C: MediaCatalog + ?Sized,
    R: Rng + ?Sized,
{
    let mut selection = Selection::default();
    let mut used_shows = HashSet::new();

    if let Some(show_key) = continuity_pass(catalog, cache, request, store, &mut selection) {
        used_shows.insert(show_key);
    }
    if request.include_live_action {
        live_action_pass(catalog, cache, request, rng, &mut selection);
    }
    cartoon_fill_pass(
        catalog,
        cache,
        request,
        store,
        rng,
        &mut used_shows,
        &mut selection,
    );

    selection
}

fn continuity_pass<C: MediaCatalog + ?Sized>(
    catalog: &C,
    cache: &mut EpisodeCache,
    request: &SelectionRequest<'_>,
    store: &mut ContinuityStore,
    selection: &mut Selection,
) -> Option<String> {
    let budget = &request.budget;
    for show in request.cartoons {
        if !store.has_arcs(&show.title) {
            continue;
        }
        let episodes = cache.episodes(catalog, show);
        let found = episodes.iter().find_map(|episode| {
            let arc = classify(&episode.title)?;
            if store.ready_part(&show.title, &arc.base) != Some(arc.part) {
                return None;
            }
            let minutes = episode.minutes()?;
            (budget.fits_episode(minutes) && budget.fits_total(selection.total_minutes, minutes))
                .then(|| (Rc::clone(episode), minutes, arc))
        });
        let Some((episode, minutes, arc)) = found else {
            continue;
        };

        record_progress(store, show, &episodes, &arc);
        selection.push(episode, minutes, ItemKind::Continuity);
        return Some(show.key.clone());
    }
    None
}

fn live_action_pass<C, R>(
    catalog: &C,
    cache: &mut EpisodeCache,
    request: &SelectionRequest<'_>,
    rng: &mut R,
    selection: &mut Selection,
) where
    C: MediaCatalog + ?Sized,
    R: Rng + ?Sized,
{
    let mut shows = request.live_action.iter().collect::<Vec<_>>();
    shows.shuffle(rng);

    for show in shows {
        if request.exclude.contains(&show.title) {
            log::info!("Skipped excluded show: {}", show.title);
            continue;
        }
        let episodes = cache.episodes(catalog, show);
        let candidates = eligible(show, &episodes, &request.budget, request.exclude);
        let Some(episode) = candidates.choose(rng) else {
            log::info!("No valid episodes for {}", show.title);
            continue;
        };
        let Some(minutes) = episode.minutes() else {
            continue;
        };
        if request.budget.fits_total(selection.total_minutes, minutes) {
            selection.push(Rc::clone(episode), minutes, ItemKind::LiveAction);
            return;
        }
    }
}

fn cartoon_fill_pass<C, R>(
    catalog: &C,
    cache: &mut EpisodeCache,
    request: &SelectionRequest<'_>,
    store: &mut ContinuityStore,
    rng: &mut R,
    used_shows: &mut HashSet<String>,
    selection: &mut Selection,
) where
    C: MediaCatalog + ?Sized,
    R: Rng + ?Sized,
{
    let budget = &request.budget;
    let mut shows = request.cartoons.iter().collect::<Vec<_>>();
    shows.shuffle(rng);

    for show in shows {
        if !budget.has_room(selection.total_minutes) {
            log::info!(
                "Stopping cartoon selection at {:.1} min: no room for another episode",
                selection.total_minutes
            );
            break;
        }
        if request.exclude.contains(&show.title) {
            log::info!("Skipped excluded show: {}", show.title);
            continue;
        }
        if used_shows.contains(&show.key) {
            continue;
        }

        let episodes = cache.episodes(catalog, show);
        let mut candidates = eligible(show, &episodes, budget, request.exclude);
        if candidates.is_empty() {
            log::info!("No valid episodes for {}", show.title);
            continue;
        }
        candidates.shuffle(rng);

        let found = candidates.iter().find_map(|episode| {
            let minutes = episode.minutes()?;
            let arc = classify(&episode.title);
            if let Some(arc) = &arc
                && arc.part > 1
                && store.ready_part(&show.title, &arc.base) != Some(arc.part)
            {
                return None;
            }
            budget
                .fits_total(selection.total_minutes, minutes)
                .then(|| (Rc::clone(episode), minutes, arc))
        });
        let Some((episode, minutes, arc)) = found else {
            continue;
        };

        if let Some(arc) = arc {
            record_progress(store, show, &episodes, &arc);
        }
        used_shows.insert(show.key.clone());
        selection.push(episode, minutes, ItemKind::Cartoon);
    }
}

// Observing before advancing keeps a longer arc alive past its provisional
// length; observing after covers an arc that part 1 just created.
fn record_progress(
    store: &mut ContinuityStore,
    show: &Show,
    episodes: &[Rc<Episode>],
    arc: &ArcPart,
) {
    let highest = highest_part(
        episodes.iter().map(|episode| episode.title.as_str()),
        &arc.base,
    )
    .unwrap_or(arc.part);

    store.observe(&show.title, &arc.base, highest);
    store.advance(&show.title, &arc.base, arc.part);
    store.observe(&show.title, &arc.base, highest);

    match store.ready_part(&show.title, &arc.base) {
        Some(next) => log::info!(
            "Continuity for {} / {}: next part {next}",
            show.title,
            arc.base
        ),
        None => log::info!("Completed arc {} / {}", show.title, arc.base),
    }
}
