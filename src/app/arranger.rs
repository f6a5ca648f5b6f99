use rand::Rng;
use rand::seq::SliceRandom;

use super::catalog::{ItemKind, PlaylistItem};

/// Puts selected items into playing order.
///
/// The continuity episode leads, two cartoons precede the live-action
/// episode, and the rest of the cartoons follow. With `shuffle` set the whole
/// list is then shuffled, which can undo that ordering. Either way the list
/// never opens on a live-action episode when anything else is available.
pub(crate) fn arrange<R: Rng + ?Sized>(
    items: Vec<PlaylistItem>,
    shuffle: bool,
    rng: &mut R,
) -> Vec<PlaylistItem> {
    let mut arranged = place_by_kind(items);
    if shuffle {
        arranged.shuffle(rng);
    }
    keep_live_action_off_the_top(&mut arranged);
    arranged
}

fn place_by_kind(items: Vec<PlaylistItem>) -> Vec<PlaylistItem> {
    let mut continuity = Vec::new();
    let mut live_action = Vec::new();
    let mut cartoons = Vec::new();
    for item in items {
        match item.kind {
            ItemKind::Continuity => continuity.push(item),
            ItemKind::LiveAction => live_action.push(item),
            ItemKind::Cartoon => cartoons.push(item),
        }
    }

    let lead = cartoons.len().min(2);
    let rest = cartoons.split_off(lead);
    let mut placed = continuity;
    placed.extend(cartoons);
    placed.extend(live_action);
    placed.extend(rest);
    placed
}

fn keep_live_action_off_the_top(items: &mut [PlaylistItem]) {
    if !items.first().is_some_and(PlaylistItem::is_live_action) {
        return;
    }
    if let Some(idx) = items.iter().position(|item| !item.is_live_action()) {
        items.swap(0, idx);
    }
}
