use std::rc::Rc;

use thiserror::Error;

/// Which configured collection a show was listed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Pool {
    Cartoon,
    LiveAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Show {
    pub(crate) key: String,
    pub(crate) title: String,
    pub(crate) pool: Pool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Episode {
    pub(crate) key: String,
    pub(crate) show: String,
    pub(crate) title: String,
    pub(crate) duration_ms: Option<u64>,
    pub(crate) section: String,
    pub(crate) pool: Pool,
}

impl Episode {
    /// Duration in minutes, or `None` when the server reported no usable length.
    pub(crate) fn minutes(&self) -> Option<f64> {
        match self.duration_ms {
            Some(ms) if ms > 0 => Some(ms as f64 / 60_000.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaylistRef {
    pub(crate) key: String,
    pub(crate) title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemKind {
    Continuity,
    LiveAction,
    Cartoon,
}

impl ItemKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Continuity => "continuity",
            Self::LiveAction => "live-action",
            Self::Cartoon => "cartoon",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PlaylistItem {
    pub(crate) episode: Rc<Episode>,
    pub(crate) minutes: f64,
    pub(crate) kind: ItemKind,
}

impl PlaylistItem {
    pub(crate) fn is_live_action(&self) -> bool {
        self.episode.pool == Pool::LiveAction
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum CatalogError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

/// Read side of the media server.
pub(crate) trait MediaCatalog {
    fn shows_in_collection(&self, collection: &str, pool: Pool)
    -> Result<Vec<Show>, CatalogError>;

    fn episodes(&self, show: &Show) -> Result<Vec<Episode>, CatalogError>;
}

/// Write side of the media server.
pub(crate) trait PlaylistSink {
    fn find_playlist(&self, name: &str) -> Result<Option<PlaylistRef>, CatalogError>;

    fn delete_playlist(&self, playlist: &PlaylistRef) -> Result<(), CatalogError>;

    fn create_playlist(&self, name: &str, items: &[PlaylistItem]) -> Result<(), CatalogError>;
}

/// Drops any playlist called `name` and creates a fresh one from `items`.
pub(crate) fn replace_playlist<S: PlaylistSink + ?Sized>(
    sink: &S,
    name: &str,
    items: &[PlaylistItem],
) -> Result<(), CatalogError> {
    match sink.find_playlist(name) {
        Ok(Some(existing)) => {
            sink.delete_playlist(&existing)?;
            log::info!("Deleted old playlist '{}'", existing.title);
        }
        Ok(None) => {}
        Err(err) => log::warn!("Could not look up existing playlist '{name}': {err}"),
    }
    sink.create_playlist(name, items)
}
