mod auth;
mod parse;

use anyhow::{Context, Result};

use crate::app::catalog::{
    CatalogError, Episode, MediaCatalog, PlaylistItem, PlaylistRef, PlaylistSink, Pool, Show,
};
use crate::http::{HttpRequest, Method, RetryPolicy, send_with_retries};

pub(crate) use auth::{account_username, authenticate, load_token, remove_token};

pub(crate) const CLIENT_IDENTIFIER: &str = "saturday-morning";
pub(crate) const PRODUCT: &str = "Saturday Morning";

/// Plex Media Server scoped to one TV library section.
pub(crate) struct PlexClient {
    base_url: String,
    token: String,
    section_key: String,
    machine_id: String,
}

impl PlexClient {
    /// Resolves the server identity and the library section up front.
    pub(crate) fn connect(base_url: &str, token: &str, library: &str) -> Result<Self> {
        let mut client = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            section_key: String::new(),
            machine_id: String::new(),
        };

        let identity = client
            .get("/", &[])
            .with_context(|| format!("failed to reach Plex server at {base_url}"))?;
        client.machine_id = parse::parse_machine_identifier(&identity)?;

        let sections = client
            .get("/library/sections", &[])
            .context("failed to list library sections")?;
        client.section_key = parse::parse_section_key(&sections, library)?;
        log::info!(
            "Connected to Plex server {} (library '{library}' is section {})",
            client.machine_id,
            client.section_key
        );
        Ok(client)
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, CatalogError> {
        self.send(Method::Get, path, query, &RetryPolicy::READ)
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        policy: &RetryPolicy,
    ) -> Result<String, CatalogError> {
        let url = format!("{}{path}", self.base_url);
        let headers = [
            ("Accept", "application/json"),
            ("X-Plex-Token", self.token.as_str()),
            ("X-Plex-Client-Identifier", CLIENT_IDENTIFIER),
            ("X-Plex-Product", PRODUCT),
        ];
        let request = HttpRequest {
            method,
            url: &url,
            headers: &headers,
            query,
        };
        send_with_retries(&request, policy).map_err(CatalogError::Request)
    }
}

impl MediaCatalog for PlexClient {
    fn shows_in_collection(
        &self,
        collection: &str,
        pool: Pool,
    ) -> Result<Vec<Show>, CatalogError> {
        let collections = self.get(
            &format!("/library/sections/{}/collections", self.section_key),
            &[],
        )?;
        let collection_key = parse::parse_collection_key(&collections, collection)?;
        let children = self.get(&format!("/library/collections/{collection_key}/children"), &[])?;
        parse::parse_shows(&children, pool)
    }

    fn episodes(&self, show: &Show) -> Result<Vec<Episode>, CatalogError> {
        let leaves = self.get(&format!("/library/metadata/{}/allLeaves", show.key), &[])?;
        parse::parse_episodes(&leaves, show)
    }
}

impl PlaylistSink for PlexClient {
    fn find_playlist(&self, name: &str) -> Result<Option<PlaylistRef>, CatalogError> {
        let playlists = self.get("/playlists", &[("playlistType", "video")])?;
        parse::parse_playlist(&playlists, name)
    }

    fn delete_playlist(&self, playlist: &PlaylistRef) -> Result<(), CatalogError> {
        self.send(
            Method::Delete,
            &format!("/playlists/{}", playlist.key),
            &[],
            &RetryPolicy::ONCE,
        )?;
        Ok(())
    }

    fn create_playlist(&self, name: &str, items: &[PlaylistItem]) -> Result<(), CatalogError> {
        let uri = parse::playlist_uri(
            &self.machine_id,
            items.iter().map(|item| item.episode.key.as_str()),
        );
        self.send(
            Method::Post,
            "/playlists",
            &[
                ("type", "video"),
                ("smart", "0"),
                ("title", name),
                ("uri", uri.as_str()),
            ],
            &RetryPolicy::ONCE,
        )?;
        Ok(())
    }
}
