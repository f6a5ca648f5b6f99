use serde_json::Value;

use crate::app::catalog::{CatalogError, Episode, PlaylistRef, Pool, Show};

fn parse_container(raw: &str) -> Result<Value, CatalogError> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|err| CatalogError::Decode(format!("invalid JSON: {err}")))?;
    match parsed.get("MediaContainer") {
        Some(container) if container.is_object() => Ok(container.clone()),
        _ => Err(CatalogError::Decode(
            "response has no MediaContainer".to_string(),
        )),
    }
}

// Plex leaves the list key out entirely when a container is empty.
fn entries<'a>(container: &'a Value, list_key: &str) -> &'a [Value] {
    container
        .get(list_key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string_field(entry: &Value, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn same_title(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

pub(crate) fn parse_machine_identifier(raw: &str) -> Result<String, CatalogError> {
    let container = parse_container(raw)?;
    string_field(&container, "machineIdentifier")
        .ok_or_else(|| CatalogError::Decode("server did not report a machineIdentifier".into()))
}

pub(crate) fn parse_section_key(raw: &str, library: &str) -> Result<String, CatalogError> {
    let container = parse_container(raw)?;
    entries(&container, "Directory")
        .iter()
        .find(|entry| string_field(entry, "title").is_some_and(|title| same_title(&title, library)))
        .and_then(|entry| string_field(entry, "key"))
        .ok_or_else(|| CatalogError::NotFound {
            kind: "library section",
            name: library.to_string(),
        })
}

pub(crate) fn parse_collection_key(raw: &str, collection: &str) -> Result<String, CatalogError> {
    let container = parse_container(raw)?;
    entries(&container, "Metadata")
        .iter()
        .find(|entry| {
            string_field(entry, "title").is_some_and(|title| same_title(&title, collection))
        })
        .and_then(|entry| string_field(entry, "ratingKey"))
        .ok_or_else(|| CatalogError::NotFound {
            kind: "collection",
            name: collection.to_string(),
        })
}

pub(crate) fn parse_shows(raw: &str, pool: Pool) -> Result<Vec<Show>, CatalogError> {
    let container = parse_container(raw)?;
    Ok(entries(&container, "Metadata")
        .iter()
        .filter(|entry| {
            entry
                .get("type")
                .and_then(Value::as_str)
                .is_none_or(|kind| kind == "show")
        })
        .filter_map(|entry| {
            Some(Show {
                key: string_field(entry, "ratingKey")?,
                title: string_field(entry, "title")?,
                pool,
            })
        })
        .collect())
}

pub(crate) fn parse_episodes(raw: &str, show: &Show) -> Result<Vec<Episode>, CatalogError> {
    let container = parse_container(raw)?;
    let section = string_field(&container, "librarySectionTitle").unwrap_or_default();
    Ok(entries(&container, "Metadata")
        .iter()
        .filter_map(|entry| {
            Some(Episode {
                key: string_field(entry, "ratingKey")?,
                show: string_field(entry, "grandparentTitle").unwrap_or_else(|| show.title.clone()),
                title: string_field(entry, "title")?,
                duration_ms: entry.get("duration").and_then(Value::as_u64),
                section: string_field(entry, "librarySectionTitle")
                    .unwrap_or_else(|| section.clone()),
                pool: show.pool,
            })
        })
        .collect())
}

pub(crate) fn parse_playlist(raw: &str, name: &str) -> Result<Option<PlaylistRef>, CatalogError> {
    let container = parse_container(raw)?;
    Ok(entries(&container, "Metadata").iter().find_map(|entry| {
        let title = string_field(entry, "title")?;
        if title != name.trim() {
            return None;
        }
        Some(PlaylistRef {
            key: string_field(entry, "ratingKey")?,
            title,
        })
    }))
}

/// The `uri` parameter Plex expects when creating a playlist from library items.
pub(crate) fn playlist_uri<'a, I>(machine_id: &str, keys: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = keys.into_iter().collect::<Vec<_>>().join(",");
    format!("server://{machine_id}/com.plexapp.plugins.library/library/metadata/{joined}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cartoon_show() -> Show {
        Show {
            key: "100".to_string(),
            title: "Super Squad".to_string(),
            pool: Pool::Cartoon,
        }
    }

    #[test]
    fn section_key_matches_title_case_insensitively() {
        let raw = r#"{"MediaContainer":{"size":2,"Directory":[
            {"key":"1","title":"Movies","type":"movie"},
            {"key":"2","title":"TV Shows","type":"show"}]}}"#;
        assert_eq!(parse_section_key(raw, "tv shows"), Ok("2".to_string()));
    }

    #[test]
    fn missing_section_is_not_found() {
        let raw = r#"{"MediaContainer":{"size":0}}"#;
        assert_eq!(
            parse_section_key(raw, "TV Shows"),
            Err(CatalogError::NotFound {
                kind: "library section",
                name: "TV Shows".to_string()
            })
        );
    }

    #[test]
    fn collection_key_accepts_numeric_rating_key() {
        let raw = r#"{"MediaContainer":{"Metadata":[
            {"ratingKey":555,"title":"Saturday Morning Cartoons"}]}}"#;
        assert_eq!(
            parse_collection_key(raw, "Saturday Morning Cartoons"),
            Ok("555".to_string())
        );
    }

    #[test]
    fn shows_skip_non_show_children_and_tag_pool() {
        let raw = r#"{"MediaContainer":{"Metadata":[
            {"ratingKey":"10","title":"Super Squad","type":"show"},
            {"ratingKey":"11","title":"A Movie","type":"movie"},
            {"ratingKey":"12","title":"Beach Patrol","type":"show"}]}}"#;
        let shows = parse_shows(raw, Pool::LiveAction).expect("shows should parse");
        let titles = shows.iter().map(|show| show.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Super Squad", "Beach Patrol"]);
        assert!(shows.iter().all(|show| show.pool == Pool::LiveAction));
    }

    #[test]
    fn episodes_keep_missing_durations_as_none() {
        let raw = r#"{"MediaContainer":{"librarySectionTitle":"TV Shows","Metadata":[
            {"ratingKey":"201","title":"Rise of Villains (1)","duration":1320000,"grandparentTitle":"Super Squad"},
            {"ratingKey":"202","title":"Unaired Pilot"}]}}"#;
        let episodes = parse_episodes(raw, &cartoon_show()).expect("episodes should parse");
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].duration_ms, Some(1_320_000));
        assert_eq!(episodes[0].minutes(), Some(22.0));
        assert_eq!(episodes[0].section, "TV Shows");
        assert_eq!(episodes[1].duration_ms, None);
        assert_eq!(episodes[1].show, "Super Squad");
        assert_eq!(episodes[1].pool, Pool::Cartoon);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(
            parse_episodes("<html>", &cartoon_show()),
            Err(CatalogError::Decode(_))
        ));
        assert!(matches!(
            parse_shows(r#"{"errors":[]}"#, Pool::Cartoon),
            Err(CatalogError::Decode(_))
        ));
    }

    #[test]
    fn playlist_lookup_requires_exact_title() {
        let raw = r#"{"MediaContainer":{"Metadata":[
            {"ratingKey":"9","title":"Saturday Morning (old)"},
            {"ratingKey":"7","title":"📺 Saturday Morning"}]}}"#;
        let found = parse_playlist(raw, "📺 Saturday Morning").expect("playlists should parse");
        assert_eq!(
            found,
            Some(PlaylistRef {
                key: "7".to_string(),
                title: "📺 Saturday Morning".to_string()
            })
        );
        assert_eq!(parse_playlist(raw, "Sunday").expect("parse"), None);
    }

    #[test]
    fn playlist_uri_joins_keys_in_order() {
        assert_eq!(
            playlist_uri("abc", ["3", "1", "2"]),
            "server://abc/com.plexapp.plugins.library/library/metadata/3,1,2"
        );
    }

    #[test]
    fn machine_identifier_is_required() {
        let raw = r#"{"MediaContainer":{"machineIdentifier":"f00d"}}"#;
        assert_eq!(parse_machine_identifier(raw), Ok("f00d".to_string()));
        assert!(parse_machine_identifier(r#"{"MediaContainer":{}}"#).is_err());
    }
}
