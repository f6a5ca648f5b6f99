use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CLIENT_IDENTIFIER, PRODUCT};
use crate::http::{HttpRequest, Method, RetryPolicy, send_with_retries};

const PLEX_TV: &str = "https://plex.tv/api/v2";
const LINK_URL: &str = "https://plex.tv/link";
const POLL_ATTEMPTS: usize = 60;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize, Deserialize)]
struct TokenFile {
    token: String,
}

/// Token from the config file if set, otherwise from the saved token file.
pub(crate) fn load_token(config_token: Option<&str>, token_path: &Path) -> Result<String> {
    if let Some(token) = config_token.map(str::trim).filter(|token| !token.is_empty()) {
        return Ok(token.to_string());
    }
    if token_path.exists() {
        let raw = fs::read_to_string(token_path)
            .with_context(|| format!("failed to read token file {}", token_path.display()))?;
        let parsed: TokenFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse token file {}", token_path.display()))?;
        if !parsed.token.trim().is_empty() {
            return Ok(parsed.token.trim().to_string());
        }
    }
    bail!("no Plex token found. Run `saturday-morning auth` to log in")
}

pub(crate) fn save_token(token_path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = token_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create token directory {}", parent.display()))?;
    }
    let json = serde_json::to_string(&TokenFile {
        token: token.to_string(),
    })
    .context("failed to serialize token")?;
    fs::write(token_path, json)
        .with_context(|| format!("failed to write token file {}", token_path.display()))
}

/// Removes the saved token. Returns whether one existed.
pub(crate) fn remove_token(token_path: &Path) -> Result<bool> {
    if !token_path.exists() {
        return Ok(false);
    }
    fs::remove_file(token_path)
        .with_context(|| format!("failed to remove token file {}", token_path.display()))?;
    Ok(true)
}

fn plex_tv_headers(token: Option<&str>) -> Vec<(&str, &str)> {
    let mut headers = vec![
        ("X-Plex-Client-Identifier", CLIENT_IDENTIFIER),
        ("X-Plex-Product", PRODUCT),
        ("X-Plex-Version", env!("CARGO_PKG_VERSION")),
        ("Accept", "application/json"),
    ];
    if let Some(token) = token {
        headers.push(("X-Plex-Token", token));
    }
    headers
}

/// Links this tool to a Plex account with the PIN flow and saves the token.
///
/// Returns `None` when the user does not finish within the polling window.
pub(crate) fn authenticate(token_path: &Path) -> Result<Option<String>> {
    println!("Requesting a link code from Plex...");
    let headers = plex_tv_headers(None);
    let pins_url = format!("{PLEX_TV}/pins");
    let raw = send_with_retries(
        &HttpRequest {
            method: Method::Post,
            url: &pins_url,
            headers: &headers,
            query: &[],
        },
        &RetryPolicy::ONCE,
    )
    .map_err(|err| anyhow!(err))
    .context("failed to request a Plex PIN")?;
    let (pin_id, code) = parse_pin(&raw).context("unexpected PIN response from Plex")?;

    println!("Visit {LINK_URL} and enter the code: {code}");
    println!("Waiting for you to complete the login...");

    let poll_url = format!("{PLEX_TV}/pins/{pin_id}");
    for _ in 0..POLL_ATTEMPTS {
        thread::sleep(POLL_INTERVAL);
        let raw = send_with_retries(
            &HttpRequest {
                method: Method::Get,
                url: &poll_url,
                headers: &headers,
                query: &[],
            },
            &RetryPolicy::READ,
        )
        .map_err(|err| anyhow!(err))
        .context("failed to poll Plex PIN")?;
        if let Some(token) = parse_auth_token(&raw) {
            save_token(token_path, &token)?;
            log::info!("Saved Plex token to {}", token_path.display());
            return Ok(Some(token));
        }
    }
    Ok(None)
}

/// Best-effort lookup of the account name behind `token`.
pub(crate) fn account_username(token: &str) -> Option<String> {
    let headers = plex_tv_headers(Some(token));
    let url = format!("{PLEX_TV}/user");
    let raw = send_with_retries(
        &HttpRequest {
            method: Method::Get,
            url: &url,
            headers: &headers,
            query: &[],
        },
        &RetryPolicy::ONCE,
    )
    .ok()?;
    parse_username(&raw)
}

fn parse_pin(raw: &str) -> Option<(u64, String)> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let id = parsed.get("id")?.as_u64()?;
    let code = parsed.get("code")?.as_str()?.trim();
    (!code.is_empty()).then(|| (id, code.to_string()))
}

fn parse_auth_token(raw: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let token = parsed.get("authToken")?.as_str()?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn parse_username(raw: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let name = parsed.get("username")?.as_str()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pin_reads_id_and_code() {
        let raw = r#"{"id":123456,"code":"ABCD","authToken":null}"#;
        assert_eq!(parse_pin(raw), Some((123456, "ABCD".to_string())));
    }

    #[test]
    fn pending_pin_has_no_auth_token() {
        assert_eq!(parse_auth_token(r#"{"id":1,"authToken":null}"#), None);
        assert_eq!(
            parse_auth_token(r#"{"id":1,"authToken":"tok-1"}"#),
            Some("tok-1".to_string())
        );
    }

    #[test]
    fn parse_username_ignores_blank_names() {
        assert_eq!(parse_username(r#"{"username":"  "}"#), None);
        assert_eq!(
            parse_username(r#"{"username":"cartoonfan"}"#),
            Some("cartoonfan".to_string())
        );
    }

    #[test]
    fn config_token_takes_priority_over_saved_token() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("token.json");
        save_token(&path, "from-file").expect("save token");

        assert_eq!(
            load_token(Some("from-config"), &path).expect("token"),
            "from-config"
        );
        assert_eq!(load_token(Some("  "), &path).expect("token"), "from-file");
    }

    #[test]
    fn missing_token_is_an_error_and_logout_reports_absence() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("token.json");

        let err = load_token(None, &path).expect_err("no token anywhere");
        assert!(err.to_string().contains("auth"), "unexpected error: {err}");
        assert!(!remove_token(&path).expect("remove"));

        save_token(&path, "abc").expect("save token");
        assert!(remove_token(&path).expect("remove"));
        assert!(!path.exists());
    }
}
