use std::path::PathBuf;

use anyhow::{Context, Result};

const APP_DIR: &str = "saturday-morning";

pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("unable to resolve config directory")?;
    Ok(base.join(APP_DIR))
}

pub fn default_config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.yaml"))
}

pub fn continuity_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("continuity.json"))
}

pub fn token_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("token.json"))
}

pub fn log_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("unable to resolve data directory")?;
    Ok(base.join(APP_DIR).join("logs"))
}

/// `<Playlist_Name>_<date>.log`, with emoji dropped and any other
/// non-alphanumeric character turned into `_`.
pub fn log_file_name(playlist_name: &str, date: &str) -> String {
    let safe_name = playlist_name
        .chars()
        .filter(|ch| !is_emoji(*ch))
        .map(|ch| if ch.is_alphanumeric() { ch } else { '_' })
        .collect::<String>();
    format!("{safe_name}_{date}.log")
}

// Emoticons, pictographs, transport, flags, dingbats and enclosed characters.
fn is_emoji(ch: char) -> bool {
    matches!(
        u32::from(ch),
        0x1F600..=0x1F64F
            | 0x1F300..=0x1F5FF
            | 0x1F680..=0x1F6FF
            | 0x1F1E0..=0x1F1FF
            | 0x2700..=0x27BF
            | 0x24C2..=0x1F251
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_drops_emoji_and_replaces_separators() {
        assert_eq!(
            log_file_name("📺 Saturday Morning", "2026-10-17"),
            "_Saturday_Morning_2026-10-17.log"
        );
    }

    #[test]
    fn log_file_name_replaces_non_emoji_punctuation() {
        assert_eq!(
            log_file_name("Toons — Live", "2026-10-17"),
            "Toons___Live_2026-10-17.log"
        );
        assert_eq!(
            log_file_name("Toons ✂ Live", "2026-10-17"),
            "Toons__Live_2026-10-17.log"
        );
    }

    #[test]
    fn log_file_name_keeps_non_ascii_letters() {
        assert_eq!(
            log_file_name("Sábado", "2026-10-17"),
            "Sábado_2026-10-17.log"
        );
    }
}
