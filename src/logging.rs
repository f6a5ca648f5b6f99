use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Builder, Env, Target};

use crate::paths::{log_dir, log_file_name};

/// Routes `log` output to today's log file for `playlist_name`.
///
/// Falls back to stderr when the file cannot be opened. `RUST_LOG`
/// overrides the default `info` filter.
pub fn init(playlist_name: &str) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        )
    });

    match open_log_file(playlist_name) {
        Ok((file, path)) => {
            builder.target(Target::Pipe(Box::new(file)));
            builder.write_style(env_logger::WriteStyle::Never);
            if builder.try_init().is_ok() {
                log::debug!("Logging to {}", path.display());
            }
        }
        Err(err) => {
            eprintln!("Warning: {err:#}; logging to stderr.");
            let _ = builder.try_init();
        }
    }
}

fn open_log_file(playlist_name: &str) -> Result<(File, PathBuf)> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let date = Local::now().format("%Y-%m-%d").to_string();
    let path = dir.join(log_file_name(playlist_name, &date));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    Ok((file, path))
}
