mod render;
mod session;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use super::candidates::EpisodeCache;
use super::catalog::{MediaCatalog, PlaylistSink};
use super::continuity::ContinuityStore;
use super::{Plan, Pools, RunOptions, commit_plan};

use self::render::draw_preview;
use self::session::TuiSession;

#[cfg(test)]
pub(crate) use self::render::continuity_lines;

fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

fn plan_status(plan: &Plan) -> String {
    if plan.is_empty() {
        status_error("No episodes fit the current settings. Press r to retry or q to quit.")
    } else {
        status_info(&format!(
            "{} episodes, {:.1} min. Press c to commit.",
            plan.items.len(),
            plan.total_minutes
        ))
    }
}

/// Shows candidate playlists until the user commits one or quits.
///
/// Every reroll starts again from `store`, so only the committed plan's
/// continuity is ever saved. Returns a message to print after the screen closes.
pub(crate) fn run_preview<P>(
    server: &P,
    playlist_name: &str,
    pools: &Pools,
    options: &RunOptions,
    store: &ContinuityStore,
    continuity_path: &Path,
) -> Result<String>
where
    P: MediaCatalog + PlaylistSink + ?Sized,
{
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let mut cache = EpisodeCache::default();
    let mut current = super::plan(server, &mut cache, pools, options, store, &mut rng);
    let mut roll = 1_usize;
    let mut table_state = TableState::default();
    table_state.select((!current.is_empty()).then_some(0));
    let mut status = plan_status(&current);

    let outcome = loop {
        terminal.draw(|frame| {
            draw_preview(
                frame,
                playlist_name,
                &current,
                options,
                roll,
                &mut table_state,
                &status,
            )
        })?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                break "Preview closed. Nothing was changed.".to_string();
            }
            KeyCode::Char('r') => {
                current = super::plan(server, &mut cache, pools, options, store, &mut rng);
                roll += 1;
                table_state.select((!current.is_empty()).then_some(0));
                status = plan_status(&current);
            }
            KeyCode::Char('c') | KeyCode::Enter => {
                if current.is_empty() {
                    status = status_error("Nothing to commit.");
                    continue;
                }
                match commit_plan(server, playlist_name, &current, continuity_path) {
                    Ok(()) => {
                        break format!(
                            "Created playlist '{playlist_name}' with {} episodes, total duration {:.1} min.",
                            current.items.len(),
                            current.total_minutes
                        );
                    }
                    Err(err) => status = status_error(&format!("Commit failed: {err:#}")),
                }
            }
            KeyCode::Up => {
                if let Some(selected) = table_state.selected() {
                    table_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down => {
                if let Some(selected) = table_state.selected()
                    && !current.is_empty()
                {
                    let next = (selected + 1).min(current.items.len().saturating_sub(1));
                    table_state.select(Some(next));
                }
            }
            _ => {}
        }
    };

    terminal.show_cursor()?;
    session.leave()?;
    Ok(outcome)
}
