mod arc;
mod arranger;
mod candidates;
pub(crate) mod catalog;
mod continuity;
mod selector;
mod tui;


use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cli::{BuildArgs, Cli, Command};
use crate::config::{PlaylistConfig, load_config, resolve_config_path};
use crate::logging;
use crate::paths::{continuity_file_path, token_file_path};
use crate::plex::{self, PlexClient};

use self::arranger::arrange;
use self::candidates::{EpisodeCache, ExcludeSet, SelectionBudget};
use self::catalog::{MediaCatalog, PlaylistItem, PlaylistSink, Pool, Show, replace_playlist};
use self::continuity::ContinuityStore;
use self::selector::{SelectionRequest, select};

pub fn run(cli: Cli) -> Result<()> {
    let config_override = cli.config.as_deref();
    match cli.command {
        Some(Command::Build(args)) => run_build(config_override, &args)?,
        None => run_build(config_override, &BuildArgs::default())?,
        Some(Command::Preview(args)) => run_preview(config_override, &args)?,
        Some(Command::ShowContinuity) => run_show_continuity()?,
        Some(Command::ResetContinuity) => run_reset_continuity()?,
        Some(Command::Auth) => run_auth()?,
        Some(Command::Logout) => run_logout()?,
    }
    Ok(())
}

/// Settings for one run: config values with command-line overrides applied.
#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub(crate) budget: SelectionBudget,
    pub(crate) exclude: ExcludeSet,
    pub(crate) include_live_action: bool,
    pub(crate) shuffle: bool,
    pub(crate) dry_run: bool,
    pub(crate) seed: u64,
}

impl RunOptions {
    pub(crate) fn from_config(playlist: &PlaylistConfig, args: &BuildArgs) -> Result<Self> {
        let budget = SelectionBudget {
            max_total_duration: args.max_duration.unwrap_or(playlist.max_duration),
            min_episode_length: args.min_length.unwrap_or(playlist.min_episode_length),
            max_episode_length: args.max_length.unwrap_or(playlist.max_episode_length),
        }
        .validate()
        .context("invalid playlist duration settings")?;

        Ok(Self {
            budget,
            exclude: ExcludeSet::new(&playlist.exclude_titles),
            include_live_action: playlist.include_live_action && !args.no_live,
            shuffle: playlist.shuffle_order && !args.no_shuffle,
            dry_run: args.dry_run,
            seed: args.seed.unwrap_or_else(rand::random),
        })
    }
}

/// Shows listed from the two configured collections.
#[derive(Debug, Clone, Default)]
pub(crate) struct Pools {
    pub(crate) cartoons: Vec<Show>,
    pub(crate) live_action: Vec<Show>,
}

impl Pools {
    pub(crate) fn load<C: MediaCatalog + ?Sized>(
        catalog: &C,
        playlist: &PlaylistConfig,
        include_live_action: bool,
    ) -> Result<Self> {
        let cartoons = catalog
            .shows_in_collection(&playlist.collections.cartoons, Pool::Cartoon)
            .with_context(|| {
                format!(
                    "failed to list cartoon collection '{}'",
                    playlist.collections.cartoons
                )
            })?;
        let live_action = if include_live_action {
            catalog
                .shows_in_collection(&playlist.collections.live_action, Pool::LiveAction)
                .with_context(|| {
                    format!(
                        "failed to list live-action collection '{}'",
                        playlist.collections.live_action
                    )
                })?
        } else {
            Vec::new()
        };
        log::info!(
            "Found {} cartoon show(s) and {} live-action show(s)",
            cartoons.len(),
            live_action.len()
        );
        Ok(Self {
            cartoons,
            live_action,
        })
    }
}

/// An arranged playlist and the continuity state it would leave behind.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub(crate) items: Vec<PlaylistItem>,
    pub(crate) total_minutes: f64,
    pub(crate) store: ContinuityStore,
}

impl Plan {
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Selects and arranges a playlist against a copy of `store`.
pub(crate) fn plan<C, R>(
    catalog: &C,
    cache: &mut EpisodeCache,
    pools: &Pools,
    options: &RunOptions,
    store: &ContinuityStore,
    rng: &mut R,
) -> Plan
where
    C: MediaCatalog + ?Sized,
    R: Rng + ?Sized,
{
    let mut next_store = store.clone();
    let request = SelectionRequest {
        cartoons: &pools.cartoons,
        live_action: &pools.live_action,
        budget: options.budget,
        exclude: &options.exclude,
        include_live_action: options.include_live_action,
    };
    let selection = select(catalog, cache, &request, &mut next_store, rng);
    let total_minutes = selection.total_minutes;
    let items = if selection.is_empty() {
        Vec::new()
    } else {
        arrange(selection.items, options.shuffle, rng)
    };
    Plan {
        items,
        total_minutes,
        store: next_store,
    }
}

/// Replaces the playlist on the server, then persists the continuity the plan produced.
pub(crate) fn commit_plan<S: PlaylistSink + ?Sized>(
    sink: &S,
    playlist_name: &str,
    plan: &Plan,
    continuity_path: &Path,
) -> Result<()> {
    replace_playlist(sink, playlist_name, &plan.items)
        .with_context(|| format!("failed to create playlist '{playlist_name}'"))?;
    log::info!(
        "Created playlist '{playlist_name}' with {} episodes, total duration {:.1} min",
        plan.items.len(),
        plan.total_minutes
    );
    plan.store.save(continuity_path)?;
    Ok(())
}

#[derive(Debug)]
pub(crate) enum BuildOutcome {
    Empty,
    DryRun(Plan),
    Created(Plan),
}

pub(crate) fn execute_build<P>(
    server: &P,
    playlist: &PlaylistConfig,
    options: &RunOptions,
    store: &ContinuityStore,
    continuity_path: &Path,
) -> Result<BuildOutcome>
where
    P: MediaCatalog + PlaylistSink + ?Sized,
{
    let pools = Pools::load(server, playlist, options.include_live_action)?;
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let mut cache = EpisodeCache::default();
    let plan = plan(server, &mut cache, &pools, options, store, &mut rng);

    if plan.is_empty() {
        log::warn!("No episodes selected. Playlist not created.");
        return Ok(BuildOutcome::Empty);
    }
    if options.dry_run {
        return Ok(BuildOutcome::DryRun(plan));
    }
    commit_plan(server, &playlist.name, &plan, continuity_path)?;
    Ok(BuildOutcome::Created(plan))
}

fn run_build(config_override: Option<&Path>, args: &BuildArgs) -> Result<()> {
    let session = open_session(config_override, args)?;
    log::info!("Selection seed: {}", session.options.seed);

    let outcome = execute_build(
        &session.client,
        &session.playlist,
        &session.options,
        &session.store,
        &session.continuity_path,
    )?;
    match outcome {
        BuildOutcome::Empty => println!("No episodes selected. Playlist not created."),
        BuildOutcome::DryRun(plan) => {
            println!(
                "DRY RUN: Would create playlist '{}' with:",
                session.playlist.name
            );
            print_items(&plan);
        }
        BuildOutcome::Created(plan) => {
            println!(
                "Created playlist '{}' with {} episodes:",
                session.playlist.name,
                plan.items.len()
            );
            print_items(&plan);
        }
    }
    Ok(())
}

fn run_preview(config_override: Option<&Path>, args: &BuildArgs) -> Result<()> {
    let session = open_session(config_override, args)?;
    let pools = Pools::load(
        &session.client,
        &session.playlist,
        session.options.include_live_action,
    )?;
    let message = tui::run_preview(
        &session.client,
        &session.playlist.name,
        &pools,
        &session.options,
        &session.store,
        &session.continuity_path,
    )?;
    println!("{message}");
    Ok(())
}

struct Session {
    client: PlexClient,
    playlist: PlaylistConfig,
    options: RunOptions,
    store: ContinuityStore,
    continuity_path: PathBuf,
}

fn open_session(config_override: Option<&Path>, args: &BuildArgs) -> Result<Session> {
    let config_path = resolve_config_path(config_override)?;
    let config = load_config(&config_path)?;
    logging::init(&config.playlist.name);

    let options = RunOptions::from_config(&config.playlist, args)?;
    let continuity_path = continuity_file_path()?;
    let store = ContinuityStore::load(&continuity_path)?;

    let token = plex::load_token(config.plex.token.as_deref(), &token_file_path()?)?;
    let client = PlexClient::connect(&config.plex.url, &token, &config.plex.tv_library)?;
    match plex::account_username(&token) {
        Some(name) => println!("Logged in as: {name}"),
        None => println!("Could not retrieve logged in user info."),
    }

    Ok(Session {
        client,
        playlist: config.playlist,
        options,
        store,
        continuity_path,
    })
}

fn print_items(plan: &Plan) {
    for item in &plan.items {
        println!(
            "- {} - {} ({:.1} min)",
            item.episode.show, item.episode.title, item.minutes
        );
    }
    println!("Total: {:.1} min", plan.total_minutes);
}

fn run_show_continuity() -> Result<()> {
    let store = ContinuityStore::load(&continuity_file_path()?)?;
    if store.is_empty() {
        println!("No continuity data found.");
        return Ok(());
    }
    println!("Current continuity tracking:");
    let mut current_show = None;
    for (show, base, state) in store.arcs() {
        if current_show != Some(show) {
            println!("{show}:");
            current_show = Some(show);
        }
        println!(
            "  - {base}: Next Part {} of {}",
            state.next_part, state.total_parts
        );
    }
    Ok(())
}

fn run_reset_continuity() -> Result<()> {
    ContinuityStore::default().save(&continuity_file_path()?)?;
    println!("Continuity data reset.");
    Ok(())
}

fn run_auth() -> Result<()> {
    logging::init(plex::PRODUCT);
    let token_path = token_file_path()?;
    match plex::authenticate(&token_path)? {
        Some(token) => {
            println!("Login successful! Token saved.");
            match plex::account_username(&token) {
                Some(name) => println!("Logged in as: {name}"),
                None => println!("Login succeeded but user info could not be retrieved."),
            }
        }
        None => println!("Login timed out."),
    }
    Ok(())
}

fn run_logout() -> Result<()> {
    if plex::remove_token(&token_file_path()?)? {
        println!("Logged out: saved token removed.");
    } else {
        println!("No saved token to delete.");
    }
    Ok(())
}
