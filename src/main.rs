// musiclist - browse and search a plain-text music list in the terminal
// Sections open into subsections and tracks; Enter plays, / searches

use anyhow::{Context, Result};
use clap::Parser;
#[cfg(feature = "tui")]
use musiclist::{
    host::{LocalSession, NowPlaying, Playback},
    ui::{App, AppState},
};
use musiclist::{Config, MusicLibrary, MusicList, SearchOutcome};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "musiclist")]
#[command(about = "A collapsible, searchable music list for a plain-text playlist")]
struct Args {
    /// Playlist file (defaults to the configured path, usually musiclist.txt)
    #[arg(value_name = "PLAYLIST")]
    playlist: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the parsed hierarchy as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Print the rows a search would show and exit
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Enable developer logging (debug level everywhere)
    #[arg(long)]
    dev: bool,
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    // Daily rotating file appender; the terminal belongs to the UI
    let file_appender = tracing_appender::rolling::daily(log_dir, "musiclist.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if dev { "debug" } else { "info,musiclist=debug" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("Dev mode: debug logs in {}", log_dir.display());
    }

    Ok(guard)
}

#[cfg(all(feature = "tui", feature = "audio"))]
fn build_playback() -> Box<dyn Playback> {
    match musiclist::host::AudioPlayer::new(0.7) {
        Ok(player) => Box::new(player),
        Err(e) => {
            tracing::warn!("No audio output ({}), falling back to announce-only playback", e);
            Box::new(NowPlaying::new())
        }
    }
}

#[cfg(all(feature = "tui", not(feature = "audio")))]
fn build_playback() -> Box<dyn Playback> {
    Box::new(NowPlaying::new())
}

fn print_search(list: &mut MusicList, query: &str) {
    match list.search(query) {
        SearchOutcome::Results(_) => {
            for row in list.rows() {
                println!("{}{}", "  ".repeat(row.depth), list.label(row));
            }
        }
        SearchOutcome::NoMatch => println!("No matches for '{}'", query),
        SearchOutcome::Cleared => println!("Empty query"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load config - falls back to defaults if missing
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let _log_guard = init_logging(&config.log_dir, args.dev)?;
    info!("musiclist starting up");

    // CLI override is not written back to the config
    let playlist_path = args
        .playlist
        .clone()
        .unwrap_or_else(|| config.playlist_path.clone());
    let library = MusicLibrary::load(&playlist_path)
        .with_context(|| format!("Failed to load playlist {}", playlist_path.display()))?;

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&library.snapshot())?);
        return Ok(());
    }

    let mut music = MusicList::new(library);

    if let Some(query) = &args.search {
        print_search(&mut music, query);
        return Ok(());
    }

    run_tui(config, music)?;

    info!("musiclist shutting down");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_tui(config: Config, music: MusicList) -> Result<()> {
    let state = AppState::new(config, music, build_playback(), Box::new(LocalSession::new()));
    let mut app = App::new(state)?;
    app.run()
}

#[cfg(not(feature = "tui"))]
fn run_tui(_config: Config, _music: MusicList) -> Result<()> {
    anyhow::bail!("built without the `tui` feature; use --dump or --search")
}
