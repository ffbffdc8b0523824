//! mflix - movies in your terminal
//!
//! Browse a catalog, keep a list of favorites and pick up where you left off.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use mflix::core::catalog::{self, CatalogClient};
use mflix::core::player::{self, format_timestamp};
use mflix::core::progress::{ProgressTracker, resume_offset};
use mflix::library::Library;
use mflix::logging::init_logging;
use mflix::storage::backend::{FileStore, KeyValueStore, MemoryStore};
use mflix::storage::config;
use mflix::types::{
    AppState, HistoryEntry, MenuItem, MovieAction, MovieRecord, SearchAction, SortOrder,
};
use mflix::ui::selector::create_selector;
use mflix::utils::paths::{ensure_app_dirs, get_data_dir};

/// Movies in your terminal, with a list that remembers and playback that resumes.
#[derive(Parser, Debug)]
#[command(name = "mflix")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Search the catalog by title, genre, cast, director or industry
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    /// Only show movies of this genre
    #[arg(short, long)]
    genre: Option<String>,

    /// Catalog order
    #[arg(short, long, value_enum, default_value_t = SortOrder::Featured)]
    sort: SortOrder,

    /// Open My List
    #[arg(long)]
    list: bool,

    /// Open Continue Watching
    #[arg(long)]
    history: bool,

    /// Forget all watch history and exit
    #[arg(long)]
    clear_history: bool,

    /// Keep favorites and history for this session only
    #[arg(long)]
    ephemeral: bool,

    /// Limit catalog rows
    #[arg(short, long)]
    limit: Option<usize>,

    /// Edit the configuration file
    #[arg(short, long)]
    edit: bool,

    /// More logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

/// Format a movie for display in selector
fn format_movie_label(movie: &MovieRecord, library: &Library) -> String {
    let mut label = movie.title();
    if let Some(year) = movie.year() {
        label.push_str(&format!(" {}", format!("({})", year).dimmed()));
    }
    if let Some(rating) = movie.rating() {
        label.push_str(&format!(" {}", format!("★ {}", rating).yellow()));
    }
    if library.favorites.contains(&movie.movie_id) {
        label.push_str(&format!(" {}", "♥".red()));
    }
    label
}

fn format_history_label(entry: &HistoryEntry, library: &Library) -> String {
    format!(
        "{} {}",
        format_movie_label(&entry.movie, library),
        format!(
            "[{:.0}% · {}]",
            entry.progress,
            format_timestamp(entry.current_time)
        )
        .cyan()
    )
}

/// Determine initial state from CLI options
fn determine_initial_state(cli: &Cli) -> AppState {
    if cli.list {
        return AppState::MyList;
    }
    if cli.history {
        return AppState::ContinueWatching;
    }
    if !cli.query.is_empty() || cli.genre.is_some() {
        return AppState::Browse;
    }
    AppState::Init
}

fn movie_actions(
    movie: &MovieRecord,
    library: &Library,
    completed_percent: f64,
) -> Vec<MenuItem<MovieAction>> {
    let resume = resume_offset(library.history.get_progress(&movie.movie_id), completed_percent);
    let play_label = match resume {
        Some(secs) => format!("▶ Resume from {}", format_timestamp(secs)),
        None => "▶ Play".to_string(),
    };
    let list_label = if library.favorites.contains(&movie.movie_id) {
        "♡ Remove from My List"
    } else {
        "♥ Add to My List"
    };

    let mut actions = vec![
        MenuItem { label: play_label, value: MovieAction::Play },
        MenuItem { label: list_label.into(), value: MovieAction::ToggleList },
    ];
    if library.history.get_progress(&movie.movie_id).is_some() {
        actions.push(MenuItem {
            label: "✕ Remove from history".into(),
            value: MovieAction::RemoveFromHistory,
        });
    }
    actions.push(MenuItem { label: "← Back".into(), value: MovieAction::Back });
    actions
}

fn search_actions(library: &Library) -> Vec<MenuItem<SearchAction>> {
    let mut actions = vec![MenuItem { label: "🔍 New search".into(), value: SearchAction::New }];
    actions.extend(library.searches.list().into_iter().map(|term| MenuItem {
        label: format!("↺ {}", term),
        value: SearchAction::Recent(term),
    }));
    if !library.searches.is_empty() {
        actions.push(MenuItem {
            label: "✕ Clear recent searches".into(),
            value: SearchAction::ClearRecent,
        });
    }
    actions.push(MenuItem { label: "← Back".into(), value: SearchAction::Back });
    actions
}

/// "2h 15m" from a minute count
fn format_minutes(minutes: u64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    // Ensure app directories exist
    ensure_app_dirs().await?;

    // Handle --edit flag
    if cli.edit {
        let cfg = config::load_config().await?;
        config::edit_config(&cfg.editor).await?;
        return Ok(());
    }

    let cfg = config::load_config().await?;

    let backend: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::new(get_data_dir()))
    };
    let library = Library::open(backend, cfg.history_capacity);

    if cli.clear_history {
        library.history.clear_history();
        println!("{}", "Watch history cleared.".green());
        return Ok(());
    }

    let client = CatalogClient::new(&cfg.catalog_url);
    let selector = create_selector(cfg.selector);
    let limit = cli.limit.unwrap_or(cfg.limit);
    let mut query = cli.query.join(" ");

    // State machine
    let mut state = determine_initial_state(&cli);
    let mut origin = AppState::Init;
    let mut selected_movie: Option<MovieRecord> = None;
    let mut catalog_cache: Option<Vec<MovieRecord>> = None;

    while state != AppState::Exit {
        match state {
            AppState::Init => {
                let menu_items = vec![
                    MenuItem { label: "🎬 Browse movies".into(), value: AppState::Browse },
                    MenuItem { label: "🔍 Search".into(), value: AppState::Search },
                    MenuItem {
                        label: format!("❤ My List ({})", library.favorites.len()),
                        value: AppState::MyList,
                    },
                    MenuItem {
                        label: format!(
                            "▶ Continue Watching ({}, {} of movies)",
                            library.history.len(),
                            format_minutes(library.history.total_runtime_minutes())
                        ),
                        value: AppState::ContinueWatching,
                    },
                ];

                state = selector.select(&menu_items, "mflix").unwrap_or(AppState::Exit);
                if state == AppState::Browse {
                    query.clear();
                }
            }

            AppState::Search => {
                let choice = if library.searches.is_empty() {
                    Some(SearchAction::New)
                } else {
                    selector.select(&search_actions(&library), "Search")
                };

                state = match choice {
                    Some(SearchAction::New) => {
                        let input: String = dialoguer::Input::new()
                            .with_prompt("Search movies")
                            .allow_empty(true)
                            .interact_text()?;
                        query = input.trim().to_string();
                        if query.is_empty() { AppState::Init } else { AppState::Browse }
                    }
                    Some(SearchAction::Recent(term)) => {
                        query = term;
                        AppState::Browse
                    }
                    Some(SearchAction::ClearRecent) => {
                        library.searches.clear();
                        println!("{}", "Recent searches cleared.".dimmed());
                        AppState::Search
                    }
                    Some(SearchAction::Back) | None => AppState::Init,
                };
            }

            AppState::Browse => {
                if catalog_cache.is_none() {
                    let spinner = ProgressBar::new_spinner();
                    let style = ProgressStyle::default_spinner().template("{spinner:.green} {msg}");
                    if let Ok(style) = style {
                        spinner.set_style(style);
                    }
                    spinner.set_message("Loading catalog...");
                    spinner.enable_steady_tick(Duration::from_millis(100));
                    catalog_cache = Some(client.fetch_all_movies().await);
                    spinner.finish_and_clear();
                }
                let movies = catalog_cache.as_deref().unwrap_or_default();

                let mut shown = match cli.genre.as_deref() {
                    Some(genre) => catalog::filter_by_genre(movies, genre),
                    None => movies.to_vec(),
                };
                if !query.is_empty() {
                    shown = catalog::search_movies(&shown, &query);
                }
                shown = catalog::sort_movies(&shown, cli.sort);
                shown.truncate(limit);

                if shown.is_empty() {
                    println!("{}", "No movies match.".yellow());
                    state = if query.is_empty() { AppState::Exit } else { AppState::Search };
                    continue;
                }

                let menu_items: Vec<MenuItem<MovieRecord>> = shown
                    .into_iter()
                    .map(|m| MenuItem {
                        label: format_movie_label(&m, &library),
                        value: m,
                    })
                    .collect();

                origin = AppState::Browse;
                selected_movie = selector.select(&menu_items, "Select Movie");
                if let Some(movie) = selected_movie.as_ref().filter(|_| !query.is_empty()) {
                    library.searches.record(&movie.title());
                }
                state = if selected_movie.is_some() { AppState::Movie } else { AppState::Init };
            }

            AppState::MyList => {
                let movies = library.favorites.list();
                if movies.is_empty() {
                    println!("{}", "My List is empty.".yellow());
                    state = AppState::Init;
                    continue;
                }

                let menu_items: Vec<MenuItem<MovieRecord>> = movies
                    .into_iter()
                    .map(|m| MenuItem {
                        label: format_movie_label(&m, &library),
                        value: m,
                    })
                    .collect();

                origin = AppState::MyList;
                selected_movie = selector.select(&menu_items, "My List");
                state = if selected_movie.is_some() { AppState::Movie } else { AppState::Init };
            }

            AppState::ContinueWatching => {
                let entries = library.history.list();
                if entries.is_empty() {
                    println!("{}", "No watch history yet.".yellow());
                    state = AppState::Init;
                    continue;
                }

                let menu_items: Vec<MenuItem<MovieRecord>> = entries
                    .iter()
                    .map(|e| MenuItem {
                        label: format_history_label(e, &library),
                        value: e.movie.clone(),
                    })
                    .collect();

                origin = AppState::ContinueWatching;
                selected_movie = selector.select(&menu_items, "Continue Watching");
                state = if selected_movie.is_some() { AppState::Movie } else { AppState::Init };
            }

            AppState::Movie => {
                let Some(ref movie) = selected_movie else {
                    state = origin;
                    continue;
                };

                let actions = movie_actions(movie, &library, cfg.completed_percent);
                match selector.select(&actions, &movie.title()) {
                    Some(MovieAction::Play) => state = AppState::Play,
                    Some(MovieAction::ToggleList) => {
                        if library.favorites.toggle(movie) {
                            println!("{} {}", "Added to My List:".green(), movie.title());
                        } else {
                            println!("{} {}", "Removed from My List:".dimmed(), movie.title());
                        }
                    }
                    Some(MovieAction::RemoveFromHistory) => {
                        library.history.remove_from_history(&movie.movie_id);
                        println!("{} {}", "Removed from history:".dimmed(), movie.title());
                    }
                    Some(MovieAction::Back) | None => state = origin,
                }
            }

            AppState::Play => {
                let Some(movie) = selected_movie.take() else {
                    state = origin;
                    continue;
                };

                let start_at = resume_offset(
                    library.history.get_progress(&movie.movie_id),
                    cfg.completed_percent,
                );
                let tracker = ProgressTracker::new(
                    &library.history,
                    movie.clone(),
                    Duration::from_secs(cfg.save_interval_secs),
                );

                println!("{} {}", "Playing:".dimmed(), movie.title());
                if let Err(e) = player::play(start_at, tracker).await {
                    eprintln!("{} {}", "Error:".red(), e);
                }

                selected_movie = Some(movie);
                state = AppState::Movie;
            }

            AppState::Exit => break,
        }
    }

    Ok(())
}
