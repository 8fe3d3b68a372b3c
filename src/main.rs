//! stream-saver - gated terminal client for a video extraction backend
//!
//! Unlock with the access code, paste a link, pick a format.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use stream_saver::core::app::App;
use stream_saver::core::launcher::{BrowserLauncher, DownloadLauncher, FileLauncher};
use stream_saver::error::StreamSaverError;
use stream_saver::storage::config;
use stream_saver::storage::kv::KvStore;
use stream_saver::types::{DownloadMode, MenuItem, PlatformTag, Screen};
use stream_saver::ui::{prompt, render};
use stream_saver::utils::paths::{ensure_app_dirs, get_state_path, resolve_download_dir};

const LOGOUT_COMMAND: &str = ":logout";

/// Gated client for a social-media video extraction backend.
#[derive(Parser, Debug)]
#[command(name = "stream-saver")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Video link to analyze right away
    url: Option<String>,

    /// Backend base URL (overrides config)
    #[arg(long)]
    backend: Option<String>,

    /// Access code for a non-interactive unlock attempt
    #[arg(long)]
    code: Option<String>,

    /// Save downloads into the download directory instead of opening them
    #[arg(long)]
    save: bool,

    /// Log out and exit
    #[arg(long)]
    logout: bool,

    /// Edit the configuration file
    #[arg(short, long)]
    edit: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_error(e: &StreamSaverError) {
    eprintln!("{} {}", "Error:".red(), e);
}

/// Determine initial screen from session state and CLI options
fn determine_initial_screen(app: &App, cli: &Cli) -> Screen {
    if !app.is_authenticated() {
        return Screen::Locked;
    }
    if cli.url.is_some() {
        return Screen::Analyze;
    }
    Screen::Idle
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);
    debug!(?cli, "CLI arguments parsed");

    // Ensure app directories exist
    ensure_app_dirs().await?;

    // Handle --edit flag
    if cli.edit {
        let cfg = config::load_config().await?;
        config::edit_config(&cfg.editor).await?;
        return Ok(());
    }

    // Load config, then apply CLI overrides
    let mut cfg = config::load_config().await?;
    if let Some(ref backend) = cli.backend {
        cfg.backend_url = backend.trim_end_matches('/').to_string();
    }
    if cli.save {
        cfg.download_mode = DownloadMode::Save;
    }

    let launcher: Arc<dyn DownloadLauncher> = match cfg.download_mode {
        DownloadMode::Open => Arc::new(BrowserLauncher::new()),
        DownloadMode::Save => Arc::new(FileLauncher::new(resolve_download_dir(&cfg.download_dir))),
    };

    let mut app = App::restore(cfg, KvStore::new(get_state_path()), launcher).await?;
    info!(backend = %app.config().backend_url, "stream-saver starting");

    if cli.logout {
        app.logout().await?;
        println!("{}", "Logged out.".green());
        return Ok(());
    }

    if let Some(ref url) = cli.url {
        app.set_url(url);
    }

    // Screen state machine
    let mut pending_code = cli.code.clone();
    let mut screen = determine_initial_screen(&app, &cli);

    while screen != Screen::Exit {
        match screen {
            Screen::Locked => {
                println!("{}", "🔒 Restricted Access".bold());
                let code = match pending_code.take() {
                    Some(code) => code,
                    None => match prompt::prompt_code() {
                        Some(code) if !code.is_empty() => code,
                        _ => {
                            screen = Screen::Exit;
                            continue;
                        }
                    },
                };

                match app.unlock(&code).await {
                    Ok(()) => {
                        println!("{}", "Unlocked.".green());
                        screen = if app.url().is_empty() {
                            Screen::Idle
                        } else {
                            Screen::Analyze
                        };
                    }
                    Err(StreamSaverError::AuthRejected) => {
                        eprintln!("{}", "Incorrect Access Code.".red());
                    }
                    Err(e) => {
                        print_error(&e);
                        screen = Screen::Exit;
                    }
                }
            }

            Screen::Idle => {
                println!("{}", render::connectivity_badge(app.connectivity()));
                let Some(input) = prompt::prompt_url(app.url()) else {
                    screen = Screen::Exit;
                    continue;
                };

                if input.is_empty() {
                    screen = Screen::Exit;
                    continue;
                }
                if input == LOGOUT_COMMAND {
                    app.logout().await?;
                    println!("{}", "Logged out.".dimmed());
                    screen = Screen::Locked;
                    continue;
                }

                let platform = app.set_url(&input);
                if platform != PlatformTag::None {
                    println!("{} {}", "Platform:".dimmed(), render::platform_label(platform));
                }
                screen = Screen::Analyze;
            }

            Screen::Analyze => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                spinner.set_message("Analyzing...");
                spinner.enable_steady_tick(Duration::from_millis(100));

                let outcome = app.analyze().await;
                spinner.finish_and_clear();

                screen = match outcome {
                    Ok(Some(result)) => {
                        let thumbnail = app.thumbnail().await;
                        render::print_result(&result, &thumbnail);
                        Screen::Choose
                    }
                    Ok(None) => Screen::Idle,
                    Err(StreamSaverError::Locked) => Screen::Locked,
                    Err(e) => {
                        print_error(&e);
                        Screen::Idle
                    }
                };
            }

            Screen::Choose => {
                let Some(result) = app.result() else {
                    screen = Screen::Idle;
                    continue;
                };

                let state = app.request_state();
                let mut items = render::format_menu(&result, state.downloading_format_id.as_deref());
                items.push(MenuItem {
                    label: "← New link".dimmed().to_string(),
                    value: String::new(),
                });

                match prompt::select(&items, "Select format") {
                    Some(format_id) if !format_id.is_empty() => match app.select_format(&format_id) {
                        Ok(true) => println!("{} {}", "⬇ Download started:".green(), format_id),
                        Ok(false) => println!("{}", "A download is already starting, hold on.".yellow()),
                        Err(e) => print_error(&e),
                    },
                    _ => screen = Screen::Idle,
                }
            }

            Screen::Exit => break,
        }
    }

    Ok(())
}
