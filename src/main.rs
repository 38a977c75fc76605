use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use rewards_notify::api::{ApiClient, auth};
use rewards_notify::config::{self, AppConfig};
use rewards_notify::orchestrator::{self, Orchestrator};
use rewards_notify::socket::{SocketClient, SocketEvent};
use rewards_notify::state::NotificationCenter;
use rewards_notify::store::NotificationStore;
use rewards_notify::types::{FrequencyMode, FrequencyPrefs, Notification, QuietHours};

#[derive(Parser)]
#[command(name = "rewards-notify", version, about = "Campus rewards notification center")]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging to debug.log.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notifications.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Follow notifications live over the socket.
    Tail,
    /// Mark one notification read.
    Read {
        id: String,
    },
    /// Mark every notification read.
    ReadAll,
    /// Toggle importance.
    Important {
        id: String,
        /// Clear the flag instead of setting it.
        #[arg(long)]
        off: bool,
    },
    /// Delete a notification.
    Delete {
        id: String,
    },
    /// Free-text search.
    Search {
        query: String,
    },
    /// Show or change delivery preferences.
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Print the current preferences.
    Show,
    /// Configure the daily do-not-disturb window.
    QuietHours {
        /// Window start, `HH:MM`.
        start: String,
        /// Window end, `HH:MM`. May be before start (wraps midnight).
        end: String,
        /// Disable the window instead.
        #[arg(long)]
        off: bool,
    },
    /// Set the delivery cadence: instant, digest, or weekly.
    Frequency {
        mode: String,
        /// Time of day for digest delivery, `HH:MM`.
        #[arg(long)]
        digest_time: Option<String>,
        /// Day of week for weekly delivery.
        #[arg(long)]
        weekly_day: Option<String>,
    },
    /// Reset preferences to server defaults.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    if cli.debug {
        let file = std::fs::File::create("debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    // Install the rustls CryptoProvider before any TLS client is constructed.
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("failed to install default CryptoProvider");

    let config = config::load_config(cli.config.as_deref())?;
    let token = auth::resolve_token()?;
    let api = ApiClient::new(&config.server.base_url, &token);

    match cli.command {
        Commands::List { page, limit } => {
            let limit = limit.unwrap_or(config.defaults.page_limit);
            let mut orchestrator = Orchestrator::new(NotificationStore::new(api));
            let unread = orchestrator.fetch(page, limit).await?;
            for n in orchestrator.notifications() {
                print_row(n);
            }
            println!("-- unread: {}", orchestrator::badge_label(unread));
        }

        Commands::Tail => tail(config, api, token).await?,

        Commands::Read { id } => {
            let mut orchestrator = Orchestrator::new(NotificationStore::new(api));
            orchestrator.mark_as_read(&id).await?;
            touch_marker(&config);
            println!("marked {id} read");
        }

        Commands::ReadAll => {
            let mut orchestrator = Orchestrator::new(NotificationStore::new(api));
            orchestrator.mark_all_as_read().await?;
            touch_marker(&config);
            println!("marked all read");
        }

        Commands::Important { id, off } => {
            let mut orchestrator = Orchestrator::new(NotificationStore::new(api));
            orchestrator.mark_as_important(&id, !off).await?;
            touch_marker(&config);
            println!(
                "{} importance on {id}",
                if off { "cleared" } else { "set" }
            );
        }

        Commands::Delete { id } => {
            let mut orchestrator = Orchestrator::new(NotificationStore::new(api));
            orchestrator.delete_notification(&id).await?;
            touch_marker(&config);
            println!("deleted {id}");
        }

        Commands::Search { query } => {
            let orchestrator = Orchestrator::new(NotificationStore::new(api));
            let hits = orchestrator.search(&query).await?;
            for n in &hits {
                print_row(n);
            }
            println!("-- {} match(es)", hits.len());
        }

        Commands::Prefs { command } => prefs(command, api).await?,
    }

    Ok(())
}

fn print_row(n: &Notification) {
    let marker = if n.read { ' ' } else { '\u{25cf}' };
    let star = if n.is_important { '\u{2605}' } else { ' ' };
    println!(
        "{marker}{star} {} [{}] {} — {} ({})",
        orchestrator::icon_for(n.kind),
        n.id,
        n.title,
        n.message,
        orchestrator::relative_time(n.created_at),
    );
}

fn marker_path(config: &AppConfig) -> PathBuf {
    config
        .sync
        .marker_path
        .clone()
        .unwrap_or_else(config::default_marker_path)
}

/// One-shot commands still notify live sessions on this machine.
fn touch_marker(config: &AppConfig) {
    if config.sync.enabled {
        rewards_notify::state::SyncMarker::new(marker_path(config)).touch();
    }
}

async fn tail(config: AppConfig, api: ApiClient, token: String) -> Result<()> {
    let socket = SocketClient::new(config.server.socket_url(), Some(token));
    let mut events = socket.subscribe();

    let mut center = NotificationCenter::new(api)
        .with_page_limit(config.defaults.page_limit)
        .with_socket(socket);
    if config.sync.enabled {
        center = center
            .with_sync_marker(marker_path(&config))
            .with_sync_poll_interval(Duration::from_millis(config.sync.poll_interval_ms));
    }
    let handle = center.start();
    let mut watch = handle.watch();

    let mut seen: HashSet<String> = HashSet::new();
    let mut primed = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            changed = watch.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = watch.borrow_and_update().clone();
                if snap.loading {
                    continue;
                }
                if !primed {
                    primed = true;
                    seen.extend(snap.notifications.iter().map(|n| n.id.clone()));
                    println!(
                        "{} notification(s), unread: {}",
                        snap.notifications.len(),
                        orchestrator::badge_label(snap.unread_count),
                    );
                    continue;
                }
                for n in &snap.notifications {
                    if seen.insert(n.id.clone())
                        && orchestrator::should_deliver(n, &snap.preferences)
                        && !orchestrator::is_quiet_now(&snap.preferences.quiet_hours)
                    {
                        print_row(n);
                    }
                }
                if let Some(error) = &snap.error {
                    eprintln!("error: {error}");
                }
            }

            event = events.recv() => {
                match event {
                    Ok(SocketEvent::Connected) => eprintln!("socket connected"),
                    Ok(SocketEvent::Disconnected { reason }) => {
                        eprintln!("socket disconnected ({reason}), reconnecting");
                        handle.reconnect_socket();
                    }
                    Ok(SocketEvent::Error(message)) => eprintln!("socket error: {message}"),
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    handle.shutdown();
    Ok(())
}

async fn prefs(command: PrefsCommands, api: ApiClient) -> Result<()> {
    let mut orchestrator = Orchestrator::new(NotificationStore::new(api));
    match command {
        PrefsCommands::Show => {
            orchestrator.fetch_preferences().await?;
            print_prefs(orchestrator.preferences());
        }
        PrefsCommands::QuietHours { start, end, off } => {
            let quiet_hours = QuietHours {
                enabled: !off,
                start_time: start,
                end_time: end,
            };
            orchestrator.set_quiet_hours(&quiet_hours).await?;
            print_prefs(orchestrator.preferences());
        }
        PrefsCommands::Frequency {
            mode,
            digest_time,
            weekly_day,
        } => {
            let mode = match mode.as_str() {
                "instant" => FrequencyMode::Instant,
                "digest" => FrequencyMode::Digest,
                "weekly" => FrequencyMode::Weekly,
                other => bail!("unknown frequency mode {other:?} (instant, digest, weekly)"),
            };
            let frequency = FrequencyPrefs {
                mode,
                digest_time,
                weekly_day,
            };
            orchestrator.set_frequency(&frequency).await?;
            print_prefs(orchestrator.preferences());
        }
        PrefsCommands::Reset => {
            orchestrator.reset_preferences().await?;
            print_prefs(orchestrator.preferences());
        }
    }
    Ok(())
}

fn print_prefs(prefs: &rewards_notify::types::Preferences) {
    println!(
        "in-app: {}",
        if prefs.in_app.enabled { "on" } else { "off" }
    );
    for (kind, enabled) in &prefs.in_app.kinds {
        println!("  {kind}: {}", if *enabled { "on" } else { "off" });
    }
    println!("frequency: {:?}", prefs.frequency.mode);
    if let Some(t) = &prefs.frequency.digest_time {
        println!("  digest time: {t}");
    }
    if let Some(d) = &prefs.frequency.weekly_day {
        println!("  weekly day: {d}");
    }
    let q = &prefs.quiet_hours;
    println!(
        "quiet hours: {} ({} - {})",
        if q.enabled { "on" } else { "off" },
        q.start_time,
        q.end_time,
    );
}
