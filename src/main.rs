use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use grouped_slideshow::config::Settings;
use grouped_slideshow::events::HostEvent;
use grouped_slideshow::session::Session;
use grouped_slideshow::store::{MetadataStore, SqliteStore};
use grouped_slideshow::surface::TracingSurface;
use grouped_slideshow::tasks::{host, presenter::SlidePresenter};

#[derive(Debug, Parser)]
#[command(
    name = "grouped-slideshow",
    version,
    about = "slideshow of pictures grouped by day or filter match"
)]
struct Args {
    /// Path to YAML settings
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Picture database to read instead of `database-path`
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,
    /// Deterministic RNG seed for group shuffles and start offsets
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Print the filters known to the picture database and exit
    #[arg(long = "list-filters")]
    list_filters: bool,
    /// Print the next GROUPS groups without presenting them
    #[arg(long = "dry-run", value_name = "GROUPS")]
    dry_run: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        database,
        seed,
        list_filters,
        dry_run,
    } = Args::parse();

    let mut settings = Settings::load(&config)?;
    if let Some(database) = database {
        settings.database_path = database;
    }
    if seed.is_some() {
        settings.shuffle_seed = seed;
    }
    tracing::info!(
        "Loaded settings from {}:\n{:#?}",
        config.display(),
        settings
    );

    let store = SqliteStore::open(&settings.database_path).with_context(|| {
        format!(
            "failed to open picture database {}",
            settings.database_path.display()
        )
    })?;

    if list_filters {
        let names = store.filter_names().context("failed to list filters")?;
        if names.is_empty() {
            println!("(no filters defined)");
        }
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let session = Session::start(store, settings).context("failed to start slideshow")?;

    if let Some(groups) = dry_run {
        return run_dry_run(session, groups, seed);
    }

    let (host_tx, host_rx) = mpsc::channel::<HostEvent>(8);
    let cancel = CancellationToken::new();

    // Ctrl-D dismisses the slideshow like a returning user would
    if io::stdin().is_terminal() {
        let host_tx = host_tx.clone();
        tokio::task::spawn_blocking(move || {
            let mut sink = Vec::new();
            match io::stdin().read_to_end(&mut sink) {
                Ok(_) => tracing::info!("stdin closed; stopping slideshow"),
                Err(err) => tracing::warn!("stdin watcher failed: {err}"),
            }
            let _ = host_tx.blocking_send(HostEvent::ScreensaverDeactivated);
        });
    } else {
        tracing::debug!("stdin is not a terminal; skipping shutdown watcher");
    }

    {
        let host_tx = host_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; stopping slideshow");
            let _ = host_tx.send(HostEvent::ScreensaverDeactivated).await;
        });
    }

    #[cfg(unix)]
    {
        let host_tx = host_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match signal(SignalKind::user_defined1()) {
                Ok(mut sigusr1) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        received = sigusr1.recv() => {
                            if received.is_some() {
                                tracing::info!("SIGUSR1 received; display is powering down");
                                let _ = host_tx.send(HostEvent::DpmsActivated).await;
                            }
                        }
                    }
                }
                Err(err) => tracing::warn!("failed to register SIGUSR1 handler: {err}"),
            }
        });
    }
    drop(host_tx);

    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move { host::run(host_rx, cancel).await.context("host watcher failed") }
    });

    let mut presenter = SlidePresenter::new(session, TracingSurface, cancel.clone());
    let outcome = presenter.run().await.context("slideshow failed");

    // Ensure the watcher stops too
    cancel.cancel();
    match watcher.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("task error: {e:?}"),
        Err(e) => tracing::error!("join error: {e}"),
    }

    outcome
}

fn run_dry_run(
    mut session: Session<SqliteStore>,
    groups: usize,
    seed: Option<u64>,
) -> Result<()> {
    let mode = match session.selector().filter_name() {
        Some(name) => format!("filter {name}"),
        None => "dates".to_string(),
    };
    println!(
        "# slideshow dry run\n# mode: {}\n# effect: {}\n# pool: {}\n# groups: {}\n# seed: {}\n",
        mode,
        session.settings().effect,
        session.selector().pool_len(),
        groups,
        seed.or(session.settings().shuffle_seed)
            .map_or_else(|| "(random)".to_string(), |s| s.to_string())
    );
    if let Some(problem) = session.configuration_problem() {
        println!("# settings problem: {problem}; showing dates instead\n");
    }

    let plan = session.plan(groups).context("failed to plan groups")?;
    for (idx, selection) in plan.iter().enumerate() {
        println!(
            "{:>4}: {} (offset {}, {} pictures{})",
            idx + 1,
            selection.key,
            selection.start_offset,
            selection.group.len(),
            if selection.group.is_burst() { ", burst" } else { "" }
        );
        for picture in &selection.group.pictures {
            println!("        {}  {}", picture.taken_at, picture.path().display());
        }
    }
    Ok(())
}
