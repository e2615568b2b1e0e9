use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use livebar_core::app::{DestinationTask, RetryPolicy, Scheduler, TaskServices};
use livebar_core::config::{self, ConfigError, FileSettingsStore, Settings};
use livebar_core::impls::{RedditConfig, RedditDocumentStore, ReqwestTransport};
use livebar_core::ports::{Clock, HttpTransport, SystemClock};
use livebar_core::provider::{ProviderClient, ProviderConfig};

/// Keeps subreddit sidebars and wiki pages in sync with who is live on Twitch.
#[derive(Debug, Parser)]
#[command(name = "livebar", version)]
struct Args {
    /// Settings file (read at startup, rewritten when records change)
    #[arg(long, env = "LIVEBAR_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Validate the settings file and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("livebar_core=info,livebar_cli=info")),
        )
        .init();

    let args = Args::parse();

    let settings = match config::load(&args.config) {
        Ok(settings) => settings,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };
    if args.check {
        println!("bot configuration is valid");
        return ExitCode::SUCCESS;
    }

    match run(args, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn report_config_error(e: &ConfigError) {
    eprintln!("fatal error: could not configure bot properly");
    match e.issues() {
        [] => eprintln!("    note: {e}"),
        issues => {
            for issue in issues {
                eprintln!("    note: {issue}");
            }
        }
    }
}

async fn run(args: Args, settings: Settings) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::new(&settings.user_agent).context("failed to build HTTP client")?,
    );

    let provider = Arc::new(ProviderClient::new(
        Arc::clone(&transport),
        Arc::clone(&clock),
        ProviderConfig::new(&settings.twitch_client_id, &settings.twitch_client_secret),
    ));
    // fail fast on bad Twitch credentials instead of once per subreddit
    provider
        .ensure_token()
        .await
        .context("could not obtain a Twitch access token")?;

    let documents = Arc::new(RedditDocumentStore::new(
        Arc::clone(&transport),
        Arc::clone(&clock),
        RedditConfig::new(
            &settings.client,
            &settings.secret,
            &settings.username,
            &settings.password,
        ),
    ));
    let store = Arc::new(FileSettingsStore::new(&args.config, settings.clone()));

    let services = TaskServices {
        directory: provider,
        documents,
        settings: store,
        clock,
        retry: RetryPolicy::default_v1(),
        delay: settings.cycle_delay(),
        username: settings.username.clone(),
    };
    let tasks = settings
        .subreddits
        .iter()
        .cloned()
        .map(|state| DestinationTask::new(state, services.clone()))
        .collect();

    let scheduler = Scheduler::spawn(tasks);
    info!(
        subreddits = scheduler.len(),
        delay_secs = settings.delay,
        "livebar running, press Ctrl-C to stop"
    );

    let all_stopped = tokio::select! {
        result = wait_for_signal() => {
            result?;
            false
        }
        () = scheduler.wait_all_finished() => true,
    };

    if all_stopped {
        for (name, phase) in scheduler.join().await {
            warn!(subreddit = %name, ?phase, "Task finished");
        }
        anyhow::bail!("every subreddit task has stopped, exiting");
    }

    info!("Shutdown requested, waiting for tasks");
    for (name, phase) in scheduler.shutdown_and_join().await {
        info!(subreddit = %name, ?phase, "Task finished");
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl-C")?,
        _ = term.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_to_config_json() {
        let args = Args::try_parse_from(["livebar"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert!(!args.check);
    }

    #[test]
    fn config_path_and_check_flag() {
        let args = Args::try_parse_from(["livebar", "--config", "/etc/livebar.json", "--check"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/livebar.json"));
        assert!(args.check);
    }
}
