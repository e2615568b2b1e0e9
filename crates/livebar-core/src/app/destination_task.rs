//! DestinationTask - 1 subreddit 分の更新ループ
//!
//! fetch → render sidebar → publish sidebar → render wiki → publish wiki → sleep,
//! until shutdown or until the credentials are rejected.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::record::observe_total;
use super::retry::{Operation, RetryPolicy};
use super::shutdown::ShutdownSignal;
use crate::domain::{
    DestinationState, ErrorKind, Result, StreamRecord, TaskPhase, rank_by_viewers, total_viewers,
};
use crate::ports::{Clock, DocumentStore, SettingsStore, StreamDirectory};
use crate::render::{WIKI_EDIT_REASON, WikiContext, fit_sidebar, format_timestamp, render_wiki};

/// Collaborators shared by every destination task.
#[derive(Clone)]
pub struct TaskServices {
    pub directory: Arc<dyn StreamDirectory>,
    pub documents: Arc<dyn DocumentStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
    pub retry: RetryPolicy,
    /// Sleep between cycles.
    pub delay: Duration,
    /// Account name shown on the wiki page.
    pub username: String,
}

/// What one completed cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub streams: usize,
    pub total_viewers: u64,
    /// Entries placed in the sidebar; `None` when the sidebar was left untouched.
    pub sidebar_count: Option<usize>,
    pub new_maximum: bool,
}

pub struct DestinationTask {
    state: DestinationState,
    services: TaskServices,
    index_ready: bool,
    phase_tx: watch::Sender<TaskPhase>,
}

impl DestinationTask {
    pub fn new(state: DestinationState, services: TaskServices) -> Self {
        let (phase_tx, _) = watch::channel(TaskPhase::Idle);
        Self {
            state,
            services,
            index_ready: false,
            phase_tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn state(&self) -> &DestinationState {
        &self.state
    }

    /// Follows the task's phase changes.
    pub fn subscribe(&self) -> watch::Receiver<TaskPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: TaskPhase) {
        self.phase_tx.send_replace(phase);
    }

    /// Runs cycles until shutdown or an authorization failure. Returns the
    /// terminal phase.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> TaskPhase {
        let name = self.state.name.clone();
        info!(subreddit = %name, "Destination task started");

        let terminal = loop {
            if shutdown.is_requested() {
                break TaskPhase::Stopped;
            }

            info!(subreddit = %name, "Beginning update");
            match self.run_cycle(&mut shutdown).await {
                Ok(report) => info!(
                    subreddit = %name,
                    streams = report.streams,
                    total_viewers = report.total_viewers,
                    "Completed update"
                ),
                Err(e) => match e.kind() {
                    ErrorKind::Shutdown => break TaskPhase::Stopped,
                    ErrorKind::Unauthorized => {
                        error!(subreddit = %name, error = %e, "Credentials rejected, stopping task");
                        break TaskPhase::Aborted;
                    }
                    ErrorKind::Rejected | ErrorKind::Permanent | ErrorKind::Transient => {
                        warn!(subreddit = %name, error = %e, "Skipping the rest of this cycle");
                    }
                },
            }

            self.set_phase(TaskPhase::Sleeping);
            if !shutdown.sleep(self.services.delay).await {
                break TaskPhase::Stopped;
            }
            self.set_phase(TaskPhase::Idle);
        };

        info!(subreddit = %name, phase = ?terminal, "Destination task finished");
        self.set_phase(terminal);
        terminal
    }

    /// One fetch → publish pass, without the trailing sleep.
    pub async fn run_cycle(&mut self, shutdown: &mut ShutdownSignal) -> Result<CycleReport> {
        self.set_phase(TaskPhase::Fetching);
        let streams = self.fetch_streams(shutdown).await?;

        self.set_phase(TaskPhase::RenderingSidebar);
        let sidebar_count = self.update_sidebar(&streams, shutdown).await?;

        self.set_phase(TaskPhase::RenderingWiki);
        let total = total_viewers(&streams);
        let now = self.services.clock.now();
        let update = observe_total(&mut self.state, total, now);
        if update.changed() {
            info!(subreddit = %self.state.name, total, "New viewer record");
            self.persist().await;
        }
        let page = render_wiki(
            &streams,
            &WikiContext {
                state: &self.state,
                username: &self.services.username,
                delay_secs: self.services.delay.as_secs(),
                updated_at: &format_timestamp(now),
            },
        );

        self.set_phase(TaskPhase::PublishingWiki);
        let documents = Arc::clone(&self.services.documents);
        let name = self.state.name.clone();
        let wiki = self.state.wiki_page_id.clone();
        self.services
            .retry
            .run(Operation::PublishWiki, &name, shutdown, || {
                documents.write_wiki_page(&name, &wiki, &page, WIKI_EDIT_REASON)
            })
            .await?;
        info!(subreddit = %name, "Wiki update complete");

        Ok(CycleReport {
            streams: streams.len(),
            total_viewers: total,
            sidebar_count,
            new_maximum: update.maximum,
        })
    }

    /// Ranked streams for every configured game, labelled with display names.
    async fn fetch_streams(&mut self, shutdown: &mut ShutdownSignal) -> Result<Vec<StreamRecord>> {
        let directory = Arc::clone(&self.services.directory);
        let retry = self.services.retry.clone();
        let name = self.state.name.clone();

        if !self.index_ready {
            let mut index = self.state.game_ids.clone().unwrap_or_default();
            let names = index.missing_names(&self.state.format);
            if !names.is_empty() {
                let mapping = retry
                    .run(Operation::FetchStreams, &name, shutdown, || {
                        directory.resolve_game_ids(&names)
                    })
                    .await?;
                info!(
                    subreddit = %name,
                    requested = names.len(),
                    resolved = mapping.len(),
                    "Resolved game ids"
                );
                index.extend(mapping);
                self.state.game_ids = Some(index);
                self.persist().await;
            }
            self.index_ready = true;
        }

        let index = self.state.game_ids.clone().unwrap_or_default();
        let ids = index.active_ids(&self.state.format);
        if ids.is_empty() {
            warn!(subreddit = %name, "No configured game has a provider id");
            return Ok(Vec::new());
        }

        let mut streams = retry
            .run(Operation::FetchStreams, &name, shutdown, || {
                directory.list_streams(&ids)
            })
            .await?;

        for stream in &mut streams {
            match index.name_of(&stream.game) {
                Some(game) => stream.game = game.to_string(),
                None => warn!(
                    subreddit = %name,
                    game_id = %stream.game,
                    "Could not find a game name for game id"
                ),
            }
        }
        rank_by_viewers(&mut streams);

        let games = self
            .state
            .format
            .keys()
            .map(|g| format!("{g:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        info!(subreddit = %name, count = streams.len(), games = %games, "Fetched streams");
        Ok(streams)
    }

    /// Fits the ranked list into the sidebar and publishes it.
    async fn update_sidebar(
        &self,
        streams: &[StreamRecord],
        shutdown: &mut ShutdownSignal,
    ) -> Result<Option<usize>> {
        let documents = Arc::clone(&self.services.documents);
        let retry = self.services.retry.clone();
        let name = self.state.name.clone();

        let current = retry
            .run(Operation::ReadSidebar, &name, shutdown, || {
                documents.get_description(&name)
            })
            .await?;

        let fit = fit_sidebar(
            &current,
            streams,
            self.state.top_cut,
            &self.state.format,
            documents.max_description_len(),
        );
        if !fit.region_found {
            warn!(subreddit = %name, "Sidebar has no stream list markers, leaving it untouched");
            return Ok(None);
        }
        if !fit.fits {
            warn!(
                subreddit = %name,
                length = fit.document.len(),
                "Sidebar is over the length limit even without streams, leaving it untouched"
            );
            return Ok(None);
        }
        if fit.count < self.state.top_cut.min(streams.len()) {
            info!(subreddit = %name, count = fit.count, "Sidebar too long, showing fewer streams");
        }

        self.set_phase(TaskPhase::PublishingSidebar);
        retry
            .run(Operation::PublishSidebar, &name, shutdown, || {
                documents.set_description(&name, &fit.document)
            })
            .await?;
        info!(subreddit = %name, count = fit.count, "Sidebar update complete");
        Ok(Some(fit.count))
    }

    /// Persistence failures are logged; the in-memory state stays authoritative.
    async fn persist(&self) {
        if let Err(e) = self.services.settings.save_destination(&self.state).await {
            error!(subreddit = %self.state.name, error = %e, "Failed to save settings");
        }
    }
}
