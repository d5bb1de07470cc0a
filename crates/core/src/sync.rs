//! The per-profile sync orchestrator.
//!
//! One pass walks the provider's ordered endpoint list for one profile:
//! login first, then each due endpoint strictly in sequence — fetch,
//! reconcile, commit — so later endpoints can rely on earlier dictionary
//! state already being in the store. Profiles sync independently of each
//! other; within a profile nothing runs concurrently.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::db::repository::{
    EndpointTimerRepository, ProfileRepository, SyncRunRepository,
};
use crate::db::sqlite::SqliteRepository;
use crate::error::{Result, SyncError};
use crate::models::endpoint::EndpointId;
use crate::models::profile::Profile;
use crate::models::sync::{EndpointOutcome, EndpointStatus, SyncRun, SyncStatus};
use crate::providers::{EndpointAdapter, FetchContext, LoginCoordinator, LoginStore};
use crate::reconcile::{MergeMode, Reconciler};

/// Engine tuning, passed in at construction instead of read from globals.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Overall deadline for one adapter fetch; hitting it counts as a
    /// retryable transport failure.
    pub adapter_timeout: Duration,
    /// How many extra attempts a retryable endpoint failure earns.
    pub endpoint_retry_limit: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            adapter_timeout: Duration::from_secs(30),
            endpoint_retry_limit: 1,
        }
    }
}

/// Cooperative cancellation. Checked between endpoints only — an in-flight
/// adapter call is never interrupted, so a cancelled pass still leaves
/// every already-committed endpoint intact.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fire-and-forget notifications; nobody has to be listening.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    EndpointSynced {
        profile_id: i64,
        endpoint_id: EndpointId,
    },
    SyncFinished {
        profile_id: i64,
        status: SyncStatus,
    },
    /// The profile's first successful pass completed and its bootstrap
    /// placeholder state was cleared.
    FirstLoginFinished { profile_id: i64 },
}

/// Orchestrates sync passes against one store.
pub struct SyncEngine {
    repo: SqliteRepository,
    reconciler: Reconciler,
    options: SyncOptions,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    pub fn new(pool: SqlitePool, options: SyncOptions) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            repo: SqliteRepository::new(pool.clone()),
            reconciler: Reconciler::new(pool),
            options,
            events,
        }
    }

    pub fn repo(&self) -> &SqliteRepository {
        &self.repo
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Run one sync pass for one profile.
    ///
    /// Endpoint failures never bubble out of the pass; they are recorded in
    /// the returned [`SyncRun`]. An `Err` here means the engine itself
    /// could not operate (store unavailable, run bookkeeping failed).
    pub async fn sync_profile(
        &self,
        profile: &Profile,
        login_store: &LoginStore,
        login: &dyn LoginCoordinator,
        endpoints: &[Box<dyn EndpointAdapter>],
        cancel: &CancelFlag,
    ) -> Result<SyncRun> {
        // The cursor for incremental endpoints: start of the last pass that
        // fully succeeded. Fetched before this pass's own run is recorded.
        let since = self
            .repo
            .get_latest_sync_run(profile.id)
            .await?
            .filter(|r| r.status == SyncStatus::Succeeded)
            .map(|r| r.started_at);

        let run = self
            .repo
            .create_sync_run(profile.id, &login_store.provider)
            .await?;
        info!(
            profile_id = profile.id,
            provider = %login_store.provider,
            run_id = run.id,
            "Starting sync pass"
        );

        let session = match login.authenticate(login_store).await {
            Ok(session) => session,
            Err(e) => {
                error!(profile_id = profile.id, error = %e, "Login failed, aborting pass");
                self.repo
                    .finish_sync_run(run.id, SyncStatus::Failed, Some(&e.to_string()), &[])
                    .await?;
                let _ = self.events.send(SyncEvent::SyncFinished {
                    profile_id: profile.id,
                    status: SyncStatus::Failed,
                });
                let failed = self.repo.get_sync_run(run.id).await?;
                return Ok(failed.unwrap_or(run));
            }
        };

        let now = Utc::now();
        let mut outcomes: Vec<Option<EndpointOutcome>> = vec![None; endpoints.len()];
        let mut queue: VecDeque<(usize, u32)> = VecDeque::new();
        for (idx, adapter) in endpoints.iter().enumerate() {
            if self.repo.is_due(profile.id, adapter.endpoint_id(), now).await? {
                queue.push_back((idx, 0));
            } else {
                info!(
                    profile_id = profile.id,
                    endpoint = adapter.name(),
                    "Endpoint not due, skipping"
                );
                outcomes[idx] =
                    Some(EndpointOutcome::skipped(adapter.endpoint_id(), adapter.name()));
            }
        }

        let mut cancelled = false;
        while let Some((idx, attempts)) = queue.pop_front() {
            if cancel.is_cancelled() {
                info!(profile_id = profile.id, "Cancellation observed, draining queue");
                let adapter = &endpoints[idx];
                outcomes[idx] =
                    Some(EndpointOutcome::skipped(adapter.endpoint_id(), adapter.name()));
                while let Some((rest, _)) = queue.pop_front() {
                    let adapter = &endpoints[rest];
                    outcomes[rest] =
                        Some(EndpointOutcome::skipped(adapter.endpoint_id(), adapter.name()));
                }
                cancelled = true;
                break;
            }

            let adapter = &endpoints[idx];
            let endpoint_id = adapter.endpoint_id();
            let ctx = FetchContext {
                session: &session,
                profile,
                since,
            };
            let fetched = match timeout(self.options.adapter_timeout, adapter.fetch(&ctx)).await {
                Ok(result) => result,
                Err(_) => Err(SyncError::Transport(format!(
                    "{} exceeded the {:?} adapter deadline",
                    adapter.name(),
                    self.options.adapter_timeout
                ))),
            };

            match fetched {
                Ok(batch) => {
                    let delay = batch.next_sync;
                    match self
                        .reconciler
                        .apply(profile, batch, MergeMode::Monotonic)
                        .await
                    {
                        Ok(stats) => {
                            // The cadence only advances on success, so a
                            // failed endpoint stays due for the next pass.
                            self.repo
                                .set_sync_next(profile.id, endpoint_id, Utc::now(), delay)
                                .await?;
                            info!(
                                profile_id = profile.id,
                                endpoint = adapter.name(),
                                removed = stats.removed,
                                upserted = stats.upserted(),
                                "Endpoint synced"
                            );
                            outcomes[idx] = Some(EndpointOutcome::succeeded(
                                endpoint_id,
                                adapter.name(),
                                attempts,
                            ));
                            let _ = self.events.send(SyncEvent::EndpointSynced {
                                profile_id: profile.id,
                                endpoint_id,
                            });
                        }
                        Err(e) => {
                            warn!(
                                profile_id = profile.id,
                                endpoint = adapter.name(),
                                error = %e,
                                "Reconcile failed, endpoint batch discarded"
                            );
                            outcomes[idx] = Some(EndpointOutcome::failed(
                                endpoint_id,
                                adapter.name(),
                                e.to_string(),
                                attempts,
                            ));
                        }
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        profile_id = profile.id,
                        endpoint = adapter.name(),
                        error = %e,
                        "Fatal endpoint failure, draining remaining queue"
                    );
                    outcomes[idx] = Some(EndpointOutcome::failed(
                        endpoint_id,
                        adapter.name(),
                        e.to_string(),
                        attempts,
                    ));
                    while let Some((rest, _)) = queue.pop_front() {
                        let adapter = &endpoints[rest];
                        outcomes[rest] = Some(EndpointOutcome::skipped(
                            adapter.endpoint_id(),
                            adapter.name(),
                        ));
                    }
                }
                Err(e) if e.is_retryable() && attempts < self.options.endpoint_retry_limit => {
                    warn!(
                        profile_id = profile.id,
                        endpoint = adapter.name(),
                        error = %e,
                        attempt = attempts + 1,
                        "Retryable endpoint failure, requeueing"
                    );
                    queue.push_back((idx, attempts + 1));
                }
                Err(e) => {
                    warn!(
                        profile_id = profile.id,
                        endpoint = adapter.name(),
                        error = %e,
                        "Endpoint failed"
                    );
                    outcomes[idx] = Some(EndpointOutcome::failed(
                        endpoint_id,
                        adapter.name(),
                        e.to_string(),
                        attempts,
                    ));
                }
            }
        }

        let outcomes: Vec<EndpointOutcome> = outcomes.into_iter().flatten().collect();
        let status = if cancelled {
            SyncStatus::Cancelled
        } else if outcomes.iter().any(|o| o.status == EndpointStatus::Failed) {
            SyncStatus::PartiallyFailed
        } else {
            SyncStatus::Succeeded
        };

        self.repo
            .finish_sync_run(run.id, status, None, &outcomes)
            .await?;

        if status == SyncStatus::Succeeded && profile.empty {
            self.repo.set_profile_empty(profile.id, false).await?;
            let _ = self.events.send(SyncEvent::FirstLoginFinished {
                profile_id: profile.id,
            });
            info!(profile_id = profile.id, "First login finished");
        }

        info!(
            profile_id = profile.id,
            status = ?status,
            "Sync pass finished"
        );
        let _ = self.events.send(SyncEvent::SyncFinished {
            profile_id: profile.id,
            status,
        });

        let finished = self.repo.get_sync_run(run.id).await?;
        Ok(finished.unwrap_or(run))
    }
}
