//! Async loop that performs a chain's fetches and commits their results.

use std::future::Future;

use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, warn};

use padron_core::Identifier;
use padron_events::{EventBus, InMemoryEventBus, Subscription};

use crate::chain::{CommitOutcome, DependencyChain};
use crate::entity::GeoEntity;
use crate::error::{ChainError, FetchError};
use crate::level::GeoLevel;
use crate::notice::ChainNotice;
use crate::seed::ChainSeed;
use crate::source::{FetchRequest, ReferenceDataSource, fetch_gated};

/// What one drive did, in commit order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriveReport {
    /// Levels whose options were installed.
    pub applied: Vec<GeoLevel>,
    pub failed: Vec<(GeoLevel, FetchError)>,
    /// Responses discarded because their request had been superseded.
    pub stale: usize,
    pub notices: Vec<ChainNotice>,
}

impl DriveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the fetches a [`DependencyChain`] asks for against a
/// [`ReferenceDataSource`].
///
/// Fetches of one drive run concurrently and commit in completion order; the
/// chain's generation check decides which results still count. Fetches
/// triggered by a commit (auto-selection) join the same drive.
pub struct ChainDriver<S, B = InMemoryEventBus<ChainNotice>> {
    source: S,
    bus: B,
}

impl<S> ChainDriver<S>
where
    S: ReferenceDataSource,
{
    pub fn new(source: S) -> Self {
        Self::with_bus(source, InMemoryEventBus::new())
    }
}

impl<S, B> ChainDriver<S, B>
where
    S: ReferenceDataSource,
    B: EventBus<ChainNotice>,
{
    pub fn with_bus(source: S, bus: B) -> Self {
        Self { source, bus }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn subscribe(&self) -> Subscription<ChainNotice> {
        self.bus.subscribe()
    }

    /// Fetch the root level's options.
    pub async fn load(&self, chain: &mut DependencyChain) -> DriveReport {
        let root = chain.load_root();
        self.run(chain, vec![root]).await
    }

    /// Select at `level` and fetch whatever the selection unlocks.
    pub async fn select(
        &self,
        chain: &mut DependencyChain,
        level: GeoLevel,
        id: Option<Identifier>,
    ) -> Result<DriveReport, ChainError> {
        let requests = chain.set_selected(level, id)?;
        Ok(self.run(chain, requests).await)
    }

    /// Fetch `level`'s options again, e.g. after a failure.
    pub async fn reload(
        &self,
        chain: &mut DependencyChain,
        level: GeoLevel,
    ) -> Result<DriveReport, ChainError> {
        let requests = chain.reload(level)?.into_iter().collect();
        Ok(self.run(chain, requests).await)
    }

    /// Seed `chain` from persisted values and fetch every level they unlock.
    ///
    /// An empty seed loads the root only (create flow).
    pub async fn bootstrap(&self, chain: &mut DependencyChain, seed: &ChainSeed) -> DriveReport {
        let requests = chain.seed(seed);
        self.run(chain, requests).await
    }

    /// Perform `requests` and every fetch their results trigger.
    pub async fn run(&self, chain: &mut DependencyChain, requests: Vec<FetchRequest>) -> DriveReport {
        let mut report = DriveReport::default();
        let mut in_flight: FuturesUnordered<_> = requests
            .into_iter()
            .map(|request| self.perform(request))
            .collect();

        while let Some((request, result)) = in_flight.next().await {
            let outcome = chain.commit(&request, result);
            let follow_ups = self.record(chain.label(), &request, outcome, &mut report);
            for request in follow_ups {
                in_flight.push(self.perform(request));
            }
        }

        debug!(
            chain = %chain.label(),
            applied = report.applied.len(),
            failed = report.failed.len(),
            stale = report.stale,
            "drive finished"
        );
        report
    }

    fn perform(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = (FetchRequest, Result<Vec<GeoEntity>, FetchError>)> + '_ {
        async move {
            let result = fetch_gated(&self.source, &request).await;
            (request, result)
        }
    }

    fn record(
        &self,
        chain: &str,
        request: &FetchRequest,
        outcome: CommitOutcome,
        report: &mut DriveReport,
    ) -> Vec<FetchRequest> {
        let at = Utc::now();
        let chain = chain.to_string();

        match outcome {
            CommitOutcome::Applied(applied) => {
                report.applied.push(applied.level);
                if let Some(id) = applied.unresolved {
                    self.notify(
                        report,
                        ChainNotice::SeedUnresolved {
                            chain: chain.clone(),
                            level: applied.level,
                            id,
                            at,
                        },
                    );
                }
                if let Some(id) = applied.auto_selected {
                    self.notify(
                        report,
                        ChainNotice::AutoSelected {
                            chain,
                            level: applied.level,
                            id,
                            at,
                        },
                    );
                }
                applied.follow_ups
            }
            CommitOutcome::Failed { level, error } => {
                self.notify(
                    report,
                    ChainNotice::FetchFailed {
                        chain,
                        level,
                        parent: request.parent.clone(),
                        message: error.to_string(),
                        at,
                    },
                );
                report.failed.push((level, error));
                Vec::new()
            }
            CommitOutcome::Stale { level, generation } => {
                report.stale += 1;
                self.notify(
                    report,
                    ChainNotice::StaleDiscarded {
                        chain,
                        level,
                        generation,
                        at,
                    },
                );
                Vec::new()
            }
        }
    }

    fn notify(&self, report: &mut DriveReport, notice: ChainNotice) {
        if let Err(error) = self.bus.publish(notice.clone()) {
            warn!(?error, chain = notice.chain(), level = %notice.level(), "failed to publish chain notice");
        }
        report.notices.push(notice);
    }
}
