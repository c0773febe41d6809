//! # Search Orchestrator
//!
//! Fans one search out to every enabled indexer of a profile, merges what
//! comes back in binding order and runs it through the [`Pipeline`].
//!
//! An indexer that fails or panics only loses its own results. When no
//! indexer answers at all the search waits for the configured cooldown and
//! reports [`SearchOutcome::NoResults`].

use std::sync::Arc;
use std::time::Duration;

use senbetsu_core::{ConfigHandle, ConfigSnapshot, IndexerSettings, MediaKind, QualityProfile};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::candidate::{RawRelease, SearchResultSet, WantedMedia};
use crate::error::{IndexerError, Result, SearchError};
use crate::pipeline::Pipeline;
use crate::store::{IndexerClient, IndexerRequest, MediaLookup, MediaStore, MetadataResolver, QueryKind};

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchScope {
    /// One wanted movie or episode.
    Media(WantedMedia),
    /// The latest releases of every indexer, mapped onto local media.
    Rss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub profile: String,
    pub kind: MediaKind,
    pub scope: SearchScope,
}

impl SearchRequest {
    pub fn media(profile: impl Into<String>, media: WantedMedia) -> Self {
        Self {
            profile: profile.into(),
            kind: media.kind,
            scope: SearchScope::Media(media),
        }
    }

    pub fn rss(profile: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            profile: profile.into(),
            kind,
            scope: SearchScope::Rss,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Every release that came back, split into accepted and denied.
    Completed(SearchResultSet),
    /// No indexer answered.
    NoResults,
    /// The held files already reach the profile's cutoff; nothing was queried.
    CutoffReached { priority: i32, cutoff: i32 },
}

impl SearchOutcome {
    /// The result set of a completed search.
    #[must_use]
    pub fn results(&self) -> Option<&SearchResultSet> {
        match self {
            Self::Completed(set) => Some(set),
            _ => None,
        }
    }
}

/// Runs searches against a shared configuration and indexer client.
pub struct Searcher {
    config: Arc<ConfigHandle>,
    indexers: Arc<dyn IndexerClient>,
    store: Arc<dyn MediaStore>,
    metadata: Option<Arc<dyn MetadataResolver>>,
    workers: Arc<Semaphore>,
}

impl Searcher {
    /// The worker pool is sized from the configuration current at creation.
    pub fn new(
        config: Arc<ConfigHandle>,
        indexers: Arc<dyn IndexerClient>,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        let worker_count = config.current().settings().general.worker_count.max(1);
        Self {
            config,
            indexers,
            store,
            metadata: None,
            workers: Arc::new(Semaphore::new(worker_count)),
        }
    }

    /// Enables mapping unknown RSS releases through `resolver`.
    #[must_use]
    pub fn with_metadata(mut self, resolver: Arc<dyn MetadataResolver>) -> Self {
        self.metadata = Some(resolver);
        self
    }

    /// Runs one search.
    ///
    /// The configuration snapshot current at the start is used throughout;
    /// a concurrent reload does not affect a running search.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Config` if the profile, one of its indexers,
    /// regex templates or paths is not configured.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchOutcome> {
        let snapshot = self.config.current();
        let rss = matches!(request.scope, SearchScope::Rss);
        let pipeline = Pipeline::new(&snapshot, &request.profile, request.kind, self.store.as_ref())?
            .rss(rss);

        info!(
            profile = %request.profile,
            kind = %request.kind,
            rss,
            generation = snapshot.generation(),
            "search started"
        );

        let outcome = match request.scope {
            SearchScope::Media(media) => {
                self.search_media(&snapshot, &pipeline, Arc::new(media)).await?
            }
            SearchScope::Rss => self.poll_rss(&snapshot, &pipeline).await?,
        };

        match &outcome {
            SearchOutcome::Completed(set) => info!(
                raw = set.raw.len(),
                accepted = set.accepted.len(),
                denied = set.denied.len(),
                "search finished"
            ),
            SearchOutcome::NoResults => info!("search finished without results"),
            SearchOutcome::CutoffReached { priority, cutoff } => {
                info!(priority, cutoff, "cutoff reached, search skipped");
            }
        }
        Ok(outcome)
    }

    async fn search_media(
        &self,
        snapshot: &ConfigSnapshot,
        pipeline: &Pipeline<'_>,
        media: Arc<WantedMedia>,
    ) -> Result<SearchOutcome> {
        let profile = pipeline.profile();

        let cutoff = snapshot
            .tables()
            .profile(&profile.name)
            .and_then(|table| table.cutoff());
        if let Some(cutoff) = cutoff {
            let held = pipeline.minimum_priority(&media);
            if held >= cutoff {
                return Ok(SearchOutcome::CutoffReached {
                    priority: held,
                    cutoff,
                });
            }
        }

        let by_id = media.has_external_id();
        let requests = build_requests(snapshot, profile, &media, |indexer| {
            Some(if by_id && indexer.id_search {
                QueryKind::ExternalId {
                    imdb: media.imdb.clone(),
                    tvdb: media.tvdb,
                }
            } else {
                QueryKind::Title(media.title.clone())
            })
        })?;
        if requests.is_empty() {
            debug!(profile = %profile.name, "no enabled indexer to query");
            return Ok(SearchOutcome::NoResults);
        }
        let id_queried = requests
            .iter()
            .any(|r| matches!(r.query, QueryKind::ExternalId { .. }));

        let Some(releases) = self.query_all(requests).await else {
            self.cool_down(snapshot).await;
            return Ok(SearchOutcome::NoResults);
        };
        let mut set = pipeline.evaluate_for(releases, &media);

        if !set.has_accepted() && id_queried && profile.search_title_if_empty {
            let mut titles = vec![media.title.clone()];
            if profile.search_alternate_titles {
                titles.extend(media.alternate_titles.iter().cloned());
            }

            for title in titles.into_iter().filter(|t| !t.trim().is_empty()) {
                debug!(%title, "nothing accepted by id, retrying by title");
                // Indexers without id search were already asked by title.
                let requests = build_requests(snapshot, profile, &media, |indexer| {
                    indexer
                        .id_search
                        .then(|| QueryKind::Title(title.clone()))
                })?;
                if let Some(releases) = self.query_all(requests).await {
                    pipeline.evaluate_into(
                        &mut set,
                        releases
                            .into_iter()
                            .map(|raw| (raw, Some(Arc::clone(&media)))),
                    );
                }
                if set.has_accepted() {
                    break;
                }
            }
        }

        Ok(SearchOutcome::Completed(set))
    }

    async fn poll_rss(
        &self,
        snapshot: &ConfigSnapshot,
        pipeline: &Pipeline<'_>,
    ) -> Result<SearchOutcome> {
        let profile = pipeline.profile();
        let placeholder = WantedMedia {
            kind: pipeline.kind,
            ..WantedMedia::default()
        };
        let requests = build_requests(snapshot, profile, &placeholder, |_| Some(QueryKind::Latest))?;
        if requests.is_empty() {
            debug!(profile = %profile.name, "no enabled indexer to poll");
            return Ok(SearchOutcome::NoResults);
        }

        let Some(releases) = self.query_all(requests).await else {
            self.cool_down(snapshot).await;
            return Ok(SearchOutcome::NoResults);
        };

        let mut mapped = Vec::with_capacity(releases.len());
        for raw in releases {
            let target = self.map_release(snapshot, pipeline, &raw).await;
            mapped.push((raw, target.map(Arc::new)));
        }

        let mut set = SearchResultSet::default();
        pipeline.evaluate_into(&mut set, mapped);
        Ok(SearchOutcome::Completed(set))
    }

    /// Finds the local media an RSS release belongs to, asking the metadata
    /// resolver when the profile allows adding missing media.
    async fn map_release(
        &self,
        snapshot: &ConfigSnapshot,
        pipeline: &Pipeline<'_>,
        raw: &RawRelease,
    ) -> Option<WantedMedia> {
        let parsed = snapshot.parser().parse(&raw.title, pipeline.kind).ok()?;
        let lookup = MediaLookup {
            imdb: raw.imdb.clone().or(parsed.imdb),
            tvdb: raw.tvdb.or(parsed.tvdb),
            title: parsed.title,
            year: parsed.year,
            identifier: parsed.identifier,
            season: parsed.season_number,
            episode: parsed.episode_number,
        };

        if let Some(media) = self.store.find_media(pipeline.kind, &lookup) {
            return Some(media);
        }
        if !pipeline.profile().add_missing {
            return None;
        }
        let resolver = self.metadata.as_ref()?;
        match resolver.resolve(pipeline.kind, &lookup).await {
            Ok(media) => media,
            Err(e) => {
                warn!(title = %raw.title, error = %e, "metadata lookup failed");
                None
            }
        }
    }

    /// Queries every request concurrently, bounded by the worker pool.
    ///
    /// Results are merged in request order. Returns `None` if no request
    /// succeeded.
    async fn query_all(&self, requests: Vec<IndexerRequest>) -> Option<Vec<RawRelease>> {
        let mut handles = Vec::with_capacity(requests.len());
        for request in requests {
            let client = Arc::clone(&self.indexers);
            let workers = Arc::clone(&self.workers);
            let indexer = request.indexer.clone();

            let handle = tokio::spawn(async move {
                let _permit = workers
                    .acquire_owned()
                    .await
                    .map_err(|_| IndexerError::Other("worker pool closed".into()))?;
                let mut releases = client.search(&request).await?;
                for release in &mut releases {
                    release.indexer.clone_from(&request.indexer);
                }
                Ok::<_, IndexerError>(releases)
            });
            handles.push((indexer, handle));
        }

        let mut merged = Vec::new();
        let mut succeeded = 0usize;
        for (indexer, handle) in handles {
            match handle.await {
                Ok(Ok(releases)) => {
                    debug!(%indexer, count = releases.len(), "indexer answered");
                    succeeded += 1;
                    merged.extend(releases);
                }
                Ok(Err(e)) => {
                    let err = SearchError::Indexer {
                        indexer,
                        message: e.to_string(),
                    };
                    warn!(error = %err, "indexer query failed");
                }
                Err(e) => {
                    error!(%indexer, error = %e, "indexer task panicked");
                }
            }
        }

        (succeeded > 0).then_some(merged)
    }

    /// Pauses after a round in which every issued request failed.
    async fn cool_down(&self, snapshot: &ConfigSnapshot) {
        let secs = snapshot.settings().general.failure_cooldown_secs;
        warn!(cooldown_secs = secs, "no indexer answered");
        if secs > 0 {
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}

/// One request per enabled indexer binding of `profile`, in binding order.
/// Bindings for which `query` returns `None` are skipped.
fn build_requests<F>(
    snapshot: &ConfigSnapshot,
    profile: &QualityProfile,
    media: &WantedMedia,
    query: F,
) -> Result<Vec<IndexerRequest>>
where
    F: Fn(&IndexerSettings) -> Option<QueryKind>,
{
    let mut requests = Vec::with_capacity(profile.indexers.len());
    for binding in &profile.indexers {
        let indexer = snapshot.indexer(&binding.name)?;
        if !indexer.enabled {
            debug!(indexer = %indexer.name, "indexer disabled, skipped");
            continue;
        }
        let Some(query) = query(indexer) else {
            continue;
        };
        requests.push(IndexerRequest {
            indexer: indexer.name.clone(),
            kind: media.kind,
            query,
            episode: media.episode.clone(),
            categories: binding.categories.clone(),
        });
    }
    Ok(requests)
}
