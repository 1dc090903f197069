use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use nl_core::{
    Article, Error, Fingerprint, Result, Summarizer, SummaryRecord, SummaryStore, SummaryStyle,
};
use tokio::sync::{watch, Mutex};
use tracing::debug;

/// What a flight publishes to its waiters. Errors travel as messages
/// because the underlying error is not cloneable.
type FlightResult = std::result::Result<SummaryRecord, String>;

enum FlightRole {
    Leader(watch::Sender<Option<FlightResult>>),
    Waiter(watch::Receiver<Option<FlightResult>>),
}

/// Read-through cache over the summary store with a single-flight
/// guarantee: for one fingerprint, at most one summarization call is in
/// flight at a time, and every caller concurrent with that flight
/// receives its result, success or failure. Failures are never stored,
/// so the next non-concurrent call retries. One instance is constructed
/// at service start and shared by handle.
pub struct SummaryCache {
    store: Arc<dyn SummaryStore>,
    inflight: Mutex<HashMap<Fingerprint, watch::Receiver<Option<FlightResult>>>>,
}

impl SummaryCache {
    pub fn new(store: Arc<dyn SummaryStore>) -> Self {
        Self {
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_compute(
        &self,
        article: &Article,
        style: SummaryStyle,
        summarizer: &dyn Summarizer,
    ) -> Result<SummaryRecord> {
        article.validate()?;
        let fingerprint = Fingerprint::compute(&article.id, style);

        if let Some(record) = self.store.get_summary(&fingerprint).await? {
            debug!(%fingerprint, "summary cache hit");
            return Ok(record);
        }

        // Join the in-flight computation for this fingerprint, or start
        // one. Unrelated fingerprints never contend past the map lock.
        let role = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(&fingerprint) {
                Some(rx) => FlightRole::Waiter(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(fingerprint.clone(), rx);
                    FlightRole::Leader(tx)
                }
            }
        };

        match role {
            FlightRole::Leader(tx) => {
                let result = self.run_flight(article, style, summarizer, &fingerprint).await;
                // Drop the entry before publishing so callers arriving
                // after a failure start a fresh flight instead of
                // joining a finished one.
                self.inflight.lock().await.remove(&fingerprint);
                let shared = match &result {
                    Ok(record) => Ok(record.clone()),
                    Err(e) => Err(e.to_string()),
                };
                let _ = tx.send(Some(shared));
                result
            }
            FlightRole::Waiter(rx) => self.await_flight(rx, &fingerprint).await,
        }
    }

    async fn run_flight(
        &self,
        article: &Article,
        style: SummaryStyle,
        summarizer: &dyn Summarizer,
        fingerprint: &Fingerprint,
    ) -> Result<SummaryRecord> {
        // A flight that finished between the cache check and the map
        // insert may have stored the record already.
        if let Some(record) = self.store.get_summary(fingerprint).await? {
            debug!(%fingerprint, "summary cache hit after wait");
            return Ok(record);
        }

        debug!(%fingerprint, summarizer = summarizer.name(), "summary cache miss, computing");
        let summary_text = summarizer.summarize(&article.body_text, style).await?;
        let record = SummaryRecord {
            fingerprint: fingerprint.clone(),
            summary_text,
            generated_at: Utc::now(),
            source_article_id: article.id.clone(),
            style,
        };
        // Persisted before any waiter is released.
        self.store.put_summary_if_absent(record).await
    }

    async fn await_flight(
        &self,
        mut rx: watch::Receiver<Option<FlightResult>>,
        fingerprint: &Fingerprint,
    ) -> Result<SummaryRecord> {
        let published = loop {
            if let Some(result) = rx.borrow_and_update().clone() {
                break Some(result);
            }
            if rx.changed().await.is_err() {
                break None;
            }
        };
        match published {
            Some(Ok(record)) => Ok(record),
            Some(Err(message)) => Err(Error::Compute(message)),
            // The leader went away without publishing (cancelled). Fall
            // back to the store before giving up.
            None => match self.store.get_summary(fingerprint).await? {
                Some(record) => Ok(record),
                None => Err(Error::Compute(
                    "in-flight summarization was cancelled".to_string(),
                )),
            },
        }
    }
}
