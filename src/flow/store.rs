//! Context persistence collaborator.
//!
//! The engine requires exactly two operations: `save` a context snapshot
//! together with its resumption point, and `load` it back by instance id.
//! Snapshots are explicit copies. The store never deletes; archival is
//! somebody else's job.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use super::FlowContext;
use super::error::StoreError;

/// A persisted context snapshot plus its recorded resumption point.
#[derive(Debug, Clone)]
pub struct StoredContext<C> {
    pub context: C,
    /// Node to re-enter at; `None` once the flow reached a terminal node.
    pub resume_at: Option<String>,
}

#[async_trait]
pub trait ContextStore<C: FlowContext>: Send + Sync {
    /// Persist a snapshot of the context together with its resumption
    /// point.
    async fn save(&self, ctx: &C, resume_at: Option<&str>) -> Result<(), StoreError>;

    /// Load the last persisted snapshot for a saga instance.
    async fn load(&self, biz_no: &str) -> Result<Option<StoredContext<C>>, StoreError>;
}

struct Entry<C> {
    snapshot: StoredContext<C>,
    /// Last save, epoch millis; drives staleness scans.
    updated_at: i64,
}

/// In-memory context store.
///
/// Concurrent map keyed by `biz_no`; good enough for tests, demos and
/// single-process deployments. A database-backed store implements the same
/// trait.
pub struct MemoryStore<C> {
    entries: DashMap<String, Entry<C>>,
}

impl<C: FlowContext> MemoryStore<C> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All currently suspended instances.
    pub fn suspended(&self) -> Vec<StoredContext<C>> {
        self.suspended_since(Duration::ZERO)
    }

    /// Suspended instances whose last save is at least `threshold` old.
    pub fn suspended_since(&self, threshold: Duration) -> Vec<StoredContext<C>> {
        let cutoff = chrono::Utc::now().timestamp_millis() - threshold.as_millis() as i64;
        self.entries
            .iter()
            .filter(|e| e.snapshot.resume_at.is_some() && e.updated_at <= cutoff)
            .map(|e| e.snapshot.clone())
            .collect()
    }
}

impl<C: FlowContext> Default for MemoryStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: FlowContext> ContextStore<C> for MemoryStore<C> {
    async fn save(&self, ctx: &C, resume_at: Option<&str>) -> Result<(), StoreError> {
        self.entries.insert(ctx.biz_no().to_string(), Entry {
            snapshot: StoredContext {
                context: ctx.clone(),
                resume_at: resume_at.map(str::to_owned),
            },
            updated_at: chrono::Utc::now().timestamp_millis(),
        });
        Ok(())
    }

    async fn load(&self, biz_no: &str) -> Result<Option<StoredContext<C>>, StoreError> {
        Ok(self.entries.get(biz_no).map(|e| e.snapshot.clone()))
    }
}
