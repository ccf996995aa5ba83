// Control plane: admission control for backend queries
//
// Every metric query spawned by the aggregator's fan-out takes a permit here
// before it reaches the metrics store. One `AdmissionControl` is shared by
// all requests of a process, so the bound is global, not per report.
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep_until, Instant};

pub const DEFAULT_MAX_INFLIGHT: usize = 16;

/// Bounds in-flight backend queries and, optionally, paces their start times.
///
/// A stats report fans out six queries at once; with `max_inflight` below
/// that the remaining tasks simply wait for a permit, they never fail.
#[derive(Clone)]
pub struct AdmissionControl {
    inflight: Arc<Semaphore>,
    pacer: Option<Arc<Pacer>>,
}

/// Hands out evenly spaced start slots, `interval` apart.
struct Pacer {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl Pacer {
    fn new(queries_per_sec: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / queries_per_sec.max(1),
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Reserve the next free slot and sleep until it comes up.
    async fn wait_turn(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.interval;
            slot
        };
        sleep_until(slot).await;
    }
}

impl AdmissionControl {
    /// `max_inflight` and `queries_per_sec` are clamped to at least one.
    pub fn new(max_inflight: usize, queries_per_sec: Option<u32>) -> Self {
        Self {
            inflight: Arc::new(Semaphore::new(max_inflight.max(1))),
            pacer: queries_per_sec.map(|rate| Arc::new(Pacer::new(rate))),
        }
    }

    pub fn available(&self) -> usize {
        self.inflight.available_permits()
    }

    /// Wait for a start slot (when paced) and an in-flight permit. The
    /// permit is held until the returned guard is dropped.
    pub async fn acquire(&self) -> Result<AdmissionPermit, MetricsError> {
        if let Some(pacer) = &self.pacer {
            pacer.wait_turn().await;
        }
        let permit = self
            .inflight
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| MetricsError::Task("admission control closed".to_string()))?;
        Ok(AdmissionPermit { _permit: permit })
    }
}

impl Default for AdmissionControl {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INFLIGHT, None)
    }
}

pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}
