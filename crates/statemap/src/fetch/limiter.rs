//! Concurrency limiter for upstream fetches.

use crate::error::{PipelineError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};

/// Default number of simultaneous upstream requests.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Reject concurrency bounds the semaphore cannot represent.
pub fn check_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(PipelineError::Configuration(
            "concurrency must be at least 1".to_string(),
        ));
    }
    if capacity > Semaphore::MAX_PERMITS {
        return Err(PipelineError::Configuration(format!(
            "concurrency {capacity} exceeds the maximum of {}",
            Semaphore::MAX_PERMITS
        )));
    }
    Ok(())
}

/// Bounds the number of in-flight network fetches and records the peak.
#[derive(Debug)]
pub struct FetchLimiter {
    semaphore: Semaphore,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FetchLimiter {
    /// Create a limiter admitting at most `capacity` concurrent fetches.
    pub fn new(capacity: usize) -> Result<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    /// Wait for a slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> std::result::Result<FetchPermit<'_>, AcquireError> {
        let permit = self.semaphore.acquire().await?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(FetchPermit {
            _permit: permit,
            in_flight: &self.in_flight,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetches currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous permits observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Guard that releases the fetch slot when dropped.
pub struct FetchPermit<'a> {
    _permit: SemaphorePermit<'a>,
    in_flight: &'a AtomicUsize,
}

impl Drop for FetchPermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            FetchLimiter::new(0),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_capacity_above_semaphore_max_rejected() {
        assert!(matches!(
            FetchLimiter::new(usize::MAX),
            Err(PipelineError::Configuration(_))
        ));
        assert!(FetchLimiter::new(Semaphore::MAX_PERMITS + 1).is_err());
        assert!(check_capacity(Semaphore::MAX_PERMITS).is_ok());
    }

    #[tokio::test]
    async fn test_permits_released_on_drop() {
        let limiter = FetchLimiter::new(2).unwrap();
        let g1 = limiter.acquire().await.unwrap();
        let _g2 = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);
        drop(g1);
        assert_eq!(limiter.in_flight(), 1);
        let _g3 = limiter.acquire().await.unwrap();
        assert_eq!(limiter.peak(), 2);
    }

    #[tokio::test]
    async fn test_third_acquire_waits_for_release() {
        let limiter = FetchLimiter::new(2).unwrap();
        let _g1 = limiter.acquire().await.unwrap();
        let _g2 = limiter.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err());
        assert_eq!(limiter.peak(), 2);
    }
}
