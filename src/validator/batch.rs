use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use crate::errors::RefineError;
use crate::models::ValidationResult;
use super::UrlValidator;
use tracing::debug;

impl UrlValidator {
    /// Validate `urls` with at most `max_concurrent` requests in flight.
    /// Output order matches input order.
    pub async fn validate_batch(&self, urls: &[String], max_concurrent: usize) -> Vec<ValidationResult> {
        let token = CancellationToken::new();
        let slots = self.run_pool(urls, max_concurrent, &token).await;
        // A token nobody cancels leaves no slot empty.
        slots
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| slot.unwrap_or_else(|| ValidationResult::transport(url, "not validated".into())))
            .collect()
    }

    /// Like [`validate_batch`](Self::validate_batch), but workers stop pulling
    /// work once `token` is cancelled and the batch reports `Cancelled`.
    pub async fn validate_batch_with_cancel(
        &self,
        urls: &[String],
        max_concurrent: usize,
        token: &CancellationToken,
    ) -> Result<Vec<ValidationResult>, RefineError> {
        let slots = self.run_pool(urls, max_concurrent, token).await;
        if token.is_cancelled() {
            return Err(RefineError::Cancelled);
        }
        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| RefineError::Internal("validation slot left empty".into())))
            .collect()
    }

    async fn run_pool(
        &self,
        urls: &[String],
        max_concurrent: usize,
        token: &CancellationToken,
    ) -> Vec<Option<ValidationResult>> {
        let mut slots: Vec<Option<ValidationResult>> = vec![None; urls.len()];
        if urls.is_empty() {
            return slots;
        }

        let next = AtomicUsize::new(0);
        let delay = self.config.request_delay();
        let workers = max_concurrent.clamp(1, urls.len());

        let outputs = join_all((0..workers).map(|worker| {
            self.worker(worker, urls, &next, delay, token)
        })).await;

        for (index, result) in outputs.into_iter().flatten() {
            slots[index] = Some(result);
        }
        slots
    }

    async fn worker(
        &self,
        worker: usize,
        urls: &[String],
        next: &AtomicUsize,
        delay: Duration,
        token: &CancellationToken,
    ) -> Vec<(usize, ValidationResult)> {
        let mut done = Vec::new();
        loop {
            if token.is_cancelled() {
                break;
            }
            let index = next.fetch_add(1, Ordering::SeqCst);
            let Some(url) = urls.get(index) else {
                break;
            };

            let result = tokio::select! {
                result = self.validate(url) => result,
                _ = token.cancelled() => break,
            };
            debug!(worker, index, url = %url, valid = result.valid, "Validated");
            done.push((index, result));

            // Pace before pulling the next item, not after the last one.
            if !delay.is_zero() && next.load(Ordering::SeqCst) < urls.len() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => break,
                }
            }
        }
        done
    }
}
