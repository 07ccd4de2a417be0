//! Fan-out/fan-in of independent per-item requests
//!
//! Each input item gets exactly one output slot at the same index. A slot
//! holds either the fetched value or a fallback produced after a failed fetch,
//! so a single failing request never fails the whole batch. Completion order
//! of the workers does not matter: results are placed by originating index.
//!
//! Nothing is cancelled. When two batches for the same collection race, the
//! caller that writes its merged result last wins.

use rayon::prelude::*;
use tracing::warn;

use crate::core::api::ApiError;

/// Outcome of one fanned-out request
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// The request succeeded
    Fetched(T),
    /// The request failed; the value is the per-item fallback
    Fallback { value: T, error: ApiError },
}

impl<T> Slot<T> {
    pub fn value(&self) -> &T {
        match self {
            Slot::Fetched(value) | Slot::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Slot::Fetched(value) | Slot::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Slot::Fallback { .. })
    }
}

/// Run `fetch` for every item concurrently and join the results
///
/// `fallback` supplies the value for items whose fetch failed; the failure is
/// logged with `label` and the item's description.
pub fn fan_out<I, T, F, G>(label: &str, items: &[I], fetch: F, fallback: G) -> Vec<Slot<T>>
where
    I: Sync + std::fmt::Debug,
    T: Send,
    F: Fn(&I) -> Result<T, ApiError> + Sync,
    G: Fn(&I) -> T + Sync,
{
    items
        .par_iter()
        .map(|item| match fetch(item) {
            Ok(value) => Slot::Fetched(value),
            Err(error) => {
                warn!("{} failed for {:?}: {}", label, item, error);
                Slot::Fallback {
                    value: fallback(item),
                    error,
                }
            }
        })
        .collect()
}
