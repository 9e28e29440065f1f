//! Stale-response protection for listing filters.
//!
//! Filter changes fire overlapping requests; a slow early response must not
//! replace the results of a later one. Each browser session gets its own
//! [`RequestGenerations`] counter, and a response is only used if its ticket
//! is still the latest when the backend answers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use threadline_core::generation::RequestGenerations;
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::session_keys;

/// Idle time after which a viewer's counter is dropped.
const VIEWER_IDLE: Duration = Duration::from_secs(30 * 60);

/// Outcome of a guarded request.
#[derive(Debug, PartialEq, Eq)]
pub enum Fresh<T> {
    /// No newer request was issued while this one was in flight.
    Current(T),
    /// A newer request superseded this one; its result must be dropped.
    Superseded,
}

/// Request generation counters keyed by viewer.
#[derive(Clone)]
pub struct ListingGenerations {
    viewers: Cache<Uuid, Arc<RequestGenerations>>,
}

impl Default for ListingGenerations {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingGenerations {
    #[must_use]
    pub fn new() -> Self {
        Self {
            viewers: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(VIEWER_IDLE)
                .build(),
        }
    }

    /// The counter for one viewer, created on first use.
    pub async fn for_viewer(&self, viewer: Uuid) -> Arc<RequestGenerations> {
        self.viewers
            .get_with(viewer, async { Arc::new(RequestGenerations::new()) })
            .await
    }
}

/// Stable per-session viewer id, created on first use.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn viewer_id(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(id) = session.get::<Uuid>(session_keys::VIEWER).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4();
    session.insert(session_keys::VIEWER, id).await?;
    Ok(id)
}

/// Run `request` under a fresh ticket and report whether it is still the
/// latest once it completes.
pub async fn guarded<T, F>(generations: &RequestGenerations, request: F) -> Fresh<T>
where
    F: Future<Output = T>,
{
    let ticket = generations.begin();
    let output = request.await;
    if generations.is_current(ticket) {
        Fresh::Current(output)
    } else {
        tracing::debug!(ticket = ticket.number(), "Dropping superseded listing response");
        Fresh::Superseded
    }
}
