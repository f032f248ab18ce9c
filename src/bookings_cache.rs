use crate::backend::BookingBackend;
use crate::types::{BookingRecord, ResourceKind};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

/// Whether an entry has been confirmed by a full server fetch or was
/// inserted optimistically after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Confirmed,
    PendingRefresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedBooking {
    pub record: BookingRecord,
    pub freshness: Freshness,
}

/// The parent view's booking list, held as an explicit client-side
/// cache. Optimistic inserts are tagged until the next full refresh
/// replaces them with server-confirmed entries.
#[derive(Debug, Clone)]
pub struct BookingList {
    entries: Arc<Mutex<Vec<CachedBooking>>>,
    sender: watch::Sender<Vec<CachedBooking>>,
}

impl Default for BookingList {
    fn default() -> Self {
        let (sender, _) = watch::channel(vec![]);
        Self {
            entries: Arc::new(Mutex::default()),
            sender,
        }
    }
}

impl BookingList {
    pub fn entries(&self) -> Vec<CachedBooking> {
        self.entries.lock().unwrap().clone()
    }

    pub fn subscribe(&self) -> WatchStream<Vec<CachedBooking>> {
        let stream = WatchStream::new(self.sender.subscribe());
        self.publish();
        stream
    }

    fn publish(&self) {
        self.sender.send_replace(self.entries());
    }

    /// Optimistic insert after a successful submission. The entry is
    /// not server-confirmed until the next refresh.
    pub fn prepend_pending(&self, record: BookingRecord) {
        self.entries.lock().unwrap().insert(
            0,
            CachedBooking {
                record,
                freshness: Freshness::PendingRefresh,
            },
        );
        self.publish();
    }

    /// Replaces the whole cache with the server's list. A failed fetch
    /// is non-fatal: warn and degrade to an empty list, no retry.
    pub async fn refresh<B: BookingBackend>(&self, backend: &B, kind: ResourceKind, user: &str) {
        let records = match backend.bookings(kind, user).await {
            Ok(records) => records,
            Err(err) => {
                warn!(?err, "failed to refresh bookings, showing an empty list");
                vec![]
            }
        };
        *self.entries.lock().unwrap() = records
            .into_iter()
            .map(|record| CachedBooking {
                record,
                freshness: Freshness::Confirmed,
            })
            .collect();
        self.publish();
    }
}
