use crate::error::BookingError;
use crate::types::{BookingRecord, CreateBookingRequest, Resource, ResourceKind};
use async_trait::async_trait;

/// Seam between the booking workflow / HTTP layer and whatever holds
/// the actual resource data (in-memory store or upstream REST API).
#[async_trait]
pub trait BookingBackend: Clone + Send + Sync + 'static {
    async fn resources(&self, kind: ResourceKind) -> Result<Vec<Resource>, BookingError>;

    async fn bookings(
        &self,
        kind: ResourceKind,
        booked_by: &str,
    ) -> Result<Vec<BookingRecord>, BookingError>;

    async fn create_booking(
        &self,
        kind: ResourceKind,
        booked_by: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingRecord, BookingError>;
}
