use crate::backend::BookingBackend;
use crate::error::BookingError;
use crate::session::SESSION_HEADER;
use crate::types::{BookingRecord, CreateBookingRequest, Resource, ResourceKind};
use async_trait::async_trait;
use reqwest::{Client, Response};

/// Backend that forwards every call to the REST collaborator
/// (`GET /api/{kind}`, `GET/POST /api/{kind}/bookings`).
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the backend and probes the upstream once, so startup can
    /// retry until the collaborator is reachable.
    pub async fn connect(base_url: &str) -> Result<Self, BookingError> {
        let backend = Self::new(base_url);
        backend.resources(ResourceKind::Room).await?;
        Ok(backend)
    }

    fn url(&self, kind: ResourceKind, suffix: &str) -> String {
        format!("{}/api/{kind}{suffix}", self.base_url)
    }

    async fn reject(response: Response) -> BookingError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        BookingError::Rejected { status, message }
    }
}

#[async_trait]
impl BookingBackend for RestBackend {
    async fn resources(&self, kind: ResourceKind) -> Result<Vec<Resource>, BookingError> {
        let response = self.client.get(self.url(kind, "")).send().await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        Ok(response.json().await?)
    }

    async fn bookings(
        &self,
        kind: ResourceKind,
        booked_by: &str,
    ) -> Result<Vec<BookingRecord>, BookingError> {
        let response = self
            .client
            .get(self.url(kind, "/bookings"))
            .header(SESSION_HEADER, booked_by)
            .send()
            .await?;
        // Missing or stale sessions mean "no bookings", not an error.
        match response.status().as_u16() {
            401 | 404 => Ok(vec![]),
            status if status < 300 => Ok(response.json().await?),
            _ => Err(Self::reject(response).await),
        }
    }

    async fn create_booking(
        &self,
        kind: ResourceKind,
        booked_by: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingRecord, BookingError> {
        let response = self
            .client
            .post(self.url(kind, "/bookings"))
            .header(SESSION_HEADER, booked_by)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        Ok(response.json().await?)
    }
}
