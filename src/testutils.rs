use crate::backend::BookingBackend;
use crate::configuration::Configuration;
use crate::error::BookingError;
use crate::types::{
    BookingRecord, BookingStatus, CreateBookingRequest, Resource, ResourceKind, TimeSlot,
};
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveTime};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use uuid::Uuid;

pub struct MockBookingBackendInner {
    pub success: AtomicBool,
    pub latency_ms: AtomicU64,
    pub calls_to_resources: AtomicU64,
    pub calls_to_bookings: AtomicU64,
    pub calls_to_create_booking: AtomicU64,
    pub resources: Mutex<Vec<Resource>>,
    pub bookings: Mutex<Vec<BookingRecord>>,
    pub last_request: Mutex<Option<CreateBookingRequest>>,
}

#[derive(Clone)]
pub struct MockBookingBackend(pub Arc<MockBookingBackendInner>);

impl MockBookingBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBookingBackendInner {
            success: AtomicBool::new(true),
            latency_ms: AtomicU64::default(),
            calls_to_resources: AtomicU64::default(),
            calls_to_bookings: AtomicU64::default(),
            calls_to_create_booking: AtomicU64::default(),
            resources: Mutex::default(),
            bookings: Mutex::default(),
            last_request: Mutex::default(),
        }))
    }

    fn result(&self) -> Result<(), BookingError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(BookingError::Rejected {
                status: 500,
                message: "Supposed to fail".into(),
            }),
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.0.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(latency)).await;
        }
    }
}

#[async_trait]
impl BookingBackend for MockBookingBackend {
    async fn resources(&self, kind: ResourceKind) -> Result<Vec<Resource>, BookingError> {
        self.0.calls_to_resources.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self
            .0
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|resource| resource.kind == kind)
            .cloned()
            .collect())
    }

    async fn bookings(
        &self,
        _kind: ResourceKind,
        _booked_by: &str,
    ) -> Result<Vec<BookingRecord>, BookingError> {
        self.0.calls_to_bookings.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.bookings.lock().unwrap().clone())
    }

    async fn create_booking(
        &self,
        _kind: ResourceKind,
        booked_by: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingRecord, BookingError> {
        self.0.calls_to_create_booking.fetch_add(1, Ordering::SeqCst);
        *self.0.last_request.lock().unwrap() = Some(request.clone());
        self.simulate_latency().await;
        self.result()?;

        let resource = self
            .0
            .resources
            .lock()
            .unwrap()
            .iter()
            .find(|resource| resource.id == request.resource_id)
            .cloned();
        let (resource_name, requires_approval) = resource
            .map(|resource| (resource.name, resource.requires_approval))
            .unwrap_or_else(|| ("Mock Resource".into(), false));

        let now = Local::now();
        Ok(BookingRecord {
            id: Uuid::new_v4(),
            resource_id: request.resource_id,
            resource_name,
            booked_by: booked_by.into(),
            start_time: request.start_time.unwrap_or(now),
            end_time: request.end_time.unwrap_or(now + Duration::hours(2)),
            purpose: request.purpose.clone(),
            status: if requires_approval {
                BookingStatus::Pending
            } else {
                BookingStatus::Approved
            },
            created_at: now,
        })
    }
}

pub fn example_room(requires_approval: bool) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        kind: ResourceKind::Room,
        name: "Seminar Room B".into(),
        location: "Building 3".into(),
        quantity: 1,
        available: 1,
        requires_approval,
        time_slots: vec![],
    }
}

pub fn example_lab() -> Resource {
    let slot = |label: &str, start: (u32, u32), end: (u32, u32), available: bool| TimeSlot {
        id: Uuid::new_v4(),
        label: label.into(),
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        available,
    };
    Resource {
        id: Uuid::new_v4(),
        kind: ResourceKind::Lab,
        name: "Networks Lab".into(),
        location: "Building 2".into(),
        quantity: 24,
        available: 24,
        requires_approval: false,
        time_slots: vec![
            slot("09:00 - 11:00", (9, 0), (11, 0), false),
            slot("11:00 - 13:00", (11, 0), (13, 0), true),
            slot("14:00 - 16:00", (14, 0), (16, 0), true),
        ],
    }
}

pub fn example_record(resource_name: &str, booked_by: &str) -> BookingRecord {
    let start = Local::now() + Duration::days(2);
    BookingRecord {
        id: Uuid::new_v4(),
        resource_id: Uuid::new_v4(),
        resource_name: resource_name.into(),
        booked_by: booked_by.into(),
        start_time: start,
        end_time: start + Duration::hours(2),
        purpose: "Testing".into(),
        status: BookingStatus::Approved,
        created_at: Local::now(),
    }
}

#[derive(Clone)]
pub struct TestConfiguration {
    pub website_title: String,
    pub frontend_path: PathBuf,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            website_title: "Test Booking".into(),
            frontend_path: PathBuf::from("../frontend/index.html"),
        }
    }
}

impl Configuration for TestConfiguration {
    fn website_title(&self) -> String {
        self.website_title.clone()
    }

    fn port(&self) -> String {
        "0".into()
    }

    fn frontend_path(&self) -> PathBuf {
        self.frontend_path.clone()
    }

    fn api_base_url(&self) -> Option<String> {
        None
    }
}
