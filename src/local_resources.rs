use crate::backend::BookingBackend;
use crate::error::BookingError;
use crate::types::{
    BookingRecord, BookingStatus, CreateBookingRequest, Resource, ResourceKind, TimeSlot,
};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tracing::info;
use uuid::Uuid;

/// Impersistent backend holding everything in memory. Used when no
/// upstream API is configured, and as the store behind test servers.
#[derive(Debug, Clone, Default)]
pub struct LocalResources {
    resources: Arc<Mutex<HashMap<Uuid, Resource>>>,
    bookings: Arc<Mutex<HashMap<Uuid, BookingRecord>>>,
}

fn slot(label: &str, start: (u32, u32), end: (u32, u32)) -> TimeSlot {
    TimeSlot {
        id: Uuid::new_v4(),
        label: label.into(),
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        available: true,
    }
}

impl LocalResources {
    pub fn add_resource(&self, resource: Resource) {
        self.resources
            .lock()
            .unwrap()
            .insert(resource.id, resource);
    }

    pub fn insert_example_resources(&self) {
        let examples = [
            example_resource(ResourceKind::Equipment, "Oscilloscope", "Store Room 2", 4, false),
            example_resource(
                ResourceKind::Equipment,
                "Vector Network Analyzer",
                "Store Room 2",
                1,
                true,
            ),
            example_resource(ResourceKind::Room, "Seminar Room B", "Building 3", 1, false),
            example_resource(ResourceKind::Room, "Conference Room", "Building 1", 1, true),
            Resource {
                time_slots: vec![
                    slot("09:00 - 11:00", (9, 0), (11, 0)),
                    slot("11:00 - 13:00", (11, 0), (13, 0)),
                    slot("14:00 - 16:00", (14, 0), (16, 0)),
                ],
                ..example_resource(ResourceKind::Lab, "Networks Lab", "Building 2", 24, true)
            },
        ];
        for resource in examples {
            self.add_resource(resource);
        }
    }

    fn local_datetime(
        date: chrono::NaiveDate,
        time: NaiveTime,
    ) -> Result<DateTime<Local>, BookingError> {
        Local
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or_else(|| BookingError::Invalid("Selected time does not exist".into()))
    }

    fn booking_window(
        resource: &Resource,
        request: &CreateBookingRequest,
    ) -> Result<(DateTime<Local>, DateTime<Local>), BookingError> {
        if resource.time_slots.is_empty() {
            match (request.start_time, request.end_time) {
                (Some(start), Some(end)) if end > start => Ok((start, end)),
                (Some(_), Some(_)) => Err(BookingError::Invalid(
                    "End time must be after start time.".into(),
                )),
                _ => Err(BookingError::Invalid(
                    "Start and end times are required".into(),
                )),
            }
        } else {
            let date = request
                .date
                .ok_or_else(|| BookingError::Invalid("Booking date is required".into()))?;
            let slot_id = request
                .time_slot_id
                .ok_or_else(|| BookingError::Invalid("A time slot is required".into()))?;
            let slot = resource
                .time_slots
                .iter()
                .find(|slot| slot.id == slot_id)
                .ok_or_else(|| BookingError::Invalid("Unknown time slot".into()))?;
            if !slot.available {
                return Err(BookingError::Unavailable("Time slot is already taken".into()));
            }
            Ok((
                Self::local_datetime(date, slot.start_time)?,
                Self::local_datetime(date, slot.end_time)?,
            ))
        }
    }
}

fn example_resource(
    kind: ResourceKind,
    name: &str,
    location: &str,
    quantity: u32,
    requires_approval: bool,
) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        kind,
        name: name.into(),
        location: location.into(),
        quantity,
        available: quantity,
        requires_approval,
        time_slots: vec![],
    }
}

#[async_trait]
impl BookingBackend for LocalResources {
    async fn resources(&self, kind: ResourceKind) -> Result<Vec<Resource>, BookingError> {
        let mut resources: Vec<Resource> = self
            .resources
            .lock()
            .unwrap()
            .values()
            .filter(|resource| resource.kind == kind)
            .cloned()
            .collect();
        resources.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Ok(resources)
    }

    async fn bookings(
        &self,
        kind: ResourceKind,
        booked_by: &str,
    ) -> Result<Vec<BookingRecord>, BookingError> {
        let resources = self.resources.lock().unwrap();
        let mut bookings: Vec<BookingRecord> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.booked_by == booked_by)
            .filter(|record| {
                resources
                    .get(&record.resource_id)
                    .map(|resource| resource.kind == kind)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        bookings.sort_unstable_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn create_booking(
        &self,
        kind: ResourceKind,
        booked_by: &str,
        request: &CreateBookingRequest,
    ) -> Result<BookingRecord, BookingError> {
        let record = {
            let mut resources = self.resources.lock().unwrap();
            let resource = resources
                .get_mut(&request.resource_id)
                .filter(|resource| resource.kind == kind)
                .ok_or(BookingError::NotFound)?;

            if resource.available == 0 {
                return Err(BookingError::Unavailable(
                    "No availability left for this resource".into(),
                ));
            }

            let (start_time, end_time) = Self::booking_window(resource, request)?;
            resource.available -= 1;

            BookingRecord {
                id: Uuid::new_v4(),
                resource_id: resource.id,
                resource_name: resource.name.clone(),
                booked_by: booked_by.into(),
                start_time,
                end_time,
                purpose: request.purpose.clone(),
                status: if resource.requires_approval {
                    BookingStatus::Pending
                } else {
                    BookingStatus::Approved
                },
                created_at: Local::now(),
            }
        };

        info!(
            resource = %record.resource_name,
            booked_by,
            status = record.status.as_str(),
            "booking created"
        );
        self.bookings.lock().unwrap().insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn window_request(resource_id: Uuid) -> CreateBookingRequest {
        let start = Local::now() + Duration::days(2);
        CreateBookingRequest {
            resource_id,
            purpose: "Testing".into(),
            start_time: Some(start),
            end_time: Some(start + Duration::hours(2)),
            date: None,
            time_slot_id: None,
        }
    }

    #[tokio::test]
    async fn test_booking_decrements_availability() {
        let backend = LocalResources::default();
        let resource = example_resource(ResourceKind::Equipment, "Oscilloscope", "Store", 2, false);
        let resource_id = resource.id;
        backend.add_resource(resource);

        let record = backend
            .create_booking(
                ResourceKind::Equipment,
                "stefan",
                &window_request(resource_id),
            )
            .await
            .unwrap();
        assert_eq!(record.status, BookingStatus::Approved);
        assert_eq!(record.booked_by, "stefan");

        let resources = backend.resources(ResourceKind::Equipment).await.unwrap();
        assert_eq!(resources[0].available, 1);
        assert_eq!(resources[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_approval_flag_yields_pending_status() {
        let backend = LocalResources::default();
        let resource = example_resource(ResourceKind::Room, "Conference Room", "B1", 1, true);
        let resource_id = resource.id;
        backend.add_resource(resource);

        let record = backend
            .create_booking(ResourceKind::Room, "stefan", &window_request(resource_id))
            .await
            .unwrap();
        assert_eq!(record.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_booking_without_availability_is_rejected() {
        let backend = LocalResources::default();
        let resource = example_resource(ResourceKind::Room, "Seminar Room B", "B3", 1, false);
        let resource_id = resource.id;
        backend.add_resource(resource);

        backend
            .create_booking(ResourceKind::Room, "stefan", &window_request(resource_id))
            .await
            .unwrap();
        let err = backend
            .create_booking(ResourceKind::Room, "peter", &window_request(resource_id))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_and_kind_mismatch() {
        let backend = LocalResources::default();
        let resource = example_resource(ResourceKind::Room, "Seminar Room B", "B3", 1, false);
        let resource_id = resource.id;
        backend.add_resource(resource);

        let err = backend
            .create_booking(ResourceKind::Room, "stefan", &window_request(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound));

        // Same id under the wrong kind segment is not found either.
        let err = backend
            .create_booking(
                ResourceKind::Equipment,
                "stefan",
                &window_request(resource_id),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound));
    }

    #[tokio::test]
    async fn test_lab_booking_uses_slot_times() {
        let backend = LocalResources::default();
        let resource = Resource {
            time_slots: vec![slot("09:00 - 11:00", (9, 0), (11, 0))],
            ..example_resource(ResourceKind::Lab, "Networks Lab", "B2", 24, false)
        };
        let resource_id = resource.id;
        let slot_id = resource.time_slots[0].id;
        backend.add_resource(resource);

        let date = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let request = CreateBookingRequest {
            resource_id,
            purpose: "Protocol measurements".into(),
            start_time: None,
            end_time: None,
            date: Some(date),
            time_slot_id: Some(slot_id),
        };
        let record = backend
            .create_booking(ResourceKind::Lab, "stefan", &request)
            .await
            .unwrap();
        assert_eq!(record.start_time.naive_local().to_string(), "2025-07-10 09:00:00");
        assert_eq!(record.end_time.naive_local().to_string(), "2025-07-10 11:00:00");

        let unknown_slot = CreateBookingRequest {
            time_slot_id: Some(Uuid::new_v4()),
            ..request
        };
        let err = backend
            .create_booking(ResourceKind::Lab, "stefan", &unknown_slot)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_window_booking_requires_both_times() {
        let backend = LocalResources::default();
        let resource = example_resource(ResourceKind::Equipment, "Oscilloscope", "Store", 4, false);
        let resource_id = resource.id;
        backend.add_resource(resource);

        let mut request = window_request(resource_id);
        request.end_time = None;
        let err = backend
            .create_booking(ResourceKind::Equipment, "stefan", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_bookings_filtered_by_user_and_kind() {
        let backend = LocalResources::default();
        let room = example_resource(ResourceKind::Room, "Seminar Room B", "B3", 3, false);
        let equipment = example_resource(ResourceKind::Equipment, "Oscilloscope", "Store", 3, false);
        let room_id = room.id;
        let equipment_id = equipment.id;
        backend.add_resource(room);
        backend.add_resource(equipment);

        backend
            .create_booking(ResourceKind::Room, "stefan", &window_request(room_id))
            .await
            .unwrap();
        backend
            .create_booking(
                ResourceKind::Equipment,
                "stefan",
                &window_request(equipment_id),
            )
            .await
            .unwrap();
        backend
            .create_booking(ResourceKind::Room, "peter", &window_request(room_id))
            .await
            .unwrap();

        let bookings = backend.bookings(ResourceKind::Room, "stefan").await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].resource_name, "Seminar Room B");

        let bookings = backend.bookings(ResourceKind::Lab, "stefan").await.unwrap();
        assert!(bookings.is_empty());
    }
}
