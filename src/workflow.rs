use crate::backend::BookingBackend;
use crate::bookings_cache::BookingList;
use crate::session::Session;
use crate::types::{BookingRecord, CreateBookingRequest, Resource};
use crate::validation::{
    combine_date_time, rules_for, validate_booking, BookingField, BookingForm, BookingRules,
    ErrorMap,
};
use chrono::Local;
use futures::future::{AbortHandle, Abortable, Aborted};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Editing,
    Submitting,
    Success { message: String },
    Failed { message: Option<String> },
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent to the backend.
    Invalid,
    Accepted(BookingRecord),
    Rejected,
    Aborted,
}

/// Aborts an in-flight submission from outside the workflow, e.g. when
/// the modal is closed while a request is on the wire. An aborted
/// attempt resolves to `Closed` and never reaches the parent cache.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    in_flight: Arc<Mutex<Option<AbortHandle>>>,
}

impl CloseHandle {
    pub fn close(&self) {
        if let Some(handle) = self.in_flight.lock().unwrap().take() {
            handle.abort();
        }
    }
}

/// One booking attempt: gathers form input, validates locally before
/// any network call, submits once, and reflects the outcome.
pub struct BookingWorkflow<B: BookingBackend> {
    backend: B,
    session: Session,
    resource: Resource,
    rules: BookingRules,
    bookings: BookingList,
    close_delay: Duration,
    form: BookingForm,
    errors: ErrorMap,
    state: ModalState,
    in_flight: Arc<Mutex<Option<AbortHandle>>>,
}

impl<B: BookingBackend> BookingWorkflow<B> {
    pub fn new(
        backend: B,
        session: Session,
        resource: Resource,
        bookings: BookingList,
        close_delay: Duration,
    ) -> Self {
        let rules = rules_for(resource.kind);
        Self {
            backend,
            session,
            resource,
            rules,
            bookings,
            close_delay,
            form: BookingForm::default(),
            errors: ErrorMap::new(),
            state: ModalState::Editing,
            in_flight: Arc::new(Mutex::default()),
        }
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            in_flight: self.in_flight.clone(),
        }
    }

    /// Editing a field clears that field's error only, and brings a
    /// failed attempt back to `Editing`.
    pub fn set_field(&mut self, field: BookingField, value: &str) {
        match field {
            BookingField::StartDate => self.form.start_date = value.into(),
            BookingField::StartTime => self.form.start_time = value.into(),
            BookingField::EndDate => self.form.end_date = value.into(),
            BookingField::EndTime => self.form.end_time = value.into(),
            BookingField::Purpose => self.form.purpose = value.into(),
            BookingField::Terms => {}
        }
        self.field_edited(field);
    }

    pub fn set_agreed_to_terms(&mut self, agreed: bool) {
        self.form.agreed_to_terms = agreed;
        self.field_edited(BookingField::Terms);
    }

    fn field_edited(&mut self, field: BookingField) {
        self.errors.remove(&field);
        if matches!(self.state, ModalState::Failed { .. }) {
            self.state = ModalState::Editing;
        }
    }

    /// Resets everything to the initial state, as when the modal is
    /// opened again. No values leak from a previous attempt.
    pub fn reopen(&mut self) {
        self.form = BookingForm::default();
        self.errors.clear();
        self.state = ModalState::Editing;
    }

    /// Close without submitting. In-flight submissions are aborted via
    /// `CloseHandle` instead.
    pub fn close(&mut self) {
        self.state = ModalState::Closed;
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let today = Local::now().date_naive();
        self.errors = validate_booking(&self.rules, &self.form, today);
        if !self.errors.is_empty() {
            self.state = ModalState::Failed { message: None };
            return SubmitOutcome::Invalid;
        }

        let request = match self.build_request() {
            Ok(request) => request,
            Err(message) => {
                self.state = ModalState::Failed {
                    message: Some(message),
                };
                return SubmitOutcome::Rejected;
            }
        };

        self.state = ModalState::Submitting;
        let (handle, registration) = AbortHandle::new_pair();
        *self.in_flight.lock().unwrap() = Some(handle);

        let call = Abortable::new(
            self.backend
                .create_booking(self.resource.kind, &self.session.user, &request),
            registration,
        );
        let result = call.await;
        self.in_flight.lock().unwrap().take();

        match result {
            Err(Aborted) => {
                self.state = ModalState::Closed;
                SubmitOutcome::Aborted
            }
            Ok(Ok(record)) => {
                self.bookings.prepend_pending(record.clone());
                self.state = ModalState::Success {
                    message: self.success_message(),
                };
                SubmitOutcome::Accepted(record)
            }
            Ok(Err(err)) => {
                warn!(?err, resource = %self.resource.name, "booking submission failed");
                self.state = ModalState::Failed {
                    message: Some(err.user_message()),
                };
                SubmitOutcome::Rejected
            }
        }
    }

    /// After a success the confirmation stays visible for a fixed
    /// delay, then the modal closes on its own.
    pub async fn auto_close(&mut self) {
        if matches!(self.state, ModalState::Success { .. }) {
            tokio::time::sleep(self.close_delay).await;
            self.state = ModalState::Closed;
        }
    }

    fn success_message(&self) -> String {
        if self.resource.requires_approval {
            "Booking request submitted and awaiting administrator approval.".into()
        } else {
            "Booking confirmed.".into()
        }
    }

    fn build_request(&self) -> Result<CreateBookingRequest, String> {
        let purpose = self.form.purpose.trim().to_string();
        if self.rules.requires_time_window {
            let start = combine_date_time(&self.form.start_date, &self.form.start_time)
                .ok_or("Selected start time is invalid")?;
            let end = combine_date_time(&self.form.end_date, &self.form.end_time)
                .ok_or("Selected end time is invalid")?;
            Ok(CreateBookingRequest {
                resource_id: self.resource.id,
                purpose,
                start_time: Some(start),
                end_time: Some(end),
                date: None,
                time_slot_id: None,
            })
        } else {
            // Lab bookings submit the first free slot of the resource.
            let slot = self
                .resource
                .time_slots
                .iter()
                .find(|slot| slot.available)
                .ok_or("No time slot is currently available")?;
            let date = chrono::NaiveDate::parse_from_str(&self.form.start_date, "%Y-%m-%d")
                .map_err(|_| "Selected date is invalid")?;
            Ok(CreateBookingRequest {
                resource_id: self.resource.id,
                purpose,
                start_time: None,
                end_time: None,
                date: Some(date),
                time_slot_id: Some(slot.id),
            })
        }
    }
}
