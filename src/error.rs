use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("resource not found")]
    NotFound,
    #[error("no availability: {0}")]
    Unavailable(String),
    #[error("invalid booking request: {0}")]
    Invalid(String),
    #[error("upstream rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl BookingError {
    /// Message safe to show in the modal's error banner.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::NotFound => "The selected resource no longer exists.".into(),
            BookingError::Unavailable(reason) => reason.clone(),
            BookingError::Invalid(reason) => reason.clone(),
            BookingError::Rejected { .. } | BookingError::Http(_) => {
                "Could not submit the booking. Please try again.".into()
            }
        }
    }
}
