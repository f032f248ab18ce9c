use crate::backend::BookingBackend;
use crate::configuration::Configuration;
use crate::error::BookingError;
use crate::session::Session;
use crate::types::{BookingRecord, CreateBookingRequest, ResourceKind};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::fs;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

#[derive(Clone)]
pub struct AppState<T: BookingBackend, C: Configuration> {
    backend: T,
    configuration: C,
}

pub fn create_app<T: BookingBackend, C: Configuration>(backend: T, configuration: C) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/frontend", get(get_frontend::<T, C>))
        .route("/api/:kind", get(get_resources::<T, C>))
        .route(
            "/api/:kind/bookings",
            get(get_bookings::<T, C>).post(create_booking::<T, C>),
        )
        .with_state(AppState {
            backend,
            configuration,
        })
        .layer(cors)
}

fn error_response(err: BookingError) -> Response {
    let status = match &err {
        BookingError::NotFound => StatusCode::NOT_FOUND,
        BookingError::Unavailable(_) => StatusCode::CONFLICT,
        BookingError::Invalid(_) => StatusCode::BAD_REQUEST,
        BookingError::Rejected { .. } | BookingError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.user_message()).into_response()
}

async fn get_resources<T: BookingBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(kind): Path<ResourceKind>,
) -> Response {
    match state.backend.resources(kind).await {
        Ok(resources) => Json(resources).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_bookings<T: BookingBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(kind): Path<ResourceKind>,
    session: Option<Session>,
) -> Response {
    // No session means no bookings, not an error.
    let Some(session) = session else {
        return Json(Vec::<BookingRecord>::new()).into_response();
    };
    match state.backend.bookings(kind, &session.user).await {
        Ok(bookings) => Json(bookings).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_booking<T: BookingBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(kind): Path<ResourceKind>,
    session: Session,
    Json(request): Json<CreateBookingRequest>,
) -> Response {
    if let Err(err) = request.validate() {
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }
    match state
        .backend
        .create_booking(kind, &session.user, &request)
        .await
    {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_frontend<T: BookingBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
) -> Result<Html<String>, (StatusCode, String)> {
    match fs::read_to_string(state.configuration.frontend_path()).await {
        Ok(contents) => Ok(Html(
            contents.replace("{{title}}", &state.configuration.website_title()),
        )),
        Err(err) => {
            let error_message = format!("Failed to read frontend file: {}", err);
            Err((StatusCode::INTERNAL_SERVER_ERROR, error_message))
        }
    }
}
