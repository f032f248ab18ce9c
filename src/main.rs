use crate::backend::BookingBackend;
use crate::bookings_cache::{BookingList, Freshness};
use crate::configuration::Configuration;
use crate::configuration_handler::{BookOptions, ClientOptions, Command};
use crate::http::create_app;
use crate::local_resources::LocalResources;
use crate::rest_backend::RestBackend;
use crate::session::Session;
use crate::validation::BookingField;
use crate::workflow::{BookingWorkflow, ModalState, SubmitOutcome};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend;
mod bookings_cache;
mod configuration;
mod configuration_handler;
mod error;
mod http;
mod local_resources;
mod rest_backend;
mod session;
#[cfg(test)]
mod testutils;
mod types;
mod validation;
mod workflow;

/// How long the success confirmation stays visible before the booking
/// dialog closes on its own.
const SUCCESS_CLOSE_DELAY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("####################");
    println!("# Resource Booking #");
    println!("####################");

    let cli = configuration_handler::parse_arguments();
    match cli.command {
        Command::Serve(configuration) => serve(configuration).await,
        Command::Resources(options) => list_resources(options).await,
        Command::Bookings(options) => list_bookings(options).await,
        Command::Book(options) => book(options).await,
    }
}

async fn serve<C: Configuration>(configuration: C) {
    let address = format!("0.0.0.0:{}", configuration.port());
    println!("Accessible at:\n{address}");
    let listener = tokio::net::TcpListener::bind(address).await.unwrap();

    if let Some(api_base_url) = configuration.api_base_url() {
        let backend = loop {
            match RestBackend::connect(&api_base_url).await {
                Ok(backend) => {
                    info!("Connected to upstream booking API");
                    break backend;
                }
                Err(err) => {
                    error!(?err, "Upstream booking API not reachable: {api_base_url}. Retry in 1 sec. You may want to restart without it (impersistent example data).");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        axum::serve(listener, create_app(backend, configuration))
            .await
            .unwrap();
    } else {
        let backend = LocalResources::default();
        backend.insert_example_resources();
        axum::serve(listener, create_app(backend, configuration))
            .await
            .unwrap();
    }
}

async fn list_resources(options: ClientOptions) {
    let backend = RestBackend::new(&options.api_url);
    match backend.resources(options.kind).await {
        Ok(resources) => {
            for resource in resources {
                let approval = if resource.requires_approval {
                    " | approval required"
                } else {
                    ""
                };
                println!(
                    "{} | {} | {} | available {}/{}{}",
                    resource.id,
                    resource.name,
                    resource.location,
                    resource.available,
                    resource.quantity,
                    approval
                );
            }
        }
        Err(err) => error!(?err, "Failed to load resources"),
    }
}

async fn list_bookings(options: ClientOptions) {
    let backend = RestBackend::new(&options.api_url);
    let bookings = BookingList::default();
    bookings.refresh(&backend, options.kind, &options.user).await;
    print_bookings(&bookings);
}

fn print_bookings(bookings: &BookingList) {
    for entry in bookings.entries() {
        let tag = match entry.freshness {
            Freshness::Confirmed => "",
            Freshness::PendingRefresh => " (awaiting refresh)",
        };
        let record = entry.record;
        println!(
            "{} | {} | {} - {} | {}{}",
            record.resource_name,
            record.status.as_str(),
            record.start_time.format("%Y-%m-%d %H:%M"),
            record.end_time.format("%H:%M"),
            record.purpose,
            tag
        );
    }
}

async fn book(options: BookOptions) {
    let backend = RestBackend::new(&options.client.api_url);
    let session = Session::new(options.client.user.clone());

    let resources = match backend.resources(options.client.kind).await {
        Ok(resources) => resources,
        Err(err) => {
            error!(?err, "Failed to load resources");
            return;
        }
    };
    let Some(resource) = resources
        .into_iter()
        .find(|resource| resource.id == options.resource_id)
    else {
        error!("No such resource: {}", options.resource_id);
        return;
    };

    let bookings = BookingList::default();
    let mut workflow = BookingWorkflow::new(
        backend,
        session,
        resource,
        bookings.clone(),
        SUCCESS_CLOSE_DELAY,
    );
    workflow.set_field(BookingField::StartDate, &options.date);
    workflow.set_field(BookingField::StartTime, &options.start_time);
    workflow.set_field(BookingField::EndDate, &options.end_date);
    workflow.set_field(BookingField::EndTime, &options.end_time);
    workflow.set_field(BookingField::Purpose, &options.purpose);
    workflow.set_agreed_to_terms(options.agree_terms);

    match workflow.submit().await {
        SubmitOutcome::Invalid => {
            println!("The booking request is not valid:");
            for (field, message) in workflow.errors() {
                println!("  {field:?}: {message}");
            }
        }
        SubmitOutcome::Accepted(_) => {
            if let ModalState::Success { message } = workflow.state() {
                println!("{message}");
            }
            print_bookings(&bookings);
        }
        SubmitOutcome::Rejected => {
            if let ModalState::Failed {
                message: Some(message),
            } = workflow.state()
            {
                println!("{message}");
            }
        }
        SubmitOutcome::Aborted => {}
    }
}
