use crate::configuration::Configuration;
use crate::types::ResourceKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "resource_booking", about = "Department resource booking")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the booking API server.
    Serve(ServeConfiguration),
    /// List bookable resources of a kind.
    Resources(ClientOptions),
    /// List your bookings of a kind.
    Bookings(ClientOptions),
    /// Submit a booking request.
    Book(BookOptions),
}

#[derive(Args, Clone)]
pub struct ServeConfiguration {
    #[arg(long, default_value = "3000")]
    port: String,
    #[arg(long, default_value = "Department Resource Booking")]
    website_title: String,
    #[arg(long, default_value = "../frontend/index.html")]
    frontend_path: PathBuf,
    /// Upstream booking API to forward to. Without it the server runs
    /// on impersistent in-memory example data.
    #[arg(long)]
    api_base_url: Option<String>,
}

impl Configuration for ServeConfiguration {
    fn website_title(&self) -> String {
        self.website_title.clone()
    }

    fn port(&self) -> String {
        self.port.clone()
    }

    fn frontend_path(&self) -> PathBuf {
        self.frontend_path.clone()
    }

    fn api_base_url(&self) -> Option<String> {
        self.api_base_url
            .clone()
            .or_else(|| std::env::var("BOOKING_API_URL").ok())
    }
}

#[derive(Args, Clone)]
pub struct ClientOptions {
    #[arg(long, default_value = "http://localhost:3000")]
    pub api_url: String,
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub kind: ResourceKind,
}

#[derive(Args, Clone)]
pub struct BookOptions {
    #[command(flatten)]
    pub client: ClientOptions,
    #[arg(long)]
    pub resource_id: Uuid,
    /// Booking date, `YYYY-MM-DD`.
    #[arg(long)]
    pub date: String,
    /// Start time `HH:MM`; unused for lab bookings.
    #[arg(long, default_value = "")]
    pub start_time: String,
    #[arg(long, default_value = "")]
    pub end_date: String,
    #[arg(long, default_value = "")]
    pub end_time: String,
    #[arg(long)]
    pub purpose: String,
    #[arg(long)]
    pub agree_terms: bool,
}

pub fn parse_arguments() -> Cli {
    dotenvy::dotenv().ok();
    Cli::parse()
}
