use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use innkeeper::booking::availability;
use innkeeper::booking::engine::{BookingEngine, ReservationRequest};
use innkeeper::booking::ledger;
use innkeeper::booking::lifecycle::Actor;
use innkeeper::booking::model::{
    Booking, BookingStatus, DateRange, Listing, ListingDraft, PriceBreakdown,
};
use innkeeper::booking::notify::LogNotifier;
use innkeeper::booking::pricing;
use innkeeper::config::AppConfig;
use innkeeper::error::AppError;
use innkeeper::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use ulid::Ulid;

#[derive(Clone)]
struct AppState {
    engine: Arc<BookingEngine>,
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Innkeeper",
    about = "Availability, pricing, and booking lifecycle engine for rental listings",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a stay and check it against an optional reservation ledger
    Quote(QuoteArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct QuoteArgs {
    /// Nightly base price, e.g. 89.50
    #[arg(long)]
    nightly: Decimal,
    /// One-off cleaning fee
    #[arg(long, default_value = "0")]
    cleaning_fee: Decimal,
    /// One-off service fee
    #[arg(long, default_value = "0")]
    service_fee: Decimal,
    /// Minimum stay in nights
    #[arg(long, default_value_t = 1)]
    min_nights: i64,
    /// Maximum stay in nights
    #[arg(long, default_value_t = 365)]
    max_nights: i64,
    /// Party size
    #[arg(long, default_value_t = 2)]
    guests: u32,
    /// Check-in date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    check_in: NaiveDate,
    /// Checkout date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    check_out: NaiveDate,
    /// Existing reservation ledger (CSV export) to check the dates against
    #[arg(long)]
    ledger_csv: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RegisterListingRequest {
    name: String,
    host: String,
    nightly_price: Decimal,
    #[serde(default)]
    cleaning_fee: Decimal,
    #[serde(default)]
    service_fee: Decimal,
    minimum_nights: i64,
    maximum_nights: i64,
    accommodates: u32,
}

#[derive(Debug, Serialize)]
struct ListingResponse {
    id: Ulid,
    name: String,
    host: String,
    nightly_price: Decimal,
    cleaning_fee: Decimal,
    service_fee: Decimal,
    minimum_nights: i64,
    maximum_nights: i64,
    accommodates: u32,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            name: listing.name,
            host: listing.host,
            nightly_price: listing.nightly_price,
            cleaning_fee: listing.cleaning_fee,
            service_fee: listing.service_fee,
            minimum_nights: listing.minimum_nights,
            maximum_nights: listing.maximum_nights,
            accommodates: listing.accommodates,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StayQueryRequest {
    listing_id: Ulid,
    #[serde(deserialize_with = "deserialize_date")]
    start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    listing_id: Ulid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    nights: i64,
    available: bool,
}

#[derive(Debug, Serialize)]
struct QuoteResponse {
    listing_id: Ulid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(flatten)]
    price: PriceBreakdown,
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    listing_id: Ulid,
    guest: String,
    #[serde(deserialize_with = "deserialize_guest_count")]
    guests: u32,
    #[serde(deserialize_with = "deserialize_date")]
    start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    reference: Ulid,
    listing_id: Ulid,
    guest: String,
    guests: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: BookingStatus,
    status_label: &'static str,
    price: PriceBreakdown,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            reference: booking.reference,
            listing_id: booking.listing_id,
            guest: booking.guest,
            guests: booking.guests,
            start_date: booking.range.start(),
            end_date: booking.range.end(),
            status: booking.status,
            status_label: booking.status.label(),
            price: booking.price,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    target: BookingStatus,
    actor: Actor,
    /// Anchor date for the time-dependent guards; defaults to today.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    today: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Quote(args) => run_quote(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

fn deserialize_guest_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let guests = u32::deserialize(deserializer)?;
    if guests == 0 {
        return Err(serde::de::Error::custom("guest count must be at least 1"));
    }
    Ok(guests)
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/listings",
            post(register_listing_endpoint).get(list_listings_endpoint),
        )
        .route("/api/v1/listings/:id/bookings", get(listing_bookings_endpoint))
        .route("/api/v1/availability", post(availability_endpoint))
        .route("/api/v1/quote", post(quote_endpoint))
        .route("/api/v1/bookings", post(create_booking_endpoint))
        .route(
            "/api/v1/bookings/:reference/status",
            post(booking_status_endpoint),
        )
        .with_state(state)
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let engine = Arc::new(BookingEngine::new(
        config.booking.cancellation_policy(),
        Arc::new(LogNotifier),
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        engine,
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = app_router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "booking engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let QuoteArgs {
        nightly,
        cleaning_fee,
        service_fee,
        min_nights,
        max_nights,
        guests,
        check_in,
        check_out,
        ledger_csv,
    } = args;

    let range = DateRange::new(check_in, check_out)?;
    let draft = ListingDraft {
        name: "ad-hoc listing".to_string(),
        host: "cli".to_string(),
        nightly_price: nightly,
        cleaning_fee,
        service_fee,
        minimum_nights: min_nights,
        maximum_nights: max_nights,
        accommodates: guests.max(1),
    };
    let listing = draft.into_listing(Ulid::new())?;

    let imported: Vec<Booking> = match ledger_csv {
        Some(path) => ledger::read_ledger_from_path(path)?
            .into_iter()
            .map(|entry| entry.into_booking(&listing))
            .collect(),
        None => Vec::new(),
    };

    let price = pricing::quote(&listing, &range)?;
    render_quote(&listing, &range, guests, &imported, &price);

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn register_listing_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<RegisterListingRequest>,
) -> Result<Json<ListingResponse>, AppError> {
    let draft = ListingDraft {
        name: payload.name,
        host: payload.host,
        nightly_price: payload.nightly_price,
        cleaning_fee: payload.cleaning_fee,
        service_fee: payload.service_fee,
        minimum_nights: payload.minimum_nights,
        maximum_nights: payload.maximum_nights,
        accommodates: payload.accommodates,
    };
    let listing = state.engine.register_listing(draft)?;
    Ok(Json(listing.into()))
}

async fn list_listings_endpoint(State(state): State<AppState>) -> Json<Vec<ListingResponse>> {
    Json(
        state
            .engine
            .listings()
            .into_iter()
            .map(ListingResponse::from)
            .collect(),
    )
}

async fn listing_bookings_endpoint(
    State(state): State<AppState>,
    Path(id): Path<Ulid>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state.engine.bookings_for_listing(id)?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

async fn availability_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<StayQueryRequest>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let range = DateRange::new(payload.start_date, payload.end_date)?;
    let available = state.engine.is_available(payload.listing_id, &range)?;

    Ok(Json(AvailabilityResponse {
        listing_id: payload.listing_id,
        start_date: range.start(),
        end_date: range.end(),
        nights: range.nights(),
        available,
    }))
}

async fn quote_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<StayQueryRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let range = DateRange::new(payload.start_date, payload.end_date)?;
    let price = state.engine.quote(payload.listing_id, &range)?;

    Ok(Json(QuoteResponse {
        listing_id: payload.listing_id,
        start_date: range.start(),
        end_date: range.end(),
        price,
    }))
}

async fn create_booking_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let range = DateRange::new(payload.start_date, payload.end_date)?;
    let booking = state.engine.reserve(
        payload.listing_id,
        ReservationRequest {
            guest: payload.guest,
            guests: payload.guests,
            range,
        },
    )?;

    Ok(Json(booking.into()))
}

async fn booking_status_endpoint(
    State(state): State<AppState>,
    Path(reference): Path<Ulid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let today = payload.today.unwrap_or_else(|| Local::now().date_naive());
    let booking = state
        .engine
        .transition(reference, payload.target, payload.actor, today)?;

    Ok(Json(booking.into()))
}

fn render_quote(
    listing: &Listing,
    range: &DateRange,
    guests: u32,
    imported: &[Booking],
    price: &PriceBreakdown,
) {
    println!("Stay quote");
    println!(
        "Dates: {} -> {} ({} nights, {} guests)",
        range.start(),
        range.end(),
        price.nights,
        guests
    );

    if imported.is_empty() {
        println!("Ledger: none provided");
    } else {
        let active = imported
            .iter()
            .filter(|booking| booking.status.is_active())
            .count();
        println!(
            "Ledger: {} bookings imported ({} active)",
            imported.len(),
            active
        );
    }

    match availability::first_conflict(imported, range) {
        None => println!("Availability: open"),
        Some(conflict) => println!(
            "Availability: blocked by {} ({} -> {}, {})",
            conflict.reference,
            conflict.range.start(),
            conflict.range.end(),
            conflict.status
        ),
    }

    println!("\nPrice breakdown");
    println!(
        "- {} nights x {} = {}",
        price.nights, listing.nightly_price, price.base_price
    );
    println!("- cleaning fee: {}", price.cleaning_fee);
    println!("- service fee: {}", price.service_fee);
    println!("- total: {}", price.total);
}
