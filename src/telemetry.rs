use once_cell::sync::Lazy;
use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{OTEL_STATUS_CODE, SERVICE_NAME, SERVICE_VERSION},
    resource::DEPLOYMENT_ENVIRONMENT_NAME,
    trace::ERROR_TYPE,
};
use rocket::{
    Data, Request, Response,
    fairing::{Fairing, Info, Kind},
    request::{FromRequest, Outcome},
};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tracing::{Span, field::Empty, info, info_span};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

const HONEYCOMB_ENDPOINT: &str = "https://api.honeycomb.io:443";

pub static TELEMETRY_GUARD: Lazy<Mutex<Option<OtelGuard>>> = Lazy::new(|| Mutex::new(None));

/// The `http_request` span and start time cached for each request.
pub struct RequestTrace {
    pub span: Span,
    pub started: Instant,
}

impl RequestTrace {
    fn detached() -> Self {
        Self {
            span: Span::none(),
            started: Instant::now(),
        }
    }
}

pub fn request_trace<'r>(request: &'r Request<'_>) -> &'r RequestTrace {
    request.local_cache(RequestTrace::detached)
}

/// Opens the span that covers a whole request. Every field recorded later is
/// declared here as `Empty`; `Span::record` drops undeclared fields.
pub fn request_span(method: &str, uri: &str) -> Span {
    info_span!(
        "http_request",
        otel.name = format!("{} {}", method, uri),
        http.method = method,
        http.uri = uri,
        http.route = Empty,
        http.status_code = Empty,
        http.duration_ms = Empty,
        error = Empty,
        { ERROR_TYPE } = Empty,
        error.message = Empty,
        { OTEL_STATUS_CODE } = Empty,
    )
}

pub fn record_completion(span: &Span, route: Option<String>, status: u16, duration: Duration) {
    if let Some(route) = route {
        span.record("http.route", route.as_str());
    }
    span.record("http.status_code", status);
    span.record("http.duration_ms", duration.as_millis() as i64);
}

/// The current request's span, for handlers to run inside.
pub struct RequestSpan(pub Span);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestSpan {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RequestSpan(request_trace(request).span.clone()))
    }
}

pub struct TelemetryFairing;

#[rocket::async_trait]
impl Fairing for TelemetryFairing {
    fn info(&self) -> Info {
        Info {
            name: "OpenTelemetry",
            kind: Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let span = request_span(request.method().as_str(), &request.uri().to_string());
        let started = Instant::now();

        request.local_cache(|| RequestTrace { span, started });
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let trace = request_trace(request);
        let duration = trace.started.elapsed();
        let status = response.status().code;

        // Routing has happened by now, so the matched route is known.
        let route = request.route().map(|route| route.uri.to_string());
        record_completion(&trace.span, route, status, duration);

        let _entered = trace.span.enter();
        info!(
            "Completed request in {}ms with status {}",
            duration.as_millis(),
            status
        );
    }

    async fn on_shutdown(&self, _rocket: &rocket::Rocket<rocket::Orbit>) {
        shutdown_telemetry();
    }
}

fn resource() -> Resource {
    let environment = if crate::env::is_production() {
        "production"
    } else {
        "develop"
    };

    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, environment),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(honeycomb_api_key: &str) -> Result<SdkTracerProvider, AppError> {
    let mut metadata = MetadataMap::new();
    let api_key = honeycomb_api_key
        .parse::<MetadataValue<Ascii>>()
        .map_err(|e| AppError::Internal(format!("Invalid Honeycomb API key: {}", e)))?;
    metadata.insert("x-honeycomb-team", api_key);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(HONEYCOMB_ENDPOINT)
        .with_tls_config(tonic::transport::ClientTlsConfig::new().with_native_roots())
        .with_protocol(Protocol::Grpc)
        .with_metadata(metadata)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build span exporter: {}", e)))?;

    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

pub struct OtelGuard {
    tracer_provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {:?}", err);
        }
    }
}

/// Installs the global subscriber. Spans are also exported to Honeycomb when
/// `HONEYCOMB_API_KEY` is set; otherwise logs only go to stdout.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let honeycomb_api_key = dotenvy::var("HONEYCOMB_API_KEY").ok();

    let tracer_provider = match honeycomb_api_key.as_deref().map(init_tracer_provider) {
        Some(Ok(provider)) => Some(provider),
        Some(Err(e)) => {
            eprintln!("Telemetry export disabled: {}", e);
            None
        }
        None => None,
    };

    match tracer_provider {
        Some(tracer_provider) => {
            let tracer = tracer_provider.tracer("travel-tracker");

            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(OpenTelemetryLayer::new(tracer))
                .init();

            if let Ok(mut guard) = TELEMETRY_GUARD.lock() {
                *guard = Some(OtelGuard { tracer_provider });
            }
            info!("Exporting traces to {}", HONEYCOMB_ENDPOINT);
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

pub fn shutdown_telemetry() {
    let guard = match TELEMETRY_GUARD.lock() {
        Ok(mut guard) => guard.take(),
        Err(_) => None,
    };

    if guard.is_some() {
        info!("Shutting down telemetry...");
    }
    drop(guard);
}
