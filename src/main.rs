#![warn(clippy::pedantic)]

mod config;
mod content;
mod error;
mod extract;
mod mdx;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
#[cfg(test)]
mod test;
mod trace;

use std::{sync::Arc, time::Duration};

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{
	http::{header, HeaderValue, Method},
	Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::{Any, CorsLayer},
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{config::Config, ratelimit::RateLimiter};

pub type SharedStore = Arc<dyn store::Store>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store, the rate limiter, or a hash configuration (if it's
/// expensive to create).
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: SharedStore,
	pub limiter: Arc<RateLimiter>,
	pub config: Arc<Config>,
	pub hasher: Argon2<'static>,
}

impl State {
	pub fn new(store: SharedStore, config: Config) -> Self {
		Self {
			store,
			limiter: Arc::new(RateLimiter::new(config.rate_limit)),
			config: Arc::new(config),
			hasher: Argon2::default(),
		}
	}
}

fn cors(origins: &[HeaderValue]) -> CorsLayer {
	let cors = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
		.allow_headers([header::CONTENT_TYPE])
		.max_age(Duration::from_secs(60 * 60));

	// Credentials cannot be combined with a wildcard origin.
	if origins.is_empty() {
		cors.allow_origin(Any)
	} else {
		cors.allow_origin(origins.to_vec()).allow_credentials(true)
	}
}

/// Builds the application router along with its `OpenAPI` document.
pub fn app(state: State) -> Router {
	aide::gen::on_error(|error| tracing::warn!(%error, "failed to generate api docs"));
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();
	let cors = cors(&state.config.cors_origins);

	route::routes()
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(cors),
		)
		.with_state(state)
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();
	trace::init_tracing_subscriber();

	let config = Config::from_env()?;
	let store: SharedStore = match &config.database_url {
		Some(url) => Arc::new(store::postgres::PgStore::connect(url).await?),
		None => {
			tracing::warn!("DATABASE_URL is not set, content is kept in memory and lost on exit");
			Arc::new(store::memory::MemoryStore::new())
		}
	};

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!(address = %listener.local_addr()?, "listening");

	axum::serve(listener, app(State::new(store, config)))
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}
