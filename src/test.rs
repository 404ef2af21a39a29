pub use axum::http::{HeaderName, HeaderValue};
pub use axum_test::TestServer;
pub use serde_json::{json, Value};

use std::sync::Arc;

use crate::{app, config::Config, extract::X_FORWARDED_FOR, store::memory::MemoryStore, State};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const FORWARDED_FOR: HeaderName = HeaderName::from_static(X_FORWARDED_FOR);

/// A fresh in-memory state whose admin list contains [`ADMIN_EMAIL`].
pub fn state() -> State {
	State::new(
		Arc::new(MemoryStore::new()),
		Config {
			admin_emails: vec![ADMIN_EMAIL.into()],
			..Config::default()
		},
	)
}

/// A test server that keeps the cookies it receives, like a browser.
pub fn server(state: State) -> TestServer {
	let mut server = TestServer::new(app(state)).unwrap();

	server.do_save_cookies();
	server
}

pub fn ip(ip: &'static str) -> HeaderValue {
	HeaderValue::from_static(ip)
}

/// Registers the admin account, leaving the server logged in as it.
pub async fn register_admin(server: &TestServer) {
	let response = server
		.post("/auth/register")
		.json(&json!({
			"email": ADMIN_EMAIL,
			"password": "correct horse battery",
			"display_name": "Admin",
		}))
		.await;

	assert_eq!(response.status_code(), 200);
}

/// Saves a post through the dashboard and returns it.
pub async fn save_post(server: &TestServer, post: Value) -> Value {
	let response = server.post("/dashboard/posts").json(&post).await;

	assert_eq!(response.status_code(), 200, "{}", response.text());
	response.json()
}
