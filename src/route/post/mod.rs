use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_posts, get_posts_docs))
		.api_route("/:slug", get_with(get_post, get_post_docs))
		.api_route("/:slug/related", get_with(get_related_posts, get_related_posts_docs))
		.api_route("/:slug/view", post_with(view_post, view_post_docs))
		.api_route("/:slug/like", post_with(like_post, like_post_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(slug) => vec![error::Message::new("unknown_post").detail("post", slug)],
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_drafts_are_hidden() {
		let app = server(state());

		register_admin(&app).await;

		let draft = save_post(&app, json!({ "title": "Work in progress", "content": "Not yet." })).await;
		let published = save_post(
			&app,
			json!({
				"title": "Hello, World! 2024",
				"content": "# Title\n\nHello there, reader.",
				"status": "published",
				"tags": ["Rust", " rust ", "web"],
			}),
		)
		.await;

		assert_eq!(published["slug"], "hello-world-2024");
		assert_eq!(published["tags"], json!(["rust", "web"]));

		let response = app.get("/posts").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header("x-ratelimit-limit"), "10");

		let posts = response.json::<Value>();

		assert_eq!(posts.as_array().unwrap().len(), 1);
		assert_eq!(posts[0]["slug"], "hello-world-2024");

		let response = app.get(&format!("/posts/{}", draft["slug"].as_str().unwrap())).await;

		assert_eq!(response.status_code(), 404);

		let response = app.get("/posts/hello-world-2024").await;

		assert_eq!(response.status_code(), 200);

		let detail = response.json::<Value>();

		assert_eq!(detail["title"], "Hello, World! 2024");
		assert_eq!(detail["headings"][0]["id"], "title");
		assert!(detail["html"].as_str().unwrap().contains("Hello there, reader."));
	}

	#[tokio::test]
	async fn test_views_always_succeed() {
		let app = server(state());

		register_admin(&app).await;
		save_post(
			&app,
			json!({ "title": "Counting views", "content": "Some content here.", "status": "published" }),
		)
		.await;

		for _ in 0..12 {
			let response = app
				.post("/posts/counting-views/view")
				.add_header(FORWARDED_FOR, ip("198.51.100.1"))
				.await;

			assert_eq!(response.status_code(), 200);
		}

		let response = app.post("/posts/does-not-exist/view").await;

		assert_eq!(response.status_code(), 200);

		let post = app.get("/posts/counting-views").await.json::<Value>();

		assert_eq!(post["views"], 10);
	}

	#[tokio::test]
	async fn test_like_floor_and_rate_limit() {
		let app = server(state());

		register_admin(&app).await;
		save_post(
			&app,
			json!({ "title": "Liking things", "content": "Some content here.", "status": "published" }),
		)
		.await;

		let response = app
			.post("/posts/liking-things/like")
			.add_header(FORWARDED_FOR, ip("198.51.100.2"))
			.json(&json!({ "like": false }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["likes"], 0);

		for expected in 1..=4 {
			let response = app
				.post("/posts/liking-things/like")
				.add_header(FORWARDED_FOR, ip("198.51.100.2"))
				.json(&json!({ "like": true }))
				.await;

			assert_eq!(response.json::<Value>()["likes"], expected);
		}

		let response = app
			.post("/posts/liking-things/like")
			.add_header(FORWARDED_FOR, ip("198.51.100.2"))
			.json(&json!({ "like": true }))
			.await;

		assert_eq!(response.status_code(), 429);
		assert_eq!(response.header("x-ratelimit-limit"), "5");
		assert_eq!(response.header("x-ratelimit-remaining"), "0");
		assert!(response.headers().contains_key("retry-after"));

		let response = app
			.post("/posts/liking-things/like")
			.add_header(FORWARDED_FOR, ip("198.51.100.3"))
			.json(&json!({ "like": true }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["likes"], 5);
	}

	#[tokio::test]
	async fn test_like_unknown_post() {
		let app = server(state());
		let response = app
			.post("/posts/missing/like")
			.json(&json!({ "like": true }))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "unknown_post");
	}

	#[tokio::test]
	async fn test_related_posts() {
		let app = server(state());

		register_admin(&app).await;

		for n in 1..=8 {
			save_post(
				&app,
				json!({
					"title": format!("Field notes {n}"),
					"content": "Some notes from the field.",
					"status": "published",
				}),
			)
			.await;
		}

		save_post(&app, json!({ "title": "Unfinished notes", "content": "Later." })).await;

		let response = app.get("/posts/field-notes-1/related").await;

		assert_eq!(response.status_code(), 200);

		let related = response.json::<Value>();
		let slugs = related
			.as_array()
			.unwrap()
			.iter()
			.map(|post| post["slug"].as_str().unwrap().to_owned())
			.collect::<Vec<_>>();

		assert_eq!(slugs.len(), 6);
		assert!(slugs.iter().all(|slug| slug != "field-notes-1"));
		assert!(slugs.iter().all(|slug| slug.starts_with("field-notes-")));

		let response = app.get("/posts/unfinished-notes/related").await;

		assert_eq!(response.status_code(), 404);
	}
}
