use aide::axum::{
	routing::{get_with, post_with, put_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	content::SaveError,
	error,
	mdx::CompileError,
	store::{constraint, StoreError},
	AppState,
};

pub mod model;
pub mod route;

/// An error that can occur while managing content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown category {0}")]
	UnknownCategory(Uuid),
	#[error(transparent)]
	InvalidContent(CompileError),
	#[error("slug already taken")]
	SlugTaken,
	#[error("category does not exist")]
	MissingCategory,
	#[error("a category with this name already exists")]
	CategoryTaken,
}

pub type RouteError = error::RouteError<Error>;

impl From<SaveError> for RouteError {
	fn from(error: SaveError) -> Self {
		match error {
			SaveError::Validation(errors) => errors.into(),
			SaveError::Compile(error) => Error::InvalidContent(error).into(),
			SaveError::NotFound(id) => Error::UnknownPost(id).into(),
			SaveError::Store(StoreError::Conflict(c)) if c == constraint::POST_SLUG => {
				Error::SlugTaken.into()
			}
			SaveError::Store(StoreError::MissingReference(c)) if c == constraint::POST_CATEGORY => {
				Error::MissingCategory.into()
			}
			SaveError::Store(error) => error.into(),
		}
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/posts",
			get_with(get_posts, get_posts_docs).post_with(save_post, save_post_docs),
		)
		.api_route(
			"/posts/:id",
			get_with(get_post, get_post_docs).delete_with(delete_post, delete_post_docs),
		)
		.api_route("/stats", get_with(get_stats, get_stats_docs))
		.api_route("/mdx/validate", post_with(validate_mdx, validate_mdx_docs))
		.api_route("/mdx/preview", post_with(preview_mdx, preview_mdx_docs))
		.api_route(
			"/categories",
			post_with(create_category, create_category_docs),
		)
		.api_route(
			"/categories/:id",
			put_with(update_category, update_category_docs)
				.delete_with(delete_category, delete_category_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownCategory(..) => StatusCode::NOT_FOUND,
			Self::InvalidContent(..) | Self::MissingCategory => StatusCode::UNPROCESSABLE_ENTITY,
			Self::SlugTaken | Self::CategoryTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		vec![match self {
			Self::UnknownPost(id) => error::Message::new("unknown_post").detail("post", id),
			Self::UnknownCategory(id) => {
				error::Message::new("unknown_category").detail("category", id)
			}
			Self::InvalidContent(error) => {
				error::Message::new(error.message.as_str()).field("content")
			}
			Self::SlugTaken => error::Message::new(self.to_string()).field("slug"),
			Self::MissingCategory => error::Message::new(self.to_string()).field("category_id"),
			Self::CategoryTaken => error::Message::new(self.to_string()).field("name"),
		}]
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_publish_gating() {
		let app = server(state());

		register_admin(&app).await;

		let response = app
			.post("/dashboard/posts")
			.json(&json!({ "title": "Hi", "content": "Long enough content.", "status": "published" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");
		assert_eq!(app.get("/dashboard/stats").await.json::<Value>()["total_posts"], 0);

		let post = save_post(
			&app,
			json!({ "title": "Hi", "content": "Long enough content.", "status": "draft" }),
		)
		.await;

		assert_eq!(post["status"], "draft");
		assert!(post["published_at"].is_null());
		assert!(post["slug"].as_str().unwrap().starts_with("hi-"));
	}

	#[tokio::test]
	async fn test_published_at_is_kept() {
		let app = server(state());

		register_admin(&app).await;

		let draft = save_post(
			&app,
			json!({ "title": "Lifecycle", "content": "Some content here." }),
		)
		.await;

		assert!(draft["published_at"].is_null());

		let published = save_post(
			&app,
			json!({
				"id": draft["id"],
				"title": "Lifecycle",
				"content": "Some content here.",
				"status": "published",
			}),
		)
		.await;

		let first = published["published_at"].clone();

		assert!(first.is_string());

		let unpublished = save_post(
			&app,
			json!({ "id": draft["id"], "title": "Lifecycle", "content": "Some content here." }),
		)
		.await;

		assert_eq!(unpublished["published_at"], first);

		let republished = save_post(
			&app,
			json!({
				"id": draft["id"],
				"title": "Lifecycle",
				"content": "Some content here.",
				"status": "published",
			}),
		)
		.await;

		assert_eq!(republished["published_at"], first);
		assert_eq!(republished["slug"], "lifecycle");

		let stats = app.get("/dashboard/stats").await.json::<Value>();

		assert_eq!(stats["total_posts"], 1);
		assert_eq!(stats["published"], 1);
		assert_eq!(stats["drafts"], 0);
	}

	#[tokio::test]
	async fn test_invalid_mdx_is_rejected() {
		let app = server(state());

		register_admin(&app).await;

		let response = app
			.post("/dashboard/mdx/validate")
			.json(&json!({ "content": "# Title\n\nHello" }))
			.await;

		assert_eq!(response.json::<Value>(), json!({ "valid": true, "error": null }));

		let report = app
			.post("/dashboard/mdx/validate")
			.json(&json!({ "content": "<Unclosed" }))
			.await
			.json::<Value>();

		assert_eq!(report["valid"], false);
		assert!(!report["error"].as_str().unwrap().is_empty());

		let response = app
			.post("/dashboard/posts")
			.json(&json!({ "title": "Broken draft", "content": "<Unclosed" }))
			.await;

		assert_eq!(response.status_code(), 422);

		let body = response.json::<Value>();

		assert_eq!(body["errors"][0]["field"], "content");
		assert_eq!(body["errors"][0]["content"], report["error"]);
	}

	#[tokio::test]
	async fn test_slug_conflicts_and_missing_posts() {
		let app = server(state());

		register_admin(&app).await;
		save_post(&app, json!({ "title": "Taken", "content": "First one." })).await;

		let response = app
			.post("/dashboard/posts")
			.json(&json!({ "title": "Another", "slug": "taken", "content": "Second one." }))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "slug");

		let id = "00000000-0000-4000-8000-000000000000";
		let response = app
			.post("/dashboard/posts")
			.json(&json!({ "id": id, "title": "Ghost", "content": "Nobody home." }))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(app.delete(&format!("/dashboard/posts/{id}")).await.status_code(), 404);

		let response = app
			.post("/dashboard/posts")
			.json(&json!({ "title": "Orphan", "content": "Nowhere.", "category_id": id }))
			.await;

		assert_eq!(response.status_code(), 422);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "category_id");
	}

	#[tokio::test]
	async fn test_deleting_a_category_keeps_its_posts() {
		let app = server(state());

		register_admin(&app).await;

		let category = app
			.post("/dashboard/categories")
			.json(&json!({ "name": "Travel notes", "description": "  " }))
			.await
			.json::<Value>();

		assert_eq!(category["slug"], "travel-notes");
		assert!(category["description"].is_null());

		let response = app
			.post("/dashboard/categories")
			.json(&json!({ "name": "Travel Notes" }))
			.await;

		assert_eq!(response.status_code(), 409);

		let id = category["id"].as_str().unwrap();
		let renamed = app
			.put(&format!("/dashboard/categories/{id}"))
			.json(&json!({ "name": "Journeys", "description": "Far away" }))
			.await
			.json::<Value>();

		assert_eq!(renamed["slug"], "journeys");
		assert_eq!(renamed["description"], "Far away");

		let post = save_post(
			&app,
			json!({
				"title": "Lisbon",
				"content": "Trams and tiles.",
				"status": "published",
				"category_id": id,
			}),
		)
		.await;

		assert_eq!(post["category"]["slug"], "journeys");

		let response = app.delete(&format!("/dashboard/categories/{id}")).await;

		assert_eq!(response.status_code(), 200);

		let response = app.get("/posts").await;

		assert_eq!(response.status_code(), 200);

		let posts = response.json::<Value>();

		assert!(posts[0]["category"].is_null());
		assert!(posts[0]["category_id"].is_null());

		let response = app.delete(&format!("/dashboard/categories/{id}")).await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_blank_category_names_are_rejected() {
		let app = server(state());

		register_admin(&app).await;

		let response = app.post("/dashboard/categories").json(&json!({ "name": "   " })).await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "name");

		let category = app
			.post("/dashboard/categories")
			.json(&json!({ "name": "Recipes" }))
			.await
			.json::<Value>();
		let id = category["id"].as_str().unwrap();

		let response = app
			.put(&format!("/dashboard/categories/{id}"))
			.json(&json!({ "name": "\t " }))
			.await;

		assert_eq!(response.status_code(), 400);

		let categories = app.get("/categories").await.json::<Value>();

		assert_eq!(categories.as_array().unwrap().len(), 1);
		assert_eq!(categories[0]["name"], "Recipes");
	}

	#[tokio::test]
	async fn test_listing_includes_drafts() {
		let app = server(state());

		register_admin(&app).await;
		save_post(&app, json!({ "title": "Draft one", "content": "Some content." })).await;

		let published = save_post(
			&app,
			json!({ "title": "Published one", "content": "Some content.", "status": "published" }),
		)
		.await;

		let posts = app.get("/dashboard/posts").await.json::<Value>();

		assert_eq!(posts.as_array().unwrap().len(), 2);
		assert_eq!(posts[0]["title"], "Published one");

		let id = published["id"].as_str().unwrap();
		let response = app.get(&format!("/dashboard/posts/{id}")).await;

		assert_eq!(response.json::<Value>()["title"], "Published one");
		assert_eq!(app.delete(&format!("/dashboard/posts/{id}")).await.status_code(), 200);
		assert_eq!(app.get(&format!("/dashboard/posts/{id}")).await.status_code(), 404);

		let preview = app
			.post("/dashboard/mdx/preview")
			.json(&json!({ "content": "<Callout type=\"warning\">Careful</Callout>" }))
			.await
			.json::<Value>();

		assert!(preview["html"].as_str().unwrap().contains("alert-triangle"));
	}
}
