use aide::axum::{routing::get_with, ApiRouter};

use crate::{error, AppState};

pub mod route;

pub mod model {
	pub use crate::route::model::{Paginate, SlugInput};
}

/// Public category routes only fail with application errors.
pub type RouteError = error::RouteError<std::convert::Infallible>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_categories, get_categories_docs))
		.api_route(
			"/:slug/posts",
			get_with(get_category_posts, get_category_posts_docs),
		)
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_category_listing() {
		let app = server(state());

		register_admin(&app).await;

		let rust = app
			.post("/dashboard/categories")
			.json(&json!({ "name": "Rust", "description": "Systems programming" }))
			.await
			.json::<Value>();

		app.post("/dashboard/categories")
			.json(&json!({ "name": "Gardening" }))
			.await;

		save_post(
			&app,
			json!({
				"title": "Ownership explained",
				"content": "Borrowing rules, in short.",
				"status": "published",
				"category_id": rust["id"],
			}),
		)
		.await;
		save_post(
			&app,
			json!({
				"title": "Lifetimes draft",
				"content": "Coming soon to a blog near you.",
				"category_id": rust["id"],
			}),
		)
		.await;

		let categories = app.get("/categories").await.json::<Value>();

		assert_eq!(categories[0]["name"], "Gardening");
		assert_eq!(categories[0]["post_count"], 0);
		assert_eq!(categories[1]["slug"], "rust");
		assert_eq!(categories[1]["post_count"], 1);

		let posts = app.get("/categories/rust/posts").await.json::<Value>();

		assert_eq!(posts.as_array().unwrap().len(), 1);
		assert_eq!(posts[0]["category"]["name"], "Rust");

		let posts = app.get("/categories/unknown/posts").await.json::<Value>();

		assert_eq!(posts, json!([]));
	}

	#[tokio::test]
	async fn test_listing_is_rate_limited() {
		let app = server(state());

		for _ in 0..10 {
			let response = app
				.get("/categories")
				.add_header(FORWARDED_FOR, ip("192.0.2.10"))
				.await;

			assert_eq!(response.status_code(), 200);
		}

		let response = app
			.get("/categories")
			.add_header(FORWARDED_FOR, ip("192.0.2.10"))
			.await;

		assert_eq!(response.status_code(), 429);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"Too many requests, try again shortly."
		);
	}
}
