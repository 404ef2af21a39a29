use aide::axum::ApiRouter;

use crate::AppState;

pub mod auth;
pub mod category;
pub mod dashboard;
pub mod discover;
pub mod docs;
pub mod model;
pub mod post;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.nest("/auth", auth::routes())
		.nest("/posts", post::routes())
		.nest("/categories", category::routes())
		.nest("/dashboard", dashboard::routes())
		.nest("/docs", docs::routes())
		.merge(discover::routes())
}
