use aide::axum::{routing::get_with, ApiRouter};

use crate::{error, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<std::convert::Infallible>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/search", get_with(search, search_docs))
		.api_route("/tags/:tag/posts", get_with(get_tag_posts, get_tag_posts_docs))
}
