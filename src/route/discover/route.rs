use axum::extract::State;
use macros::route;

use crate::{
	extract::{ClientIp, Json, Path, Query},
	model::Post,
	openapi::tag,
	ratelimit::{Action, Limited},
	store::PostFilter,
	AppState,
};

use super::{model, RouteError};

/// Search posts
/// Returns up to ten published posts whose title or excerpt contains the query,
/// ignoring case.
#[route(tag = tag::POST, limited)]
pub async fn search(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Query(input): Query<model::SearchInput>,
) -> Result<Limited<Json<Vec<model::SearchHit>>>, RouteError> {
	let admission = state.limiter.admit(&ip, Action::Search)?;
	let filter = PostFilter {
		search: Some(input.q.trim().to_owned()),
		..PostFilter::published()
	}
	.page(model::SEARCH_LIMIT, 0);

	let hits = state
		.store
		.list_posts(&filter)
		.await?
		.into_iter()
		.map(model::SearchHit::from)
		.collect();

	Ok(Limited(admission, Json(hits)))
}

/// Get posts by tag
/// Returns a paginated response of the published posts carrying a tag,
/// most recently published first.
#[route(tag = tag::POST, limited)]
pub async fn get_tag_posts(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Path(input): Path<model::TagInput>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Limited<Json<Vec<Post>>>, RouteError> {
	let admission = state.limiter.admit(&ip, Action::TagPosts)?;
	let filter = PostFilter {
		tag: Some(input.tag.trim().to_lowercase()),
		..PostFilter::published()
	}
	.page(paginate.limit(), paginate.offset());

	let posts = state.store.list_posts(&filter).await?;

	Ok(Limited(admission, Json(posts)))
}
