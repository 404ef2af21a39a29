use axum::extract::State;
use macros::route;

use crate::{
	extract::{ClientIp, Json, Path, Query},
	model::{CategorySummary, Post},
	openapi::tag,
	ratelimit::{Action, Limited},
	store::PostFilter,
	AppState,
};

use super::{model, RouteError};

/// Get categories
/// Returns every category ordered by name, each with its number of published posts.
#[route(tag = tag::CATEGORY, limited)]
pub async fn get_categories(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
) -> Result<Limited<Json<Vec<CategorySummary>>>, RouteError> {
	let admission = state.limiter.admit(&ip, Action::ListCategories)?;
	let categories = state.store.list_categories().await?;

	Ok(Limited(admission, Json(categories)))
}

/// Get posts in category
/// Returns a paginated response of the published posts filed under a category,
/// most recently published first. An unknown category has no posts.
#[route(tag = tag::CATEGORY, limited)]
pub async fn get_category_posts(
	State(state): State<AppState>,
	ClientIp(ip): ClientIp,
	Path(input): Path<model::SlugInput>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Limited<Json<Vec<Post>>>, RouteError> {
	let admission = state.limiter.admit(&ip, Action::CategoryPosts)?;
	let filter = PostFilter {
		category_slug: Some(input.slug),
		..PostFilter::published()
	}
	.page(paginate.limit(), paginate.offset());

	let posts = state.store.list_posts(&filter).await?;

	Ok(Limited(admission, Json(posts)))
}
