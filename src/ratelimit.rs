use std::{
	num::NonZeroUsize,
	sync::{Mutex, PoisonError},
	time::Duration,
};

use aide::OperationOutput;
use axum::{
	body::Body,
	http::{header, HeaderMap, HeaderName, HeaderValue},
	response::{IntoResponse, Response},
};
use governor::clock::{Clock, DefaultClock, Reference};
use lru::LruCache;

use crate::error::AppError;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// The kind of action being admitted. Every kind has its own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	View,
	Like,
	ListPosts,
	PostDetail,
	RelatedPosts,
	ListCategories,
	CategoryPosts,
	TagPosts,
	Search,
}

impl Action {
	/// The number of admissions per window.
	pub fn ceiling(self) -> u32 {
		match self {
			Self::Like => 5,
			Self::View | Self::ListPosts | Self::ListCategories => 10,
			Self::CategoryPosts | Self::TagPosts | Self::Search => 15,
			Self::PostDetail | Self::RelatedPosts => 20,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::View => "view",
			Self::Like => "like",
			Self::ListPosts => "list-posts",
			Self::PostDetail => "post-detail",
			Self::RelatedPosts => "related-posts",
			Self::ListCategories => "list-categories",
			Self::CategoryPosts => "category-posts",
			Self::TagPosts => "tag-posts",
			Self::Search => "search",
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct Limits {
	/// The maximum number of identity and action buckets tracked at once.
	pub capacity: NonZeroUsize,
	pub window: Duration,
}

impl Default for Limits {
	fn default() -> Self {
		Self {
			capacity: NonZeroUsize::new(500).unwrap_or(NonZeroUsize::MIN),
			window: Duration::from_secs(60),
		}
	}
}

/// The outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
	pub admitted: bool,
	pub limit: u32,
	pub remaining: u32,
	/// Time until the bucket resets.
	pub retry_after: Duration,
}

impl Admission {
	/// Writes the rate limit headers. `retry-after` is only set on rejection.
	pub fn apply(&self, headers: &mut HeaderMap) {
		headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
		headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));

		if !self.admitted {
			let seconds = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);

			headers.insert(header::RETRY_AFTER, HeaderValue::from(seconds.max(1)));
		}
	}
}

#[derive(Debug)]
struct Bucket<I> {
	started: I,
	count: u32,
}

/// A fixed-window counter keyed by client identity and action.
///
/// At most `capacity` buckets are kept; when full, the least recently used
/// bucket is forgotten, so an evicted client starts over with a fresh budget.
pub struct RateLimiter<C: Clock = DefaultClock> {
	clock: C,
	window: Duration,
	buckets: Mutex<LruCache<(String, Action), Bucket<C::Instant>>>,
}

impl RateLimiter {
	pub fn new(limits: Limits) -> Self {
		Self::with_clock(limits, DefaultClock::default())
	}
}

impl<C: Clock> RateLimiter<C> {
	pub fn with_clock(limits: Limits, clock: C) -> Self {
		Self {
			clock,
			window: limits.window,
			buckets: Mutex::new(LruCache::new(limits.capacity)),
		}
	}

	/// Counts one attempt of `action` by `identity`.
	///
	/// The window of a bucket starts with its first admitted attempt.
	/// Rejected attempts do not extend it.
	pub fn check(&self, identity: &str, action: Action) -> Admission {
		let now = self.clock.now();
		let limit = action.ceiling();
		let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

		let bucket = buckets.get_or_insert_mut((identity.to_owned(), action), || Bucket {
			started: now,
			count: 0,
		});

		let mut elapsed: Duration = now.duration_since(bucket.started).into();

		if elapsed >= self.window {
			bucket.started = now;
			bucket.count = 0;
			elapsed = Duration::ZERO;
		}

		let retry_after = self.window - elapsed;

		if bucket.count < limit {
			bucket.count += 1;

			Admission {
				admitted: true,
				limit,
				remaining: limit - bucket.count,
				retry_after,
			}
		} else {
			Admission {
				admitted: false,
				limit,
				remaining: 0,
				retry_after,
			}
		}
	}

	/// Like [`RateLimiter::check`], but turns a rejection into an error.
	pub fn admit(&self, identity: &str, action: Action) -> Result<Admission, AppError> {
		let admission = self.check(identity, action);

		if admission.admitted {
			Ok(admission)
		} else {
			tracing::debug!(identity, action = action.as_str(), "rate limited");

			Err(AppError::RateLimited(admission))
		}
	}

	/// The number of buckets currently tracked.
	pub fn len(&self) -> usize {
		self.buckets
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}
}

/// A response that carries the rate limit headers of its admission.
pub struct Limited<T>(pub Admission, pub T);

impl<T: IntoResponse> IntoResponse for Limited<T> {
	fn into_response(self) -> Response<Body> {
		let mut response = self.1.into_response();

		self.0.apply(response.headers_mut());
		response
	}
}

impl<T: OperationOutput> OperationOutput for Limited<T> {
	type Inner = T::Inner;

	fn operation_response(
		ctx: &mut aide::gen::GenContext,
		operation: &mut aide::openapi::Operation,
	) -> Option<aide::openapi::Response> {
		T::operation_response(ctx, operation)
	}

	fn inferred_responses(
		ctx: &mut aide::gen::GenContext,
		operation: &mut aide::openapi::Operation,
	) -> Vec<(Option<u16>, aide::openapi::Response)> {
		T::inferred_responses(ctx, operation)
	}
}
