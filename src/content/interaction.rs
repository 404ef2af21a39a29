use governor::clock::{Clock, DefaultClock};

use crate::{
	ratelimit::{Action, Admission, RateLimiter},
	store::{Store, StoreError},
};

/// What happened to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
	Counted(i64),
	Throttled,
	UnknownPost,
	Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum LikeError {
	#[error("rate limited")]
	RateLimited(Admission),
	#[error("unknown post")]
	UnknownPost,
	#[error(transparent)]
	Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liked {
	pub likes: i64,
	pub admission: Admission,
}

/// Maintains the view and like counters of posts under per-client rate
/// limits.
pub struct Tracker<'a, C: Clock = DefaultClock> {
	store: &'a dyn Store,
	limiter: &'a RateLimiter<C>,
}

impl<'a, C: Clock> Tracker<'a, C> {
	pub fn new(store: &'a dyn Store, limiter: &'a RateLimiter<C>) -> Self {
		Self { store, limiter }
	}

	/// Counts a view of the published post `slug`.
	///
	/// Views never fail the caller: every problem is folded into the
	/// outcome and logged.
	pub async fn increment_view(&self, identity: &str, slug: &str) -> ViewOutcome {
		if !self.limiter.check(identity, Action::View).admitted {
			tracing::debug!(identity, slug, "view throttled");
			return ViewOutcome::Throttled;
		}

		match self.store.record_view(slug).await {
			Ok(Some(views)) => ViewOutcome::Counted(views),
			Ok(None) => ViewOutcome::UnknownPost,
			Err(error) => {
				tracing::warn!(%error, slug, "failed to record view");
				ViewOutcome::Failed
			}
		}
	}

	/// Adds a like to the published post `slug`, or removes one when `like`
	/// is false. The count never goes below zero.
	pub async fn toggle_like(&self, identity: &str, slug: &str, like: bool) -> Result<Liked, LikeError> {
		let admission = self.limiter.check(identity, Action::Like);

		if !admission.admitted {
			tracing::debug!(identity, slug, "like throttled");
			return Err(LikeError::RateLimited(admission));
		}

		let likes = self
			.store
			.record_like(slug, like)
			.await?
			.ok_or(LikeError::UnknownPost)?;

		Ok(Liked { likes, admission })
	}
}

#[cfg(test)]
mod test {
	use std::{sync::Arc, time::Duration};

	use governor::clock::FakeRelativeClock;
	use uuid::Uuid;

	use super::*;
	use crate::{
		model::PostStatus,
		ratelimit::Limits,
		store::{memory::MemoryStore, Counters, PostKey, PostWrite, ProfileSeed},
	};

	async fn store_with_post(slug: &str) -> MemoryStore {
		let store = MemoryStore::new();
		let author = Uuid::new_v4();

		store
			.save_post(
				&ProfileSeed {
					id: author,
					display_name: "Writer".into(),
					email: None,
				},
				&PostWrite {
					id: Uuid::new_v4(),
					create: true,
					slug: slug.into(),
					title: "Counted".into(),
					excerpt: None,
					content: "Some content".into(),
					cover_url: None,
					tags: Vec::new(),
					category_id: None,
					status: PostStatus::Published,
					published_at: Some(chrono::Utc::now()),
					author_id: author,
					counters: Counters::default(),
				},
			)
			.await
			.unwrap();

		store
	}

	fn limiter() -> (RateLimiter<FakeRelativeClock>, FakeRelativeClock) {
		let clock = FakeRelativeClock::default();

		(RateLimiter::with_clock(Limits::default(), clock.clone()), clock)
	}

	#[tokio::test]
	async fn test_like_floor() {
		let store = store_with_post("floor").await;
		let (limiter, clock) = limiter();
		let tracker = Tracker::new(&store, &limiter);

		for _ in 0..3 {
			let liked = tracker.toggle_like("a", "floor", false).await.unwrap();

			assert_eq!(liked.likes, 0);
		}

		clock.advance(Duration::from_secs(60));

		assert_eq!(tracker.toggle_like("a", "floor", true).await.unwrap().likes, 1);
		assert_eq!(tracker.toggle_like("a", "floor", false).await.unwrap().likes, 0);
	}

	#[tokio::test]
	async fn test_sixth_like_is_rejected_until_window_elapses() {
		let store = store_with_post("busy").await;
		let (limiter, clock) = limiter();
		let tracker = Tracker::new(&store, &limiter);

		for expected in 1..=5 {
			assert_eq!(tracker.toggle_like("a", "busy", true).await.unwrap().likes, expected);
		}

		assert!(matches!(
			tracker.toggle_like("a", "busy", true).await,
			Err(LikeError::RateLimited(..))
		));

		clock.advance(Duration::from_secs(60));

		assert_eq!(tracker.toggle_like("a", "busy", true).await.unwrap().likes, 6);
	}

	#[tokio::test]
	async fn test_views() {
		let store = store_with_post("viewed").await;
		let (limiter, _) = limiter();
		let tracker = Tracker::new(&store, &limiter);

		assert_eq!(tracker.increment_view("a", "viewed").await, ViewOutcome::Counted(1));
		assert_eq!(tracker.increment_view("a", "missing").await, ViewOutcome::UnknownPost);

		for _ in 0..8 {
			tracker.increment_view("a", "viewed").await;
		}

		assert_eq!(tracker.increment_view("a", "viewed").await, ViewOutcome::Throttled);
		assert_eq!(tracker.increment_view("b", "viewed").await, ViewOutcome::Counted(10));
	}

	#[tokio::test]
	async fn test_unknown_post_like() {
		let store = MemoryStore::new();
		let (limiter, _) = limiter();
		let tracker = Tracker::new(&store, &limiter);

		assert!(matches!(
			tracker.toggle_like("a", "missing", true).await,
			Err(LikeError::UnknownPost)
		));
	}

	#[tokio::test]
	async fn test_concurrent_likes_are_not_lost() {
		let store = Arc::new(store_with_post("race").await);
		let limiter = Arc::new(RateLimiter::new(Limits::default()));

		let tasks = ["a", "b"].map(|identity| {
			let store = store.clone();
			let limiter = limiter.clone();

			tokio::spawn(async move {
				Tracker::new(store.as_ref(), limiter.as_ref())
					.toggle_like(identity, "race", true)
					.await
					.map(|liked| liked.likes)
			})
		});

		for task in tasks {
			task.await.unwrap().unwrap();
		}

		let post = store
			.find_post(PostKey::Slug("race"))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(post.likes, 2);
	}
}
