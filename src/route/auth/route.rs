use argon2::Argon2;
use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	model::{Profile, Role},
	openapi::tag,
	session::{self, SetCookie},
	store::{constraint, NewAccount, ProfileUpdate, StoreError},
	AppState, SharedStore,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the account's id as a salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Log in
/// Logs in to an account, returning an associated session cookie and the account's profile.
#[route(tag = tag::AUTH)]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<SetCookie<Json<Profile>>, RouteError> {
	let email = auth.email.trim().to_lowercase();
	let Some(account) = state.store.find_account_by_email(&email).await? else {
		return Err(Error::InvalidEmailOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &auth.password, &account.id).map_err(Error::Argon)?;

	if account.password != hashed {
		return Err(Error::InvalidEmailOrPassword.into());
	}

	let session_id = state.store.create_session(account.id).await?;
	let profile = state
		.store
		.find_session_profile(session_id)
		.await?
		.ok_or(Error::InvalidSessionCookie)?;

	tracing::info!(profile_id = %profile.id, "logged in");

	Ok(SetCookie(session::create_cookie(session_id), Json(profile)))
}

/// Log out
/// Logs out of the authenticated account and clears the session cookie.
#[route(tag = tag::AUTH)]
pub async fn logout(
	State(store): State<SharedStore>,
	session: Session,
) -> Result<SetCookie<()>, RouteError> {
	store.delete_session(session.id).await?;

	Ok(SetCookie(session::clear_cookie(), ()))
}

/// Register account
/// Registers a new account, returning an associated session cookie and the new profile.
#[route(tag = tag::AUTH)]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<SetCookie<Json<Profile>>, RouteError> {
	if !state.config.signup_enabled {
		return Err(Error::SignupDisabled.into());
	}

	let id = Uuid::new_v4();
	let email = auth.email.trim().to_lowercase();
	let hashed = hash_password(&state.hasher, &auth.password, &id).map_err(Error::Argon)?;
	let role = if state.config.is_admin_email(&email) {
		Role::Admin
	} else {
		Role::Member
	};

	let profile = state
		.store
		.create_account(&NewAccount {
			id,
			email,
			password: hashed.to_vec(),
			display_name: auth.display_name,
			role,
		})
		.await
		.map_err(|e| match e {
			StoreError::Conflict(ref c) if c == constraint::ACCOUNT_EMAIL => Error::EmailTaken.into(),
			e => RouteError::from(e),
		})?;

	let session_id = state.store.create_session(profile.id).await?;

	tracing::info!(profile_id = %profile.id, role = role.as_str(), "registered account");

	Ok(SetCookie(session::create_cookie(session_id), Json(profile)))
}

/// Get profile
/// Returns the profile of the authenticated account.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<Profile> {
	Json(session.profile)
}

/// Update profile
/// Updates the display name, avatar or bio of the authenticated account.
#[route(tag = tag::AUTH)]
pub async fn update_me(
	State(store): State<SharedStore>,
	session: Session,
	Json(input): Json<model::UpdateProfileInput>,
) -> Result<Json<Profile>, RouteError> {
	let profile = store
		.update_profile(
			session.profile.id,
			&ProfileUpdate {
				display_name: input.display_name,
				avatar_url: input.avatar_url,
				bio: input.bio,
			},
		)
		.await?
		.ok_or(Error::InvalidSessionCookie)?;

	Ok(Json(profile))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_hash_is_salted_by_id() {
		let hasher = Argon2::default();
		let password = "hunter2hunter";

		let first = hash_password(&hasher, password, &Uuid::new_v4()).unwrap();
		let second = hash_password(&hasher, password, &Uuid::new_v4()).unwrap();

		assert_ne!(first, second);
	}
}
