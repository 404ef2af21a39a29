use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The name shown next to your posts.
	#[validate(length(min = 1, max = 64))]
	pub display_name: Option<String>,
}

/// Fields left out are kept as they are.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdateProfileInput {
	#[validate(length(min = 1, max = 64))]
	pub display_name: Option<String>,
	#[validate(url)]
	pub avatar_url: Option<String>,
	#[validate(length(max = 500))]
	pub bio: Option<String>,
}
