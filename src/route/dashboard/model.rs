pub use crate::{
	content::PostInput,
	mdx::{MdxInput, MdxReport, Rendered},
	model::{CreateCategory, UpdateCategory},
	route::model::{IdInput, Paginate},
};

/// Blank descriptions are stored as no description.
pub fn description(description: Option<String>) -> Option<String> {
	description
		.map(|description| description.trim().to_owned())
		.filter(|description| !description.is_empty())
}
