mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary and the rest the description.
/// Rate limited routes pass `limited` to document their 429 response.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates two new structs: `CreateX` and `UpdateX` for the model `X`.
/// For both, fields with #[serde(skip_deserializing)] are skipped and all
/// other fields are included with their attributes. Every field of `UpdateX`
/// is wrapped in an `Option`, so an `Option` field becomes `Option<Option<_>>`.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
