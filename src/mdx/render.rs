use std::{collections::HashMap, fmt::Write};

use markdown::mdast::{AlignKind, AttributeContent, AttributeValue, Node, Table};
use schemars::JsonSchema;
use serde::Serialize;

/// Presentational classes of the standard elements.
mod class {
	pub const H1: &str = "mt-2 scroll-m-20 text-4xl font-bold tracking-tight";
	pub const H2: &str = "mt-10 scroll-m-20 border-b pb-1 text-3xl font-semibold tracking-tight first:mt-0";
	pub const H3: &str = "mt-8 scroll-m-20 text-2xl font-semibold tracking-tight";
	pub const H4: &str = "mt-8 scroll-m-20 text-xl font-semibold tracking-tight";
	pub const H5: &str = "mt-8 scroll-m-20 text-lg font-semibold tracking-tight";
	pub const H6: &str = "mt-8 scroll-m-20 text-base font-semibold tracking-tight";
	pub const A: &str = "font-medium underline underline-offset-4";
	pub const P: &str = "leading-7 [&:not(:first-child)]:mt-6";
	pub const UL: &str = "my-6 ml-6 list-disc";
	pub const OL: &str = "my-6 ml-6 list-decimal";
	pub const LI: &str = "mt-2";
	pub const BLOCKQUOTE: &str = "mt-6 border-l-2 pl-6 italic";
	pub const IMG: &str = "rounded-md border";
	pub const HR: &str = "my-4 md:my-8";
	pub const TABLE_WRAPPER: &str = "my-6 w-full overflow-y-auto";
	pub const TABLE: &str = "w-full";
	pub const TR: &str = "m-0 border-t p-0 even:bg-muted";
	pub const TH: &str = "border px-4 py-2 font-bold";
	pub const TD: &str = "border px-4 py-2";
	pub const PRE: &str = "mb-4 mt-6 overflow-x-auto rounded-lg border bg-black py-4";
	pub const CODE: &str = "relative rounded px-[0.3rem] py-[0.2rem] font-mono text-sm";
}

/// Lowercase elements that may be written directly in content.
const INTRINSIC_ELEMENTS: &[&str] = &[
	"abbr",
	"br",
	"details",
	"div",
	"figcaption",
	"figure",
	"kbd",
	"mark",
	"s",
	"small",
	"span",
	"sub",
	"summary",
	"sup",
	"u",
];

/// A heading, as listed in a table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TocEntry {
	pub depth: u8,
	pub id: String,
	pub text: String,
}

/// Display output of MDX content.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Rendered {
	pub html: String,
	pub headings: Vec<TocEntry>,
}

/// The kind of a `<Callout>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
	Default,
	Warning,
	Danger,
	Success,
}

impl CalloutKind {
	/// Unknown kinds fall back to [`CalloutKind::Default`].
	pub fn parse(value: Option<&str>) -> Self {
		match value {
			Some("warning") => Self::Warning,
			Some("danger") => Self::Danger,
			Some("success") => Self::Success,
			_ => Self::Default,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Default => "default",
			Self::Warning => "warning",
			Self::Danger => "danger",
			Self::Success => "success",
		}
	}

	pub fn icon(self) -> &'static str {
		match self {
			Self::Default => "info",
			Self::Warning => "alert-triangle",
			Self::Danger => "x-circle",
			Self::Success => "check-circle",
		}
	}
}

/// Renders MDX content to HTML.
///
/// Content that fails to compile renders as an error block instead.
pub fn render(source: &str) -> Rendered {
	match super::parse(source) {
		Ok(tree) => {
			let mut renderer = Renderer::default();

			renderer.node(&tree);

			Rendered {
				html: renderer.html,
				headings: renderer.headings,
			}
		}
		Err(error) => {
			tracing::warn!(%error, "stored content failed to compile");

			fallback(&error.message)
		}
	}
}

/// Renders on the blocking pool.
pub async fn render_owned(source: String) -> Rendered {
	tokio::task::spawn_blocking(move || render(&source))
		.await
		.unwrap_or_else(|error| fallback(&error.to_string()))
}

fn fallback(message: &str) -> Rendered {
	let mut html = String::from(
		r#"<div class="mdx-error" role="alert"><p class="mdx-error-title">This content could not be displayed.</p><pre class="mdx-error-detail">"#,
	);

	escape_into(&mut html, message);
	html.push_str("</pre></div>");

	Rendered {
		html,
		headings: Vec::new(),
	}
}

/// Generates unique, GitHub-style heading ids.
#[derive(Debug, Default)]
struct HeadingSlugger {
	seen: HashMap<String, usize>,
}

impl HeadingSlugger {
	fn slug(&mut self, text: &str) -> String {
		let base = text
			.trim()
			.to_lowercase()
			.chars()
			.filter_map(|c| match c {
				c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
				c if c.is_whitespace() => Some('-'),
				_ => None,
			})
			.collect::<String>();

		let mut slug = base.clone();

		if let Some(&count) = self.seen.get(&base) {
			let mut count = count;

			loop {
				count += 1;
				slug = format!("{base}-{count}");

				if !self.seen.contains_key(&slug) {
					break;
				}
			}

			self.seen.insert(base, count);
		}

		self.seen.insert(slug.clone(), 0);
		slug
	}
}

#[derive(Debug, Default)]
struct Renderer {
	html: String,
	headings: Vec<TocEntry>,
	slugger: HeadingSlugger,
}

impl Renderer {
	fn push(&mut self, raw: &str) {
		self.html.push_str(raw);
	}

	fn text(&mut self, text: &str) {
		escape_into(&mut self.html, text);
	}

	fn attribute(&mut self, name: &str, value: &str) {
		let _ = write!(self.html, r#" {name}=""#);
		escape_into(&mut self.html, value);
		self.html.push('"');
	}

	fn children(&mut self, children: &[Node]) {
		for child in children {
			self.node(child);
		}
	}

	fn wrap(&mut self, tag: &str, class: &str, children: &[Node]) {
		let _ = write!(self.html, r#"<{tag} class="{class}">"#);
		self.children(children);
		let _ = write!(self.html, "</{tag}>");
	}

	fn node(&mut self, node: &Node) {
		match node {
			Node::Root(root) => self.children(&root.children),
			Node::Heading(heading) => {
				let text = plain_text(&heading.children);
				let id = self.slugger.slug(&text);
				let depth = heading.depth.clamp(1, 6);
				let class = match depth {
					1 => class::H1,
					2 => class::H2,
					3 => class::H3,
					4 => class::H4,
					5 => class::H5,
					_ => class::H6,
				};

				let _ = write!(self.html, "<h{depth}");
				self.attribute("id", &id);
				self.attribute("class", class);
				self.push(">");
				self.children(&heading.children);
				let _ = write!(self.html, "</h{depth}>");

				self.headings.push(TocEntry { depth, id, text });
			}
			Node::Paragraph(paragraph) => self.wrap("p", class::P, &paragraph.children),
			Node::Text(text) => self.text(&text.value),
			Node::Emphasis(emphasis) => {
				self.push("<em>");
				self.children(&emphasis.children);
				self.push("</em>");
			}
			Node::Strong(strong) => {
				self.push("<strong>");
				self.children(&strong.children);
				self.push("</strong>");
			}
			Node::Delete(delete) => {
				self.push("<del>");
				self.children(&delete.children);
				self.push("</del>");
			}
			Node::InlineCode(code) => {
				let _ = write!(self.html, r#"<code class="{}">"#, class::CODE);
				self.text(&code.value);
				self.push("</code>");
			}
			Node::Code(code) => {
				let _ = write!(self.html, r#"<pre class="{}"><code"#, class::PRE);

				if let Some(lang) = &code.lang {
					self.attribute("class", &format!("language-{lang}"));
					self.attribute("data-language", lang);
				}

				self.push(">");
				self.text(&code.value);
				self.push("</code></pre>");
			}
			Node::Blockquote(quote) => self.wrap("blockquote", class::BLOCKQUOTE, &quote.children),
			Node::List(list) => {
				if list.ordered {
					let _ = write!(self.html, r#"<ol class="{}""#, class::OL);

					if let Some(start) = list.start.filter(|start| *start != 1) {
						let _ = write!(self.html, r#" start="{start}""#);
					}

					self.push(">");
					self.children(&list.children);
					self.push("</ol>");
				} else {
					self.wrap("ul", class::UL, &list.children);
				}
			}
			Node::ListItem(item) => {
				let _ = write!(self.html, r#"<li class="{}">"#, class::LI);

				match item.checked {
					Some(true) => self.push(r#"<input type="checkbox" disabled checked /> "#),
					Some(false) => self.push(r#"<input type="checkbox" disabled /> "#),
					None => {}
				}

				self.children(&item.children);
				self.push("</li>");
			}
			Node::ThematicBreak(_) => {
				let _ = write!(self.html, r#"<hr class="{}" />"#, class::HR);
			}
			Node::Break(_) => self.push("<br />"),
			Node::Link(link) => {
				self.push("<a");
				self.attribute("href", &safe_url(&link.url));
				self.attribute("class", class::A);

				if let Some(title) = &link.title {
					self.attribute("title", title);
				}

				if is_external(&link.url) {
					self.push(r#" target="_blank" rel="noopener noreferrer""#);
				}

				self.push(">");
				self.children(&link.children);
				self.push("</a>");
			}
			Node::Image(image) => self.image(&image.url, &image.alt, image.title.as_deref(), None),
			Node::Table(table) => self.table(table),
			Node::Html(html) => self.text(&html.value),
			Node::MdxJsxFlowElement(element) => {
				self.element(element.name.as_deref(), &element.attributes, &element.children);
			}
			Node::MdxJsxTextElement(element) => {
				self.element(element.name.as_deref(), &element.attributes, &element.children);
			}
			Node::MdxFlowExpression(_) | Node::MdxTextExpression(_) | Node::MdxjsEsm(_) => {}
			other => {
				if let Some(children) = other.children() {
					self.children(children);
				}
			}
		}
	}

	fn image(&mut self, src: &str, alt: &str, title: Option<&str>, size: Option<(&str, &str)>) {
		self.push("<img");
		self.attribute("src", &safe_url(src));
		self.attribute("alt", alt);
		self.attribute("class", class::IMG);

		if let Some(title) = title {
			self.attribute("title", title);
		}

		if let Some((width, height)) = size {
			self.attribute("width", width);
			self.attribute("height", height);
		}

		self.push(r#" loading="lazy" />"#);
	}

	fn table(&mut self, table: &Table) {
		let _ = write!(
			self.html,
			r#"<div class="{}"><table class="{}">"#,
			class::TABLE_WRAPPER,
			class::TABLE
		);

		for (index, row) in table.children.iter().enumerate() {
			let (section, cell) = if index == 0 {
				("thead", "th")
			} else {
				("tbody", "td")
			};

			if index <= 1 {
				if index == 1 {
					self.push("</thead>");
				}

				let _ = write!(self.html, "<{section}>");
			}

			let _ = write!(self.html, r#"<tr class="{}">"#, class::TR);

			for (column, child) in row.children().into_iter().flatten().enumerate() {
				let class = if index == 0 { class::TH } else { class::TD };

				let _ = write!(self.html, r#"<{cell} class="{class}""#);

				match table.align.get(column) {
					Some(AlignKind::Left) => self.push(r#" align="left""#),
					Some(AlignKind::Right) => self.push(r#" align="right""#),
					Some(AlignKind::Center) => self.push(r#" align="center""#),
					_ => {}
				}

				self.push(">");

				if let Some(children) = child.children() {
					self.children(children);
				}

				let _ = write!(self.html, "</{cell}>");
			}

			self.push("</tr>");
		}

		match table.children.len() {
			0 => {}
			1 => self.push("</thead>"),
			_ => self.push("</tbody>"),
		}

		self.push("</table></div>");
	}

	fn element(&mut self, name: Option<&str>, attributes: &[AttributeContent], children: &[Node]) {
		match name {
			None => self.children(children),
			Some("Callout") => {
				let kind = CalloutKind::parse(literal(attributes, "type"));

				let _ = write!(
					self.html,
					r#"<div class="callout callout-{}" role="note"><span class="callout-icon" data-icon="{}" aria-hidden="true"></span><div class="callout-body">"#,
					kind.as_str(),
					kind.icon()
				);

				if let Some(title) = literal(attributes, "title") {
					self.push(r#"<p class="callout-title">"#);
					self.text(title);
					self.push("</p>");
				}

				self.children(children);
				self.push("</div></div>");
			}
			Some("Image") => {
				let size = literal(attributes, "width").zip(literal(attributes, "height"));

				self.image(
					literal(attributes, "src").unwrap_or_default(),
					literal(attributes, "alt").unwrap_or_default(),
					literal(attributes, "title"),
					size,
				);
			}
			Some(tag) if INTRINSIC_ELEMENTS.contains(&tag) => {
				let _ = write!(self.html, "<{tag}>");

				if tag != "br" {
					self.children(children);
					let _ = write!(self.html, "</{tag}>");
				}
			}
			Some(component) => {
				self.push("<div");
				self.attribute("data-component", component);
				self.push(">");
				self.children(children);
				self.push("</div>");
			}
		}
	}
}

/// The literal value of the JSX attribute `name`.
fn literal<'a>(attributes: &'a [AttributeContent], name: &str) -> Option<&'a str> {
	attributes.iter().find_map(|attribute| match attribute {
		AttributeContent::Property(property) if property.name == name => {
			match &property.value {
				Some(AttributeValue::Literal(value)) => Some(value.as_str()),
				_ => None,
			}
		}
		_ => None,
	})
}

/// The text content of a list of nodes.
fn plain_text(nodes: &[Node]) -> String {
	fn collect(node: &Node, text: &mut String) {
		match node {
			Node::Text(node) => text.push_str(&node.value),
			Node::InlineCode(node) => text.push_str(&node.value),
			other => {
				for child in other.children().into_iter().flatten() {
					collect(child, text);
				}
			}
		}
	}

	let mut text = String::new();

	for node in nodes {
		collect(node, &mut text);
	}

	text
}

fn is_external(url: &str) -> bool {
	let url = url.trim_start().to_ascii_lowercase();

	url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Neutralises URLs with a scheme that can run script.
fn safe_url(url: &str) -> String {
	let normalized = url
		.chars()
		.filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
		.collect::<String>()
		.to_ascii_lowercase();

	if ["javascript:", "vbscript:", "data:"]
		.iter()
		.any(|scheme| normalized.starts_with(scheme))
	{
		"#".into()
	} else {
		url.trim().to_owned()
	}
}

fn escape_into(out: &mut String, text: &str) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
}
