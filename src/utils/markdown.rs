use ammonia::Builder;
use comrak::{markdown_to_html, Options};
use std::collections::HashSet;

/// Tags forum content may keep on top of ammonia's defaults.
const FORUM_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "pre", "code", "blockquote", "hr", "table", "thead",
    "tbody", "tr", "th", "td", "img", "input", "del", "details", "summary",
];

const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn forum_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    // Raw HTML passes through comrak and is cleaned below.
    options.render.unsafe_ = true;
    options
}

/// Render a post or comment body to HTML that is safe to inject into a page.
pub fn render_markdown(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let html = markdown_to_html(raw, &forum_options());

    let mut builder = Builder::default();
    builder
        .add_tags(FORUM_TAGS.iter().copied())
        .add_tag_attributes("a", ["href", "title"])
        .add_tag_attributes("img", ["src", "alt", "title"])
        .add_tag_attributes("code", ["class"])
        .add_tag_attributes("input", ["type", "checked", "disabled"])
        .add_tag_attributes("td", ["align"])
        .add_tag_attributes("th", ["align"])
        .url_schemes(LINK_SCHEMES.iter().copied().collect::<HashSet<_>>())
        .link_rel(Some("noopener noreferrer nofollow"));

    builder.clean(&html).to_string()
}
