use std::borrow::Cow;

use askama::{Error as AskamaError, Template};
use axum::http::StatusCode;
use thiserror::Error;

use crate::application::error::HttpError;
use crate::config::RenderSettings;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(
    template: &T,
    source: &'static str,
) -> Result<String, TemplateRenderError> {
    template
        .render()
        .map_err(|err| TemplateRenderError::new(source, "Template rendering failed", err))
}

/// HTML that is interpolated into a document without escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ChromeView {
    pub site_name: String,
    pub stylesheet_href: String,
    pub script_href: String,
}

#[derive(Template)]
#[template(path = "post.html")]
struct PostTemplate {
    chrome: ChromeView,
    title: String,
    date: String,
    tags_line: Option<String>,
    content: String,
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    chrome: ChromeView,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    chrome: ChromeView,
}

pub struct SnippetItem {
    pub href: String,
    pub title: String,
    pub date: String,
    pub tags_line: Option<String>,
}

#[derive(Template)]
#[template(path = "index_snippet.html")]
struct IndexSnippetTemplate {
    items: Vec<SnippetItem>,
}

/// Fills the fixed document templates.
///
/// Entry metadata is HTML-escaped unless `escape_metadata` is off, in which
/// case it is written verbatim. Body content is always written verbatim and
/// must come wrapped in [`TrustedHtml`].
#[derive(Debug, Clone)]
pub struct PageAssembler {
    chrome: ChromeView,
    escape_metadata: bool,
}

impl PageAssembler {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            chrome: ChromeView {
                site_name: settings.site_name.clone(),
                stylesheet_href: settings.stylesheet_href.clone(),
                script_href: settings.script_href.clone(),
            },
            escape_metadata: settings.escape_metadata,
        }
    }

    pub fn assemble(
        &self,
        title: &str,
        formatted_date: &str,
        tags: &[String],
        content: TrustedHtml,
    ) -> Result<String, TemplateRenderError> {
        let template = PostTemplate {
            chrome: self.chrome.clone(),
            title: self.metadata(title).into_owned(),
            date: self.metadata(formatted_date).into_owned(),
            tags_line: self.tags_line(tags),
            content: content.into_inner(),
        };
        render_template(&template, "presentation::views::PageAssembler::assemble")
    }

    pub fn not_found_page(&self) -> Result<String, TemplateRenderError> {
        render_template(
            &NotFoundTemplate {
                chrome: self.chrome.clone(),
            },
            "presentation::views::PageAssembler::not_found_page",
        )
    }

    pub fn error_page(&self) -> Result<String, TemplateRenderError> {
        render_template(
            &ErrorTemplate {
                chrome: self.chrome.clone(),
            },
            "presentation::views::PageAssembler::error_page",
        )
    }

    /// The "Latest Blog Posts" list. `entries` are `(href, title, formatted date, tags)`.
    pub fn index_snippet<'a, I>(&self, entries: I) -> Result<String, TemplateRenderError>
    where
        I: IntoIterator<Item = (String, &'a str, String, &'a [String])>,
    {
        let items = entries
            .into_iter()
            .map(|(href, title, date, tags)| SnippetItem {
                href: html_escape::encode_double_quoted_attribute(&href).into_owned(),
                title: self.metadata(title).into_owned(),
                date: self.metadata(&date).into_owned(),
                tags_line: self.tags_line(tags),
            })
            .collect();

        render_template(
            &IndexSnippetTemplate { items },
            "presentation::views::PageAssembler::index_snippet",
        )
    }

    fn metadata<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.escape_metadata {
            html_escape::encode_text(value)
        } else {
            Cow::Borrowed(value)
        }
    }

    fn tags_line(&self, tags: &[String]) -> Option<String> {
        if tags.is_empty() {
            return None;
        }
        let joined = tags.join(", ");
        Some(self.metadata(&joined).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler(escape_metadata: bool) -> PageAssembler {
        PageAssembler::new(&RenderSettings {
            escape_metadata,
            ..RenderSettings::default()
        })
    }

    #[test]
    fn document_carries_metadata_and_body() {
        let html = assembler(true)
            .assemble(
                "Hello",
                "January 5, 2024",
                &["rust".to_string(), "web".to_string()],
                TrustedHtml::new("<p>Body</p>"),
            )
            .expect("render");

        assert!(html.contains("<title>Hello - Ray Portfolio Website</title>"));
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("Posted on January 5, 2024"));
        assert!(html.contains("Tags: rust, web"));
        assert!(html.contains("<div class=\"blog-post-content\">"));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains("← Back to Blog Index"));
        assert!(html.contains("href=\"/style.css\""));
        assert!(html.contains("src=\"/script.js\""));
    }

    #[test]
    fn tags_line_is_omitted_without_tags() {
        let html = assembler(true)
            .assemble("T", "", &[], TrustedHtml::new(""))
            .expect("render");
        assert!(!html.contains("Tags:"));
    }

    #[test]
    fn metadata_is_escaped_by_default() {
        let html = assembler(true)
            .assemble(
                "<script>x</script>",
                "",
                &["a&b".to_string()],
                TrustedHtml::new("<em>kept</em>"),
            )
            .expect("render");

        assert!(html.contains("<h1>&lt;script&gt;x&lt;/script&gt;</h1>"));
        assert!(html.contains("Tags: a&amp;b"));
        assert!(html.contains("<em>kept</em>"));
    }

    #[test]
    fn metadata_escaping_can_be_disabled() {
        let html = assembler(false)
            .assemble("<b>Bold</b>", "", &[], TrustedHtml::new(""))
            .expect("render");
        assert!(html.contains("<h1><b>Bold</b></h1>"));
    }

    #[test]
    fn fixed_pages_have_no_grid_markup() {
        let assembler = assembler(true);
        let not_found = assembler.not_found_page().expect("render");
        let error = assembler.error_page().expect("render");

        assert!(not_found.contains("404 - Blog Post Not Found"));
        assert!(error.contains("Error Loading Post"));
        assert!(!not_found.contains("blog-image-grid"));
        assert!(!error.contains("blog-image-grid"));
    }

    #[test]
    fn index_snippet_lists_entries() {
        let tags = vec!["rust".to_string()];
        let html = assembler(true)
            .index_snippet([(
                "/blog/posts/hello.html".to_string(),
                "Hello",
                "January 5, 2024".to_string(),
                tags.as_slice(),
            )])
            .expect("render");

        assert!(html.contains("<h2>Latest Blog Posts</h2>"));
        assert!(html.contains("<a href=\"/blog/posts/hello.html\">Hello</a>"));
        assert!(html.contains("Published: January 5, 2024"));
        assert!(html.contains("Tags: rust"));
    }
}
