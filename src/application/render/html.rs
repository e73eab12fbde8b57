use comrak::options::Options;

/// Converts one unit of markdown into block-level HTML.
///
/// Implementations must be deterministic. Output is not sanitised.
pub trait HtmlRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// GitHub-flavoured rendering through comrak, with raw HTML passed through.
#[derive(Debug, Clone)]
pub struct ComrakHtmlRenderer {
    options: Options<'static>,
}

impl ComrakHtmlRenderer {
    pub fn new() -> Self {
        Self {
            options: default_options(),
        }
    }
}

impl Default for ComrakHtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer for ComrakHtmlRenderer {
    fn render(&self, markdown: &str) -> String {
        comrak::markdown_to_html(markdown, &self.options)
    }
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.r#unsafe = true;
    render.sourcepos = false;

    options
}
