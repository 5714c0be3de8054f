use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    // Raw HTML is passed through here and filtered by the sanitizer below
    options.render.unsafe_ = true;
    options
});

static SANITIZER: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut builder = ammonia::Builder::default();
    // Syntax highlighting is emitted as inline styles; task lists as checkboxes
    builder
        .add_tags(&["input"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .add_tag_attributes("pre", &["style"])
        .add_tag_attributes("span", &["style"]);
    builder
});

/// How a turn is presented in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderKind {
    /// The user's own message, shown as literal text.
    User,
    /// Transient "thinking" line while a reply is outstanding.
    Pending,
    /// A model reply, rendered from Markdown.
    Reply,
    /// A failure notice. Never part of the transcript.
    Notice,
}

impl RenderKind {
    pub fn is_formatted(self) -> bool {
        matches!(self, RenderKind::Reply)
    }

    pub fn css_class(self) -> &'static str {
        match self {
            RenderKind::User => "user-message",
            RenderKind::Pending => "ai-message pending",
            RenderKind::Reply => "ai-message",
            RenderKind::Notice => "system-message",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogBody {
    /// Inserted as a text node; never parsed as markup.
    Text(String),
    /// Sanitized HTML, safe to insert as markup.
    Html(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: RenderKind,
    pub body: LogBody,
}

impl LogEntry {
    pub fn new(text: &str, kind: RenderKind) -> Self {
        let body = if kind.is_formatted() {
            LogBody::Html(format_reply(text))
        } else {
            LogBody::Text(text.to_string())
        };
        Self { kind, body }
    }
}

pub fn markdown_to_html(md: &str) -> String {
    let adapter = SyntectAdapter::new(Some("base16-ocean.dark"));
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}

pub fn sanitize_html(html: &str) -> String {
    SANITIZER.clean(html).to_string()
}

/// Markdown reply to HTML that is safe to insert into the log.
pub fn format_reply(text: &str) -> String {
    sanitize_html(&markdown_to_html(text))
}
