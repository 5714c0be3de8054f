use crate::backend::{ChatBackend, HttpBackend};
use crate::config::ChatConfig;
use crate::controller::ChatController;
use crate::render::{LogBody, LogEntry};
use crate::surface::{ChatLog, MessageInput, SubmitControl};
use dioxus::events::Key;
use dioxus::prelude::*;

const CHAT_CSS: Asset = asset!("/assets/chat.css");

const LOG_ELEMENT_ID: &str = "chat-window";

type WidgetController = ChatController<SignalLog, SignalInput, SignalButton>;

#[derive(Clone, Debug, PartialEq)]
struct LogRow {
    id: u64,
    entry: LogEntry,
}

/// Log rows live in a signal; scrolling is requested by bumping a counter that
/// an effect watches, so it runs after the new row is on screen.
struct SignalLog {
    rows: Signal<Vec<LogRow>>,
    scroll_requests: Signal<u64>,
    next_id: u64,
}

impl ChatLog for SignalLog {
    type Handle = u64;

    fn append(&mut self, entry: LogEntry) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.write().push(LogRow { id, entry });
        id
    }

    fn remove(&mut self, handle: u64) {
        self.rows.write().retain(|row| row.id != handle);
    }

    fn scroll_to_latest(&mut self) {
        *self.scroll_requests.write() += 1;
    }
}

#[derive(Clone, Copy)]
struct SignalInput {
    value: Signal<String>,
    disabled: Signal<bool>,
    placeholder: Signal<String>,
}

impl MessageInput for SignalInput {
    fn value(&self) -> String {
        self.value.cloned()
    }

    fn clear(&mut self) {
        self.value.set(String::new());
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled.set(disabled);
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        self.placeholder.set(placeholder.to_string());
    }
}

#[derive(Clone, Copy)]
struct SignalButton {
    disabled: Signal<bool>,
}

impl SubmitControl for SignalButton {
    fn set_disabled(&mut self, disabled: bool) {
        self.disabled.set(disabled);
    }

    fn is_disabled(&self) -> bool {
        (self.disabled)()
    }
}

fn scroll_script() -> String {
    format!(
        r#"const log = document.getElementById("{LOG_ELEMENT_ID}");
if (log) {{ log.scrollTop = log.scrollHeight; }}"#
    )
}

fn send_message(mut controller: Signal<WidgetController>, backend: HttpBackend) {
    let Some(exchange) = controller.write().begin_from_input() else {
        return;
    };
    spawn(async move {
        let result = backend.send(exchange.request()).await;
        controller.write().finish(exchange, result);
    });
}

#[component]
pub fn App() -> Element {
    let config = use_context::<ChatConfig>();
    let backend = use_hook(|| HttpBackend::new(config.endpoint.clone()));

    let rows = use_signal(Vec::<LogRow>::new);
    let scroll_requests = use_signal(|| 0u64);
    let mut input_value = use_signal(String::new);
    let input_disabled = use_signal(|| false);
    let placeholder = use_signal(String::new);
    let button_disabled = use_signal(|| false);

    let controller = use_signal(|| {
        ChatController::new(
            SignalLog {
                rows,
                scroll_requests,
                next_id: 0,
            },
            SignalInput {
                value: input_value,
                disabled: input_disabled,
                placeholder,
            },
            SignalButton {
                disabled: button_disabled,
            },
            config.clone(),
        )
    });

    use_effect(move || {
        if scroll_requests() > 0 {
            let _ = document::eval(&scroll_script());
        }
    });

    let rows_snapshot = rows();
    let title = format!("Chat with {}", config.assistant_name);
    let click_backend = backend.clone();
    let key_backend = backend;

    rsx! {
        document::Link { rel: "stylesheet", href: CHAT_CSS }
        div { class: "chat-container",
            div { class: "chat-header",
                h1 { "{title}" }
            }
            div { id: LOG_ELEMENT_ID, class: "chat-window",
                for row in rows_snapshot {
                    MessageRow { key: "{row.id}", entry: row.entry }
                }
            }
            div { class: "chat-input",
                input {
                    id: "message-input",
                    r#type: "text",
                    value: "{input_value}",
                    placeholder: "{placeholder}",
                    disabled: input_disabled(),
                    autofocus: true,
                    oninput: move |ev| input_value.set(ev.value()),
                    onkeydown: move |ev| {
                        if ev.key() == Key::Enter && !button_disabled() {
                            ev.prevent_default();
                            send_message(controller, key_backend.clone());
                        }
                    },
                }
                button {
                    id: "send-button",
                    r#type: "button",
                    disabled: button_disabled(),
                    onclick: move |_| send_message(controller, click_backend.clone()),
                    "Send"
                }
            }
        }
    }
}

#[component]
fn MessageRow(entry: LogEntry) -> Element {
    let class = entry.kind.css_class();
    match entry.body {
        LogBody::Text(text) => rsx! {
            div { class: "message {class}", "{text}" }
        },
        LogBody::Html(html) => rsx! {
            div { class: "message {class}", dangerous_inner_html: "{html}" }
        },
    }
}
