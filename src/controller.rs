use crate::backend::{ChatBackend, ChatRequest, ChatResult};
use crate::config::ChatConfig;
use crate::render::{LogEntry, RenderKind};
use crate::surface::{ChatLog, MessageInput, SubmitControl};
use crate::types::{Transcript, Turn};

/// A submission that has been rendered and recorded and is waiting for the
/// backend. Only [`ChatController::begin`] creates one, and
/// [`ChatController::finish`] consumes it.
#[derive(Debug)]
pub struct PendingExchange {
    request: ChatRequest,
}

impl PendingExchange {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }
}

/// Drives one chat widget: the log, the input, the send button and the
/// session transcript.
///
/// The controller is idle or busy. Every entry point checks the busy flag, so
/// a second submission while a reply is outstanding is dropped whichever
/// handler it came from.
pub struct ChatController<L: ChatLog, I, S> {
    log: L,
    input: I,
    submit: S,
    config: ChatConfig,
    transcript: Transcript,
    pending: Option<L::Handle>,
    busy: bool,
}

impl<L, I, S> ChatController<L, I, S>
where
    L: ChatLog,
    I: MessageInput,
    S: SubmitControl,
{
    pub fn new(log: L, input: I, submit: S, config: ChatConfig) -> Self {
        let mut controller = Self {
            log,
            input,
            submit,
            config,
            transcript: Transcript::new(),
            pending: None,
            busy: false,
        };
        controller.set_input_enabled(true);
        tracing::info!(assistant = %controller.config.assistant_name, "chat widget ready");
        controller
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn submit_control(&self) -> &S {
        &self.submit
    }

    /// Full exchange: record and render the message, wait for the backend,
    /// then settle. Returns `false` when the submission was ignored.
    pub async fn submit<B>(&mut self, text: &str, backend: &B) -> bool
    where
        B: ChatBackend + ?Sized,
    {
        let Some(exchange) = self.begin(text) else {
            return false;
        };
        let result = backend.send(exchange.request()).await;
        self.finish(exchange, result);
        true
    }

    /// [`Self::submit`] with whatever is currently typed in the input.
    pub async fn submit_input<B>(&mut self, backend: &B) -> bool
    where
        B: ChatBackend + ?Sized,
    {
        let text = self.input.value();
        self.submit(&text, backend).await
    }

    /// First half of a submission, up to the point where the request is ready
    /// to send. `None` means nothing happened: the text was blank or a reply
    /// is still outstanding.
    pub fn begin(&mut self, text: &str) -> Option<PendingExchange> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        if self.busy {
            tracing::debug!("submission ignored while a reply is outstanding");
            return None;
        }

        let history = self.transcript.turns().to_vec();

        self.render(message, RenderKind::User);
        self.transcript.push(Turn::user(message));
        self.input.clear();
        self.busy = true;
        self.set_input_enabled(false);

        self.clear_pending();
        let pending_text = self.config.pending_text();
        self.pending = Some(self.render(&pending_text, RenderKind::Pending));

        tracing::debug!(history_len = history.len(), "sending chat request");
        Some(PendingExchange {
            request: ChatRequest {
                message: message.to_string(),
                history,
            },
        })
    }

    /// [`Self::begin`] with whatever is currently typed in the input.
    pub fn begin_from_input(&mut self) -> Option<PendingExchange> {
        let text = self.input.value();
        self.begin(&text)
    }

    /// Second half of a submission: swap the pending turn for the reply or an
    /// error notice and hand the input back to the user.
    pub fn finish(&mut self, exchange: PendingExchange, result: ChatResult<String>) {
        self.clear_pending();

        match result {
            Ok(reply) => {
                tracing::info!(
                    history_len = exchange.request.history.len(),
                    reply_len = reply.len(),
                    "reply received"
                );
                self.render(&reply, RenderKind::Reply);
                self.transcript.push(Turn::model(reply));
            }
            Err(err) => {
                tracing::error!(error = %err, "chat request failed");
                self.render(&format!("Error: {err}"), RenderKind::Notice);
            }
        }

        self.busy = false;
        self.set_input_enabled(true);
    }

    /// Append one entry to the log and scroll it into view.
    pub fn render(&mut self, text: &str, kind: RenderKind) -> L::Handle {
        let handle = self.log.append(LogEntry::new(text, kind));
        self.log.scroll_to_latest();
        handle
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input.set_disabled(!enabled);
        self.submit.set_disabled(!enabled);
        let placeholder = if enabled {
            &self.config.idle_placeholder
        } else {
            &self.config.busy_placeholder
        };
        self.input.set_placeholder(placeholder);
    }

    fn clear_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.log.remove(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RequestFailure;
    use crate::render::LogBody;
    use async_trait::async_trait;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeLog {
        next_id: usize,
        entries: Vec<(usize, LogEntry)>,
        scrolls: usize,
    }

    impl FakeLog {
        fn kinds(&self) -> Vec<RenderKind> {
            self.entries.iter().map(|(_, entry)| entry.kind).collect()
        }
    }

    impl ChatLog for FakeLog {
        type Handle = usize;

        fn append(&mut self, entry: LogEntry) -> usize {
            let id = self.next_id;
            self.next_id += 1;
            self.entries.push((id, entry));
            id
        }

        fn remove(&mut self, handle: usize) {
            self.entries.retain(|(id, _)| *id != handle);
        }

        fn scroll_to_latest(&mut self) {
            self.scrolls += 1;
        }
    }

    #[derive(Default)]
    struct FakeInput {
        value: String,
        disabled: bool,
        placeholder: String,
    }

    impl MessageInput for FakeInput {
        fn value(&self) -> String {
            self.value.clone()
        }

        fn clear(&mut self) {
            self.value.clear();
        }

        fn set_disabled(&mut self, disabled: bool) {
            self.disabled = disabled;
        }

        fn set_placeholder(&mut self, placeholder: &str) {
            self.placeholder = placeholder.to_string();
        }
    }

    #[derive(Default)]
    struct FakeButton {
        disabled: bool,
    }

    impl SubmitControl for FakeButton {
        fn set_disabled(&mut self, disabled: bool) {
            self.disabled = disabled;
        }

        fn is_disabled(&self) -> bool {
            self.disabled
        }
    }

    /// Replies from a script and remembers every request it saw.
    struct ScriptedBackend {
        replies: RefCell<Vec<ChatResult<String>>>,
        seen: RefCell<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<ChatResult<String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into_iter().rev().collect()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, request: &ChatRequest) -> ChatResult<String> {
            self.seen.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(RequestFailure::Transport("script exhausted".into())))
        }
    }

    type TestController = ChatController<FakeLog, FakeInput, FakeButton>;

    fn controller() -> TestController {
        ChatController::new(
            FakeLog::default(),
            FakeInput::default(),
            FakeButton::default(),
            ChatConfig::default(),
        )
    }

    fn assert_idle(controller: &TestController) {
        assert!(!controller.is_busy());
        assert!(!controller.input().disabled);
        assert!(!controller.submit_control().disabled);
        assert_eq!(controller.input().placeholder, "Type your question...");
    }

    #[test]
    fn starts_idle_with_empty_transcript() {
        let controller = controller();
        assert_idle(&controller);
        assert!(controller.transcript().is_empty());
        assert!(controller.log().entries.is_empty());
    }

    #[test]
    fn blank_text_is_a_no_op() {
        let mut controller = controller();
        let backend = ScriptedBackend::new(vec![]);
        for text in ["", "   ", "\n\t "] {
            let sent = futures::executor::block_on(controller.submit(text, &backend));
            assert!(!sent);
        }
        assert!(controller.transcript().is_empty());
        assert!(controller.log().entries.is_empty());
        assert_eq!(controller.log().scrolls, 0);
        assert!(backend.seen.borrow().is_empty());
        assert_idle(&controller);
    }

    #[test]
    fn begin_marks_busy_and_shows_pending_turn() {
        let mut controller = controller();
        let exchange = controller.begin("  Hello  ").expect("submission accepted");

        assert_eq!(exchange.request().message, "Hello");
        assert!(exchange.request().history.is_empty());
        assert!(controller.is_busy());
        assert!(controller.input().disabled);
        assert!(controller.submit_control().disabled);
        assert_eq!(controller.input().placeholder, "Please wait...");
        assert_eq!(
            controller.log().kinds(),
            vec![RenderKind::User, RenderKind::Pending]
        );
        assert_eq!(
            controller.log().entries[1].1.body,
            LogBody::Text("Turmeric is thinking...".to_string())
        );
        assert_eq!(controller.transcript().turns(), &[Turn::user("Hello")]);
    }

    #[test]
    fn second_submission_while_busy_is_ignored() {
        let mut controller = controller();
        let first = controller.begin("one").expect("first accepted");
        assert!(controller.begin("two").is_none());
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.log().entries.len(), 2);

        controller.finish(first, Ok("ok".to_string()));
        assert!(controller.begin("two").is_some());
    }

    #[test]
    fn successful_exchange_records_user_then_model() {
        let mut controller = controller();
        let backend = ScriptedBackend::new(vec![Ok("**Hi!**".to_string())]);

        assert!(futures::executor::block_on(controller.submit("Hello", &backend)));

        assert_eq!(
            controller.transcript().turns(),
            &[Turn::user("Hello"), Turn::model("**Hi!**")]
        );
        assert_eq!(
            controller.log().kinds(),
            vec![RenderKind::User, RenderKind::Reply]
        );
        match &controller.log().entries[1].1.body {
            LogBody::Html(html) => assert!(html.contains("<strong>Hi!</strong>"), "{html}"),
            other => panic!("reply rendered as {other:?}"),
        }
        assert_idle(&controller);
    }

    #[test]
    fn failed_exchange_keeps_only_user_turn() {
        let mut controller = controller();
        let backend = ScriptedBackend::new(vec![Err(RequestFailure::Status {
            status: 429,
            message: "rate limited".to_string(),
        })]);

        assert!(futures::executor::block_on(controller.submit("Hello", &backend)));

        assert_eq!(controller.transcript().turns(), &[Turn::user("Hello")]);
        assert_eq!(
            controller.log().kinds(),
            vec![RenderKind::User, RenderKind::Notice]
        );
        assert_eq!(
            controller.log().entries[1].1.body,
            LogBody::Text("Error: rate limited".to_string())
        );
        assert_idle(&controller);
    }

    #[test]
    fn history_carries_only_prior_turns() {
        let mut controller = controller();
        let backend = ScriptedBackend::new(vec![
            Ok("We open at 8.".to_string()),
            Err(RequestFailure::Transport("connection refused".to_string())),
            Ok("Fees are listed on the website.".to_string()),
        ]);

        futures::executor::block_on(async {
            controller.submit("When do you open?", &backend).await;
            controller.submit("And close?", &backend).await;
            controller.submit("Fees?", &backend).await;
        });

        let seen = backend.seen.borrow();
        assert!(seen[0].history.is_empty());
        assert_eq!(
            seen[1].history,
            vec![Turn::user("When do you open?"), Turn::model("We open at 8.")]
        );
        // The failed question stays in the transcript with no answer after it
        assert_eq!(
            seen[2].history,
            vec![
                Turn::user("When do you open?"),
                Turn::model("We open at 8."),
                Turn::user("And close?"),
            ]
        );
        assert_eq!(seen[2].message, "Fees?");
        assert_eq!(controller.transcript().len(), 5);
    }

    #[test]
    fn user_markup_is_rendered_literally() {
        let mut controller = controller();
        let _exchange = controller.begin("<b>hi</b>").expect("accepted");
        assert_eq!(
            controller.log().entries[0].1.body,
            LogBody::Text("<b>hi</b>".to_string())
        );
    }

    #[test]
    fn submit_input_reads_and_clears_the_field() {
        let mut controller = controller();
        controller.input.value = "What ages do you take?".to_string();
        let backend = ScriptedBackend::new(vec![Ok("From 6 weeks.".to_string())]);

        assert!(futures::executor::block_on(controller.submit_input(&backend)));

        assert!(controller.input().value.is_empty());
        assert_eq!(backend.seen.borrow()[0].message, "What ages do you take?");
    }

    #[test]
    fn every_render_scrolls_to_latest() {
        let mut controller = controller();
        let backend = ScriptedBackend::new(vec![Ok("hi".to_string())]);
        futures::executor::block_on(controller.submit("hello", &backend));
        // user turn, pending turn, reply
        assert_eq!(controller.log().scrolls, 3);
    }
}
