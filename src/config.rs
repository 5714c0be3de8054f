use anyhow::{Context, Result, bail};
use reqwest::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/chat";
pub const DEFAULT_ASSISTANT_NAME: &str = "Turmeric";
pub const DEFAULT_IDLE_PLACEHOLDER: &str = "Type your question...";
pub const DEFAULT_BUSY_PLACEHOLDER: &str = "Please wait...";

const KEY_ENDPOINT: &str = "CHAT_ENDPOINT";
const KEY_ASSISTANT_NAME: &str = "CHAT_ASSISTANT_NAME";
const KEY_IDLE_PLACEHOLDER: &str = "CHAT_IDLE_PLACEHOLDER";
const KEY_BUSY_PLACEHOLDER: &str = "CHAT_BUSY_PLACEHOLDER";

const KEYS: &[&str] = &[
    KEY_ENDPOINT,
    KEY_ASSISTANT_NAME,
    KEY_IDLE_PLACEHOLDER,
    KEY_BUSY_PLACEHOLDER,
];

/// Runtime settings for the chat widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub assistant_name: String,
    pub idle_placeholder: String,
    pub busy_placeholder: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            idle_placeholder: DEFAULT_IDLE_PLACEHOLDER.to_string(),
            busy_placeholder: DEFAULT_BUSY_PLACEHOLDER.to_string(),
        }
    }
}

impl ChatConfig {
    /// Build the config from the bundled `KEY=VALUE` file, then let `.env` and
    /// the process environment override it on native targets.
    #[cfg_attr(target_arch = "wasm32", allow(unused_mut))]
    pub fn load(bundled: &str) -> Result<Self> {
        let mut config = Self::from_bundled(bundled);

        #[cfg(not(target_arch = "wasm32"))]
        {
            // A missing .env is the normal case outside development
            if let Ok(path) = dotenvy::dotenv() {
                tracing::debug!(path = %path.display(), "loaded .env");
            }
            config.apply_lookup(|key| std::env::var(key).ok());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_bundled(bundled: &str) -> Self {
        let mut config = Self::default();
        for line in bundled.lines() {
            let line = line.trim();
            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config.set(key.trim(), value.trim());
            }
        }
        config
    }

    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for &key in KEYS {
            if let Some(value) = lookup(key) {
                self.set(key, value.trim());
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        let slot = match key {
            KEY_ENDPOINT => &mut self.endpoint,
            KEY_ASSISTANT_NAME => &mut self.assistant_name,
            KEY_IDLE_PLACEHOLDER => &mut self.idle_placeholder,
            KEY_BUSY_PLACEHOLDER => &mut self.busy_placeholder,
            other => {
                tracing::warn!(key = other, "ignoring unknown config key");
                return;
            }
        };
        *slot = value.to_string();
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("{KEY_ENDPOINT} is not a valid URL: {}", self.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("{KEY_ENDPOINT} must use http or https, got {}", url.scheme());
        }
        if self.assistant_name.trim().is_empty() {
            bail!("{KEY_ASSISTANT_NAME} must not be empty");
        }
        Ok(())
    }

    /// Text of the transient turn shown while a reply is outstanding.
    pub fn pending_text(&self) -> String {
        format!("{} is thinking...", self.assistant_name)
    }
}
