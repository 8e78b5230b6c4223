use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for the OpenAI-compatible rewrite endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Base URL of the chat-completions API (without the `/chat/completions`
    /// suffix).
    pub base_url: String,

    #[serde(serialize_with = "serialize_secret")]
    pub api_key: Secret<String>,

    pub model: String,

    pub temperature: f32,

    /// Appended to every link's directive as a shared system preamble.
    pub preamble: String,

    /// Upper bound on one rewrite call; the budget that keeps the call
    /// "bounded latency" rather than blocking delivery.
    pub timeout_secs: u64,

    /// Posts longer than this skip the rewrite entirely.
    pub max_source_chars: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: Secret::new(String::new()),
            model: String::new(),
            temperature: 0.7,
            preamble: String::new(),
            timeout_secs: 30,
            max_source_chars: 4000,
        }
    }
}

impl std::fmt::Debug for RewriteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
