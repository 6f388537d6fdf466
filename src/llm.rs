//! LLM access through `awful_aj`, with exponential backoff.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for sending text to a model
//! - [`AskFnWrapper`]: adapts `awful_aj::api::ask` to [`AskAsync`]
//! - [`RetryAsk`]: decorator that retries any [`AskAsync`] under a [`Backoff`]
//! - [`LlmPerspectiveGenerator`]: the analyst model as a [`PerspectiveGenerator`]
//!
//! Model endpoint and credentials come from the `awful_aj` configuration file;
//! the conversation shape comes from a named `awful_aj` chat template.

use crate::models::{CounterView, MergedArticle};
use crate::perspective::{build_prompt, parse_counter_view, PerspectiveGenerator};
use crate::retry::{retry, Backoff};
use crate::utils::truncate_for_log;
use awful_aj::api::ask;
use awful_aj::{config, config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Async LLM interaction.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Retries the wrapped client under a [`Backoff`] policy.
pub struct RetryAsk<T> {
    inner: T,
    policy: Backoff,
}

impl<T: AskAsync> RetryAsk<T> {
    pub fn new(inner: T, policy: Backoff) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T: AskAsync> AskAsync for RetryAsk<T> {
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        retry("llm.ask", &self.policy, || self.inner.ask(text)).await
    }
}

/// `awful_aj::api::ask` behind [`AskAsync`].
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        if let Err(e) = &res {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "API call failed");
        }
        res
    }
}

/// Counter views from the configured `awful_aj` model.
#[derive(Debug)]
pub struct LlmPerspectiveGenerator {
    config: AwfulJadeConfig,
    template: ChatTemplate,
    policy: Backoff,
}

impl LlmPerspectiveGenerator {
    /// Load `<awful_aj config dir>/config.yaml` and the chat template `template_name`.
    #[instrument(level = "info")]
    pub async fn load(template_name: &str) -> Result<Self, Box<dyn Error>> {
        let template = template::load_template(template_name).await?;
        info!(template = template_name, "Loaded template");

        let conf_file = config_dir()?.join("config.yaml");
        let config_path = conf_file
            .to_str()
            .ok_or_else(|| format!("config path is not valid UTF-8: {}", conf_file.display()))?;
        let config = config::load_config(config_path)?;
        info!(config_path, "Loaded configuration");

        Ok(Self {
            config,
            template,
            policy: Backoff::LLM,
        })
    }
}

impl PerspectiveGenerator for LlmPerspectiveGenerator {
    #[instrument(level = "info", skip_all, fields(title = %article.title()))]
    async fn generate(&self, article: &MergedArticle) -> Result<CounterView, Box<dyn Error>> {
        let t0 = Instant::now();
        let client = RetryAsk::new(
            AskFnWrapper {
                config: &self.config,
                template: &self.template,
            },
            self.policy,
        );

        let reply = match client.ask(&build_prompt(article)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(elapsed_ms_total = t0.elapsed().as_millis() as u64, error = %e, "Analyst request failed");
                return Err(e);
            }
        };

        match parse_counter_view(&reply, article) {
            Ok(view) => {
                info!(elapsed_ms_total = t0.elapsed().as_millis() as u64, "Counter view parsed");
                Ok(view)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&reply, 300),
                    "Model returned non-conforming JSON"
                );
                Err(e.into())
            }
        }
    }
}
