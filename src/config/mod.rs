pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::{AdvisorArgs, CliConfig, ResolvedSettings};

#[cfg(feature = "cli")]
mod args {
    use super::toml_config::AdvisorConfig;
    use crate::core::catalog;
    use crate::domain::model::CourseEntry;
    use crate::utils::error::{AdvisorError, Result};
    use crate::utils::validation::{validate_non_empty_string, Validate};
    use clap::{Args, Parser};
    use std::io::Read;

    /// Connection, catalog and logging options shared by both binaries.
    #[derive(Debug, Clone, Default, Args)]
    pub struct AdvisorArgs {
        /// TOML configuration file
        #[arg(long)]
        pub config: Option<String>,

        /// Course catalog JSON file (defaults to the built-in catalog)
        #[arg(long)]
        pub catalog: Option<String>,

        /// API token; falls back to the config file, then HF_TOKEN
        #[arg(long)]
        pub token: Option<String>,

        /// Override the chat-completion endpoint URL
        #[arg(long)]
        pub endpoint: Option<String>,

        /// Override the model id
        #[arg(long)]
        pub model: Option<String>,

        /// Override the request timeout in seconds
        #[arg(long)]
        pub timeout: Option<u64>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    /// Everything a [`RecommendationClient`](crate::RecommendationClient) needs.
    pub struct ResolvedSettings {
        pub config: AdvisorConfig,
        pub token: Option<String>,
        pub catalog: Vec<CourseEntry>,
    }

    impl AdvisorArgs {
        /// Loads the config file, applies flag overrides, validates, picks a
        /// token and loads the catalog. `env_token` is the value of HF_TOKEN.
        pub fn resolve(&self, env_token: Option<String>) -> Result<ResolvedSettings> {
            let mut config = match &self.config {
                Some(path) => {
                    tracing::info!("Loading configuration from: {}", path);
                    AdvisorConfig::from_file(path)?
                }
                None => AdvisorConfig::default(),
            };

            if let Some(endpoint) = &self.endpoint {
                config.endpoint.url = endpoint.clone();
            }
            if let Some(model) = &self.model {
                config.endpoint.model = model.clone();
            }
            if let Some(timeout) = self.timeout {
                config.endpoint.timeout_seconds = timeout;
            }

            config.validate()?;

            let token = resolve_token(
                self.token.as_deref(),
                config.token(),
                env_token.as_deref(),
            );
            if token.is_none() {
                tracing::warn!("No API token found (--token, config file or HF_TOKEN)");
            }

            let catalog = match self.catalog.as_deref().or(config.catalog_path()) {
                Some(path) => catalog::load_catalog(path)?,
                None => catalog::default_catalog()?,
            };
            tracing::debug!("Catalog has {} course(s)", catalog.len());

            Ok(ResolvedSettings {
                config,
                token,
                catalog,
            })
        }
    }

    /// First non-blank of flag, config file, environment.
    pub fn resolve_token(
        flag: Option<&str>,
        config: Option<&str>,
        env: Option<&str>,
    ) -> Option<String> {
        [flag, config, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(str::to_string)
    }

    #[derive(Debug, Clone, Parser)]
    #[command(name = "myca-advisor")]
    #[command(about = "Suggests courses from a student's chat history")]
    pub struct CliConfig {
        /// Chat history text
        #[arg(long, conflicts_with = "input_file")]
        pub text: Option<String>,

        /// Read chat history from a file instead (stdin when neither is given)
        #[arg(long)]
        pub input_file: Option<String>,

        /// Print only the structured result as JSON
        #[arg(long)]
        pub json: bool,

        #[command(flatten)]
        pub advisor: AdvisorArgs,
    }

    impl CliConfig {
        pub fn read_history(&self) -> Result<String> {
            let history = match (&self.text, &self.input_file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            validate_non_empty_string("chat_history", &history).map_err(|_| {
                AdvisorError::ConfigValidationError {
                    field: "chat_history".to_string(),
                    message: "please enter some chat text first".to_string(),
                }
            })?;

            Ok(history)
        }
    }

}
