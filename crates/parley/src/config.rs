//! Settings read from the environment.

use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use parley_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

/// Variable holding the model name.
pub const MODEL_NAME: &str = "MODEL_NAME";
/// Variable holding the sampling temperature.
pub const MODEL_TEMPERATURE: &str = "MODEL_TEMPERATURE";
/// Variable holding the API key of the provider.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Variable holding the endpoint of the provider, optional.
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

const LEGACY_MODEL_NAME: &str = "OPENAI_API_MODEL";
const LEGACY_MODEL_TEMPERATURE: &str = "OPENAI_API_TEMPERATURE";

/// Why the settings could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    Missing(&'static str),
    /// The temperature is not a finite number.
    InvalidTemperature(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "environment variable {name} is not set")
            }
            ConfigError::InvalidTemperature(value) => {
                write!(f, "{MODEL_TEMPERATURE} is not a number: {value:?}")
            }
        }
    }
}

impl StdError for ConfigError {}

/// Everything needed to construct the agent.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// Model identifier sent to the provider.
    pub model_name: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Bearer token for the provider.
    pub api_key: String,
    /// OpenAI-compatible endpoint, the public API if `None`.
    pub base_url: Option<String>,
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// A `.env` file is not read here, load it before calling this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to
    /// its value. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let model_name = get(MODEL_NAME)
            .or_else(|| get(LEGACY_MODEL_NAME))
            .ok_or(ConfigError::Missing(MODEL_NAME))?;
        let temperature = get(MODEL_TEMPERATURE)
            .or_else(|| get(LEGACY_MODEL_TEMPERATURE))
            .ok_or(ConfigError::Missing(MODEL_TEMPERATURE))?;
        let temperature = parse_temperature(&temperature)?;
        let api_key =
            get(OPENAI_API_KEY).ok_or(ConfigError::Missing(OPENAI_API_KEY))?;

        Ok(Self {
            model_name,
            temperature,
            api_key,
            base_url: get(OPENAI_BASE_URL),
        })
    }

    /// Builds the provider configuration.
    pub fn provider_config(&self) -> OpenAIConfig {
        let mut builder = OpenAIConfigBuilder::with_api_key(&self.api_key)
            .with_model(&self.model_name)
            .with_temperature(self.temperature);
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn parse_temperature(value: &str) -> Result<f32, ConfigError> {
    match value.trim().parse::<f32>() {
        Ok(temperature) if temperature.is_finite() => Ok(temperature),
        _ => Err(ConfigError::InvalidTemperature(value.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(
        vars: &'a [(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |name| vars.get(name).map(|value| value.to_string())
    }

    #[test]
    fn test_complete_settings() {
        let settings = Settings::from_lookup(lookup(&[
            ("MODEL_NAME", "gpt-4o-mini"),
            ("MODEL_TEMPERATURE", "0.5"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
        ]))
        .unwrap();

        assert_eq!(settings.model_name, "gpt-4o-mini");
        assert_eq!(settings.temperature, 0.5);
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert!(!format!("{settings:?}").contains("sk-test"));

        let config = settings.provider_config();
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.temperature(), Some(0.5));
    }

    #[test]
    fn test_legacy_names() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_MODEL", "gpt-3.5-turbo"),
            ("OPENAI_API_TEMPERATURE", "0"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(settings.model_name, "gpt-3.5-turbo");
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.base_url, None);
    }

    #[test]
    fn test_missing_or_empty() {
        let err = Settings::from_lookup(lookup(&[
            ("MODEL_NAME", ""),
            ("MODEL_TEMPERATURE", "0.5"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(MODEL_NAME));

        let err = Settings::from_lookup(lookup(&[
            ("MODEL_NAME", "gpt-4o-mini"),
            ("MODEL_TEMPERATURE", "0.5"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(OPENAI_API_KEY));
        assert_eq!(
            err.to_string(),
            "environment variable OPENAI_API_KEY is not set"
        );
    }

    #[test]
    fn test_invalid_temperature() {
        for value in ["warm", "NaN", "inf"] {
            let err = Settings::from_lookup(lookup(&[
                ("MODEL_NAME", "gpt-4o-mini"),
                ("MODEL_TEMPERATURE", value),
                ("OPENAI_API_KEY", "sk-test"),
            ]))
            .unwrap_err();
            assert_eq!(err, ConfigError::InvalidTemperature(value.to_owned()));
        }

        // Out of range values are left to the provider.
        let settings = Settings::from_lookup(lookup(&[
            ("MODEL_NAME", "gpt-4o-mini"),
            ("MODEL_TEMPERATURE", " 7 "),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(settings.temperature, 7.0);
    }
}
