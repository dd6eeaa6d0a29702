use crate::error::{CaseReviewError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TITLE_MAX_TOKENS: u32 = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Parameters for calls to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Output budget for the one-line title request.
    pub title_max_tokens: u32,
    /// Per-request timeout applied by the HTTP backend.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Prepend the built-in example case and review to every generation.
    pub few_shot: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            title_max_tokens: DEFAULT_TITLE_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            few_shot: false,
        }
    }
}

impl GenerationSettings {
    /// Defaults overridden by `CASE_REVIEW_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(model) = lookup("CASE_REVIEW_MODEL").filter(|m| !m.trim().is_empty()) {
            settings.model = model.trim().to_string();
        }
        if let Some(value) = lookup("CASE_REVIEW_MAX_TOKENS") {
            settings.max_output_tokens = parse_var("CASE_REVIEW_MAX_TOKENS", &value)?;
        }
        if let Some(value) = lookup("CASE_REVIEW_TEMPERATURE") {
            settings.temperature = parse_var("CASE_REVIEW_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("CASE_REVIEW_TIMEOUT_SECS") {
            settings.timeout = Duration::from_secs(parse_var("CASE_REVIEW_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("CASE_REVIEW_FEW_SHOT") {
            settings.few_shot = parse_flag("CASE_REVIEW_FEW_SHOT", &value)?;
        }

        settings.validate()?;
        debug!("Generation settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(CaseReviewError::Config("model name must not be empty".to_string()));
        }
        if self.max_output_tokens == 0 || self.title_max_tokens == 0 {
            return Err(CaseReviewError::Config(
                "token budgets must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(CaseReviewError::Config(format!(
                "temperature {} must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        if self.timeout.is_zero() {
            return Err(CaseReviewError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CaseReviewError::Config(format!("{}={:?}: {}", key, value, e)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(CaseReviewError::Config(format!(
            "{}={:?}: expected true or false",
            key, value
        ))),
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = GenerationSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, GenerationSettings::default());
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.max_output_tokens, 4000);
        assert_eq!(settings.title_max_tokens, 50);
        assert_eq!(settings.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_env_overrides() {
        let settings = GenerationSettings::from_lookup(lookup(&[
            ("CASE_REVIEW_MODEL", "gpt-4o"),
            ("CASE_REVIEW_MAX_TOKENS", "2000"),
            ("CASE_REVIEW_TEMPERATURE", "0.2"),
            ("CASE_REVIEW_TIMEOUT_SECS", "30"),
            ("CASE_REVIEW_FEW_SHOT", "yes"),
        ]))
        .unwrap();

        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.max_output_tokens, 2000);
        assert!((settings.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.few_shot);
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [("CASE_REVIEW_MAX_TOKENS", "lots")],
            [("CASE_REVIEW_MAX_TOKENS", "0")],
            [("CASE_REVIEW_TEMPERATURE", "3.5")],
            [("CASE_REVIEW_TIMEOUT_SECS", "-1")],
            [("CASE_REVIEW_FEW_SHOT", "maybe")],
        ] {
            let result = GenerationSettings::from_lookup(lookup(&vars));
            assert!(matches!(result, Err(CaseReviewError::Config(_))), "{:?}", vars);
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: GenerationSettings =
            serde_json::from_str(r#"{"model": "local-model", "timeout": 5}"#).unwrap();
        assert_eq!(settings.model, "local-model");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.max_output_tokens, 4000);
    }
}
