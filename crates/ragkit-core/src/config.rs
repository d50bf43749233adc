//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults, `ragkit.toml`, `ragkit.<env>.toml`,
//! an optional explicit file, `RAGKIT_*` env vars (`__` nests) and finally
//! `key=value` overrides. [`expand_path`] handles `~` and `${VAR}` in
//! user-supplied paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::ChunkParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub name: String,
    pub k1: f64,
    pub b: f64,
}

impl Default for BackendSettings {
    fn default() -> Self { Self { name: "bm25".into(), k1: 1.2, b: 0.75 } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { dim: 16 } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    pub max_citations: usize,
    pub rerank: bool,
}

impl Default for AnswerSettings {
    fn default() -> Self { Self { max_citations: 3, rerank: false } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { default_top_k: 5 } }
}

/// Typed view of the merged configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub profile: String,
    pub chunk: ChunkParams,
    pub backend: BackendSettings,
    pub embedding: EmbeddingSettings,
    pub answer: AnswerSettings,
    pub retrieval: RetrievalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: "ci".into(),
            chunk: ChunkParams::default(),
            backend: BackendSettings::default(),
            embedding: EmbeddingSettings::default(),
            answer: AnswerSettings::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunk.validate()?;
        if self.backend.name != "bm25" {
            return Err(Error::Validation(format!("unknown backend '{}'", self.backend.name)));
        }
        if !self.backend.k1.is_finite() || self.backend.k1 < 0.0 {
            return Err(Error::Validation(format!("backend.k1 must be a non-negative number, got {}", self.backend.k1)));
        }
        if !(0.0..=1.0).contains(&self.backend.b) {
            return Err(Error::Validation(format!("backend.b must be within [0, 1], got {}", self.backend.b)));
        }
        if self.embedding.dim == 0 { return Err(Error::Validation("embedding.dim must be greater than 0".into())); }
        if self.answer.max_citations == 0 { return Err(Error::Validation("answer.max_citations must be greater than 0".into())); }
        if self.retrieval.default_top_k == 0 { return Err(Error::Validation("retrieval.default_top_k must be greater than 0".into())); }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> { Self::load_with(None, &[]) }

    /// Load the standard layers plus an optional explicit file and `key=value` overrides.
    pub fn load_with(file: Option<&Path>, overrides: &[String]) -> anyhow::Result<Self> {
        let env_name = env::var("RAGKIT_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("ragkit.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("ragkit.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("ragkit.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("ragkit.test.toml")),
            _ => {}
        }
        if let Some(file) = file {
            if !file.exists() { return Err(Error::NotFound(format!("config file {}", file.display())).into()); }
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed("RAGKIT_").split("__"));
        for raw in overrides {
            let (key, value) = parse_override(raw)?;
            figment = figment.merge(Serialized::default(&key, value));
        }

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate [`Settings`].
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| Error::Validation(format!("invalid configuration: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Split `key=value`; the value is read as an integer, float, bool or string, in that order.
pub fn parse_override(raw: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .ok_or_else(|| Error::Validation(format!("override '{raw}' must look like key=value")))?;
    let value = value.trim();
    let parsed = if let Ok(i) = value.parse::<i64>() {
        serde_json::Value::from(i)
    } else if let Some(f) = value.parse::<f64>().ok().filter(|f| f.is_finite()) {
        serde_json::Value::from(f)
    } else if let Ok(b) = value.parse::<bool>() {
        serde_json::Value::from(b)
    } else {
        serde_json::Value::from(value)
    };
    Ok((key.trim().to_string(), parsed))
}

/// Expand `${VAR}`/`$VAR` and a leading `~`. Unset variables leave the input untouched;
/// the result is not canonicalized.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let raw = input.as_ref();
    let with_env = shellexpand::env(raw).unwrap_or(std::borrow::Cow::Borrowed(raw));
    PathBuf::from(shellexpand::tilde(&with_env).as_ref())
}
