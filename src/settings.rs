use anyhow::{bail, Context, Result};
use config::{Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub translation: TranslationConfig,
    pub languages: Vec<LanguageOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the browser client, served for any unmatched path.
    pub static_dir: String,
}

/// Parameters of the one translation handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub base_url: String,
    /// Name of the environment variable holding the upstream bearer token.
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub timeout_secs: u64,
    pub status_mapping: StatusMapping,
    /// Replaces the built-in medical translator instruction when set.
    pub system_prompt: Option<String>,
}

/// How upstream HTTP failures are turned into error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMapping {
    /// 401, 429 and 5xx get their own categories.
    #[default]
    Detailed,
    /// Every non-success status is a generic service error.
    Generic,
}

/// An entry of the language pickers in the browser client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageOption {
    /// Recognition locale, e.g. `es-ES`.
    pub code: String,
    pub name: String,
    /// Short code sent as `outputLangCode`.
    #[serde(rename(serialize = "outputCode"))]
    pub output_code: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            translation: TranslationConfig::default(),
            languages: default_languages(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.4,
            max_tokens: 150,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            timeout_secs: 30,
            status_mapping: StatusMapping::Detailed,
            system_prompt: None,
        }
    }
}

fn default_languages() -> Vec<LanguageOption> {
    [
        ("en-US", "English (US)", "en"),
        ("es-ES", "Español (Spain)", "es"),
        ("fr-FR", "Français", "fr"),
        ("ht-HT", "Kreyòl Ayisyen", "ht"),
        ("pt-BR", "Português (Brasil)", "pt"),
        ("ar-SA", "Arabic (Saudi Arabia)", "ar"),
        ("ru-RU", "Russian (Russia)", "ru"),
        ("zh-CN", "Chinese (Mandarin, Simplified)", "zh"),
        ("de-DE", "German (Germany)", "de"),
        ("ja-JP", "Japanese (Japan)", "ja"),
    ]
    .into_iter()
    .map(|(code, name, output_code)| LanguageOption {
        code: code.to_string(),
        name: name.to_string(),
        output_code: output_code.to_string(),
    })
    .collect()
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the upstream credential once. Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    /// Locate the config file the way the server does at startup:
    /// `CONFIG_PATH`, then `conf.yaml`, then `conf.json`. Without any file
    /// the defaults plus environment overrides are used.
    pub fn load_default() -> Result<Self> {
        let candidates: Vec<PathBuf> = [
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.yaml".to_string()),
            Some("conf.json".to_string()),
        ]
        .into_iter()
        .flatten()
        .map(PathBuf::from)
        .collect();

        match candidates.iter().find(|path| path.exists()) {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Self::load(Some(path.as_path()))
            }
            None => {
                info!("No configuration file found, using defaults. Tried: {:?}", candidates);
                Self::load(None)
            }
        }
    }

    /// Layers: file (if any), `MEDTRANSLATE__SECTION__KEY` variables, `PORT`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
            let content = substitute_env_vars(content.trim_start_matches('\u{feff}'))?;
            builder = builder.add_source(File::from_str(&content, format_for(path)));
        }

        let builder = builder
            .add_source(
                Environment::with_prefix("MEDTRANSLATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Parse a single config document without any environment layers.
    pub fn parse(content: &str, format: FileFormat) -> Result<Self> {
        let content = substitute_env_vars(content)?;
        let config: Config = config::Config::builder()
            .add_source(File::from_str(&content, format))
            .build()?
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.translation;
        if t.model.trim().is_empty() {
            bail!("translation.model must not be empty");
        }
        if t.base_url.trim().is_empty() {
            bail!("translation.base_url must not be empty");
        }
        if t.api_key_env.trim().is_empty() {
            bail!("translation.api_key_env must not be empty");
        }
        if !(0.0..=2.0).contains(&t.temperature) {
            bail!("translation.temperature must be within 0..=2, got {}", t.temperature);
        }
        if t.max_tokens == 0 {
            bail!("translation.max_tokens must be greater than zero");
        }
        if t.timeout_secs == 0 {
            bail!("translation.timeout_secs must be greater than zero");
        }
        if let Some(top_p) = t.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                bail!("translation.top_p must be within 0..=1, got {}", top_p);
            }
        }
        for (name, penalty) in [
            ("frequency_penalty", t.frequency_penalty),
            ("presence_penalty", t.presence_penalty),
        ] {
            if let Some(value) = penalty {
                if !(-2.0..=2.0).contains(&value) {
                    bail!("translation.{} must be within -2..=2, got {}", name, value);
                }
            }
        }
        Ok(())
    }
}

fn format_for(path: &Path) -> FileFormat {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Yaml,
    }
}

/// Replace `${VAR_NAME}` with the variable's value. Unknown variables are left as written.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}
