//! Layered settings for the extraction pipeline.
//!
//! Resolution is an explicit ordered sequence of override passes over
//! a plain struct: defaults, then an optional JSON config file, then
//! `FAKTURA_*` environment variables, then CLI flags. Each layer is
//! expressed as the same all-optional [`SettingsOverrides`] shape.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::normalize::filename::FilenameOptions;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "FAKTURA_CONFIG";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "faktura.json";

/// How the pipeline decides between text and vision extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    /// Score embedded text first, fall back to vision when unusable.
    Auto,
    /// Always send rendered page images to the vision model.
    Gemini,
}

impl OcrMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(OcrMode::Auto),
            "gemini" => Ok(OcrMode::Gemini),
            other => Err(ConfigError::InvalidValue {
                field: "ocr_mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Config file that contributed values, if any.
    pub config_path: Option<PathBuf>,
    /// Gemini API key; required only when the API is actually called.
    pub gemini_api_key: Option<String>,
    /// Gemini model name.
    pub model: String,
    /// Language tag steering the short-description language.
    pub locale: String,
    /// Maximum number of PDF pages to inspect.
    pub max_pages: usize,
    /// Text-vs-vision decision mode.
    pub ocr_mode: OcrMode,
    /// Report the rename without performing it.
    pub dry_run: bool,
    /// Rename the source PDF to the composed stub.
    pub rename: bool,
    /// Filename composition options (raw tokens, normalized at use).
    pub filename: FilenameOptions,
    /// Gemini request timeout in seconds.
    pub timeout_seconds: u64,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: None,
            gemini_api_key: None,
            model: "gemini-2.0-flash".to_string(),
            locale: "pl".to_string(),
            max_pages: 3,
            ocr_mode: OcrMode::Auto,
            dry_run: false,
            rename: false,
            filename: FilenameOptions::default(),
            timeout_seconds: 30,
            pretty: false,
        }
    }
}

/// One layer of overrides; unset fields leave the previous layer alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverrides {
    pub gemini_api_key: Option<String>,
    pub model: Option<String>,
    pub locale: Option<String>,
    pub max_pages: Option<usize>,
    pub ocr_mode: Option<String>,
    pub dry_run: Option<bool>,
    pub rename: Option<bool>,
    pub filename_separator: Option<String>,
    pub filename_suffix: Option<String>,
    pub filename_date_separator: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub pretty: Option<bool>,
}

impl SettingsOverrides {
    /// Collect overrides from `FAKTURA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), with an injectable lookup.
    pub fn from_env_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let overrides = Self {
            gemini_api_key: lookup("FAKTURA_GEMINI_API_KEY"),
            model: lookup("FAKTURA_MODEL"),
            locale: lookup("FAKTURA_LOCALE"),
            max_pages: parse_opt_int(lookup("FAKTURA_MAX_PAGES"), "FAKTURA_MAX_PAGES")?,
            ocr_mode: lookup("FAKTURA_OCR_MODE"),
            dry_run: parse_opt_bool(lookup("FAKTURA_DRY_RUN"), "FAKTURA_DRY_RUN")?,
            rename: parse_opt_bool(lookup("FAKTURA_RENAME"), "FAKTURA_RENAME")?,
            filename_separator: lookup("FAKTURA_FILENAME_SEPARATOR"),
            filename_suffix: lookup("FAKTURA_FILENAME_SUFFIX"),
            filename_date_separator: lookup("FAKTURA_FILENAME_DATE_SEPARATOR"),
            timeout_seconds: parse_opt_int(
                lookup("FAKTURA_TIMEOUT_SECONDS"),
                "FAKTURA_TIMEOUT_SECONDS",
            )?,
            pretty: parse_opt_bool(lookup("FAKTURA_PRETTY"), "FAKTURA_PRETTY")?,
        };
        overrides.check()?;
        Ok(overrides)
    }

    /// Reject tokens serde cannot type-check, so a bad value fails in
    /// the layer that introduced it instead of being outvoted later.
    fn check(&self) -> Result<(), ConfigError> {
        if let Some(mode) = &self.ocr_mode {
            OcrMode::parse(mode)?;
        }
        Ok(())
    }
}

impl Settings {
    /// Resolve settings from all layers.
    ///
    /// `config_path_override` comes from `--config`; when unset the
    /// `FAKTURA_CONFIG` variable and then `./faktura.json` are tried.
    /// A config file named explicitly must exist; the default one is
    /// optional.
    pub fn resolve(
        config_path_override: Option<&Path>,
        cli: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        cli.check()?;

        let mut settings = Settings::default();

        if let Some(path) = resolve_config_path(config_path_override)? {
            let file_layer = load_config_file(&path)?;
            settings.apply(&file_layer);
            settings.config_path = Some(path);
        }

        settings.apply(&SettingsOverrides::from_env()?);
        settings.apply(cli);
        settings.validate()?;

        debug!(
            model = %settings.model,
            locale = %settings.locale,
            max_pages = settings.max_pages,
            ocr_mode = ?settings.ocr_mode,
            "resolved settings"
        );
        Ok(settings)
    }

    /// Apply one override layer in place.
    pub fn apply(&mut self, layer: &SettingsOverrides) {
        if let Some(key) = &layer.gemini_api_key {
            let key = key.trim();
            self.gemini_api_key = (!key.is_empty()).then(|| key.to_string());
        }
        if let Some(model) = &layer.model {
            self.model = model.trim().to_string();
        }
        if let Some(locale) = &layer.locale {
            self.locale = locale.trim().to_lowercase();
        }
        if let Some(max_pages) = layer.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(mode) = &layer.ocr_mode {
            // Tokens are rejected when the layer is built (env lookup,
            // file load, resolve's CLI check), so this parse succeeds
            // for any layer that came through resolve().
            if let Ok(parsed) = OcrMode::parse(mode) {
                self.ocr_mode = parsed;
            }
        }
        if let Some(dry_run) = layer.dry_run {
            self.dry_run = dry_run;
        }
        if let Some(rename) = layer.rename {
            self.rename = rename;
        }
        if let Some(separator) = &layer.filename_separator {
            self.filename.separator = separator.clone();
        }
        if let Some(suffix) = &layer.filename_suffix {
            self.filename.suffix = suffix.clone();
        }
        if let Some(date_separator) = &layer.filename_date_separator {
            self.filename.date_separator = date_separator.clone();
        }
        if let Some(timeout) = layer.timeout_seconds {
            self.timeout_seconds = timeout;
        }
        if let Some(pretty) = layer.pretty {
            self.pretty = pretty;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "model".to_string(),
                value: "(empty)".to_string(),
            });
        }
        if self.locale.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "locale".to_string(),
                value: "(empty)".to_string(),
            });
        }
        if self.max_pages < 1 {
            return Err(ConfigError::InvalidValue {
                field: "max_pages".to_string(),
                value: self.max_pages.to_string(),
            });
        }
        if self.timeout_seconds < 1 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_seconds".to_string(),
                value: self.timeout_seconds.to_string(),
            });
        }
        Ok(())
    }
}

fn resolve_config_path(
    config_path_override: Option<&Path>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = config_path_override {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
        if !env_path.trim().is_empty() {
            let path = PathBuf::from(env_path);
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            return Ok(Some(path));
        }
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
    if default_path.is_file() {
        return Ok(Some(default_path));
    }
    Ok(None)
}

/// Load one config file as an override layer.
pub fn load_config_file(path: &Path) -> Result<SettingsOverrides, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let layer: SettingsOverrides =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    layer.check()?;
    Ok(layer)
}

fn parse_opt_bool(value: Option<String>, field: &str) -> Result<Option<bool>, ConfigError> {
    let Some(value) = value else { return Ok(None) };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }),
    }
}

fn parse_opt_int<T: std::str::FromStr>(
    value: Option<String>,
    field: &str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = value else { return Ok(None) };
    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        })
}
