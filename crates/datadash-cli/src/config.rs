// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use datadash_app::{DEFAULT_GRID_PAGE_SIZE, DEFAULT_TABLE_PAGE_SIZE, PageSizes, Theme, ViewMode};
use datadash_ingest::{DecodeOptions, MAX_FILE_SIZE};
use datadash_llm::DEFAULT_SAMPLE_ROWS;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "datadash";
pub const CONFIG_PATH_ENV: &str = "DATADASH_CONFIG_PATH";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_LLM_MODEL: &str = "qwen3";
const DEFAULT_LLM_TIMEOUT: &str = "30s";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub llm: Llm,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            ui: Ui::default(),
            llm: Llm::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Data {
    pub table_page_size: Option<i64>,
    pub grid_page_size: Option<i64>,
    pub sample_rows: Option<i64>,
    pub max_file_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub theme: Option<String>,
    pub default_view: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Llm {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout: Option<String>,
    pub extra_context: Option<String>,
}

impl Default for Llm {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            base_url: Some(DEFAULT_LLM_BASE_URL.to_owned()),
            model: Some(DEFAULT_LLM_MODEL.to_owned()),
            api_key_env: None,
            timeout: Some(DEFAULT_LLM_TIMEOUT.to_owned()),
            extra_context: Some(String::new()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [data], [ui], [llm] and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (key, value) in [
            ("data.table_page_size", self.data.table_page_size),
            ("data.grid_page_size", self.data.grid_page_size),
            ("data.sample_rows", self.data.sample_rows),
            ("data.max_file_size", self.data.max_file_size),
        ] {
            if let Some(value) = value
                && value <= 0
            {
                bail!(
                    "{key} in {} must be positive, got {value}",
                    path.display()
                );
            }
        }

        if let Some(theme) = &self.ui.theme
            && Theme::parse(theme).is_none()
        {
            bail!(
                "ui.theme in {} must be \"light\" or \"dark\", got {theme:?}",
                path.display()
            );
        }

        if let Some(view) = &self.ui.default_view
            && ViewMode::parse(view).is_none()
        {
            bail!(
                "ui.default_view in {} must be \"table\" or \"grid\", got {view:?}",
                path.display()
            );
        }

        if let Some(timeout) = &self.llm.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "llm.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(level) = &self.log.level
            && !matches!(
                level.as_str(),
                "off" | "error" | "warn" | "info" | "debug" | "trace"
            )
        {
            bail!(
                "log.level in {} must be one of off, error, warn, info, debug, trace; got {level:?}",
                path.display()
            );
        }

        Ok(())
    }

    pub fn page_sizes(&self) -> PageSizes {
        PageSizes {
            table: positive(self.data.table_page_size).unwrap_or(DEFAULT_TABLE_PAGE_SIZE),
            grid: positive(self.data.grid_page_size).unwrap_or(DEFAULT_GRID_PAGE_SIZE),
        }
    }

    pub fn sample_rows(&self) -> usize {
        positive(self.data.sample_rows).unwrap_or(DEFAULT_SAMPLE_ROWS)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_file_size: self
                .data
                .max_file_size
                .and_then(|size| u64::try_from(size).ok())
                .unwrap_or(MAX_FILE_SIZE),
        }
    }

    pub fn theme(&self) -> Theme {
        self.ui
            .theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or(Theme::Light)
    }

    pub fn default_view(&self) -> ViewMode {
        self.ui
            .default_view
            .as_deref()
            .and_then(ViewMode::parse)
            .unwrap_or(ViewMode::Table)
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.enabled.unwrap_or(true)
    }

    pub fn llm_base_url(&self) -> &str {
        self.llm
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_LLM_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn llm_model(&self) -> &str {
        self.llm.model.as_deref().unwrap_or(DEFAULT_LLM_MODEL)
    }

    pub fn llm_api_key_env(&self) -> Option<&str> {
        self.llm
            .api_key_env
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    pub fn llm_timeout(&self) -> Result<Duration> {
        parse_duration(self.llm.timeout.as_deref().unwrap_or(DEFAULT_LLM_TIMEOUT))
    }

    pub fn llm_extra_context(&self) -> Option<&str> {
        self.llm
            .extra_context
            .as_deref()
            .filter(|context| !context.trim().is_empty())
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# datadash config\n# Place this file at: {}\n\nversion = 1\n\n[data]\ntable_page_size = {}\ngrid_page_size = {}\n# Rows sent to the model as a sample\nsample_rows = {}\nmax_file_size = {}\n\n[ui]\ntheme = \"light\"\ndefault_view = \"table\"\n\n[llm]\nenabled = true\nbase_url = \"{}\"\nmodel = \"{}\"\n# Name of the environment variable holding the API key, if the server needs one\n# api_key_env = \"OPENAI_API_KEY\"\ntimeout = \"{}\"\nextra_context = \"\"\n\n[log]\n# Overridden by DATADASH_LOG when set\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_TABLE_PAGE_SIZE,
            DEFAULT_GRID_PAGE_SIZE,
            DEFAULT_SAMPLE_ROWS,
            MAX_FILE_SIZE,
            DEFAULT_LLM_BASE_URL,
            DEFAULT_LLM_MODEL,
            DEFAULT_LLM_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn positive(value: Option<i64>) -> Option<usize> {
    value
        .filter(|value| *value > 0)
        .and_then(|value| usize::try_from(value).ok())
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .with_context(|| format!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
