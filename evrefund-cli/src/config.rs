use anyhow::{Context, Result, bail};
use evrefund_api::{ClientOptions, HeaderProfile};
use evrefund_core::{QueryFilter, WindowStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::{default_log_dir, ensure_evrefund_home, expand_home};

/// Workflow parameters. Credentials never live here; they come from the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub query: QuerySection,
    pub http: HttpSection,
    pub refund: RefundSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    pub station_ids: Vec<i64>,
    pub member_categories: Vec<i64>,
    pub bill_status: Vec<i64>,
    pub page_size: u32,
    pub bus_id_type: i64,
    pub window: WindowStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_secs: u64,
    pub headers: HeaderProfile,
    /// Only sent with the browser header profile.
    pub accept_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundSection {
    pub note_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Defaults to `~/evcharging_logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    pub file_name: String,
    pub console: bool,
    /// Used when RUST_LOG is unset.
    pub level: String,
}

impl Default for QuerySection {
    fn default() -> Self {
        let filter = QueryFilter::default();
        Self {
            station_ids: filter.station_ids,
            member_categories: filter.member_categories,
            bill_status: filter.bill_status,
            page_size: filter.page_size,
            bus_id_type: filter.bus_id_type,
            window: WindowStrategy::default(),
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            headers: HeaderProfile::Minimal,
            accept_language: "zh-TW".to_string(),
        }
    }
}

impl Default for RefundSection {
    fn default() -> Self {
        Self {
            note_prefix: "auto-refund".to_string(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: "bill_refund.log".to_string(),
            console: true,
            level: "info".to_string(),
        }
    }
}

impl QuerySection {
    pub fn filter(&self) -> QueryFilter {
        QueryFilter {
            station_ids: self.station_ids.clone(),
            member_categories: self.member_categories.clone(),
            bill_status: self.bill_status.clone(),
            page_size: self.page_size,
            bus_id_type: self.bus_id_type,
        }
    }
}

impl LogSection {
    pub fn dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(d) => expand_home(d),
            None => default_log_dir(),
        }
    }
}

impl Settings {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.http.timeout_secs),
            header_profile: self.http.headers,
            accept_language: self.http.accept_language.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            bail!("http.timeout_secs must be greater than zero");
        }
        if self.query.page_size == 0 {
            bail!("query.page_size must be greater than zero");
        }
        if self.query.station_ids.is_empty() {
            bail!("query.station_ids must name at least one station");
        }
        if self.log.file_name.trim().is_empty() {
            bail!("log.file_name must not be empty");
        }
        Ok(())
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(ensure_evrefund_home()?.join("config.toml"))
}

/// Load settings. An explicit path must exist; the default path may be absent, in which
/// case the built-in defaults apply.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let (p, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path()?, false),
    };
    if !p.exists() {
        if explicit {
            bail!("config file not found: {}", p.display());
        }
        return Ok(Settings::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let settings: Settings =
        toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    settings
        .validate()
        .with_context(|| format!("invalid settings in {}", p.display()))?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let s = toml::to_string_pretty(settings).context("serialize settings")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_settings(&p, &Settings::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
