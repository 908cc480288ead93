use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, bail};
use log::warn;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    AvailabilityDetector, ChallengeGate, ChallengePhrases, DateEncoding, TargetDate,
    renderer::BrowserSettings,
};

pub const DEFAULT_PAGE_URL: &str = "https://reservenski.parkbrightonresort.com/select-parking";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    Browser,
    Http,
}

/// The env vars that configure monitoring.
#[derive(Debug, Deserialize)]
pub struct MonitorEnv {
    #[serde(default = "default_target_dates")]
    pub target_dates: String,
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    #[serde(default = "default_challenge_timeout")]
    pub challenge_timeout: u64,
    #[serde(default = "default_challenge_poll_interval")]
    pub challenge_poll_interval: u64,
    #[serde(default = "default_settle_delay")]
    pub settle_delay: u64,
    #[serde(default = "default_render_timeout")]
    pub render_timeout: u64,
    #[serde(default = "default_page_url")]
    pub page_url: String,
    #[serde(default = "default_renderer")]
    pub renderer: RendererKind,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,
    pub screenshot_path: Option<PathBuf>,
    pub discord_webhook_url: Option<String>,
    pub negative_keywords: Option<String>,
    pub date_formats: Option<String>,
    pub challenge_phrases: Option<String>,
}

fn default_target_dates() -> String {
    "2/21,2/22,2/28,3/1".to_string()
}

fn default_check_interval() -> u64 {
    1800
}

fn default_challenge_timeout() -> u64 {
    60
}

fn default_challenge_poll_interval() -> u64 {
    2
}

fn default_settle_delay() -> u64 {
    3
}

fn default_render_timeout() -> u64 {
    45
}

fn default_page_url() -> String {
    DEFAULT_PAGE_URL.to_string()
}

fn default_renderer() -> RendererKind {
    RendererKind::Browser
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_headless() -> bool {
    true
}

/// Validated monitoring configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub targets: Vec<TargetDate>,
    pub poll_interval: Duration,
    pub challenge_timeout: Duration,
    pub challenge_poll_interval: Duration,
    pub settle_delay: Duration,
    pub render_timeout: Duration,
    pub page_url: String,
    pub renderer: RendererKind,
    pub webdriver_url: String,
    pub headless: bool,
    pub screenshot_path: Option<PathBuf>,
    pub discord_webhook_url: Option<String>,
    pub negative_keywords: Option<Vec<String>>,
    pub date_formats: Option<Vec<DateEncoding>>,
    pub challenge_phrases: Option<Vec<String>>,
}

impl MonitorConfig {
    /// Loads from the process env plus `env_file`, or `./.env` when no file
    /// is given. Exactly one file is consulted.
    pub fn new(env_file: Option<&Path>) -> anyhow::Result<Self> {
        let monitor_env = match env_file {
            Some(path) => MonitorEnv::load_from_env_file(path)?,
            None => MonitorEnv::load_from_env()?,
        };
        Self::from_env(monitor_env)
    }

    pub fn from_env(env: MonitorEnv) -> anyhow::Result<Self> {
        let mut targets: Vec<TargetDate> = Vec::new();
        for date in TargetDate::parse_list(&env.target_dates).context("invalid TARGET_DATES")? {
            if targets.contains(&date) {
                warn!("TARGET_DATES lists {date} more than once, ignoring the repeat");
            } else {
                targets.push(date);
            }
        }
        if targets.is_empty() {
            bail!("TARGET_DATES must name at least one date");
        }

        let date_formats = match env.date_formats.as_deref() {
            Some(list) => {
                let formats = DateEncoding::parse_list(list).context("invalid DATE_FORMATS")?;
                if formats.is_empty() {
                    bail!("DATE_FORMATS must name at least one format");
                }
                Some(formats)
            }
            None => None,
        };

        Ok(Self {
            targets,
            poll_interval: positive_secs("CHECK_INTERVAL", env.check_interval)?,
            challenge_timeout: positive_secs("CHALLENGE_TIMEOUT", env.challenge_timeout)?,
            challenge_poll_interval: positive_secs(
                "CHALLENGE_POLL_INTERVAL",
                env.challenge_poll_interval,
            )?,
            settle_delay: Duration::from_secs(env.settle_delay),
            render_timeout: positive_secs("RENDER_TIMEOUT", env.render_timeout)?,
            page_url: env.page_url,
            renderer: env.renderer,
            webdriver_url: env.webdriver_url,
            headless: env.headless,
            screenshot_path: env.screenshot_path,
            discord_webhook_url: env.discord_webhook_url.filter(|url| !url.trim().is_empty()),
            negative_keywords: env.negative_keywords.as_deref().map(split_list),
            date_formats,
            challenge_phrases: env.challenge_phrases.as_deref().map(split_list),
        })
    }

    pub fn challenge_phrases(&self) -> ChallengePhrases {
        match &self.challenge_phrases {
            Some(phrases) => ChallengePhrases::new(phrases),
            None => ChallengePhrases::default(),
        }
    }

    pub fn challenge_gate(&self) -> ChallengeGate {
        ChallengeGate::new(self.challenge_phrases())
            .with_timeout(self.challenge_timeout)
            .with_poll_interval(self.challenge_poll_interval)
            .with_settle_delay(self.settle_delay)
    }

    pub fn detector(&self) -> AvailabilityDetector {
        let mut detector =
            AvailabilityDetector::default().with_challenge_phrases(self.challenge_phrases());
        if let Some(keywords) = &self.negative_keywords {
            detector = detector.with_negative_keywords(keywords);
        }
        if let Some(formats) = &self.date_formats {
            detector = detector.with_encodings(formats.clone());
        }
        detector
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            webdriver_url: self.webdriver_url.clone(),
            headless: self.headless,
            page_load_timeout: self.render_timeout,
            screenshot_path: self.screenshot_path.clone(),
        }
    }
}

fn positive_secs(name: &str, secs: u64) -> anyhow::Result<Duration> {
    if secs == 0 {
        bail!("{name} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let file_vars = match dotenv::dotenv_iter() {
            Ok(iter) => iter.collect::<Result<Vec<_>, _>>().context("malformed .env")?,
            Err(_) => Vec::new(),
        };
        Self::from_sources(file_vars, std::env::vars())
    }

    /// Like `load_from_env`, but reads `path` and never `./.env`.
    fn load_from_env_file(path: &Path) -> anyhow::Result<Self> {
        let file_vars = dotenv::from_path_iter(path)
            .with_context(|| format!("could not load {}", path.display()))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("malformed {}", path.display()))?;
        Self::from_sources(file_vars, std::env::vars())
    }

    /// Process variables win over file variables, as with dotenv.
    fn from_sources<F, P>(file_vars: F, process_vars: P) -> anyhow::Result<Self>
    where
        F: IntoIterator<Item = (String, String)>,
        P: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = file_vars.into_iter().collect();
        vars.extend(process_vars);
        let config =
            envy::from_iter(vars).context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
