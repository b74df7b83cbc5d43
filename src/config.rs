//! Runtime configuration for the vanity address search.
//!
//! Settings come from the command line, optionally layered over a TOML
//! profile. Everything is resolved and validated once into an immutable
//! [`SearchConfig`] before any worker starts.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use log::warn;
use serde::Deserialize;

use crate::matcher::{MatchMode, PatternMatcher, WordSet};

/// Length of an address in hex characters, without the 0x marker.
pub const ADDRESS_HEX_LEN: usize = 40;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_FILLER: char = 'a';

/// Word-list Ethereum Vanity Address Search
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Acceptable words, comma separated (e.g. DEAD,BEEF,C0FFEE)
    #[arg(short = 'w', long, value_delimiter = ',')]
    pub words: Vec<String>,

    /// Match mode: dual-ends, suffix-with-prefix-char, start-or-end, contains
    #[arg(short = 'm', long)]
    pub mode: Option<MatchMode>,

    /// Compare addresses and words in lowercase instead of checksum casing
    #[arg(short = 'i', long, overrides_with = "no_case_insensitive")]
    pub case_insensitive: bool,

    /// Compare in checksum casing even if the profile enables case-insensitive
    #[arg(long, overrides_with = "case_insensitive")]
    pub no_case_insensitive: bool,

    /// Filler character expected before the word in suffix-with-prefix-char mode [default: a]
    #[arg(long)]
    pub filler: Option<char>,

    /// Candidates generated per batch [default: 1000]
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// Attempts between worker progress reports [default: 1000]
    #[arg(short = 'l', long)]
    pub progress_interval: Option<u64>,

    /// Number of worker threads (overrides --power)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Worker count policy: all, half, low, reserve:K [default: all]
    #[arg(short = 'p', long)]
    pub power: Option<PowerPolicy>,

    /// Also derive the BIP-39 recovery phrase of the found key
    #[arg(long, overrides_with = "no_mnemonic")]
    pub mnemonic: bool,

    /// Skip the recovery phrase even if the profile asks for one
    #[arg(long, overrides_with = "mnemonic")]
    pub no_mnemonic: bool,

    /// Progress report interval in seconds [default: 5]
    #[arg(short = 'r', long)]
    pub report_interval: Option<u64>,

    /// TOML profile with search settings; flags given here take precedence
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Print a commented profile template and exit
    #[arg(long)]
    pub print_profile: bool,
}

impl Config {
    /// Merges the profile (if any) with the flags and validates the result.
    pub fn resolve(&self) -> Result<SearchConfig, ConfigError> {
        let profile = match &self.profile {
            Some(path) => Profile::load(path.clone())?,
            None => Profile::default(),
        };
        self.resolve_with(profile)
    }

    fn resolve_with(&self, profile: Profile) -> Result<SearchConfig, ConfigError> {
        let words = if self.words.is_empty() {
            profile.words.unwrap_or_default()
        } else {
            self.words.clone()
        };
        let mode = self.mode.or(profile.mode).ok_or(ConfigError::MissingMode)?;

        let power = self.power.or(profile.power).unwrap_or_default();
        let worker_count = self
            .workers
            .or(profile.workers)
            .unwrap_or_else(|| power.worker_count(num_cpus::get()));

        SearchConfig::builder(words, mode)
            .case_insensitive(
                switch(self.case_insensitive, self.no_case_insensitive)
                    .or(profile.case_insensitive)
                    .unwrap_or(false),
            )
            .filler(self.filler.or(profile.filler).unwrap_or(DEFAULT_FILLER))
            .batch_size(
                self.batch_size
                    .or(profile.batch_size)
                    .unwrap_or(DEFAULT_BATCH_SIZE),
            )
            .progress_interval(
                self.progress_interval
                    .or(profile.progress_interval)
                    .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
            )
            .worker_count(worker_count)
            .with_mnemonic(
                switch(self.mnemonic, self.no_mnemonic)
                    .or(profile.mnemonic)
                    .unwrap_or(false),
            )
            .report_interval(Duration::from_secs(
                self.report_interval
                    .or(profile.report_interval)
                    .unwrap_or(DEFAULT_REPORT_INTERVAL_SECS),
            ))
            .build()
    }
}

/// Reads an `--x` / `--no-x` flag pair; `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// How many cores the search may occupy when no explicit count is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum PowerPolicy {
    /// One worker per core
    #[default]
    All,
    /// Half the cores, rounded up
    Half,
    /// At most four workers
    Low,
    /// Leave this many cores idle (at least one worker remains)
    Reserve(usize),
}

impl PowerPolicy {
    /// Worker count for a machine with `available` cores.
    pub fn worker_count(self, available: usize) -> usize {
        let available = available.max(1);
        match self {
            PowerPolicy::All => available,
            PowerPolicy::Half => available.div_ceil(2),
            PowerPolicy::Low => available.min(4),
            PowerPolicy::Reserve(k) => available.saturating_sub(k).max(1),
        }
    }
}

impl FromStr for PowerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "all" | "full" => Ok(PowerPolicy::All),
            "half" => Ok(PowerPolicy::Half),
            "low" | "low-power" => Ok(PowerPolicy::Low),
            other => match other.strip_prefix("reserve:") {
                Some(k) => k
                    .parse()
                    .map(PowerPolicy::Reserve)
                    .map_err(|_| format!("Invalid reserved core count: {}", k)),
                None => Err(format!("Unknown power policy: {}", s)),
            },
        }
    }
}

impl TryFrom<String> for PowerPolicy {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for PowerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerPolicy::All => write!(f, "all"),
            PowerPolicy::Half => write!(f, "half"),
            PowerPolicy::Low => write!(f, "low"),
            PowerPolicy::Reserve(k) => write!(f, "reserve:{}", k),
        }
    }
}

/// Search settings read from a TOML profile. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub words: Option<Vec<String>>,
    pub mode: Option<MatchMode>,
    pub case_insensitive: Option<bool>,
    pub filler: Option<char>,
    pub batch_size: Option<usize>,
    pub progress_interval: Option<u64>,
    pub workers: Option<usize>,
    pub power: Option<PowerPolicy>,
    pub mnemonic: Option<bool>,
    pub report_interval: Option<u64>,
}

impl Profile {
    /// Loads a profile from a TOML file.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::ProfileRead {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Returns a commented profile template.
pub fn template() -> String {
    let mut t = String::new();
    t.push_str("# Vanity search profile\n\n");
    t.push_str("# Acceptable words (hex characters only)\n");
    t.push_str("words = [\"DEAD\", \"BEEF\", \"C0FFEE\", \"F00D\"]\n");
    t.push_str("# dual-ends | suffix-with-prefix-char | start-or-end | contains\n");
    t.push_str("mode = \"dual-ends\"\n");
    t.push_str("# false compares against EIP-55 checksum casing\n");
    t.push_str("case_insensitive = false\n");
    t.push_str("# Character required before the word in suffix-with-prefix-char mode\n");
    t.push_str("filler = \"a\"\n");
    t.push_str("batch_size = 1000\n");
    t.push_str("progress_interval = 1000\n");
    t.push_str("# all | half | low | reserve:K (ignored when workers is set)\n");
    t.push_str("power = \"all\"\n");
    t.push_str("# workers = 8\n");
    t.push_str("mnemonic = false\n");
    t.push_str("# Seconds between progress lines\n");
    t.push_str("report_interval = 5\n");
    t
}

/// Immutable, validated search settings.
///
/// Built once at startup and cloned into every worker.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    words: Vec<String>,
    matcher: PatternMatcher,
    batch_size: usize,
    progress_interval: u64,
    worker_count: usize,
    with_mnemonic: bool,
    report_interval: Duration,
    shutdown_grace: Duration,
    channel_capacity: usize,
}

impl SearchConfig {
    pub fn builder(words: Vec<String>, mode: MatchMode) -> SearchConfigBuilder {
        SearchConfigBuilder {
            words,
            mode,
            case_insensitive: false,
            filler: DEFAULT_FILLER,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            worker_count: 1,
            with_mnemonic: false,
            report_interval: Duration::from_secs(DEFAULT_REPORT_INTERVAL_SECS),
            shutdown_grace: Duration::from_secs(2),
            channel_capacity: 1024,
        }
    }

    /// The configured words in their original order and casing.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    pub fn mode(&self) -> MatchMode {
        self.matcher.mode()
    }

    pub fn case_insensitive(&self) -> bool {
        self.matcher.words().case_insensitive()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn with_mnemonic(&self) -> bool {
        self.with_mnemonic
    }

    pub fn report_interval(&self) -> Duration {
        self.report_interval
    }

    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfigBuilder {
    words: Vec<String>,
    mode: MatchMode,
    case_insensitive: bool,
    filler: char,
    batch_size: usize,
    progress_interval: u64,
    worker_count: usize,
    with_mnemonic: bool,
    report_interval: Duration,
    shutdown_grace: Duration,
    channel_capacity: usize,
}

impl SearchConfigBuilder {
    pub fn case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }

    pub fn filler(mut self, value: char) -> Self {
        self.filler = value;
        self
    }

    pub fn batch_size(mut self, value: usize) -> Self {
        self.batch_size = value;
        self
    }

    pub fn progress_interval(mut self, value: u64) -> Self {
        self.progress_interval = value;
        self
    }

    pub fn worker_count(mut self, value: usize) -> Self {
        self.worker_count = value;
        self
    }

    pub fn with_mnemonic(mut self, value: bool) -> Self {
        self.with_mnemonic = value;
        self
    }

    pub fn report_interval(mut self, value: Duration) -> Self {
        self.report_interval = value;
        self
    }

    pub fn shutdown_grace(mut self, value: Duration) -> Self {
        self.shutdown_grace = value;
        self
    }

    pub fn channel_capacity(mut self, value: usize) -> Self {
        self.channel_capacity = value;
        self
    }

    /// Validates the settings and compiles the matcher.
    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        if self.words.is_empty() {
            return Err(ConfigError::EmptyWordList);
        }

        for word in &self.words {
            if word.is_empty() {
                return Err(ConfigError::InvalidWord {
                    word: word.clone(),
                    reason: "words cannot be empty",
                });
            }
            if word.len() > ADDRESS_HEX_LEN {
                return Err(ConfigError::InvalidWord {
                    word: word.clone(),
                    reason: "longer than an address (40 hex characters)",
                });
            }
            if !word.chars().all(|c| c.is_ascii_hexdigit()) {
                warn!("Word {:?} contains non-hex characters and can never match", word);
            }
        }

        if !self.filler.is_ascii() {
            return Err(ConfigError::InvalidFiller(self.filler));
        }

        for (field, value) in [
            ("batch_size", self.batch_size as u64),
            ("progress_interval", self.progress_interval),
            ("worker_count", self.worker_count as u64),
            ("channel_capacity", self.channel_capacity as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(field));
            }
        }

        if self.report_interval.is_zero() {
            return Err(ConfigError::Zero("report_interval"));
        }

        let matcher = PatternMatcher::new(
            WordSet::new(&self.words, self.case_insensitive),
            self.mode,
            self.filler,
        );

        Ok(SearchConfig {
            words: self.words,
            matcher,
            batch_size: self.batch_size,
            progress_interval: self.progress_interval,
            worker_count: self.worker_count,
            with_mnemonic: self.with_mnemonic,
            report_interval: self.report_interval,
            shutdown_grace: self.shutdown_grace,
            channel_capacity: self.channel_capacity,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Word list cannot be empty")]
    EmptyWordList,

    #[error("Invalid word {word:?}: {reason}")]
    InvalidWord { word: String, reason: &'static str },

    #[error("Filler must be a single ASCII character, got {0:?}")]
    InvalidFiller(char),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("No match mode given (use --mode or set `mode` in the profile)")]
    MissingMode,

    #[error("Failed to read profile at {}: {source}", path.display())]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile format: {0}")]
    ProfileFormat(#[from] toml::de::Error),
}
