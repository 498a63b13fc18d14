//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RCREYES_ROUNDING=half_even                                         │
//! │     RCREYES_HEADCOUNT=per_person                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/rcreyes-desk/engine.toml (Linux)                         │
//! │     ~/Library/Application Support/com.rcreyes.desk/engine.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     half_up, floor minutes, per_session, prefix "RC"                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [billing]
//! rounding = "half_up"        # half_up | half_even
//! minute_rounding = "floor"   # floor | ceil
//! headcount = "per_session"   # per_session | per_person
//!
//! [tickets]
//! code_prefix = "RC"
//! qr_prefix = "RCREYES"
//! max_persons = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use rcreyes_core::validation::validate_code_prefix;
use rcreyes_core::{
    BillingPolicy, CheckInRules, DEFAULT_CODE_PREFIX, DEFAULT_MAX_PERSONS, QR_PAYLOAD_PREFIX,
};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Ticket Settings
// =============================================================================

/// Check-in desk rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSettings {
    /// Leading segment of generated codes (`RC-260114-7F3A`).
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,

    /// Scheme printed in QR payloads (`RCREYES:{code}`).
    #[serde(default = "default_qr_prefix")]
    pub qr_prefix: String,

    /// Largest group a single ticket may cover.
    #[serde(default = "default_max_persons")]
    pub max_persons: u32,
}

fn default_code_prefix() -> String {
    DEFAULT_CODE_PREFIX.to_string()
}

fn default_qr_prefix() -> String {
    QR_PAYLOAD_PREFIX.to_string()
}

fn default_max_persons() -> u32 {
    DEFAULT_MAX_PERSONS
}

impl Default for TicketSettings {
    fn default() -> Self {
        TicketSettings {
            code_prefix: default_code_prefix(),
            qr_prefix: default_qr_prefix(),
            max_persons: default_max_persons(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub billing: BillingPolicy,

    #[serde(default)]
    pub tickets: TicketSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| EngineError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    pub fn validate(&self) -> EngineResult<()> {
        validate_code_prefix(&self.tickets.code_prefix)
            .map_err(|e| EngineError::InvalidConfig(format!("code_prefix: {}", e)))?;

        let qr = self.tickets.qr_prefix.trim();
        if qr.is_empty() || qr.contains(':') {
            return Err(EngineError::InvalidConfig(format!(
                "qr_prefix must be non-empty and contain no ':', got: '{}'",
                self.tickets.qr_prefix
            )));
        }

        if self.tickets.max_persons == 0 {
            return Err(EngineError::InvalidConfig(
                "max_persons must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `RCREYES_*` overrides read through `lookup`.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("RCREYES_ROUNDING") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(rounding = %mode, "Overriding rounding from environment");
                    self.billing.rounding = parsed;
                }
                Err(e) => warn!(rounding = %mode, "{}", e),
            }
        }

        if let Some(mode) = lookup("RCREYES_MINUTE_ROUNDING") {
            match mode.parse() {
                Ok(parsed) => self.billing.minute_rounding = parsed,
                Err(e) => warn!(minute_rounding = %mode, "{}", e),
            }
        }

        if let Some(policy) = lookup("RCREYES_HEADCOUNT") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(headcount = %policy, "Overriding headcount policy from environment");
                    self.billing.headcount = parsed;
                }
                Err(e) => warn!(headcount = %policy, "{}", e),
            }
        }

        if let Some(prefix) = lookup("RCREYES_CODE_PREFIX") {
            self.tickets.code_prefix = prefix;
        }

        if let Some(max) = lookup("RCREYES_MAX_PERSONS") {
            if let Ok(m) = max.parse::<u32>() {
                self.tickets.max_persons = m;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "rcreyes", "desk")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    pub fn check_in_rules(&self) -> CheckInRules {
        CheckInRules {
            code_prefix: self.tickets.code_prefix.trim().to_uppercase(),
            max_persons: self.tickets.max_persons,
        }
    }
}
