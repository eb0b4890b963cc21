//! Parser configuration with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Optional TOML config file
//! 3. Environment variables: `SRCROOT_*` prefix
//!
//! The configuration is shared by every root in a federation; the core
//! propagates it verbatim to parser and printer collaborators.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Character encoding used when reading and writing source files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

impl Encoding {
    /// Decode raw file bytes. Returns `None` when the bytes are not valid
    /// in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            // Latin-1 maps each byte to the Unicode code point of the same value
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encode text for writing. Returns `None` when a character is not
    /// representable in this encoding.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Utf8 => Some(text.as_bytes().to_vec()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf8"),
            Encoding::Latin1 => write!(f, "latin1"),
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(Error::Config {
                message: format!("unknown encoding: {other}"),
            }),
        }
    }
}

/// Language level accepted by the parser. Enumerated here but semantically
/// opaque to the core: it is propagated verbatim to collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLevel {
    Legacy,
    #[default]
    Current,
    Preview,
}

impl FromStr for LanguageLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(LanguageLevel::Legacy),
            "current" => Ok(LanguageLevel::Current),
            "preview" => Ok(LanguageLevel::Preview),
            other => Err(Error::Config {
                message: format!("unknown language level: {other}"),
            }),
        }
    }
}

/// Shared parser configuration for a federation of source roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Character encoding for reading and writing source files
    pub encoding: Encoding,
    /// Language level to parse at
    pub language_level: LanguageLevel,
    /// Tab width used by printing collaborators
    pub tab_width: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            language_level: LanguageLevel::Current,
            tab_width: 4,
        }
    }
}

impl ParserConfig {
    /// Load configuration with layered precedence: defaults, then the given
    /// TOML file (if any), then `SRCROOT_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| Error::Config {
            message: format!("parse {}: {}", path.display(), e),
        })
    }

    /// Apply `SRCROOT_*` environment variables as explicit overrides.
    fn apply_env_overrides(&mut self) -> Result<()> {
        let env = Config::builder()
            .add_source(Environment::with_prefix("SRCROOT"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = env.get_string("encoding") {
            self.encoding = val.parse()?;
        }
        if let Ok(val) = env.get_string("language_level") {
            self.language_level = val.parse()?;
        }
        if let Ok(val) = env.get_string("tab_width") {
            self.tab_width = val.parse().map_err(|_| Error::Config {
                message: format!("invalid tab width: {val}"),
            })?;
        }

        Ok(())
    }
}

fn config_err(e: ConfigError) -> Error {
    Error::Config {
        message: e.to_string(),
    }
}
