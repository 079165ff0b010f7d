//! Connection-option parsing. The URL itself (scheme, user, password,
//! host, database) is parsed by an external collaborator; this module
//! owns only the *recognized options* that affect the core, as a
//! serde struct with field defaults.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_fetch_size;

/// `scanMethod` (§6.1) / Glossary "Sample strategy": how `SchemaInference`
/// draws its sample of documents from a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleStrategy {
    Random,
    IdForward,
    IdReverse,
    All,
}

impl Default for SampleStrategy {
    fn default() -> Self {
        SampleStrategy::Random
    }
}

impl SampleStrategy {
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "random" => Ok(SampleStrategy::Random),
            "idForward" => Ok(SampleStrategy::IdForward),
            "idReverse" => Ok(SampleStrategy::IdReverse),
            "all" => Ok(SampleStrategy::All),
            other => Err(CoreError::InvalidOption {
                name: "scanMethod".to_string(),
                message: format!("unknown sample strategy '{other}'"),
            }),
        }
    }
}

/// The subset of §6.1's query-URL options that affect the core. Parsing
/// the URL itself (scheme/user/password/host/port/database) stays out of
/// scope (§1); this struct is what an external URL parser hands the core
/// once it has extracted the `?opt=value` tail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOptions {
    /// Sample strategy used by `SchemaInference`. Default `random`.
    #[serde(default)]
    pub scan_method: SampleStrategy,

    /// Sample size limit; ignored when `scan_method` is `all`. No spec
    /// default is given beyond "positive int" — the caller must supply
    /// one when a non-`all` strategy is used.
    #[serde(default)]
    pub scan_limit: Option<u32>,

    /// Schema name to bind queries to. Default `"_default"` (§6.1).
    #[serde(default = "default_schema_name")]
    pub schema_name: String,

    /// Force a new schema inference run rather than reading the latest
    /// persisted version.
    #[serde(default)]
    pub refresh_schema: bool,

    /// Default fetch size for the executor (§4.7). Default 2000; `0`
    /// means implementation-chosen.
    #[serde(default = "default_fetch_size")]
    pub default_fetch_size: u32,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            scan_method: SampleStrategy::default(),
            scan_limit: None,
            schema_name: default_schema_name(),
            refresh_schema: false,
            default_fetch_size: default_fetch_size(),
        }
    }
}

impl ConnectionOptions {
    /// Validate cross-field constraints not expressible via serde
    /// defaults alone: a non-`all` scan method needs a positive limit.
    pub fn validate(&self) -> CoreResult<()> {
        if self.scan_method != SampleStrategy::All {
            match self.scan_limit {
                Some(n) if n > 0 => {}
                _ => {
                    return Err(CoreError::InvalidOption {
                        name: "scanLimit".to_string(),
                        message: "must be a positive integer unless scanMethod=all".to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

fn default_schema_name() -> String {
    "_default".to_string()
}
