//! Deployment file loading.
//!
//! The deployment file is a JSON document of the form
//!
//! ```json
//! {
//!   "network": "localhost",
//!   "contracts": {
//!     "Staking": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
//!     "SYI": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
//!   }
//! }
//! ```
//!
//! Only `contracts.Staking` is required; it is the contract whose `BindReferral` events are
//! watched. Unknown keys are ignored.

use std::{fs, path::Path, str::FromStr};

use alloy::primitives::Address;
use serde::Deserialize;

use crate::error::ConfigError;

/// File name looked up when no deployment file is given explicitly.
pub const DEFAULT_DEPLOYMENT_FILE: &str = "syi-deployment.json";

/// Label used when the deployment file does not name its network.
pub const DEFAULT_NETWORK_LABEL: &str = "localhost";

#[derive(Debug, Default, Deserialize)]
struct RawDeployment {
    #[serde(default)]
    contracts: RawContracts,
    network: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawContracts {
    #[serde(rename = "Staking")]
    staking: Option<String>,
    #[serde(rename = "SYI")]
    syi: Option<String>,
}

/// Addresses and labels read from a deployment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Contract emitting `BindReferral` events.
    pub contract_address: Address,
    /// Token contract deployed alongside, if recorded.
    pub token_address: Option<Address>,
    pub network: Option<String>,
}

impl DeploymentConfig {
    /// Reads and validates the deployment file at `path`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Read`] if the file cannot be read.
    /// * Any error of [`DeploymentConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&contents)
    }

    /// Parses a deployment document.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] if the document is not valid JSON of the expected shape.
    /// * [`ConfigError::MissingContractAddress`] if `contracts.Staking` is absent or blank.
    /// * [`ConfigError::InvalidAddress`] if an address is not 20 bytes of hex.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawDeployment = serde_json::from_str(json)?;

        let contract_address = match raw.contracts.staking.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => parse_address("Staking", value)?,
            _ => return Err(ConfigError::MissingContractAddress),
        };

        let token_address = match raw.contracts.syi.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(parse_address("SYI", value)?),
            _ => None,
        };

        Ok(Self { contract_address, token_address, network: raw.network })
    }

    /// The network label, or [`DEFAULT_NETWORK_LABEL`] when none was recorded.
    #[must_use]
    pub fn network_label(&self) -> &str {
        self.network.as_deref().unwrap_or(DEFAULT_NETWORK_LABEL)
    }
}

// Checksums are not enforced; any hex casing is accepted.
fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    Address::from_str(value)
        .map_err(|_| ConfigError::InvalidAddress { field, value: value.to_owned() })
}
