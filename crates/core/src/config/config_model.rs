use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use crate::constants::{DEFAULT_BASE_CURRENCY, DEFAULT_DAY_COUNT_BASIS, DEFAULT_TOP_EXPENSES_LIMIT};
use crate::errors::{Error, Result};

pub const ENV_BASE_CURRENCY: &str = "TALLY_BASE_CURRENCY";
pub const ENV_CREDIT_ACCOUNTS: &str = "TALLY_CREDIT_ACCOUNTS";
pub const ENV_DAY_COUNT_BASIS: &str = "TALLY_DAY_COUNT_BASIS";
pub const ENV_TOP_EXPENSES_LIMIT: &str = "TALLY_TOP_EXPENSES_LIMIT";
pub const ENV_VALUATION_POLICY: &str = "TALLY_VALUATION_POLICY";

/// What the holdings aggregator does with an asset it cannot price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValuationPolicy {
    /// Fail the whole query on the first unpriced asset.
    #[default]
    Strict,
    /// Return priced holdings and list the unpriced ones separately.
    Partial,
}

impl FromStr for ValuationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ValuationPolicy::Strict),
            "partial" => Ok(ValuationPolicy::Partial),
            other => Err(Error::InvalidConfigValue(format!(
                "unknown valuation policy '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub base_currency: String,
    /// Accounts whose expenses are deferred payments (credit cards and the like).
    pub credit_accounts: Vec<String>,
    pub day_count_basis: u32,
    pub top_expenses_limit: usize,
    pub valuation_policy: ValuationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            credit_accounts: Vec::new(),
            day_count_basis: DEFAULT_DAY_COUNT_BASIS,
            top_expenses_limit: DEFAULT_TOP_EXPENSES_LIMIT,
            valuation_policy: ValuationPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Builds a config from `TALLY_*` environment variables, defaulting anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        debug!("Loading engine config from {}", path.display());
        Self::from_json_str(&contents)
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        if let Some(currency) = lookup(ENV_BASE_CURRENCY) {
            config.base_currency = currency.trim().to_uppercase();
        }
        if let Some(accounts) = lookup(ENV_CREDIT_ACCOUNTS) {
            config.credit_accounts = accounts
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(basis) = lookup(ENV_DAY_COUNT_BASIS) {
            config.day_count_basis = basis.trim().parse().map_err(|_| {
                Error::InvalidConfigValue(format!(
                    "{} must be an integer, got '{}'",
                    ENV_DAY_COUNT_BASIS, basis
                ))
            })?;
        }
        if let Some(limit) = lookup(ENV_TOP_EXPENSES_LIMIT) {
            config.top_expenses_limit = limit.trim().parse().map_err(|_| {
                Error::InvalidConfigValue(format!(
                    "{} must be an integer, got '{}'",
                    ENV_TOP_EXPENSES_LIMIT, limit
                ))
            })?;
        }
        if let Some(policy) = lookup(ENV_VALUATION_POLICY) {
            config.valuation_policy = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_currency.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "base currency must not be empty".to_string(),
            ));
        }
        if self.day_count_basis == 0 {
            return Err(Error::InvalidConfigValue(
                "day count basis must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Lower-cased credit account names, ready for case-insensitive matching.
    pub fn credit_account_set(&self) -> HashSet<String> {
        self.credit_accounts
            .iter()
            .map(|a| a.trim().to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.day_count_basis, 365);
        assert_eq!(config.valuation_policy, ValuationPolicy::Strict);
    }

    #[test]
    fn reads_environment_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_BASE_CURRENCY, "usd"),
            (ENV_CREDIT_ACCOUNTS, "Visa Card, Amex ,,"),
            (ENV_DAY_COUNT_BASIS, "360"),
            (ENV_TOP_EXPENSES_LIMIT, "3"),
            (ENV_VALUATION_POLICY, "Partial"),
        ]))
        .unwrap();

        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.credit_accounts, vec!["Visa Card", "Amex"]);
        assert_eq!(config.day_count_basis, 360);
        assert_eq!(config.top_expenses_limit, 3);
        assert_eq!(config.valuation_policy, ValuationPolicy::Partial);
        assert!(config.credit_account_set().contains("visa card"));
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_basis = EngineConfig::from_lookup(lookup_from(&[(ENV_DAY_COUNT_BASIS, "abc")]));
        assert!(matches!(bad_basis, Err(Error::InvalidConfigValue(_))));

        let zero_basis = EngineConfig::from_lookup(lookup_from(&[(ENV_DAY_COUNT_BASIS, "0")]));
        assert!(matches!(zero_basis, Err(Error::InvalidConfigValue(_))));

        let bad_policy =
            EngineConfig::from_lookup(lookup_from(&[(ENV_VALUATION_POLICY, "lenient")]));
        assert!(matches!(bad_policy, Err(Error::InvalidConfigValue(_))));
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let json = r#"{"creditAccounts":["Visa"],"valuationPolicy":"partial"}"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.credit_accounts, vec!["Visa"]);
        assert_eq!(config.valuation_policy, ValuationPolicy::Partial);
        assert_eq!(config.top_expenses_limit, DEFAULT_TOP_EXPENSES_LIMIT);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"baseCurrency":"USD","dayCountBasis":360}}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.day_count_basis, 360);

        let missing = EngineConfig::from_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(Error::ConfigIO(_))));
    }
}
