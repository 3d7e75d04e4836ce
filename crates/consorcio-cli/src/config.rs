use consorcio_core::simulation::InsuranceRates;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV: &str = "CONSORCIO_CONFIG";

/// Deployment settings the calculator must be handed explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub taxa_seguro_auto: Decimal,
    pub taxa_seguro_imovel: Decimal,
    /// Bucket width for the insights credit distribution.
    pub faixa_distribuicao_credito: Decimal,
}

impl Default for CliConfig {
    fn default() -> Self {
        let rates = InsuranceRates::default();
        CliConfig {
            taxa_seguro_auto: rates.taxa_seguro_auto,
            taxa_seguro_imovel: rates.taxa_seguro_imovel,
            faixa_distribuicao_credito: dec!(50_000),
        }
    }
}

impl CliConfig {
    /// Load from `path`, else from `$CONSORCIO_CONFIG`, else defaults.
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let resolved = match path {
            Some(p) => Some(p.to_string()),
            None => std::env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty()),
        };
        let Some(resolved) = resolved else {
            log::debug!("no config file given, using reference insurance rates");
            return Ok(CliConfig::default());
        };

        let contents = fs::read_to_string(&resolved)
            .map_err(|e| format!("Failed to read config '{}': {}", resolved, e))?;
        let config = Self::from_yaml(&contents)
            .map_err(|e| format!("Failed to parse config '{}': {}", resolved, e))?;
        log::debug!("loaded config from {}: {:?}", resolved, config);
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(CliConfig::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn insurance_rates(&self) -> InsuranceRates {
        InsuranceRates {
            taxa_seguro_auto: self.taxa_seguro_auto,
            taxa_seguro_imovel: self.taxa_seguro_imovel,
        }
    }

    /// Add the configured insurance rates to a JSON parameter object that
    /// does not carry its own.
    pub fn fill_rates(&self, value: &mut Value) {
        if let Value::Object(map) = value {
            map.entry("taxa_seguro_auto")
                .or_insert_with(|| Value::String(self.taxa_seguro_auto.to_string()));
            map.entry("taxa_seguro_imovel")
                .or_insert_with(|| Value::String(self.taxa_seguro_imovel.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CliConfig::from_yaml("taxa_seguro_auto: \"0.0007\"\n").unwrap();
        assert_eq!(config.taxa_seguro_auto, dec!(0.0007));
        assert_eq!(config.taxa_seguro_imovel, dec!(0.000392));
        assert_eq!(config.faixa_distribuicao_credito, dec!(50_000));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(CliConfig::from_yaml("  \n").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_fill_rates_respects_explicit_values() {
        let config = CliConfig::default();
        let mut value = serde_json::json!({ "taxa_seguro_auto": "0.001" });
        config.fill_rates(&mut value);
        assert_eq!(value["taxa_seguro_auto"], "0.001");
        assert_eq!(value["taxa_seguro_imovel"], "0.000392");
    }
}
