use crate::errors::{EngineError, EngineResult};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub binomial_steps: usize,
    pub mc_simulations: usize,
    pub mc_seed: u64,
    pub mc_path_steps: usize,
    pub mc_confidence: f64,
    pub max_simulations: usize,
    pub max_binomial_steps: usize,
    pub max_sample_paths: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 5000,
            binomial_steps: 100,
            mc_simulations: 10_000,
            mc_seed: 42,
            mc_path_steps: 100,
            mc_confidence: 0.95,
            max_simulations: 1_000_000,
            max_binomial_steps: 5_000,
            max_sample_paths: 1_000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let cfg = Self {
            server_port: parse_or(&lookup, "SERVER_PORT", d.server_port)?,
            binomial_steps: parse_or(&lookup, "BINOMIAL_STEPS", d.binomial_steps)?,
            mc_simulations: parse_or(&lookup, "MC_SIMULATIONS", d.mc_simulations)?,
            mc_seed: parse_or(&lookup, "MC_SEED", d.mc_seed)?,
            mc_path_steps: parse_or(&lookup, "MC_PATH_STEPS", d.mc_path_steps)?,
            mc_confidence: parse_or(&lookup, "MC_CONFIDENCE", d.mc_confidence)?,
            max_simulations: parse_or(&lookup, "MAX_SIMULATIONS", d.max_simulations)?,
            max_binomial_steps: parse_or(&lookup, "MAX_BINOMIAL_STEPS", d.max_binomial_steps)?,
            max_sample_paths: parse_or(&lookup, "MAX_SAMPLE_PATHS", d.max_sample_paths)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> EngineResult<()> {
        if !(self.mc_confidence > 0.0 && self.mc_confidence < 1.0) {
            return Err(EngineError::Config(format!("MC_CONFIDENCE: must be in (0, 1), got {}", self.mc_confidence)));
        }
        if self.binomial_steps < 2 || self.binomial_steps > self.max_binomial_steps {
            return Err(EngineError::Config(format!(
                "BINOMIAL_STEPS: must be in [2, {}], got {}",
                self.max_binomial_steps, self.binomial_steps
            )));
        }
        if self.mc_simulations == 0 || self.mc_simulations > self.max_simulations {
            return Err(EngineError::Config(format!(
                "MC_SIMULATIONS: must be in [1, {}], got {}",
                self.max_simulations, self.mc_simulations
            )));
        }
        if self.mc_path_steps == 0 {
            return Err(EngineError::Config("MC_PATH_STEPS: must be at least 1".into()));
        }
        if self.max_sample_paths == 0 {
            return Err(EngineError::Config("MAX_SAMPLE_PATHS: must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> EngineResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| EngineError::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.server_port, 5000);
        assert_eq!(cfg.mc_seed, 42);
        assert_eq!(cfg.mc_simulations, 10_000);
        assert_eq!(cfg.binomial_steps, 100);
    }

    #[test]
    fn test_overrides_parsed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("SERVER_PORT", "8080"), ("MC_SEED", " 7 ")])).unwrap();
        assert_eq!(cfg.server_port, 8080);
        assert_eq!(cfg.mc_seed, 7);
    }

    #[test]
    fn test_parse_failure_names_key() {
        let err = AppConfig::from_lookup(lookup_from(&[("MC_SIMULATIONS", "lots")])).unwrap_err();
        assert!(matches!(err, EngineError::Config(ref m) if m.starts_with("MC_SIMULATIONS")), "{err}");
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("MC_CONFIDENCE", "1.5")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("BINOMIAL_STEPS", "1")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("MC_SIMULATIONS", "2000000")])).is_err());
    }
}
