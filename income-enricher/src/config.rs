use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::enricher::ContextStrategy;

pub const DEFAULT_CONFIG_FILE: &str = "income-enricher.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistrySection,
    pub enricher: EnricherSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    pub base_url: String,
    /// Bearer token; usually supplied through INCOME_API_TOKEN instead.
    pub token: Option<String>,
    /// Connect and request timeout
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnricherSection {
    pub context_strategy: ContextStrategy,
    pub stale_after_secs: u64,
    pub max_in_flight: usize,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for EnricherSection {
    fn default() -> Self {
        Self {
            context_strategy: ContextStrategy::ClassifyLocally,
            stale_after_secs: 30,
            max_in_flight: 8,
        }
    }
}

pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// File (if present) then environment.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut cfg = read_config_file(&config_path(explicit))?;
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    Ok(cfg)
}

fn read_config_file(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn apply_env_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(url) = var("INCOME_API_URL") {
        cfg.registry.base_url = url;
    }
    if let Some(token) = var("INCOME_API_TOKEN") {
        cfg.registry.token = Some(token);
    }
    if let Some(s) = var("INCOME_CONTEXT_STRATEGY") {
        cfg.enricher.context_strategy = s
            .parse()
            .map_err(anyhow::Error::msg)
            .context("INCOME_CONTEXT_STRATEGY")?;
    }
    if let Some(n) = var("INCOME_MAX_IN_FLIGHT") {
        cfg.enricher.max_in_flight = n.trim().parse().context("INCOME_MAX_IN_FLIGHT")?;
    }
    if let Some(n) = var("INCOME_STALE_AFTER_SECS") {
        cfg.enricher.stale_after_secs = n.trim().parse().context("INCOME_STALE_AFTER_SECS")?;
    }
    Ok(())
}

pub fn save_config(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(explicit: Option<&Path>) -> Result<()> {
    let p = config_path(explicit);
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = read_config_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.enricher.max_in_flight, 8);
        assert_eq!(cfg.enricher.stale_after_secs, 30);
        assert_eq!(cfg.registry.timeout_secs, 30);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("cfg.toml");
        fs::write(
            &p,
            r#"
[registry]
base_url = "http://inntekt-api/"

[enricher]
context_strategy = "registry-classified"
"#,
        )
        .unwrap();

        let cfg = read_config_file(&p).unwrap();
        assert_eq!(cfg.registry.base_url, "http://inntekt-api/");
        assert_eq!(cfg.registry.timeout_secs, 30);
        assert_eq!(cfg.enricher.context_strategy, ContextStrategy::RegistryClassified);
        assert_eq!(cfg.enricher.max_in_flight, 8);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut cfg = Config::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("INCOME_API_URL", "http://other/"),
                ("INCOME_API_TOKEN", "secret"),
                ("INCOME_CONTEXT_STRATEGY", "registry-classified"),
                ("INCOME_MAX_IN_FLIGHT", "2"),
                ("INCOME_STALE_AFTER_SECS", " 60 "),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.registry.base_url, "http://other/");
        assert_eq!(cfg.registry.token.as_deref(), Some("secret"));
        assert_eq!(cfg.enricher.context_strategy, ContextStrategy::RegistryClassified);
        assert_eq!(cfg.enricher.max_in_flight, 2);
        assert_eq!(cfg.enricher.stale_after_secs, 60);
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let mut cfg = Config::default();
        let err = apply_env_overrides(&mut cfg, env(&[("INCOME_MAX_IN_FLIGHT", "many")])).unwrap_err();
        assert!(format!("{err:#}").contains("INCOME_MAX_IN_FLIGHT"));
    }

    #[test]
    fn test_init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("income-enricher.toml");

        init_config(Some(&p)).unwrap();
        let written = read_config_file(&p).unwrap();
        assert_eq!(written, Config::default());

        fs::write(&p, "[enricher]\nmax_in_flight = 3\n").unwrap();
        init_config(Some(&p)).unwrap();
        assert_eq!(read_config_file(&p).unwrap().enricher.max_in_flight, 3);
    }
}
