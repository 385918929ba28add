use ikebana_qubo::{ArrangementError, FlowerCatalog, SimulatedAnnealer, Vessel, DEFAULT_NUM_READS};
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub num_reads: usize,
    pub sweeps: usize,
    pub allowed_origin: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://ikebana.db?mode=rwc".to_string());
        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let bind_addr = parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let num_reads = parse_or(&lookup, "NUM_READS", DEFAULT_NUM_READS)?;
        let sweeps = parse_or(&lookup, "ANNEAL_SWEEPS", SimulatedAnnealer::DEFAULT_SWEEPS)?;
        if num_reads == 0 {
            return Err(ConfigError::Invalid {
                key: "NUM_READS",
                value: "0".to_string(),
            });
        }
        Ok(Self {
            database_url,
            bind_addr,
            num_reads,
            sweeps,
            allowed_origin,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// Vessel dimensions for a named vase preset.
pub fn vessel_for(vase: &str) -> Vessel {
    match vase {
        "筒型花器" | "tube" => Vessel {
            width: 10.0,
            height: 20.0,
        },
        "皿型花器" | "dish" => Vessel {
            width: 10.0,
            height: 15.0,
        },
        _ => Vessel {
            width: 10.0,
            height: 15.0,
        },
    }
}

/// Flowers offered by the web front end.
pub fn default_catalog() -> Result<FlowerCatalog, ArrangementError> {
    let tall = vec![60.0, 50.0, 30.0];
    let weights = [
        ("sakura", 0.4),
        ("liatris", 0.4),
        ("dill", 0.4),
        ("moluccella", 0.25),
        ("rose", 0.25),
        ("peony", 0.25),
        ("lily", 0.25),
    ];
    let lengths: HashMap<String, Vec<f64>> = [
        ("sakura", tall.clone()),
        ("liatris", tall.clone()),
        ("dill", tall.clone()),
        ("moluccella", tall),
        ("rose", vec![23.0, 20.0, 15.0]),
        ("peony", vec![23.0, 17.0, 15.0]),
        ("lily", vec![23.0, 17.0, 15.0]),
    ]
    .into_iter()
    .map(|(name, l)| (name.to_string(), l))
    .collect();
    FlowerCatalog::from_maps(weights.into_iter().map(|(n, w)| (n.to_string(), w)), &lengths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_url, "sqlite://ikebana.db?mode=rwc");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.num_reads, 20);
        assert_eq!(config.sweeps, 1000);
        assert_eq!(config.allowed_origin, "http://localhost:3000");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ServerConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("127.0.0.1:9000".to_string()),
            "NUM_READS" => Some(" 5 ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.num_reads, 5);
    }

    #[test]
    fn bad_values_are_rejected() {
        let num_reads = |value: &'static str| {
            move |key: &str| (key == "NUM_READS").then(|| value.to_string())
        };
        let err = ServerConfig::from_lookup(num_reads("many")).unwrap_err();
        assert!(err.to_string().contains("NUM_READS"));
        assert!(ServerConfig::from_lookup(num_reads("0")).is_err());
    }

    #[test]
    fn vase_presets() {
        assert_eq!(vessel_for("筒型花器").length_limit(), 60.0);
        assert_eq!(vessel_for("tube").height, 20.0);
        assert_eq!(vessel_for("皿型花器").height, 15.0);
        assert_eq!(vessel_for("").length_limit(), 50.0);
    }

    #[test]
    fn default_catalog_keeps_display_order() {
        let catalog = default_catalog().unwrap();
        let names: Vec<_> = catalog.flowers().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["sakura", "liatris", "dill", "moluccella", "rose", "peony", "lily"]);
        assert_eq!(catalog.domain().len(), 21);
    }
}
