//! Loading of lean-quickstart genesis directories.
//!
//! A directory holds `config.yaml` (chain parameters), `validators.yaml`
//! (validator index assignments keyed by node id), and an optional
//! `nodes.yaml` (bootnode multiaddrs).

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{anyhow, Context as _, Result};
use serde::Deserialize;
use types::primitives::UnixSeconds;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisConfig {
    #[serde(rename = "GENESIS_TIME")]
    pub genesis_time: UnixSeconds,
    #[serde(rename = "VALIDATOR_COUNT")]
    pub validator_count: u64,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Quickstart {
    pub config: GenesisConfig,
    pub validator_indices: Vec<u64>,
    pub bootnodes: Vec<String>,
}

/// Loads all configuration from a genesis directory.
/// Without a `node_id` no validator indices are assigned.
pub fn load(genesis_dir: impl AsRef<Path>, node_id: Option<&str>) -> Result<Quickstart> {
    let genesis_dir = genesis_dir.as_ref();

    let config_contents = fs::read_to_string(genesis_dir.join("config.yaml"))
        .context("failed to read config.yaml")?;
    let config = parse_config(&config_contents)?;

    let validator_indices = match node_id {
        Some(node_id) => {
            let contents = fs::read_to_string(genesis_dir.join("validators.yaml"))
                .context("failed to read validators.yaml")?;
            assigned_indices(&contents, node_id)?
        }
        None => vec![],
    };

    // Bootnodes are optional.
    let bootnodes = fs::read_to_string(genesis_dir.join("nodes.yaml"))
        .ok()
        .map(|contents| parse_bootnodes(&contents))
        .transpose()?
        .unwrap_or_default();

    Ok(Quickstart {
        config,
        validator_indices,
        bootnodes,
    })
}

fn parse_config(contents: &str) -> Result<GenesisConfig> {
    serde_yaml::from_str(contents).context("failed to parse config.yaml")
}

fn assigned_indices(contents: &str, node_id: &str) -> Result<Vec<u64>> {
    let assignments = serde_yaml::from_str::<BTreeMap<String, Vec<u64>>>(contents)
        .context("failed to parse validators.yaml")?;

    assignments
        .get(node_id)
        .cloned()
        .ok_or_else(|| anyhow!("node {node_id:?} not found in validators.yaml"))
}

fn parse_bootnodes(contents: &str) -> Result<Vec<String>> {
    serde_yaml::from_str(contents).context("failed to parse nodes.yaml")
}
