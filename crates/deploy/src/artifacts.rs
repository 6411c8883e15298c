//! Contract artifact lookup.
//!
//! Reads compiler output as produced by Hardhat (`artifacts/contracts/<File>.sol/<Name>.json`,
//! `bytecode` as a hex string) or Foundry (`out/<File>.sol/<Name>.json`, `bytecode.object`).

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{abi::Abi, component::ContractSpec};

/// Lookup of deployable contracts by logical name.
pub trait ContractSource {
    fn get_factory(&self, name: &str) -> Result<ContractSpec>;
}

impl ContractSource for BTreeMap<String, ContractSpec> {
    fn get_factory(&self, name: &str) -> Result<ContractSpec> {
        self.get(name)
            .cloned()
            .with_context(|| format!("Unknown contract '{}'", name))
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    abi: Abi,
    bytecode: ArtifactBytecode,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    Hex(String),
    Object { object: String },
}

impl ArtifactBytecode {
    fn as_hex(&self) -> &str {
        match self {
            Self::Hex(hex) | Self::Object { object: hex } => hex,
        }
    }
}

/// Artifacts read from a compiler output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse a single artifact file as the contract `name`.
    pub fn load(name: &str, path: &Path) -> Result<ContractSpec> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let artifact: ArtifactFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

        let hex = artifact.bytecode.as_hex().trim_start_matches("0x");
        if hex.is_empty() {
            anyhow::bail!(
                "Artifact {} has no bytecode (abstract contract or interface?)",
                path.display()
            );
        }
        let bytecode = hex::decode(hex).with_context(|| {
            format!(
                "Invalid bytecode in {} (unlinked library placeholders?)",
                path.display()
            )
        })?;

        Ok(ContractSpec::new(name, artifact.abi, Bytes::from(bytecode)))
    }

    fn find(&self, name: &str) -> Result<PathBuf> {
        let file_name = format!("{}.json", name);
        let mut found = Vec::new();
        collect_matches(&self.root, OsStr::new(&file_name), &mut found)?;

        match found.len() {
            0 => anyhow::bail!(
                "No artifact named {} under {}",
                file_name,
                self.root.display()
            ),
            1 => Ok(found.remove(0)),
            _ => anyhow::bail!(
                "Artifact name {} is ambiguous: {}",
                name,
                found
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl ContractSource for ArtifactStore {
    fn get_factory(&self, name: &str) -> Result<ContractSpec> {
        let path = self.find(name)?;
        tracing::debug!(contract = name, path = %path.display(), "Loading artifact");
        Self::load(name, &path)
    }
}

fn collect_matches(dir: &Path, file_name: &OsStr, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read artifacts directory {}", dir.display()))?;

    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?
            .path();
        if path.is_dir() {
            collect_matches(&path, file_name, found)?;
        } else if path.file_name() == Some(file_name) {
            found.push(path);
        }
    }

    Ok(())
}
