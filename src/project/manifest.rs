//! Project manifest (`glint.toml`) parsing.
//!
//! The core pipeline only consumes `project.name` and `dependencies`;
//! every other field is parsed and carried along for the CLI's own
//! display/host-compiler-flag purposes but is not semantically required
//! by any pipeline phase.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub project: ProjectSection,
    #[serde(default)]
    pub dependencies: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub build: BuildSection,
}

#[derive(Debug, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BuildSection {
    #[serde(default)]
    pub optimization: Option<u8>,
}

#[derive(Debug)]
pub enum ManifestError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Io(e) => write!(f, "could not read manifest: {e}"),
            ManifestError::Parse(e) => write!(f, "could not parse manifest: {e}"),
        }
    }
}

impl std::error::Error for ManifestError {}

impl Manifest {
    pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(ManifestError::Io)?;
        toml::from_str(&text).map_err(ManifestError::Parse)
    }

    pub const FILE_NAME: &'static str = "glint.toml";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let manifest: Manifest = toml::from_str(
            r#"
            [project]
            name = "demo"
            "#,
        )
        .unwrap();
        assert_eq!(manifest.project.name, "demo");
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn parses_dependencies_table() {
        let manifest: Manifest = toml::from_str(
            r#"
            [project]
            name = "demo"
            version = "0.1.0"

            [dependencies]
            collections = "1.0"
            "#,
        )
        .unwrap();
        assert_eq!(manifest.dependencies.get("collections").map(String::as_str), Some("1.0"));
    }
}
