//! Loading schema, encoding and configuration documents from disk.
//!
//! Files ending in `.yaml` or `.yml` are read as YAML, everything else as
//! JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use swe_codec::CodecConfig;
use swe_common::{ComponentDef, DataComponent, DataEncoding};
use tracing::debug;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&text).with_context(|| format!("parsing YAML {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("parsing JSON {}", path.display()))
    }
}

/// Build the component tree described by a schema document.
pub fn load_schema(path: &Path) -> Result<DataComponent> {
    let def: ComponentDef = read_document(path)?;
    let component = def
        .build()
        .with_context(|| format!("invalid schema {}", path.display()))?;
    debug!(
        path = %path.display(),
        root = component.name(),
        fields = component.component_count(),
        "Loaded schema"
    );
    Ok(component)
}

pub fn load_encoding(path: &Path) -> Result<DataEncoding> {
    let encoding: DataEncoding = read_document(path)?;
    encoding
        .validate()
        .with_context(|| format!("invalid encoding {}", path.display()))?;
    debug!(path = %path.display(), encoding = encoding.name(), "Loaded encoding");
    Ok(encoding)
}

/// Codec configuration from a document, or from the environment when no
/// document is given.
pub fn load_config(path: Option<&Path>) -> Result<CodecConfig> {
    let config = match path {
        Some(path) => read_document(path)?,
        None => CodecConfig::from_env(),
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid codec configuration: {}", e))?;
    Ok(config)
}
