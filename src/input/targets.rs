use crate::config::TargetConfig;
use crate::state::TargetItem;
use crate::InputError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the JSON target list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntry {
    #[serde(rename = "product_url", alias = "url")]
    pub url: Option<String>,

    #[serde(rename = "product_name", alias = "name", default)]
    pub name: Option<String>,
}

/// Reads a target list from a JSON file
///
/// # Arguments
///
/// * `path` - Path to a JSON array of `{ "product_url", "product_name" }` objects
/// * `target` - Storefront settings used to validate each URL
///
/// # Returns
///
/// * `Ok(Vec<TargetItem>)` - The usable items, in file order
/// * `Err(InputError)` - The file is unreadable, not a JSON array, or has no usable items
pub fn load_targets(path: &Path, target: &TargetConfig) -> Result<Vec<TargetItem>, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let items = parse_targets(&content, target)?;
    if items.is_empty() {
        return Err(InputError::NoTargets(path.display().to_string()));
    }

    tracing::info!("Loaded {} target items from {}", items.len(), path.display());
    Ok(items)
}

/// Parses a JSON target list, skipping invalid entries
pub fn parse_targets(content: &str, target: &TargetConfig) -> Result<Vec<TargetItem>, InputError> {
    let entries: Vec<TargetEntry> = serde_json::from_str(content)?;
    let mut items = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let Some(url) = entry.url.filter(|u| !u.trim().is_empty()) else {
            tracing::warn!("Skipping target #{}: missing URL", index + 1);
            continue;
        };

        let name = entry
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("item-{}", index + 1));

        match TargetItem::from_url(&url, &name, target) {
            Ok(item) => {
                if items.iter().any(|i: &TargetItem| i.id == item.id) {
                    tracing::warn!("Skipping duplicate target {} ({})", item.id, item.name);
                    continue;
                }
                items.push(item);
            }
            Err(e) => tracing::warn!("Skipping target #{}: {}", index + 1, e),
        }
    }

    Ok(items)
}
