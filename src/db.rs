//! Catalog seeding from JSON / 种子数据导入

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::DatabaseConfig;
use crate::models::{CatalogItem, SeedFile};

/// Read a seed file of the `{"items": [[...]]}` shape / 读取种子文件
pub fn read_seed_file(path: &Path) -> Result<Vec<CatalogItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {:?}", path))?;
    let seed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file {:?}", path))?;
    Ok(seed.into_items())
}

/// Items to seed at startup, if configured / 启动时需要导入的商品
///
/// A configured but missing file is skipped with a warning.
pub fn seed_items(db: &DatabaseConfig) -> Result<Option<Vec<CatalogItem>>> {
    let Some(seed_file) = &db.seed_file else {
        return Ok(None);
    };

    let path = Path::new(seed_file);
    if !path.exists() {
        tracing::warn!("Seed file not found, skipping: {:?}", path);
        return Ok(None);
    }

    let items = read_seed_file(path)?;
    tracing::info!("Read {} items from seed file {:?}", items.len(), path);
    Ok(Some(items))
}
