//! Group provisioning. Groups are curated content, so they are created from a
//! seed file at startup rather than through the web routes.
use std::path::Path;

use anyhow::Context;
use log::info;

use crate::error::Result;
use crate::models::NewGroup;
use crate::repositories::Store;

/// Reads a JSON array of `{"title", "slug", "description"}` objects.
pub async fn load_groups_file(path: &Path) -> anyhow::Result<Vec<NewGroup>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read groups file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("groups file {} is not a list of groups", path.display()))
}

/// Creates every group whose slug is not taken yet. Returns how many were
/// created; existing groups are left as they are.
pub async fn seed_groups(store: &dyn Store, groups: Vec<NewGroup>) -> Result<usize> {
    let mut created = 0;
    for group in groups {
        if store.get_group_by_slug(&group.slug).await?.is_some() {
            continue;
        }
        let group = store.create_group(group).await?;
        info!("created group {} ({})", group.slug, group.title);
        created += 1;
    }
    Ok(created)
}
