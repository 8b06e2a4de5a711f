use crate::engine::RunArtifacts;
use anyhow::Context;
use std::path::Path;

pub fn write_json(artifacts: &RunArtifacts, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(artifacts)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
