//! Restricted-access file storage for snapshots.

use crate::error::{JobError, JobResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Name of the access policy file kept in each restricted folder.
pub const ACCESS_POLICY_FILE: &str = ".access.json";

/// View permission granting access to listed groups only.
pub const ONLY_THESE_GROUPS: &str = "only_these_groups";

/// Who may view the contents of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub can_view: String,
    pub viewer_groups: Vec<String>,
}

impl AccessPolicy {
    pub fn only_group(group: impl Into<String>) -> Self {
        Self {
            can_view: ONLY_THESE_GROUPS.to_string(),
            viewer_groups: vec![group.into()],
        }
    }
}

/// Storage able to hold files readable by an administrative group only.
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// Create `folder` if needed and restrict viewing to `admin_group`.
    async fn ensure_restricted_folder(&self, folder: &str, admin_group: &str) -> JobResult<()>;

    /// Write `bytes` to `folder/filename`, replacing any previous content.
    async fn write_file(&self, folder: &str, filename: &str, bytes: &[u8]) -> JobResult<PathBuf>;
}

/// [`SecureStorage`] on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsSecureStorage {
    root: PathBuf,
}

impl FsSecureStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_path(&self, folder: &str) -> JobResult<PathBuf> {
        let trimmed = folder.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|part| part == "..") {
            return Err(JobError::Storage(format!("Invalid folder name: {:?}", folder)));
        }
        Ok(self.root.join(trimmed))
    }

    /// Access policy recorded for `folder`, if any.
    pub async fn access_policy(&self, folder: &str) -> JobResult<Option<AccessPolicy>> {
        let path = self.folder_path(folder)?.join(ACCESS_POLICY_FILE);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SecureStorage for FsSecureStorage {
    async fn ensure_restricted_folder(&self, folder: &str, admin_group: &str) -> JobResult<()> {
        let dir = self.folder_path(folder)?;
        fs::create_dir_all(&dir).await?;
        restrict(&dir, 0o700).await?;

        let policy = serde_json::to_vec_pretty(&AccessPolicy::only_group(admin_group))?;
        write_atomic(&dir, ACCESS_POLICY_FILE, &policy).await?;

        debug!(folder = %dir.display(), admin_group, "Restricted folder access");
        Ok(())
    }

    async fn write_file(&self, folder: &str, filename: &str, bytes: &[u8]) -> JobResult<PathBuf> {
        if filename.is_empty() || filename.contains('/') {
            return Err(JobError::Storage(format!("Invalid file name: {:?}", filename)));
        }

        let dir = self.folder_path(folder)?;
        fs::create_dir_all(&dir).await?;
        let path = write_atomic(&dir, filename, bytes).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
        Ok(path)
    }
}

/// Write through a temp file in the same directory, then rename over the target.
async fn write_atomic(dir: &Path, filename: &str, bytes: &[u8]) -> JobResult<PathBuf> {
    let target = dir.join(filename);
    let temp_path = dir.join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));

    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);
    restrict(&temp_path, 0o600).await?;

    if let Err(e) = fs::rename(&temp_path, &target).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(target)
}

#[cfg(unix)]
async fn restrict(path: &Path, mode: u32) -> JobResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict(_path: &Path, _mode: u32) -> JobResult<()> {
    Ok(())
}
