//! Installation key and salt files

use std::path::Path;
use tracing::{debug, info};

use crate::config::sibling;
use crate::crypto::{generate_salt, MasterKey};
use crate::error::Result;

/// Load the installation key, creating a fresh random one on first use
pub async fn load_or_create_key(path: &Path) -> Result<MasterKey> {
    if tokio::fs::try_exists(path).await? {
        let contents = zeroize::Zeroizing::new(tokio::fs::read_to_string(path).await?);
        debug!("Loaded installation key from {:?}", path);
        return MasterKey::from_base64(&contents);
    }

    let key = MasterKey::generate();
    let encoded = key.to_base64();
    write_private(path, encoded.as_bytes()).await?;

    info!("Created new installation key at {:?}", path);
    Ok(key)
}

/// Load the Argon2 salt, creating one on first use
pub async fn load_or_create_salt(path: &Path) -> Result<String> {
    if tokio::fs::try_exists(path).await? {
        let salt = tokio::fs::read_to_string(path).await?;
        debug!("Loaded salt from {:?}", path);
        return Ok(salt.trim().to_string());
    }

    let salt = generate_salt();
    write_private(path, salt.as_bytes()).await?;

    info!("Created new salt at {:?}", path);
    Ok(salt)
}

/// Write owner-only, through a temp file so a crash never leaves a truncated key
async fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = sibling(path, "tmp");
    tokio::fs::write(&temp_path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_key_is_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.key");

        let first = load_or_create_key(&path).await.unwrap();
        let second = load_or_create_key(&path).await.unwrap();

        assert_eq!(first.as_bytes(), second.as_bytes());
        assert!(!temp_dir.path().join("nested").join("store.key.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.key");
        load_or_create_key(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_corrupt_key_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.key");
        std::fs::write(&path, "definitely not a key").unwrap();

        assert!(load_or_create_key(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_salt_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.salt");

        let first = load_or_create_salt(&path).await.unwrap();
        let second = load_or_create_salt(&path).await.unwrap();
        assert_eq!(first, second);
    }
}
