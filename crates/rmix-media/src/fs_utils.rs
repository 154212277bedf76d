//! Filesystem helpers for moving artifacts out of job workspaces.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move a file from `src` to `dst`, creating `dst`'s parent if needed.
///
/// Tries a rename first; when the two paths are on different filesystems
/// (EXDEV) it falls back to copying through a sibling temp file and then
/// removing the source.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }
    ensure_parent(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename, copying instead: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_file(src, dst).await?;
            if let Err(e) = fs::remove_file(src).await {
                tracing::warn!("Failed to remove {} after copy: {}", src.display(), e);
            }
            Ok(())
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Copy `src` to `dst` so that `dst` never holds a partial file.
pub async fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<u64> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    ensure_parent(dst).await?;
    let tmp = dst.with_extension("part");

    let copied = fs::copy(src, &tmp).await?;
    if let Err(e) = fs::rename(&tmp, dst).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(copied)
}

async fn ensure_parent(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// EXDEV is error code 18 on Linux and macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_file_creates_parent() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("out.mp4");
        let dst = dir.path().join("final").join("final_video_abc.mp4");
        fs::write(&src, b"video").await.unwrap();

        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"video");
    }

    #[tokio::test]
    async fn test_move_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = move_file(dir.path().join("nope"), dir.path().join("dst"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_copy_file_keeps_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("base.jpg");
        let dst = dir.path().join("final_image_abc.png");
        fs::write(&src, b"jpeg bytes").await.unwrap();

        let copied = copy_file(&src, &dst).await.unwrap();

        assert_eq!(copied, 10);
        assert!(src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"jpeg bytes");
        assert!(!dst.with_extension("part").exists());
    }

    #[test]
    fn test_cross_device_detection() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}
