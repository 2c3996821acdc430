use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::admission::Partition;
use crate::error::StoreError;
use crate::store::ArtifactStore;

/// 已保存的上传文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedUpload {
    pub path: PathBuf,
    /// 文件名，同时作为页面记录的 title
    pub file_name: String,
    /// 文件内容的 SHA256（十六进制）
    pub sha256: String,
}

/// 媒体管理器
/// 负责把上传的 PDF 保存到 `<media_root>/documents/` 下
pub struct MediaManager {
    media_root: PathBuf,
}

impl MediaManager {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.media_root.join("documents")
    }

    /// 保存上传文件
    ///
    /// 同名文件已存在时先删除再写入
    ///
    /// # 参数
    /// - `partition`: 上传所属分区，决定文件名
    /// - `bytes`: PDF 二进制数据
    ///
    /// # 返回
    /// 保存后的路径、文件名和摘要
    pub fn save_upload(&self, partition: Partition, bytes: &[u8]) -> Result<SavedUpload, StoreError> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let sha256 = format!("{:x}", hasher.finalize());

        let dir = self.documents_dir();
        fs::create_dir_all(&dir)?;

        let file_name = partition.upload_file_name();
        let path = dir.join(&file_name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        fs::write(&path, bytes)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), %sha256, "上传文件已保存");

        Ok(SavedUpload {
            path,
            file_name,
            sha256,
        })
    }
}

/// 文件系统上的派生目录存储
///
/// 目录布局：`<vector_db_root>/<store name>/<english category>_vectorDB`
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_recursive(&self, path: &Path) -> Result<(), StoreError> {
        fs::remove_dir_all(path)?;
        Ok(())
    }

    fn artifact_dir(&self, partition: Partition) -> PathBuf {
        partition.vector_store_dir(&self.root)
    }
}
