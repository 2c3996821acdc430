//! 入库流程依赖的存储协作者
//!
//! - `DocumentStore`: 按分区删除、创建页面记录
//! - `TocStore`: 按分区读取目录文本
//! - `ArtifactStore`: 派生目录（向量库缓存）的存在检查与递归删除

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::admission::Partition;
use crate::db;
use crate::error::StoreError;
use crate::records::{self, DocumentRecord, NewDocument, TableOfContentsRecord};

pub trait DocumentStore: Send + Sync {
    /// 删除分区内全部记录，返回删除条数；重复调用返回 0
    fn delete_by_partition(&self, partition: Partition) -> Result<usize, StoreError>;

    fn create(&self, document: &NewDocument) -> Result<i64, StoreError>;

    fn list_by_partition(&self, partition: Partition) -> Result<Vec<DocumentRecord>, StoreError>;

    /// 删除所有分区的记录
    fn delete_all(&self) -> Result<usize, StoreError>;
}

pub trait TocStore: Send + Sync {
    /// 读取分区的目录文本，不存在时返回 Ok(None)
    fn get_by_partition(&self, partition: Partition) -> Result<Option<String>, StoreError>;
}

pub trait ArtifactStore: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn remove_recursive(&self, path: &Path) -> Result<(), StoreError>;

    /// 分区派生目录的位置
    fn artifact_dir(&self, partition: Partition) -> PathBuf;
}

/// SQLite 存储
///
/// 同时实现 `DocumentStore` 和 `TocStore`，连接由互斥锁保护
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(db::init_db(path)?),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(db::init_memory_db()?),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(format!("锁定数据库连接失败: {}", e)))
    }

    /// 写入或替换分区目录
    pub fn upsert_toc(&self, partition: Partition, toc_text: &str) -> Result<(), StoreError> {
        records::upsert_toc(&*self.conn()?, partition, toc_text)?;
        Ok(())
    }

    pub fn list_tocs(&self) -> Result<Vec<TableOfContentsRecord>, StoreError> {
        Ok(records::get_all_tocs(&*self.conn()?)?)
    }

    pub fn delete_toc(&self, partition: Partition) -> Result<usize, StoreError> {
        Ok(records::delete_toc(&*self.conn()?, partition)?)
    }

    pub fn count_by_partition(&self, partition: Partition) -> Result<usize, StoreError> {
        Ok(records::count_documents_by_partition(&*self.conn()?, partition)?)
    }
}

impl DocumentStore for SqliteStore {
    fn delete_by_partition(&self, partition: Partition) -> Result<usize, StoreError> {
        Ok(records::delete_documents_by_partition(&*self.conn()?, partition)?)
    }

    fn create(&self, document: &NewDocument) -> Result<i64, StoreError> {
        Ok(records::create_document(&*self.conn()?, document)?)
    }

    fn list_by_partition(&self, partition: Partition) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(records::get_documents_by_partition(&*self.conn()?, partition)?)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        Ok(records::delete_all_documents(&*self.conn()?)?)
    }
}

impl TocStore for SqliteStore {
    fn get_by_partition(&self, partition: Partition) -> Result<Option<String>, StoreError> {
        Ok(records::get_toc_by_partition(&*self.conn()?, partition)?)
    }
}
