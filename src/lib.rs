//! 招生资料 PDF 入库
//!
//! 上传的 PDF 按（入学类型, 分类）分区保存，逐页提取后依据管理员维护的目录
//! 为每页分配章节标题，标注后写入 SQLite

pub mod admission;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod media;
pub mod parser;
pub mod records;
pub mod store;
pub mod upload_tracker;


pub use admission::{AdmissionType, Category, ParsePolicy, Partition};
pub use config::IngestConfig;
pub use error::{ExtractError, IngestError, StoreError, ValidationError};
pub use ingest::{
    fetch_toc_mapping, IngestCoordinator, UploadForm, UploadReport, UploadRequest, UploadResponse,
    SUCCESS_MESSAGE,
};
pub use media::{FsArtifactStore, MediaManager, SavedUpload};
pub use parser::{annotate, assign_titles, parse_toc, Page, PageExtractor, ParsedToc, TocMapping};
pub use store::{ArtifactStore, DocumentStore, SqliteStore, TocStore};
pub use upload_tracker::{IngestStage, UploadTracker};
