//! 上传入库模块
//!
//! 处理一次 PDF 上传的完整流程：校验、清理旧记录和派生目录、保存文件、
//! 提取页面、按目录分配标题并标注、写入页面记录

use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::admission::{ParsePolicy, Partition};
use crate::config::IngestConfig;
use crate::error::{IngestError, StoreError, ValidationError};
use crate::media::{FsArtifactStore, MediaManager};
use crate::parser::{
    annotate, assign_titles, parse_toc, Page, PageExtractor, ParsedToc, PdfPageExtractor,
    SkippedLine,
};
use crate::records::NewDocument;
use crate::store::{ArtifactStore, DocumentStore, SqliteStore, TocStore};
use crate::upload_tracker::{IngestStage, UploadTask, UploadTracker};

pub const SUCCESS_MESSAGE: &str = "File uploaded and processed successfully";

/// 原始上传表单
///
/// 字段均为可选，由 `validate` 统一校验
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    /// 入学类型：수시 / 정시 / 편입학
    pub admission_type: Option<String>,
    /// 分类：모집요강 / 입시결과 / 기출문제 / 대학생활 / 면접/실기
    pub category: Option<String>,
    pub page_gap: Option<String>,
    pub pdf: Option<Vec<u8>>,
}

impl UploadForm {
    /// 校验表单
    ///
    /// 检查顺序：文件、page_gap 是否存在、page_gap 是否为整数、类型与分类
    pub fn validate(self) -> Result<UploadRequest, ValidationError> {
        let pdf = self.pdf.ok_or(ValidationError::MissingFile)?;
        let page_gap = self.page_gap.ok_or(ValidationError::MissingPageGap)?;
        let page_gap: i64 = page_gap
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidPageGap)?;

        let partition = Partition::from_labels(
            self.admission_type.as_deref().unwrap_or_default(),
            self.category.as_deref().unwrap_or_default(),
        )
        .ok_or(ValidationError::UnknownPartition)?;

        Ok(UploadRequest {
            partition,
            page_gap,
            pdf,
        })
    }
}

/// 校验通过的上传请求
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub partition: Partition,
    pub page_gap: i64,
    pub pdf: Vec<u8>,
}

/// 入库结果
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub partition: Partition,
    pub file_name: String,
    pub sha256: String,
    pub policy: ParsePolicy,
    /// 清理掉的旧记录数
    pub removed_records: usize,
    /// 是否删除了派生目录
    pub removed_artifacts: bool,
    /// 写入的页面数
    pub pages: usize,
    pub titled_pages: usize,
    pub toc_sections: usize,
    pub skipped_toc_lines: Vec<SkippedLine>,
}

/// 响应体：成功时为 `{"message": ...}`，失败时为 `{"error": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody {
    Message(String),
    Error(String),
}

/// 上传接口响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    /// HTTP 语义的状态码：200 / 400 / 500
    #[serde(skip)]
    pub status: u16,
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl UploadResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Message(message.into()),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: ResponseBody::Error(error.into()),
        }
    }

    pub fn internal_error(error: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: ResponseBody::Error(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// 读取并解析分区目录
///
/// 目录不存在不算错误，返回空映射，后续标题分配随之跳过
pub fn fetch_toc_mapping(
    tocs: &dyn TocStore,
    partition: Partition,
    page_gap: i64,
) -> Result<ParsedToc, StoreError> {
    Ok(parse_fetched_toc(tocs.get_by_partition(partition)?, partition, page_gap))
}

fn parse_fetched_toc(toc_text: Option<String>, partition: Partition, page_gap: i64) -> ParsedToc {
    match toc_text {
        Some(text) => {
            tracing::debug!(%partition, "从数据库取得目录信息");
            parse_toc(&text, page_gap)
        }
        None => {
            tracing::warn!(%partition, "数据库中没有目录信息");
            ParsedToc::default()
        }
    }
}

/// 入库协调器
///
/// 所有协作者都通过 trait 注入；同一分区的上传经由 `UploadTracker` 串行执行
#[derive(Clone)]
pub struct IngestCoordinator {
    documents: Arc<dyn DocumentStore>,
    tocs: Arc<dyn TocStore>,
    artifacts: Arc<dyn ArtifactStore>,
    extractor: Arc<dyn PageExtractor>,
    media: Arc<MediaManager>,
    tracker: UploadTracker,
}

impl IngestCoordinator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        tocs: Arc<dyn TocStore>,
        artifacts: Arc<dyn ArtifactStore>,
        extractor: Arc<dyn PageExtractor>,
        media: MediaManager,
    ) -> Self {
        Self {
            documents,
            tocs,
            artifacts,
            extractor,
            media: Arc::new(media),
            tracker: UploadTracker::new(),
        }
    }

    /// 按配置组装：SQLite 存储、文件系统派生目录、pdf-extract 提取器
    pub fn from_config(config: &IngestConfig) -> Result<(Self, Arc<SqliteStore>), StoreError> {
        let store = Arc::new(SqliteStore::open(&config.database_path)?);
        let coordinator = Self::new(
            store.clone(),
            store.clone(),
            Arc::new(FsArtifactStore::new(&config.vector_db_root)),
            Arc::new(PdfPageExtractor::new()),
            MediaManager::new(&config.media_root),
        );
        Ok((coordinator, store))
    }

    pub fn tracker(&self) -> &UploadTracker {
        &self.tracker
    }

    /// 上传接口
    ///
    /// 校验失败返回 400，存储或提取失败返回 500，成功返回 200
    pub async fn handle_upload(&self, form: UploadForm) -> UploadResponse {
        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "上传请求校验失败");
                return UploadResponse::bad_request(e.to_string());
            }
        };

        match self.upload(request).await {
            Ok(report) => {
                tracing::debug!(file_name = %report.file_name, "PDF 文件已处理并存入数据库");
                UploadResponse::ok(SUCCESS_MESSAGE)
            }
            Err(e) if e.is_validation() => UploadResponse::bad_request(e.to_string()),
            Err(e) => UploadResponse::internal_error(e.to_string()),
        }
    }

    /// 执行一次上传入库
    ///
    /// 持有分区锁直到写入结束；阻塞操作在 blocking 线程池中执行
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReport, IngestError> {
        let partition = request.partition;
        let _guard = self.tracker.acquire(partition).await.map_err(IngestError::Task)?;

        self.tracker
            .mark_active(UploadTask {
                partition,
                file_name: partition.upload_file_name(),
                stage: IngestStage::Validate,
                started_at: Utc::now(),
            })
            .map_err(IngestError::Task)?;

        let this = self.clone();
        let result = tokio::task::spawn_blocking(move || this.run_pipeline(request))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))
            .and_then(|r| r);

        if let Err(e) = self.tracker.mark_completed(partition) {
            tracing::warn!(%partition, error = %e, "标记上传完成失败");
        }

        match &result {
            Ok(report) => tracing::info!(
                %partition,
                pages = report.pages,
                titled = report.titled_pages,
                policy = ?report.policy,
                "上传入库完成"
            ),
            Err(e) => tracing::error!(%partition, error = %e, "上传入库失败"),
        }

        result
    }

    fn enter(&self, partition: Partition, stage: IngestStage) {
        tracing::debug!(%partition, %stage, "进入阶段");
        if let Err(e) = self.tracker.update_stage(partition, stage) {
            tracing::warn!(%partition, error = %e, "更新上传阶段失败");
        }
    }

    fn run_pipeline(&self, request: UploadRequest) -> Result<UploadReport, IngestError> {
        let partition = request.partition;
        let policy = partition.category.parse_policy();

        self.enter(partition, IngestStage::CleanupPriorRecords);
        let removed_records = self
            .documents
            .delete_by_partition(partition)
            .map_err(IngestError::store(IngestStage::CleanupPriorRecords))?;
        tracing::info!(%partition, removed_records, "已删除分区内旧记录");

        self.enter(partition, IngestStage::CleanupDerivedArtifacts);
        let removed_artifacts = self.cleanup_artifacts(partition)?;

        self.enter(partition, IngestStage::PersistUpload);
        let saved = self
            .media
            .save_upload(partition, &request.pdf)
            .map_err(IngestError::store(IngestStage::PersistUpload))?;

        self.enter(partition, IngestStage::Extract);
        let mut pages = self.extractor.extract(&saved.path)?;
        // 页码以提取顺序为准
        for (idx, page) in pages.iter_mut().enumerate() {
            page.number = idx as u32 + 1;
        }
        tracing::debug!(%partition, extractor = self.extractor.name(), pages = pages.len(), "页面提取完成");

        let mut titled_pages = 0;
        let mut toc_sections = 0;
        let mut skipped_toc_lines = Vec::new();

        if policy == ParsePolicy::TocTitled {
            self.enter(partition, IngestStage::FetchToc);
            let toc_text = self
                .tocs
                .get_by_partition(partition)
                .map_err(IngestError::store(IngestStage::FetchToc))?;

            self.enter(partition, IngestStage::ParseToc);
            let parsed = parse_fetched_toc(toc_text, partition, request.page_gap);

            self.enter(partition, IngestStage::AssignTitles);
            let summary = assign_titles(&mut pages, &parsed.mapping);

            self.enter(partition, IngestStage::Annotate);
            pages.iter_mut().for_each(annotate);

            titled_pages = summary.titled;
            toc_sections = parsed.mapping.len();
            skipped_toc_lines = parsed.skipped;
        }

        self.enter(partition, IngestStage::Persist);
        for page in &pages {
            self.documents
                .create(&NewDocument {
                    partition,
                    title: saved.file_name.clone(),
                    content: page.text.clone(),
                    page: page.number,
                })
                .map_err(IngestError::store(IngestStage::Persist))?;
        }

        Ok(UploadReport {
            partition,
            file_name: saved.file_name,
            sha256: saved.sha256,
            policy,
            removed_records,
            removed_artifacts,
            pages: pages.len(),
            titled_pages,
            toc_sections,
            skipped_toc_lines,
        })
    }

    fn cleanup_artifacts(&self, partition: Partition) -> Result<bool, IngestError> {
        let dir = self.artifacts.artifact_dir(partition);
        if !self.artifacts.exists(&dir) {
            tracing::debug!(path = %dir.display(), "向量库目录不存在，无需删除");
            return Ok(false);
        }

        self.artifacts
            .remove_recursive(&dir)
            .map_err(IngestError::store(IngestStage::CleanupDerivedArtifacts))?;
        tracing::info!(path = %dir.display(), "已删除向量库目录");
        Ok(true)
    }

    /// 预览：提取页面并按分区策略分配标题，不写入任何存储
    pub fn preview(
        &self,
        partition: Partition,
        page_gap: i64,
        file_path: &Path,
    ) -> Result<(Vec<Page>, ParsedToc), IngestError> {
        let mut pages = self.extractor.extract(file_path)?;
        for (idx, page) in pages.iter_mut().enumerate() {
            page.number = idx as u32 + 1;
        }

        if partition.category.parse_policy() == ParsePolicy::Basic {
            return Ok((pages, ParsedToc::default()));
        }

        let parsed = fetch_toc_mapping(self.tocs.as_ref(), partition, page_gap)
            .map_err(IngestError::store(IngestStage::FetchToc))?;
        assign_titles(&mut pages, &parsed.mapping);
        Ok((pages, parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(t: Option<&str>, c: Option<&str>, gap: Option<&str>, pdf: bool) -> UploadForm {
        UploadForm {
            admission_type: t.map(str::to_string),
            category: c.map(str::to_string),
            page_gap: gap.map(str::to_string),
            pdf: pdf.then(|| b"%PDF-1.7".to_vec()),
        }
    }

    #[test]
    fn test_validate_success() {
        let request = form(Some("정시"), Some("모집요강"), Some(" -2 "), true).validate().unwrap();
        assert_eq!(request.page_gap, -2);
        assert_eq!(request.partition.to_string(), "정시 - 모집요강");
    }

    #[test]
    fn test_validate_missing_file() {
        let err = form(Some("정시"), Some("모집요강"), Some("2"), false).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingFile);
    }

    #[test]
    fn test_validate_page_gap() {
        let err = form(Some("정시"), Some("모집요강"), None, true).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingPageGap);

        let err = form(Some("정시"), Some("모집요강"), Some("두"), true).validate().unwrap_err();
        assert_eq!(err, ValidationError::InvalidPageGap);

        let err = form(Some("정시"), Some("모집요강"), Some("2.5"), true).validate().unwrap_err();
        assert_eq!(err, ValidationError::InvalidPageGap);
    }

    #[test]
    fn test_validate_labels_must_match_exactly() {
        let err = form(Some(" 정시"), Some("모집요강"), Some("0"), true).validate().unwrap_err();
        assert_eq!(err, ValidationError::UnknownPartition);

        let err = form(Some("정시"), Some("모집요강 "), Some("0"), true).validate().unwrap_err();
        assert_eq!(err, ValidationError::UnknownPartition);
    }

    #[test]
    fn test_validate_unknown_partition() {
        let err = form(Some("특별"), Some("모집요강"), Some("0"), true).validate().unwrap_err();
        assert_eq!(err, ValidationError::UnknownPartition);

        let err = form(Some("수시"), None, Some("0"), true).validate().unwrap_err();
        assert_eq!(err, ValidationError::UnknownPartition);
    }

    #[test]
    fn test_response_body_shape() {
        let ok = serde_json::to_value(UploadResponse::ok(SUCCESS_MESSAGE)).unwrap();
        assert_eq!(ok, serde_json::json!({ "message": SUCCESS_MESSAGE }));

        let bad = UploadResponse::bad_request("page_gap is required");
        assert_eq!(bad.status, 400);
        assert!(!bad.is_success());
        assert_eq!(
            serde_json::to_value(bad).unwrap(),
            serde_json::json!({ "error": "page_gap is required" })
        );
    }

    #[test]
    fn test_fetch_toc_mapping_missing_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let p = Partition::from_labels("수시", "기출문제").unwrap();

        let parsed = fetch_toc_mapping(&store, p, 3).unwrap();
        assert!(parsed.mapping.is_empty());

        store.upsert_toc(p, "국어 1\n수학 8").unwrap();
        let parsed = fetch_toc_mapping(&store, p, 3).unwrap();
        assert_eq!(parsed.mapping.get(4), Some("국어"));
        assert_eq!(parsed.mapping.get(11), Some("수학"));
    }
}
