use thiserror::Error;

use crate::upload_tracker::IngestStage;

/// 上传表单校验错误
///
/// Display 文本即返回给调用方的错误描述，保持与既有接口一致
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid request")]
    MissingFile,
    #[error("page_gap is required")]
    MissingPageGap,
    #[error("Invalid page_gap value")]
    InvalidPageGap,
    #[error("Invalid type or category provided")]
    UnknownPartition,
}

/// 存储层错误（文档库、目录库、派生目录、上传文件）
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("锁定存储失败: {0}")]
    Lock(String),
}

/// 页面提取错误
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF 解析失败: {0}")]
    Pdf(String),
    #[error("此 PDF 文件无法提取文本内容，可能是扫描版 PDF")]
    EmptyText,
}

/// 一次上传入库过程中的错误
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{stage} 阶段存储失败: {source}")]
    Store {
        stage: IngestStage,
        #[source]
        source: StoreError,
    },
    #[error("页面提取失败: {0}")]
    Extract(#[from] ExtractError),
    #[error("后台任务失败: {0}")]
    Task(String),
}

impl IngestError {
    pub(crate) fn store(stage: IngestStage) -> impl FnOnce(StoreError) -> IngestError {
        move |source| IngestError::Store { stage, source }
    }

    /// 是否为校验错误（对应 400 响应）
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::Validation(_))
    }
}
