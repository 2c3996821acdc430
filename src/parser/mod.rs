use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::ExtractError;

// 子模块声明
pub mod annotator;
pub mod pdf_parser;
pub mod title_assigner;
pub mod toc_parser;

pub use annotator::annotate;
pub use pdf_parser::PdfPageExtractor;
pub use title_assigner::{assign_titles, TitleAssignment};
pub use toc_parser::{parse_toc, ParsedToc, SkippedLine, TocEntry, TocMapping};

/// 页面数据
///
/// 提取器输出的单页内容，`number` 为在文档中的位置（从 1 开始）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 页码（1 起）
    pub number: u32,
    /// 页面文本
    pub text: String,
    /// 目录分配的章节标题，未分配时为 None
    pub title: Option<String>,
    /// 提取器附带的元数据
    pub metadata: Map<String, Value>,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            title: None,
            metadata: Map::new(),
        }
    }
}

/// 页面提取器 trait
///
/// 给定文件路径，按顺序返回每一页的文本和元数据
pub trait PageExtractor: Send + Sync {
    /// 提取页面
    ///
    /// # 参数
    /// - `file_path`: 已保存的上传文件路径
    ///
    /// # 返回
    /// 按页序排列的页面列表
    fn extract(&self, file_path: &Path) -> Result<Vec<Page>, ExtractError>;

    /// 提取器名称，用于日志
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_creation() {
        let page = Page::new(3, "전형일정 안내");
        assert_eq!(page.number, 3);
        assert_eq!(page.text, "전형일정 안내");
        assert!(page.title.is_none());
        assert!(page.metadata.is_empty());
    }
}
