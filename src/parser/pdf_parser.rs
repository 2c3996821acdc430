use super::*;
use std::fs;

/// PDF 页面提取器
///
/// 基于 pdf-extract 逐页提取，只支持文字版 PDF，不支持扫描版
#[derive(Clone, Default)]
pub struct PdfPageExtractor;

impl PdfPageExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 将逐页提取出的文本组装为页面
    ///
    /// 空白页保留在原位置，以免后续页码错位
    ///
    /// # 参数
    /// - `texts`: 按页序排列的页面文本
    /// - `source`: 来源文件名，写入每页元数据
    ///
    /// # 返回
    /// 页面列表
    fn build_pages(&self, texts: Vec<String>, source: &str) -> Vec<Page> {
        let page_count = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(idx, body)| {
                let mut page = Page::new(idx as u32 + 1, body.trim());
                page.metadata.insert("source".to_string(), Value::from(source));
                page.metadata.insert("page".to_string(), Value::from(idx + 1));
                page.metadata.insert("page_count".to_string(), Value::from(page_count));
                page
            })
            .collect()
    }
}

impl PageExtractor for PdfPageExtractor {
    fn extract(&self, file_path: &Path) -> Result<Vec<Page>, ExtractError> {
        let bytes = fs::read(file_path)?;

        let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        if texts.iter().all(|t| t.trim().is_empty()) {
            return Err(ExtractError::EmptyText);
        }

        let source = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // pdf-extract 遇到无法解析的页面即停止，其后的页面不会返回
        match pdf_extract::Document::load_mem(&bytes) {
            Ok(doc) if doc.get_pages().len() != texts.len() => tracing::warn!(
                source,
                extracted = texts.len(),
                declared = doc.get_pages().len(),
                "提取到的页数与文档页数不一致"
            ),
            Ok(_) => {}
            Err(e) => tracing::debug!(source, error = %e, "无法读取文档页数"),
        }

        Ok(self.build_pages(texts, &source))
    }

    fn name(&self) -> &'static str {
        "pdf-extract"
    }
}

/// 生成每页一段 ASCII 文本的 PDF，空字符串对应空白页
#[cfg(test)]
pub(crate) fn text_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|text| {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
            ];
            if !text.is_empty() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }))
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pdf(dir: &tempfile::TempDir, name: &str, pages: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text_pdf(pages)).unwrap();
        path
    }

    #[test]
    fn test_extract_one_page_per_pdf_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, "guide.pdf", &["Page number 1", "Page number 2", "Page number 3"]);

        let pages = PdfPageExtractor::new().extract(&path).unwrap();

        assert_eq!(pages.len(), 3);
        for (idx, page) in pages.iter().enumerate() {
            assert_eq!(page.number, idx as u32 + 1);
            assert!(page.text.contains(&format!("Page number {}", idx + 1)));
        }
        assert!(!pages[0].text.contains("Page number 2"));
        assert_eq!(pages[1].metadata["page_count"], 3);
        assert_eq!(pages[1].metadata["source"], "guide.pdf");
    }

    #[test]
    fn test_blank_page_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, "gap.pdf", &["First", "", "Third"]);

        let pages = PdfPageExtractor::new().extract(&path).unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].text, "");
        assert_eq!(pages[2].number, 3);
        assert!(pages[2].text.contains("Third"));
    }

    #[test]
    fn test_textless_pdf_is_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, "scan.pdf", &["", ""]);

        let result = PdfPageExtractor::new().extract(&path);
        assert!(matches!(result, Err(ExtractError::EmptyText)));
    }

    #[test]
    fn test_garbage_is_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();

        let result = PdfPageExtractor::new().extract(&path);
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }

    #[test]
    fn test_build_pages_trims_and_numbers() {
        let pages = PdfPageExtractor::new()
            .build_pages(vec!["\n표지\n".to_string(), "  ".to_string()], "a.pdf");

        assert_eq!(pages[0].text, "표지");
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].text, "");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let extractor = PdfPageExtractor::new();
        let result = extractor.extract(Path::new("/nonexistent/없는파일.pdf"));
        assert!(matches!(result, Err(ExtractError::Io(_))));
    }

    #[test]
    fn test_extractor_name() {
        assert_eq!(PdfPageExtractor::new().name(), "pdf-extract");
    }
}
