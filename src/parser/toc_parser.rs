use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// 目录行格式："목차이름 페이지번호"，页码必须位于行尾
fn toc_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+?)\s+(\d+)$").expect("目录行正则无效"))
}

/// 目录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub title: String,
    /// 目录中声明的页码（≥ 1）
    pub declared_page: u32,
}

impl TocEntry {
    /// 解析单行目录文本
    ///
    /// 行须已去除首尾空白；不匹配格式或页码为 0 时返回 None
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = toc_line_pattern().captures(line)?;
        let title = caps.get(1)?.as_str().trim();
        let declared_page: u32 = caps.get(2)?.as_str().parse().ok()?;
        if title.is_empty() || declared_page == 0 {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            declared_page,
        })
    }
}

/// 目录映射：调整后页码 → 章节标题
///
/// 键有序且唯一；两行调整到同一页码时后出现的行覆盖先出现的行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TocMapping {
    sections: BTreeMap<i64, String>,
}

impl TocMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一个章节起始页，返回被覆盖的旧标题
    pub fn insert(&mut self, adjusted_page: i64, title: impl Into<String>) -> Option<String> {
        self.sections.insert(adjusted_page, title.into())
    }

    pub fn get(&self, adjusted_page: i64) -> Option<&str> {
        self.sections.get(&adjusted_page).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// 升序排列的章节起始页
    pub fn boundaries(&self) -> impl Iterator<Item = i64> + '_ {
        self.sections.keys().copied()
    }

    pub fn first_boundary(&self) -> Option<i64> {
        self.sections.keys().next().copied()
    }

    /// 查找页码所属章节：起始页不大于该页码的最大边界
    ///
    /// 区间为左闭右开 `[b_i, b_{i+1})`，最后一个章节一直延伸到文档末尾
    pub fn section_for(&self, page: i64) -> Option<(i64, &str)> {
        self.sections
            .range(..=page)
            .next_back()
            .map(|(start, title)| (*start, title.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.sections.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// 解析失败被跳过的目录行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 原文中的行号（1 起）
    pub line_number: usize,
    pub text: String,
}

/// 目录解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedToc {
    pub mapping: TocMapping,
    pub skipped: Vec<SkippedLine>,
}

/// 解析目录文本
///
/// 逐行去除空白并跳过空行；每行末尾的整数为声明页码，之前的部分为标题。
/// 不符合格式的行只记录警告并跳过，不会中断解析。
///
/// # 参数
/// - `toc_text`: 多行目录文本
/// - `page_gap`: 加到声明页码上的偏移量，可以为负
///
/// # 返回
/// 调整后的目录映射及被跳过的行
pub fn parse_toc(toc_text: &str, page_gap: i64) -> ParsedToc {
    let mut parsed = ParsedToc::default();

    tracing::debug!(page_gap, "开始解析目录文本");

    for (idx, raw) in toc_text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        // 偏移后溢出 i64 的行与格式错误的行同样处理
        let parsed_line = TocEntry::parse_line(line).and_then(|entry| {
            let adjusted = i64::from(entry.declared_page).checked_add(page_gap)?;
            Some((adjusted, entry))
        });

        match parsed_line {
            Some((adjusted, entry)) => {
                tracing::debug!(
                    title = %entry.title,
                    adjusted,
                    declared = entry.declared_page,
                    page_gap,
                    "目录映射"
                );
                if let Some(previous) = parsed.mapping.insert(adjusted, entry.title) {
                    tracing::debug!(adjusted, %previous, "同一页码出现多个目录行，保留后者");
                }
            }
            None => {
                tracing::warn!(line_number = idx + 1, line, "目录行解析失败，已跳过");
                parsed.skipped.push(SkippedLine {
                    line_number: idx + 1,
                    text: line.to_string(),
                });
            }
        }
    }

    tracing::debug!(sections = parsed.mapping.len(), skipped = parsed.skipped.len(), "目录解析完成");
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_page_gap() {
        let parsed = parse_toc("개요 1\n지원자격 5\n전형일정 10", 2);

        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.mapping.len(), 3);
        assert_eq!(parsed.mapping.get(3), Some("개요"));
        assert_eq!(parsed.mapping.get(7), Some("지원자격"));
        assert_eq!(parsed.mapping.get(12), Some("전형일정"));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let parsed = parse_toc("개요 1\n섹션없음숫자\n전형일정 10", 0);

        assert_eq!(parsed.mapping.len(), 2);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line_number, 2);
        assert_eq!(parsed.skipped[0].text, "섹션없음숫자");
    }

    #[test]
    fn test_blank_lines_and_whitespace() {
        let parsed = parse_toc("\n   \n  모집인원   4  \n\n\t수능 반영 방법\t9\n", 0);

        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.mapping.get(4), Some("모집인원"));
        assert_eq!(parsed.mapping.get(9), Some("수능 반영 방법"));
    }

    #[test]
    fn test_title_with_inner_numbers() {
        let parsed = parse_toc("2025학년도 전형 변경사항 3", 0);
        assert_eq!(parsed.mapping.get(3), Some("2025학년도 전형 변경사항"));
    }

    #[test]
    fn test_negative_gap() {
        let parsed = parse_toc("개요 3\n지원자격 8", -2);
        assert_eq!(parsed.mapping.get(1), Some("개요"));
        assert_eq!(parsed.mapping.get(6), Some("지원자격"));
    }

    #[test]
    fn test_collision_last_line_wins() {
        let parsed = parse_toc("개요 1\n지원자격 3\n전형요소 3", 0);
        assert_eq!(parsed.mapping.len(), 2);
        assert_eq!(parsed.mapping.get(3), Some("전형요소"));
    }

    #[test]
    fn test_zero_and_oversized_page_are_skipped() {
        let parsed = parse_toc("표지 0\n개요 99999999999999999999\n지원자격 2", 0);
        assert_eq!(parsed.mapping.len(), 1);
        assert_eq!(parsed.skipped.len(), 2);
    }

    #[test]
    fn test_gap_overflow_is_skipped() {
        let parsed = parse_toc("개요 1\n지원자격 5", i64::MAX);
        assert!(parsed.mapping.is_empty());
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].text, "개요 1");

        let parsed = parse_toc("개요 1", i64::MIN);
        assert_eq!(parsed.mapping.get(i64::MIN + 1), Some("개요"));

        let parsed = parse_toc("개요 1\n지원자격 5", i64::MAX - 3);
        assert_eq!(parsed.mapping.get(i64::MAX - 2), Some("개요"));
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line_number, 2);
    }

    #[test]
    fn test_number_only_line_is_skipped() {
        let parsed = parse_toc("12", 0);
        assert!(parsed.mapping.is_empty());
        assert_eq!(parsed.skipped.len(), 1);
    }

    #[test]
    fn test_declared_pages_recoverable() {
        let text = "개요 1\n지원자격 5\n잘못된줄\n전형일정 10\n모집단위 14";
        let gap = 7;
        let parsed = parse_toc(text, gap);

        let recovered: Vec<i64> = parsed.mapping.boundaries().map(|k| k - gap).collect();
        let declared: Vec<i64> = text
            .lines()
            .filter_map(TocEntry::parse_line)
            .map(|e| i64::from(e.declared_page))
            .collect();
        assert_eq!(recovered, declared);
    }

    #[test]
    fn test_empty_text() {
        let parsed = parse_toc("", 3);
        assert!(parsed.mapping.is_empty());
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_section_for_half_open() {
        let mut mapping = TocMapping::new();
        mapping.insert(3, "개요");
        mapping.insert(7, "지원자격");

        assert_eq!(mapping.section_for(2), None);
        assert_eq!(mapping.section_for(3), Some((3, "개요")));
        assert_eq!(mapping.section_for(6), Some((3, "개요")));
        assert_eq!(mapping.section_for(7), Some((7, "지원자격")));
        assert_eq!(mapping.section_for(1000), Some((7, "지원자격")));
    }

    #[test]
    fn test_iter_in_page_order() {
        let parsed = parse_toc("전형일정 10\n개요 1\n지원자격 5", 2);
        let sections: Vec<(i64, &str)> = parsed.mapping.iter().collect();
        assert_eq!(sections, vec![(3, "개요"), (7, "지원자격"), (12, "전형일정")]);
    }
}
