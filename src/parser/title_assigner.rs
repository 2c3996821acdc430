use super::*;

/// 标题分配统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TitleAssignment {
    /// 分配到标题的页数
    pub titled: usize,
    /// 未分配标题的页数（目录为空或位于第一个章节之前）
    pub untitled: usize,
}

/// 根据目录映射为页面分配章节标题
///
/// - 目录为空时直接返回，所有页面保持无标题
/// - 页码小于第一个章节起始页的页面（封面、前言等）不分配标题
/// - 其余页面归属于起始页不大于自身页码的最大章节，最后一个章节延伸到文档末尾
///
/// # 参数
/// - `pages`: 按页序排列的页面，`title` 会被原地修改
/// - `mapping`: 调整后的目录映射
///
/// # 返回
/// 分配统计
pub fn assign_titles(pages: &mut [Page], mapping: &TocMapping) -> TitleAssignment {
    let Some(first) = mapping.first_boundary() else {
        tracing::debug!("目录映射为空，跳过标题分配");
        return TitleAssignment {
            titled: 0,
            untitled: pages.len(),
        };
    };

    let mut summary = TitleAssignment::default();

    for page in pages.iter_mut() {
        let current = i64::from(page.number);

        if current < first {
            tracing::debug!(page = current, "目录开始之前，不分配标题");
            summary.untitled += 1;
            continue;
        }

        match mapping.section_for(current) {
            Some((start, title)) => {
                tracing::debug!(page = current, section_start = start, title, "分配标题");
                page.title = Some(title.to_string());
                summary.titled += 1;
            }
            None => {
                tracing::debug!(page = current, "未分配标题");
                summary.untitled += 1;
            }
        }
    }

    summary
}
