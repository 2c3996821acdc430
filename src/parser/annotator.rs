use super::Page;

/// 为已分配标题的页面在正文前加上标题标记
///
/// 依次加入两段标记：单行的标题，以及强调"整页内容都属于该章节"的句子。
/// 无标题的页面保持不变。重复调用会重复加入标记，每页每次入库只能调用一次。
pub fn annotate(page: &mut Page) {
    let Some(title) = page.title.as_deref().filter(|t| !t.is_empty()) else {
        return;
    };

    let mut text = String::with_capacity(page.text.len() + title.len() * 3 + 96);
    text.push_str(&format!("**{title}**\n"));
    text.push_str(&format!(
        "**{title} 문서입니다. - 중요! 이 문서 전체는 {title}에 해당하는 정보입니다.**\n\n"
    ));
    text.push_str(&page.text);
    page.text = text;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_titled_page() {
        let mut page = Page::new(4, "지원 자격은 다음과 같다.");
        page.title = Some("지원자격".to_string());

        annotate(&mut page);

        assert_eq!(
            page.text,
            "**지원자격**\n**지원자격 문서입니다. - 중요! 이 문서 전체는 지원자격에 해당하는 정보입니다.**\n\n지원 자격은 다음과 같다."
        );
    }

    #[test]
    fn test_untitled_page_unchanged() {
        let mut page = Page::new(1, "표지");
        annotate(&mut page);
        assert_eq!(page.text, "표지");
    }

    #[test]
    fn test_empty_title_unchanged() {
        let mut page = Page::new(1, "본문");
        page.title = Some(String::new());
        annotate(&mut page);
        assert_eq!(page.text, "본문");
    }

    #[test]
    fn test_second_application_duplicates_marker() {
        let mut page = Page::new(2, "본문");
        page.title = Some("개요".to_string());

        annotate(&mut page);
        annotate(&mut page);

        assert_eq!(page.text.matches("**개요**\n").count(), 2);
    }
}
