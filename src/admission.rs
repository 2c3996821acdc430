use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// 入学类型
///
/// 对应上传表单中的 `type` 字段，封闭枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdmissionType {
    /// 수시
    Early,
    /// 정시
    Regular,
    /// 편입학
    Transfer,
}

impl AdmissionType {
    pub const ALL: [AdmissionType; 3] = [Self::Early, Self::Regular, Self::Transfer];

    /// 根据表单标签查找类型，标签须完全一致，未知标签返回 None
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "수시" => Some(Self::Early),
            "정시" => Some(Self::Regular),
            "편입학" => Some(Self::Transfer),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Early => "수시",
            Self::Regular => "정시",
            Self::Transfer => "편입학",
        }
    }

    /// 下游向量库目录使用的存储名
    pub fn store_name(self) -> &'static str {
        match self {
            Self::Early => "Document1",
            Self::Regular => "Document2",
            Self::Transfer => "Document3",
        }
    }
}

impl fmt::Display for AdmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 文档分类
///
/// 韩文标签到英文标记的映射是固定的封闭表，表外的分类在校验阶段被拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// 모집요강
    AdmissionGuideline,
    /// 입시결과
    AdmissionResults,
    /// 기출문제
    PastExams,
    /// 대학생활
    CampusLife,
    /// 면접/실기
    InterviewPractice,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::AdmissionGuideline,
        Self::AdmissionResults,
        Self::PastExams,
        Self::CampusLife,
        Self::InterviewPractice,
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "모집요강" => Some(Self::AdmissionGuideline),
            "입시결과" => Some(Self::AdmissionResults),
            "기출문제" => Some(Self::PastExams),
            "대학생활" => Some(Self::CampusLife),
            "면접/실기" => Some(Self::InterviewPractice),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AdmissionGuideline => "모집요강",
            Self::AdmissionResults => "입시결과",
            Self::PastExams => "기출문제",
            Self::CampusLife => "대학생활",
            Self::InterviewPractice => "면접/실기",
        }
    }

    pub fn english_token(self) -> &'static str {
        match self {
            Self::AdmissionGuideline => "admission_guideline",
            Self::AdmissionResults => "admission_results",
            Self::PastExams => "past_exams",
            Self::CampusLife => "campus_life",
            Self::InterviewPractice => "interview_practice",
        }
    }

    /// 该分类采用的解析策略
    ///
    /// 입시결과 只做基础解析，其余分类都走目录标题分配
    pub fn parse_policy(self) -> ParsePolicy {
        match self {
            Self::AdmissionResults => ParsePolicy::Basic,
            _ => ParsePolicy::TocTitled,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 解析策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// 基础解析：逐页原样入库
    Basic,
    /// 读取目录、分配标题并标注正文
    TocTitled,
}

/// 分区键：(入学类型, 分类)
///
/// 文档记录、目录、上传锁和向量库目录都按分区组织
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Partition {
    pub admission_type: AdmissionType,
    pub category: Category,
}

impl Partition {
    pub fn new(admission_type: AdmissionType, category: Category) -> Self {
        Self {
            admission_type,
            category,
        }
    }

    /// 由两个表单标签构造分区，任一标签未知则返回 None
    pub fn from_labels(admission_type: &str, category: &str) -> Option<Self> {
        Some(Self::new(
            AdmissionType::from_label(admission_type)?,
            Category::from_label(category)?,
        ))
    }

    /// 上传文件保存时使用的文件名，例如 `정시_모집요강.pdf`
    ///
    /// 分类标签中的 `/` 会被替换为 `_`，避免产生子目录
    pub fn upload_file_name(&self) -> String {
        format!(
            "{}_{}.pdf",
            self.admission_type.label(),
            self.category.label().replace('/', "_")
        )
    }

    /// 该分区派生向量库目录：`<root>/<store name>/<english>_vectorDB`
    pub fn vector_store_dir(&self, root: &Path) -> PathBuf {
        root.join(self.admission_type.store_name())
            .join(format!("{}_vectorDB", self.category.english_token()))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.admission_type, self.category)
    }
}
