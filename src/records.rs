use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row};
use serde::{Deserialize, Serialize};

use crate::admission::{AdmissionType, Category, Partition};

/// 目录预览长度（字符数）
const TOC_PREVIEW_CHARS: usize = 50;

/// 已入库的页面记录
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: i64,
    pub partition: Partition,
    /// 来源文件名
    pub title: String,
    /// 标注后的页面文本
    pub content: String,
    /// 页码（1 起）
    pub page: u32,
    pub created_at: DateTime<Utc>,
}

/// 待写入的页面记录
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub partition: Partition,
    pub title: String,
    pub content: String,
    pub page: u32,
}

/// 目录记录，每个分区至多一条
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableOfContentsRecord {
    pub partition: Partition,
    pub toc_text: String,
}

impl TableOfContentsRecord {
    /// 目录文本预览，超过 50 个字符时截断并加上 `...`
    pub fn preview(&self) -> String {
        toc_preview(&self.toc_text)
    }
}

pub fn toc_preview(text: &str) -> String {
    if text.chars().count() > TOC_PREVIEW_CHARS {
        let head: String = text.chars().take(TOC_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn partition_from_row(row: &Row<'_>, type_idx: usize, category_idx: usize) -> Result<Partition> {
    let type_label: String = row.get(type_idx)?;
    let category_label: String = row.get(category_idx)?;

    let admission_type = AdmissionType::from_label(&type_label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            type_idx,
            rusqlite::types::Type::Text,
            format!("未知入学类型: {}", type_label).into(),
        )
    })?;
    let category = Category::from_label(&category_label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            category_idx,
            rusqlite::types::Type::Text,
            format!("未知分类: {}", category_label).into(),
        )
    })?;

    Ok(Partition::new(admission_type, category))
}

// ==================== Document CRUD 操作 ====================

/// 创建页面记录
pub fn create_document(conn: &Connection, doc: &NewDocument) -> Result<i64> {
    conn.execute(
        "INSERT INTO documents (admission_type, category, title, content, page, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            doc.partition.admission_type.label(),
            doc.partition.category.label(),
            doc.title,
            doc.content,
            doc.page,
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 删除分区内的全部页面记录，返回删除条数
pub fn delete_documents_by_partition(conn: &Connection, partition: Partition) -> Result<usize> {
    conn.execute(
        "DELETE FROM documents WHERE admission_type = ?1 AND category = ?2",
        rusqlite::params![partition.admission_type.label(), partition.category.label()],
    )
}

/// 删除所有页面记录
pub fn delete_all_documents(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM documents", [])
}

/// 获取分区内的页面记录，按页码排序
pub fn get_documents_by_partition(conn: &Connection, partition: Partition) -> Result<Vec<DocumentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, admission_type, category, title, content, page, created_at
         FROM documents WHERE admission_type = ?1 AND category = ?2
         ORDER BY page, id",
    )?;

    let documents = stmt
        .query_map(
            rusqlite::params![partition.admission_type.label(), partition.category.label()],
            |row| {
                Ok(DocumentRecord {
                    id: row.get(0)?,
                    partition: partition_from_row(row, 1, 2)?,
                    title: row.get(3)?,
                    content: row.get(4)?,
                    page: row.get(5)?,
                    created_at: row.get(6)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(documents)
}

/// 统计分区内的页面记录数
pub fn count_documents_by_partition(conn: &Connection, partition: Partition) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE admission_type = ?1 AND category = ?2",
        rusqlite::params![partition.admission_type.label(), partition.category.label()],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

// ==================== TableOfContents CRUD 操作 ====================

/// 写入或替换分区的目录文本
pub fn upsert_toc(conn: &Connection, partition: Partition, toc_text: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO table_of_contents (toc_type, toc_category, toc_text)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (toc_type, toc_category) DO UPDATE SET toc_text = excluded.toc_text",
        rusqlite::params![partition.admission_type.label(), partition.category.label(), toc_text],
    )?;
    Ok(())
}

/// 获取分区的目录文本，不存在时返回 None
pub fn get_toc_by_partition(conn: &Connection, partition: Partition) -> Result<Option<String>> {
    conn.query_row(
        "SELECT toc_text FROM table_of_contents WHERE toc_type = ?1 AND toc_category = ?2",
        rusqlite::params![partition.admission_type.label(), partition.category.label()],
        |row| row.get(0),
    )
    .optional()
}

/// 获取全部目录记录
pub fn get_all_tocs(conn: &Connection) -> Result<Vec<TableOfContentsRecord>> {
    let mut stmt = conn.prepare(
        "SELECT toc_type, toc_category, toc_text FROM table_of_contents
         ORDER BY toc_type, toc_category",
    )?;

    let tocs = stmt
        .query_map([], |row| {
            Ok(TableOfContentsRecord {
                partition: partition_from_row(row, 0, 1)?,
                toc_text: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tocs)
}

/// 删除分区的目录记录
pub fn delete_toc(conn: &Connection, partition: Partition) -> Result<usize> {
    conn.execute(
        "DELETE FROM table_of_contents WHERE toc_type = ?1 AND toc_category = ?2",
        rusqlite::params![partition.admission_type.label(), partition.category.label()],
    )
}
