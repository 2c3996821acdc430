use rusqlite::{Connection, Result};
use std::path::Path;

pub fn init_db<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 内存数据库，用于测试和预览
pub fn init_memory_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA encoding = 'UTF-8'", [])?;

    // 三种入学类型共用一张表，按 (admission_type, category) 分区
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY,
            admission_type TEXT NOT NULL,
            category TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            page INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_partition
         ON documents (admission_type, category, page)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS table_of_contents (
            id INTEGER PRIMARY KEY,
            toc_type TEXT NOT NULL,
            toc_category TEXT NOT NULL,
            toc_text TEXT NOT NULL,
            UNIQUE (toc_type, toc_category)
        )",
        [],
    )?;

    Ok(())
}
