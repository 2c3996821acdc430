use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::admission::Partition;

/// 入库阶段枚举
///
/// 单次上传按顺序经过这些阶段，不会回退
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    /// 校验表单
    Validate,
    /// 删除分区内旧记录
    CleanupPriorRecords,
    /// 删除派生的向量库目录
    CleanupDerivedArtifacts,
    /// 保存上传文件
    PersistUpload,
    /// 提取页面
    Extract,
    /// 读取目录
    FetchToc,
    /// 解析目录
    ParseToc,
    /// 分配标题
    AssignTitles,
    /// 标注正文
    Annotate,
    /// 写入页面记录
    Persist,
}

impl IngestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::CleanupPriorRecords => "cleanup_prior_records",
            Self::CleanupDerivedArtifacts => "cleanup_derived_artifacts",
            Self::PersistUpload => "persist_upload",
            Self::Extract => "extract",
            Self::FetchToc => "fetch_toc",
            Self::ParseToc => "parse_toc",
            Self::AssignTitles => "assign_titles",
            Self::Annotate => "annotate",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 上传任务
///
/// 表示一个正在处理的分区上传
#[derive(Clone, Debug)]
pub struct UploadTask {
    pub partition: Partition,
    /// 上传文件名
    pub file_name: String,
    /// 当前阶段
    pub stage: IngestStage,
    pub started_at: DateTime<Utc>,
}

/// 上传跟踪器
///
/// 每个分区一把异步锁，保证同一分区任何时刻只有一次上传在执行清理和写入；
/// 不同分区互不影响。同时记录正在执行的上传所处的阶段。
#[derive(Clone, Default)]
pub struct UploadTracker {
    /// 分区 -> 串行化锁
    locks: Arc<Mutex<HashMap<Partition, Arc<AsyncMutex<()>>>>>,
    /// 正在处理的任务（partition -> task）
    active_tasks: Arc<Mutex<HashMap<Partition, UploadTask>>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取分区锁
    ///
    /// 同一分区的其他上传会在此等待，直到返回的守卫被释放
    pub async fn acquire(&self, partition: Partition) -> Result<OwnedMutexGuard<()>, String> {
        let lock = {
            let mut locks = self.locks.lock()
                .map_err(|e| format!("锁定分区锁表失败: {}", e))?;
            locks.entry(partition).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// 标记任务为活动状态
    pub fn mark_active(&self, task: UploadTask) -> Result<(), String> {
        let mut active = self.active_tasks.lock()
            .map_err(|e| format!("锁定活动任务失败: {}", e))?;
        active.insert(task.partition, task);
        Ok(())
    }

    /// 更新任务所处阶段
    pub fn update_stage(&self, partition: Partition, stage: IngestStage) -> Result<(), String> {
        let mut active = self.active_tasks.lock()
            .map_err(|e| format!("锁定活动任务失败: {}", e))?;

        if let Some(task) = active.get_mut(&partition) {
            task.stage = stage;
        }

        Ok(())
    }

    /// 标记任务为完成（无论成功或失败）
    pub fn mark_completed(&self, partition: Partition) -> Result<(), String> {
        let mut active = self.active_tasks.lock()
            .map_err(|e| format!("锁定活动任务失败: {}", e))?;
        active.remove(&partition);
        Ok(())
    }

    /// 获取分区上传的当前状态
    pub fn get_status(&self, partition: Partition) -> Option<UploadTask> {
        let active = self.active_tasks.lock().ok()?;
        active.get(&partition).cloned()
    }

    /// 获取活动任务数量
    pub fn active_count(&self) -> usize {
        self.active_tasks.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AdmissionType, Category};
    use std::time::Duration;

    fn create_test_task(partition: Partition) -> UploadTask {
        UploadTask {
            partition,
            file_name: partition.upload_file_name(),
            stage: IngestStage::Validate,
            started_at: Utc::now(),
        }
    }

    fn guideline(t: AdmissionType) -> Partition {
        Partition::new(t, Category::AdmissionGuideline)
    }

    #[test]
    fn test_tracker_creation() {
        let tracker = UploadTracker::new();
        assert_eq!(tracker.active_count(), 0);
        assert!(tracker.get_status(guideline(AdmissionType::Early)).is_none());
    }

    #[test]
    fn test_mark_active_and_completed() {
        let tracker = UploadTracker::new();
        let p = guideline(AdmissionType::Regular);

        tracker.mark_active(create_test_task(p)).unwrap();
        assert_eq!(tracker.active_count(), 1);

        tracker.update_stage(p, IngestStage::Extract).unwrap();
        assert_eq!(tracker.get_status(p).unwrap().stage, IngestStage::Extract);

        tracker.mark_completed(p).unwrap();
        assert_eq!(tracker.active_count(), 0);
        assert!(tracker.get_status(p).is_none());
    }

    #[test]
    fn test_update_unknown_partition_is_noop() {
        let tracker = UploadTracker::new();
        tracker.update_stage(guideline(AdmissionType::Transfer), IngestStage::Persist).unwrap();
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(IngestStage::CleanupPriorRecords.to_string(), "cleanup_prior_records");
        assert_eq!(IngestStage::Persist.to_string(), "persist");
    }

    #[tokio::test]
    async fn test_same_partition_is_serialized() {
        let tracker = UploadTracker::new();
        let p = guideline(AdmissionType::Regular);

        let guard = tracker.acquire(p).await.unwrap();

        let waiting = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.acquire(p).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_partitions_are_independent() {
        let tracker = UploadTracker::new();

        let _early = tracker.acquire(guideline(AdmissionType::Early)).await.unwrap();
        let regular = tokio::time::timeout(
            Duration::from_secs(1),
            tracker.acquire(guideline(AdmissionType::Regular)),
        )
        .await;

        assert!(regular.is_ok());
    }
}
