//! 书目核心状态模块
//! 目录与操作历史集中在 Library 中，命令层持有它并在每次变更后持久化。
//! 本模块不接触文件系统和窗口，便于独立测试。

use crate::history::ActionLog;
use crate::models::{BookRecord, SortKey};
use std::cmp::Ordering;

/// 添加记录时的校验失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    MissingDocument,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyTitle => write!(f, "Title must not be empty"),
            ValidationError::MissingDocument => write!(f, "A document file is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// 有序书目目录与其操作历史
#[derive(Debug, Default)]
pub struct Library {
    records: Vec<BookRecord>,
    history: ActionLog,
}

impl Library {
    pub fn new(records: Vec<BookRecord>) -> Self {
        Self {
            records,
            history: ActionLog::new(),
        }
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn history(&self) -> &[String] {
        self.history.all()
    }

    /// 校验并追加一条记录（封面已在命令层处理完毕）
    pub fn add(&mut self, record: BookRecord) -> Result<(), ValidationError> {
        if record.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if record.file_path.trim().is_empty() {
            return Err(ValidationError::MissingDocument);
        }

        self.history
            .record(format!("Added book: {}", record.title));
        self.records.push(record);
        Ok(())
    }

    /// 删除指定下标的记录并返回它
    /// 下标越界（例如前端持有过期下标）时为受防护的空操作
    pub fn remove(&mut self, index: usize) -> Option<BookRecord> {
        if index >= self.records.len() {
            eprintln!(
                "[library] remove: 下标越界 {} (共 {} 条)，忽略",
                index,
                self.records.len()
            );
            return None;
        }

        let removed = self.records.remove(index);
        self.history
            .record(format!("Deleted book: {}", removed.title));
        Some(removed)
    }

    /// 翻转指定下标记录的阅读状态，返回是否发生了变更
    /// 下标越界时为受防护的空操作
    pub fn toggle_read(&mut self, index: usize) -> bool {
        let Some(record) = self.records.get_mut(index) else {
            eprintln!(
                "[library] toggle_read: 下标越界 {} (共 {} 条)，忽略",
                index,
                self.records.len()
            );
            return false;
        };

        record.read = !record.read;
        let title = record.title.clone();
        self.history
            .record(format!("Read status changed for book: {}", title));
        true
    }

    /// 标题子串过滤（忽略大小写），返回 (原始下标, 记录) 派生序列
    /// 不改动目录本身；保留原始下标供删除/翻转继续定位
    pub fn filter(&self, term: &str) -> Vec<(usize, &BookRecord)> {
        let needle = term.to_lowercase();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// 就地排序，改变目录的规范顺序
    pub fn sort(&mut self, key: SortKey) {
        match key {
            SortKey::Title => self
                .records
                .sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            SortKey::Rating => self.records.sort_by(|a, b| match (a.rating, b.rating) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }),
        }
    }

    /// 是否仍有记录引用该封面文件
    /// 相同文档配相同封面时多条记录共用一个文件，删除前需检查
    pub fn has_cover_reference(&self, relative_path: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.cover_image.as_deref() == Some(relative_path))
    }

    /// 整体替换目录内容（备份恢复）
    pub fn replace_all(&mut self, records: Vec<BookRecord>) {
        self.history
            .record(format!("Restored {} books from backup", records.len()));
        self.records = records;
    }

    /// 导出 CSV：每行 title,category,rating，无表头，不做字段转义
    pub fn to_csv(&self) -> String {
        self.records
            .iter()
            .map(|record| {
                let rating = record.rating.map(format_rating).unwrap_or_default();
                format!("{},{},{}", record.title, record.category, rating)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 整数评分不带小数位输出（5.0 -> "5"）
fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{}", rating as i64)
    } else {
        rating.to_string()
    }
}
