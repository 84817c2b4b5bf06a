//! 操作历史模块
//! 仅保存在内存中，应用重启后清空，不做持久化

/// 追加式操作历史，条目一旦写入不再修改或删除
#[derive(Debug, Default)]
pub struct ActionLog {
    entries: Vec<String>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条已完成变更的描述
    pub fn record(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    /// 按时间顺序返回全部条目
    pub fn all(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let log = ActionLog::new();
        assert!(log.all().is_empty());
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut log = ActionLog::new();
        log.record("Added book: A");
        log.record("Deleted book: A");
        log.record("Added book: A");

        assert_eq!(
            log.all(),
            &[
                "Added book: A".to_string(),
                "Deleted book: A".to_string(),
                "Added book: A".to_string(),
            ]
        );
    }
}
