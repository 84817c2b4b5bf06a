//! 目录持久化模块
//! 整个书目列表序列化到应用数据目录下固定的存储槽（books.json），
//! 每次变更后全量覆盖写入，不做增量更新

use crate::models::BookRecord;
use std::path::{Path, PathBuf};

/// 存储槽文件名
pub const SLOT_FILE: &str = "books.json";

/// 存储槽完整路径
pub fn slot_path(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join(SLOT_FILE)
}

/// 读取存储槽
/// 槽不存在时返回空目录；内容损坏时告警并回退为空目录
pub async fn load(slot: &Path) -> Vec<BookRecord> {
    let raw = match tokio::fs::read_to_string(slot).await {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };

    match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("[store] 存储槽内容损坏，回退为空目录: {}", e);
            Vec::new()
        }
    }
}

/// 全量覆盖写入存储槽
pub async fn save(slot: &Path, records: &[BookRecord]) -> Result<(), String> {
    if let Some(parent) = slot.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("创建数据目录失败: {}", e))?;
    }

    let json = serde_json::to_string_pretty(records).map_err(|e| e.to_string())?;
    tokio::fs::write(slot, json)
        .await
        .map_err(|e| format!("写入存储槽失败: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(title: &str) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            category: "novel".to_string(),
            rating: Some(4.5),
            cover_image: None,
            read: false,
            file_path: format!("/books/{}.pdf", title),
        }
    }

    #[tokio::test]
    async fn test_missing_slot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = load(&slot_path(dir.path())).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let slot = slot_path(dir.path());
        let records = vec![sample_record("alpha"), sample_record("beta")];

        save(&slot, &records).await.unwrap();
        let loaded = load(&slot).await;

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "alpha");
        assert_eq!(loaded[1].title, "beta");
        assert_eq!(loaded[0].rating, Some(4.5));
        assert!(!loaded[0].read);

        // load(save(load())) 稳定：再写一轮内容不变
        save(&slot, &loaded).await.unwrap();
        let reloaded = load(&slot).await;
        assert_eq!(
            serde_json::to_string(&reloaded).unwrap(),
            serde_json::to_string(&loaded).unwrap()
        );
    }

    #[tokio::test]
    async fn test_corrupt_slot_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let slot = slot_path(dir.path());
        tokio::fs::write(&slot, "not json {{{").await.unwrap();

        let records = load(&slot).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_slot() {
        let dir = tempfile::tempdir().unwrap();
        let slot = slot_path(dir.path());

        save(&slot, &[sample_record("alpha"), sample_record("beta")])
            .await
            .unwrap();
        save(&slot, &[sample_record("gamma")]).await.unwrap();

        let loaded = load(&slot).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "gamma");
    }
}
