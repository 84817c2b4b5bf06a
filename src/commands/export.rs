//! 导出与备份命令

use super::book::{app_data_dir, current_view, Error, LibState};
use crate::models::BookRecord;
use crate::store;
use crate::view::LibraryView;
use chrono::Utc;
use serde_json::{json, Value};
use tauri::AppHandle;

/// 备份文档格式版本
const BACKUP_VERSION: i64 = 1;
const BACKUP_APP_NAME: &str = "BookShelf";

/// 导出 CSV 到指定路径
/// 每行 title,category,rating，无表头，不做转义；纯读取，不改动目录
#[tauri::command]
pub async fn export_csv(path: String, library: LibState<'_>) -> Result<(), Error> {
    let csv = {
        let library = library.lock().await;
        library.to_csv()
    };

    tokio::fs::write(&path, csv)
        .await
        .map_err(|e| Error::Message(format!("写入导出文件失败: {}", e)))
}

fn build_backup_json(records: &[BookRecord]) -> Value {
    json!({
        "version": BACKUP_VERSION,
        "app": {
            "name": BACKUP_APP_NAME,
            "platform": std::env::consts::OS,
            "createdAt": Utc::now().to_rfc3339(),
        },
        "data": {
            "books": records,
        }
    })
}

/// 导出完整目录为带版本号的 JSON 备份文档
#[tauri::command]
pub async fn export_backup(path: String, library: LibState<'_>) -> Result<(), Error> {
    let backup = {
        let library = library.lock().await;
        build_backup_json(library.records())
    };

    let json_str = serde_json::to_string_pretty(&backup).map_err(|e| Error::Message(e.to_string()))?;
    tokio::fs::write(&path, json_str)
        .await
        .map_err(|e| Error::Message(format!("写入备份文件失败: {}", e)))
}

/// 从备份文档整体恢复目录
/// 校验版本号与生成方，整体替换当前目录并持久化
#[tauri::command]
pub async fn import_backup(
    app_handle: AppHandle,
    path: String,
    library: LibState<'_>,
) -> Result<LibraryView, Error> {
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| Error::Message(format!("读取备份文件失败: {}", e)))?;

    let root: Value = serde_json::from_str(&content)
        .map_err(|e| Error::Message(format!("解析备份文件失败: {}", e)))?;

    let version = root
        .get("version")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::Message("备份文件缺少版本号".to_string()))?;
    if version != BACKUP_VERSION {
        return Err(Error::Message(format!("不支持的备份版本: {}", version)));
    }

    let app_name = root
        .get("app")
        .and_then(|a| a.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or_default();
    if app_name != BACKUP_APP_NAME {
        return Err(Error::Message(
            "备份文件不是 BookShelf 生成的备份".to_string(),
        ));
    }

    let books_val = root
        .get("data")
        .and_then(|d| d.get("books"))
        .cloned()
        .unwrap_or_else(|| Value::Array(vec![]));
    let records: Vec<BookRecord> = serde_json::from_value(books_val)
        .map_err(|e| Error::Message(format!("解析 books 失败: {}", e)))?;

    // 持久化记录的不变式：标题与文档路径都不为空
    for record in &records {
        if record.title.trim().is_empty() || record.file_path.trim().is_empty() {
            return Err(Error::Message(
                "备份中存在缺少标题或文档路径的记录".to_string(),
            ));
        }
    }

    let data_dir = app_data_dir(&app_handle)?;
    let mut library = library.lock().await;
    library.replace_all(records);

    store::save(&store::slot_path(&data_dir), library.records())
        .await
        .map_err(Error::Message)?;

    Ok(current_view(&library, None, &data_dir))
}
