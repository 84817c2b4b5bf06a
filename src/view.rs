//! 目录视图模块
//! 将（可能过滤后的）记录序列整理为前端可直接渲染的纯数据视图模型，
//! 渲染本身发生在 webview 中

use crate::models::BookRecord;
use serde::Serialize;
use std::path::Path;

/// 列表项视图
#[derive(Debug, Clone, Serialize)]
pub struct BookListItem {
    /// 目录内的原始下标；过滤后仍指向原目录，删除/翻转据此定位
    pub index: usize,
    pub title: String,
    pub category: String,
    pub rating: Option<f64>,
    pub read: bool,
    /// 翻转按钮文案，随当前状态变化
    pub toggle_label: String,
    /// 封面文件的完整路径，缺失时由前端显示占位图
    pub cover_path: Option<String>,
    /// Open 动作的目标文档
    pub file_path: String,
}

/// 整页视图：列表项、总数文案与完整操作历史
#[derive(Debug, Clone, Serialize)]
pub struct LibraryView {
    pub items: Vec<BookListItem>,
    pub count_text: String,
    pub history: Vec<String>,
}

/// 生成视图模型
/// records 是带原始下标的（可能过滤后的）序列；total 始终为目录总数
pub fn build_view(
    records: &[(usize, &BookRecord)],
    total: usize,
    history: &[String],
    cover_root: &Path,
) -> LibraryView {
    let items = records
        .iter()
        .map(|(index, record)| BookListItem {
            index: *index,
            title: record.title.clone(),
            category: record.category.clone(),
            rating: record.rating,
            read: record.read,
            toggle_label: if record.read {
                "Mark as unread".to_string()
            } else {
                "Mark as read".to_string()
            },
            cover_path: record
                .cover_image
                .as_ref()
                .map(|relative| cover_root.join(relative).to_string_lossy().to_string()),
            file_path: record.file_path.clone(),
        })
        .collect();

    LibraryView {
        items,
        count_text: format!("Books: {}", total),
        history: history.to_vec(),
    }
}
