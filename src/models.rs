use serde::{Deserialize, Serialize};

/// 书目记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    #[serde(default)]
    pub category: String,
    /// 评分，未设置时为 None
    pub rating: Option<f64>,
    /// covers 目录下的相对路径
    pub cover_image: Option<String>,
    #[serde(default)]
    pub read: bool,
    /// 源文档的绝对路径
    pub file_path: String,
}

/// 排序依据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// 按标题升序（忽略大小写）
    Title,
    /// 按评分降序，未评分排在最后
    Rating,
}
