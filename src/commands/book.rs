use crate::cover::{self, CoverError};
use crate::library::{Library, ValidationError};
use crate::models::{BookRecord, SortKey};
use crate::store;
use crate::view::{self, LibraryView};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tauri::{AppHandle, Manager, State};
use tauri_plugin_opener::OpenerExt;
use tokio::sync::Mutex;

#[derive(Debug)]
pub enum Error {
    Validation(ValidationError),
    Cover(CoverError),
    Message(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "{}", e),
            Error::Cover(e) => write!(f, "Cover error: {}", e),
            Error::Message(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        Error::Validation(error)
    }
}

impl From<CoverError> for Error {
    fn from(error: CoverError) -> Self {
        Error::Cover(error)
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Message(error)
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&format!("{}", self))
    }
}

pub type LibState<'a> = State<'a, Arc<Mutex<Library>>>;

/// 应用数据目录（存储槽与封面目录都在其中）
pub(super) fn app_data_dir(app_handle: &AppHandle) -> Result<PathBuf, Error> {
    app_handle
        .path()
        .app_data_dir()
        .map_err(|e| Error::Message(format!("获取数据目录失败: {}", e)))
}

/// 以当前目录状态构建视图；提供 search 时只渲染标题匹配项
pub(super) fn current_view(
    library: &Library,
    search: Option<&str>,
    app_data_dir: &Path,
) -> LibraryView {
    let cover_root = cover::cover_root(app_data_dir);
    let indexed: Vec<(usize, &BookRecord)> = match search {
        Some(term) if !term.trim().is_empty() => library.filter(term),
        _ => library.records().iter().enumerate().collect(),
    };
    view::build_view(&indexed, library.records().len(), library.history(), &cover_root)
}

#[tauri::command]
pub async fn add_book(
    app_handle: AppHandle,
    title: String,
    category: String,
    rating: Option<f64>,
    file_path: String,
    cover: Option<String>,
    library: LibState<'_>,
) -> Result<LibraryView, Error> {
    let data_dir = app_data_dir(&app_handle)?;
    let title = title.trim().to_string();

    // 封面处理前先做校验，校验失败时不产生任何副作用
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle.into());
    }
    if file_path.trim().is_empty() {
        return Err(ValidationError::MissingDocument.into());
    }

    // 处理封面：无法解码的封面不阻止添加，记录日志后按无封面处理
    let cover_image = match cover.as_deref() {
        Some(source) if !source.is_empty() => {
            match cover::store_cover(&data_dir, &file_path, source).await {
                Ok(relative_path) => Some(relative_path),
                Err(e) => {
                    eprintln!("[add_book] Failed to save cover: {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let mut library = library.lock().await;
    library.add(BookRecord {
        title,
        category,
        rating,
        cover_image,
        read: false,
        file_path,
    })?;

    store::save(&store::slot_path(&data_dir), library.records())
        .await
        .map_err(Error::Message)?;

    Ok(current_view(&library, None, &data_dir))
}

#[tauri::command]
pub async fn delete_book(
    app_handle: AppHandle,
    index: usize,
    library: LibState<'_>,
) -> Result<LibraryView, Error> {
    let data_dir = app_data_dir(&app_handle)?;
    let mut library = library.lock().await;

    // 越界下标是受防护的空操作，不算错误（前端可能持有过期下标）
    if let Some(removed) = library.remove(index) {
        if let Some(ref relative_path) = removed.cover_image {
            // 其他记录可能共用同一封面文件，仍被引用时保留
            if !library.has_cover_reference(relative_path) {
                if let Err(e) = cover::delete_cover_file(&data_dir, relative_path).await {
                    eprintln!(
                        "[delete_book] Failed to delete cover file {}: {}",
                        relative_path, e
                    );
                }
            }
        }

        store::save(&store::slot_path(&data_dir), library.records())
            .await
            .map_err(Error::Message)?;
    }

    Ok(current_view(&library, None, &data_dir))
}

#[tauri::command]
pub async fn toggle_read(
    app_handle: AppHandle,
    index: usize,
    library: LibState<'_>,
) -> Result<LibraryView, Error> {
    let data_dir = app_data_dir(&app_handle)?;
    let mut library = library.lock().await;

    if library.toggle_read(index) {
        store::save(&store::slot_path(&data_dir), library.records())
            .await
            .map_err(Error::Message)?;
    }

    Ok(current_view(&library, None, &data_dir))
}

#[tauri::command]
pub async fn sort_books(
    app_handle: AppHandle,
    key: SortKey,
    library: LibState<'_>,
) -> Result<LibraryView, Error> {
    let data_dir = app_data_dir(&app_handle)?;
    let mut library = library.lock().await;

    library.sort(key);

    // 排序改变规范顺序，与其他变更一样持久化
    store::save(&store::slot_path(&data_dir), library.records())
        .await
        .map_err(Error::Message)?;

    Ok(current_view(&library, None, &data_dir))
}

#[tauri::command]
pub async fn get_library_view(
    app_handle: AppHandle,
    search: Option<String>,
    library: LibState<'_>,
) -> Result<LibraryView, Error> {
    let data_dir = app_data_dir(&app_handle)?;
    let library = library.lock().await;

    Ok(current_view(&library, search.as_deref(), &data_dir))
}

/// 用系统默认程序打开记录对应的源文档
#[tauri::command]
pub async fn open_document(
    app_handle: AppHandle,
    index: usize,
    library: LibState<'_>,
) -> Result<(), Error> {
    let file_path = {
        let library = library.lock().await;
        match library.records().get(index) {
            Some(record) => record.file_path.clone(),
            None => return Err(Error::Message("Book not found".to_string())),
        }
    };

    app_handle
        .opener()
        .open_path(&file_path, None::<&str>)
        .map_err(|e| Error::Message(format!("打开文档失败 {}: {}", file_path, e)))
}
