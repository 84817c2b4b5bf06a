mod commands;
mod cover;
mod history;
mod library;
mod models;
mod store;
mod view;

use commands::*;
use library::Library;
use std::sync::Arc;
use tauri::Manager;
use tokio::sync::Mutex;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            // 启动时从存储槽恢复目录
            tauri::async_runtime::block_on(async {
                let app_data_dir = app.path().app_data_dir().unwrap();
                std::fs::create_dir_all(&app_data_dir).unwrap();
                let records = store::load(&store::slot_path(&app_data_dir)).await;
                app.manage(Arc::new(Mutex::new(Library::new(records))));
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            add_book,
            delete_book,
            toggle_read,
            sort_books,
            get_library_view,
            open_document,
            export_csv,
            export_backup,
            import_backup,
            frontend_log
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
