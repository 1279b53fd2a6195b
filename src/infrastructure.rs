// インフラストラクチャ層モジュール
pub mod config;
pub mod logging;
pub mod sqlite;
pub mod todo_repository;

// 再エクスポート
pub use config::{ConfigError, ServerConfig};
pub use logging::init_logging;
pub use sqlite::SqliteDatabase;
pub use todo_repository::{SqliteTodoRepository, StorageError, TodoRepository};
