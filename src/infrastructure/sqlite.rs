//! SQLiteデータベースハンドル
//!
//! アプリケーション起動時に明示的に構築し、リポジトリへ渡して使用する。
//! - 書き込み: 専用の単一接続（Arc<Mutex<Connection>>）
//! - 読み取り: deadpool-sqliteによるasync接続プール

use std::sync::{Arc, Mutex};

use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::Connection;

use super::todo_repository::StorageError;

/// 読み取りプールの最大接続数
const READ_POOL_MAX_SIZE: usize = 4;

/// SQLiteデータベースのスキーマを定義するSQL
///
/// 起動のたびに実行されるため、すべて冪等に記述する。
const SCHEMA_SQL: &str = r#"
-- WALモード設定
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;

-- Todoテーブル
CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY,           -- UUID文字列
    text TEXT NOT NULL,            -- 説明文
    completed BOOLEAN NOT NULL,    -- 完了フラグ
    date TEXT NOT NULL,            -- YYYY-MM-DD
    profile_id TEXT NOT NULL       -- 所有プロフィールID
);

-- 日付・プロフィールでの一覧取得用インデックス
CREATE INDEX IF NOT EXISTS idx_todos_date_profile_id ON todos(date, profile_id);
"#;

/// SQLiteデータベースハンドル
///
/// クローンしても同じ接続・プールを共有する。
#[derive(Clone)]
pub struct SqliteDatabase {
    /// 書き込み専用接続
    write_conn: Arc<Mutex<Connection>>,
    /// 読み取り用async接続プール
    read_pool: Pool,
}

impl SqliteDatabase {
    /// データベースファイルを開き、スキーマを初期化する
    ///
    /// # Arguments
    /// * `db_path` - データベースファイルのパス
    ///
    /// # Returns
    /// * `Ok(SqliteDatabase)` - 成功時
    /// * `Err(StorageError)` - ファイルを開けない、またはスキーマ初期化に失敗した場合
    pub async fn open(db_path: &str) -> Result<Self, StorageError> {
        let write_conn = Connection::open(db_path)?;
        write_conn.execute_batch(SCHEMA_SQL)?;

        let read_pool = Config::new(db_path)
            .builder(Runtime::Tokio1)
            .map_err(|e| StorageError::Build(e.to_string()))?
            .max_size(READ_POOL_MAX_SIZE)
            .build()?;

        Ok(Self {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
        })
    }

    /// 書き込み専用接続で処理を実行する
    ///
    /// ブロッキング処理のため`spawn_blocking`上で実行する。
    pub(crate) async fn write<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.write_conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| {
                StorageError::Database("書き込み接続のロック取得に失敗（Mutex poisoned）".to_string())
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// 読み取りプールから接続を取得して処理を実行する
    pub(crate) async fn read<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.read_pool.get().await?;

        conn.interact(move |conn| f(conn)).await?
    }

    /// 書き込み用接続を取得（テスト用）
    #[cfg(test)]
    pub(crate) fn write_connection(&self) -> Arc<Mutex<Connection>> {
        self.write_conn.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    /// テスト用の一時データベースパスを生成
    fn temp_db_path() -> (tempfile::TempDir, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        (dir, path.to_string_lossy().to_string())
    }

    // ========================================
    // スキーマ作成のテスト
    // ========================================

    /// データベースが正常に開けることを確認
    #[tokio::test]
    async fn test_open_succeeds() {
        let (_dir, db_path) = temp_db_path();
        let db = SqliteDatabase::open(&db_path).await;
        assert!(db.is_ok(), "データベースのオープンに失敗: {:?}", db.err());
    }

    /// データベースファイルが作成されることを確認
    #[tokio::test]
    async fn test_database_file_created() {
        let (_dir, db_path) = temp_db_path();
        let _db = SqliteDatabase::open(&db_path).await.unwrap();

        assert!(
            fs::metadata(&db_path).is_ok(),
            "データベースファイルが作成されていない"
        );
    }

    /// todosテーブルのカラムが正しく定義されていることを確認
    #[tokio::test]
    async fn test_todos_table_columns() {
        let (_dir, db_path) = temp_db_path();
        let db = SqliteDatabase::open(&db_path).await.unwrap();

        let conn = db.write_connection();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare("PRAGMA table_info(todos)").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert_eq!(
            columns,
            vec!["id", "text", "completed", "date", "profile_id"],
            "todosテーブルのカラムが想定と異なる"
        );
    }

    /// 日付・プロフィール用インデックスが存在することを確認
    #[tokio::test]
    async fn test_date_profile_index_exists() {
        let (_dir, db_path) = temp_db_path();
        let db = SqliteDatabase::open(&db_path).await.unwrap();

        let conn = db.write_connection();
        let conn = conn.lock().unwrap();
        let result: Result<String, _> = conn.query_row(
            "SELECT name FROM sqlite_master WHERE type='index' AND name='idx_todos_date_profile_id'",
            [],
            |row| row.get(0),
        );
        assert!(result.is_ok(), "idx_todos_date_profile_idが存在しない");
    }

    /// WALモードが有効になっていることを確認
    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let (_dir, db_path) = temp_db_path();
        let db = SqliteDatabase::open(&db_path).await.unwrap();

        let conn = db.write_connection();
        let conn = conn.lock().unwrap();
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();

        assert_eq!(journal_mode.to_lowercase(), "wal");
    }

    /// 既存データベースを開き直してもスキーマ初期化が失敗せず、データが残ることを確認
    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let (_dir, db_path) = temp_db_path();
        {
            let db = SqliteDatabase::open(&db_path).await.unwrap();
            db.write(|conn| {
                conn.execute(
                    "INSERT INTO todos (id, text, completed, date, profile_id) VALUES ('a', 't', 0, '2024-06-01', 'p1')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();
        }

        let db = SqliteDatabase::open(&db_path).await.unwrap();
        let count: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    /// 存在しないディレクトリのパスではエラーになることを確認
    #[tokio::test]
    async fn test_open_fails_for_missing_directory() {
        let (dir, _) = temp_db_path();
        let path = dir.path().join("missing").join("test.db");

        let result = SqliteDatabase::open(&path.to_string_lossy()).await;
        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}
