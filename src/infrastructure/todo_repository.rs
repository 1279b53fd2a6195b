/// SQLiteでTodoを永続化するためのリポジトリ
///
/// ストレージの行表現とドメインエンティティ`Todo`の相互変換、
/// ID採番、日付の文字列化を担当する。
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Todo, format_date, parse_date};

use super::sqlite::SqliteDatabase;

/// ストレージ操作のエラー型
///
/// 接続・制約違反・データ破損など、ストレージ由来の失敗をすべて表す。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    /// SQL実行に失敗
    #[error("データベースエラー: {0}")]
    Database(String),

    /// プールから接続を取得できない
    #[error("プールエラー: {0}")]
    Pool(String),

    /// 接続プールの構築に失敗
    #[error("接続構築エラー: {0}")]
    Build(String),

    /// ブロッキングタスクの実行に失敗
    #[error("タスク実行エラー: {0}")]
    Task(String),

    /// 保存済みの日付が`YYYY-MM-DD`として解釈できない
    #[error("保存済みの日付が不正です: {0}")]
    CorruptedDate(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<deadpool_sqlite::BuildError> for StorageError {
    fn from(err: deadpool_sqlite::BuildError) -> Self {
        StorageError::Build(err.to_string())
    }
}

impl From<deadpool_sqlite::PoolError> for StorageError {
    fn from(err: deadpool_sqlite::PoolError) -> Self {
        StorageError::Pool(err.to_string())
    }
}

impl From<deadpool_sqlite::InteractError> for StorageError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Todo永続化用トレイト
///
/// ユースケース層はこのトレイトのみに依存する。
/// 異なる実装を可能にする（実際のSQLite、テスト用モック）。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// 新規Todoを保存
    ///
    /// `todo.id`が空の場合は新しいIDを採番し、書き込み前に`todo`へ設定する。
    async fn store(&self, todo: &mut Todo) -> Result<(), StorageError>;

    /// 日付とプロフィールIDが完全一致するTodoを取得
    ///
    /// 該当なしの場合は空のVecを返す。並び順は保証しない。
    async fn find_by_date(
        &self,
        date: NaiveDate,
        profile_id: &str,
    ) -> Result<Vec<Todo>, StorageError>;

    /// IDでTodoを取得
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(Todo))`
    /// * 見つからなかった場合は`Ok(None)`
    /// * 失敗時は`Err(StorageError)`
    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, StorageError>;

    /// `todo.id`に一致する行の`text`と`completed`を上書き
    ///
    /// `date`と`profile_id`は変更しない。一致する行がなくても成功扱い。
    async fn update(&self, todo: &Todo) -> Result<(), StorageError>;

    /// IDに一致する行を削除
    ///
    /// 一致する行がなくても成功扱い。
    async fn delete(&self, id: &str) -> Result<(), StorageError>;
}

/// TodoRepositoryのSQLite実装
#[derive(Clone)]
pub struct SqliteTodoRepository {
    db: SqliteDatabase,
}

/// 一覧・単体取得で共通のSELECT句
const SELECT_COLUMNS: &str = "SELECT id, text, completed, date, profile_id FROM todos";

impl SqliteTodoRepository {
    /// 新しいSqliteTodoRepositoryを作成
    ///
    /// # 引数
    /// * `db` - 起動時に開いたデータベースハンドル
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    /// 行からTodoを復元する
    ///
    /// 日付が解釈できない行はデータ破損として`StorageError::CorruptedDate`を返す。
    fn todo_from_row(row: &Row<'_>) -> Result<Todo, StorageError> {
        let date: String = row.get(3)?;
        let date = parse_date(&date).map_err(|e| StorageError::CorruptedDate(e.0))?;

        Ok(Todo {
            id: row.get(0)?,
            text: row.get(1)?,
            completed: row.get(2)?,
            date,
            profile_id: row.get(4)?,
        })
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn store(&self, todo: &mut Todo) -> Result<(), StorageError> {
        if todo.id.is_empty() {
            todo.id = Uuid::new_v4().to_string();
        }

        let row = todo.clone();
        self.db
            .write(move |conn| {
                conn.execute(
                    "INSERT INTO todos (id, text, completed, date, profile_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        &row.id,
                        &row.text,
                        row.completed,
                        format_date(row.date),
                        &row.profile_id,
                    ],
                )?;
                Ok(())
            })
            .await?;

        tracing::debug!(todo_id = %todo.id, profile_id = %todo.profile_id, "Todoを保存");
        Ok(())
    }

    async fn find_by_date(
        &self,
        date: NaiveDate,
        profile_id: &str,
    ) -> Result<Vec<Todo>, StorageError> {
        let date = format_date(date);
        let profile_id = profile_id.to_string();

        self.db
            .read(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE date = ?1 AND profile_id = ?2",
                    SELECT_COLUMNS
                ))?;
                let mut rows = stmt.query(rusqlite::params![&date, &profile_id])?;

                let mut todos = Vec::new();
                while let Some(row) = rows.next()? {
                    todos.push(Self::todo_from_row(row)?);
                }
                Ok(todos)
            })
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, StorageError> {
        let id = id.to_string();

        self.db
            .read(move |conn| {
                let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;
                let found: Option<Result<Todo, StorageError>> = stmt
                    .query_row([&id], |row| Ok(Self::todo_from_row(row)))
                    .optional()?;
                found.transpose()
            })
            .await
    }

    async fn update(&self, todo: &Todo) -> Result<(), StorageError> {
        let row = todo.clone();

        let rows_affected = self
            .db
            .write(move |conn| {
                Ok(conn.execute(
                    "UPDATE todos SET text = ?1, completed = ?2 WHERE id = ?3",
                    rusqlite::params![&row.text, row.completed, &row.id],
                )?)
            })
            .await?;

        tracing::debug!(todo_id = %todo.id, rows_affected, "Todoを更新");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let target = id.to_string();

        let rows_affected = self
            .db
            .write(move |conn| Ok(conn.execute("DELETE FROM todos WHERE id = ?1", [&target])?))
            .await?;

        tracing::debug!(todo_id = %id, rows_affected, "Todoを削除");
        Ok(())
    }
}
