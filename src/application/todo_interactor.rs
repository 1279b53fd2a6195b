/// Todoユースケース
///
/// 業務ルールを持つ唯一の層。リポジトリのトレイトのみに依存する。
/// - 作成時は未完了（completed=false）で生成する
/// - 更新は部分更新で、入力に含まれるフィールドのみ上書きする
/// - 存在しないIDの更新は書き込み前に`NotFound`で失敗させる
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Todo;
use crate::infrastructure::{StorageError, TodoRepository};

/// ユースケースのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TodoUsecaseError {
    /// 指定IDのTodoが存在しない
    #[error("Todoが見つかりません: {0}")]
    NotFound(String),

    /// ストレージ由来のエラー
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 部分更新の入力
///
/// 各フィールドは「指定なし（None）」と「値あり（Some）」を区別する。
/// `Some("")`や`Some(false)`も明示的な上書きとして扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateTodoInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl UpdateTodoInput {
    /// 入力に含まれるフィールドのみを`todo`へ反映する
    fn apply_to(self, todo: &mut Todo) {
        if let Some(text) = self.text {
            todo.text = text;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

/// Todoに関するユースケース
///
/// HTTPアダプターはこのトレイト越しにユースケースを呼び出す。
#[async_trait]
pub trait TodoUsecase: Send + Sync {
    /// Todoを作成し、採番済みのTodoを返す
    async fn create(
        &self,
        text: String,
        date: NaiveDate,
        profile_id: String,
    ) -> Result<Todo, TodoUsecaseError>;

    /// 日付・プロフィールに属するTodoの一覧
    async fn list_by_date(
        &self,
        date: NaiveDate,
        profile_id: &str,
    ) -> Result<Vec<Todo>, TodoUsecaseError>;

    /// Todoを部分更新し、更新後のTodoを返す
    async fn update(&self, id: &str, input: UpdateTodoInput) -> Result<Todo, TodoUsecaseError>;

    /// Todoを削除（存在しないIDでも成功）
    async fn delete(&self, id: &str) -> Result<(), TodoUsecaseError>;
}

/// TodoUsecaseの実装
pub struct TodoInteractor<R>
where
    R: TodoRepository,
{
    /// Todoリポジトリ
    repo: R,
}

impl<R> TodoInteractor<R>
where
    R: TodoRepository,
{
    /// 新しいTodoInteractorを作成
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> TodoUsecase for TodoInteractor<R>
where
    R: TodoRepository,
{
    async fn create(
        &self,
        text: String,
        date: NaiveDate,
        profile_id: String,
    ) -> Result<Todo, TodoUsecaseError> {
        let mut todo = Todo::new(text, date, profile_id);
        self.repo.store(&mut todo).await?;

        info!(todo_id = %todo.id, profile_id = %todo.profile_id, "Todoを作成");
        Ok(todo)
    }

    async fn list_by_date(
        &self,
        date: NaiveDate,
        profile_id: &str,
    ) -> Result<Vec<Todo>, TodoUsecaseError> {
        Ok(self.repo.find_by_date(date, profile_id).await?)
    }

    /// # 処理フロー
    /// 1. IDでTodoを取得
    /// 2. 存在しなければ`NotFound`（書き込みは行わない）
    /// 3. 入力に含まれるフィールドのみ上書き
    /// 4. リポジトリで更新し、更新後のTodoを返却
    async fn update(&self, id: &str, input: UpdateTodoInput) -> Result<Todo, TodoUsecaseError> {
        let Some(mut todo) = self.repo.find_by_id(id).await? else {
            debug!(todo_id = %id, "更新対象のTodoが存在しない");
            return Err(TodoUsecaseError::NotFound(id.to_string()));
        };

        input.apply_to(&mut todo);
        self.repo.update(&todo).await?;

        info!(todo_id = %todo.id, completed = todo.completed, "Todoを更新");
        Ok(todo)
    }

    async fn delete(&self, id: &str) -> Result<(), TodoUsecaseError> {
        self.repo.delete(id).await?;
        Ok(())
    }
}
