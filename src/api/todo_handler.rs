//! Todoエンドポイント
//!
//! - 一覧取得 (GET /api/todos?date=YYYY-MM-DD&profileId=...)
//! - 作成 (POST /api/todos)
//! - 部分更新 (PATCH /api/todos/{id})
//! - 削除 (DELETE /api/todos/{id})
//!
//! プロトコル変換のみを行い、業務ルールはユースケース層に委譲する。

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::{Deserialize, de::DeserializeOwned};

use super::AppState;
use super::error::ApiError;
use super::validation::{ValidationError, require_date, require_profile_id};
use crate::application::{TodoUsecaseError, UpdateTodoInput};

/// 一覧取得のクエリパラメータ
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListTodosQuery {
    /// 対象日（省略時は当日）
    pub date: Option<String>,
    /// 所有プロフィールID（必須）
    pub profile_id: Option<String>,
}

impl ListTodosQuery {
    /// クエリのキー・値の組から構築する
    ///
    /// 同じキーが複数回現れた場合は最初の値を採用する。未知のキーは無視する。
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "date" => &mut query.date,
                "profileId" => &mut query.profile_id,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// 作成リクエストのボディ
///
/// 欠けたフィールドや`null`は空文字として扱い、検証で弾く。
#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "profileId")]
    pub profile_id: Option<String>,
}

/// リクエストボディをJSONとしてデコードする
///
/// Content-Typeは問わない。先頭のJSON値のみを読み、後続のデータは無視する。
fn decode_body<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, ValidationError> {
    let bytes = body.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;

    match serde_json::Deserializer::from_slice(&bytes)
        .into_iter::<T>()
        .next()
    {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ValidationError::MalformedBody(e.to_string())),
        None => Err(ValidationError::MalformedBody("empty body".to_string())),
    }
}

/// パスからTodo IDを取り出す
fn todo_id(path: Result<Path<String>, PathRejection>) -> Result<String, ValidationError> {
    path.map(|Path(id)| id)
        .map_err(|e| ValidationError::MalformedPath(e.body_text()))
}

/// ユースケースのエラーをAPIエラーに変換
///
/// ストレージエラーの詳細はログにのみ出力し、レスポンスには含めない。
fn usecase_error(err: TodoUsecaseError, fallback: &'static str) -> ApiError {
    match err {
        TodoUsecaseError::NotFound(id) => {
            tracing::warn!(todo_id = %id, "Todoが見つからない");
            ApiError::not_found("todo not found")
        }
        TodoUsecaseError::Storage(e) => {
            tracing::error!(error = %e, "ストレージエラー");
            ApiError::internal_error(fallback)
        }
    }
}

/// Todo一覧エンドポイント (GET /api/todos)
///
/// # Returns
/// - 200 OK: Todoの配列
/// - 400 Bad Request: profileIdが未指定、または日付が不正
/// - 500 Internal Server Error: ストレージエラー
pub async fn list_todos(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(pairs) = query.map_err(|e| {
        tracing::warn!(error = %e, "クエリパラメータが不正");
        ValidationError::MalformedQuery(e.body_text())
    })?;
    let query = ListTodosQuery::from_pairs(pairs);

    let profile_id = require_profile_id(query.profile_id.as_deref())?;
    let date = match query.date.as_deref() {
        None | Some("") => Local::now().date_naive(),
        Some(value) => require_date(value)?,
    };

    tracing::info!(profile_id = %profile_id, date = %date, "Todo一覧リクエストを受信");

    let todos = state
        .usecase
        .list_by_date(date, profile_id)
        .await
        .map_err(|e| usecase_error(e, "could not retrieve todos"))?;

    tracing::info!(count = todos.len(), "Todo一覧を返却");
    Ok(Json(todos).into_response())
}

/// Todo作成エンドポイント (POST /api/todos)
///
/// # Returns
/// - 201 Created: 採番済みのTodo
/// - 400 Bad Request: ボディが不正、profileIdが未指定、または日付が不正
/// - 500 Internal Server Error: ストレージエラー
pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let request: CreateTodoRequest = decode_body(body).inspect_err(|e| {
        tracing::warn!(error = ?e, "作成リクエストのボディが不正");
    })?;

    let profile_id = request.profile_id.unwrap_or_default();
    require_profile_id(Some(profile_id.as_str()))?;
    let date = require_date(request.date.as_deref().unwrap_or_default())?;

    tracing::info!(profile_id = %profile_id, date = %date, "Todo作成リクエストを受信");

    let todo = state
        .usecase
        .create(request.text.unwrap_or_default(), date, profile_id)
        .await
        .map_err(|e| usecase_error(e, "could not create todo"))?;

    Ok((StatusCode::CREATED, Json(todo)).into_response())
}

/// Todo部分更新エンドポイント (PATCH /api/todos/{id})
///
/// ボディに含まれるフィールド（text, completed）のみを上書きする。
///
/// # Returns
/// - 200 OK: 更新後のTodo
/// - 400 Bad Request: IDまたはボディが不正
/// - 404 Not Found: Todoが存在しない
/// - 500 Internal Server Error: ストレージエラー
pub async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let id = todo_id(path)?;
    let input: UpdateTodoInput = decode_body(body).inspect_err(|e| {
        tracing::warn!(todo_id = %id, error = ?e, "更新リクエストのボディが不正");
    })?;

    tracing::info!(
        todo_id = %id,
        text = input.text.is_some(),
        completed = ?input.completed,
        "Todo更新リクエストを受信"
    );

    let todo = state
        .usecase
        .update(&id, input)
        .await
        .map_err(|e| usecase_error(e, "could not update todo"))?;

    Ok(Json(todo).into_response())
}

/// Todo削除エンドポイント (DELETE /api/todos/{id})
///
/// 存在しないIDでも204を返す。
///
/// # Returns
/// - 204 No Content: 削除完了
/// - 400 Bad Request: IDが不正
/// - 500 Internal Server Error: ストレージエラー
pub async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = todo_id(path)?;

    tracing::info!(todo_id = %id, "Todo削除リクエストを受信");

    state
        .usecase
        .delete(&id)
        .await
        .map_err(|e| usecase_error(e, "could not delete todo"))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
