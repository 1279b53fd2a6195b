//! APIエラーハンドリング
//!
//! 統一されたエラーレスポンス形式を提供する。
//! すべてのエラーは`{"error": "..."}`形式のJSONで返却される。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// APIエラーレスポンスのボディ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// クライアント向けのエラーメッセージ
    pub error: String,
}

/// APIエラー
///
/// ステータスコードとJSON形式のエラーボディを含む。
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTPステータスコード
    status: StatusCode,
    /// エラーレスポンスボディ
    body: ApiErrorBody,
}

impl ApiError {
    /// 新しいApiErrorを作成
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: message.into(),
            },
        }
    }

    /// 400 Bad Requestエラーを作成
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 Not Foundエラーを作成
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 500 Internal Server Errorを作成
    ///
    /// ストレージ由来の詳細は渡さず、固定の汎用メッセージのみを使うこと。
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// エラーメッセージを取得
    pub fn message(&self) -> &str {
        &self.body.error
    }

    /// ステータスコードを取得
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
