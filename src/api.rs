//! HTTPアダプター層
//!
//! リクエストのデコード・検証、ユースケース呼び出し、レスポンスのエンコードを担当する。

pub mod error;
pub mod todo_handler;
pub mod validation;

pub use error::{ApiError, ApiErrorBody};
pub use validation::ValidationError;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, patch},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::TodoUsecase;

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。
#[derive(Clone)]
pub struct AppState {
    /// Todoユースケース
    pub usecase: Arc<dyn TodoUsecase>,
}

/// ヘルスチェックエンドポイント
///
/// サーバーの死活確認用。ストレージにはアクセスしない。
async fn health() -> &'static str {
    "OK"
}

/// ルーターを構築する
///
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/todos",
            get(todo_handler::list_todos).post(todo_handler::create_todo),
        )
        .route(
            "/api/todos/{id}",
            patch(todo_handler::update_todo).delete(todo_handler::delete_todo),
        )
        // リクエストトレーシングレイヤー（method, path, status, latencyを自動記録）
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORSレイヤーを構築する
///
/// ヘッダー値として不正なオリジンは警告を出して無視する。
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "不正なCORSオリジンを無視");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}
