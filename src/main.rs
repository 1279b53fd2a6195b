//! Todo管理HTTP APIサーバー
//!
//! 本バイナリは以下の機能を提供する:
//! - Todoの一覧取得 (GET /api/todos)
//! - Todoの作成 (POST /api/todos)
//! - Todoの部分更新 (PATCH /api/todos/{id})
//! - Todoの削除 (DELETE /api/todos/{id})
//! - ヘルスチェック (GET /health)

use std::process::ExitCode;
use std::sync::Arc;

use axum::Router;
use tokio::signal;
use todo_api::api::{AppState, cors_layer, create_router};
use todo_api::application::TodoInteractor;
use todo_api::infrastructure::{
    ServerConfig, SqliteDatabase, SqliteTodoRepository, StorageError, init_logging,
};

/// 設定からアプリケーションのルーターを組み立てる
///
/// データベースを開いてスキーマを初期化し、CORSレイヤーを適用する。
async fn build_app(config: &ServerConfig) -> Result<Router, StorageError> {
    let db = SqliteDatabase::open(config.db_path()).await?;
    let usecase = Arc::new(TodoInteractor::new(SqliteTodoRepository::new(db)));
    Ok(create_router(AppState { usecase }).layer(cors_layer(config.allowed_origins())))
}

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を待機し、いずれかを受信したらリターンする。
/// axum::serve の with_graceful_shutdown() と組み合わせて使用する。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C シグナルハンドラーの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    // SIGTERM を待機 (Unix系OSのみ)
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM シグナルハンドラーの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            tracing::info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}

/// メイン関数
///
/// 設定・データベース・ルーターを組み立ててHTTPサーバーを起動する。
/// スキーマ初期化やバインドに失敗した場合は非ゼロで終了する。
///
/// # 環境変数
/// - `DB_PATH`: データベースファイルのパス（デフォルト: ./todo.db）
/// - `LISTEN_ADDR`: リッスンアドレス（デフォルト: 0.0.0.0:8081）
/// - `CORS_ALLOWED_ORIGINS`: カンマ区切りのCORS許可オリジン
/// - `RUST_LOG`: ログレベル（デフォルト: info）
#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    tracing::info!("Todo API サーバーを起動します");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "設定の読み込みに失敗しました");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(db_path = %config.db_path(), "データベースを初期化します");

    let app = match build_app(&config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "データベースの初期化に失敗しました");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(config.listen_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr(), error = %e, "アドレスのバインドに失敗しました");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %config.listen_addr(), "リッスン開始");

    // shutdown_signal()がシグナルを受信すると新規コネクションの受付を停止し、
    // 処理中のリクエスト完了後にサーバーが終了する
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "サーバーがエラーで停止しました");
        return ExitCode::FAILURE;
    }

    tracing::info!("サーバーが正常に停止しました");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod graceful_shutdown_tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::oneshot;

    const FRONTEND_ORIGIN: &str = "http://localhost:5173";

    /// 一時データベースを指す設定を作成
    fn create_test_config(dir: &tempfile::TempDir) -> ServerConfig {
        ServerConfig::new(
            dir.path().join("test.db").to_string_lossy(),
            "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            vec![FRONTEND_ORIGIN.to_string()],
        )
    }

    /// 設定どおりにサーバーを起動し、アドレスと停止用の送信側・タスクを返す
    async fn start_server(
        config: &ServerConfig,
    ) -> (
        SocketAddr,
        oneshot::Sender<()>,
        tokio::task::JoinHandle<()>,
    ) {
        let app = build_app(config).await.expect("ルーターの構築に失敗");
        let listener = tokio::net::TcpListener::bind(config.listen_addr())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("サーバーの起動に失敗");
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        (addr, shutdown_tx, server_handle)
    }

    /// シャットダウンを通知し、5秒以内に正常停止することを確認
    async fn stop_server(
        shutdown_tx: oneshot::Sender<()>,
        server_handle: tokio::task::JoinHandle<()>,
    ) {
        shutdown_tx.send(()).expect("シャットダウンシグナル送信に失敗");

        let shutdown_result = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
        assert!(shutdown_result.is_ok(), "サーバーが5秒以内に停止しなかった");
        assert!(shutdown_result.unwrap().is_ok(), "サーバーがエラーで停止した");
    }

    /// graceful shutdownを使用したサーバーが正常に起動・停止できることを確認
    #[tokio::test]
    async fn test_server_with_graceful_shutdown_starts_and_stops() {
        let dir = tempdir().unwrap();
        let config = create_test_config(&dir);
        let (addr, shutdown_tx, server_handle) = start_server(&config).await;

        let response = reqwest::Client::new()
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("ヘルスチェックリクエストに失敗");
        assert_eq!(response.status(), 200);

        stop_server(shutdown_tx, server_handle).await;
    }

    /// 設定したオリジンにCORSヘッダーが返ることを確認
    #[tokio::test]
    async fn test_server_applies_configured_cors_origin() {
        let dir = tempdir().unwrap();
        let config = create_test_config(&dir);
        let (addr, shutdown_tx, server_handle) = start_server(&config).await;

        let response = reqwest::Client::new()
            .get(format!("http://{}/health", addr))
            .header("Origin", FRONTEND_ORIGIN)
            .send()
            .await
            .expect("ヘルスチェックリクエストに失敗");
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            FRONTEND_ORIGIN
        );

        stop_server(shutdown_tx, server_handle).await;
    }

    /// データベースを開けない設定ではルーターの構築に失敗することを確認
    #[tokio::test]
    async fn test_build_app_fails_for_unopenable_db_path() {
        let dir = tempdir().unwrap();
        let config = ServerConfig::new(
            dir.path().join("missing").join("test.db").to_string_lossy(),
            "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            Vec::new(),
        );

        assert!(build_app(&config).await.is_err());
    }

    /// 実サーバー経由でTodoの作成から削除までが行えることを確認
    #[tokio::test]
    async fn test_todo_lifecycle_over_tcp() {
        let dir = tempdir().unwrap();
        let config = create_test_config(&dir);
        let (addr, shutdown_tx, server_handle) = start_server(&config).await;

        let client = reqwest::Client::new();
        let base = format!("http://{}/api/todos", addr);

        let created = client
            .post(&base)
            .header("Content-Type", "application/json")
            .body(r#"{"text":"buy milk","date":"2024-06-01","profileId":"p1"}"#)
            .send()
            .await
            .expect("作成リクエストに失敗");
        assert_eq!(created.status(), 201);
        let created: serde_json::Value =
            serde_json::from_str(&created.text().await.unwrap()).unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let patched = client
            .patch(format!("{}/{}", base, id))
            .header("Content-Type", "application/json")
            .body(r#"{"completed":true}"#)
            .send()
            .await
            .expect("更新リクエストに失敗");
        assert_eq!(patched.status(), 200);

        let deleted = client
            .delete(format!("{}/{}", base, id))
            .send()
            .await
            .expect("削除リクエストに失敗");
        assert_eq!(deleted.status(), 204);

        let listed = client
            .get(format!("{}?date=2024-06-01&profileId=p1", base))
            .send()
            .await
            .expect("一覧リクエストに失敗");
        assert_eq!(listed.status(), 200);
        assert_eq!(listed.text().await.unwrap(), "[]");

        stop_server(shutdown_tx, server_handle).await;
    }
}
