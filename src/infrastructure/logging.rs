/// ログ基盤モジュール
///
/// tracingクレートを使用した構造化ログ設定を提供する。
use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// ログサブスクライバー初期化用の同期プリミティブ
static INIT: Once = Once::new();

/// JSON形式のログサブスクライバーを初期化する
///
/// 環境変数`RUST_LOG`またはデフォルトのログレベル（info）でフィルタリングを行う。
/// 複数回呼び出しても最初の呼び出しのみ初期化を実行する。
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .flatten_event(true)
            .with_current_span(false);

        // 既にグローバルサブスクライバーが設定済みの場合は何もしない
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init();
    });
}

/// テスト用のログ出力を有効化する
///
/// テストハーネスのキャプチャに乗るよう`with_test_writer`で出力する。
/// 失敗したテストのみリポジトリ・ハンドラーのログが表示される。
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("todo_api=debug")),
            )
            .with_test_writer()
            .without_time()
            .try_init();
    });
}
