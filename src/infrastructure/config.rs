// サーバー設定
//
// 環境変数からデータベースパス・リッスンアドレス・CORS許可オリジンを読み込む

use std::net::SocketAddr;

use thiserror::Error;

/// データベースパス環境変数名
pub const DB_PATH_ENV: &str = "DB_PATH";

/// リッスンアドレス環境変数名
pub const LISTEN_ADDR_ENV: &str = "LISTEN_ADDR";

/// CORS許可オリジン環境変数名（カンマ区切り）
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";

/// デフォルトのデータベースパス
const DEFAULT_DB_PATH: &str = "./todo.db";

/// デフォルトのリッスンアドレス
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";

/// デフォルトのCORS許可オリジン（フロントエンド開発サーバー）
const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// サーバー設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 環境変数の値が解釈できない
    #[error("環境変数 {name} の値が不正です: {value}")]
    InvalidValue { name: String, value: String },
}

/// サーバー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    db_path: String,
    listen_addr: SocketAddr,
    allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// 新しい設定を作成
    pub fn new(
        db_path: impl Into<String>,
        listen_addr: SocketAddr,
        allowed_origins: Vec<String>,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            listen_addr,
            allowed_origins,
        }
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `DB_PATH`: データベースファイルのパス（デフォルト: ./todo.db）
    /// - `LISTEN_ADDR`: リッスンアドレス（デフォルト: 0.0.0.0:8081）
    /// - `CORS_ALLOWED_ORIGINS`: カンマ区切りの許可オリジン
    ///   （デフォルト: http://localhost:3000,http://localhost:5173）
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var(DB_PATH_ENV).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let listen_addr =
            std::env::var(LISTEN_ADDR_ENV).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                name: LISTEN_ADDR_ENV.to_string(),
                value: listen_addr.clone(),
            })?;

        let allowed_origins = std::env::var(CORS_ALLOWED_ORIGINS_ENV)
            .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGINS.to_string());
        let allowed_origins = parse_origins(&allowed_origins);

        Ok(Self {
            db_path,
            listen_addr,
            allowed_origins,
        })
    }

    /// データベースファイルのパスを取得
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// リッスンアドレスを取得
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// CORS許可オリジンを取得
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }
}

/// カンマ区切りのオリジン一覧を分解（空要素は除外）
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
