//! リクエスト入力の検証
//!
//! ユースケース呼び出し前に、必須フィールドと日付形式をHTTP境界で検証する。

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::parse_date;

/// 入力検証エラー（400 Bad Request）
///
/// メッセージはそのままクライアントへ返却される。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// リクエストボディがJSONとして解釈できない（詳細はログ用）
    #[error("invalid request body")]
    MalformedBody(String),

    /// クエリ文字列が解釈できない（詳細はログ用）
    #[error("invalid query parameters")]
    MalformedQuery(String),

    /// パス中のTodo IDが解釈できない（詳細はログ用）
    #[error("invalid todo id")]
    MalformedPath(String),

    /// profileIdが未指定または空
    #[error("profileId is required")]
    MissingProfileId,

    /// 日付が`YYYY-MM-DD`形式でない
    #[error("invalid date format, please use YYYY-MM-DD")]
    InvalidDate(String),
}

/// profileIdが空でないことを検証
pub fn require_profile_id(value: Option<&str>) -> Result<&str, ValidationError> {
    match value {
        Some(profile_id) if !profile_id.is_empty() => Ok(profile_id),
        _ => Err(ValidationError::MissingProfileId),
    }
}

/// `YYYY-MM-DD`形式の日付を検証して暦日に変換
pub fn require_date(value: &str) -> Result<NaiveDate, ValidationError> {
    parse_date(value).map_err(|_| ValidationError::InvalidDate(value.to_string()))
}
