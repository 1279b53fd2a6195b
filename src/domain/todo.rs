/// Todoエンティティ
///
/// プロフィールと暦日で区分されたタスクを表す。
/// 日付は時刻・タイムゾーンを持たない暦日で、常に`YYYY-MM-DD`形式で入出力する。
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 暦日のテキスト表現（YYYY-MM-DD）
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日付文字列が`YYYY-MM-DD`形式として解釈できない
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("YYYY-MM-DD形式の日付ではありません: {0}")]
pub struct InvalidDateFormat(pub String);

/// Todo
///
/// - `id`: 初回保存時にリポジトリが採番する。以後不変
/// - `text`: 説明文。更新可能
/// - `completed`: 完了フラグ。作成時はfalse
/// - `date`: 紐づく暦日。作成後は不変
/// - `profile_id`: 所有プロフィールID。作成後は不変
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    pub profile_id: String,
}

impl Todo {
    /// 未保存・未完了のTodoを作成（IDは空）
    pub fn new(text: impl Into<String>, date: NaiveDate, profile_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            completed: false,
            date,
            profile_id: profile_id.into(),
        }
    }
}

/// 暦日を`YYYY-MM-DD`形式の文字列に変換
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `YYYY-MM-DD`形式の文字列を暦日に変換
///
/// 桁数の省略や符号付きの年など、正規形に戻らない表記は受け付けない。
pub fn parse_date(value: &str) -> Result<NaiveDate, InvalidDateFormat> {
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| InvalidDateFormat(value.to_string()))?;

    if format_date(date) != value {
        return Err(InvalidDateFormat(value.to_string()));
    }

    Ok(date)
}

/// `date`フィールドのserde変換
mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_date(&value).map_err(serde::de::Error::custom)
    }
}
