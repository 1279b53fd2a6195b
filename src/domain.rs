// ドメイン層モジュール
pub mod todo;

// 再エクスポート
pub use todo::{DATE_FORMAT, InvalidDateFormat, Todo, format_date, parse_date};
