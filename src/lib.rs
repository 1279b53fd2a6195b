//! Todo管理HTTP APIのコアライブラリ
//!
//! HTTPアダプター → ユースケース（Interactor） → リポジトリ → SQLite
//! の順に処理が流れるレイヤー構成を取る。

// ドメイン層モジュール
pub mod domain;

// アプリケーション層モジュール
pub mod application;

// インフラストラクチャ層モジュール
pub mod infrastructure;

// HTTPアダプター層モジュール
pub mod api;
