// アプリケーション層モジュール
pub mod todo_interactor;

// 再エクスポート
pub use todo_interactor::{TodoInteractor, TodoUsecase, TodoUsecaseError, UpdateTodoInput};
