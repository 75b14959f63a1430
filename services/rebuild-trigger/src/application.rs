// アプリケーション層モジュール
pub mod trigger_handler;

// 再エクスポート
pub use trigger_handler::{TriggerHandler, TriggerHandlerError};
