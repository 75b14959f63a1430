/// go.anx.io再ビルドトリガー関数
///
/// HTTPトリガーの呼び出しイベントを受け取り、Bearerトークンを検証した上で
/// GitHub repository_dispatchを送信する。
/// dispatch失敗時は呼び出し自体をエラーで終了させる。
use lambda_runtime::{service_fn, Error, LambdaEvent};
use rebuild_trigger::application::TriggerHandler;
use rebuild_trigger::domain::{BearerAuthenticator, TriggerEvent, TriggerResponse};
use rebuild_trigger::infrastructure::{init_logging, EnvConfiguredDispatcher};
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// 関数のメインハンドラー
async fn handler(event: LambdaEvent<Value>) -> Result<TriggerResponse, Error> {
    trigger(&event.payload).await
}

/// 呼び出しペイロードを処理
///
/// # 処理フロー
/// 1. ペイロードからTriggerEventを構築（形式不正はヘッダーなし扱い）
/// 2. `GOANXIO_E5E_TOKEN`で認証
/// 3. 成功時のみ`GOANXIO_TOKEN`を読み込んでdispatch
async fn trigger(payload: &Value) -> Result<TriggerResponse, Error> {
    let event = TriggerEvent::from_value(payload);

    let trigger_handler = TriggerHandler::new(BearerAuthenticator::from_env(), EnvConfiguredDispatcher);

    match trigger_handler.handle(&event).await {
        Ok(response) => {
            info!(status = response.status, "トリガー処理完了");
            Ok(response)
        }
        Err(err) => {
            error!(error = %err, "トリガー処理失敗");
            Err(err.into())
        }
    }
}
