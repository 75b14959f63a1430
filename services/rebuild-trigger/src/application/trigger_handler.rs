/// 再ビルドトリガーハンドラー
///
/// 呼び出しイベントを認証し、成功時のみrepository_dispatchを1回送信する。
use thiserror::Error;

use crate::domain::{BearerAuthenticator, TriggerEvent, TriggerResponse};
use crate::infrastructure::{DispatchError, RepositoryDispatcher};

/// トリガーハンドラーのエラー型
///
/// 認証失敗はエラーではなく401レスポンスとして返す。
/// このエラーは呼び出し自体を異常終了させる。
#[derive(Debug, Error)]
pub enum TriggerHandlerError {
    /// repository_dispatch送信失敗
    #[error("再ビルドの起動に失敗: {0}")]
    Dispatch(#[from] DispatchError),
}

/// トリガーハンドラー
///
/// # 処理フロー
/// 1. Authorizationヘッダーを検証
/// 2. 失敗時は401レスポンスを返却（dispatchしない）
/// 3. 成功時はrepository_dispatchを送信し200レスポンスを返却
pub struct TriggerHandler<D>
where
    D: RepositoryDispatcher,
{
    /// Bearerトークン認証器
    authenticator: BearerAuthenticator,
    /// 再ビルド起動
    dispatcher: D,
}

impl<D> TriggerHandler<D>
where
    D: RepositoryDispatcher,
{
    /// 新しいTriggerHandlerを作成
    pub fn new(authenticator: BearerAuthenticator, dispatcher: D) -> Self {
        Self {
            authenticator,
            dispatcher,
        }
    }

    /// Dispatcherへの参照を取得
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// 呼び出しイベントを処理
    ///
    /// # 戻り値
    /// * 認証失敗時は`Ok(TriggerResponse::unauthorized())`
    /// * dispatch成功時は`Ok(TriggerResponse::ok())`
    /// * dispatch失敗時は`Err(TriggerHandlerError)`
    pub async fn handle(&self, event: &TriggerEvent) -> Result<TriggerResponse, TriggerHandlerError> {
        if !self.authenticator.authenticate(event) {
            return Ok(TriggerResponse::unauthorized());
        }

        tracing::info!("認証成功、再ビルドを起動");
        self.dispatcher.dispatch().await?;

        Ok(TriggerResponse::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::logging::init_test_logging;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// テスト用のシークレット
    const TEST_SECRET: &str = "handler-secret";

    /// 呼び出し回数を記録するモックDispatcher
    struct MockDispatcher {
        calls: AtomicUsize,
        fail_with_status: Option<u16>,
    }

    impl MockDispatcher {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_with_status: None,
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_with_status: Some(status),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepositoryDispatcher for MockDispatcher {
        async fn dispatch(&self) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with_status {
                None => Ok(()),
                Some(status) => Err(DispatchError::HttpError {
                    status,
                    message: "mock failure".to_string(),
                }),
            }
        }
    }

    fn handler(dispatcher: MockDispatcher) -> TriggerHandler<MockDispatcher> {
        TriggerHandler::new(
            BearerAuthenticator::new(Some(TEST_SECRET.to_string())),
            dispatcher,
        )
    }

    fn event_with_auth(value: &str) -> TriggerEvent {
        TriggerEvent::with_headers([("authorization", value)])
    }

    // ===========================================
    // 認証失敗のテスト
    // ===========================================

    #[tokio::test]
    async fn test_missing_header_returns_401_without_dispatch() {
        init_test_logging();
        let handler = handler(MockDispatcher::succeeding());

        let response = handler.handle(&TriggerEvent::default()).await.unwrap();

        assert_eq!(response, TriggerResponse::unauthorized());
        assert_eq!(handler.dispatcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_scheme_returns_401_without_dispatch() {
        init_test_logging();
        let handler = handler(MockDispatcher::succeeding());

        let response = handler.handle(&event_with_auth("Basic xyz")).await.unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(response.data, "Authentication required");
        assert_eq!(handler.dispatcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_token_returns_401_without_dispatch() {
        init_test_logging();
        let handler = handler(MockDispatcher::succeeding());

        let response = handler.handle(&event_with_auth("Bearer wrong")).await.unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(handler.dispatcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_ignores_failing_dispatcher() {
        init_test_logging();
        let handler = handler(MockDispatcher::failing(500));

        let response = handler.handle(&event_with_auth("Bearer wrong")).await.unwrap();

        assert_eq!(response, TriggerResponse::unauthorized());
    }

    // ===========================================
    // 認証成功のテスト
    // ===========================================

    #[tokio::test]
    async fn test_correct_token_returns_200_and_dispatches_once() {
        init_test_logging();
        let handler = handler(MockDispatcher::succeeding());

        let response = handler
            .handle(&event_with_auth("Bearer handler-secret"))
            .await
            .unwrap();

        assert_eq!(response, TriggerResponse::ok());
        assert_eq!(handler.dispatcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_failure_propagates_as_error() {
        init_test_logging();
        let handler = handler(MockDispatcher::failing(403));

        let result = handler.handle(&event_with_auth("Bearer handler-secret")).await;

        match result {
            Err(TriggerHandlerError::Dispatch(DispatchError::HttpError { status, .. })) => {
                assert_eq!(status, 403);
            }
            other => panic!("Dispatchエラーを期待: {:?}", other),
        }
        assert_eq!(handler.dispatcher.call_count(), 1);
    }

    #[test]
    fn test_error_display() {
        let error = TriggerHandlerError::from(DispatchError::NetworkError("timeout".to_string()));
        let display = error.to_string();
        assert!(display.contains("再ビルドの起動に失敗"));
        assert!(display.contains("timeout"));
    }
}
