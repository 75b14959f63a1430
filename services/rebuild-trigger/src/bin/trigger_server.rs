//! go.anx.io再ビルドトリガーのHTTPサーバー
//!
//! 本バイナリは以下の機能を提供する:
//! - 再ビルドの起動 (POST /trigger)
//! - ヘルスチェック (GET /health)
//!
//! HTTPリクエストのヘッダーを呼び出しイベントに変換し、
//! 関数版と同じTriggerHandlerで処理する。

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rebuild_trigger::application::TriggerHandler;
use rebuild_trigger::domain::{BearerAuthenticator, TriggerEvent, TriggerResponse};
use rebuild_trigger::infrastructure::{init_logging, EnvConfiguredDispatcher, RepositoryDispatcher};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// リッスンアドレス環境変数名
const LISTEN_ADDR_ENV: &str = "LISTEN_ADDR";

/// デフォルトのリッスンアドレス
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// エラーレスポンスのボディ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ApiErrorBody {
    /// エラー種別
    error: String,
    /// 詳細メッセージ
    message: String,
}

/// ヘルスチェックエンドポイント
///
/// サーバーの死活確認用。認証不要。
async fn health() -> &'static str {
    "OK"
}

/// HTTPヘッダーを呼び出しイベントに変換
///
/// ヘッダー名は小文字、同名ヘッダーは最初の値のみ採用する。
/// UTF-8として解釈できない値は無視する。
fn event_from_headers(headers: &HeaderMap) -> TriggerEvent {
    let request_headers: HashMap<String, String> = headers
        .keys()
        .filter_map(|name| {
            let value = headers.get(name)?.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();

    TriggerEvent {
        request_headers: Some(request_headers),
    }
}

/// TriggerResponseをHTTPレスポンスに変換
fn into_http_response(response: TriggerResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        response.data,
    )
        .into_response()
}

/// 再ビルド起動エンドポイント (POST /trigger)
///
/// # Returns
/// - 200 OK: 再ビルドを起動した
/// - 401 Unauthorized: 認証失敗
/// - 502 Bad Gateway: GitHub APIの呼び出しに失敗
async fn trigger<D>(State(handler): State<Arc<TriggerHandler<D>>>, headers: HeaderMap) -> Response
where
    D: RepositoryDispatcher + 'static,
{
    let event = event_from_headers(&headers);

    match handler.handle(&event).await {
        Ok(response) => {
            tracing::info!(status = response.status, "トリガー処理完了");
            into_http_response(response)
        }
        Err(err) => {
            tracing::error!(error = %err, "トリガー処理失敗");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiErrorBody {
                    error: "bad_gateway".to_string(),
                    message: "再ビルドの起動に失敗しました".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// ルーターを構築する
///
/// # Arguments
/// * `handler` - 共有するトリガーハンドラー
fn create_router<D>(handler: Arc<TriggerHandler<D>>) -> Router
where
    D: RepositoryDispatcher + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/trigger", post(trigger::<D>))
        // リクエストトレーシングレイヤー（method, path, status, latencyを自動記録）
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を待機し、いずれかを受信したらリターンする。
/// シグナルハンドラーの登録に失敗した場合、そのシグナルは待機しない。
async fn shutdown_signal() {
    // Ctrl+C (SIGINT) を待機
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Ctrl+C シグナルハンドラーの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    // SIGTERM を待機 (Unix系OSのみ)
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "SIGTERM シグナルハンドラーの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    // Windows等の非Unix環境ではSIGTERMは利用不可
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            tracing::info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // 構造化ログの初期化
    init_logging();

    tracing::info!("再ビルドトリガーサーバーを起動します");

    let handler = Arc::new(TriggerHandler::new(
        BearerAuthenticator::from_env(),
        EnvConfiguredDispatcher,
    ));
    let app = create_router(handler);

    let addr: SocketAddr = std::env::var(LISTEN_ADDR_ENV)
        .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
        .parse()?;
    tracing::info!("リッスン開始: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("サーバーが正常に停止しました");
    Ok(())
}
