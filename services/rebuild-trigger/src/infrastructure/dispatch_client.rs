// GitHubDispatchClient - repository_dispatch送信用HTTPクライアント
//
// GitHub APIにrepository_dispatchイベントを1回だけ送信し、
// go.anx.ioのページ再ビルドワークフローを起動する。
// 再試行は行わず、失敗はそのまま呼び出し元に返す。

use super::config::{DispatchConfig, DispatchConfigError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// 送信するイベント種別
pub const DISPATCH_EVENT_TYPE: &str = "rebuild_pages";

/// リクエストタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// 接続タイムアウト（秒）
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// GitHub APIはUser-Agentのないリクエストを拒否する
const USER_AGENT: &str = concat!("go.anx.io-rebuild-trigger/", env!("CARGO_PKG_VERSION"));

/// GitHub API推奨のAcceptヘッダー
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// リクエストボディのContent-Type
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Dispatch送信エラー型
///
/// # エラー種別
/// - `Config`: 設定の読み込み失敗
/// - `ClientBuild`: HTTPクライアントの構築失敗
/// - `Serialization`: リクエストボディのシリアライズ失敗
/// - `NetworkError`: ネットワーク接続エラー・タイムアウト
/// - `HttpError`: 2xx以外のレスポンス
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 設定エラー
    #[error(transparent)]
    Config(#[from] DispatchConfigError),

    /// HTTPクライアント構築エラー
    #[error("HTTPクライアントの構築に失敗: {0}")]
    ClientBuild(String),

    /// シリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(String),

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    NetworkError(String),

    /// HTTPエラー（ステータスコード付き）
    #[error("HTTPエラー: status={status}, message={message}")]
    HttpError {
        /// HTTPステータスコード
        status: u16,
        /// レスポンスボディ
        message: String,
    },
}

/// repository_dispatchリクエストボディ
#[derive(Debug, Serialize)]
struct DispatchPayload {
    event_type: &'static str,
}

/// 再ビルド起動の抽象化
///
/// ハンドラーはこのトレイトにのみ依存する（実際のGitHub API、テスト用モック）。
#[async_trait]
pub trait RepositoryDispatcher: Send + Sync {
    /// repository_dispatchイベントを1回送信
    ///
    /// # 戻り値
    /// * 2xxレスポンスなら`Ok(())`
    /// * ネットワークエラーまたは2xx以外なら`Err(DispatchError)`
    async fn dispatch(&self) -> Result<(), DispatchError>;
}

/// GitHub repository_dispatch APIクライアント
#[derive(Clone)]
pub struct GitHubDispatchClient {
    /// HTTPクライアント
    client: Client,
    /// dispatchエンドポイントURL
    endpoint: String,
    /// Basic認証ユーザー名
    username: String,
    /// GitHubトークン
    token: String,
}

impl std::fmt::Debug for GitHubDispatchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubDispatchClient")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl GitHubDispatchClient {
    /// 設定からクライアントを作成
    ///
    /// # 引数
    /// * `config` - dispatch設定
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        debug!(endpoint = config.endpoint(), "GitHubDispatchClientを初期化");

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DispatchError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint().to_string(),
            username: config.username().to_string(),
            token: config.token().to_string(),
        })
    }
}

/// 送信時に環境変数から設定を読み込むDispatcher
///
/// 認証に失敗した呼び出しでは`GOANXIO_TOKEN`を参照しない。
/// そのためトークン未設定でも401応答は変わらない。
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfiguredDispatcher;

#[async_trait]
impl RepositoryDispatcher for EnvConfiguredDispatcher {
    async fn dispatch(&self) -> Result<(), DispatchError> {
        let config = DispatchConfig::from_env().inspect_err(|err| {
            error!(error = %err, "dispatch設定読み込み失敗");
        })?;
        GitHubDispatchClient::new(&config)?.dispatch().await
    }
}

#[async_trait]
impl RepositoryDispatcher for GitHubDispatchClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint, event_type = DISPATCH_EVENT_TYPE))]
    async fn dispatch(&self) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(&DispatchPayload {
            event_type: DISPATCH_EVENT_TYPE,
        })
        .map_err(|e| DispatchError::Serialization(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.token))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, GITHUB_ACCEPT)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "repository_dispatchリクエスト失敗");
                DispatchError::NetworkError(e.to_string())
            })?;

        let status = response.status();

        // GitHubは成功時に204 No Contentを返す
        if status.is_success() {
            info!(status = %status, "再ビルドワークフローを起動");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "repository_dispatchエラー");

        Err(DispatchError::HttpError {
            status: status.as_u16(),
            message: body,
        })
    }
}
