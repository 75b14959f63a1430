//! Bearerトークン認証
//!
//! 呼び出しイベントのAuthorizationヘッダーを共有シークレットと照合する。
//! - `Authorization: Bearer <token>`形式のみ受け付ける
//! - 失敗理由（ヘッダーなし・スキーム不一致・トークン不一致）は呼び出し元に区別させない

use super::trigger_event::TriggerEvent;

/// 期待するBearerトークンの環境変数名
pub const E5E_TOKEN_ENV: &str = "GOANXIO_E5E_TOKEN";

/// 認可ヘッダー名
const AUTHORIZATION_HEADER: &str = "authorization";

/// 受け付ける認証スキーム
const BEARER_SCHEME: &str = "Bearer";

/// Authorizationヘッダー値からBearerクレデンシャルを取り出す
///
/// `<scheme> <credential>`のちょうど2要素で構成され、スキームが`Bearer`と
/// 完全一致する場合のみクレデンシャル部分を返す。空白をさらに含む値は拒否し、
/// クレデンシャルは加工しない。
///
/// # Examples
/// ```
/// use rebuild_trigger::domain::parse_bearer;
///
/// assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
/// assert_eq!(parse_bearer("Basic abc"), None);
/// assert_eq!(parse_bearer("Bearer"), None);
/// assert_eq!(parse_bearer("Bearer a b"), None);
/// ```
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, credential) = header.split_once(' ')?;
    (scheme == BEARER_SCHEME && !credential.contains(' ')).then_some(credential)
}

/// Bearerトークン認証器
///
/// プロセス設定のシークレットを保持する。
/// シークレットが未設定または空の場合はすべてのリクエストを拒否する。
#[derive(Clone)]
pub struct BearerAuthenticator {
    secret: Option<String>,
}

impl std::fmt::Debug for BearerAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthenticator")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl BearerAuthenticator {
    /// 新しい認証器を作成
    ///
    /// # Arguments
    /// * `secret` - 期待するトークン（Noneなら全拒否）
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// 環境変数`GOANXIO_E5E_TOKEN`から認証器を作成
    ///
    /// 未設定でもエラーにはせず、全拒否の認証器を返す。
    pub fn from_env() -> Self {
        let secret = std::env::var(E5E_TOKEN_ENV).ok();
        if secret.as_deref().is_none_or(str::is_empty) {
            tracing::warn!(env = E5E_TOKEN_ENV, "認証トークンが未設定のため全リクエストを拒否します");
        }
        Self::new(secret)
    }

    /// 有効なシークレットが設定されているか
    pub fn is_configured(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// イベントを認証
    ///
    /// # Returns
    /// Bearerトークンがシークレットと一致した場合のみ`true`
    pub fn authenticate(&self, event: &TriggerEvent) -> bool {
        // 空のシークレットは未設定扱い（空の`Bearer `ヘッダーを通さない）
        let Some(secret) = self.secret.as_deref().filter(|s| !s.is_empty()) else {
            tracing::warn!("認証に失敗しました");
            return false;
        };

        let authenticated = event
            .header(AUTHORIZATION_HEADER)
            .and_then(parse_bearer)
            .is_some_and(|credential| credential == secret);

        if !authenticated {
            // どの検査で失敗したかはログにも残さない
            tracing::warn!("認証に失敗しました");
        }

        authenticated
    }
}
