// GitHub repository_dispatch呼び出し設定
//
// GitHub APIへの接続先とクレデンシャルを管理

use thiserror::Error;

/// GitHubトークンの環境変数名
pub const GITHUB_TOKEN_ENV: &str = "GOANXIO_TOKEN";

/// repository_dispatchエンドポイント（go.anx.ioリポジトリ）
pub const DEFAULT_DISPATCH_URL: &str = "https://api.github.com/repos/anexia/go.anx.io/dispatches";

/// Basic認証のユーザー名（トークン発行元のGitHubアカウント）
pub const DISPATCH_USER: &str = "anx-release";

/// Dispatch設定エラー
#[derive(Debug, Error)]
pub enum DispatchConfigError {
    /// 必須の環境変数が設定されていない
    #[error("必須の環境変数が設定されていません: {0}")]
    MissingEnvVar(String),
}

/// repository_dispatch呼び出しの設定
///
/// # フィールド
/// - `endpoint`: dispatchエンドポイントURL
/// - `username`: Basic認証ユーザー名
/// - `token`: GitHubトークン（Basic認証パスワード）
#[derive(Clone)]
pub struct DispatchConfig {
    endpoint: String,
    username: String,
    token: String,
}

impl std::fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl DispatchConfig {
    /// デフォルトのエンドポイントとユーザー名で設定を作成
    ///
    /// # 引数
    /// - `token`: GitHubトークン
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_DISPATCH_URL.to_string(),
            username: DISPATCH_USER.to_string(),
            token: token.into(),
        }
    }

    /// エンドポイントを差し替える
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `GOANXIO_TOKEN`: GitHubトークン（必須）
    ///
    /// # 戻り値
    /// - `Ok(DispatchConfig)`: 設定が正常に読み込まれた
    /// - `Err(DispatchConfigError)`: 必須の環境変数が設定されていない
    pub fn from_env() -> Result<Self, DispatchConfigError> {
        let token = std::env::var(GITHUB_TOKEN_ENV)
            .map_err(|_| DispatchConfigError::MissingEnvVar(GITHUB_TOKEN_ENV.to_string()))?;

        Ok(Self::new(token))
    }

    /// エンドポイントURLを取得
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Basic認証ユーザー名を取得
    pub fn username(&self) -> &str {
        &self.username
    }

    /// GitHubトークンを取得
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // ==================== DispatchConfig テスト ====================

    #[test]
    fn test_new_uses_fixed_endpoint_and_user() {
        let config = DispatchConfig::new("test-token");

        assert_eq!(
            config.endpoint(),
            "https://api.github.com/repos/anexia/go.anx.io/dispatches"
        );
        assert_eq!(config.username(), "anx-release");
        assert_eq!(config.token(), "test-token");
    }

    #[test]
    fn test_with_endpoint_overrides_url() {
        let config = DispatchConfig::new("token").with_endpoint("http://127.0.0.1:9999/dispatches");

        assert_eq!(config.endpoint(), "http://127.0.0.1:9999/dispatches");
        assert_eq!(config.username(), "anx-release");
    }

    #[test]
    fn test_debug_hides_token() {
        let config = DispatchConfig::new("super-secret-token");
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("DispatchConfig"));
        assert!(debug_str.contains("anx-release"));
        assert!(!debug_str.contains("super-secret-token"));
    }

    #[test]
    #[serial(goanxio_env)]
    fn test_from_env_success() {
        // 環境変数を設定 (Rust 2024ではunsafe)
        unsafe {
            std::env::set_var("GOANXIO_TOKEN", "gh-token-from-env");
        }

        let config = DispatchConfig::from_env().expect("設定の読み込みに失敗");

        assert_eq!(config.token(), "gh-token-from-env");
        assert_eq!(config.endpoint(), DEFAULT_DISPATCH_URL);

        // クリーンアップ
        unsafe {
            std::env::remove_var("GOANXIO_TOKEN");
        }
    }

    #[test]
    #[serial(goanxio_env)]
    fn test_from_env_missing_token() {
        unsafe {
            std::env::remove_var("GOANXIO_TOKEN");
        }

        let result = DispatchConfig::from_env();

        assert!(result.is_err());
        match result.unwrap_err() {
            DispatchConfigError::MissingEnvVar(var) => {
                assert_eq!(var, "GOANXIO_TOKEN");
            }
        }
    }

    // ==================== DispatchConfigError テスト ====================

    #[test]
    fn test_error_display() {
        let error = DispatchConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert!(error.to_string().contains("TEST_VAR"));
        assert!(error.to_string().contains("環境変数"));
    }
}
