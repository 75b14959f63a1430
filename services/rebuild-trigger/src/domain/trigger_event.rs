// トリガーイベントとレスポンスのドメインモデル
//
// 関数実行環境から渡される呼び出しイベントと、
// 呼び出し元に返す固定形式のレスポンスを定義する。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 認証失敗時のレスポンス本文
pub const UNAUTHORIZED_MESSAGE: &str = "Authentication required";

/// 成功時のレスポンス本文
pub const OK_MESSAGE: &str = "OK";

/// HTTPトリガーで受信した呼び出しイベント
///
/// `request_headers`はヘッダー名→値のマッピング。
/// イベントのその他のフィールドは無視する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// リクエストヘッダー（存在しない場合はNone）
    #[serde(default)]
    pub request_headers: Option<HashMap<String, String>>,
}

impl TriggerEvent {
    /// ヘッダーマッピングからイベントを作成
    pub fn with_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            request_headers: Some(
                headers
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// 任意のJSON値からイベントを構築
    ///
    /// 呼び出しペイロードの形式が不正でも失敗しない。
    /// - オブジェクト以外のペイロード → ヘッダーなし
    /// - `request_headers`がオブジェクト以外 → ヘッダーなし
    /// - 文字列以外のヘッダー値 → そのヘッダーのみ無視
    pub fn from_value(value: &Value) -> Self {
        let request_headers = value
            .get("request_headers")
            .and_then(|h| h.as_object())
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|(name, v)| v.as_str().map(|v| (name.clone(), v.to_string())))
                    .collect()
            });

        Self { request_headers }
    }

    /// ヘッダー値を取得（ヘッダー名は大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        let headers = self.request_headers.as_ref()?;

        // 完全一致を優先し、見つからなければ大文字小文字を無視して探す
        headers
            .get(name)
            .or_else(|| {
                headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }
}

/// レスポンス本文の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// プレーンテキスト
    Text,
}

/// 呼び出し元に返すレスポンス
///
/// `{"status": 200, "data": "OK", "type": "text"}`形式でシリアライズされる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResponse {
    /// HTTPステータスコード
    pub status: u16,
    /// レスポンス本文
    pub data: String,
    /// 本文の種別
    #[serde(rename = "type")]
    pub response_type: ResponseType,
}

impl TriggerResponse {
    /// 401 Authentication requiredレスポンスを作成
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            data: UNAUTHORIZED_MESSAGE.to_string(),
            response_type: ResponseType::Text,
        }
    }

    /// 200 OKレスポンスを作成
    pub fn ok() -> Self {
        Self {
            status: 200,
            data: OK_MESSAGE.to_string(),
            response_type: ResponseType::Text,
        }
    }
}
