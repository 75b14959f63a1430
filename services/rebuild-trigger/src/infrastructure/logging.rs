/// ログ基盤モジュール
///
/// 関数実行環境・HTTPサーバー向けの構造化ログ設定を提供する。
/// 1イベント1行のJSONで出力し、フィールドはトップレベルに展開する。
use std::sync::Once;

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter,
    Layer,
};

/// ログサブスクライバー初期化用の同期プリミティブ
static INIT: Once = Once::new();

/// 本番用のJSONレイヤーを構築
fn json_layer<S, W>(make_writer: W) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true)
        .with_current_span(false)
        .with_writer(make_writer)
}

/// JSON形式のログサブスクライバーを初期化する
///
/// `RUST_LOG`が未設定ならinfoレベル。2回目以降の呼び出しは何もしない。
///
/// # 使用例
/// ```ignore
/// use rebuild_trigger::infrastructure::init_logging;
///
/// init_logging();
/// tracing::info!("trigger function started");
/// ```
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // 他のサブスクライバーが設定済みでもパニックさせない
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer(std::io::stdout))
            .try_init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}
