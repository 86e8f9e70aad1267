//! Logging setup shared by the relay binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the shared crate, the calling package and the binary
/// itself. It can be overridden with the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "jigger-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use jigger_shared::logger::setup_logger;
///
/// setup_logger("jigger-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the fallback filter directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_crate = binary_name.replace('-', "_");
    format!(
        "{}={level},{}={level},jigger_server={level},tower_http=info",
        env!("CARGO_PKG_NAME").replace('-', "_"),
        binary_crate,
        level = default_log_level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_binary_and_server_crate() {
        // テスト項目: RUST_LOG 未設定時のフィルタにバイナリとサーバークレートが含まれる
        // given (前提条件):
        let binary_name = "jigger-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert!(filter.contains("jigger_shared=debug"));
        assert!(filter.contains("jigger_server=debug"));
        assert!(filter.contains("tower_http=info"));
    }
}
