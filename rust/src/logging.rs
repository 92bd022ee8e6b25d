//! Subscriber setup for the app core.
//!
//! Mobile hosts get their platform log (os_log on iOS, logcat on Android) with
//! a fixed filter; desktop builds and tests log to stderr and honor `RUST_LOG`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "tapwrite_core=debug,tapwrite_ndef=info,info";

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging() {
    #[cfg(target_os = "ios")]
    {
        use tracing_subscriber::prelude::*;

        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(DEFAULT_FILTER))
            .with(tracing_oslog::OsLogger::new("com.example.tapwrite", "core"))
            .try_init();
    }

    #[cfg(target_os = "android")]
    {
        use tracing_subscriber::prelude::*;

        let _ = tracing_subscriber::registry()
            .with(paranoid_android::layer("tapwrite").with_filter(EnvFilter::new(DEFAULT_FILTER)))
            .try_init();
    }

    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
            )
            .with_writer(std::io::stderr)
            .try_init();
    }
}
