use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "debt_ledger_rs=info";

/// Installs a global fmt subscriber; `RUST_LOG` overrides the default filter.
///
/// The library never calls this itself. Repeated calls are no-ops, and a
/// subscriber installed elsewhere is left alone.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = fmt().with_env_filter(filter).try_init();
    });
}
