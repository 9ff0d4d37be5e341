pub use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
};

/// Installs the global subscriber, honouring `RUST_LOG` and falling back to `info`.
pub fn init() {
    init_with_default("info");
}

/// Same as [`init`] with a caller-chosen fallback directive.
///
/// Stage spans report their close events (and so their busy time) whenever
/// the active filter enables debug output.
pub fn init_with_default(default_directive: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let span_events = if reports_span_timings(&env_filter.to_string()) {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

fn reports_span_timings(directives: &str) -> bool {
    directives.contains("debug") || directives.contains("trace")
}
