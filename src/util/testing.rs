use std::env;
use std::sync::Once;

use toml::Value;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::Tree;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Tree parsed from a TOML fixture.
///
/// Panics on malformed TOML; only meant for tests.
pub fn tree(source: &str) -> Tree {
    toml::from_str(source).unwrap_or_else(|e| panic!("invalid TOML fixture: {e}\n{source}"))
}

/// Plain value parsed from a TOML fixture of the form `value = ...`.
pub fn value(source: &str) -> Value {
    let mut table: toml::Table = toml::from_str(&format!("value = {source}"))
        .unwrap_or_else(|e| panic!("invalid TOML value fixture: {e}\n{source}"));
    table
        .remove("value")
        .expect("fixture always has a value key")
}
