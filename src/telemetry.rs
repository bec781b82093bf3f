//! Log setup for the player.
//!
//! `LOG_LEVEL` takes any `EnvFilter` directive string. Without it the player
//! logs its own targets at debug: "course_player" for the server shell and
//! "course" for loading and progress. `LOG_FORMAT=json` switches to one JSON
//! object per event; anything else prints human-readable lines.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,course=debug,course_player=debug,tower_http=info,axum=info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn wants_json(format: Option<&str>) -> bool {
    matches!(format.map(str::trim), Some(f) if f.eq_ignore_ascii_case("json"))
}

pub fn init_tracing() {
    let format = std::env::var("LOG_FORMAT").ok();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if wants_json(format.as_deref()) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
