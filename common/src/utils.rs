// common/src/utils.rs
use chrono::{Local, NaiveDateTime};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Setup tracing for the client.
///
/// Output goes to stderr so command output on stdout stays clean.
pub fn setup_tracing(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        // Already installed, e.g. by a test harness
        tracing::debug!("Tracing subscriber not installed: {}", e);
    }
}

/// Current wall-clock time in the viewer's local time zone
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
