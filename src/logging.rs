//! Logging setup on top of `log` and `env_logger`.
//!
//! Levels are used as follows:
//!
//! - `error!` - failures that abort the run
//! - `warn!` - skipped files, unreadable commits, history timeouts
//! - `info!` - run progress (units found, repository opened)
//! - `debug!` - per-symbol resolution and per-unit summaries
//! - `trace!` - unused
//!
//! The CLI takes its level from `--log-level`, `LOG_LEVEL` or the config
//! file. When none of them is set it falls back to [`init_from_env`], so
//! `RUST_LOG` filters work as usual.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging with a specific level. Later calls are no-ops.
///
/// Output goes to stderr so it never mixes with JSON or SARIF on stdout.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        let mut builder = Builder::new();
        builder.filter_level(level);
        install(builder);
    });
}

/// Initialize logging from `RUST_LOG`, defaulting to `warn`.
pub fn init_from_env() {
    INIT.call_once(|| {
        install(Builder::from_env(
            env_logger::Env::default().default_filter_or("warn"),
        ));
    });
}

fn install(mut builder: Builder) {
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{:5}] {} - {}",
            record.level(),
            record.target(),
            record.args()
        )
    });
    // A logger installed by a test harness wins.
    let _ = builder.try_init();
}

/// Initialize logging for tests; safe to call repeatedly.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}
