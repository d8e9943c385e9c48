/*!
 * Logging Module
 * Subscriber setup: rolling files plus console, JSON in production
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub environment: String,
    pub level: String,
    pub dir: String,
}

impl LogSettings {
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let level = std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| default_level(&environment).to_string());
        let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        Self {
            environment,
            level,
            dir,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// `RUST_LOG` wins; otherwise our crate logs at `level`.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "essay_circle_backend={},tower_http=debug,axum=debug",
                self.level
            ))
        })
    }
}

fn default_level(environment: &str) -> &'static str {
    if environment == "production" {
        "info"
    } else {
        "debug"
    }
}

/// Initialize the logging system.
///
/// The returned guards flush the non-blocking writers on drop; hold them for
/// the life of the process. A second call leaves the first subscriber in place.
pub fn init(settings: &LogSettings) -> Vec<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(&settings.dir) {
        eprintln!("cannot create log directory {}: {e}", settings.dir);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(&settings.dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&settings.dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let subscriber = tracing_subscriber::registry().with(settings.filter());

    let installed = if settings.is_production() {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!(
            environment = %settings.environment,
            level = %settings.level,
            "logging initialized"
        ),
        Err(e) => eprintln!("logging already initialized: {e}"),
    }

    vec![file_guard, error_guard, console_guard]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_by_environment() {
        assert_eq!(default_level("production"), "info");
        assert_eq!(default_level("development"), "debug");
        assert_eq!(default_level("staging"), "debug");
    }

    #[test]
    fn test_production_flag() {
        let settings = LogSettings {
            environment: "production".into(),
            level: "info".into(),
            dir: "logs".into(),
        };
        assert!(settings.is_production());
    }
}
