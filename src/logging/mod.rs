//! Structured logging for HTTP exchanges
//!
//! This module provides the correlation context, the event composer, the
//! sinks events are delivered to, and header normalization.

pub mod correlation;
pub mod event;
pub mod headers;
pub mod sink;

pub use correlation::{
    generate_log_id, CorrelationRecord, IdGenerator, LogContext, NoopTracer, SpanIds, Tracer,
    UuidGenerator,
};
pub use event::{
    compose_request, compose_response, LogEvent, Payload, RequestLine, Severity, TAG_CLIENT,
    TAG_SERVER, TAG_SERVER_ERROR, TAG_SERVER_PARSE_ERROR, TAG_SERVER_REQUEST, TAG_SERVER_RESPONSE,
};
pub use headers::{normalize_headers, sanitize_headers};
pub use sink::{LogSink, MemorySink, TracingSink};

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
/// The base level goes through [`LogLevel`](crate::config::LogLevel), so
/// `fatal` filters as `error` and unknown levels fall back to `info`.
///
/// # Examples
///
/// ```no_run
/// use veil::config::logging::LoggingConfig;
/// use veil::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("capture".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "warn".to_string(),
///     format: veil::config::logging::LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// let filter_str = build_filter_directives(&config);
/// assert_eq!(filter_str, "warn,veil::capture=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.log_level().as_filter().to_string();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",veil::{}={}", component, level));
        }
    }

    filter_str
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directives_base_level_only() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn test_filter_directives_fatal_maps_to_error() {
        let config = LoggingConfig {
            level: "fatal".to_string(),
            ..Default::default()
        };
        assert_eq!(build_filter_directives(&config), "error");
    }

    #[test]
    fn test_filter_directives_components_sorted() {
        let mut levels = HashMap::new();
        levels.insert("exchange".to_string(), "trace".to_string());
        levels.insert("capture".to_string(), "debug".to_string());
        let config = LoggingConfig {
            component_levels: Some(levels),
            ..Default::default()
        };
        assert_eq!(
            build_filter_directives(&config),
            "info,veil::capture=debug,veil::exchange=trace"
        );
    }
}
