use super::{types::Config, ConfigError};
use crate::artwork::SourceTag;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Counts are coherent (`0 < default_count <= max_count`)
/// - Every deadline and the request timeout are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let agg = &config.aggregator;
    if agg.max_count == 0 {
        return Err(ConfigError::ValidationError(
            "aggregator.max_count must be greater than 0".to_string(),
        ));
    }
    if agg.default_count == 0 || agg.default_count > agg.max_count {
        return Err(ConfigError::ValidationError(format!(
            "aggregator.default_count must be between 1 and max_count ({})",
            agg.max_count
        )));
    }
    if agg.fast_deadline_ms == 0 || agg.slow_deadline_ms == 0 {
        return Err(ConfigError::ValidationError(
            "aggregator deadlines cannot be 0".to_string(),
        ));
    }

    for tag in SourceTag::ALL {
        if config.sources.get(tag).deadline_ms == Some(0) {
            return Err(ConfigError::ValidationError(format!(
                "sources.{}.deadline_ms cannot be 0",
                tag
            )));
        }
    }

    if config.http.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.request_timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_default_count_above_max_fails() {
        let mut config = Config::default();
        config.aggregator.default_count = 200;
        config.aggregator.max_count = 100;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_source_deadline_fails() {
        let mut config = Config::default();
        config.sources.europeana.deadline_ms = Some(0);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("sources.europeana.deadline_ms"));
    }
}
