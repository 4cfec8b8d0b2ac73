use super::{Config, ConfigError};

/// Validate a parsed configuration before wiring anything up.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.dispatch.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "dispatch.url must not be empty".to_string(),
        ));
    }
    if !config.dispatch.url.starts_with("http://") && !config.dispatch.url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "dispatch.url must be an http(s) URL, got {:?}",
            config.dispatch.url
        )));
    }
    if config.dispatch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "dispatch.timeout_secs must be at least 1".to_string(),
        ));
    }

    // The retry ceiling must stay small: the service never waits, it spins
    // the full load-mutate-save cycle.
    if !(1..=10).contains(&config.service.max_save_attempts) {
        return Err(ConfigError::ValidationError(format!(
            "service.max_save_attempts must be between 1 and 10, got {}",
            config.service.max_save_attempts
        )));
    }

    if config.ingress.buffer == 0 {
        return Err(ConfigError::ValidationError(
            "ingress.buffer must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[dispatch]
url = "http://localhost:9200/jobs"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_dispatch_url_rejected() {
        let mut config = valid_config();
        config.dispatch.url = "  ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_non_http_dispatch_url_rejected() {
        let mut config = valid_config();
        config.dispatch.url = "amqp://broker/jobs".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.dispatch.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_retry_ceiling_bounds() {
        let mut config = valid_config();
        config.service.max_save_attempts = 0;
        assert!(validate_config(&config).is_err());

        config.service.max_save_attempts = 11;
        assert!(validate_config(&config).is_err());

        config.service.max_save_attempts = 10;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_ingress_buffer_rejected() {
        let mut config = valid_config();
        config.ingress.buffer = 0;
        assert!(validate_config(&config).is_err());
    }
}
