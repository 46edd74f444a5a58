use super::*;

impl Default for AmberConfig {
    fn default() -> Self {
        Self {
            postcode: String::new(),
            past_hours: 1,
            base_url: "https://backend.amber.com.au".to_string(),
            origin: "https://www.amber.com.au".to_string(),
            timeout_secs: 10,
            // NEM time is UTC+10 all year, which Brisbane observes
            source_timezone: "Australia/Brisbane".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/amberwatch.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            amber: AmberConfig::default(),
            poll_interval_secs: 300,
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}
