//! log4rs initialization
//!
//! Console logging starts first so configuration loading is already logged.
//! The YAML file named in the configuration then replaces it; when that file
//! can not be loaded the console setup stays in place.

use log::{info, warn, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;

use crate::config::LoggingConfig;

/// Pattern shared with `server_log.yaml`; `bucket` and `key` come from the MDC.
pub const LOG_PATTERN: &str =
    "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} [{X(bucket)(-)}/{X(key)(-)}] {t} - {m}{n}";

/// Install the console logger and return the handle used to reconfigure it
pub fn init_console() -> Result<Handle, Box<dyn std::error::Error>> {
    Ok(log4rs::init_config(console_config()?)?)
}

/// Switch to the configured log4rs file, keeping the console on failure
pub fn apply_config(handle: &Handle, config: &LoggingConfig) {
    match log4rs::config::load_config_file(&config.config_file, Default::default()) {
        Ok(file_config) => {
            handle.set_config(file_config);
            info!("Logging configured from {}", config.config_file);
        }
        Err(e) => warn!("Could not load {}: {}; logging to console", config.config_file, e),
    }
}

fn console_config() -> Result<Config, Box<dyn std::error::Error>> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    Ok(config)
}
