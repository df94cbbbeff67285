use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;
use std::fmt;

const PATTERN: &str = "{d(%H:%M:%S%.3f)} {l} {t} - {m}{n}";

#[derive(Debug)]
pub enum LoggingError {
    Config(log4rs::config::runtime::ConfigErrors),
    AlreadySet(log::SetLoggerError),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid logger config: {}", err),
            Self::AlreadySet(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Sends every record at `level` or above to stderr.
///
/// # Errors
/// If a global logger is already installed.
pub fn init_console_logger(level: LevelFilter) -> Result<Handle, LoggingError> {
    let stderr = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(LoggingError::Config)?;
    log4rs::init_config(config).map_err(LoggingError::AlreadySet)
}
