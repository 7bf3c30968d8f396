pub mod config;
pub mod logging;
pub mod pidfile;
pub mod runtime;
pub mod signals;

pub use config::{ConfigError, GlobalConfig, RuntimeConfig, ServerSettings};
pub use logging::{LoggingError, init_logging};
pub use pidfile::{PidFile, PidFileError};
pub use runtime::{Runtime, RuntimeError};
pub use signals::StopFlag;
