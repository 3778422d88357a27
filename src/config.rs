//! Process configuration, read from the environment at startup.
//!
//! | Variable    | Default        | Meaning                                   |
//! |-------------|----------------|-------------------------------------------|
//! | `BIND_ADDR` | `0.0.0.0:3000` | listen address                            |
//! | `LOG_LEVEL` | `debug`        | most verbose level the log sink will emit |

use crate::logger::Level;

pub struct Config {
    pub addr: String,
    pub log_level: Level,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Panics
    ///
    /// Panics on an unrecognized `LOG_LEVEL`. A misconfigured deployment
    /// should fail at startup, not at the first suppressed entry.
    pub fn from_env() -> Self {
        let addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
        let log_level = match std::env::var("LOG_LEVEL") {
            Ok(value) => value
                .parse()
                .unwrap_or_else(|_| panic!("unrecognized LOG_LEVEL `{value}`")),
            Err(_) => Level::Debug,
        };
        Self { addr, log_level }
    }
}
