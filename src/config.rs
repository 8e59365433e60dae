//! Runtime configuration, read from an optional [RON](https://github.com/ron-rs/ron)
//! file. Every field has a default, so a file only needs to mention what it
//! changes, e.g.
//!
//! ```ron
//! (
//!     write_interval_ms: 100,
//!     paths: (band_a: "/muse/elements/alpha_absolute"),
//! )
//! ```

use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::error::BridgeError;

/// OSC addresses for each kind of headset event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OscPaths {
    /// Four contact-quality codes, one per sensor
    pub horseshoe: String,
    /// One flag, non-zero when the band sits on the forehead
    pub touching_forehead: String,
    /// Four samples of the first band (alpha by default)
    pub band_a: String,
    /// Four samples of the second band (beta by default)
    pub band_b: String,
}

impl Default for OscPaths {
    fn default() -> Self {
        Self {
            horseshoe: "/muse/dsp/elements/horseshoe".to_owned(),
            touching_forehead: "/muse/dsp/elements/touching_forehead".to_owned(),
            band_a: "/muse/dsp/elements/alpha".to_owned(),
            band_b: "/muse/dsp/elements/beta".to_owned(),
        }
    }
}

/// How long to wait between attempts to reopen the serial link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay after the first failed attempt
    pub initial_secs: u64,
    /// Added to the delay after every further failure
    pub step_secs: u64,
    /// The delay never grows past this
    pub max_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_secs: 1,
            step_secs: 1,
            max_secs: 10,
        }
    }
}

/// Everything tunable about a run. Command-line flags win over these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum time between two frames on the serial link
    pub write_interval_ms: u64,
    /// Sleep at the end of every polling cycle
    pub poll_interval_ms: u64,
    /// Serial write timeout
    pub write_timeout_ms: u64,
    /// Serial reconnect pacing
    pub backoff: BackoffConfig,
    /// OSC addresses to listen for
    pub paths: OscPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            write_interval_ms: 50,
            poll_interval_ms: 1,
            write_timeout_ms: 10,
            backoff: BackoffConfig::default(),
            paths: OscPaths::default(),
        }
    }
}

impl Config {
    /// Loads a config file, or the defaults if no path was given.
    pub fn load(path: Option<&Path>) -> Result<Self, BridgeError> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                Ok(ron::from_str(&text)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// [`Config::write_interval_ms`] as a `Duration`.
    pub fn write_interval(&self) -> Duration {
        Duration::from_millis(self.write_interval_ms)
    }

    /// [`Config::poll_interval_ms`] as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// [`Config::write_timeout_ms`] as a `Duration`.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.write_interval(), Duration::from_millis(50));
        assert_eq!(config.paths.band_b, "/muse/dsp/elements/beta");
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(
                write_interval_ms: 100,
                backoff: (max_secs: 5),
                paths: (band_a: "/muse/elements/alpha_absolute"),
            )"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.write_interval_ms, 100);
        assert_eq!(config.poll_interval_ms, 1);
        assert_eq!(config.backoff.initial_secs, 1);
        assert_eq!(config.backoff.max_secs, 5);
        assert_eq!(config.paths.band_a, "/muse/elements/alpha_absolute");
        assert_eq!(config.paths.horseshoe, "/muse/dsp/elements/horseshoe");
    }

    #[test]
    fn test_bad_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "(write_interval_ms: \"soon\")").unwrap();
        assert!(matches!(
            Config::load(Some(file.path())),
            Err(BridgeError::ConfigError(_))
        ));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(BridgeError::IOError(_))
        ));
    }
}
