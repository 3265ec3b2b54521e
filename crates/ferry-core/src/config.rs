//! Daemon configuration, read from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FerryError;
use crate::impls::RemoteTarget;
use crate::logs::{Instrument, InstrumentProfile, OpenRetry};
use crate::queue::RetentionPolicy;

/// Instrument name that selects the `[profile]` table instead of a built-in.
pub const CUSTOM_INSTRUMENT: &str = "custom";

/// Everything the poll loop needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FerryConfig {
    /// `orbitrap-velos`, `q-exactive` or `custom`
    pub instrument: String,

    /// Directory the instrument writes its logs into
    pub log_dir: PathBuf,

    #[serde(default = "default_queue_file")]
    pub queue_file: PathBuf,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Days a transferred entry is kept (None = the instrument's default)
    #[serde(default)]
    pub retention_days: Option<u32>,

    #[serde(default = "default_copy_tool")]
    pub copy_tool: PathBuf,

    /// Private key handed to the copy tool with `-i`
    pub identity_file: PathBuf,

    pub remote: RemoteTarget,

    #[serde(default)]
    pub log_open: LogOpenConfig,

    /// Instrument description, only for `instrument = "custom"`
    #[serde(default)]
    pub profile: Option<InstrumentProfile>,
}

/// How long to wait for a log file that is not there yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOpenConfig {
    #[serde(default = "default_open_attempts")]
    pub attempts: u32,

    #[serde(default = "default_open_delay")]
    pub delay_secs: u64,
}

impl Default for LogOpenConfig {
    fn default() -> Self {
        Self {
            attempts: default_open_attempts(),
            delay_secs: default_open_delay(),
        }
    }
}

fn default_queue_file() -> PathBuf {
    PathBuf::from("filequeue.json")
}

fn default_poll_interval() -> u64 {
    1800 // 30 min
}

fn default_copy_tool() -> PathBuf {
    PathBuf::from("scp")
}

fn default_open_attempts() -> u32 {
    11
}

fn default_open_delay() -> u64 {
    10
}

impl FerryConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, FerryError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| FerryError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&contents)
            .map_err(|e| FerryError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(contents: &str) -> Result<Self, FerryError> {
        toml::from_str(contents).map_err(|e| FerryError::Config(e.to_string()))
    }

    /// Reject configurations that could only fail later, mid-cycle.
    pub fn validate(&self) -> Result<(), FerryError> {
        for (field, value) in [
            ("remote.user", &self.remote.user),
            ("remote.host", &self.remote.host),
            ("remote.directory", &self.remote.directory),
        ] {
            if value.trim().is_empty() {
                return Err(FerryError::Config(format!("{field} must not be empty")));
            }
        }
        if self.poll_interval_secs == 0 {
            return Err(FerryError::Config("poll_interval_secs must be > 0".to_string()));
        }
        if self.log_open.attempts == 0 {
            return Err(FerryError::Config("log_open.attempts must be >= 1".to_string()));
        }
        if self.retention_days == Some(0) {
            return Err(FerryError::Config("retention_days must be >= 1".to_string()));
        }
        self.profile().map(|_| ())
    }

    /// Built-in profile by name, or the `[profile]` table for `custom`.
    pub fn profile(&self) -> Result<InstrumentProfile, FerryError> {
        if self.instrument == CUSTOM_INSTRUMENT {
            return self
                .profile
                .clone()
                .ok_or_else(|| FerryError::Config("instrument `custom` needs a [profile] table".to_string()));
        }
        let builtin = Instrument::from_str(&self.instrument)?;
        if self.profile.is_some() {
            return Err(FerryError::Config(format!(
                "[profile] is only allowed with instrument = \"{CUSTOM_INSTRUMENT}\", not `{builtin}`"
            )));
        }
        Ok(builtin.profile())
    }

    pub fn retention(&self, profile: &InstrumentProfile) -> RetentionPolicy {
        RetentionPolicy::days(self.retention_days.unwrap_or(profile.retention_days))
    }

    pub fn retry(&self) -> OpenRetry {
        OpenRetry::new(self.log_open.attempts, Duration::from_secs(self.log_open.delay_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{KeyScheme, StagePolicy};
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
        instrument = "orbitrap-velos"
        log_dir = 'C:\Xcalibur\system\Logs'
        identity_file = "/home/ferry/.ssh/id_rsa"

        [remote]
        user = "ms"
        host = "archive.example.org"
        directory = "/data/raw"
    "#;

    #[test]
    fn defaults_fill_in_optional_fields() {
        let config = FerryConfig::from_toml(MINIMAL).unwrap();

        assert_eq!(config.queue_file, PathBuf::from("filequeue.json"));
        assert_eq!(config.poll_interval(), Duration::from_secs(1800));
        assert_eq!(config.copy_tool, PathBuf::from("scp"));
        assert_eq!(config.retry(), OpenRetry::new(11, Duration::from_secs(10)));
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case("orbitrap-velos", 5)]
    #[case("q-exactive", 14)]
    fn retention_defaults_to_the_instrument(#[case] instrument: &str, #[case] days: i64) {
        let mut config = FerryConfig::from_toml(MINIMAL).unwrap();
        config.instrument = instrument.to_string();

        let profile = config.profile().unwrap();
        assert_eq!(config.retention(&profile).window(), chrono::TimeDelta::days(days));

        config.retention_days = Some(30);
        assert_eq!(config.retention(&profile).window(), chrono::TimeDelta::days(30));
    }

    #[rstest]
    #[case::empty_host(|c: &mut FerryConfig| c.remote.host = String::new())]
    #[case::blank_user(|c: &mut FerryConfig| c.remote.user = "  ".to_string())]
    #[case::empty_dir(|c: &mut FerryConfig| c.remote.directory = String::new())]
    #[case::zero_interval(|c: &mut FerryConfig| c.poll_interval_secs = 0)]
    #[case::zero_attempts(|c: &mut FerryConfig| c.log_open.attempts = 0)]
    #[case::zero_retention(|c: &mut FerryConfig| c.retention_days = Some(0))]
    #[case::custom_without_profile(|c: &mut FerryConfig| c.instrument = "custom".to_string())]
    fn invalid_configs_are_rejected(#[case] break_it: fn(&mut FerryConfig)) {
        let mut config = FerryConfig::from_toml(MINIMAL).unwrap();
        break_it(&mut config);
        assert!(matches!(config.validate(), Err(FerryError::Config(_))));
    }

    #[test]
    fn unknown_instrument_is_reported_by_name() {
        let mut config = FerryConfig::from_toml(MINIMAL).unwrap();
        config.instrument = "lumos".to_string();
        assert!(matches!(config.validate(), Err(FerryError::UnknownInstrument(name)) if name == "lumos"));
    }

    #[test]
    fn custom_instrument_reads_the_profile_table() {
        let toml = format!(
            r#"{MINIMAL}
            [profile]
            name = "Exploris"
            stages = "with-acquisition-stop"
            key_scheme = "filename"
            retention_days = 7

            [profile.layout]
            layout = "newest"
            prefix = "Exploris--"
            date_format = "%Y-%m-%d"

            [profile.line_format]
            style = "bracketed"
            timestamp_format = "%Y-%m-%d %H:%M:%S%.f"

            [profile.markers]
            opened = "Starting acquisition"
            acquisition_stopped = "Stopping acquisition"
            closed = "Storing acquisition scan"

            [profile.filename]
            rule = "after-delimiter"
            delimiter = "write "
            "#
        );
        let mut config = FerryConfig::from_toml(&toml).unwrap();
        assert!(config.profile().is_err());

        config.instrument = CUSTOM_INSTRUMENT.to_string();
        let profile = config.profile().unwrap();
        assert_eq!(profile.name, "Exploris");
        assert_eq!(profile.stages, StagePolicy::WithAcquisitionStop);
        assert_eq!(profile.key_scheme, KeyScheme::Filename);
        assert_eq!(config.retention(&profile).window(), chrono::TimeDelta::days(7));
    }

    #[test]
    fn from_file_reports_the_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"instrument = ").unwrap();

        let err = FerryConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = format!("queue_fiel = \"typo.json\"\n{MINIMAL}");
        assert!(FerryConfig::from_toml(&toml).is_err());
    }
}
