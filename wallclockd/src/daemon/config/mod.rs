use std::{
    fmt::Display,
    io::ErrorKind,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use tracing::{info, warn};

use super::tracing::LogLevel;

const USAGE_MSG: &str = "\
usage: wallclock-daemon [-c PATH] [-l LOG_LEVEL]
       wallclock-daemon -h
       wallclock-daemon -v";

const DESCRIPTOR: &str = "wallclock-daemon - synchronize the device clock and display";

const HELP_MSG: &str = "Options:
  -c, --config=PATH             change the config .toml file
  -l, --log-level=LOG_LEVEL     change the log level
  -h, --help                    display this help text
  -v, --version                 display version information";

pub fn long_help_message() -> String {
    format!("{DESCRIPTOR}\n\n{USAGE_MSG}\n\n{HELP_MSG}")
}

#[derive(Debug, Default)]
pub(crate) struct WallclockDaemonOptions {
    /// Path of the configuration file
    pub config: Option<PathBuf>,
    /// Level for messages to display in logs
    pub log_level: Option<LogLevel>,
    help: bool,
    version: bool,
    pub action: WallclockDaemonAction,
}

pub enum CliArg {
    Flag(String),
    Argument(String, String),
    Rest(Vec<String>),
}

impl CliArg {
    pub fn normalize_arguments<I>(
        takes_argument: &[&str],
        takes_argument_short: &[char],
        iter: I,
    ) -> Result<Vec<Self>, String>
    where
        I: IntoIterator<Item = String>,
    {
        // the first argument is the daemon command - so we can skip it
        let mut arg_iter = iter.into_iter().skip(1);
        let mut processed = vec![];
        let mut rest = vec![];

        while let Some(arg) = arg_iter.next() {
            match arg.as_str() {
                "--" => {
                    rest.extend(arg_iter);
                    break;
                }
                long_arg if long_arg.starts_with("--") => {
                    // --config=/path/to/config.toml
                    let invalid = Err(format!("invalid option: '{long_arg}'"));

                    if let Some((key, value)) = long_arg.split_once('=') {
                        if takes_argument.contains(&key) {
                            processed.push(CliArg::Argument(key.to_string(), value.to_string()))
                        } else {
                            invalid?
                        }
                    } else if takes_argument.contains(&long_arg) {
                        if let Some(next) = arg_iter.next() {
                            processed.push(CliArg::Argument(long_arg.to_string(), next))
                        } else {
                            Err(format!("'{}' expects an argument", &long_arg))?;
                        }
                    } else {
                        processed.push(CliArg::Flag(arg));
                    }
                }
                short_arg if short_arg.starts_with('-') => {
                    // split combined shorthand options
                    for (n, char) in short_arg.trim_start_matches('-').chars().enumerate() {
                        let flag = format!("-{char}");
                        // convert option argument to seperate segment
                        if takes_argument_short.contains(&char) {
                            let rest = short_arg[(n + 2)..].trim().to_string();
                            // assignment syntax is not accepted for shorthand arguments
                            if rest.starts_with('=') {
                                Err("invalid option '='")?;
                            }
                            if !rest.is_empty() {
                                processed.push(CliArg::Argument(flag, rest));
                            } else if let Some(next) = arg_iter.next() {
                                processed.push(CliArg::Argument(flag, next));
                            } else if char == 'h' {
                                // short version of --help has no arguments
                                processed.push(CliArg::Flag(flag));
                            } else {
                                Err(format!("'-{}' expects an argument", char))?;
                            }
                            break;
                        } else {
                            processed.push(CliArg::Flag(flag));
                        }
                    }
                }
                _argument => rest.push(arg),
            }
        }

        if !rest.is_empty() {
            processed.push(CliArg::Rest(rest));
        }

        Ok(processed)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum WallclockDaemonAction {
    #[default]
    Help,
    Version,
    Run,
}

impl WallclockDaemonOptions {
    const TAKES_ARGUMENT: &'static [&'static str] = &["--config", "--log-level"];
    const TAKES_ARGUMENT_SHORT: &'static [char] = &['c', 'l'];

    /// parse an iterator over command line arguments
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str> + Clone,
    {
        let mut options = WallclockDaemonOptions::default();
        let arg_iter = CliArg::normalize_arguments(
            Self::TAKES_ARGUMENT,
            Self::TAKES_ARGUMENT_SHORT,
            iter.into_iter().map(|x| x.as_ref().to_string()),
        )?
        .into_iter()
        .peekable();

        for arg in arg_iter {
            match arg {
                CliArg::Flag(flag) => match flag.as_str() {
                    "-h" | "--help" => {
                        options.help = true;
                    }
                    "-v" | "--version" => {
                        options.version = true;
                    }
                    option => {
                        Err(format!("invalid option provided: {option}"))?;
                    }
                },
                CliArg::Argument(option, value) => match option.as_str() {
                    "-c" | "--config" => {
                        options.config = Some(PathBuf::from(value));
                    }
                    "-l" | "--log-level" => match LogLevel::from_str(&value) {
                        Ok(level) => options.log_level = Some(level),
                        Err(_) => return Err("invalid log level".into()),
                    },
                    option => {
                        Err(format!("invalid option provided: {option}"))?;
                    }
                },
                CliArg::Rest(_rest) => { /* do nothing, drop remaining arguments */ }
            }
        }

        options.resolve_action();

        Ok(options)
    }

    /// from the arguments resolve which action should be performed
    fn resolve_action(&mut self) {
        if self.help {
            self.action = WallclockDaemonAction::Help;
        } else if self.version {
            self.action = WallclockDaemonAction::Version;
        } else {
            self.action = WallclockDaemonAction::Run;
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TimeSourceConfig {
    /// `host:port` of the NTP server queried once at startup
    #[serde(default = "default_time_server")]
    pub server: String,
    /// seconds to wait for the server's response
    #[serde(default = "default_fetch_timeout")]
    pub timeout: u64,
}

impl Default for TimeSourceConfig {
    fn default() -> Self {
        Self {
            server: default_time_server(),
            timeout: default_fetch_timeout(),
        }
    }
}

fn default_time_server() -> String {
    "pool.ntp.org:123".to_string()
}

const fn default_fetch_timeout() -> u64 {
    5
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DisplayConfig {
    /// device path the panel text is written to
    #[serde(default = "default_panel_device")]
    pub device: PathBuf,
    /// seconds between display updates
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
    /// the panel hardware's minimum interval between refreshes, in seconds
    #[serde(default = "default_min_refresh_interval")]
    pub min_refresh_interval: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device: default_panel_device(),
            update_interval: default_update_interval(),
            min_refresh_interval: default_min_refresh_interval(),
        }
    }
}

fn default_panel_device() -> PathBuf {
    PathBuf::from("/run/wallclock/panel")
}

const fn default_update_interval() -> u64 {
    60
}

const fn default_min_refresh_interval() -> u64 {
    5
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    #[serde(default = "default_ansi_colors")]
    pub ansi_colors: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            ansi_colors: default_ansi_colors(),
        }
    }
}

const fn default_ansi_colors() -> bool {
    true
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub time_source: TimeSourceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    fn from_file(file: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let meta = std::fs::metadata(&file)?;
        let perm = meta.permissions();

        if perm.mode() as libc::mode_t & libc::S_IWOTH != 0 {
            warn!("Unrestricted config file permissions: Others can write.");
        }

        let contents = std::fs::read_to_string(file)?;
        Ok(toml::de::from_str(&contents)?)
    }

    fn from_first_file(file: Option<impl AsRef<Path>>) -> Result<Config, ConfigError> {
        // if an explicit file is given, always use that one
        if let Some(f) = file {
            let path: &Path = f.as_ref();
            info!(?path, "using config file");
            return Config::from_file(f);
        }

        // for the global file we also ignore it when there are permission errors
        let global_path = Path::new("/etc/wallclock-rs/wallclock.toml");
        if global_path.exists() {
            info!("using config file at default location `{:?}`", global_path);
            match Config::from_file(global_path) {
                Err(ConfigError::Io(e)) if e.kind() == ErrorKind::PermissionDenied => {
                    info!("permission denied on global config file! using default config ...");
                }
                other => {
                    return other;
                }
            }
        }

        Ok(Config::default())
    }

    pub fn from_args(file: Option<impl AsRef<Path>>) -> Result<Config, ConfigError> {
        Config::from_first_file(file)
    }

    /// Check that the config is reasonable. This function may panic if the
    /// configuration is egregious, although it doesn't do so currently.
    pub fn check(&self) -> bool {
        let mut ok = true;

        if self.display.update_interval == 0 {
            warn!("Display update interval is zero; the panel will be hammered as fast as the hardware allows.");
            ok = false;
        }

        if self.time_source.timeout == 0 {
            warn!("Time source timeout is zero; the startup fetch can never succeed.");
            ok = false;
        }

        ok
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl std::error::Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error while reading config: {e}"),
            Self::Toml(e) => write!(f, "config toml parsing error: {e}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.time_source, TimeSourceConfig::default());
        assert_eq!(config.display, DisplayConfig::default());
        assert!(config.observability.log_level.is_none());

        let config: Config = toml::from_str(
            "[observability]\nlog-level = \"info\"\n[time-source]\nserver = \"time.example.org:123\"",
        )
        .unwrap();
        assert_eq!(config.observability.log_level, Some(LogLevel::Info));
        assert_eq!(config.time_source.server, "time.example.org:123");
        assert_eq!(config.time_source.timeout, 5);

        let config: Config = toml::from_str(
            r#"
            [time-source]
            server = "10.0.0.1:123"
            timeout = 2
            [display]
            device = "/dev/epd0"
            update-interval = 30
            min-refresh-interval = 3
            [observability]
            log-level = "debug"
            ansi-colors = false
            "#,
        )
        .unwrap();
        assert_eq!(config.time_source.server, "10.0.0.1:123");
        assert_eq!(config.time_source.timeout, 2);
        assert_eq!(config.display.device, PathBuf::from("/dev/epd0"));
        assert_eq!(config.display.update_interval, 30);
        assert_eq!(config.display.min_refresh_interval, 3);
        assert_eq!(config.observability.log_level, Some(LogLevel::Debug));
        assert!(!config.observability.ansi_colors);
    }

    #[test]
    fn toml_unknown_field_rejected() {
        let config: Result<Config, _> = toml::from_str("[display]\nbrightness = 3");
        assert!(config.is_err());
    }

    #[test]
    fn cli_no_arguments() {
        let arguments: [String; 0] = [];
        let parsed_empty = WallclockDaemonOptions::try_parse_from(arguments).unwrap();

        assert!(parsed_empty.config.is_none());
        assert!(parsed_empty.log_level.is_none());
        assert_eq!(parsed_empty.action, WallclockDaemonAction::Run);
    }

    #[test]
    fn cli_external_config() {
        let arguments = &["/usr/bin/wallclock-daemon", "--config", "other.toml"];
        let parsed_empty = WallclockDaemonOptions::try_parse_from(arguments).unwrap();

        assert_eq!(parsed_empty.config, Some("other.toml".into()));
        assert!(parsed_empty.log_level.is_none());
        assert_eq!(parsed_empty.action, WallclockDaemonAction::Run);

        let arguments = &["/usr/bin/wallclock-daemon", "-c", "other.toml"];
        let parsed_empty = WallclockDaemonOptions::try_parse_from(arguments).unwrap();

        assert_eq!(parsed_empty.config, Some("other.toml".into()));
        assert!(parsed_empty.log_level.is_none());
        assert_eq!(parsed_empty.action, WallclockDaemonAction::Run);
    }

    #[test]
    fn cli_log_level() {
        let arguments = &["/usr/bin/wallclock-daemon", "--log-level", "debug"];
        let parsed_empty = WallclockDaemonOptions::try_parse_from(arguments).unwrap();

        assert!(parsed_empty.config.is_none());
        assert_eq!(parsed_empty.log_level.unwrap(), LogLevel::Debug);

        let arguments = &["/usr/bin/wallclock-daemon", "-l", "debug"];
        let parsed_empty = WallclockDaemonOptions::try_parse_from(arguments).unwrap();

        assert!(parsed_empty.config.is_none());
        assert_eq!(parsed_empty.log_level.unwrap(), LogLevel::Debug);
    }

    #[test]
    fn cli_help_and_version() {
        let arguments = &["/usr/bin/wallclock-daemon", "-h"];
        let parsed = WallclockDaemonOptions::try_parse_from(arguments).unwrap();
        assert_eq!(parsed.action, WallclockDaemonAction::Help);

        let arguments = &["/usr/bin/wallclock-daemon", "-v"];
        let parsed = WallclockDaemonOptions::try_parse_from(arguments).unwrap();
        assert_eq!(parsed.action, WallclockDaemonAction::Version);
    }

    #[test]
    fn cli_rejects_unknown_option() {
        let arguments = &["/usr/bin/wallclock-daemon", "--frequency", "60"];
        assert!(WallclockDaemonOptions::try_parse_from(arguments).is_err());
    }
}
