pub mod config;
mod display;
mod panel;
mod sntp;
pub mod tracing;

use std::{error::Error, path::PathBuf, time::Duration};

use ::tracing::{error, info};
pub use config::Config;
use tokio::runtime::Builder;
use tracing_subscriber::util::SubscriberInitExt;
use wallclock_proto::{synchronize, Rtc};
use wallclock_rtc::UnixRtc;

use config::WallclockDaemonOptions;
use display::DisplayTask;
use panel::TextPanel;

use self::tracing::LogLevel;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn main() -> Result<(), Box<dyn Error>> {
    let options = WallclockDaemonOptions::try_parse_from(std::env::args())?;

    match options.action {
        config::WallclockDaemonAction::Help => {
            println!("{}", config::long_help_message());
        }
        config::WallclockDaemonAction::Version => {
            eprintln!("wallclock-daemon {VERSION}");
        }
        config::WallclockDaemonAction::Run => run(options)?,
    }

    Ok(())
}

// initializes the logger so that logs during config parsing are reported. Then it overrides the
// log level based on the config if required.
pub(crate) fn initialize_logging_parse_config(
    initial_log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
) -> Config {
    let mut log_level = initial_log_level.unwrap_or_default();

    let config_tracing = crate::daemon::tracing::tracing_init(log_level, true);
    let config = ::tracing::subscriber::with_default(config_tracing, || {
        match Config::from_args(config_path) {
            Ok(c) => c,
            Err(e) => {
                // print to stderr because tracing is not yet setup
                eprintln!("There was an error loading the config: {e}");
                std::process::exit(exitcode::CONFIG);
            }
        }
    });

    if let Some(config_log_level) = config.observability.log_level {
        if initial_log_level.is_none() {
            log_level = config_log_level;
        }
    }

    // set a default global subscriber from now on
    let tracing_inst = self::tracing::tracing_init(log_level, config.observability.ansi_colors);
    tracing_inst.init();

    config
}

fn run(options: WallclockDaemonOptions) -> Result<(), Box<dyn Error>> {
    let config = initialize_logging_parse_config(options.log_level, options.config);

    let runtime = Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(async {
        // give the user a warning that we use the command line option
        if config.observability.log_level.is_some() && options.log_level.is_some() {
            info!("Log level override from command line arguments is active");
        }

        // Warn if the config is unreasonable. We do this after finishing
        // tracing setup to ensure logging is fully configured.
        config.check();

        let utc = match sntp::fetch_utc_time(&config.time_source).await {
            Ok(utc) => utc,
            Err(e) => {
                error!(error = %e, "could not fetch the current time");
                std::process::exit(exitcode::UNAVAILABLE);
            }
        };

        let rtc = UnixRtc::new();
        let state = synchronize(utc);
        if let Err(e) = rtc.set_datetime(state) {
            error!(error = %e, "could not set the hardware clock");
            std::process::exit(exitcode::NOPERM);
        }
        info!(?utc, "hardware clock synchronized");

        let panel = match TextPanel::create(&config.display) {
            Ok(panel) => panel,
            Err(e) => {
                error!(error = %e, "could not open the display panel");
                std::process::exit(exitcode::SOFTWARE);
            }
        };

        let mut task = DisplayTask::new(
            rtc,
            panel,
            Duration::from_secs(config.display.update_interval),
        );
        let wait = tokio::time::sleep(Duration::default());
        tokio::pin!(wait);

        let fault = task.run(wait).await;
        error!(error = %fault, "display update loop ended");
        Err(fault.into())
    })
}

pub(crate) mod exitcode {
    /// A service is unavailable.  This can occur if a support
    /// program or file does not exist.  This can also be used
    /// as a catchall message when something you wanted to do
    /// doesn't work, but you don't know why.
    pub const UNAVAILABLE: i32 = 69;

    /// An internal software error has been detected.  This
    /// should be limited to non-operating system related
    /// errors as possible.
    pub const SOFTWARE: i32 = 70;

    /// You did not have sufficient permission to perform
    /// the operation.  This is not intended for file system
    /// problems, which should use `NOINPUT` or `CANTCREAT`,
    /// but rather for higher level permissions.
    pub const NOPERM: i32 = 77;

    /// Something was found in an unconfigured or misconfigured state.
    pub const CONFIG: i32 = 78;
}
