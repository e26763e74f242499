use std::{
    io::Write,
    path::PathBuf,
    time::{Duration, Instant},
};

use tracing::debug;

use wallclock_proto::{DisplayPanel, RefreshError, TIME_LABEL_PLACEHOLDER};

use super::config::DisplayConfig;

/// A character panel backed by a writable device path.
///
/// The panel hardware enforces a minimum interval between refreshes. We track
/// that interval host-side and report [`RefreshError::TooSoon`] instead of
/// writing, so callers can retry on the state machine's schedule rather than
/// having writes silently dropped by the device.
pub struct TextPanel {
    path: PathBuf,
    contents: String,
    min_refresh_interval: Duration,
    last_refresh: Option<Instant>,
}

impl TextPanel {
    /// Open the panel and show the placeholder frame.
    ///
    /// The placeholder write also primes the refresh clock, so the first real
    /// time label is subject to the hardware interval like any other frame.
    pub fn create(config: &DisplayConfig) -> Result<Self, std::io::Error> {
        let mut panel = TextPanel {
            path: config.device.clone(),
            contents: format!("Time: {TIME_LABEL_PLACEHOLDER}"),
            min_refresh_interval: Duration::from_secs(config.min_refresh_interval),
            last_refresh: None,
        };

        panel.write_frame()?;
        panel.last_refresh = Some(Instant::now());

        Ok(panel)
    }

    fn write_frame(&mut self) -> Result<(), std::io::Error> {
        let mut device = std::fs::File::create(&self.path)?;
        device.write_all(self.contents.as_bytes())?;
        device.flush()?;
        debug!(path = ?self.path, contents = %self.contents, "wrote panel frame");
        Ok(())
    }

    #[cfg(test)]
    fn read_back(path: &std::path::Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }
}

impl DisplayPanel for TextPanel {
    type Error = std::io::Error;

    fn set_time_text(&mut self, text: &str) -> Result<(), Self::Error> {
        self.contents = text.to_string();
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), RefreshError<Self::Error>> {
        if let Some(last) = self.last_refresh {
            if last.elapsed() < self.min_refresh_interval {
                return Err(RefreshError::TooSoon);
            }
        }

        self.write_frame().map_err(RefreshError::Device)?;
        self.last_refresh = Some(Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(name: &str, min_refresh_interval: u64) -> DisplayConfig {
        let mut path = std::env::temp_dir();
        path.push(format!("wallclock-panel-{name}-{}", std::process::id()));
        DisplayConfig {
            device: path,
            update_interval: 60,
            min_refresh_interval,
        }
    }

    #[test]
    fn create_writes_placeholder() {
        let config = test_config("placeholder", 0);
        let panel = TextPanel::create(&config).unwrap();

        assert_eq!(TextPanel::read_back(&panel.path), "Time: --:--");
        std::fs::remove_file(&config.device).unwrap();
    }

    #[test]
    fn refresh_writes_latest_text() {
        let config = test_config("refresh", 0);
        let mut panel = TextPanel::create(&config).unwrap();

        panel.set_time_text("Time: 01:30 PM").unwrap();
        panel.refresh().unwrap();

        assert_eq!(TextPanel::read_back(&panel.path), "Time: 01:30 PM");
        std::fs::remove_file(&config.device).unwrap();
    }

    #[test]
    fn refresh_within_interval_is_rejected() {
        let config = test_config("toosoon", 3600);
        let mut panel = TextPanel::create(&config).unwrap();

        panel.set_time_text("Time: 01:30 PM").unwrap();
        let result = panel.refresh();
        assert!(matches!(result, Err(RefreshError::TooSoon)));

        // the rejected frame must not reach the device
        assert_eq!(TextPanel::read_back(&panel.path), "Time: --:--");
        std::fs::remove_file(&config.device).unwrap();
    }
}
