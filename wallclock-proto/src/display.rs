//! Display-side logic: 12-hour label formatting, the panel interface, and
//! the refresh retry state machine.
//!
//! The state machine is deliberately explicit (rather than a catch-and-loop)
//! so the daemon can drive it with an injectable sleep and tests can step it
//! without real delays.

use std::time::Duration;

use thiserror::Error;

/// Initial panel text, before the first update cycle has run.
pub const TIME_LABEL_PLACEHOLDER: &str = "--:--";

/// Fixed backoff before retrying a refresh the hardware rejected as too
/// early.
pub const REFRESH_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Format an RTC hour/minute pair as the display label: zero padded
/// 12-hour time with an AM/PM marker, `HH:MM AM`.
pub fn format_time_label(hour: u8, minute: u8) -> String {
    let (hour12, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{hour12:02}:{minute:02} {meridiem}")
}

/// A refresh attempt failed.
#[derive(Debug, Error)]
pub enum RefreshError<E>
where
    E: std::error::Error + 'static,
{
    /// The hardware enforces a minimum interval between refreshes and this
    /// attempt came too early. Retryable: wait and try again.
    #[error("display refreshed too soon")]
    TooSoon,
    /// Any other device fault. Never retried.
    #[error("display device fault")]
    Device(#[source] E),
}

/// Interface to the physical display.
///
/// The panel owns exactly one piece of software-visible state this core
/// touches: its time text, created once with [`TIME_LABEL_PLACEHOLDER`] and
/// overwritten every update cycle.
pub trait DisplayPanel {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Replace the time text. Takes effect on the next successful refresh.
    fn set_time_text(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Push the current contents to the physical display.
    fn refresh(&mut self) -> Result<(), RefreshError<Self::Error>>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RefreshState {
    /// An attempt may be made.
    Pending,
    /// The display accepted the refresh; the cycle is done.
    Succeeded,
    /// The hardware asked us to wait; rearm after the retry delay.
    RetryWait,
}

/// What the caller should do after feeding an attempt outcome.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RefreshAction {
    /// Refresh landed, leave the loop.
    Done,
    /// Sleep this long, call [`RefreshDriver::rearm`], try again.
    Wait(Duration),
}

/// Drives refresh attempts until one lands.
///
/// There is no attempt limit: the hardware enforces its own minimum refresh
/// interval and will eventually permit a refresh. Only the specific
/// "too soon" condition is retried; every other
/// fault propagates out of [`handle_attempt`](Self::handle_attempt)
/// untouched.
#[derive(Debug, Default)]
pub struct RefreshDriver {
    state: RefreshState,
}

impl Default for RefreshState {
    fn default() -> Self {
        RefreshState::Pending
    }
}

impl RefreshDriver {
    pub fn new() -> Self {
        RefreshDriver {
            state: RefreshState::Pending,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Feed the outcome of one physical refresh attempt.
    pub fn handle_attempt<E>(
        &mut self,
        outcome: Result<(), RefreshError<E>>,
    ) -> Result<RefreshAction, E>
    where
        E: std::error::Error + 'static,
    {
        match outcome {
            Ok(()) => {
                self.state = RefreshState::Succeeded;
                Ok(RefreshAction::Done)
            }
            Err(RefreshError::TooSoon) => {
                self.state = RefreshState::RetryWait;
                Ok(RefreshAction::Wait(REFRESH_RETRY_DELAY))
            }
            Err(RefreshError::Device(e)) => Err(e),
        }
    }

    /// Return to [`RefreshState::Pending`] once the retry delay has elapsed.
    pub fn rearm(&mut self) {
        debug_assert_eq!(self.state, RefreshState::RetryWait);
        self.state = RefreshState::Pending;
    }
}
