use std::{future::Future, marker::PhantomData, pin::Pin, time::Duration};

use tokio::time::{Instant, Sleep};
use tracing::debug;

use wallclock_proto::{format_time_label, DisplayPanel, RefreshAction, RefreshDriver, Rtc};

// Trait needed to allow injecting of futures other than `tokio::time::Sleep` for testing
pub trait Wait: Future<Output = ()> {
    fn reset(self: Pin<&mut Self>, delay: Duration);
}

impl Wait for Sleep {
    fn reset(self: Pin<&mut Self>, delay: Duration) {
        self.reset(Instant::now() + delay);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError<R, P>
where
    R: std::error::Error + 'static,
    P: std::error::Error + 'static,
{
    #[error("could not read the hardware clock")]
    Rtc(#[source] R),
    #[error("could not drive the display panel")]
    Panel(#[source] P),
}

/// The periodic display update loop.
///
/// Every cycle reads the hardware clock, formats the 12-hour label and pushes
/// it to the panel, retrying on the refresh driver's schedule when the
/// hardware rejects an attempt as too early. Any other fault ends the task.
pub(crate) struct DisplayTask<C: Rtc, P: DisplayPanel, T: Wait> {
    _wait: PhantomData<T>,
    rtc: C,
    panel: P,
    update_interval: Duration,
}

impl<C, P, T> DisplayTask<C, P, T>
where
    C: Rtc,
    P: DisplayPanel,
    T: Wait,
{
    pub(crate) fn new(rtc: C, panel: P, update_interval: Duration) -> Self {
        DisplayTask {
            _wait: PhantomData,
            rtc,
            panel,
            update_interval,
        }
    }

    pub(crate) async fn run(
        &mut self,
        mut wait: Pin<&mut T>,
    ) -> DisplayError<C::Error, P::Error> {
        loop {
            if let Err(e) = self.update(wait.as_mut()).await {
                return e;
            }

            wait.as_mut().reset(self.update_interval);
            wait.as_mut().await;
        }
    }

    /// One update cycle: read the clock, set the label, refresh until the
    /// hardware accepts the frame.
    async fn update(
        &mut self,
        mut wait: Pin<&mut T>,
    ) -> Result<(), DisplayError<C::Error, P::Error>> {
        let state = self.rtc.datetime().map_err(DisplayError::Rtc)?;
        let local = state.to_wall_clock();
        let label = format_time_label(local.hour, local.minute);

        self.panel
            .set_time_text(&format!("Time: {label}"))
            .map_err(DisplayError::Panel)?;

        let mut driver = RefreshDriver::new();
        loop {
            match driver
                .handle_attempt(self.panel.refresh())
                .map_err(DisplayError::Panel)?
            {
                RefreshAction::Done => break,
                RefreshAction::Wait(delay) => {
                    wait.as_mut().reset(delay);
                    wait.as_mut().await;
                    driver.rearm();
                }
            }
        }

        debug!(%label, "panel updated");
        Ok(())
    }
}
