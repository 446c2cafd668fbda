//! Scheduled pause before navigation.
//!
//! The success page historically held the visitor for a fixed interval
//! before sending them on. Here the pause is an explicit timer with a
//! cancellation handle, so a caller can suppress a pending redirect;
//! dropping the handle lets the timer run to completion unchanged.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time;

pub struct RedirectTimer {
    delay: Duration,
    cancelled: watch::Receiver<bool>,
}

#[derive(Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl RedirectTimer {
    pub fn new(delay: Duration) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                delay,
                cancelled: rx,
            },
            CancelHandle { tx },
        )
    }

    /// Waits out the delay. Returns `true` when the timer fired and the
    /// redirect should proceed, `false` when it was cancelled first.
    pub async fn wait(mut self) -> bool {
        if self.delay.is_zero() {
            return !*self.cancelled.borrow();
        }

        let sleep = time::sleep(self.delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                changed = self.cancelled.changed() => match changed {
                    Ok(()) if *self.cancelled.borrow() => return false,
                    Ok(()) => continue,
                    // Handle dropped without cancelling: finish the delay.
                    Err(_) => {
                        sleep.as_mut().await;
                        return true;
                    }
                },
            }
        }
    }
}
