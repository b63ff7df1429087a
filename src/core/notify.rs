use std::time::Duration;

use log::warn;

use crate::core::error::FlowError;

pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

pub trait Notifier {
    fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<(), FlowError>;
}

pub fn notify_best_effort(notifier: &dyn Notifier, title: &str, message: &str) {
    if let Err(err) = notifier.notify(title, message, NOTIFY_TIMEOUT) {
        warn!("{err}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    #[cfg(windows)]
    fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<(), FlowError> {
        use winrt_notification::{Duration as ToastDuration, Toast};

        let duration = if timeout > Duration::from_secs(7) {
            ToastDuration::Long
        } else {
            ToastDuration::Short
        };

        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(title)
            .text1(message)
            .duration(duration)
            .show()
            .map_err(delivery_error)
    }

    #[cfg(not(windows))]
    fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<(), FlowError> {
        notify_rust::Notification::new()
            .appname("pdfflow")
            .summary(title)
            .body(message)
            .timeout(desktop_timeout(timeout))
            .show()
            .map(|_| ())
            .map_err(delivery_error)
    }
}

#[cfg(not(windows))]
fn desktop_timeout(timeout: Duration) -> notify_rust::Timeout {
    let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
    notify_rust::Timeout::Milliseconds(millis)
}

fn delivery_error(err: impl std::fmt::Display) -> FlowError {
    FlowError::Notification {
        message: err.to_string(),
    }
}
