//! Operator notifications for failed ticks and orders.

use log::error;

/// Receives messages an operator should see.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Writes notifications to the error log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        error!("{message}");
    }
}
