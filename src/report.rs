//! Progress reporting. Every operation takes a [`Reporter`] explicitly
//! instead of writing to a global logger, so callers decide where the
//! messages end up.

use log::{debug, info, warn};

pub trait Reporter {
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn debug(&self, message: &str) {
        debug!("{}", message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
    }
}
