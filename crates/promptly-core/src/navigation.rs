//! Navigation capability
//!
//! Login and 401 handling "leave" the application by sending the user to
//! another URL. Hosts decide what that means: a browser shell changes the
//! location, the CLI prints the URL.

use std::sync::Mutex;
use tracing::info;

use crate::{Error, Result};

pub trait Navigator: Send + Sync {
    /// Send the user to `url`
    fn navigate(&self, url: &str) -> Result<()>;
}

/// Navigator that logs each target and remembers the history
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    history: Mutex<Vec<String>>,
}

impl LoggingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL navigated to, oldest first
    pub fn history(&self) -> Vec<String> {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<String> {
        self.history().pop()
    }
}

impl Navigator for LoggingNavigator {
    fn navigate(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.history
            .lock()
            .map_err(|e| Error::Navigation(format!("history lock poisoned: {}", e)))?
            .push(url.to_string());
        Ok(())
    }
}
