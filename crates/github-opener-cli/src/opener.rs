use tracing::{debug, warn};

/// Side effect run when a repository row is selected.
pub trait UrlOpener {
    fn open(&self, url: &str);
}

/// Hands the URL to the desktop's default handler, or to a specific
/// application when one is configured. The launch is detached and its
/// outcome only logged.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener {
    app: Option<String>,
}

impl SystemOpener {
    pub fn new(app: Option<String>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }
}

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) {
        let launched = match &self.app {
            Some(app) => open::with_detached(url, app.as_str()),
            None => open::that_detached(url),
        };

        match launched {
            Ok(()) => debug!(app = ?self.app, url, "launched opener"),
            Err(error) => warn!(app = ?self.app, %error, url, "failed to launch opener"),
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::cell::RefCell;

    use super::UrlOpener;

    #[derive(Debug, Default)]
    pub struct RecordingOpener {
        pub opened: RefCell<Vec<String>>,
    }

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) {
            self.opened.borrow_mut().push(url.to_string());
        }
    }
}
