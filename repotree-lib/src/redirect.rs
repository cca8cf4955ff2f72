//! Login redirect on authentication failure

/// Receives the login URL whenever the backend answers HTTP 401.
///
/// In the browser dashboard this was a full-page navigation. Here it is a
/// hook: the tree calls it once per rejected request and stores nothing for
/// the affected path.
pub trait LoginRedirect: Send + Sync {
    fn redirect(&self, login_url: &str);
}

impl<F> LoginRedirect for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, login_url: &str) {
        self(login_url)
    }
}

/// Logs the login URL and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect(&self, login_url: &str) {
        log::warn!("Not authenticated, log in at {}", login_url);
    }
}

/// Opens the login URL in the system browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserRedirect;

impl LoginRedirect for BrowserRedirect {
    fn redirect(&self, login_url: &str) {
        log::info!("Opening {} to log in", login_url);
        if let Err(e) = open::that(login_url) {
            log::error!("Failed to open browser for {}: {}", login_url, e);
        }
    }
}
