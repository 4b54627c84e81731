//! CSRF cookie pre-flight.

use reqwest::Url;

use crate::{client::HttpTransport, config::Endpoint, error::SessionError};

/// Issues the pre-flight GET that makes the backend set `XSRF-TOKEN`.
///
/// Borrowed from a [`SessionManager`](crate::SessionManager) via
/// [`csrf()`](crate::SessionManager::csrf); shares its cookie jar.
#[derive(Debug, Clone, Copy)]
pub struct CsrfCoordinator<'m> {
    transport: &'m HttpTransport,
}

impl<'m> CsrfCoordinator<'m> {
    pub(crate) const fn new(transport: &'m HttpTransport) -> Self {
        Self { transport }
    }

    /// Requests a fresh CSRF cookie and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns whatever the pre-flight request failed with; callers must not
    /// send the dependent request in that case.
    pub async fn prime(&self) -> Result<(), SessionError> {
        tracing::debug!("priming CSRF cookie");
        self.transport.get(Endpoint::CsrfCookie, None).await?;
        if self.xsrf_token().is_none() {
            tracing::debug!("CSRF pre-flight succeeded but set no XSRF-TOKEN cookie");
        }
        Ok(())
    }

    /// Decoded `XSRF-TOKEN` value the next mutating request will echo
    #[must_use]
    pub fn xsrf_token(&self) -> Option<String> {
        let url = Url::parse(self.transport.config().api_url()).ok()?;
        self.transport.xsrf_token(&url)
    }
}
