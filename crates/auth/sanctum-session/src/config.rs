use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default route that sets the `XSRF-TOKEN` cookie
pub const DEFAULT_CSRF_COOKIE_ROUTE: &str = "sanctum/csrf-cookie";
/// Default sign-in route
pub const DEFAULT_SIGN_IN_ROUTE: &str = "login";
/// Default sign-up route
pub const DEFAULT_SIGN_UP_ROUTE: &str = "register";
/// Default sign-out route
pub const DEFAULT_SIGN_OUT_ROUTE: &str = "logout";
/// Default forgot-password route
pub const DEFAULT_FORGOT_PASSWORD_ROUTE: &str = "forgot-password";
/// Default reset-password route
pub const DEFAULT_RESET_PASSWORD_ROUTE: &str = "reset-password";
/// Default "current user" route
pub const DEFAULT_USER_OBJECT_ROUTE: &str = "api/user";

/// Named backend endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// CSRF cookie pre-flight
    CsrfCookie,
    /// Credential submission
    SignIn,
    /// Account registration
    SignUp,
    /// Session termination
    SignOut,
    /// Password reset request
    ForgotPassword,
    /// Password reset completion
    ResetPassword,
    /// Current user record
    UserObject,
}

impl Endpoint {
    /// All endpoints, in declaration order
    pub const ALL: [Self; 7] = [
        Self::CsrfCookie,
        Self::SignIn,
        Self::SignUp,
        Self::SignOut,
        Self::ForgotPassword,
        Self::ResetPassword,
        Self::UserObject,
    ];

    /// Configuration key naming this endpoint's route
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::CsrfCookie => "csrfCookieRoute",
            Self::SignIn => "signInRoute",
            Self::SignUp => "signUpRoute",
            Self::SignOut => "signOutRoute",
            Self::ForgotPassword => "forgotPasswordRoute",
            Self::ResetPassword => "resetPasswordRoute",
            Self::UserObject => "userObjectRoute",
        }
    }
}

/// What happens to the persisted token when signing out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignOutTokenPolicy {
    /// Never touch the stored token
    Keep,
    /// Clear the stored token once the backend confirms the sign-out
    #[default]
    ClearOnSuccess,
    /// Clear the stored token whatever the backend answers
    ClearAlways,
}

/// Backend location and route table.
///
/// Supplied once when the session manager is built and read-only afterwards.
/// Serializes with the camelCase keys SPA hosts already use
/// (`apiUrl`, `csrfCookieRoute`, ..., `checkOnInit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    api_url: String,
    #[serde(default = "default_csrf_cookie_route")]
    csrf_cookie_route: String,
    #[serde(default = "default_sign_in_route")]
    sign_in_route: String,
    #[serde(default = "default_sign_up_route")]
    sign_up_route: String,
    #[serde(default = "default_sign_out_route")]
    sign_out_route: String,
    #[serde(default = "default_forgot_password_route")]
    forgot_password_route: String,
    #[serde(default = "default_reset_password_route")]
    reset_password_route: String,
    #[serde(default = "default_user_object_route")]
    user_object_route: String,
    #[serde(default = "default_check_on_init")]
    check_on_init: bool,
    #[serde(default)]
    sign_out_token_policy: SignOutTokenPolicy,
}

fn default_csrf_cookie_route() -> String {
    DEFAULT_CSRF_COOKIE_ROUTE.into()
}
fn default_sign_in_route() -> String {
    DEFAULT_SIGN_IN_ROUTE.into()
}
fn default_sign_up_route() -> String {
    DEFAULT_SIGN_UP_ROUTE.into()
}
fn default_sign_out_route() -> String {
    DEFAULT_SIGN_OUT_ROUTE.into()
}
fn default_forgot_password_route() -> String {
    DEFAULT_FORGOT_PASSWORD_ROUTE.into()
}
fn default_reset_password_route() -> String {
    DEFAULT_RESET_PASSWORD_ROUTE.into()
}
fn default_user_object_route() -> String {
    DEFAULT_USER_OBJECT_ROUTE.into()
}
const fn default_check_on_init() -> bool {
    true
}

impl RouteConfig {
    /// Creates a configuration for `api_url` with the conventional Sanctum routes
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            csrf_cookie_route: default_csrf_cookie_route(),
            sign_in_route: default_sign_in_route(),
            sign_up_route: default_sign_up_route(),
            sign_out_route: default_sign_out_route(),
            forgot_password_route: default_forgot_password_route(),
            reset_password_route: default_reset_password_route(),
            user_object_route: default_user_object_route(),
            check_on_init: default_check_on_init(),
            sign_out_token_policy: SignOutTokenPolicy::default(),
        }
    }

    /// Sets the API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the route for one endpoint
    #[must_use]
    pub fn with_route(mut self, endpoint: Endpoint, route: impl Into<String>) -> Self {
        let route = route.into();
        match endpoint {
            Endpoint::CsrfCookie => self.csrf_cookie_route = route,
            Endpoint::SignIn => self.sign_in_route = route,
            Endpoint::SignUp => self.sign_up_route = route,
            Endpoint::SignOut => self.sign_out_route = route,
            Endpoint::ForgotPassword => self.forgot_password_route = route,
            Endpoint::ResetPassword => self.reset_password_route = route,
            Endpoint::UserObject => self.user_object_route = route,
        }
        self
    }

    /// Sets the CSRF cookie route
    #[must_use]
    pub fn with_csrf_cookie_route(self, route: impl Into<String>) -> Self {
        self.with_route(Endpoint::CsrfCookie, route)
    }

    /// Sets the sign-in route
    #[must_use]
    pub fn with_sign_in_route(self, route: impl Into<String>) -> Self {
        self.with_route(Endpoint::SignIn, route)
    }

    /// Sets the sign-up route
    #[must_use]
    pub fn with_sign_up_route(self, route: impl Into<String>) -> Self {
        self.with_route(Endpoint::SignUp, route)
    }

    /// Sets the sign-out route
    #[must_use]
    pub fn with_sign_out_route(self, route: impl Into<String>) -> Self {
        self.with_route(Endpoint::SignOut, route)
    }

    /// Sets the forgot-password route
    #[must_use]
    pub fn with_forgot_password_route(self, route: impl Into<String>) -> Self {
        self.with_route(Endpoint::ForgotPassword, route)
    }

    /// Sets the reset-password route
    #[must_use]
    pub fn with_reset_password_route(self, route: impl Into<String>) -> Self {
        self.with_route(Endpoint::ResetPassword, route)
    }

    /// Sets the current-user route
    #[must_use]
    pub fn with_user_object_route(self, route: impl Into<String>) -> Self {
        self.with_route(Endpoint::UserObject, route)
    }

    /// Whether mounting the distributor triggers an authentication check
    ///
    /// Default is `true`
    #[must_use]
    pub const fn with_check_on_init(mut self, check: bool) -> Self {
        self.check_on_init = check;
        self
    }

    /// Sets the sign-out token policy
    ///
    /// Default is [`SignOutTokenPolicy::ClearOnSuccess`]
    #[must_use]
    pub const fn with_sign_out_token_policy(mut self, policy: SignOutTokenPolicy) -> Self {
        self.sign_out_token_policy = policy;
        self
    }

    /// Returns the configured API base URL
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the route configured for `endpoint`
    #[must_use]
    pub fn route(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::CsrfCookie => &self.csrf_cookie_route,
            Endpoint::SignIn => &self.sign_in_route,
            Endpoint::SignUp => &self.sign_up_route,
            Endpoint::SignOut => &self.sign_out_route,
            Endpoint::ForgotPassword => &self.forgot_password_route,
            Endpoint::ResetPassword => &self.reset_password_route,
            Endpoint::UserObject => &self.user_object_route,
        }
    }

    /// Whether an authentication check runs on mount
    #[must_use]
    pub const fn check_on_init(&self) -> bool {
        self.check_on_init
    }

    /// Sign-out token policy
    #[must_use]
    pub const fn sign_out_token_policy(&self) -> SignOutTokenPolicy {
        self.sign_out_token_policy
    }

    /// Full URL for `endpoint`: `{apiUrl}/{route}` with a single separator
    #[must_use]
    pub fn url(&self, endpoint: Endpoint) -> String {
        let base = self.api_url.trim().trim_end_matches('/');
        let route = self.route(endpoint).trim().trim_start_matches('/');
        format!("{base}/{route}")
    }

    /// Checks that the base URL is an absolute http(s) URL and no route is empty.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<(), SessionError> {
        let api_url = self.api_url.trim();
        if api_url.is_empty() {
            return Err(SessionError::Config("apiUrl is required".into()));
        }
        let parsed = reqwest::Url::parse(api_url)
            .map_err(|e| SessionError::Config(format!("apiUrl '{api_url}' is invalid: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SessionError::Config(format!(
                "apiUrl '{api_url}' must use http or https"
            )));
        }

        for endpoint in Endpoint::ALL {
            if self.route(endpoint).trim().trim_matches('/').is_empty() {
                return Err(SessionError::Config(format!(
                    "{} is required",
                    endpoint.key()
                )));
            }
        }
        Ok(())
    }
}
