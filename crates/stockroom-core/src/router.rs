//! Route table and navigation guard.
//!
//! Routes flagged `requires_auth` are only entered after the session guard
//! confirms the session with the backend; otherwise navigation is redirected
//! to the login route.

use thiserror::Error;
use tracing::{debug, info};

use crate::auth::{AuthStatus, SessionGuard};

/// Screen shown for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    ChangeLocationSelection,
    ChangeDetectorLocation,
    ChangeCylinderLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
    pub requires_auth: bool,
}

/// Name of the route unauthenticated users are sent to
pub const LOGIN_ROUTE: &str = "Login";

pub const ROUTES: &[Route] = &[
    Route {
        path: "/",
        name: LOGIN_ROUTE,
        view: View::Login,
        requires_auth: false,
    },
    Route {
        path: "/change-location",
        name: "ChangeLocationSelection",
        view: View::ChangeLocationSelection,
        requires_auth: true,
    },
    Route {
        path: "/change-detector-location",
        name: "ChangeDetectorLocation",
        view: View::ChangeDetectorLocation,
        requires_auth: true,
    },
    Route {
        path: "/change-cylinder-location",
        name: "ChangeCylinderLocation",
        view: View::ChangeCylinderLocation,
        requires_auth: true,
    },
];

/// Result of a navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allowed(&'static Route),
    Redirected {
        from: &'static Route,
        to: &'static Route,
    },
}

impl Navigation {
    /// The route that ends up displayed
    pub fn destination(&self) -> &'static Route {
        match self {
            Navigation::Allowed(route) => route,
            Navigation::Redirected { to, .. } => to,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No route matches {0}")]
    NotFound(String),

    #[error("Login route {0} is not defined")]
    MissingLoginRoute(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Router {
    routes: &'static [Route],
}

impl Default for Router {
    fn default() -> Self {
        Self { routes: ROUTES }
    }
}

impl Router {
    pub fn new(routes: &'static [Route]) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &'static [Route] {
        self.routes
    }

    /// Match a path, ignoring query string, fragment and a trailing slash
    pub fn resolve(&self, path: &str) -> Option<&'static Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        self.routes.iter().find(|route| route.path == path)
    }

    pub fn by_name(&self, name: &str) -> Option<&'static Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    /// Navigate to `path`, checking the session first for protected routes
    pub async fn navigate(
        &self,
        session: &SessionGuard,
        path: &str,
    ) -> Result<Navigation, NavigationError> {
        let route = self
            .resolve(path)
            .ok_or_else(|| NavigationError::NotFound(path.to_string()))?;

        if !route.requires_auth {
            debug!(route = route.name, "Public route");
            return Ok(Navigation::Allowed(route));
        }

        if session.check_auth().await == AuthStatus::Authenticated {
            return Ok(Navigation::Allowed(route));
        }

        let login = self
            .by_name(LOGIN_ROUTE)
            .ok_or(NavigationError::MissingLoginRoute(LOGIN_ROUTE))?;
        info!(from = route.path, "Not authenticated, redirecting to login");
        Ok(Navigation::Redirected {
            from: route,
            to: login,
        })
    }
}
