//! Static route table for the console.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Page rendered for a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
    Users,
    Scripts,
    Tasks,
    Reports,
    Settings,
}

impl View {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Dashboard => "dashboard",
            Self::Users => "users",
            Self::Scripts => "scripts",
            Self::Tasks => "tasks",
            Self::Reports => "reports",
            Self::Settings => "settings",
        }
    }
}

/// What a matched path resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    View(View),
    /// Unconditional redirect, applied before the guard runs.
    Redirect(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub target: Target,
    /// `None` is treated as `Some(true)` by the guard.
    pub requires_auth: Option<bool>,
}

impl Route {
    #[must_use]
    pub const fn view(path: &'static str, view: View, requires_auth: Option<bool>) -> Self {
        Self { path, target: Target::View(view), requires_auth }
    }

    #[must_use]
    pub const fn redirect(path: &'static str, to: &'static str) -> Self {
        Self { path, target: Target::Redirect(to), requires_auth: None }
    }

    #[must_use]
    pub fn view_kind(&self) -> Option<View> {
        match self.target {
            Target::View(view) => Some(view),
            Target::Redirect(_) => None,
        }
    }
}

/// Ordered list of routes. First exact match wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The console's routes: `/` bounces to the dashboard, `/login` is the
    /// only page open to anonymous users.
    #[must_use]
    pub fn console() -> Self {
        Self::new(vec![
            Route::redirect(ROOT_PATH, DASHBOARD_PATH),
            Route::view(LOGIN_PATH, View::Login, Some(false)),
            Route::view(DASHBOARD_PATH, View::Dashboard, Some(true)),
            Route::view("/users", View::Users, Some(true)),
            Route::view("/scripts", View::Scripts, Some(true)),
            Route::view("/tasks", View::Tasks, Some(true)),
            Route::view("/reports", View::Reports, Some(true)),
            Route::view("/settings", View::Settings, Some(true)),
        ])
    }

    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Route> {
        let path = normalize_path(path);
        self.routes.iter().find(|route| route.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::console()
    }
}

/// Strip query, fragment and trailing slashes; always start with `/`.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let trimmed = raw[..end].trim().trim_end_matches('/');
    if trimmed.is_empty() {
        ROOT_PATH.to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

/// True for the login page and anything nested beneath it.
#[must_use]
pub fn is_login_path(path: &str) -> bool {
    let path = normalize_path(path);
    path == LOGIN_PATH || path.starts_with("/login/")
}
