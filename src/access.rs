use crate::models::Role;

const DEMO_ROUTES: &[&str] = &["/notifications", "/business-insights"];

const PROTECTED_PREFIXES: &[&str] = &[
    "/quiz",
    "/dashboard",
    "/profile",
    "/nil-director",
    "/notifications",
    "/business-insights",
];

const DIRECTOR_PREFIXES: &[&str] = &[
    "/nil-director",
    "/athlete-profile",
    "/notifications",
    "/business-insights",
];

const ATHLETE_PREFIXES: &[&str] = &["/dashboard", "/profile"];

/// What is known about the visitor when a route is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    /// Signed in, but no profile row exists yet.
    Pending,
    Profiled {
        role: Role,
        onboarding_complete: bool,
    },
}

impl Session {
    pub fn from_parts(signed_in: bool, role: Option<Role>, onboarding_complete: bool) -> Self {
        match (signed_in, role) {
            (false, _) => Session::Anonymous,
            (true, None) => Session::Pending,
            (true, Some(role)) => Session::Profiled {
                role,
                onboarding_complete,
            },
        }
    }
}

fn starts_with_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

/// Decides where a request for `requested_path` should land. Returns the
/// requested path itself when access is allowed.
///
/// `demo_state` marks navigation that originated from the demo director portal,
/// which may open the notification and insight pages without signing in.
pub fn allowed_route<'a>(session: &Session, requested_path: &'a str, demo_state: bool) -> &'a str {
    if demo_state && DEMO_ROUTES.contains(&requested_path) {
        return requested_path;
    }

    match session {
        Session::Anonymous if starts_with_any(requested_path, PROTECTED_PREFIXES) => "/auth",
        Session::Anonymous | Session::Pending => requested_path,
        Session::Profiled {
            role: Role::Athlete,
            onboarding_complete: false,
        } => "/quiz",
        Session::Profiled {
            role: Role::Athlete,
            onboarding_complete: true,
        } if !starts_with_any(requested_path, ATHLETE_PREFIXES) => "/dashboard",
        Session::Profiled {
            role: Role::Director,
            ..
        } if !starts_with_any(requested_path, DIRECTOR_PREFIXES) => "/nil-director",
        Session::Profiled { .. } => requested_path,
    }
}
