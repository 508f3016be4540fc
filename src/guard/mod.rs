//! Permission gate shared by route guards and element visibility.

use crate::session::SessionState;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";
pub const NO_PERMISSION_ROUTE: &str = "/no-permission-page";

/// Permissions that each unlock a route or element; any one of them is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement(Vec<String>);

impl Requirement {
    pub fn any_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(permissions.into_iter().map(Into::into).collect())
    }

    pub fn permissions(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the requirement is empty or shares a permission with `granted`.
    pub fn is_satisfied_by(&self, granted: &[String]) -> bool {
        self.0.is_empty() || self.0.iter().any(|p| granted.contains(p))
    }
}

impl From<&str> for Requirement {
    fn from(permission: &str) -> Self {
        Self(vec![permission.to_string()])
    }
}

impl From<&[&str]> for Requirement {
    fn from(permissions: &[&str]) -> Self {
        Self::any_of(permissions.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(&'static str),
    /// The session is still being restored; show a loading indicator.
    Pending,
}

/// Decides whether a protected route or element may render.
pub fn authorize(state: &SessionState, requirement: Option<&Requirement>) -> Access {
    match state {
        SessionState::Unknown => Access::Pending,
        SessionState::Anonymous => Access::Redirect(LOGIN_ROUTE),
        SessionState::Authenticated(session) => match requirement {
            Some(r) if !r.is_satisfied_by(&session.user.permissions) => {
                Access::Redirect(NO_PERMISSION_ROUTE)
            }
            _ => Access::Allow,
        },
    }
}

/// Gate for pages only anonymous visitors should see, such as the login form.
pub fn authorize_public_only(state: &SessionState) -> Access {
    match state {
        SessionState::Unknown => Access::Pending,
        SessionState::Anonymous => Access::Allow,
        SessionState::Authenticated(_) => Access::Redirect(HOME_ROUTE),
    }
}

/// Visibility of a menu entry or action button.
pub fn can(state: &SessionState, requirement: &Requirement) -> bool {
    authorize(state, Some(requirement)) == Access::Allow
}
