//! Route table of the admin screens and its resolution against the session.

pub mod menu;

use std::collections::BTreeMap;

use crate::entity::{Action, EntityKind, descriptor};
use crate::guard::{self, Access, HOME_ROUTE, LOGIN_ROUTE, NO_PERMISSION_ROUTE, Requirement};
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    EntityList(EntityKind),
    CarDetail,
    DriverDetail,
    Profile,
    NoPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Only for visitors without a session.
    PublicOnly,
    Protected,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: &'static str,
    pub screen: Screen,
    pub access: RouteAccess,
    pub requirement: Option<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render {
        screen: Screen,
        params: BTreeMap<String, String>,
    },
    Redirect(String),
    Loading,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Every screen of the registry admin.
    pub fn secov() -> Self {
        let mut routes = vec![
            Route {
                pattern: LOGIN_ROUTE,
                screen: Screen::Login,
                access: RouteAccess::PublicOnly,
                requirement: None,
            },
            protected(HOME_ROUTE, Screen::Home, None),
            protected(
                "/cars/:carId/view",
                Screen::CarDetail,
                Some(index(EntityKind::Car)),
            ),
            protected(
                "/drivers/:driverId/view",
                Screen::DriverDetail,
                Some(index(EntityKind::Driver)),
            ),
            protected("/profile", Screen::Profile, None),
            protected(NO_PERMISSION_ROUTE, Screen::NoPermission, None),
        ];

        routes.extend(EntityKind::ALL.into_iter().filter_map(|kind| {
            let d = descriptor(kind);
            d.route.map(|pattern| {
                protected(
                    pattern,
                    Screen::EntityList(kind),
                    Some(d.requirement(Action::Index)),
                )
            })
        }));

        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Path of the list screen for `kind`, if it has one.
    pub fn list_path(&self, kind: EntityKind) -> Option<&'static str> {
        self.routes
            .iter()
            .find(|r| r.screen == Screen::EntityList(kind))
            .map(|r| r.pattern)
    }

    pub fn resolve(&self, path: &str, state: &SessionState) -> Navigation {
        let path = normalize(path);
        let Some((route, params)) = self
            .routes
            .iter()
            .find_map(|r| match_pattern(r.pattern, &path).map(|params| (r, params)))
        else {
            // Unknown paths fall back to home.
            return Navigation::Redirect(HOME_ROUTE.to_string());
        };

        let access = match route.access {
            RouteAccess::PublicOnly => guard::authorize_public_only(state),
            RouteAccess::Protected => guard::authorize(state, route.requirement.as_ref()),
        };

        match access {
            Access::Allow => Navigation::Render {
                screen: route.screen,
                params,
            },
            Access::Redirect(target) => {
                tracing::debug!("Redirecting {} to {}", path, target);
                Navigation::Redirect(target.to_string())
            }
            Access::Pending => Navigation::Loading,
        }
    }
}

fn protected(pattern: &'static str, screen: Screen, requirement: Option<Requirement>) -> Route {
    Route {
        pattern,
        screen,
        access: RouteAccess::Protected,
        requirement,
    }
}

fn index(kind: EntityKind) -> Requirement {
    descriptor(kind).requirement(Action::Index)
}

fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let expected: Vec<&str> = pattern.split('/').collect();
    let actual: Vec<&str> = path.split('/').collect();
    if expected.len() != actual.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (want, got) in expected.iter().zip(&actual) {
        if let Some(name) = want.strip_prefix(':') {
            if got.is_empty() {
                return None;
            }
            params.insert(name.to_string(), got.to_string());
        } else if want != got {
            return None;
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::UserRecord;
    use crate::session::Session;
    use chrono::Utc;

    fn signed_in(permissions: &[&str]) -> SessionState {
        SessionState::Authenticated(Session {
            user: UserRecord {
                id: 5,
                name: "Operador".into(),
                first_name: None,
                last_name: None,
                email: None,
                permissions: permissions.iter().map(|p| p.to_string()).collect(),
                extra: BTreeMap::new(),
            },
            token: "t".into(),
            expires_at: Utc::now(),
        })
    }

    #[test]
    fn driver_operator_cannot_open_cars() {
        let table = RouteTable::secov();
        let state = signed_in(&["driver.index"]);

        assert_eq!(
            table.resolve("/list-cars", &state),
            Navigation::Redirect(NO_PERMISSION_ROUTE.to_string())
        );
        assert_eq!(
            table.resolve("/list-drivers", &state),
            Navigation::Render {
                screen: Screen::EntityList(EntityKind::Driver),
                params: BTreeMap::new(),
            }
        );
    }

    #[test]
    fn detail_routes_capture_ids() {
        let table = RouteTable::secov();
        let state = signed_in(&["car.index"]);
        match table.resolve("/cars/42/view/", &state) {
            Navigation::Render { screen, params } => {
                assert_eq!(screen, Screen::CarDetail);
                assert_eq!(params["carId"], "42");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn loading_while_session_unknown() {
        let table = RouteTable::secov();
        assert_eq!(table.resolve("/profile", &SessionState::Unknown), Navigation::Loading);
        assert_eq!(table.resolve("/login", &SessionState::Unknown), Navigation::Loading);
    }

    #[test]
    fn login_page_bounces_signed_in_users() {
        let table = RouteTable::secov();
        assert_eq!(
            table.resolve("/login", &signed_in(&[])),
            Navigation::Redirect("/".to_string())
        );
        assert_eq!(
            table.resolve("/list-users", &SessionState::Anonymous),
            Navigation::Redirect("/login".to_string())
        );
    }

    #[test]
    fn unknown_paths_go_home() {
        let table = RouteTable::secov();
        assert_eq!(
            table.resolve("/does/not/exist", &signed_in(&[])),
            Navigation::Redirect("/".to_string())
        );
    }

    #[test]
    fn settings_lists_are_registered() {
        let table = RouteTable::secov();
        assert_eq!(table.list_path(EntityKind::Brand), Some("/settings/list-brands"));
        assert_eq!(table.list_path(EntityKind::Insurance), None);
        assert_eq!(
            table.resolve("/settings/list-years?page=2", &signed_in(&["year.index"])),
            Navigation::Render {
                screen: Screen::EntityList(EntityKind::Year),
                params: BTreeMap::new(),
            }
        );
    }
}
