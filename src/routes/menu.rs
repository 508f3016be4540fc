use crate::entity::{Action, EntityKind, descriptor};
use crate::guard::{Requirement, can};
use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub path: &'static str,
    pub requirement: Requirement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Link(MenuEntry),
    Group {
        label: &'static str,
        children: Vec<MenuEntry>,
    },
}

const SETTINGS: [EntityKind; 5] = [
    EntityKind::Brand,
    EntityKind::Year,
    EntityKind::Color,
    EntityKind::Group,
    EntityKind::Type,
];

fn entity_entry(kind: EntityKind) -> Option<MenuEntry> {
    let d = descriptor(kind);
    Some(MenuEntry {
        label: d.label,
        path: d.route?,
        requirement: d.requirement(Action::Index),
    })
}

fn open_entry(label: &'static str, path: &'static str) -> MenuEntry {
    MenuEntry {
        label,
        path,
        requirement: Requirement::default(),
    }
}

/// Sidebar entries the current session may open; empty groups are dropped.
pub fn sidebar(state: &SessionState) -> Vec<MenuItem> {
    if !state.is_authenticated() {
        return Vec::new();
    }
    let visible = |entry: &MenuEntry| can(state, &entry.requirement);

    let mut items = vec![MenuItem::Link(open_entry("Home", "/"))];
    for kind in [EntityKind::Driver, EntityKind::Car] {
        if let Some(entry) = entity_entry(kind).filter(|e| visible(e)) {
            items.push(MenuItem::Link(entry));
        }
    }

    let settings: Vec<MenuEntry> = SETTINGS
        .into_iter()
        .filter_map(entity_entry)
        .filter(|e| visible(e))
        .collect();
    if !settings.is_empty() {
        items.push(MenuItem::Group {
            label: "Settings",
            children: settings,
        });
    }

    for kind in [EntityKind::Role, EntityKind::User] {
        if let Some(entry) = entity_entry(kind).filter(|e| visible(e)) {
            items.push(MenuItem::Link(entry));
        }
    }
    items.push(MenuItem::Link(open_entry("Profile", "/profile")));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::UserRecord;
    use crate::session::Session;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn signed_in(permissions: &[&str]) -> SessionState {
        SessionState::Authenticated(Session {
            user: UserRecord {
                id: 9,
                name: "Supervisor".into(),
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

    fn paths(items: &[MenuItem]) -> Vec<&'static str> {
        items
            .iter()
            .flat_map(|item| match item {
                MenuItem::Link(e) => vec![e.path],
                MenuItem::Group { children, .. } => children.iter().map(|e| e.path).collect(),
            })
            .collect()
    }

    #[test]
    fn menu_only_lists_permitted_screens() {
        let items = sidebar(&signed_in(&["driver.index", "color.index"]));
        assert_eq!(
            paths(&items),
            ["/", "/list-drivers", "/settings/list-colors", "/profile"]
        );
    }

    #[test]
    fn settings_group_disappears_when_empty() {
        let items = sidebar(&signed_in(&["user.index"]));
        assert!(!items.iter().any(|i| matches!(i, MenuItem::Group { .. })));
        assert_eq!(paths(&items), ["/", "/list-users", "/profile"]);
    }

    #[test]
    fn no_menu_without_a_session() {
        assert!(sidebar(&SessionState::Anonymous).is_empty());
        assert!(sidebar(&SessionState::Unknown).is_empty());
    }
}
