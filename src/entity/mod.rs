//! Per-entity configuration driving the generic list and form screens.

mod catalog;

use std::fmt;
use std::str::FromStr;

use crate::form::rules::FormSchema;
use crate::guard::Requirement;

pub use catalog::descriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Driver,
    Car,
    Brand,
    Year,
    Color,
    Group,
    Type,
    Role,
    User,
    Insurance,
    Permit,
    Inspection,
}

impl EntityKind {
    pub const ALL: [EntityKind; 12] = [
        EntityKind::Driver,
        EntityKind::Car,
        EntityKind::Brand,
        EntityKind::Year,
        EntityKind::Color,
        EntityKind::Group,
        EntityKind::Type,
        EntityKind::Role,
        EntityKind::User,
        EntityKind::Insurance,
        EntityKind::Permit,
        EntityKind::Inspection,
    ];

    /// Plural name used on the command line and in list routes.
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Driver => "drivers",
            EntityKind::Car => "cars",
            EntityKind::Brand => "brands",
            EntityKind::Year => "years",
            EntityKind::Color => "colors",
            EntityKind::Group => "groups",
            EntityKind::Type => "types",
            EntityKind::Role => "roles",
            EntityKind::User => "users",
            EntityKind::Insurance => "insurances",
            EntityKind::Permit => "permits",
            EntityKind::Inspection => "inspections",
        }
    }

    /// Prefix of the permission names, e.g. `driver` in `driver.index`.
    pub fn permission_prefix(self) -> &'static str {
        match self {
            EntityKind::Driver => "driver",
            EntityKind::Car => "car",
            EntityKind::Brand => "brand",
            EntityKind::Year => "year",
            EntityKind::Color => "color",
            EntityKind::Group => "group",
            EntityKind::Type => "type",
            EntityKind::Role => "role",
            EntityKind::User => "user",
            EntityKind::Insurance => "insurance",
            EntityKind::Permit => "permit",
            EntityKind::Inspection => "inspection",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|k| k.slug() == wanted || k.permission_prefix() == wanted)
            .ok_or_else(|| format!("unknown entity '{s}'"))
    }
}

/// Backend resource names for one entity.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub list: String,
    pub register: String,
    pub update: String,
    pub delete: String,
    pub show: String,
}

impl Endpoints {
    /// `getXs`, `getX/{id}`, `registerX`, `updateX/{id}`, `deleteX/{id}` naming.
    fn conventional(singular: &str, plural: &str) -> Self {
        Self {
            list: format!("get{plural}"),
            register: format!("register{singular}"),
            update: format!("update{singular}"),
            delete: format!("delete{singular}"),
            show: format!("get{singular}"),
        }
    }

    pub fn update_path(&self, id: &str) -> String {
        format!("{}/{}", self.update, id)
    }

    pub fn delete_path(&self, id: &str) -> String {
        format!("{}/{}", self.delete, id)
    }

    pub fn show_path(&self, id: &str) -> String {
        format!("{}/{}", self.show, id)
    }

    pub fn list_path(&self, parent: Option<&str>) -> String {
        match parent {
            Some(parent) => format!("{}/{}", self.list, parent),
            None => self.list.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Index,
    Store,
    Update,
    Destroy,
}

impl Action {
    fn suffix(self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Store => "store",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub label: &'static str,
    pub endpoints: Endpoints,
    pub schema: FormSchema,
    /// Route of the list screen, if it has its own page.
    pub route: Option<&'static str>,
    /// Entity whose id scopes the list, e.g. a car for its insurances.
    pub parent: Option<EntityKind>,
    /// Relations requested through the `included` list parameter.
    pub included: Option<&'static str>,
}

impl EntityDescriptor {
    pub fn permission(&self, action: Action) -> String {
        format!("{}.{}", self.kind.permission_prefix(), action.suffix())
    }

    pub fn requirement(&self, action: Action) -> Requirement {
        Requirement::from(self.permission(action).as_str())
    }
}
