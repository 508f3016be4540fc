use std::sync::LazyLock;

use regex::Regex;

use super::{EntityDescriptor, EntityKind, Endpoints};
use crate::form::rules::{FieldSpec, FormSchema};

static DNI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8}$").expect("dni pattern"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^9\d{8}$").expect("phone pattern"));
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern"));
static PLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{3}-?[A-Z0-9]{3}$").expect("plate pattern"));
static GENDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[MF]$").expect("gender pattern"));
static VERDICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(approved|rejected)$").expect("verdict pattern"));

const DATE_HINT: &str = "Use the YYYY-MM-DD format";

pub fn descriptor(kind: EntityKind) -> EntityDescriptor {
    match kind {
        EntityKind::Driver => EntityDescriptor {
            kind,
            label: "Drivers",
            endpoints: Endpoints::conventional("Driver", "Drivers"),
            schema: FormSchema::new(vec![
                FieldSpec::text("document_number", "Document number")
                    .required()
                    .pattern(&DNI, "The document number must have 8 digits"),
                person_name("name", "Names"),
                person_name("first_name", "Father's last name"),
                person_name("last_name", "Mother's last name"),
                FieldSpec::text("birth_date", "Birth date")
                    .required()
                    .pattern(&DATE, DATE_HINT),
                FieldSpec::text("gender", "Gender").pattern(&GENDER, "Gender must be M or F"),
                FieldSpec::text("phone", "Phone")
                    .pattern(&PHONE, "The phone must have 9 digits and start with 9"),
                FieldSpec::text("address", "Address").max(255),
                FieldSpec::text("license_number", "License number")
                    .required()
                    .min(5)
                    .max(20),
                FieldSpec::text("license_category", "License category")
                    .required()
                    .max(10),
                FieldSpec::integer("group_id", "Group").required().range(1, i64::MAX),
            ]),
            route: Some("/list-drivers"),
            parent: None,
            included: None,
        },
        EntityKind::Car => EntityDescriptor {
            kind,
            label: "Vehicles",
            endpoints: Endpoints::conventional("Car", "Cars"),
            schema: FormSchema::new(vec![
                FieldSpec::text("plate", "Plate")
                    .required()
                    .pattern(&PLATE, "The plate must look like ABC-123"),
                reference("brand_id", "Brand"),
                reference("year_id", "Year"),
                reference("color_id", "Color"),
                reference("type_id", "Type"),
                reference("driver_id", "Driver"),
                FieldSpec::text("engine_number", "Engine number").min(5).max(30),
                FieldSpec::text("chassis_number", "Chassis number").min(5).max(30),
                FieldSpec::integer("seats", "Seats").range(1, 60),
            ]),
            route: Some("/list-cars"),
            parent: None,
            included: Some("brand,driver"),
        },
        EntityKind::Brand => catalog_entry(kind, "Brands", "Brand", "/settings/list-brands", 50),
        EntityKind::Color => catalog_entry(kind, "Colors", "Color", "/settings/list-colors", 30),
        EntityKind::Type => catalog_entry(kind, "Types", "Type", "/settings/list-types", 50),
        EntityKind::Group => {
            let mut d = catalog_entry(kind, "Groups", "Group", "/settings/list-groups", 50);
            d.schema
                .fields
                .push(FieldSpec::text("description", "Description").max(255));
            d
        }
        EntityKind::Year => EntityDescriptor {
            kind,
            label: "Years",
            endpoints: Endpoints::conventional("Year", "Years"),
            schema: FormSchema::new(vec![
                FieldSpec::integer("name", "Year").required().range(1950, 2100),
            ]),
            route: Some("/settings/list-years"),
            parent: None,
            included: None,
        },
        EntityKind::Role => EntityDescriptor {
            kind,
            label: "Roles",
            endpoints: Endpoints::conventional("Role", "Roles"),
            schema: FormSchema::new(vec![
                FieldSpec::text("name", "Name").required().min(3).max(50),
                FieldSpec::list("permissions", "Permissions").required(),
            ]),
            route: Some("/list-roles"),
            parent: None,
            included: Some("permissions"),
        },
        EntityKind::User => EntityDescriptor {
            kind,
            label: "Users",
            endpoints: Endpoints::conventional("User", "Users"),
            schema: FormSchema::new(vec![
                FieldSpec::text("document_number", "Document number")
                    .required()
                    .pattern(&DNI, "The document number must have 8 digits"),
                person_name("name", "Names"),
                person_name("first_name", "Father's last name"),
                person_name("last_name", "Mother's last name"),
                FieldSpec::text("email", "Email")
                    .required()
                    .pattern(&EMAIL, "Enter a valid email address"),
                FieldSpec::text("username", "Username").required().min(4).max(30),
                FieldSpec::secret("password", "Password").required().min(8).max(64),
                reference("role_id", "Role"),
            ]),
            route: Some("/list-users"),
            parent: None,
            included: Some("role"),
        },
        EntityKind::Insurance => EntityDescriptor {
            kind,
            label: "Insurances",
            endpoints: Endpoints::conventional("Insurance", "Insurances"),
            schema: FormSchema::new(vec![
                reference("car_id", "Vehicle"),
                FieldSpec::text("policy_number", "Policy number")
                    .required()
                    .min(4)
                    .max(30),
                FieldSpec::text("insurer", "Insurer").required().min(3).max(80),
                date("start_date", "Start date"),
                date("end_date", "End date"),
            ]),
            route: None,
            parent: Some(EntityKind::Car),
            included: None,
        },
        EntityKind::Permit => EntityDescriptor {
            kind,
            label: "Operating permits",
            endpoints: Endpoints::conventional("Permit", "Permits"),
            schema: FormSchema::new(vec![
                reference("car_id", "Vehicle"),
                FieldSpec::text("permit_number", "Permit number")
                    .required()
                    .min(4)
                    .max(30),
                date("issue_date", "Issue date"),
                date("expiration_date", "Expiration date"),
            ]),
            route: None,
            parent: Some(EntityKind::Car),
            included: None,
        },
        EntityKind::Inspection => EntityDescriptor {
            kind,
            label: "Technical inspections",
            endpoints: Endpoints::conventional("Inspection", "Inspections"),
            schema: FormSchema::new(vec![
                reference("car_id", "Vehicle"),
                FieldSpec::text("certificate_number", "Certificate number")
                    .required()
                    .min(4)
                    .max(30),
                date("inspection_date", "Inspection date"),
                date("expiration_date", "Expiration date"),
                FieldSpec::text("result", "Result")
                    .required()
                    .pattern(&VERDICT, "Result must be approved or rejected"),
            ]),
            route: None,
            parent: Some(EntityKind::Car),
            included: None,
        },
    }
}

// Settings entities are a single required name.
fn catalog_entry(
    kind: EntityKind,
    label: &'static str,
    singular: &str,
    route: &'static str,
    max: usize,
) -> EntityDescriptor {
    EntityDescriptor {
        kind,
        label,
        endpoints: Endpoints::conventional(singular, &format!("{singular}s")),
        schema: FormSchema::new(vec![
            FieldSpec::text("name", "Name").required().min(3).max(max),
        ]),
        route: Some(route),
        parent: None,
        included: None,
    }
}

fn person_name(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::text(name, label).required().min(2).max(50)
}

fn reference(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::integer(name, label).required().range(1, i64::MAX)
}

fn date(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::text(name, label).required().pattern(&DATE, DATE_HINT)
}
