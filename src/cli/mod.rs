//! Command-line front end of the registry admin.
//!
//! Each subcommand maps onto one screen: the same guard, list and form
//! controllers a browser session would go through, rendered as text.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::AppState;
use crate::api::models::{Car, Driver};
use crate::client::envelope;
use crate::entity::{Action, EntityDescriptor, EntityKind, descriptor};
use crate::error::{AppError, AppResult};
use crate::form::{FormController, FormMode, delete_record};
use crate::guard::{self, Access, LOGIN_ROUTE, Requirement};
use crate::list::{ListController, SortDirection};
use crate::notify::{Notification, Notifier};
use crate::routes::Navigation;
use crate::routes::menu::{MenuItem, sidebar};
use crate::session::SessionState;
use crate::utils::parse_assignment;

#[derive(Parser, Debug)]
#[command(name = "secov")]
#[command(about = "Vehicle and driver registry administration", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the session file location
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the signed-in user and their permissions
    Whoami,

    /// Show the sidebar entries available to the current user
    Menu,

    /// Resolve a screen path against the current session
    Open { path: String },

    /// List one page of records
    List {
        entity: EntityKind,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long)]
        per_page: Option<u32>,

        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(long, default_value = "desc")]
        sort: SortDirection,

        /// Id of the owning record for nested lists, e.g. the car of an insurance
        #[arg(long)]
        parent: Option<String>,
    },

    /// Show one record
    Show { entity: EntityKind, id: String },

    /// Create a record from field=value pairs
    Create {
        entity: EntityKind,

        fields: Vec<String>,

        /// Prefill names from the national ID lookup for this document number
        #[arg(long)]
        lookup: Option<String>,
    },

    /// Update a record from field=value pairs
    Update {
        entity: EntityKind,
        id: String,
        fields: Vec<String>,
    },

    /// Delete a record
    Delete { entity: EntityKind, id: String },

    /// Look up a person by document number
    Lookup { document: String },
}

/// Runs one command and returns the text to print.
///
/// Notifications raised along the way go to `notifier`.
pub async fn execute(
    state: &AppState,
    command: Commands,
    notifier: &dyn Notifier,
) -> AppResult<String> {
    let session = state.session.rehydrate().await;

    match command {
        Commands::Login { username, password } => {
            if guard::authorize_public_only(&session) != Access::Allow {
                let name = session.user().map(|u| u.full_name()).unwrap_or_default();
                return Ok(format!(
                    "Already signed in as {name}; run `secov logout` first"
                ));
            }
            let signed_in = state.session.login(&username, &password).await?;
            Ok(format!(
                "Signed in as {} until {}",
                signed_in.user.full_name(),
                signed_in.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            ))
        }
        Commands::Logout => {
            state.session.logout().await;
            Ok("Signed out".to_string())
        }
        Commands::Whoami => Ok(whoami(&session)),
        Commands::Menu => Ok(render_menu(&sidebar(&session))),
        Commands::Open { path } => Ok(match state.routes.resolve(&path, &session) {
            Navigation::Render { screen, params } if params.is_empty() => {
                format!("{screen:?}")
            }
            Navigation::Render { screen, params } => {
                let params: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{screen:?} ({})", params.join(", "))
            }
            Navigation::Redirect(target) => format!("Redirected to {target}"),
            Navigation::Loading => "Loading".to_string(),
        }),
        Commands::List {
            entity,
            page,
            per_page,
            search,
            sort,
            parent,
        } => {
            let d = descriptor(entity);
            ensure(&session, &d.requirement(Action::Index))?;
            let per_page = per_page.unwrap_or(state.config.per_page);
            list_page(state, &d, parent.as_deref(), page, per_page, &search, sort).await
        }
        Commands::Show { entity, id } => {
            let d = descriptor(entity);
            ensure(&session, &d.requirement(Action::Index))?;
            show(state, &session, &d, &id).await
        }
        Commands::Create {
            entity,
            fields,
            lookup,
        } => {
            let d = descriptor(entity);
            ensure(&session, &d.requirement(Action::Store))?;
            let mut form = FormController::new(state.client.clone(), d, FormMode::Create);
            if let Some(document) = lookup {
                prefill(state, &mut form, &document, notifier).await;
            }
            apply_assignments(&mut form, &fields)?;
            let saved = form.submit(notifier).await?;
            Ok(render_record(&saved))
        }
        Commands::Update { entity, id, fields } => {
            let d = descriptor(entity);
            ensure(&session, &d.requirement(Action::Update))?;
            let current = state.client.get(&d.endpoints.show_path(&id), &[]).await?;
            let mut form = FormController::new(state.client.clone(), d, FormMode::Update(id));
            if let Some(record) = envelope::<Value>(current)?.data {
                form.load(&record);
            }
            apply_assignments(&mut form, &fields)?;
            let saved = form.submit(notifier).await?;
            Ok(render_record(&saved))
        }
        Commands::Delete { entity, id } => {
            let d = descriptor(entity);
            ensure(&session, &d.requirement(Action::Destroy))?;
            delete_record(&state.client, &d, &id, notifier).await?;
            Ok(format!("Deleted {} {}", d.kind, id))
        }
        Commands::Lookup { document } => {
            let lookup = state
                .person_lookup
                .as_ref()
                .ok_or_else(|| AppError::Config("SECOV_PERSON_API_URL is not set".to_string()))?;
            Ok(match lookup.lookup(&document).await {
                Some(person) => format!(
                    "{} {} {}",
                    person.names, person.father_last_name, person.mother_last_name
                )
                .trim()
                .to_string(),
                None => format!("No person found for {document}"),
            })
        }
    }
}

/// Turns a guard decision into an error the command line can report.
fn ensure(session: &SessionState, requirement: &Requirement) -> AppResult<()> {
    match guard::authorize(session, Some(requirement)) {
        Access::Allow => Ok(()),
        Access::Redirect(LOGIN_ROUTE) => Err(AppError::Forbidden(
            "Not signed in; run `secov login` first".to_string(),
        )),
        Access::Redirect(_) => Err(AppError::Forbidden(format!(
            "You do not have permission {}",
            requirement.permissions().join(" or ")
        ))),
        Access::Pending => Err(AppError::Forbidden("Session is still loading".to_string())),
    }
}

fn whoami(session: &SessionState) -> String {
    let Some(signed_in) = session.session() else {
        return "Not signed in".to_string();
    };
    let user = &signed_in.user;
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", user.full_name(), user.id);
    if let Some(email) = &user.email {
        let _ = writeln!(out, "Email: {email}");
    }
    let _ = writeln!(
        out,
        "Session expires: {}",
        signed_in.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = write!(out, "Permissions: {}", user.permissions.join(", "));
    out
}

fn render_menu(items: &[MenuItem]) -> String {
    if items.is_empty() {
        return "Not signed in".to_string();
    }
    let mut lines = Vec::new();
    for item in items {
        match item {
            MenuItem::Link(entry) => lines.push(format!("{:<24}{}", entry.label, entry.path)),
            MenuItem::Group { label, children } => {
                lines.push(label.to_string());
                for entry in children {
                    lines.push(format!("  {:<22}{}", entry.label, entry.path));
                }
            }
        }
    }
    lines.join("\n")
}

async fn list_page(
    state: &AppState,
    d: &EntityDescriptor,
    parent: Option<&str>,
    page: u32,
    per_page: u32,
    search: &str,
    sort: SortDirection,
) -> AppResult<String> {
    if let Some(owner) = d.parent {
        if parent.is_none() {
            return Err(AppError::Validation(
                [(
                    "parent".to_string(),
                    vec![format!("{} are listed per {}; pass --parent <id>", d.kind, owner)],
                )]
                .into(),
            ));
        }
    }

    let list = ListController::<Value>::for_entity(state.client.clone(), d, per_page, parent);
    list.preset(search, sort);
    list.load().await?;
    if page != 1 {
        list.handle_page_change(page).await?;
    }

    let snapshot = list.snapshot();
    let mut lines: Vec<String> = snapshot.result.rows.iter().map(render_row).collect();
    if lines.is_empty() {
        lines.push(format!("No {} found", d.kind));
    }
    lines.push(format!(
        "{} page {} of {}",
        d.label,
        snapshot.query.page,
        snapshot.result.total_pages.max(1)
    ));
    Ok(lines.join("\n"))
}

async fn show(
    state: &AppState,
    session: &SessionState,
    d: &EntityDescriptor,
    id: &str,
) -> AppResult<String> {
    let body = state.client.get(&d.endpoints.show_path(id), &[]).await?;
    let header = match d.kind {
        EntityKind::Car => envelope::<Car>(body)?.data.map(|car| describe_car(&car)),
        EntityKind::Driver => envelope::<Driver>(body)?
            .data
            .map(|driver| describe_driver(&driver)),
        _ => envelope::<Value>(body)?.data.map(|record| render_record(&record)),
    };
    let mut out = header.unwrap_or_else(|| format!("No {} with id {}", d.kind, id));

    // The car detail screen carries its documents as tabs.
    if d.kind == EntityKind::Car {
        for kind in [EntityKind::Insurance, EntityKind::Permit, EntityKind::Inspection] {
            let child = descriptor(kind);
            if !guard::can(session, &child.requirement(Action::Index)) {
                continue;
            }
            let list = ListController::<Value>::for_entity(
                state.client.clone(),
                &child,
                state.config.per_page,
                Some(id),
            );
            list.load().await?;
            let rows = list.snapshot().result.rows;
            let _ = write!(out, "\n{} ({})", child.label, rows.len());
            for row in &rows {
                let _ = write!(out, "\n  {}", render_row(row));
            }
        }
    }
    Ok(out)
}

fn describe_car(car: &Car) -> String {
    let brand = car.brand.as_ref().map(|b| b.name.as_str()).unwrap_or("-");
    let driver = car
        .driver
        .as_ref()
        .map(|d| d.name.as_str())
        .unwrap_or("unassigned");
    let mut out = format!("Vehicle #{} {} ({})\nDriver: {}", car.id, car.plate, brand, driver);
    if let Some(seats) = car.seats {
        let _ = write!(out, "\nSeats: {seats}");
    }
    out
}

fn describe_driver(driver: &Driver) -> String {
    let surnames: Vec<&str> = [&driver.first_name, &driver.last_name]
        .into_iter()
        .filter_map(|s| s.as_deref())
        .collect();
    let mut out = format!(
        "Driver #{} {} {}\nDocument: {}",
        driver.id,
        driver.name,
        surnames.join(" "),
        driver.document_number
    );
    if let Some(license) = &driver.license_number {
        let _ = write!(out, "\nLicense: {license}");
    }
    if let Some(phone) = &driver.phone {
        let _ = write!(out, "\nPhone: {phone}");
    }
    out
}

async fn prefill(
    state: &AppState,
    form: &mut FormController,
    document: &str,
    notifier: &dyn Notifier,
) {
    form.set("document_number", document);
    let Some(lookup) = &state.person_lookup else {
        tracing::warn!("SECOV_PERSON_API_URL is not set, skipping the lookup");
        notifier.notify(Notification::info("Person lookup is not configured"));
        return;
    };
    match lookup.lookup(document).await {
        Some(person) => {
            let filled = form.prefill_from_person(&person);
            tracing::debug!("Prefilled {} field(s) from the lookup", filled);
        }
        None => notifier.notify(Notification::info(format!(
            "No person found for {document}; fill in the names by hand"
        ))),
    }
}

fn apply_assignments(form: &mut FormController, fields: &[String]) -> AppResult<()> {
    let mut unknown = Vec::new();
    for raw in fields {
        let Some((field, value)) = parse_assignment(raw) else {
            return Err(AppError::Validation(
                [(raw.clone(), vec!["Expected field=value".to_string()])].into(),
            ));
        };
        if !form.set(&field, value) {
            unknown.push(field);
        }
    }
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(
            unknown
                .into_iter()
                .map(|field| (field, vec!["Unknown field".to_string()]))
                .collect(),
        ))
    }
}

fn render_row(row: &Value) -> String {
    let id = row.get("id").map(Value::to_string).unwrap_or_default();
    let label = ["name", "plate", "policy_number", "permit_number", "certificate_number"]
        .into_iter()
        .find_map(|key| row.get(key).and_then(Value::as_str));
    match label {
        Some(label) => format!("#{id} {label}"),
        None => format!("#{id} {row}"),
    }
}

fn render_record(record: &Value) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string())
}

/// Lines to print for a failed command. When the failure was already raised
/// as an error notification only the per-field details remain.
pub fn failure_lines(error: &AppError, notified: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if !notified {
        lines.push(format!("error: {}", error.user_message()));
    }
    if let Some(fields) = error.field_errors() {
        for (field, messages) in fields {
            for message in messages {
                lines.push(format!("  {field}: {message}"));
            }
        }
    }
    lines
}
