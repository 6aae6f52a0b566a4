//! `create-admin`: bootstrap an administrator account.

use crate::auth::AuthService;
use crate::config::Config;
use crate::db::Database;
use crate::types::{Employee, NewEmployee, Role};
use anyhow::Result;
use clap::Args;
use tracing::info;

/// Arguments for the create-admin command.
#[derive(Args, Debug)]
pub struct CreateAdminArgs {
    /// Login name
    #[arg(long)]
    pub username: String,

    /// Initial password
    #[arg(long)]
    pub password: String,

    /// Full name in Arabic
    #[arg(long = "name-ar")]
    pub name_ar: String,

    /// Full name in English
    #[arg(long = "name-en")]
    pub name_en: Option<String>,
}

impl CreateAdminArgs {
    fn to_new_employee(&self) -> NewEmployee {
        NewEmployee {
            username: self.username.clone(),
            password: self.password.clone(),
            full_name_ar: self.name_ar.clone(),
            full_name_en: self.name_en.clone(),
            role: Role::Admin,
        }
    }
}

/// Create the administrator in `db`.
pub fn create_admin(db: &Database, config: &Config, args: &CreateAdminArgs) -> Result<Employee> {
    let auth = AuthService::new(db.clone(), config)?;
    let employee = auth.create_employee(&args.to_new_employee())?;
    info!(employee_id = %employee.id, username = %employee.username, "Administrator created");
    Ok(employee)
}

/// Run the create-admin command.
pub fn run_create_admin(config: &Config, args: &CreateAdminArgs) -> Result<()> {
    let db = Database::open(&config.server.db_path)?;
    let employee = create_admin(&db, config, args)?;
    println!(
        "Created administrator '{}' ({})",
        employee.username, employee.id
    );
    Ok(())
}
