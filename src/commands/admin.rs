//! Admin command - bootstrap administrator accounts.

use std::sync::Arc;

use crate::cli::args::{AdminAction, AdminArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Database, Persistence};
use crate::services::{AuthService, Authenticator};

/// Execute the admin command
pub async fn execute(args: AdminArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config).await?;
    let auth = Authenticator::new(Arc::new(Persistence::new(db.get_connection())), config);

    match args.action {
        AdminAction::Create {
            email,
            name,
            password,
        } => {
            let admin = auth.create_admin(email, password, name).await?;
            println!("Created administrator {} ({})", admin.email, admin.id);
        }
    }

    Ok(())
}
