//! Account administration
//!
//! Creates accounts and changes roles directly in the database, which is how
//! the first administrator gets bootstrapped.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kanban_server::auth::hash_password;
use kanban_server::config::DEFAULT_DATABASE_URL;
use kanban_server::db::UserRepo;
use kanban_server::models::{Email, Password, UserPermission};

#[derive(Parser, Debug)]
pub struct UserArgs {
    /// Database URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL, global = true)]
    pub database_url: String,

    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create an account
    Create {
        /// Login email
        #[arg(long)]
        email: String,

        /// Plain-text password (hashed before storing)
        #[arg(long)]
        password: String,

        /// Role: admin, moderator, user or none
        #[arg(long, default_value = "user")]
        permission: UserPermission,
    },
    /// Change the role of an existing account
    Grant {
        /// Login email of the account
        #[arg(long)]
        email: String,

        /// Role: admin, moderator, user or none
        #[arg(long)]
        permission: UserPermission,

        /// Also mark the account as verified
        #[arg(long)]
        verify: bool,
    },
}

pub async fn run_user(args: UserArgs) -> Result<()> {
    let pool = super::open_database(&args.database_url).await?;
    let repo = UserRepo::new(&pool);

    match args.command {
        UserCommands::Create {
            email,
            password,
            permission,
        } => {
            let email = Email::new(&email).context("Invalid email")?;
            let password = Password::new(&password).context("Invalid password")?;
            let hash = hash_password(password)
                .await
                .context("Failed to hash password")?;

            let user = repo
                .create(&email, &hash, permission)
                .await
                .context("Failed to create account")?;
            println!("Created {} ({}) with role {}", user.email, user.id, user.permission);
        }
        UserCommands::Grant {
            email,
            permission,
            verify,
        } => {
            let user = repo
                .find_by_email(&email)
                .await?
                .with_context(|| format!("No account with email {email}"))?;

            let user = repo
                .set_permission(user.id, permission, verify.then_some(true))
                .await
                .context("Failed to change role")?;
            println!("{} is now {}", user.email, user.permission.label());
        }
    }

    pool.close().await;
    Ok(())
}
