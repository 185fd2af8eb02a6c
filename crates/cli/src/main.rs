//! Saraphan CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! saraphan migrate
//!
//! # Create a user
//! saraphan user create --username auth_user --password '!user_PASSWORD_1!'
//!
//! # Deactivate a user
//! saraphan user deactivate --username auth_user
//!
//! # Load fixtures
//! saraphan seed fixtures/catalog.yaml
//!
//! # Delete a catalog entry
//! saraphan catalog delete good 12
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user` - Create and deactivate users
//! - `seed` - Load catalog and user fixtures
//! - `catalog delete` - Delete categories, subcategories and goods

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use saraphan_core::{CategoryId, GoodId, SubcategoryId};

mod commands;

use commands::catalog::Target;

#[derive(Parser)]
#[command(name = "saraphan")]
#[command(author, version, about = "Saraphan CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Load fixtures from a YAML file
    Seed {
        /// Path to the fixture file
        file: PathBuf,
    },
    /// Manage catalog data
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name (letters, digits and @.+-_)
        #[arg(short, long)]
        username: String,

        /// Password, at least 8 characters
        #[arg(short, long)]
        password: String,
    },
    /// Deactivate a user; their tokens stop working
    Deactivate {
        /// Login name
        #[arg(short, long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Delete a catalog entry
    Delete {
        #[command(subcommand)]
        target: DeleteTarget,
    },
}

#[derive(Subcommand)]
enum DeleteTarget {
    /// Delete a category (must have no subcategories)
    Category { id: i64 },
    /// Delete a subcategory (must have no goods)
    Subcategory { id: i64 },
    /// Delete a good and its cart lines
    Good { id: i64 },
}

impl From<DeleteTarget> for Target {
    fn from(target: DeleteTarget) -> Self {
        match target {
            DeleteTarget::Category { id } => Self::Category(CategoryId::new(id)),
            DeleteTarget::Subcategory { id } => Self::Subcategory(SubcategoryId::new(id)),
            DeleteTarget::Good { id } => Self::Good(GoodId::new(id)),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { username, password } => {
                commands::user::create(&username, &password).await?;
            }
            UserAction::Deactivate { username } => {
                commands::user::deactivate(&username).await?;
            }
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Catalog { action } => match action {
            CatalogAction::Delete { target } => commands::catalog::delete(target.into()).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_catalog_delete() {
        let cli = Cli::try_parse_from(["saraphan", "catalog", "delete", "good", "12"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Catalog {
                action: CatalogAction::Delete {
                    target: DeleteTarget::Good { id: 12 }
                }
            })
        ));
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "saraphan",
            "user",
            "create",
            "--username",
            "auth_user",
            "--password",
            "secret-password",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { .. }
            })
        ));
    }
}
