use anyhow::{anyhow, Context};
use catalog_app::modules::accounts::models::NewUser;
use catalog_app::modules::accounts::password;
use catalog_app::modules::accounts::repository::AccountsRepository;
use catalog_app::Application;
use catalog_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "catalog-cli", version, about = "Operate the library catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Register a user account
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Staff users may edit the catalog and hold every permission
        #[arg(long)]
        staff: bool,
        /// Permission code to grant; may be repeated
        #[arg(long = "permission", value_name = "CODE")]
        permissions: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    tracing::info!(env = ?settings.environment, "catalog-cli starting");

    let app = Application::build(settings).await?;

    match cli.command {
        Command::Serve => app.run().await,
        Command::Migrate => {
            let applied = app.migrate().await?;
            tracing::info!(applied, "migrations complete");
            Ok(())
        }
        Command::CreateUser {
            username,
            password,
            staff,
            permissions,
        } => {
            app.migrate().await?;

            let new_user = NewUser {
                username,
                password,
                is_staff: staff,
                permissions,
            };
            let permissions = new_user
                .validate()
                .map_err(|errors| anyhow!("invalid user: {errors}"))?;
            let hash = password::hash_password(&new_user.password)?;

            let user = AccountsRepository::new(app.context().db.clone())
                .create_user(new_user.username.trim(), &hash, new_user.is_staff, &permissions)
                .await
                .with_context(|| format!("failed to create user '{}'", new_user.username))?;

            tracing::info!(user_id = user.id, username = %user.username, "user created");
            Ok(())
        }
    }
}
