use anyhow::Context;
use bookshelf_app::{admin, App};
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Bookshelf service and administration tool
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    /// Override the configured database URL
    #[arg(long, global = true, env = "BOOKSHELF_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Create an account with staff and superuser permissions
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Add a book to the shelf
    AddBook {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
    },
    /// Print a bearer token for an account
    IssueToken {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Delete an account; books it held stay checked out without a borrower
    DeleteUser {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    if let Some(url) = cli.database_url {
        settings.database.url = url;
    }
    bookshelf_telemetry::init(&settings.telemetry)?;

    let app = App::bootstrap(settings).await?;

    match cli.command {
        Command::Serve => return app.serve().await,
        Command::Migrate => {
            println!("database is up to date");
        }
        Command::CreateSuperuser { email, password } => {
            let user = admin::create_superuser(&app.state, &email, &password).await?;
            println!("created superuser {} (id {})", email, user.id);
        }
        Command::AddBook { title, author } => {
            let book = admin::add_book(&app.state, &title, &author).await?;
            println!("added book {} (id {})", book.title, book.id);
        }
        Command::IssueToken { email, password } => {
            let token = admin::issue_token(&app.state, &app.jwt, &email, &password).await?;
            println!("{}", token);
        }
        Command::DeleteUser { email } => {
            let user = admin::delete_user(&app.state, &email).await?;
            println!("deleted user {} (id {})", email, user.id);
        }
    }

    app.registry.stop_modules().await?;
    app.pool.close().await;
    Ok(())
}
