//! Tudu CLI entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tudu::app::App;
use tudu::auth::validation::{validate_login, validate_sign_up};
use tudu::session::require_session;
use tudu::storage::FileStore;
use tudu::ui;

#[derive(Parser)]
#[command(name = "tudu")]
#[command(about = "Tudu - todo lists from your terminal")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ~/.tudu/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration interactively
    Onboard,

    /// Delete configuration and stored session
    Reset,

    #[command(flatten)]
    Client(ClientCommand),
}

/// Commands that run against the todo server or the stored session
#[derive(Subcommand)]
enum ClientCommand {
    /// Create an account
    Register {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        username: Option<String>,
    },

    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: Option<String>,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show session and settings
    Status,

    /// Manage todos
    #[command(subcommand)]
    Todos(TodoCommand),

    /// Theme and language
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum TodoCommand {
    /// List all todos
    List,

    /// Create a todo
    Add {
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long)]
        done: bool,
    },

    /// Show one todo
    Show { id: String },

    /// Change a todo
    Update {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        done: Option<bool>,
    },

    /// Delete a todo
    Delete { id: String },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Show or set the theme
    Theme { mode: Option<ThemeArg> },

    /// Show or set the language
    Language { code: Option<String> },

    /// List available languages
    Languages,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Onboard => {
            tudu::config::onboard()?;
            return Ok(());
        }
        Commands::Reset => {
            tudu::config::reset()?;
            return Ok(());
        }
        Commands::Client(command) => command,
    };

    let mut config = tudu::config::load_or_default(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate()?;
    }

    let storage_path = FileStore::path_for_config(cli.config.as_deref());
    let app = App::new(config, &storage_path)?;
    let result = run(&app, command).await;

    if app.session_expired() {
        ui::print_warning("Your session has expired. Run 'tudu login' to sign in again.");
    }
    if let Err(e) = result {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &App, command: ClientCommand) -> Result<()> {
    match command {
        ClientCommand::Register { email, username } => run_register(app, email, username).await?,

        ClientCommand::Login { email, password } => run_login(app, email, password).await?,

        ClientCommand::Logout => {
            app.auth().logout()?;
            ui::print_success("Logged out");
        }

        ClientCommand::Status => print_status(app),

        ClientCommand::Todos(command) => {
            require_session(app.tokens(), &app.navigator)?;
            run_todos(app, command).await?;
        }

        ClientCommand::Settings(command) => run_settings(app, command)?,
    }

    Ok(())
}

async fn run_register(app: &App, email: Option<String>, username: Option<String>) -> Result<()> {
    use inquire::{Password, Text};

    let email = match email {
        Some(email) => email,
        None => Text::new("Email:").prompt()?,
    };
    let username = match username {
        Some(username) => username,
        None => Text::new("Username:").prompt()?,
    };
    let password = Password::new("Password:").without_confirmation().prompt()?;
    let confirm = Password::new("Confirm password:").without_confirmation().prompt()?;

    validate_sign_up(&email, &username, &password, &confirm).into_result()?;

    let spinner = ui::spinner("Creating account");
    let result = app.auth().register(&email, &password, &username).await;
    spinner.finish_and_clear();

    let response = result?;
    if response.message.is_empty() {
        ui::print_success("Account created");
    } else {
        ui::print_success(&response.message);
    }
    ui::print_step("Run 'tudu login' to sign in.");
    Ok(())
}

async fn run_login(app: &App, email: Option<String>, password: Option<String>) -> Result<()> {
    use inquire::{Password, Text};

    let email = match email {
        Some(email) => email,
        None => Text::new("Email:").prompt()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new("Password:").without_confirmation().prompt()?,
    };

    validate_login(&email, &password).into_result()?;

    let spinner = ui::spinner("Signing in");
    let result = app.auth().login(&email, &password).await;
    spinner.finish_and_clear();

    result?;
    ui::print_success(&format!("Logged in as {}", email));
    Ok(())
}

async fn run_todos(app: &App, command: TodoCommand) -> Result<()> {
    match command {
        TodoCommand::List => {
            let spinner = ui::spinner("Loading todos");
            let result = app.todos.list().await;
            spinner.finish_and_clear();

            let todos = result?;
            if todos.is_empty() {
                ui::print_step("Nothing to do.");
            }
            for todo in &todos {
                ui::print_todo(todo);
            }
        }

        TodoCommand::Add { title, description, done } => {
            app.todos.create(&title, &description, done).await?;
            ui::print_success(&format!("Added '{}'", title));
        }

        TodoCommand::Show { id } => {
            let todo = app.todos.read(&id).await?;
            ui::print_todo(&todo);
        }

        TodoCommand::Update { id, title, description, done } => {
            let mut todo = app.todos.read(&id).await?;
            if let Some(title) = title {
                todo.title = title;
            }
            if let Some(description) = description {
                todo.description = description;
            }
            if let Some(done) = done {
                todo.completed = done;
            }
            todo.todo_id.get_or_insert(id);

            app.todos.update(&todo).await?;
            ui::print_success("Updated");
        }

        TodoCommand::Delete { id } => {
            app.todos.delete(&id).await?;
            ui::print_success(&format!("Deleted {}", id));
        }
    }

    Ok(())
}

fn run_settings(app: &App, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Theme { mode: None } => {
            ui::print_step(&format!("Theme: {}", app.settings.theme().as_str()));
        }
        SettingsCommand::Theme { mode: Some(mode) } => {
            app.settings.set_dark(matches!(mode, ThemeArg::Dark))?;
            ui::print_success(&format!("Theme set to {}", app.settings.theme().as_str()));
        }
        SettingsCommand::Language { code: None } => {
            ui::print_step(&format!("Language: {}", app.settings.language()));
        }
        SettingsCommand::Language { code: Some(code) } => {
            app.settings.set_language(&code)?;
            ui::print_success(&format!("Language set to {}", app.settings.language()));
        }
        SettingsCommand::Languages => {
            let current = app.settings.language();
            for lang in app.settings.languages() {
                let marker = if *lang == current { "*" } else { " " };
                println!("  {} {}", marker, lang);
            }
        }
    }
    Ok(())
}

fn print_status(app: &App) {
    ui::print_header("Status");
    println!("API: {}", app.config.api_url);

    match app.tokens().saved_at() {
        Some(at) if app.tokens().is_authenticated() => {
            println!("Session: ✓ (since {})", at.format("%Y-%m-%d %H:%M UTC"));
        }
        _ if app.tokens().is_authenticated() => println!("Session: ✓"),
        _ => println!("Session: not logged in (run 'tudu login')"),
    }

    println!("Theme: {}", app.settings.theme().as_str());
    println!("Language: {}", app.settings.language());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_client_commands_stay_top_level() {
        let cli = Cli::try_parse_from(["tudu", "todos", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Client(ClientCommand::Todos(TodoCommand::List))
        ));

        let cli = Cli::try_parse_from(["tudu", "--config", "/tmp/c.json", "reset"]).unwrap();
        assert!(matches!(cli.command, Commands::Reset));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/c.json")));
    }
}
