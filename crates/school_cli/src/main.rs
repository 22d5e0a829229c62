//! Command-line collaborator for the school registry storage core.
//!
//! # Responsibility
//! - Read configuration, start logging and drive `SchoolStore`.
//! - Print results as JSON on stdout; diagnostics go to the logger.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use school_core::{
    init_logging, load_dotenv, DbConfig, LogConfig, NewSchool, SchoolId, SchoolStore,
};
use serde_json::json;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// Log level (trace|debug|info|warn|error); defaults to SCHOOL_LOG_LEVEL
    #[clap(long, global = true)]
    log_level: Option<String>,

    /// Absolute log directory; defaults to SCHOOL_LOG_DIR, else stderr
    #[clap(long, global = true)]
    log_dir: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[clap(long)]
    name: String,

    #[clap(long)]
    address: String,

    #[clap(long)]
    city: String,

    #[clap(long)]
    state: String,

    /// 10-digit contact number
    #[clap(long)]
    contact: i64,

    #[clap(long)]
    email: String,

    /// Image URL or path
    #[clap(long)]
    image: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a school
    Add(AddArgs),

    /// List schools, newest first
    List,

    /// Show one school
    Show { id: SchoolId },

    /// Delete one school
    Delete { id: SchoolId },

    /// Report which backend serves requests
    Status,
}

fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    let env_log = LogConfig::from_env();
    let level = cli.log_level.unwrap_or(env_log.level);
    let log_dir = cli.log_dir.or(env_log.log_dir);
    init_logging(&level, log_dir.as_deref()).map_err(|err| anyhow!(err))?;

    let config = DbConfig::from_env().context("invalid database configuration")?;
    let store = SchoolStore::from_config(config);

    match cli.command {
        Commands::Add(args) => {
            let mut school = NewSchool::new(
                args.name,
                args.address,
                args.city,
                args.state,
                args.contact,
                args.email,
            );
            if let Some(image) = args.image {
                school = school.with_image(image);
            }
            let id = store
                .create_school(&school)
                .context("failed to create school")?;
            info!("event=cli_add module=cli status=ok id={}", id);
            print_json(&json!({ "id": id, "backend": backend(&store) }))?;
        }
        Commands::List => {
            let schools = store.list_schools().context("failed to list schools")?;
            print_json(&schools)?;
        }
        Commands::Show { id } => match store.get_school(id).context("failed to load school")? {
            Some(school) => print_json(&school)?,
            None => bail!("school {id} not found"),
        },
        Commands::Delete { id } => {
            let deleted = store
                .delete_school(id)
                .context("failed to delete school")?;
            print_json(&json!({ "deleted": deleted }))?;
        }
        Commands::Status => {
            let count = store
                .list_schools()
                .context("failed to resolve storage backend")?
                .len();
            print_json(&json!({
                "backend": backend(&store),
                "target": store.target(),
                "schools": count,
                "version": school_core::core_version(),
            }))?;
        }
    }

    Ok(())
}

fn backend(store: &SchoolStore) -> &'static str {
    store.mode().map_or("unresolved", |mode| mode.as_str())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}
