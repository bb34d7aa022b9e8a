//! Command-line driver for the client directory.
//!
//! # Responsibility
//! - Replay the sample directory script (`demo`, the default command).
//! - Expose each directory operation as a subcommand for manual use.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use directory_core::{
    core_version, create_db, default_log_level, init_logging, open_db, open_db_in_memory,
    ClientData, ClientFilter, ClientId, ClientMatch, DirectoryService, Phones,
    SqliteClientRepository,
};
use log::info;
use rusqlite::Connection;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// SQLite database file; an in-memory database is used when omitted
    #[clap(long, env = "DIRECTORY_DB", global = true)]
    db: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[clap(long, env = "DIRECTORY_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr when omitted
    #[clap(long, env = "DIRECTORY_LOG_DIR", global = true)]
    log_dir: Option<String>,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reset the schema and replay the sample directory script
    Demo,

    /// Drop and recreate the directory tables
    Init,

    /// Add a client with zero or more phones
    AddClient {
        first_name: String,
        last_name: String,

        /// Unique email address
        #[clap(short, long)]
        email: Option<String>,

        /// Phone number, repeatable
        #[clap(short, long = "phone")]
        phones: Vec<String>,
    },

    /// Attach phones to an existing client
    AddPhone {
        client_id: ClientId,

        #[clap(required = true)]
        phones: Vec<String>,
    },

    /// Overwrite every field of a client
    ChangeClient {
        client_id: ClientId,
        first_name: String,
        last_name: String,

        #[clap(short, long)]
        email: Option<String>,
    },

    /// Remove one phone from a client
    DeletePhone { client_id: ClientId, phone: String },

    /// Remove a client together with its phones
    DeleteClient { client_id: ClientId },

    /// Search clients by any combination of fields
    Find(FindArgs),
}

#[derive(Args, Debug)]
struct FindArgs {
    #[clap(short, long)]
    first_name: Option<String>,

    #[clap(short, long)]
    last_name: Option<String>,

    #[clap(short, long)]
    email: Option<String>,

    #[clap(short, long)]
    phone: Option<String>,

    /// Print matches as JSON
    #[clap(long)]
    json: bool,
}

impl From<&FindArgs> for ClientFilter {
    fn from(args: &FindArgs) -> Self {
        Self {
            first_name: args.first_name.clone(),
            last_name: args.last_name.clone(),
            email: args.email.clone(),
            phone: args.phone.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match (&cli.log_level, &cli.log_dir) {
        (Some(level), _) => level.as_str(),
        (None, Some(_)) => default_log_level(),
        (None, None) => "warn",
    };
    init_logging(level, cli.log_dir.as_deref()).map_err(|err| anyhow!(err))?;

    let command = cli.command.unwrap_or(Commands::Demo);
    let mut conn = match (&cli.db, &command) {
        (Some(path), _) => open_db(path)?,
        (None, Commands::Demo) => open_db_in_memory()?,
        (None, _) => bail!("--db (or DIRECTORY_DB) is required for this command"),
    };
    info!(
        "event=cli_start module=cli status=ok version={} in_memory={}",
        core_version(),
        cli.db.is_none()
    );

    match command {
        Commands::Demo => run_demo(&mut conn)?,
        Commands::Init => {
            create_db(&mut conn)?;
            println!("schema initialized");
        }
        Commands::AddClient {
            first_name,
            last_name,
            email,
            phones,
        } => {
            let client = ClientData {
                first_name,
                last_name,
                email,
            };
            let client_id = open_service(&mut conn)?.add_client(&client, Phones::from(phones))?;
            println!("added client {client_id}");
        }
        Commands::AddPhone { client_id, phones } => {
            let inserted = open_service(&mut conn)?.add_phone(client_id, Phones::from(phones))?;
            println!("added {inserted} phone(s) to client {client_id}");
        }
        Commands::ChangeClient {
            client_id,
            first_name,
            last_name,
            email,
        } => {
            let client = ClientData {
                first_name,
                last_name,
                email,
            };
            open_service(&mut conn)?.update_client(client_id, &client)?;
            println!("updated client {client_id}");
        }
        Commands::DeletePhone { client_id, phone } => {
            if open_service(&mut conn)?.remove_phone(client_id, &phone)? {
                println!("deleted phone {phone} of client {client_id}");
            } else {
                println!("client {client_id} has no phone {phone}");
            }
        }
        Commands::DeleteClient { client_id } => {
            if open_service(&mut conn)?.remove_client(client_id)? {
                println!("deleted client {client_id}");
            } else {
                println!("no client with id {client_id}");
            }
        }
        Commands::Find(args) => {
            let filter = ClientFilter::from(&args);
            let rows = open_service(&mut conn)?.find_clients(&filter)?;
            print_matches(&filter, &rows, args.json)?;
        }
    }

    Ok(())
}

fn open_service(conn: &mut Connection) -> Result<DirectoryService<SqliteClientRepository<'_>>> {
    let repo = SqliteClientRepository::try_new(conn)?;
    Ok(DirectoryService::new(repo))
}

fn run_demo(conn: &mut Connection) -> Result<()> {
    create_db(conn)?;
    let mut service = open_service(conn)?;

    let anna = service.add_client(
        &ClientData::new("Anna", "Ivanova", "iva@ya.ru"),
        ["79999999999", "111111111", "+22222222"],
    )?;
    let petrov = service.add_client(
        &ClientData::new("Petr", "Petrov", "petya@gmail.com"),
        Phones::Empty,
    )?;
    let aleksandrov = service.add_client(
        &ClientData::new("Petr", "Aleksandrov", "abc@gmail.com"),
        "123456",
    )?;
    service.add_client(&ClientData::new("Ivan", "Sidorov", "zaq@gmail.com"), "12345111")?;
    service.add_client(
        &ClientData::new("Irina", "Sergeeva", "irina.s@mail.ru"),
        Phones::Empty,
    )?;

    service.add_phone(petrov, "11111")?;
    service.add_phone(aleksandrov, "00000")?;

    service.update_client(petrov, &ClientData::new("Petr", "Sidorov", "petya@gmail.com"))?;

    service.remove_phone(anna, "79999999999")?;
    service.remove_client(anna)?;

    let searches = [
        ClientFilter::new(),
        ClientFilter::new().first_name("Petr").phone("00000"),
        ClientFilter::new()
            .first_name("Petr")
            .last_name("Aleksandrov")
            .phone("123456"),
        ClientFilter::new().email("petya@gmail.com"),
        ClientFilter::new().last_name("Sidorov"),
        ClientFilter::new().first_name("Irina"),
    ];
    for filter in &searches {
        let rows = service.find_clients(filter)?;
        print_matches(filter, &rows, false)?;
    }

    Ok(())
}

fn print_matches(filter: &ClientFilter, rows: &[ClientMatch], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    println!(
        "search: first_name={} last_name={} email={} phone={}",
        shown(&filter.first_name),
        shown(&filter.last_name),
        shown(&filter.email),
        shown(&filter.phone),
    );
    if rows.is_empty() {
        println!("  (no matches)");
    }
    for row in rows {
        println!(
            "  {:>4}  {:<16} {:<16} {:<24} {}",
            row.client_id,
            row.last_name.as_deref().unwrap_or("-"),
            row.first_name.as_deref().unwrap_or("-"),
            row.email.as_deref().unwrap_or("-"),
            row.phone_number.as_deref().unwrap_or("-"),
        );
    }
    println!();
    Ok(())
}

fn shown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("*")
}
