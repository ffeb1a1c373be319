//! Mini CRM command-line entry point.
//!
//! # Responsibility
//! - Parse commands, load configuration, and start logging.
//! - Drive `ContactService` over the configured backend and render results.
//!
//! # Invariants
//! - The store is closed before the process exits, on success and on error.
//! - Any failure exits with status 1 and a single `Error:` line on stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use minicrm_core::{
    init_logging, open_backend, supported_types, AppConfig, Contact, ContactId,
    ContactRepository, ContactService,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

type Service = ContactService<Box<dyn ContactRepository>>;

#[derive(Parser, Debug)]
#[command(name = "minicrm", version, about = "Mini CRM contact manager")]
struct Cli {
    /// Path to a config.toml (defaults to ./config.toml, then ~/.minicrm/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a new contact
    Add {
        /// Contact name
        #[arg(short, long)]
        name: String,

        /// Contact email address
        #[arg(short, long)]
        email: String,

        /// Mobile phone number starting with 06 or 07
        #[arg(short, long, default_value_t = String::new())]
        phone: String,
    },
    /// List all contacts
    List,
    /// Show one contact
    Get {
        /// Contact id
        id: ContactId,
    },
    /// Update an existing contact; omitted fields keep their current value
    Update {
        /// Contact id
        id: ContactId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Delete a contact
    Delete {
        /// Contact id
        id: ContactId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Find a contact by email
    Search {
        /// Email address (case-insensitive)
        email: String,
    },
    /// List supported storage backends
    Backends,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config.logging.level, config.logging.dir.as_deref())
        .context("failed to initialize logging")?;
    let kind = config.storage_kind()?;

    if let Command::Backends = cli.command {
        print_backends(kind.as_str());
        return Ok(());
    }

    let path = config.storage_file_path();
    let repo = open_backend(kind, &path).context("failed to initialize storage")?;
    info!("event=cli_start module=cli status=ok backend={kind}");
    let service = ContactService::new(repo);

    let outcome = execute(&service, cli.command);
    if let Err(err) = service.close() {
        warn!("event=store_close module=cli status=error error={err}");
        if outcome.is_ok() {
            return Err(err).context("failed to close contact store");
        }
    }
    outcome
}

fn execute(service: &Service, command: Command) -> Result<()> {
    match command {
        Command::Add { name, email, phone } => {
            let contact = service
                .create_contact(name, email, phone)
                .context("failed to create contact")?;
            println!("Contact created (ID: {})", contact.id);
            print_contact(&contact);
        }
        Command::List => {
            let contacts = service
                .list_contacts()
                .context("failed to retrieve contacts")?;
            print_table(&contacts);
        }
        Command::Get { id } => {
            let contact = service.get_contact(id).context("failed to get contact")?;
            print_contact(&contact);
        }
        Command::Update {
            id,
            name,
            email,
            phone,
        } => {
            let current = service.get_contact(id).context("failed to get contact")?;
            let updated = service
                .update_contact(
                    id,
                    name.unwrap_or(current.name),
                    email.unwrap_or(current.email),
                    phone.unwrap_or(current.phone),
                )
                .context("failed to update contact")?;
            println!("Contact updated (ID: {})", updated.id);
            print_contact(&updated);
        }
        Command::Delete { id, force } => {
            let contact = service.get_contact(id).context("failed to get contact")?;
            if !force {
                println!("Are you sure you want to delete this contact?");
                print_contact(&contact);
                print!("\nType 'yes' to confirm: ");
                std::io::stdout().flush().context("failed to flush stdout")?;
                let mut stdin = std::io::stdin().lock();
                if !read_confirmation(&mut stdin).context("failed to read confirmation")? {
                    println!("Delete cancelled.");
                    return Ok(());
                }
            }
            service
                .delete_contact(id)
                .context("failed to delete contact")?;
            println!("Contact deleted (ID: {}, Name: {})", contact.id, contact.name);
        }
        Command::Search { email } => {
            let contact = service
                .search_by_email(&email)
                .context("failed to search contact")?;
            print_contact(&contact);
        }
        Command::Backends => bail!("`backends` does not open a store"),
    }
    Ok(())
}

/// Reads one line and accepts only `yes`, case-insensitively.
fn read_confirmation(input: &mut impl BufRead) -> std::io::Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}

fn print_backends(active: &str) {
    for tag in supported_types() {
        let marker = if *tag == active { " (active)" } else { "" };
        println!("{tag}{marker}");
    }
}

fn print_contact(contact: &Contact) {
    println!("ID:      {}", contact.id);
    println!("Name:    {}", contact.name);
    println!("Email:   {}", contact.email);
    println!("Phone:   {}", display_phone(&contact.phone));
    println!("Created: {}", contact.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated: {}", contact.updated_at.format("%Y-%m-%d %H:%M:%S"));
}

fn print_table(contacts: &[Contact]) {
    if contacts.is_empty() {
        println!("No contacts found.");
        return;
    }

    for line in render_table(contacts) {
        println!("{}", line.trim_end());
    }
    println!("\nTotal contacts: {}", contacts.len());
}

fn render_table(contacts: &[Contact]) -> Vec<String> {
    let mut rows = vec![
        ["ID", "Name", "Email", "Phone", "Created"].map(String::from),
        ["--", "----", "-----", "-----", "-------"].map(String::from),
    ];
    rows.extend(contacts.iter().map(|contact| {
        [
            contact.id.to_string(),
            contact.name.clone(),
            contact.email.clone(),
            display_phone(&contact.phone).to_string(),
            contact.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]
    }));

    let mut widths = [0usize; 5];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}  "))
                .collect::<String>()
        })
        .collect()
}

fn display_phone(phone: &str) -> &str {
    if phone.is_empty() {
        "N/A"
    } else {
        phone
    }
}
