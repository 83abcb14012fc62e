//! Scriim CLI - a terminal client for the Scriim emergency alert service.
//!
//! Configure a name and emergency contacts, then trigger a panic action
//! that reports your location to the backend, or degrade to device-level
//! SMS/dial handoffs when the network is unreachable.

mod api;
mod config;
mod connectivity;
mod dispatch;
mod location;
mod models;
mod offline;
mod store;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::ApiClient;
use config::Config;
use connectivity::ConnectivityMonitor;
use dispatch::{AlertRequest, DispatchMode, DispatchOutcome, Dispatcher};
use models::{Authority, AuthorityKind};
use offline::DeviceHandoff;
use store::ContactStore;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Usage: scriim-cli <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  panic                          Alert your emergency contacts");
    eprintln!("  authority <police|hospital|fire>");
    eprintln!("                                 Alert one emergency service");
    eprintln!("  contacts list                  Show configured contacts");
    eprintln!("  contacts add <name> <phone> <email>");
    eprintln!("  contacts remove <id>");
    eprintln!("  name <your name>               Set your display name");
    eprintln!("  status                         Show readiness and connectivity");
    eprintln!("  history                        Show previously sent alerts");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("Scriim CLI starting");

    let config = Config::load()?;
    let data_dir = config.data_dir()?;
    let mut store = ContactStore::load(&data_dir)?;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("panic") => cmd_panic(&config, &store).await,
        Some("authority") => cmd_authority(&config, &store, args.get(2).map(String::as_str)).await,
        Some("contacts") => cmd_contacts(&mut store, &args[2..]),
        Some("name") => cmd_name(&mut store, &args[2..]),
        Some("status") => cmd_status(&config, &store).await,
        Some("history") => cmd_history(&config).await,
        _ => {
            print_usage();
            Ok(())
        }
    }
}

/// Build the dispatcher against the live backend, probing connectivity once
/// so the oracle reflects the network state at this instant.
async fn build_dispatcher(
    config: &Config,
) -> Result<Dispatcher<ConnectivityMonitor, ApiClient, DeviceHandoff>> {
    let base_url = config.api_base_url();
    let client = ApiClient::new(base_url.clone()).context("Failed to create API client")?;

    let monitor = ConnectivityMonitor::new(false);
    let probe_client = connectivity::probe_client().context("Failed to create probe client")?;
    monitor.probe_once(&probe_client, &base_url).await;

    Ok(Dispatcher::new(monitor, client, DeviceHandoff))
}

fn report_outcome(outcome: &DispatchOutcome) {
    if outcome.succeeded {
        println!("✓ {}", outcome.message.as_deref().unwrap_or("Alert sent"));
    } else if !outcome.needs_confirmation() {
        println!(
            "✗ {}",
            outcome.message.as_deref().unwrap_or("Alert failed")
        );
    }

    for result in &outcome.per_recipient {
        let mark = if result.delivered { "✓" } else { "✗" };
        println!(
            "  {} {} ({})",
            mark, result.recipient.name, result.recipient.phone_number
        );
    }
}

async fn cmd_panic(config: &Config, store: &ContactStore) -> Result<()> {
    let dispatcher = build_dispatcher(config).await?;
    let location = location::resolve(config);

    if let Some(ref error) = location.error {
        // Surface the provider's reason; the dispatcher will refuse anyway
        eprintln!("Location: {}", error);
    }

    let request = AlertRequest {
        requester_name: store.name().to_string(),
        location: location.fix,
        recipients: store.contacts().to_vec(),
        target_authority: None,
    };

    let outcome = dispatcher.dispatch(&request, DispatchMode::Broadcast).await;
    report_outcome(&outcome);
    Ok(())
}

async fn cmd_authority(config: &Config, store: &ContactStore, kind: Option<&str>) -> Result<()> {
    let kind = match kind.and_then(AuthorityKind::parse) {
        Some(kind) => kind,
        None => {
            eprintln!("Expected one of: police, hospital, fire");
            return Ok(());
        }
    };

    let dispatcher = build_dispatcher(config).await?;
    let location = location::resolve(config);

    let request = AlertRequest {
        requester_name: store.name().to_string(),
        location: location.fix,
        recipients: Vec::new(),
        target_authority: Some(Authority::for_kind(kind)),
    };

    let outcome = dispatcher.dispatch(&request, DispatchMode::Authority).await;
    report_outcome(&outcome);

    // Offline authority path: the dial is a user-confirmed side effect
    if let Some(ref pending) = outcome.pending_call {
        if confirm(&format!(
            "You are offline. Call {} ({}) now?",
            pending.authority.name, pending.authority.phone_number
        ))? {
            if dispatcher.confirm_call(pending).await {
                println!("✓ Dialer opened for {}", pending.authority.name);
            } else {
                println!("✗ Failed to initiate call. Please dial emergency services manually.");
            }
        } else {
            println!("Call cancelled.");
        }
    }
    Ok(())
}

/// Ask a yes/no question on the terminal; defaults to no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn cmd_contacts(store: &mut ContactStore, args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("list") | None => {
            if store.contacts().is_empty() {
                println!("No emergency contacts configured.");
            }
            for contact in store.contacts() {
                println!(
                    "{}  {}  {}  {}",
                    contact.id, contact.name, contact.phone_number, contact.email
                );
            }
            Ok(())
        }
        Some("add") => {
            let (name, phone, email) = match (args.get(1), args.get(2), args.get(3)) {
                (Some(n), Some(p), Some(e)) => (n, p, e),
                _ => {
                    eprintln!("Usage: scriim-cli contacts add <name> <phone> <email>");
                    return Ok(());
                }
            };
            let contact = store.add_contact(name, phone, email)?;
            println!("✓ {} added to your emergency contacts.", contact.name);
            Ok(())
        }
        Some("remove") => {
            let id = match args.get(1) {
                Some(id) => id,
                None => {
                    eprintln!("Usage: scriim-cli contacts remove <id>");
                    return Ok(());
                }
            };
            if store.remove_contact(id)? {
                println!("✓ Contact removed.");
            } else {
                println!("No contact with id {}.", id);
            }
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown contacts subcommand: {}", other);
            Ok(())
        }
    }
}

fn cmd_name(store: &mut ContactStore, args: &[String]) -> Result<()> {
    if args.is_empty() {
        if store.name().is_empty() {
            println!("No name set.");
        } else {
            println!("{}", store.name());
        }
        return Ok(());
    }
    let name = args.join(" ");
    store.set_name(&name)?;
    println!("✓ Name saved.");
    Ok(())
}

async fn cmd_status(config: &Config, store: &ContactStore) -> Result<()> {
    let base_url = config.api_base_url();
    let monitor = ConnectivityMonitor::new(false);
    let probe_client = connectivity::probe_client().context("Failed to create probe client")?;
    let online = monitor.probe_once(&probe_client, &base_url).await;

    let location = location::resolve(config);

    if store.name().is_empty() {
        println!("✗ Name not set");
    } else {
        println!("✓ User: {}", store.name());
    }
    match location.fix {
        Some(fix) => println!("✓ Location available ({}, {})", fix.latitude, fix.longitude),
        None => println!(
            "✗ {}",
            location.error.as_deref().unwrap_or("Location unavailable")
        ),
    }
    if store.contacts().is_empty() {
        println!("✗ No emergency contacts");
    } else {
        println!("✓ {} emergency contacts", store.contacts().len());
    }
    if online {
        println!("✓ Online mode ({})", base_url);
    } else {
        println!("⚠ Offline mode - alerts will use SMS/dial handoffs");
    }
    Ok(())
}

async fn cmd_history(config: &Config) -> Result<()> {
    let client = ApiClient::new(config.api_base_url())?;
    let records = client
        .fetch_panics()
        .await
        .context("Failed to fetch alert history")?;

    if records.is_empty() {
        println!("No alerts on record.");
        return Ok(());
    }

    for record in records {
        let name = record.name.as_deref().unwrap_or("(unknown)");
        let when = record.created_at.as_deref().unwrap_or("-");
        let target = record
            .authority_type
            .map(|k| k.display_name())
            .unwrap_or("contacts");
        match record.location {
            Some(fix) => println!("{}  {}  -> {}  {}", when, name, target, fix.maps_link()),
            None => println!("{}  {}  -> {}", when, name, target),
        }
    }
    Ok(())
}
