use srvledger::config::LedgerConfig;
use srvledger::doctor::{CheckStatus, LedgerDoctor};
use srvledger::server;
use srvledger::{Ledger, Outcome, ServerRecord, Store};

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let matches = Command::new("srvledger")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Shared server reservation ledger")
        .arg(
            Arg::new("store")
                .long("store")
                .short('s')
                .global(true)
                .help("Path to the servers JSON file (overrides config)"),
        )
        .subcommand(Command::new("list").about("Show every server and who holds it"))
        .subcommand(
            Command::new("reserve")
                .about("Reserve a free server")
                .arg(Arg::new("name").required(true))
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("release")
                .about("Release a server you hold")
                .arg(Arg::new("name").required(true))
                .arg(user_arg()),
        )
        .subcommand(Command::new("doctor").about("Check the servers file for problems"))
        .subcommand(
            Command::new("serve")
                .about("Serve the ledger over HTTP")
                .arg(Arg::new("host").long("host").help("Bind address"))
                .arg(
                    Arg::new("port")
                        .long("port")
                        .short('p')
                        .value_parser(clap::value_parser!(u16))
                        .help("Bind port"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show the effective configuration")
                .arg(
                    Arg::new("init")
                        .long("init")
                        .action(clap::ArgAction::SetTrue)
                        .help("Write the effective config to ~/.srvledger/config.toml"),
                ),
        )
        .get_matches();

    let mut config = match LedgerConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Some(store) = matches.get_one::<String>("store") {
        config.store_path = PathBuf::from(store);
    }

    let ledger = Arc::new(Ledger::new(Store::new(config.store_path.clone())));

    match matches.subcommand() {
        Some(("list", _)) => print_servers(&ledger.list()),
        Some(("reserve", args)) => {
            let (name, user) = name_and_user(args);
            report(ledger.reserve(name, user), name);
        }
        Some(("release", args)) => {
            let (name, user) = name_and_user(args);
            report(ledger.release(name, user), name);
        }
        Some(("doctor", _)) => {
            println!("🩺 Checking {}", ledger.store().path().display());
            let report = LedgerDoctor::new().run(ledger.store());
            for check in &report.checks {
                let icon = match check.status {
                    CheckStatus::Pass => "✅",
                    CheckStatus::Warning => "⚠️ ",
                    CheckStatus::Fail => "❌",
                };
                println!("   {} {}: {}", icon, check.name, check.message);
            }
            if report.overall_health == CheckStatus::Fail {
                std::process::exit(1);
            }
        }
        Some(("serve", args)) => {
            if let Some(host) = args.get_one::<String>("host") {
                config.host = host.clone();
            }
            if let Some(port) = args.get_one::<u16>("port") {
                config.port = *port;
            }
            if let Err(e) = server::start_server(ledger, &config.host, config.port).await {
                eprintln!("❌ Server error: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(("config", args)) => {
            match config.to_toml() {
                Ok(toml) => print!("{}", toml),
                Err(e) => {
                    eprintln!("❌ Failed to render config: {:#}", e);
                    std::process::exit(1);
                }
            }
            if args.get_flag("init") {
                match config.save() {
                    Ok(_) => println!("✅ Saved config"),
                    Err(e) => {
                        eprintln!("❌ Failed to save config: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        _ => println!("Use 'srvledger --help'"),
    }
}

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .short('u')
        .required(true)
        .help("Who is holding the server")
}

fn name_and_user(args: &ArgMatches) -> (&str, &str) {
    let name = args.get_one::<String>("name").expect("name is required");
    let user = args.get_one::<String>("user").expect("user is required");
    (name.as_str(), user.as_str())
}

fn report(result: anyhow::Result<Outcome>, name: &str) {
    match result {
        Ok(Outcome::Reserved) => println!("✅ Reserved {}", name),
        Ok(Outcome::Released) => println!("✅ Released {}", name),
        Ok(outcome) => {
            println!("⚠️  {}: {}", name, outcome);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("❌ Failed to update ledger: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn print_servers(servers: &[ServerRecord]) {
    if servers.is_empty() {
        println!("No servers registered.");
        return;
    }
    println!("🖥️  Servers:");
    for s in servers {
        if s.is_free() {
            println!("   🟢 {:<20} free", s.name);
        } else {
            println!("   🔴 {:<20} {} (since {})", s.name, s.user, s.since);
        }
    }
}
