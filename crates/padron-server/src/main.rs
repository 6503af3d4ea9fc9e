mod config;

use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use padron_adapters::gateway::HttpVerificationGateway;
use padron_adapters::persistence::sqlite::SqliteDb;
use padron_app::roll_service::RollService;
use padron_app::verification_service::VerificationService;
use padron_core::registrant::NationalId;
use padron_core::roll::RollEntry;
use padron_core::verification::countdown::format_clock;
use padron_ports::outbound::RollRepository;
use padron_ports::types::{RawEnrollment, RawReferral, VerificationPhase};

use config::Config;

type Verification = VerificationService<HttpVerificationGateway, SqliteDb, SqliteDb>;
type Desk = RollService<SqliteDb, SqliteDb>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::load();
    let db = SqliteDb::new(&config.database_url).await?;
    let gateway = HttpVerificationGateway::new(config.gateway_url.clone());

    let verification = Arc::new(VerificationService::new(gateway, db.clone(), db.clone()));
    let desk = RollService::new(db.clone(), db.clone());

    // countdown scheduler: re-evaluates the deadline against wall clock on
    // every tick, so a delayed tick cannot stretch the window
    {
        let verification = Arc::clone(&verification);
        let period = std::time::Duration::from_secs(config.tick_seconds);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match verification.tick(Utc::now()).await {
                    Ok(Some(0)) => info!("verification code expired"),
                    Ok(_) => {}
                    Err(e) => error!("countdown tick failed: {e}"),
                }
            }
        });
    }

    info!(
        gateway = config.gateway_url,
        database = config.database_url,
        "operations desk ready, type `help` for commands"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        handle_line(line, &verification, &desk, &db).await;
    }

    Ok(())
}

async fn handle_line(line: &str, verification: &Verification, desk: &Desk, db: &SqliteDb) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["help"] => print_help(),
        ["enroll", name, surname, national_id, country, area, subscriber] => {
            let enrollment = RawEnrollment {
                name: (*name).into(),
                surname: (*surname).into(),
                national_id: (*national_id).into(),
                country_code: (*country).into(),
                area_code: (*area).into(),
                subscriber_number: (*subscriber).into(),
            };
            match verification.request_code(enrollment, Utc::now()).await {
                Ok(masked) => println!("code sent to {masked}"),
                Err(e) => println!("error: {e}"),
            }
        }
        ["code", code] => match verification.confirm_code(code, Utc::now()).await {
            Ok(()) => println!("code confirmed, credentials issued"),
            Err(e) => println!("error: {e}"),
        },
        ["finalize"] => match verification.finalize(Utc::now()).await {
            Ok(id) => println!("registration recorded: {id}"),
            Err(e) => println!("error: {e}"),
        },
        ["recover", national_id] => {
            match verification.begin_identity_check(national_id, Utc::now()).await {
                Ok(masked) => println!("code sent to the number on file: {masked}"),
                Err(e) => println!("error: {e}"),
            }
        }
        ["status"] => match verification.phase(Utc::now()) {
            VerificationPhase::Idle => println!("idle"),
            VerificationPhase::AwaitingCode {
                masked_phone,
                remaining_seconds,
                ..
            } => println!(
                "waiting for the code sent to {masked_phone}, {} left",
                format_clock(remaining_seconds)
            ),
            VerificationPhase::Expired => println!("code expired, enroll again"),
            VerificationPhase::Confirmed => println!("confirmed, run `finalize`"),
        },
        ["reset"] => {
            verification.reset();
            println!("attempt discarded");
        }
        ["lookup", document] => match desk.verify_document(document).await {
            Ok(entry) => println!(
                "{} | circuit {} table {} order {}",
                entry.full_name, entry.circuit_code, entry.table_number, entry.ballot_order
            ),
            Err(e) => println!("error: {e}"),
        },
        ["refer", document, superior_id, direct @ ..] if !direct.is_empty() => {
            let Ok(superior_id) = superior_id.parse() else {
                println!("error: superior id must be a number");
                return;
            };
            let referral = RawReferral {
                document: (*document).into(),
                superior_id,
                intermediate: String::new(),
                direct: direct.join(" "),
                created_by: "console".into(),
            };
            match desk.record_referral(referral, Utc::now()).await {
                Ok(id) => println!("referral recorded: {id}"),
                Err(e) => println!("error: {e}"),
            }
        }
        ["checkin", document, operator] => {
            match desk.check_in(document, operator, Utc::now()).await {
                Ok(check_in) => println!(
                    "{} checked in at {}",
                    check_in.document,
                    check_in.verified_at.format("%H:%M:%S")
                ),
                Err(e) => println!("error: {e}"),
            }
        }
        ["present"] => match desk.checked_in().await {
            Ok(check_ins) => {
                for check_in in &check_ins {
                    println!(
                        "{} by {} at {}",
                        check_in.document,
                        check_in.verified_by,
                        check_in.verified_at.format("%H:%M:%S")
                    );
                }
                println!("{} present", check_ins.len());
            }
            Err(e) => println!("error: {e}"),
        },
        ["import", document, circuit, table, order, full_name @ ..] if !full_name.is_empty() => {
            let document = match NationalId::new(document) {
                Ok(document) => document,
                Err(e) => {
                    println!("error: {e}");
                    return;
                }
            };
            let (Ok(table_number), Ok(ballot_order)) = (table.parse(), order.parse()) else {
                println!("error: table and order must be numbers");
                return;
            };
            let entry = RollEntry {
                document,
                full_name: full_name.join(" "),
                sex: String::new(),
                circuit_code: (*circuit).into(),
                table_number,
                ballot_order,
            };
            match db.save_entry(&entry).await {
                Ok(()) => println!("roll entry saved"),
                Err(e) => println!("error: {e}"),
            }
        }
        _ => println!("unknown command, type `help`"),
    }
}

fn print_help() {
    println!("commands:");
    println!("  enroll <name> <surname> <national-id> <country> <area> <subscriber>");
    println!("  code <nn>                 confirm the received code");
    println!("  finalize                  record the confirmed registration");
    println!("  recover <national-id>     re-send credentials to the phone on file");
    println!("  status                    show the verification attempt");
    println!("  reset                     discard the verification attempt");
    println!("  lookup <document>         find a voter on the roll");
    println!("  refer <document> <superior-id> <direct sponsor>");
    println!("  checkin <document> <operator>");
    println!("  present                   list checked-in voters");
    println!("  import <document> <circuit> <table> <order> <full name>");
    println!("  quit");
}
