// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docu-Rex: healthcare document portal
//
// Entry point. Initialises logging, opens the portal services, and runs one
// command against the persisted session.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use docurex_bridge::Attachment;
use docurex_core::error::{DocurexError, Result};
use docurex_core::human_errors::humanize_error;
use docurex_core::types::{DocumentId, Role, Session, StorageLocation, UploadedFile, UserId};
use docurex_security::access::{Route, can_access_route, home_route};
use serde::Serialize;

use services::data_dir;
use services::portal::Portal;

#[derive(Parser)]
#[command(name = "docurex")]
#[command(about = "Healthcare document portal with a hash ledger and audit trail")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to $XDG_DATA_HOME/docurex)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in by email
    Login {
        email: String,
        /// Accepted for compatibility; not checked
        #[arg(short, long, default_value = "")]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user and their landing page
    Whoami,
    /// Register a new account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        /// Admin, Doctor, Patient, Researcher, or Auditor
        #[arg(short, long, default_value = "Patient")]
        role: Role,
    },
    /// Upload a document for a patient
    Upload {
        file: PathBuf,
        /// Patient account id
        #[arg(short, long)]
        patient: String,
        /// On-Premises or Cloud
        #[arg(short, long, default_value = "On-Premises")]
        storage: StorageLocation,
        /// MIME type (guessed from the extension if omitted)
        #[arg(long)]
        mime: Option<String>,
    },
    /// List visible documents with their ledger status
    Documents,
    /// Mark a document's ledger entry as verified (admin only)
    Verify { document_id: String },
    /// Check a file against the ledger
    Check { file: PathBuf },
    /// Show ledger entries
    Ledger,
    /// Show the audit log, newest first
    Audit {
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only entries recorded for this user id
        #[arg(short, long)]
        user: Option<String>,
    },
    /// List all accounts
    Users,
    /// List patient accounts
    Patients,
    /// Dashboard counters
    Stats,
    /// Ask the AI assistant
    Ask {
        prompt: String,
        /// Attach a file to the prompt
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show the pages available to the signed-in role
    Routes,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dir = data_dir::data_dir(cli.data_dir);
    let portal = Portal::init(&dir)?;
    let json = cli.json;

    match cli.command {
        Commands::Login { email, password } => {
            let Some(session) = portal.login(&email, &password).await? else {
                return Err(DocurexError::UserNotFound(email));
            };
            let home = home_route(session.role());
            emit(json, &session.user, || {
                format!(
                    "Signed in as {} ({}). Home: {home}",
                    session.user.name,
                    session.role()
                )
            })?;
        }

        Commands::Logout => {
            portal.logout().await?;
            println!("Signed out.");
        }

        Commands::Whoami => {
            let session = require_session(&portal).await?;
            emit(json, &session, || {
                format!(
                    "{} <{}> {} [{}], home {}",
                    session.user.name,
                    session.user.email,
                    session.role(),
                    session.user.id,
                    home_route(session.role())
                )
            })?;
        }

        Commands::Register { name, email, role } => {
            let session = require_session(&portal).await?;
            let outcome = portal.register_user(&session, &name, &email, role).await?;
            emit(json, &outcome, || outcome.message.clone())?;
        }

        Commands::Upload {
            file,
            patient,
            storage,
            mime,
        } => {
            let session = require_session(&portal).await?;
            let upload = read_upload(&file, mime)?;
            let (doc, tx) = portal
                .upload_document(&session, &upload, &UserId(patient), storage)
                .await?;
            emit(json, &doc, || {
                format!(
                    "Uploaded {} ({} bytes) as {}\nhash {}\nledger status Pending, transaction {}",
                    doc.name, doc.size, doc.id, doc.hash, tx.id
                )
            })?;
        }

        Commands::Documents => {
            let session = require_session(&portal).await?;
            let docs = portal.documents_with_status(&session).await?;
            if json {
                let rows: Vec<_> = docs
                    .iter()
                    .map(|(d, s)| serde_json::json!({ "document": d, "status": s }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if docs.is_empty() {
                println!("No documents.");
            } else {
                for (doc, status) in &docs {
                    let status = status.map_or("Unknown".to_owned(), |s| s.to_string());
                    println!(
                        "{:<42} {:<24} {:>9} B  {:<11} {:<8} patient {}",
                        doc.id,
                        doc.name,
                        doc.size,
                        doc.storage_location,
                        status,
                        doc.patient_id
                    );
                }
            }
        }

        Commands::Verify { document_id } => {
            let session = require_session(&portal).await?;
            let id = DocumentId(document_id);
            if portal.verify_document(&session, &id).await? {
                println!("Document {id} verified.");
            } else {
                return Err(DocurexError::DocumentNotFound(id.to_string()));
            }
        }

        Commands::Check { file } => {
            let session = require_session(&portal).await?;
            let upload = read_upload(&file, None)?;
            let report = portal.check_file(&session, &upload).await?;
            emit(json, &report, || match &report.entry {
                Some(entry) => format!(
                    "Found on the ledger: uploaded by {} at {}, status {}",
                    entry.uploader,
                    entry.timestamp.to_rfc3339(),
                    entry.verification_status
                ),
                None => humanize_error(&DocurexError::DocumentNotFound(upload.name.clone())).message,
            })?;
        }

        Commands::Ledger => {
            let session = require_session(&portal).await?;
            let entries = portal.ledger_entries(&session).await?;
            emit(json, &entries, || {
                entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{}  {:<8}  {}  {}",
                            e.document_hash,
                            e.verification_status,
                            e.timestamp.to_rfc3339(),
                            e.uploader
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }

        Commands::Audit { limit, user } => {
            let session = require_session(&portal).await?;
            let mut entries = portal.audit_logs(&session).await?;
            if let Some(user) = user {
                entries.retain(|e| e.user_id.0 == user);
            }
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            emit(json, &entries, || {
                entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{}  {:<21}  {} ({})  {}",
                            e.timestamp.to_rfc3339(),
                            e.action,
                            e.user_name,
                            e.user_role,
                            e.details
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }

        Commands::Users => {
            let session = require_session(&portal).await?;
            let users = portal.all_users(&session).await?;
            emit(json, &users, || user_lines(&users))?;
        }

        Commands::Patients => {
            let session = require_session(&portal).await?;
            let users = portal.patients(&session).await?;
            emit(json, &users, || user_lines(&users))?;
        }

        Commands::Stats => {
            let session = require_session(&portal).await?;
            let stats = portal.dashboard_stats(&session).await?;
            emit(json, &stats, || {
                format!(
                    "Total users:           {}\nDocuments stored:      {}\n\
                     Pending verifications: {}\nAudit events:          {}",
                    stats.total_users,
                    stats.documents_stored,
                    stats.pending_verifications,
                    stats.audit_events
                )
            })?;
        }

        Commands::Ask { prompt, file } => {
            let session = require_session(&portal).await?;
            let attachment = match file {
                Some(path) => {
                    let upload = read_upload(&path, None)?;
                    Some(Attachment::new(upload.name, upload.mime_type, upload.bytes))
                }
                None => None,
            };
            println!("{}", portal.ask_assistant(&session, &prompt, attachment).await);
        }

        Commands::Routes => {
            let session = require_session(&portal).await?;
            let home = home_route(session.role());
            for route in Route::ALL {
                if can_access_route(&session.user, route) {
                    let marker = if route == home { " (home)" } else { "" };
                    println!("{route}{marker}");
                }
            }
        }
    }

    Ok(())
}

async fn require_session(portal: &Portal) -> Result<Session> {
    portal.current_session().await?.ok_or(DocurexError::NotSignedIn)
}

fn read_upload(path: &Path, mime: Option<String>) -> Result<UploadedFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = mime.unwrap_or_else(|| UploadedFile::mime_from_name(&name).to_owned());
    Ok(UploadedFile::new(name, mime, bytes))
}

fn user_lines(users: &[docurex_core::types::User]) -> String {
    users
        .iter()
        .map(|u| format!("{:<42} {:<20} {:<28} {}", u.id, u.name, u.email, u.role))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print `value` as JSON, or the human rendering.
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
