//! Command-line driver for the webnotes core.
//!
//! # Responsibility
//! - Wire config, logging, storage, sessions and services the way a page
//!   handler would, one command per process.
//! - Print render-ready projections, or JSON with `--json`.
//!
//! # Invariants
//! - Every note command logs in first and runs behind the auth gate.
//! - Service errors print their user-visible message; setup errors print
//!   their full cause chain. Both exit non-zero.

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use webnotes_core::auth::gate::token_from_cookie_header;
use webnotes_core::model::note::parse_note_id;
use webnotes_core::{
    init_logging, open_db, AppConfig, AuthGate, AuthService, GateOutcome, NoteEditView, NoteForm,
    NoteId, NoteService, NoteView, Page, RegisterForm, SessionCache, SqliteNoteStore,
    SqliteUserStore, UserId,
};

#[derive(Parser)]
#[command(name = "webnotes", version, about = "Personal notes with deadlines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Credentials {
    #[arg(long)]
    login: String,
    #[arg(long)]
    password: String,
}

#[derive(Args)]
struct NoteFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: String,
    /// Deadline as YYYY-MM-DD.
    #[arg(long)]
    deadline: Option<String>,
}

impl NoteFields {
    fn to_form(&self) -> NoteForm {
        NoteForm {
            name: self.name.clone(),
            description: self.description.clone(),
            has_deadline: self.deadline.is_some(),
            deadline: self.deadline.clone().unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create an account.
    Register {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        confirm_password: String,
    },
    #[command(flatten)]
    Note(NoteCommand),
}

/// Commands that run behind the auth gate.
#[derive(Subcommand)]
enum NoteCommand {
    /// Add a note.
    Add {
        #[command(flatten)]
        credentials: Credentials,
        #[command(flatten)]
        fields: NoteFields,
    },
    /// List notes, optionally filtered by a substring.
    List {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long, action)]
        json: bool,
    },
    /// Show the values the update form would be prefilled with.
    Edit {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
        #[arg(long, action)]
        json: bool,
    },
    /// Replace a note's fields.
    Update {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
        #[command(flatten)]
        fields: NoteFields,
        #[arg(long, action)]
        completed: bool,
    },
    /// Complete an open note, or return a completed one to work.
    Toggle {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
    },
    /// Delete a note.
    Delete {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(value_parser = parse_note_id)]
        id: NoteId,
    },
}

impl NoteCommand {
    fn credentials(&self) -> &Credentials {
        match self {
            Self::Add { credentials, .. }
            | Self::List { credentials, .. }
            | Self::Edit { credentials, .. }
            | Self::Update { credentials, .. }
            | Self::Toggle { credentials, .. }
            | Self::Delete { credentials, .. } => credentials,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    let hasher = config.password_hasher.build();
    let sessions = Arc::new(SessionCache::new(Arc::clone(&hasher)));
    let users = SqliteUserStore::try_new(&conn).context("failed to prepare user store")?;
    let auth = AuthService::new(users, hasher, Arc::clone(&sessions))
        .with_cookie_ttl(config.cookie_ttl());

    let command = match cli.command {
        Command::Register {
            credentials,
            confirm_password,
        } => {
            let form = RegisterForm {
                login: credentials.login,
                password: credentials.password,
                confirm_password,
            };
            let user_id = auth
                .register(&form)
                .map_err(|err| anyhow!(err.user_message()))?;
            println!("registered user_id={user_id}");
            return Ok(());
        }
        Command::Note(command) => command,
    };

    let credentials = command.credentials();
    let session = auth
        .login(&credentials.login, &credentials.password)
        .map_err(|err| anyhow!(err.user_message()))?;

    let store = SqliteNoteStore::try_new(&conn).context("failed to prepare note store")?;
    let service = NoteService::new(store);
    // The Set-Cookie value parses as a Cookie header for the `token` pair.
    let gate = AuthGate::new(sessions);
    let outcome = gate.guard(Some(&session.set_cookie), |user_id| {
        run_note_command(&service, &config, user_id, &command)
    });
    auth.logout(token_from_cookie_header(&session.set_cookie));

    match outcome {
        GateOutcome::Handled(result) => result,
        GateOutcome::RedirectToLogin(reason) => {
            warn!(
                "event=cli_command module=cli status=denied reason={}",
                reason.as_str()
            );
            bail!("session is not valid, please log in again")
        }
    }
}

fn run_note_command(
    service: &NoteService<SqliteNoteStore<'_>>,
    config: &AppConfig,
    user_id: UserId,
    command: &NoteCommand,
) -> anyhow::Result<()> {
    let now = chrono::Utc::now();

    match command {
        NoteCommand::Add { fields, .. } => {
            let id = service
                .create_note_at(user_id, &fields.to_form(), now)
                .map_err(|err| anyhow!(err.user_message()))?;
            println!("added note id={id}");
        }
        NoteCommand::List {
            search,
            limit,
            offset,
            json,
            ..
        } => {
            let page = Page::new(Some(limit.unwrap_or(config.page_limit)), *offset);
            let notes = service
                .list_notes(user_id, search.as_deref(), page, now)
                .map_err(|err| anyhow!(err.user_message()))?;
            info!(
                "event=cli_list module=cli status=ok user_id={} count={}",
                user_id,
                notes.items.len()
            );
            if *json {
                print_json(&notes.items)?;
            } else {
                notes.items.iter().for_each(print_note);
            }
        }
        NoteCommand::Edit { id, json, .. } => {
            let view = service
                .edit_view(*id)
                .map_err(|err| anyhow!(err.user_message()))?;
            if *json {
                print_json(&view)?;
            } else {
                print_edit(&view);
            }
        }
        NoteCommand::Update {
            id,
            fields,
            completed,
            ..
        } => {
            service
                .update_note(*id, &fields.to_form(), *completed)
                .map_err(|err| anyhow!(err.user_message()))?;
            println!("updated note id={id}");
        }
        NoteCommand::Toggle { id, .. } => {
            let transition = service
                .toggle_status(*id, now)
                .map_err(|err| anyhow!(err.user_message()))?;
            println!("note id={id}: {}", transition.label());
        }
        NoteCommand::Delete { id, .. } => {
            service
                .delete_note(*id)
                .map_err(|err| anyhow!(err.user_message()))?;
            println!("deleted note id={id}");
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
    println!("{text}");
    Ok(())
}

fn print_note(view: &NoteView) {
    let deadline = if view.deadline.is_empty() {
        "-"
    } else {
        view.deadline.as_str()
    };
    println!(
        "#{} [{}] {} (created {}, deadline {}) next: {}",
        view.id,
        view.category_label,
        view.name,
        view.created_at,
        deadline,
        view.next_transition_label
    );
    if !view.description.is_empty() {
        println!("    {}", view.description);
    }
}

fn print_edit(view: &NoteEditView) {
    println!("id:           {}", view.id);
    println!("name:         {}", view.name);
    println!("description:  {}", view.description);
    println!("has_deadline: {}", view.has_deadline);
    println!("deadline:     {}", view.deadline);
    println!("completed:    {}", view.is_completed);
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, NoteCommand};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn register_is_parsed_apart_from_note_commands() {
        let cli = Cli::try_parse_from([
            "webnotes",
            "register",
            "--login",
            "alice",
            "--password",
            "secret",
            "--confirm-password",
            "secret",
        ])
        .expect("register should parse");
        assert!(matches!(cli.command, Command::Register { .. }));
    }

    #[test]
    fn note_commands_parse_ids_and_flags() {
        let cli = Cli::try_parse_from([
            "webnotes", "toggle", "--login", "alice", "--password", "secret", "42",
        ])
        .expect("toggle should parse");
        match cli.command {
            Command::Note(NoteCommand::Toggle { credentials, id }) => {
                assert_eq!(credentials.login, "alice");
                assert_eq!(id, 42);
            }
            _ => panic!("expected toggle"),
        }

        let cli = Cli::try_parse_from([
            "webnotes", "list", "--login", "a", "--password", "p", "--limit", "3", "--json",
        ])
        .expect("list should parse");
        assert!(matches!(
            cli.command,
            Command::Note(NoteCommand::List {
                limit: Some(3),
                json: true,
                ..
            })
        ));
    }

    #[test]
    fn malformed_note_id_is_rejected() {
        let parsed = Cli::try_parse_from([
            "webnotes", "delete", "--login", "a", "--password", "p", "abc",
        ]);
        assert!(parsed.is_err());
    }
}
