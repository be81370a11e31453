//! Admin command line for the training portal documents.
//!
//! Prints the result of each command as JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use dotenvy::dotenv;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use models::RecordingInput;
use service::auth::Session;
use service::export::export_snapshot;
use service::portal::DynPortalClient;
use service::sql::QueryClient;

const USAGE: &str = "\
usage: admin <command> [args]

commands:
  list                                    show all training days with recordings
  stats                                   dashboard counters
  unlock <day>                            unlock a day (actor from ADMIN_ACTOR, default admin)
  lock <day>                              lock a day
  unlock-all                              unlock every day
  upload <day> <title> <url> <duration>   attach a recording to a day
  remove <day>                            remove the recordings of a day
  export [dir]                            write a JSON snapshot (default ./export)
  users                                   list portal users (needs FABRIC_SQL_ENDPOINT)
  deactivate <recording-id>               soft-delete a recording (needs FABRIC_SQL_ENDPOINT)";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List,
    Stats,
    Unlock(u32),
    Lock(u32),
    UnlockAll,
    Upload { day: u32, title: String, url: String, duration: String },
    Remove(u32),
    Export(PathBuf),
    Users,
    Deactivate(Uuid),
}

fn parse_day(raw: Option<&String>) -> Result<u32, String> {
    let raw = raw.ok_or("missing <day>")?;
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid day number: {raw}")),
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let (name, rest) = args.split_first().ok_or("missing command")?;
    let cmd = match name.as_str() {
        "list" => Command::List,
        "stats" => Command::Stats,
        "unlock" => Command::Unlock(parse_day(rest.first())?),
        "lock" => Command::Lock(parse_day(rest.first())?),
        "unlock-all" => Command::UnlockAll,
        "remove" => Command::Remove(parse_day(rest.first())?),
        "upload" => {
            if rest.len() != 4 {
                return Err("upload needs <day> <title> <url> <duration>".into());
            }
            Command::Upload {
                day: parse_day(rest.first())?,
                title: rest[1].clone(),
                url: rest[2].clone(),
                duration: rest[3].clone(),
            }
        }
        "users" => Command::Users,
        "deactivate" => {
            let raw = rest.first().ok_or("missing <recording-id>")?;
            Command::Deactivate(Uuid::parse_str(raw).map_err(|_| format!("invalid recording id: {raw}"))?)
        }
        "export" => Command::Export(rest.first().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("export"))),
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(cmd)
}

/// What a command runs against. `sql` is absent unless `FABRIC_SQL_ENDPOINT` is set.
struct Targets<'a> {
    portal: &'a DynPortalClient,
    sql: Option<&'a QueryClient>,
    session: &'a Session,
    actor: &'a str,
}

impl Targets<'_> {
    fn sql(&self) -> anyhow::Result<&QueryClient> {
        self.sql.ok_or_else(|| anyhow::anyhow!("SQL endpoint not configured (set FABRIC_SQL_ENDPOINT)"))
    }
}

async fn execute(cmd: Command, t: &Targets<'_>) -> anyhow::Result<Value> {
    let Targets { portal, session, actor, .. } = *t;
    let out = match cmd {
        Command::List => serde_json::to_value(portal.get_training_days_with_recordings().await)?,
        Command::Stats => serde_json::to_value(portal.get_dashboard_stats().await)?,
        Command::Unlock(day) => serde_json::to_value(portal.unlock_day(session, day, actor).await?)?,
        Command::Lock(day) => serde_json::to_value(portal.lock_day(session, day).await?)?,
        Command::UnlockAll => {
            let days = portal.unlock_all_days(session, actor).await?;
            json!({ "unlocked": days.len() })
        }
        Command::Upload { day, title, url, duration } => {
            let input = RecordingInput {
                day_number: day,
                title,
                video_url: url,
                platform: None,
                duration,
                uploaded_by: actor.to_string(),
            };
            serde_json::to_value(portal.upload_recording(session, input).await?)?
        }
        Command::Remove(day) => {
            let removed = portal.remove_recording_for_day(session, day).await?;
            json!({ "dayNumber": day, "removed": removed })
        }
        Command::Export(dir) => serde_json::to_value(export_snapshot(portal, dir).await?)?,
        Command::Users => serde_json::to_value(t.sql()?.list_users(session).await)?,
        Command::Deactivate(id) => {
            if !t.sql()?.deactivate_recording(session, id).await? {
                anyhow::bail!("recording {id} not found");
            }
            json!({ "recordingId": id, "isActive": false })
        }
    };
    Ok(out)
}

async fn run(cmd: Command) -> anyhow::Result<Value> {
    let cfg = configs::AppConfig::load_and_validate()?;
    let portal = DynPortalClient::from_config(&cfg.store)?;
    let sql = QueryClient::from_config(&cfg.sql)?;
    let session = Session::from_config(&cfg.identity).await?;
    let actor = std::env::var("ADMIN_ACTOR").unwrap_or_else(|_| "admin".to_string());
    let targets = Targets { portal: &portal, sql: sql.as_ref(), session: &session, actor: &actor };
    execute(cmd, &targets).await
}

fn main() -> ExitCode {
    dotenv().ok();
    common::utils::logging::init_logging_cli();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cmd = match parse_args(&args) {
        Ok(cmd) => cmd,
        Err(msg) => {
            eprintln!("error: {msg}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cmd)) {
        Ok(out) => {
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
