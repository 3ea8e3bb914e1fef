//! Operator CLI for migrating legacy tournaments to canonical configs.
//!
//! Every command prints a JSON report on stdout. Anything that writes to the
//! database needs `--live`; the destructive ones also need `--confirm`.

mod config;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::{Context, Error, anyhow, bail};
use log::info;
use pico_args::Arguments;
use serde::Serialize;
use tourney::{
    TournamentId,
    db::{Database, TournamentRepository},
    migration::{MigrationOrchestrator, MigrationTestHarness, MigrationTranslator},
};

use crate::config::MigrationSettings;

const HELP: &str = "\
Migrate legacy tournaments to canonical tournament configs

USAGE:
  tourney_migrate <COMMAND> [ID...] [OPTIONS]

COMMANDS:
  stats                    Migration progress across all tournaments
  readiness                Classify legacy tournaments by migration readiness
  preview <ID>             Show the migration result without writing
  migrate <ID>             Migrate one tournament
  batch <ID>...            Migrate several tournaments in chunks
  migrate-all              Migrate every tournament without a config
  rollback <ID>            Clear a tournament's config and generated matches
  test <ID>...             Run migration checks
  generate <ID>            Generate and store the bracket of a migrated tournament

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --batch-size N           Tournaments per chunk        [default: env MIGRATION_BATCH_SIZE or 10]
  --confirm    TOKEN       MIGRATE_ALL for live migrate-all, ROLLBACK_<ID> for rollback

FLAGS:
  --live                   Write changes (commands are dry runs otherwise)
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  MIGRATION_BATCH_SIZE     Tournaments per chunk
  MIGRATION_BATCH_PAUSE_MS Pause between chunks in milliseconds
  (See .env for all configuration options)
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Stats,
    Readiness,
    Preview(TournamentId),
    Migrate(TournamentId),
    Batch(Vec<TournamentId>),
    MigrateAll,
    Rollback(TournamentId),
    Test(Vec<TournamentId>),
    Generate(TournamentId),
}

struct Args {
    command: Command,
    live: bool,
    confirm: Option<String>,
    database_url: Option<String>,
    batch_size: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RollbackReport {
    tournament_id: TournamentId,
    rolled_back: bool,
}

fn parse_ids(free: Vec<OsString>) -> Result<Vec<TournamentId>, Error> {
    free.into_iter()
        .map(|arg| {
            let arg = arg
                .into_string()
                .map_err(|arg| anyhow!("Invalid argument: {arg:?}"))?;
            arg.parse()
                .with_context(|| format!("Invalid tournament id: {arg}"))
        })
        .collect()
}

fn single_id(name: &str, ids: Vec<TournamentId>) -> Result<TournamentId, Error> {
    match ids.as_slice() {
        [id] => Ok(*id),
        _ => bail!("`{name}` takes exactly one tournament id"),
    }
}

fn no_ids(name: &str, ids: &[TournamentId]) -> Result<(), Error> {
    if ids.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("`{name}` takes no tournament ids"))
    }
}

fn some_ids(name: &str, ids: Vec<TournamentId>) -> Result<Vec<TournamentId>, Error> {
    if ids.is_empty() {
        Err(anyhow!("`{name}` needs at least one tournament id"))
    } else {
        Ok(ids)
    }
}

fn parse_command(name: &str, ids: Vec<TournamentId>) -> Result<Command, Error> {
    match name {
        "stats" => no_ids(name, &ids).map(|()| Command::Stats),
        "readiness" => no_ids(name, &ids).map(|()| Command::Readiness),
        "migrate-all" => no_ids(name, &ids).map(|()| Command::MigrateAll),
        "preview" => Ok(Command::Preview(single_id(name, ids)?)),
        "migrate" => Ok(Command::Migrate(single_id(name, ids)?)),
        "rollback" => Ok(Command::Rollback(single_id(name, ids)?)),
        "generate" => Ok(Command::Generate(single_id(name, ids)?)),
        "batch" => Ok(Command::Batch(some_ids(name, ids)?)),
        "test" => Ok(Command::Test(some_ids(name, ids)?)),
        other => bail!("Unknown command `{other}`; see --help"),
    }
}

/// Refuse live or destructive commands that lack their flags
fn check_guards(args: &Args) -> Result<(), Error> {
    let confirm = args.confirm.as_deref();
    match &args.command {
        Command::MigrateAll if args.live && confirm != Some("MIGRATE_ALL") => {
            bail!("Live migrate-all requires --confirm MIGRATE_ALL")
        }
        Command::Rollback(id) => {
            if !args.live {
                bail!("rollback writes to the database; pass --live");
            }
            let expected = format!("ROLLBACK_{id}");
            if confirm != Some(expected.as_str()) {
                bail!("Rollback requires --confirm {expected}");
            }
            Ok(())
        }
        Command::Generate(_) if !args.live => {
            bail!("generate stores matches; pass --live")
        }
        _ => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let name: Option<String> = pargs.subcommand()?;
    let live = pargs.contains("--live");
    let confirm = pargs.opt_value_from_str("--confirm")?;
    let database_url = pargs.opt_value_from_str("--db-url")?;
    let batch_size = pargs.opt_value_from_str("--batch-size")?;
    let ids = parse_ids(pargs.finish())?;

    let Some(name) = name else {
        print!("{HELP}");
        std::process::exit(2);
    };

    let args = Args {
        command: parse_command(&name, ids)?,
        live,
        confirm,
        database_url,
        batch_size,
    };
    check_guards(&args)?;

    logging::init();

    let settings = MigrationSettings::from_env(args.database_url.clone(), args.batch_size)?;
    let db = Database::new(&settings.database)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {e}"))?;
    info!("Database connected successfully");

    let repo: Arc<dyn TournamentRepository> = Arc::new(db.tournaments());
    let orchestrator = MigrationOrchestrator::new(repo)
        .with_translator(MigrationTranslator::new(settings.translator))
        .with_settings(settings.orchestrator());
    let dry_run = !args.live;
    if dry_run {
        info!("Dry run: no changes will be written");
    }

    match args.command {
        Command::Stats => print_json(&orchestrator.stats().await?)?,
        Command::Readiness => print_json(&orchestrator.readiness_report().await?)?,
        Command::Preview(id) => print_json(&orchestrator.preview(id).await)?,
        Command::Migrate(id) => print_json(&orchestrator.migrate_single(id, dry_run).await)?,
        Command::Batch(ids) => print_json(
            &orchestrator
                .migrate_batch(&ids, settings.batch_size, dry_run)
                .await,
        )?,
        Command::MigrateAll => print_json(&orchestrator.migrate_all(dry_run).await?)?,
        Command::Rollback(id) => {
            let rolled_back = orchestrator.rollback(id).await;
            print_json(&RollbackReport {
                tournament_id: id,
                rolled_back,
            })?;
            if !rolled_back {
                bail!("Rollback of tournament {id} failed; see log for details");
            }
        }
        Command::Test(ids) => {
            let harness = MigrationTestHarness::new(orchestrator);
            print_json(&harness.run_suite(&ids, dry_run).await)?;
        }
        Command::Generate(id) => print_json(&orchestrator.generate_bracket(id).await?)?,
    }

    db.close().await;
    Ok(())
}
