use clap::{Parser, Subcommand};
use gym_core::readiness::connect;
use gym_core::session::format_elapsed;
use gym_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gymlog")]
#[command(about = "Guided workout sessions and workout history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Account to log workouts under (defaults to `[profile] account`)
    #[arg(long, global = true)]
    account: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the workout plans (default)
    Plans,

    /// Run a guided workout session
    Start {
        /// Plan id from `gymlog plans` (defaults to the first plan)
        #[arg(long)]
        plan: Option<String>,

        /// Dry run - show the plan without logging a session
        #[arg(long)]
        dry_run: bool,

        /// Auto-complete (for testing) - complete every exercise in order
        #[arg(long, conflicts_with = "auto_skip")]
        auto_complete: bool,

        /// Auto-skip (for testing) - skip the first exercise, then complete everything
        #[arg(long, conflicts_with = "auto_complete")]
        auto_skip: bool,
    },

    /// Show workout history, newest first
    History {
        /// Also append the history to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print a bearer token for the account (for the HTTP server)
    Token,
}

fn main() -> Result<()> {
    gym_core::logging::init_cli();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    let account = AccountId::new(
        cli.account
            .unwrap_or_else(|| config.profile.account.clone()),
    )?;

    match cli.command {
        Some(Commands::Plans) | None => cmd_plans(),
        Some(Commands::Start {
            plan,
            dry_run,
            auto_complete,
            auto_skip,
        }) => {
            let mode = if auto_complete {
                InputMode::AutoComplete
            } else if auto_skip {
                InputMode::AutoSkip { skipped: false }
            } else {
                InputMode::Interactive
            };
            cmd_start(&config, &account, plan, dry_run, mode)
        }
        Some(Commands::History { csv }) => cmd_history(&config, &account, csv),
        Some(Commands::Token) => cmd_token(&config, &account),
    }
}

/// Log service over the JSONL store in the data directory
fn open_service(config: &Config) -> Result<WorkoutLogService> {
    let store = Arc::new(JsonlStore::new(config.store_path()));
    let readiness = Readiness::new();
    connect(store.as_ref(), &readiness)?;
    Ok(WorkoutLogService::new(store, readiness))
}

fn cmd_plans() -> Result<()> {
    let catalog = default_catalog();
    for plan in &catalog.plans {
        println!();
        println!("  {} [{}]", plan.title, plan.id);
        println!("  {} · {} · {}", plan.difficulty, plan.duration, plan.description);
        for (i, exercise) in plan.exercises.iter().enumerate() {
            println!("    {}. {}", i + 1, exercise);
        }
    }
    println!();
    Ok(())
}

fn cmd_start(
    config: &Config,
    account: &AccountId,
    plan_id: Option<String>,
    dry_run: bool,
    mut mode: InputMode,
) -> Result<()> {
    let catalog = default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let plan = match plan_id {
        Some(id) => find_plan(&id).ok_or_else(|| {
            Error::Validation(format!("Unknown plan: {}. Run `gymlog plans` to list plans.", id))
        })?,
        None => catalog
            .plans
            .first()
            .ok_or_else(|| Error::CatalogValidation("Catalog has no plans".into()))?,
    };

    display_plan(plan);

    if dry_run {
        println!("\n[Dry run - not logging session]");
        return Ok(());
    }

    let service = open_service(config)?;
    let log = service.start_session(account, plan.snapshot(), plan.exercises.clone())?;
    println!("Started workout log {}", log.id);

    let session: SharedSession = Arc::new(Mutex::new(WorkoutSession::new(plan.exercises.clone())));
    lock(&session).start();
    let timer = SessionTimer::start_per_second(Arc::clone(&session));

    let result = run_session(&service, account, log.id, &session, &mut mode);
    timer.stop();
    result
}

/// Drive the engine until it completes, the user finishes early or quits
fn run_session(
    service: &WorkoutLogService,
    account: &AccountId,
    log_id: Uuid,
    session: &SharedSession,
    mode: &mut InputMode,
) -> Result<()> {
    loop {
        let Some((index, name)) = next_exercise(&lock(session)) else {
            return Ok(());
        };
        display_status(&lock(session), index, &name);

        match mode.next_action()? {
            UserAction::Done => {
                let outcome = lock(session).complete_exercise(index);
                if outcome == ExerciseOutcome::Ignored {
                    continue;
                }

                let log = service.set_exercise_completion(account, log_id, index as i64, true)?;
                println!(
                    "\n✓ {} done ({}/{})",
                    name, log.completed_exercises, log.total_exercises
                );

                if outcome == ExerciseOutcome::SessionComplete {
                    let elapsed = lock(session).elapsed_seconds();
                    let log = service.update_duration(account, log_id, elapsed)?;
                    if !log.is_completed {
                        tracing::warn!(
                            "Session finished but log {} is not complete ({}/{})",
                            log.id,
                            log.completed_exercises,
                            log.total_exercises
                        );
                    }
                    println!("\n✓ Workout complete in {}!", format_elapsed(elapsed));
                    return Ok(());
                }
            }

            UserAction::Skip => {
                if lock(session).skip_exercise() {
                    println!("\nSkipped {} - it comes back at the end.", name);
                } else {
                    println!("\nNothing left to skip to.");
                }
            }

            UserAction::Finish => {
                let elapsed = lock(session).elapsed_seconds();
                let log = service.complete_session(account, log_id, Some(elapsed))?;
                println!(
                    "\n✓ Workout finished early ({}/{} exercises, {})",
                    log.completed_exercises,
                    log.total_exercises,
                    format_elapsed(elapsed)
                );
                return Ok(());
            }

            UserAction::Quit => {
                println!("\nLeaving workout log {} open.", log_id);
                return Ok(());
            }
        }
    }
}

/// Current exercise if still pending, otherwise the first one skipped earlier
fn next_exercise(session: &WorkoutSession) -> Option<(usize, String)> {
    if session.phase() == SessionPhase::Complete {
        return None;
    }
    let current = session.current_index();
    let index = if current < session.total() && !session.is_exercise_completed(current) {
        current
    } else {
        (0..session.total()).find(|&i| !session.is_exercise_completed(i))?
    };
    Some((index, session.exercises()[index].clone()))
}

fn lock(session: &SharedSession) -> MutexGuard<'_, WorkoutSession> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn cmd_history(config: &Config, account: &AccountId, csv: Option<PathBuf>) -> Result<()> {
    let service = open_service(config)?;
    let logs = service.get_history(account)?;

    if logs.is_empty() {
        println!("No workouts logged yet.");
    } else {
        println!(
            "{:<17} {:<20} {:>9} {:>6}  {}",
            "Started", "Plan", "Exercises", "Time", "Status"
        );
        for log in &logs {
            println!(
                "{:<17} {:<20} {:>9} {:>6}  {}",
                log.started_at.format("%Y-%m-%d %H:%M"),
                log.workout_plan.title,
                format!("{}/{}", log.completed_exercises, log.total_exercises),
                format_elapsed(log.workout_duration),
                if log.is_completed { "done" } else { "open" }
            );
        }
    }

    if let Some(path) = csv {
        let count = export_history_csv(&logs, &path)?;
        println!("✓ Exported {} workouts to {}", count, path.display());
    }

    Ok(())
}

fn cmd_token(config: &Config, account: &AccountId) -> Result<()> {
    let provider = HmacTokenProvider::from_config(&config.auth);
    println!("{}", provider.issue(account)?);
    Ok(())
}

fn display_plan(plan: &WorkoutPlan) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", plan.title.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {} · {}", plan.difficulty, plan.duration);
    println!("  {}", plan.description);
    println!();
    for (i, exercise) in plan.exercises.iter().enumerate() {
        println!("  {}. {}", i + 1, exercise);
    }
    println!();
}

fn display_status(session: &WorkoutSession, index: usize, name: &str) {
    println!("─────────────────────────────────────────");
    println!(
        "  [{}/{}] {}    ⏱ {}    {}%",
        index + 1,
        session.total(),
        name,
        session.elapsed_label(),
        session.progress_percent()
    );
}

enum UserAction {
    Done,
    Skip,
    Finish,
    Quit,
}

enum InputMode {
    Interactive,
    AutoComplete,
    /// Skip once, then complete everything
    AutoSkip { skipped: bool },
}

impl InputMode {
    fn next_action(&mut self) -> Result<UserAction> {
        match self {
            InputMode::Interactive => prompt_user_action(),
            InputMode::AutoComplete => Ok(UserAction::Done),
            InputMode::AutoSkip { skipped } => {
                if *skipped {
                    Ok(UserAction::Done)
                } else {
                    *skipped = true;
                    Ok(UserAction::Skip)
                }
            }
        }
    }
}

fn prompt_user_action() -> Result<UserAction> {
    println!("Press Enter when done");
    println!("  's' + Enter to skip");
    println!("  'f' + Enter to finish the workout now");
    println!("  'q' + Enter to quit and leave the workout open");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        // stdin closed
        return Ok(UserAction::Quit);
    }

    let action = match input.trim().to_lowercase().as_str() {
        "s" => UserAction::Skip,
        "f" => UserAction::Finish,
        "q" => UserAction::Quit,
        _ => UserAction::Done,
    };

    Ok(action)
}
