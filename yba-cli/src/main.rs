use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use yba_core::differ::{Diff, create_plan, diff};
use yba_core::effect::Effect;
use yba_core::interpreter::Interpreter;
use yba_core::plan::Plan;
use yba_core::provider::Provider;
use yba_core::resource::{Resource, ResourceId, State, Value};
use yba_core::schema::ResourceSchema;
use yba_provider::schemas::all_schemas;
use yba_provider::{ProviderConfig, YbaProvider};
use yba_state::{LocalBackend, LockInfo, StateBackend, StateFile};

mod manifest;
mod output;

use manifest::Manifest;

const DEFAULT_LOG_FILTER: &str = "warn,yba_core=info,yba_provider=info,yba_state=info";

#[derive(Parser)]
#[command(name = "yba")]
#[command(about = "Declarative management of YugabyteDB Anywhere", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Paths {
    /// Path to the JSON manifest
    #[arg(short, long, default_value = "yba.json")]
    file: PathBuf,

    /// Path to the state file
    #[arg(long, default_value = "yba.state.json")]
    state: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest against the resource schemas
    Validate {
        #[command(flatten)]
        paths: Paths,
    },
    /// Show execution plan without applying changes
    Plan {
        #[command(flatten)]
        paths: Paths,
    },
    /// Apply changes to reach the desired state
    Apply {
        #[command(flatten)]
        paths: Paths,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Destroy every resource recorded in state
    Destroy {
        #[command(flatten)]
        paths: Paths,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Re-read recorded resources and update state
    Refresh {
        #[command(flatten)]
        paths: Paths,
    },
    /// Remove a state lock left behind by an interrupted run
    ForceUnlock {
        /// ID of the lock to remove
        lock_id: String,

        /// Path to the state file
        #[arg(long, default_value = "yba.state.json")]
        state: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate { paths } => run_validate(&paths),
        Commands::Plan { paths } => run_plan(&paths).await,
        Commands::Apply {
            paths,
            auto_approve,
        } => run_apply(&paths, auto_approve).await,
        Commands::Destroy {
            paths,
            auto_approve,
        } => run_destroy(&paths, auto_approve).await,
        Commands::Refresh { paths } => run_refresh(&paths).await,
        Commands::ForceUnlock { lock_id, state } => run_force_unlock(&state, &lock_id).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// A validated manifest with its resources in dependency order
struct Workspace {
    provider: HashMap<String, Value>,
    resources: Vec<Resource>,
    schemas: HashMap<String, ResourceSchema>,
}

fn load_workspace(path: &Path) -> Result<Workspace, String> {
    let mut manifest = Manifest::load(path)?;
    let schemas = manifest::schema_map(all_schemas());
    manifest::apply_defaults(&mut manifest.resources, &schemas);
    manifest::validate(&manifest.resources, &schemas)?;
    let resources = manifest::sort_by_references(&manifest.resources)?;

    Ok(Workspace {
        provider: manifest.provider,
        resources,
        schemas,
    })
}

async fn connect(provider: &HashMap<String, Value>) -> Result<YbaProvider, String> {
    let config = ProviderConfig::from_attributes(provider).map_err(|e| e.to_string())?;
    debug!(?config, "connecting");
    YbaProvider::configure(config)
        .await
        .map_err(|e| format!("Failed to connect: {}", e))
}

async fn read_state(backend: &LocalBackend) -> Result<StateFile, String> {
    Ok(backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default())
}

async fn persist(backend: &LocalBackend, state: &mut StateFile) -> Result<(), String> {
    state.increment_serial();
    backend
        .write_state(state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))
}

async fn release(backend: &LocalBackend, lock: &LockInfo) {
    if let Err(e) = backend.release_lock(lock).await {
        warn!(lock_id = %lock.id, error = %e, "failed to release state lock");
        eprintln!(
            "{} failed to release lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
}

fn confirm(question: &str, hint: &str) -> Result<bool, String> {
    println!("{}", question.yellow().bold());
    println!("  {}", hint.yellow());
    print!("\n  Enter a value: ");
    std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();
    Ok(input.trim() == "yes")
}

fn run_validate(paths: &Paths) -> Result<(), String> {
    let workspace = load_workspace(&paths.file)?;
    let data_sources = workspace
        .resources
        .iter()
        .filter(|r| r.is_data_source())
        .count();

    println!("{}", "Validating...".cyan());
    println!(
        "{}",
        format!(
            "✓ {} resources and {} data sources validated successfully.",
            workspace.resources.len() - data_sources,
            data_sources
        )
        .green()
        .bold()
    );
    for resource in &workspace.resources {
        println!("  • {}", resource.id);
    }
    Ok(())
}

/// Result of comparing the manifest against YBA
struct Planned {
    plan: Plan,
    /// Attributes of every resource whose values are settled, by address
    known: HashMap<String, HashMap<String, Value>>,
    /// Fresh reads of every recorded resource the manifest declares
    refreshed: Vec<State>,
}

async fn plan_changes(
    provider: &YbaProvider,
    workspace: &Workspace,
    state: &StateFile,
) -> Result<Planned, String> {
    let mut known = HashMap::new();
    let mut current = HashMap::new();
    let mut refreshed = Vec::new();
    let mut desired = Vec::with_capacity(workspace.resources.len());

    for resource in &workspace.resources {
        let resolved = manifest::resolve_references(resource, &known);

        if resource.is_data_source() {
            // Reads that depend on something not yet created wait for apply
            if resolved.references().is_empty() {
                let read = provider
                    .read_data_source(&resolved)
                    .await
                    .map_err(|e| e.to_string())?;
                known.insert(resource.id.address(), read.attributes);
            }
            desired.push(resolved);
            continue;
        }

        let prior = state.state_of(&resource.id);
        if !prior.exists {
            desired.push(resolved);
            continue;
        }

        let observed = provider
            .read(&resource.id, &prior)
            .await
            .map_err(|e| e.to_string())?;
        if observed.exists {
            let replaced = matches!(
                diff(&resolved, &observed, workspace.schemas.get(&resource.id.resource_type)),
                Diff::Replace { .. }
            );
            // Dependents of a replaced resource see its new values only after apply
            if !replaced {
                known.insert(resource.id.address(), observed.attributes.clone());
            }
            current.insert(resource.id.clone(), observed.clone());
        } else {
            debug!(resource = %resource.id, "recorded resource no longer exists");
        }
        refreshed.push(observed);
        desired.push(resolved);
    }

    let orphans: Vec<State> = state
        .resources
        .iter()
        .filter(|r| !workspace.resources.iter().any(|d| d.id == r.id()))
        .map(|r| r.to_state())
        .collect();

    Ok(Planned {
        plan: create_plan(&desired, &current, &workspace.schemas, &orphans),
        known,
        refreshed,
    })
}

async fn run_plan(paths: &Paths) -> Result<(), String> {
    let workspace = load_workspace(&paths.file)?;
    let provider = connect(&workspace.provider).await?;
    let backend = LocalBackend::with_path(&paths.state);
    let state = read_state(&backend).await?;

    let planned = plan_changes(&provider, &workspace, &state).await?;
    output::print_plan(&planned.plan, &workspace.schemas);
    Ok(())
}

/// Re-resolve an effect's desired resource against values settled so far
fn resolve_effect(
    effect: &Effect,
    declared: &HashMap<&ResourceId, &Resource>,
    known: &HashMap<String, HashMap<String, Value>>,
) -> Result<Effect, String> {
    let resolve = |resource: &Resource| -> Result<Resource, String> {
        let source = declared.get(&resource.id).copied().unwrap_or(resource);
        let resolved = manifest::resolve_references(source, known);
        match resolved.references().first() {
            Some((address, attr)) => Err(format!(
                "{}: reference {}.{} could not be resolved",
                resource.id, address, attr
            )),
            None => Ok(resolved),
        }
    };

    Ok(match effect {
        Effect::Read(resource) => Effect::Read(resolve(resource)?),
        Effect::Create(resource) => Effect::Create(resolve(resource)?),
        Effect::Update { id, from, to } => Effect::Update {
            id: id.clone(),
            from: from.clone(),
            to: resolve(to)?,
        },
        Effect::Replace { id, from, to } => Effect::Replace {
            id: id.clone(),
            from: from.clone(),
            to: resolve(to)?,
        },
        Effect::Delete(state) => Effect::Delete(state.clone()),
    })
}

fn describe(effect: &Effect) -> String {
    match effect {
        Effect::Read(r) => format!("Read {}", r.id),
        Effect::Create(r) => format!("Create {}", r.id),
        Effect::Update { id, .. } => format!("Update {}", id),
        Effect::Replace { id, .. } => format!("Replace {}", id),
        Effect::Delete(s) => format!("Delete {}", s.id),
    }
}

async fn run_apply(paths: &Paths, auto_approve: bool) -> Result<(), String> {
    let workspace = load_workspace(&paths.file)?;
    let provider = connect(&workspace.provider).await?;
    let backend = LocalBackend::with_path(&paths.state);

    let lock = backend
        .acquire_lock("apply")
        .await
        .map_err(|e| e.to_string())?;
    let result = apply_locked(&workspace, provider, &backend, auto_approve).await;
    release(&backend, &lock).await;
    result
}

async fn apply_locked(
    workspace: &Workspace,
    provider: YbaProvider,
    backend: &LocalBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = read_state(backend).await?;
    let planned = plan_changes(&provider, workspace, &state).await?;
    for observed in &planned.refreshed {
        state.record(observed);
    }

    output::print_plan(&planned.plan, &workspace.schemas);
    if planned.plan.mutation_count() == 0 {
        return persist(backend, &mut state).await;
    }
    println!();

    if !auto_approve
        && !confirm(
            "Do you want to perform these actions?",
            "Only 'yes' will be accepted to approve.",
        )?
    {
        println!("{}", "Apply cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let declared: HashMap<&ResourceId, &Resource> =
        workspace.resources.iter().map(|r| (&r.id, r)).collect();
    let mut known = planned.known;
    let interpreter = Interpreter::new(provider);
    let mut applied = 0;

    for effect in planned.plan.effects() {
        let effect = resolve_effect(effect, &declared, &known)?;
        let id = effect.resource_id().clone();

        match interpreter.execute(&effect).await {
            Ok(outcome) => {
                match outcome.state() {
                    Some(result) => {
                        known.insert(id.address(), result.attributes.clone());
                        if effect.is_mutating() {
                            state.record(result);
                        }
                    }
                    None => {
                        known.remove(&id.address());
                        state.remove(&id);
                    }
                }
                if effect.is_mutating() {
                    println!("  {} {}", "✓".green(), describe(&effect));
                    persist(backend, &mut state).await?;
                    applied += 1;
                }
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), describe(&effect), e);
                persist(backend, &mut state).await?;
                return Err(format!(
                    "Apply failed after {} of {} changes",
                    applied,
                    planned.plan.mutation_count()
                ));
            }
        }
    }

    println!();
    println!(
        "{}",
        format!("Apply complete! {} changes applied.", applied)
            .green()
            .bold()
    );
    Ok(())
}

async fn run_destroy(paths: &Paths, auto_approve: bool) -> Result<(), String> {
    let manifest = Manifest::load(&paths.file)?;
    let backend = LocalBackend::with_path(&paths.state);

    let lock = backend
        .acquire_lock("destroy")
        .await
        .map_err(|e| e.to_string())?;
    let result = destroy_locked(&manifest.provider, &backend, auto_approve).await;
    release(&backend, &lock).await;
    result
}

async fn destroy_locked(
    provider: &HashMap<String, Value>,
    backend: &LocalBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = read_state(backend).await?;
    if state.resources.is_empty() {
        println!("{}", "No resources recorded in state. Nothing to destroy.".green());
        return Ok(());
    }

    // Reverse creation order deletes dependents first
    let doomed: Vec<State> = state.resources.iter().rev().map(|r| r.to_state()).collect();

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for s in &doomed {
        println!("  {} {}", "-".red().bold(), s.id);
    }
    println!();
    println!("Plan: {} to destroy.", doomed.len().to_string().red());
    println!();

    if !auto_approve
        && !confirm(
            "Do you really want to destroy all resources?",
            "This action cannot be undone. Type 'yes' to confirm.",
        )?
    {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    let provider = connect(provider).await?;
    println!("{}", "Destroying resources...".red().bold());
    println!();

    for s in &doomed {
        match provider.delete(s).await {
            Ok(()) => {
                println!("  {} Delete {}", "✓".green(), s.id);
                state.remove(&s.id);
                persist(backend, &mut state).await?;
            }
            Err(e) => {
                println!("  {} Delete {} - {}", "✗".red(), s.id, e);
                return Err(format!(
                    "Destroy stopped; {} resources remain in state",
                    state.resources.len()
                ));
            }
        }
    }

    println!();
    println!("{}", "Destroy complete!".green().bold());
    Ok(())
}

async fn run_refresh(paths: &Paths) -> Result<(), String> {
    let manifest = Manifest::load(&paths.file)?;
    let provider = connect(&manifest.provider).await?;
    let backend = LocalBackend::with_path(&paths.state);

    let lock = backend
        .acquire_lock("refresh")
        .await
        .map_err(|e| e.to_string())?;
    let result = refresh_locked(&provider, &backend).await;
    release(&backend, &lock).await;
    result
}

async fn refresh_locked(provider: &YbaProvider, backend: &LocalBackend) -> Result<(), String> {
    let mut state = read_state(backend).await?;
    let recorded: Vec<State> = state.resources.iter().map(|r| r.to_state()).collect();

    for prior in &recorded {
        let observed = provider
            .read(&prior.id, prior)
            .await
            .map_err(|e| e.to_string())?;
        if observed.exists {
            println!("  {} {}", "✓".green(), prior.id);
        } else {
            println!("  {} {} (no longer exists)", "-".red(), prior.id);
        }
        state.record(&observed);
    }

    persist(backend, &mut state).await?;
    println!();
    println!(
        "{}",
        format!("Refresh complete! {} resources tracked.", state.resources.len())
            .green()
            .bold()
    );
    Ok(())
}

async fn run_force_unlock(state_path: &Path, lock_id: &str) -> Result<(), String> {
    LocalBackend::with_path(state_path)
        .force_unlock(lock_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", format!("Lock {} removed.", lock_id).green());
    Ok(())
}
