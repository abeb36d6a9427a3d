//! WARDEN Publishing Reference Runtime: Demo CLI
//!
//! Runs the blog reference scenarios, or evaluates one check against a TOML
//! seed file.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- forbid-precedence
//!   cargo run -p demo -- restricted-roles
//!   cargo run -p demo -- ownership
//!   cargo run -p demo -- check --authority User:1 --ability edit --target Post:1
//!   cargo run -p demo -- check --seed my-seed.toml --authority User:2 --ability create --target Post --json

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_contracts::{
    decision::CheckRequest,
    entity::{EntityRef, Scope, Target},
    error::WardenResult,
};
use warden_core::traits::Authorizer;
use warden_ref_blog::{
    fixtures,
    scenarios::{assignment_lifecycle, forbid_precedence, ownership, restricted_roles, wildcards},
};
use warden_store::SeedConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

/// WARDEN: role and ability authorization, publishing demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "WARDEN publishing reference runtime demo",
    long_about = "Runs WARDEN blog scenarios showing forbid precedence, restricted role\n\
                  assignments, ownership gating, and wildcard abilities, or evaluates\n\
                  a single authorization check against a TOML seed."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll,
    /// Scenario 1: a forbid grant beats every allow grant.
    ForbidPrecedence,
    /// Scenario 2: roles restricted to an instance or a class.
    RestrictedRoles,
    /// Scenario 3: owner-only abilities.
    Ownership,
    /// Scenario 4: `*` ability names and entity types.
    Wildcards,
    /// Scenario 5: assign, re-assign, and retract behind a cache.
    Lifecycle,
    /// Evaluate one check against a seed file.
    Check {
        /// TOML seed file. Defaults to the built-in blog seed.
        #[arg(long)]
        seed: Option<PathBuf>,
        /// The authority asking, as `Type:id`.
        #[arg(long)]
        authority: String,
        /// The ability name.
        #[arg(long)]
        ability: String,
        /// `Type:id` for an instance, `Type` for a class; omit for a simple ability.
        #[arg(long)]
        target: Option<String>,
        /// Tenant scope to resolve in, overriding the seed's.
        #[arg(long)]
        scope: Option<String>,
        /// Print the decision as JSON.
        #[arg(long)]
        json: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check {
            seed,
            authority,
            ability,
            target,
            scope,
            json,
        } => run_check(seed, &authority, &ability, target.as_deref(), scope, json),
        scenario => {
            print_banner();
            run_scenarios(scenario).map(|()| {
                println!("All selected scenarios completed.");
            })
        }
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_scenarios(command: Command) -> WardenResult<()> {
    match command {
        Command::RunAll => warden_ref_blog::run_all(),
        Command::ForbidPrecedence => forbid_precedence::run_scenario(),
        Command::RestrictedRoles => restricted_roles::run_scenario(),
        Command::Ownership => ownership::run_scenario(),
        Command::Wildcards => wildcards::run_scenario(),
        Command::Lifecycle => assignment_lifecycle::run_scenario(),
        Command::Check { .. } => Ok(()),
    }
}

// ── Single check ──────────────────────────────────────────────────────────────

fn run_check(
    seed: Option<PathBuf>,
    authority: &str,
    ability: &str,
    target: Option<&str>,
    scope: Option<String>,
    json: bool,
) -> WardenResult<()> {
    let config = match &seed {
        Some(path) => SeedConfig::from_file(path)?,
        None => SeedConfig::from_toml_str(fixtures::BLOG_SEED)?,
    };
    let mut world = config.build()?;
    if let Some(tenant) = scope {
        world.scope = Scope::tenant(tenant);
    }

    let request = CheckRequest::new(
        EntityRef::parse(authority)?,
        ability,
        Target::parse(target.unwrap_or(""))?,
    );
    info!(
        seed = %seed.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "built-in".to_string()),
        scope = %world.scope,
        "evaluating check"
    );

    let resolver = fixtures::resolver_for(&world);
    let resolution = resolver.resolution(&request)?;

    if json {
        let report = serde_json::json!({
            "authority": request.authority.to_string(),
            "ability": request.ability,
            "target": request.target,
            "scope": world.scope,
            "decision": resolution.decision,
            "granted_by": resolution.granted_by,
        });
        println!("{}", report);
    } else {
        println!(
            "{} {} {} → {:?}",
            request.authority, request.ability, request.target, resolution.decision
        );
        if let Some(id) = resolution.granted_by {
            println!("  granted by ability #{}", id);
        }
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("WARDEN: Role & Ability Authorization");
    println!("Publishing Reference Demo");
    println!("=====================================");
    println!();
    println!("Resolution per check:");
    println!("  [1] Validate the target and compute ownership once");
    println!("  [2] Collect forbid grants: direct, everyone, roles → any match is Forbidden");
    println!("  [3] Collect allow grants in the same order → first match is Allowed");
    println!("  [4] Nothing matched → Unspecified");
    println!();
}
