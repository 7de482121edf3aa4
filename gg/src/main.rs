//! `gg`: a command-line front end for the classical planner, parsing a PDDL
//! domain/problem pair, grounding it and running forward A* search.
//!
//! Grounded on `examples/gg/main.rs`: the same overall shape (parse args,
//! parse PDDL, ground, search, print the plan, print a one-line solver
//! summary, optionally write the plan to a file, optionally check the
//! result against `--expect-sat`/`--expect-unsat`) with `structopt` swapped
//! for `clap`'s derive API, which is what this workspace's currently
//! maintained crates use.

use anyhow::{bail, Context, Result};
use classical_planning::classical::{Fact, GroundAction, Heuristic, PlanOutcome, Planner, State};
use classical_planning::parsing::read_domain_problem;
use classical_planning::symbols::World;
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    #[value(name = "h-max")]
    HMax,
    #[value(name = "h-add")]
    HAdd,
}

impl From<HeuristicArg> for Heuristic {
    fn from(h: HeuristicArg) -> Self {
        match h {
            HeuristicArg::HMax => Heuristic::HMax,
            HeuristicArg::HAdd => Heuristic::HAdd,
        }
    }
}

/// A classical (STRIPS) planner: grounds a PDDL domain/problem pair and
/// searches for a plan with forward A*.
#[derive(Parser, Debug)]
#[command(name = "gg", about)]
struct Opt {
    /// PDDL domain file. If omitted, looked for as `domain.pddl` next to
    /// the problem file, then in its parent directory.
    #[arg(long)]
    domain: Option<PathBuf>,

    /// PDDL problem file.
    problem: PathBuf,

    /// Heuristic used to guide the search.
    #[arg(long, value_enum, default_value = "h-add")]
    heuristic: HeuristicArg,

    /// Write the resulting plan to this file, one action per line.
    #[arg(long)]
    plan_file: Option<PathBuf>,

    /// Exit with an error if no plan is found.
    #[arg(long)]
    expect_sat: bool,

    /// Exit with an error if a plan is found.
    #[arg(long)]
    expect_unsat: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn find_domain_of(problem: &Path) -> Result<PathBuf> {
    let mut dir = problem
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    for _ in 0..2 {
        let candidate = dir.join("domain.pddl");
        if candidate.is_file() {
            return Ok(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => break,
        }
    }
    bail!(
        "no --domain given and no domain.pddl found near {}",
        problem.display()
    )
}

fn main() -> Result<()> {
    let opt = Opt::parse();

    let level = match opt.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let domain_path = match &opt.domain {
        Some(p) => p.clone(),
        None => find_domain_of(&opt.problem)?,
    };

    let domain_src = fs::read_to_string(&domain_path)
        .with_context(|| format!("reading domain file {}", domain_path.display()))?;
    let problem_src = fs::read_to_string(&opt.problem)
        .with_context(|| format!("reading problem file {}", opt.problem.display()))?;

    let dp = read_domain_problem(&domain_src, &problem_src)?;
    let mut planner = Planner::from_domain_problem(dp);

    let start = Instant::now();
    let outcome = planner.solve(opt.heuristic.into());
    let runtime_ms = start.elapsed().as_millis();

    match outcome {
        PlanOutcome::Plan(plan) => {
            println!("Got plan: {} actions", plan.len());
            let world = planner.world();
            let mut state = planner.initial_state().clone();
            let mut action_lines = Vec::with_capacity(plan.len());
            for (i, action) in plan.iter().enumerate() {
                for fact in &action.effect_neg {
                    state.remove(fact);
                }
                for fact in &action.effect_pos {
                    state.insert(fact.clone());
                }
                let action_line = format_action(action, world);
                println!("step {}: {action_line}", i + 1);
                println!("  precond_pos: {}", format_facts(&action.precond_pos, world));
                println!("  precond_neg: {}", format_facts(&action.precond_neg, world));
                println!("  effect_pos:  {}", format_facts(&action.effect_pos, world));
                println!("  effect_neg:  {}", format_facts(&action.effect_neg, world));
                println!("  state:       {}", format_facts(&state, world));
                action_lines.push(action_line);
            }
            println!("final state: {}", format_facts(&state, world));
            println!("goal: {}", format_facts_slice(planner.goal(), world));

            if let Some(path) = &opt.plan_file {
                fs::write(path, action_lines.join("\n") + "\n")
                    .with_context(|| format!("writing plan to {}", path.display()))?;
            }
            println!("[summary] solution:SAT cost:{} runtime:{}ms", plan.len(), runtime_ms);
            if opt.expect_unsat {
                bail!("expected no plan, but found one of length {}", plan.len());
            }
        }
        PlanOutcome::NoPlan => {
            println!("No plan found");
            println!("[summary] solution:UNSAT cost:- runtime:{runtime_ms}ms");
            if opt.expect_sat {
                bail!("expected a plan, but found none");
            }
        }
    }

    Ok(())
}

/// Renders a ground action as `(name obj1 obj2 ...)`, in the order its
/// variables were bound (not necessarily the schema's declared parameter
/// order, which this crate's action representation doesn't retain past
/// grounding — still a faithful, readable rendering of what was applied).
fn format_action(action: &Rc<GroundAction>, world: &World) -> String {
    let mut parts = vec![world.symbols.get(action.schema_name).to_string()];
    for &(_, obj) in &action.binding {
        parts.push(world.symbols.get(obj).to_string());
    }
    format!("({})", parts.join(" "))
}

fn format_fact(fact: &Fact, world: &World) -> String {
    let mut parts = vec![world.symbols.get(fact.predicate).to_string()];
    parts.extend(fact.args.iter().map(|&a| world.symbols.get(a).to_string()));
    format!("({})", parts.join(" "))
}

fn format_facts(facts: &State, world: &World) -> String {
    let rendered: Vec<String> = facts.iter().map(|f| format_fact(f, world)).collect();
    format!("{{{}}}", rendered.join(", "))
}

fn format_facts_slice(facts: &[Fact], world: &World) -> String {
    let rendered: Vec<String> = facts.iter().map(|f| format_fact(f, world)).collect();
    format!("{{{}}}", rendered.join(", "))
}
