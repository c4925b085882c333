use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::damage::{compute_damage, Target};
use crate::data::build::CharacterBuild;
use crate::data::catalog::Catalogs;
use crate::data::loader::{load_build, load_catalogs};
use crate::data::stat::StatKind;
use crate::data::validate::{validate_catalogs, ValidationSeverity};
use crate::optimizer::export::export_table;
use crate::optimizer::{optimize, OptimizeConstraints, OptimizeRequest};
use crate::server;
use crate::server::api::data_dir;
use crate::sp_tree::resolve_sp_tree;
use crate::stats::compute_stats;

const USAGE: &str = "usage: buildcalc <stats|damage|optimize|sp|validate|serve> [build-file] \
[--data DIR] [--skill NAME] [--defense N] [--hp N] [--seed N] [--parallel] [--table]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stats,
    Damage,
    Optimize,
    Sp,
    Validate,
    Serve,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("stats") => Some(Command::Stats),
        Some("damage") => Some(Command::Damage),
        Some("optimize") => Some(Command::Optimize),
        Some("sp") => Some(Command::Sp),
        Some("validate") => Some(Command::Validate),
        Some("serve") => Some(Command::Serve),
        _ => None,
    }
}

/// Arguments after the command name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub positional: Vec<String>,
    pub data: Option<PathBuf>,
    pub skill: Option<String>,
    pub defense: f64,
    pub hp: f64,
    pub seed: u64,
    pub parallel: bool,
    pub table: bool,
}

pub fn parse_options(args: &[String]) -> Options {
    let mut options = Options::default();
    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--table" => options.table = true,
            "--parallel" => options.parallel = true,
            "--data" => options.data = rest.next().map(PathBuf::from),
            "--skill" => options.skill = rest.next().cloned(),
            "--defense" => options.defense = parse_f64_arg(rest.next(), "defense", 0.0),
            "--hp" => options.hp = parse_f64_arg(rest.next(), "hp", 0.0),
            "--seed" => options.seed = parse_u64_arg(rest.next(), "seed", 0),
            _ => options.positional.push(arg.clone()),
        }
    }
    options
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };
    let options = parse_options(args);
    match command {
        Command::Serve => handle_serve(),
        Command::Validate => handle_validate(&options),
        Command::Stats => with_build(&options, handle_stats),
        Command::Damage => with_build(&options, handle_damage),
        Command::Optimize => with_build(&options, handle_optimize),
        Command::Sp => with_build(&options, handle_sp),
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var("BUILDCALC_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn catalog_dir(options: &Options) -> PathBuf {
    options.data.clone().unwrap_or_else(data_dir)
}

/// Load the catalogs and the build named by the first positional argument,
/// then run `handler`.
fn with_build(options: &Options, handler: fn(&Options, &CharacterBuild, &Catalogs) -> i32) -> i32 {
    let Some(build_path) = options.positional.first() else {
        eprintln!("{USAGE}");
        return 2;
    };
    let catalogs = match load_catalogs(&catalog_dir(options)) {
        Ok(catalogs) => catalogs,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    match load_build(Path::new(build_path)) {
        Ok(build) => handler(options, &build, &catalogs),
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn target(options: &Options) -> Target {
    Target::new(options.defense, 0.0, 0.0).with_hp(options.hp)
}

fn handle_stats(options: &Options, build: &CharacterBuild, catalogs: &Catalogs) -> i32 {
    let stats = match compute_stats(build, catalogs) {
        Ok(stats) => stats,
        Err(err) => {
            eprintln!("stat calculation failed: {err}");
            return 1;
        }
    };
    if options.table {
        println!("stat\tbase\tafter_percent\tfinal");
        for kind in StatKind::ALL {
            println!(
                "{}\t{:.0}\t{:.0}\t{:.0}",
                kind,
                stats.base.get(kind),
                stats.after_percent.get(kind),
                stats.final_stats.get(kind)
            );
        }
        println!("crit_rate\t\t\t{:.2}", stats.crit_rate);
        return 0;
    }
    print_json(&stats)
}

fn handle_damage(options: &Options, build: &CharacterBuild, catalogs: &Catalogs) -> i32 {
    let result = compute_stats(build, catalogs).and_then(|stats| {
        compute_damage(build, &stats, options.skill.as_deref(), &target(options), catalogs)
    });
    let damage = match result {
        Ok(damage) => damage,
        Err(err) => {
            eprintln!("damage calculation failed: {err}");
            return 1;
        }
    };
    if options.table {
        println!("weapon_type\tbase_damage\thit_damage\textra_damage\thits\texpected_damage");
        println!(
            "{}\t{:.1}\t{:.1}\t{:.1}\t{:.0}\t{:.1}",
            damage.weapon_type,
            damage.base_damage,
            damage.per_hit,
            damage.extra_per_hit,
            damage.hits,
            damage.expected_damage()
        );
        return 0;
    }
    print_json(&damage)
}

fn handle_optimize(options: &Options, build: &CharacterBuild, catalogs: &Catalogs) -> i32 {
    let mut request = OptimizeRequest::new(build.clone())
        .with_target(target(options))
        .with_constraints(OptimizeConstraints {
            seed: options.seed,
            parallel: options.parallel,
            ..OptimizeConstraints::default()
        });
    request.skill = options.skill.clone();

    let outcome = match optimize(&request, catalogs, |done, total| {
        tracing::debug!(done, total, "optimizer progress");
    }) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("optimization failed: {err}");
            return 1;
        }
    };
    eprintln!(
        "{:?} search: {} combinations, {} evaluations",
        outcome.strategy, outcome.combinations, outcome.evaluations
    );
    if options.table {
        return match export_table(&outcome.results) {
            Ok(table) => {
                print!("{table}");
                0
            }
            Err(err) => {
                eprintln!("failed to write table: {err}");
                1
            }
        };
    }
    print_json(&outcome)
}

fn handle_sp(_options: &Options, build: &CharacterBuild, catalogs: &Catalogs) -> i32 {
    let job = match catalogs.job(&build.job) {
        Ok(job) => job,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    if let Err(err) = build.sp.validate(catalogs.constants.max_sp_per_branch) {
        eprintln!("{err}");
        return 1;
    }
    print_json(&resolve_sp_tree(&build.sp, &job.sp_tiers))
}

fn handle_validate(options: &Options) -> i32 {
    let dir = options
        .positional
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| catalog_dir(options));
    let catalogs = match load_catalogs(&dir) {
        Ok(catalogs) => catalogs,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let report = validate_catalogs(&catalogs);
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    if report.has_errors() {
        eprintln!(
            "validation failed: {} error(s)",
            report.count(ValidationSeverity::Error)
        );
        1
    } else {
        println!("validation passed: {}", dir.display());
        0
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize result: {err}");
            1
        }
    }
}

fn parse_f64_arg(raw: Option<&String>, name: &str, default: f64) -> f64 {
    raw.and_then(|value| value.parse::<f64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                let mut msg = String::new();
                let _ = write!(&mut msg, "invalid {name} '{value}', defaulting to {default}");
                eprintln!("{msg}");
            }
            default
        })
}
