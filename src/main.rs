//! ontorule CLI: rule-based inference and queries over ontology documents.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::Result;

use ontorule::classify::Classification;
use ontorule::engine::{Engine, EngineConfig};
use ontorule::query::QueryResult;
use ontorule::render::{render_axiom, render_entity, render_fact, render_query, render_rule};
use ontorule::rules::parse_query;

#[derive(Parser)]
#[command(name = "ontorule", version, about = "Rule-based ontology inference and query engine")]
struct Cli {
    /// TOML engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate rule bodies in parallel.
    #[arg(long, global = true)]
    parallel: bool,

    /// Re-run every rule on every pass.
    #[arg(long, global = true)]
    naive: bool,

    /// Stop saturation after this many passes.
    #[arg(long, global = true)]
    max_passes: Option<usize>,

    /// Also derive memberships entailed by subclass axioms.
    #[arg(long, global = true)]
    materialize: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a knowledge base and report consistency.
    Check {
        /// Path to a .json or .toml knowledge base.
        file: PathBuf,

        /// Print the inferred superclasses of every class.
        #[arg(long)]
        hierarchy: bool,
    },

    /// Run every rule to a fixpoint and report what was derived.
    Saturate {
        file: PathBuf,

        /// Print each derived fact with the rule and pass that produced it.
        #[arg(long)]
        derived: bool,
    },

    /// Run a named query, or an ad-hoc one given with --text.
    Query {
        file: PathBuf,

        /// Name of a query defined in the document.
        #[arg(long, conflicts_with = "text")]
        name: Option<String>,

        /// Query text, e.g. "Person(?x) -> sqwrl:select(?x)".
        #[arg(long)]
        text: Option<String>,

        /// Query the asserted facts only.
        #[arg(long)]
        no_saturate: bool,
    },

    /// Classify, saturate, then run every query in the document.
    Run { file: PathBuf },

    /// Show what a knowledge base contains.
    Info {
        file: PathBuf,

        /// Also list the axioms and rules.
        #[arg(long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = engine_config(&cli)?;

    match cli.command {
        Commands::Check { file, hierarchy } => {
            let engine = load(config, &file)?;
            let classification = engine.classify();
            print_classification(&engine, &classification);
            if hierarchy {
                print_hierarchy(&engine, &classification);
            }
        }

        Commands::Saturate { file, derived } => {
            let mut engine = load(config, &file)?;
            let result = engine.saturate()?;
            println!(
                "Derived {} facts in {} passes ({}).",
                result.applied,
                result.passes,
                if result.reached_fixpoint {
                    "fixpoint reached"
                } else {
                    "pass limit reached"
                }
            );

            let mut stats: Vec<_> = result.rule_stats.iter().collect();
            stats.sort();
            for (rule, count) in stats {
                println!("  {rule}: {count}");
            }

            if derived {
                let registry = engine.registry();
                println!("\nDerived facts:");
                for d in &result.derived {
                    println!(
                        "  [pass {}] {}  <- {}",
                        d.pass,
                        render_fact(registry, &d.fact),
                        d.rule
                    );
                }
            }
        }

        Commands::Query {
            file,
            name,
            text,
            no_saturate,
        } => {
            let mut engine = load(config, &file)?;
            if !no_saturate {
                engine.saturate()?;
            }
            let result = match (name, text) {
                (Some(name), _) => engine.run_query(&name)?,
                (None, Some(text)) => {
                    let query = parse_query("ad-hoc", &text, engine.registry())?;
                    engine.run(&query)
                }
                (None, None) => miette::bail!("pass --name <query> or --text <query>"),
            };
            print_result(&engine, &result);
        }

        Commands::Run { file } => {
            let mut engine = load(config, &file)?;
            let classification = engine.classify();
            print_classification(&engine, &classification);

            let result = engine.saturate()?;
            println!(
                "\nDerived {} facts in {} passes.",
                result.applied, result.passes
            );

            for result in engine.run_all() {
                println!();
                print_result(&engine, &result);
            }
        }

        Commands::Info { file, verbose } => {
            let engine = load(config, &file)?;
            println!("{}", engine.info());
            if verbose {
                let registry = engine.registry();
                println!("Axioms:");
                for axiom in engine.axioms().iter() {
                    println!("  {}", render_axiom(registry, axiom));
                }
                println!("Rules:");
                for rule in engine.rules() {
                    println!("  {}: {}", rule.name(), render_rule(registry, rule));
                }
                println!("Queries:");
                for query in engine.queries() {
                    println!("  {}: {}", query.name(), render_query(registry, query));
                }
            }
        }
    }

    Ok(())
}

fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if cli.parallel {
        config.parallel = true;
    }
    if cli.naive {
        config.semi_naive = false;
    }
    if cli.max_passes.is_some() {
        config.max_passes = cli.max_passes;
    }
    if cli.materialize {
        config.materialize_hierarchy = true;
    }
    Ok(config)
}

fn load(config: EngineConfig, file: &Path) -> Result<Engine> {
    let mut engine = Engine::new(config)?;
    engine.load_path(file)?;
    Ok(engine)
}

fn print_classification(engine: &Engine, classification: &Classification) {
    let registry = engine.registry();
    if classification.consistent {
        println!("Consistent.");
    } else {
        println!("Inconsistent.");
    }

    if !classification.unsatisfiable.is_empty() {
        let names: Vec<String> = classification
            .unsatisfiable
            .iter()
            .map(|c| render_entity(registry, *c))
            .collect();
        println!("Unsatisfiable classes: {}", names.join(", "));
    }
    for clash in &classification.clashes {
        println!(
            "  {} is both {} and {}, which are disjoint",
            render_entity(registry, clash.individual),
            render_entity(registry, clash.disjoint.0),
            render_entity(registry, clash.disjoint.1)
        );
    }
}

fn print_hierarchy(engine: &Engine, classification: &Classification) {
    let registry = engine.registry();
    println!("\nHierarchy:");
    for class in registry.of_kind(ontorule::entity::EntityKind::Class) {
        let supers: Vec<String> = classification
            .hierarchy
            .superclasses(class)
            .into_iter()
            .map(|c| render_entity(registry, c))
            .collect();
        if !supers.is_empty() {
            println!("  {} ⊑ {}", render_entity(registry, class), supers.join(", "));
        }
    }
}

fn print_result(engine: &Engine, result: &QueryResult) {
    let registry = engine.registry();
    let header: Vec<String> = result.columns().iter().map(ToString::to_string).collect();
    println!("{} ({} rows)", result.name(), result.len());
    println!("  {}", header.join("\t"));
    for row in result.rows() {
        let cells: Vec<String> = row.iter().map(|id| render_entity(registry, *id)).collect();
        println!("  {}", cells.join("\t"));
    }
}
