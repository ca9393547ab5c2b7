//! Command-line interface for gqlcost.
//!
//! # Usage
//!
//! ```bash
//! # Check queries against a budget
//! gqlcost check --schema schema.graphql --max-complexity 200 query.graphql
//!
//! # Load settings from a file, report the complexity on success
//! gqlcost check --schema schema.graphql --config complexity.json --report queries/*.graphql
//!
//! # Show how the cost of a query is made up
//! gqlcost explain --schema schema.graphql --max-complexity 200 --variables '{"limit": 50}' query.graphql
//!
//! # Print the AST of a document
//! gqlcost parse query.graphql
//! ```

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use gqlcost_complexity::{
    lint_cost_directives, ComplexityConfig, ComplexityError, ComplexityResult, ConfigError,
    QueryComplexity, RequestContext, Variables,
};
use gqlcost_core::{Diagnostic, LineIndex};
use gqlcost_schema::{Schema, SchemaBuilder, SchemaError};
use gqlcost_syntax::parse;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Exit code for accepted documents.
pub const EXIT_OK: i32 = 0;
/// Exit code for rejected documents and invalid input.
pub const EXIT_REJECTED: i32 = 1;
/// Exit code when no budget was configured.
pub const EXIT_NOT_CONFIGURED: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "gqlcost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by `check` and `explain`.
#[derive(Args, Debug, Clone)]
pub struct CostArgs {
    /// Schema SDL file
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Query documents
    #[arg(required = true)]
    pub queries: Vec<PathBuf>,

    /// Variable values, as inline JSON or a path to a JSON file
    #[arg(long)]
    pub variables: Option<String>,

    /// Operation whose variable defaults apply inside fragments
    #[arg(long)]
    pub operation: Option<String>,

    /// Complexity config file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum allowed complexity
    #[arg(long, allow_negative_numbers = true)]
    pub max_complexity: Option<i64>,

    /// Cost of fields without a cost directive
    #[arg(long, allow_negative_numbers = true)]
    pub default_cost: Option<i64>,

    /// Print the complexity response extensions of accepted queries
    #[arg(long)]
    pub report: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check queries against the complexity budget
    Check {
        #[command(flatten)]
        args: CostArgs,
    },

    /// Print the cost breakdown of queries
    Explain {
        #[command(flatten)]
        args: CostArgs,
    },

    /// Parse a GraphQL file and print its AST
    Parse {
        /// File to parse
        file: PathBuf,
    },

    /// Print version information
    Version,
}

/// Runs the CLI with the given arguments.
pub fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check { args } => check_queries(&args, cli.verbose, cli.quiet),
        Commands::Explain { args } => explain_queries(&args),
        Commands::Parse { file } => parse_file(&file),
        Commands::Version => {
            println!("gqlcost {}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_OK)
        }
    }
}

/// Builds the effective configuration: the config file first, then flags.
/// Returns `None` when neither a file nor `--max-complexity` is given.
pub fn resolve_config(args: &CostArgs) -> Result<Option<ComplexityConfig>, ConfigError> {
    let mut config = args
        .config
        .as_deref()
        .map(ComplexityConfig::from_path)
        .transpose()?;

    if let Some(max) = args.max_complexity {
        config = Some(match config {
            Some(config) => ComplexityConfig {
                max_complexity: max,
                ..config
            },
            None => ComplexityConfig::new(max),
        });
    }
    if let Some(config) = config.as_mut() {
        if let Some(default_cost) = args.default_cost {
            config.default_cost = default_cost;
        }
        if args.report {
            config.report_complexity = true;
        }
    }
    Ok(config)
}

/// Parses `--variables`: inline JSON when it starts with `{`, otherwise a file path.
pub fn load_variables(arg: Option<&str>) -> Result<Variables, Box<dyn std::error::Error>> {
    let Some(arg) = arg else {
        return Ok(Variables::new());
    };
    let json = if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg)?
    };
    Ok(serde_json::from_str(&json)?)
}

/// Outcome of checking one query document.
#[derive(Debug)]
pub enum QueryOutcome {
    /// The document does not parse.
    Invalid(Vec<Diagnostic>),
    Accepted {
        result: ComplexityResult,
        extensions: Option<serde_json::Value>,
    },
    Rejected(ComplexityError),
    NotConfigured,
}

impl QueryOutcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Accepted { .. } => EXIT_OK,
            Self::Invalid(_) | Self::Rejected(_) => EXIT_REJECTED,
            Self::NotConfigured => EXIT_NOT_CONFIGURED,
        }
    }
}

/// Validates one query document against `schema`.
#[must_use]
pub fn check_source(
    schema: &Schema,
    source: &str,
    variables: &Variables,
    operation: Option<&str>,
) -> QueryOutcome {
    let parsed = parse(source);
    if parsed.has_errors() {
        return QueryOutcome::Invalid(parsed.diagnostics.errors().cloned().collect());
    }

    let mut ctx = RequestContext::new().with_variables(variables.clone());
    ctx.operation_name = operation.map(str::to_string);

    match QueryComplexity::validate(schema, &parsed.document, &mut ctx) {
        Ok(result) => QueryOutcome::Accepted {
            result,
            extensions: QueryComplexity::response_extensions(schema, &ctx),
        },
        Err(error) if error.code().is_client_error() => QueryOutcome::Rejected(error),
        Err(_) => QueryOutcome::NotConfigured,
    }
}

/// Reads and builds the schema, printing diagnostics on failure.
fn load_schema(
    path: &Path,
    config: Option<ComplexityConfig>,
) -> Result<Option<Schema>, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let schema = match SchemaBuilder::from_sdl(&source) {
        Ok(schema) => schema,
        Err(error) => {
            print_schema_error(path, &source, &error);
            return Ok(None);
        }
    };
    tracing::debug!(schema = %path.display(), types = schema.types().count(), "schema loaded");

    Ok(Some(match config {
        Some(config) => schema.with_extension(config),
        None => schema,
    }))
}

fn print_schema_error(path: &Path, source: &str, error: &SchemaError) {
    eprintln!("{} {}: {}", "Error".red().bold(), path.display(), error);
    print_diagnostics(path, source, error.diagnostics().iter());
}

fn print_diagnostics<'d>(
    path: &Path,
    source: &str,
    diagnostics: impl Iterator<Item = &'d Diagnostic>,
) {
    let name = path.display().to_string();
    for diagnostic in diagnostics {
        eprintln!("{:?}", diagnostic.to_report(&name, source));
    }
}

fn check_queries(
    args: &CostArgs,
    verbose: bool,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    let variables = load_variables(args.variables.as_deref())?;
    let Some(schema) = load_schema(&args.schema, config)? else {
        return Ok(EXIT_REJECTED);
    };

    if !quiet {
        for warning in lint_cost_directives(&schema).iter() {
            eprintln!("{}", warning.to_string().yellow());
        }
    }

    let outcomes = args
        .queries
        .par_iter()
        .map(|file| -> std::io::Result<_> {
            let source = std::fs::read_to_string(file)?;
            let outcome = check_source(&schema, &source, &variables, args.operation.as_deref());
            Ok((file, source, outcome))
        })
        .collect::<Result<Vec<_>, std::io::Error>>()?;

    let mut exit = EXIT_OK;
    for (file, source, outcome) in &outcomes {
        exit = exit.max(outcome.exit_code());
        match outcome {
            QueryOutcome::Invalid(diagnostics) => {
                eprintln!("{} {}", "Error".red().bold(), file.display());
                print_diagnostics(file, source, diagnostics.iter());
            }
            QueryOutcome::Accepted { result, extensions } => {
                if !quiet {
                    println!(
                        "{} {}: complexity {}/{}",
                        "OK".green().bold(),
                        file.display(),
                        result.current,
                        result.max
                    );
                }
                if let Some(extensions) = extensions {
                    println!("{extensions}");
                }
            }
            QueryOutcome::Rejected(error) => {
                if let ComplexityError::BudgetExceeded { current, max } = error {
                    println!(
                        "{} {}: complexity {} exceeds {}",
                        "Rejected".red().bold(),
                        file.display(),
                        current,
                        max
                    );
                }
                if verbose {
                    println!("{}", error.to_graphql_error());
                }
            }
            QueryOutcome::NotConfigured => {
                eprintln!(
                    "{} {}: {}",
                    "Error".red().bold(),
                    file.display(),
                    ComplexityError::NotConfigured
                );
            }
        }
    }

    if exit == EXIT_NOT_CONFIGURED {
        eprintln!(
            "{} pass --max-complexity or --config to set a budget",
            "hint:".cyan().bold()
        );
    }
    Ok(exit)
}

fn explain_queries(args: &CostArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let Some(config) = resolve_config(args)? else {
        eprintln!("{} {}", "Error".red().bold(), ComplexityError::NotConfigured);
        return Ok(EXIT_NOT_CONFIGURED);
    };
    let variables = load_variables(args.variables.as_deref())?;
    let Some(schema) = load_schema(&args.schema, Some(config))? else {
        return Ok(EXIT_REJECTED);
    };

    let mut exit = EXIT_OK;
    for file in &args.queries {
        let source = std::fs::read_to_string(file)?;
        let parsed = parse(&source);
        if parsed.has_errors() {
            eprintln!("{} {}", "Error".red().bold(), file.display());
            print_diagnostics(file, &source, parsed.diagnostics.errors());
            exit = EXIT_REJECTED;
            continue;
        }

        let tree = QueryComplexity::build_tree(
            &schema,
            &config,
            &parsed.document,
            &variables,
            args.operation.as_deref(),
        );
        let explanation = tree.explain(&config);
        let over = explanation.cost > config.max_complexity;
        if over {
            exit = EXIT_REJECTED;
        }

        let status = if over {
            "over budget".red().bold()
        } else {
            "within budget".green().bold()
        };
        println!(
            "{} ({status}, max {})",
            file.display().to_string().bold(),
            config.max_complexity
        );
        println!("{explanation}");
    }
    Ok(exit)
}

fn parse_file(file: &Path) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(file)?;
    let result = parse(&source);

    if result.has_errors() {
        eprintln!("{} Parse failed", "Error:".red().bold());
        let index = LineIndex::new(&source);
        for error in result.diagnostics.errors() {
            let position = error
                .primary_span()
                .map(|span| index.line_col(span.start).to_string())
                .unwrap_or_default();
            eprintln!("  {}:{} {}", file.display(), position, error);
        }
        return Ok(EXIT_REJECTED);
    }

    println!("{:#?}", result.document);
    Ok(EXIT_OK)
}
