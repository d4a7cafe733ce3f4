//! tg-option-container CLI
//!
//! Entry point for the `tgoc` command-line tool.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tg_option_container::config::{deep_merge, parse_override, LayeredConfig, SchemaFile, SchemaRegistry};
use tg_option_container::Schema;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tgoc")]
#[command(about = "Inspect and validate option container schemas", version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print schema type definitions
    Describe {
        /// Path to the schema file
        schema_file: PathBuf,

        /// Only describe this schema
        #[arg(long, short = 's')]
        schema: Option<String>,
    },

    /// Build a container from config layers and print it
    Check {
        /// Path to the schema file
        schema_file: PathBuf,

        /// Schema to validate against
        #[arg(long, short = 's')]
        schema: String,

        /// Config files (TOML or JSON), lowest precedence first
        #[arg(long = "config", short = 'c')]
        configs: Vec<PathBuf>,

        /// Override a value, e.g. --set database.port=5433
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Output in JSON format, with provenance
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Describe {
            schema_file,
            schema,
        } => {
            run_describe(schema_file, schema);
        }
        Commands::Check {
            schema_file,
            schema,
            configs,
            overrides,
            json,
        } => {
            run_check(schema_file, &schema, configs, overrides, json);
        }
    }
}

fn load_registry(path: &Path) -> SchemaRegistry {
    match SchemaFile::load(path) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error loading schema file {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn lookup(registry: &SchemaRegistry, name: &str) -> Arc<Schema> {
    match registry.get(name) {
        Some(schema) => Arc::clone(schema),
        None => {
            let known: Vec<&str> = registry.names().collect();
            eprintln!("Unknown schema '{}'. Known schemas: {}", name, known.join(", "));
            process::exit(1);
        }
    }
}

fn run_describe(schema_file: PathBuf, schema: Option<String>) {
    let registry = load_registry(&schema_file);

    match schema {
        Some(name) => println!("{}", lookup(&registry, &name).typedef()),
        None => {
            let typedefs: Vec<String> = registry.iter().map(|s| s.typedef()).collect();
            println!("{}", typedefs.join("\n\n"));
        }
    }
}

fn run_check(
    schema_file: PathBuf,
    schema: &str,
    configs: Vec<PathBuf>,
    overrides: Vec<String>,
    json_output: bool,
) {
    let registry = load_registry(&schema_file);
    let schema = lookup(&registry, schema);

    let mut override_layer = None;
    for assignment in &overrides {
        match parse_override(assignment) {
            Ok(value) => {
                override_layer = Some(match override_layer {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                });
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }

    let layered = match LayeredConfig::build(&schema, &configs, override_layer) {
        Ok(layered) => layered,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match layered.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", layered.config);
        println!();
        println!("Sources:");
        for source in &layered.sources {
            match (&source.path, &source.digest) {
                (Some(path), Some(digest)) => {
                    println!("  {:?}: {} (sha256 {})", source.origin, path, &digest[..12])
                }
                _ => println!("  {:?}", source.origin),
            }
        }
    }
}
