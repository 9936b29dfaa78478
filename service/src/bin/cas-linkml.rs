//! `cas-linkml`: convert the Cell Annotation Schema and its data

use anyhow::{Context, Result};
use cas_linkml::{
    dumper::RdfFormat,
    logging,
    pipeline::{
        convert_cas_schema_to_linkml, decorate_schema, expand_schema, run_data2owl,
        run_rdf_dumper,
    },
};
use cas_linkml_core::settings::{CasLinkmlConfig, LogFormat};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Cell Annotation Schema to LinkML, OWL and RDF
#[derive(Parser, Debug)]
#[command(name = "cas-linkml")]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the CAS JSON-Schema as a LinkML schema
    Import {
        /// CAS JSON-Schema file
        json_schema: PathBuf,
        /// Output LinkML YAML file
        #[arg(short, long)]
        output: PathBuf,
        /// Schema name
        #[arg(short, long, default_value = "cell-annotation-schema")]
        name: String,
    },
    /// Add ontology mappings, label-set enums and OWL annotations
    Decorate {
        /// LinkML schema to decorate
        schema: PathBuf,
        /// Output LinkML YAML file
        #[arg(short, long)]
        output: PathBuf,
        /// Namespace of the generated ontology
        #[arg(long)]
        namespace: Option<String>,
        /// IRI of the generated ontology
        #[arg(long)]
        ontology_iri: Option<String>,
        /// Label-set name (repeatable)
        #[arg(short, long = "labelset")]
        labelsets: Vec<String>,
        /// Leave out the OWL annotations
        #[arg(long)]
        no_owl: bool,
    },
    /// Expand dynamic enums against an ontology service
    Expand {
        /// LinkML schema with dynamic enums
        schema: PathBuf,
        /// Output LinkML YAML file
        #[arg(short, long)]
        output: PathBuf,
        /// Enum to expand (repeatable); every dynamic enum when omitted
        #[arg(long = "value-set")]
        value_sets: Vec<String>,
        /// Local term file to use instead of OLS
        #[arg(long)]
        ontology_file: Option<String>,
        /// OLS API base URL
        #[arg(long)]
        ols_url: Option<String>,
    },
    /// Render annotation data as RDF
    Rdf {
        /// Decorated LinkML schema
        schema: PathBuf,
        /// Annotation data (JSON or YAML)
        data: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Class the data is an instance of
        #[arg(short, long)]
        target_class: Option<String>,
        /// `xml` or `turtle`; taken from the output extension when omitted
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Render annotation data as OWL functional syntax
    Owl {
        /// Decorated LinkML schema with OWL annotations
        schema: PathBuf,
        /// Annotation data (JSON or YAML)
        data: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Class the data is an instance of
        #[arg(short, long)]
        target_class: Option<String>,
        /// Ontology IRI; the schema id when omitted
        #[arg(long)]
        ontology_iri: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CasLinkmlConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => CasLinkmlConfig::default(),
    };
    config.logging.level = logging::effective_level(&config.logging.level, args.verbose);
    if let Some(format) = args.log_format {
        config.logging.format = format.into();
    }
    logging::init(&config.logging)?;

    match args.command {
        Command::Import {
            json_schema,
            output,
            name,
        } => {
            let schema = convert_cas_schema_to_linkml(&json_schema, &name, &output)
                .await
                .with_context(|| format!("Failed to import {}", json_schema.display()))?;
            report(
                &output,
                &format!("{} classes, {} enums", schema.classes.len(), schema.enums.len()),
            );
        }
        Command::Decorate {
            schema,
            output,
            namespace,
            ontology_iri,
            labelsets,
            no_owl,
        } => {
            let decoration = &mut config.decoration;
            if let Some(namespace) = namespace {
                decoration.namespace = namespace;
            }
            if let Some(ontology_iri) = ontology_iri {
                decoration.ontology_iri = ontology_iri;
            }
            if !labelsets.is_empty() {
                decoration.labelsets = labelsets;
            }
            config.validate()?;
            let decorated = decorate_schema(&schema, &output, &config.decoration, !no_owl)
                .await
                .with_context(|| format!("Failed to decorate {}", schema.display()))?;
            report(&output, &format!("{} enums", decorated.enums.len()));
        }
        Command::Expand {
            schema,
            output,
            value_sets,
            ontology_file,
            ols_url,
        } => {
            let expansion = &mut config.expansion;
            if !value_sets.is_empty() {
                expansion.value_sets = value_sets;
            }
            if ontology_file.is_some() {
                expansion.ontology_file = ontology_file;
            }
            if let Some(url) = ols_url {
                expansion.base_url = url;
            }
            config.validate()?;
            let expanded = expand_schema(&schema, &output, &config.expansion)
                .await
                .with_context(|| format!("Failed to expand {}", schema.display()))?;
            report(
                &output,
                &format!(
                    "{} permissible values added to {} enums",
                    expanded.total_added(),
                    expanded.expanded.len()
                ),
            );
            for skipped in &expanded.skipped {
                eprintln!("{} {skipped} has no reachable_from", "skipped".yellow().bold());
            }
        }
        Command::Rdf {
            schema,
            data,
            output,
            target_class,
            format,
        } => {
            let target_class = target_class.unwrap_or(config.output.target_class);
            let format = match format {
                Some(format) => format.parse::<RdfFormat>()?,
                None => RdfFormat::from_path(&output).unwrap_or_default(),
            };
            let written = run_rdf_dumper(
                &schema,
                &data,
                &output,
                &target_class,
                &config.output.prefix_map,
                format,
            )
            .await
            .with_context(|| format!("Failed to dump {}", data.display()))?;
            match written {
                Some(triples) => report(&output, &format!("{triples} triples")),
                None => {
                    eprintln!(
                        "{} could not instantiate {target_class} from {}",
                        "failed".red().bold(),
                        data.display()
                    );
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Owl {
            schema,
            data,
            output,
            target_class,
            ontology_iri,
        } => {
            let target_class = target_class.unwrap_or(config.output.target_class);
            let ontology_iri = ontology_iri.or(config.output.ontology_iri);
            let document = run_data2owl(
                &schema,
                &data,
                &output,
                &target_class,
                ontology_iri.as_deref(),
            )
            .await
            .with_context(|| format!("Failed to convert {} to OWL", data.display()))?;
            report(&output, &format!("{} axioms", document.axioms.len()));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report(path: &Path, summary: &str) {
    eprintln!(
        "{} {} ({summary})",
        "wrote".green().bold(),
        path.display().to_string().bold()
    );
}
