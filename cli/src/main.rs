use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fragment_typegen::error::TypegenError;
use fragment_typegen::schema_printer;
use fragment_typegen::TypegenOptions;
use fragment_typegen::TypegenSchema;
use fragment_typegen::UnknownFragmentPolicy;
use tracing_subscriber::EnvFilter;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Prints the TypeScript type of a fragment or operation document
    Generate {
        /// The path to the schema SDL file
        #[arg(long)]
        schema: PathBuf,
        /// The path to the document, or `-` for stdin
        document: PathBuf,
        /// Treat the document as a set of fragments rooted at this one
        #[arg(long, conflicts_with = "operation")]
        root: Option<String>,
        /// Treat the document as an operation
        #[arg(long)]
        operation: bool,
        /// Response names to leave out, may be repeated
        #[arg(long = "exclude")]
        exclude: Vec<String>,
        #[arg(long, default_value_t = 0)]
        indent: usize,
        #[arg(long, value_enum, default_value_t = Mode::Plain)]
        mode: Mode,
        /// Overrides the default handling of spreads of undefined fragments
        #[arg(long)]
        unknown_fragments: Option<UnknownFragmentPolicy>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Prints interfaces for the input objects and enums of a schema
    InputTypes {
        /// The path to the schema SDL file
        #[arg(long)]
        schema: PathBuf,
    },
    /// Prints a brand declaration for every object type of a schema
    Brands {
        /// The path to the schema SDL file
        #[arg(long)]
        schema: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Mode {
    Plain,
    Branded,
    Named,
}

/// Which kind of document is being generated for.
enum Document<'a> {
    Fragment,
    MultiFragment(&'a str),
    Operation,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error(transparent)]
    Typegen(#[from] TypegenError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Generate {
            schema,
            document,
            root,
            operation,
            exclude,
            indent,
            mode,
            unknown_fragments,
            json,
        } => {
            let kind = match (&root, operation) {
                (Some(root), _) => Document::MultiFragment(root),
                (None, true) => Document::Operation,
                (None, false) => Document::Fragment,
            };
            let mut options = TypegenOptions::default()
                .with_fields_to_exclude(exclude)
                .with_indent(indent);
            if let Some(policy) = unknown_fragments {
                options = options.with_unknown_fragments(policy);
            }
            generate(&schema, &document, kind, mode, &options, json)
        }
        Command::InputTypes { schema } => {
            load_schema(&schema).map(|schema| schema_printer::print_input_object_types(&schema))
        }
        Command::Brands { schema } => {
            load_schema(&schema).map(|schema| schema_printer::print_type_brands(&schema))
        }
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let result = if path == Path::new("-") {
        io::read_to_string(io::stdin())
    } else {
        fs::read_to_string(path)
    };
    result.map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn load_schema(path: &Path) -> Result<TypegenSchema, CliError> {
    let sdl = read_input(path)?;
    Ok(TypegenSchema::parse(&sdl, path)?)
}

fn generate(
    schema_path: &Path,
    document_path: &Path,
    kind: Document<'_>,
    mode: Mode,
    options: &TypegenOptions,
    json: bool,
) -> Result<String, CliError> {
    let schema = load_schema(schema_path)?;
    let source = read_input(document_path)?;
    tracing::debug!(document = %document_path.display(), "generating types");

    match mode {
        Mode::Plain => {
            let text = match kind {
                Document::Fragment => {
                    fragment_typegen::fragment_type_definition(&schema, &source, options)?
                }
                Document::MultiFragment(root) => fragment_typegen::multi_fragment_type_definition(
                    &schema, &source, root, options,
                )?,
                Document::Operation => {
                    fragment_typegen::operation_type_definition(&schema, &source, options)?
                }
            };
            if json {
                Ok(serde_json::to_string_pretty(&text)?)
            } else {
                Ok(text)
            }
        }
        Mode::Branded => {
            let definition = match kind {
                Document::Fragment => {
                    fragment_typegen::fragment_branded_type_definition(&schema, &source, options)?
                }
                Document::MultiFragment(root) => {
                    fragment_typegen::multi_fragment_branded_type_definition(
                        &schema, &source, root, options,
                    )?
                }
                Document::Operation => {
                    fragment_typegen::operation_branded_type_definition(&schema, &source, options)?
                }
            };
            if json {
                Ok(serde_json::to_string_pretty(&definition)?)
            } else {
                Ok(format!(
                    "// brands: {}\n{}\n\n{}",
                    definition.brands_to_import.join(", "),
                    definition.fragment_type_text,
                    definition.fragment_type_brand_text
                ))
            }
        }
        Mode::Named => {
            let definition = match kind {
                Document::Fragment => {
                    fragment_typegen::fragment_named_type_definition(&schema, &source, options)?
                }
                Document::MultiFragment(root) => {
                    fragment_typegen::multi_fragment_named_type_definition(
                        &schema, &source, root, options,
                    )?
                }
                Document::Operation => {
                    fragment_typegen::operation_named_type_definition(&schema, &source, options)?
                }
            };
            if json {
                Ok(serde_json::to_string_pretty(&definition)?)
            } else {
                let mut text = definition.type_text;
                for (name, named_type) in &definition.named_types {
                    text.push_str(&format!("\n\nexport type {name} = {named_type};"));
                }
                Ok(text)
            }
        }
    }
}
