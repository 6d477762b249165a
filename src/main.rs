use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cfgtree::config::{ConfigContext, load_layers, to_toml_string};
use cfgtree::readgroup::{ReadGroupParser, default_settings};
use cfgtree::{ConfigTree, Entry, MergeOptions, UnknownKeyPolicy};

#[derive(Parser)]
#[command(name = "cfgtree")]
#[command(
	author,
	version,
	about = "Layer hierarchical TOML configuration with type-checked merging"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Print debug logging to stderr
	#[arg(short, long, global = true)]
	verbose: bool,

	/// How to treat override keys missing from a nested base section (accept, warn, reject)
	#[arg(long, global = true, value_name = "POLICY", default_value_t = UnknownKeyPolicy::Warn)]
	unknown_keys: UnknownKeyPolicy,

	/// Also layer .cfgtree.toml files discovered from the current directory upwards
	#[arg(long, global = true)]
	discover: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Merge config files in order (later files win) and print the result as TOML
	Show {
		/// Config files, least specific first
		files: Vec<PathBuf>,
	},
	/// Print the value at a dotted key path
	Get {
		/// Dotted key path, e.g. bio.ngs.settings.center
		#[arg(required = true)]
		key: Vec<String>,

		/// Use each KEY argument as one literal key, dots included
		#[arg(long)]
		segments: bool,

		/// Config file to layer, may be repeated
		#[arg(short, long = "file", value_name = "FILE")]
		files: Vec<PathBuf>,
	},
	/// List the nested sections at a dotted path (the top level by default)
	Sections {
		/// Dotted section path
		path: Option<String>,

		/// Config file to layer, may be repeated
		#[arg(short, long = "file", value_name = "FILE")]
		files: Vec<PathBuf>,
	},
	/// Check that config files parse and merge without errors
	Validate {
		/// Config files, least specific first
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},
	/// Extract read group fields from a run identifier
	ReadGroup {
		/// Run identifier, e.g. 120924_SN1234_0123_AC0XXXACXX
		input: String,

		/// Config file layered over the read group defaults, may be repeated
		#[arg(short, long = "file", value_name = "FILE")]
		files: Vec<PathBuf>,
	},
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(std::io::stderr().is_terminal())
		.with_target(false)
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	let options = MergeOptions::default().with_unknown_keys(cli.unknown_keys);

	match cli.command {
		Commands::Show { files } => handle_show(&files, cli.discover, &options),
		Commands::Get {
			key,
			segments,
			files,
		} => handle_get(&key, segments, &files, cli.discover, &options),
		Commands::Sections { path, files } => {
			handle_sections(path.as_deref(), &files, cli.discover, &options)
		}
		Commands::Validate { files } => handle_validate(&files, cli.discover, &options),
		Commands::ReadGroup { input, files } => {
			handle_read_group(&input, &files, cli.discover, &options)
		}
	}
}

/// Build the run's context: discovered files (optional), then explicit files.
fn build_context(
	defaults: ConfigTree,
	files: &[PathBuf],
	discover: bool,
	options: &MergeOptions,
) -> Result<ConfigContext> {
	let mut ctx = if discover {
		let cwd = std::env::current_dir().context("Failed to get current directory")?;
		ConfigContext::discover(defaults, &cwd, options)
			.context("Failed to load discovered config files")?
	} else {
		ConfigContext::new(defaults)
	};

	let layers = load_layers(files).context("Failed to load config files")?;
	for layer in &layers {
		ctx = ctx
			.layer(layer, options)
			.context("Failed to merge configuration")?;
	}

	Ok(ctx)
}

fn handle_show(files: &[PathBuf], discover: bool, options: &MergeOptions) -> Result<ExitCode> {
	let ctx = build_context(ConfigTree::new(), files, discover, options)?;

	for source in ctx.sources() {
		println!("# Source: {}", source.display());
	}
	print!("{}", to_toml_string(ctx.tree())?);

	Ok(ExitCode::SUCCESS)
}

fn handle_get(
	key: &[String],
	literal_segments: bool,
	files: &[PathBuf],
	discover: bool,
	options: &MergeOptions,
) -> Result<ExitCode> {
	let ctx = build_context(ConfigTree::new(), files, discover, options)?;
	let segments: Vec<&str> = if literal_segments {
		key.iter().map(String::as_str).collect()
	} else {
		key.iter().flat_map(|part| part.split('.')).collect()
	};
	let entry = ctx
		.get_in(&segments, &[])
		.with_context(|| format!("Failed to look up {}", key.join(" ")))?;

	match &*entry {
		Entry::Scalar(scalar) => println!("{}", scalar),
		Entry::Sequence(items) => {
			for item in items {
				println!("{}", item);
			}
		}
		Entry::Section(section) => print!("{}", to_toml_string(section)?),
		Entry::Deferred(deferred) => println!("<deferred, {} argument(s)>", deferred.arity()),
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_sections(
	path: Option<&str>,
	files: &[PathBuf],
	discover: bool,
	options: &MergeOptions,
) -> Result<ExitCode> {
	let ctx = build_context(ConfigTree::new(), files, discover, options)?;
	let section = ctx
		.section(path.unwrap_or(""))
		.with_context(|| format!("Failed to find section {}", path.unwrap_or("")))?;

	for name in section.sections() {
		println!("{}", name);
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_validate(files: &[PathBuf], discover: bool, options: &MergeOptions) -> Result<ExitCode> {
	match build_context(ConfigTree::new(), files, discover, options) {
		Ok(ctx) => {
			println!("All configuration files are valid:");
			for source in ctx.sources() {
				println!("  {}", source.display());
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {:#}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_read_group(
	input: &str,
	files: &[PathBuf],
	discover: bool,
	options: &MergeOptions,
) -> Result<ExitCode> {
	let ctx = build_context(default_settings(), files, discover, options)?;
	let parser =
		ReadGroupParser::from_config(ctx.tree()).context("Invalid read group settings")?;
	let read_group = parser
		.parse(input)
		.with_context(|| format!("Failed to extract read group from {}", input))?;

	print!("{}", read_group);
	Ok(ExitCode::SUCCESS)
}
