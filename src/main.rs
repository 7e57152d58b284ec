use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use swagger_brake::artifact::{ArtifactCoordinate, MavenResolver};
use swagger_brake::compat::BreakingConfig;
use swagger_brake::report::{self, EXIT_BREAKING, EXIT_COMPATIBLE, EXIT_FAILURE, ReportFormat};
use swagger_brake::runner::{self, Options};
use swagger_brake::spec::{ApiSpec, Compatibility};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swagger-brake")]
#[command(about = "Detect breaking changes between two versions of an OpenAPI/Swagger description")]
#[command(version)]
struct Args {
    #[arg(long, global = true, help = "Enable debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    #[command(about = "Check for breaking changes and report them")]
    Check {
        #[arg(long, help = "Path to the old API description")]
        old_api: Option<PathBuf>,
        #[arg(long, help = "Path to the new API description")]
        new_api: Option<PathBuf>,
        #[arg(long, help = "Maven repository to fetch the latest published old API from")]
        maven_repo: Option<String>,
        #[arg(long, requires = "maven_repo", help = "Group id of the published API artifact")]
        group_id: Option<String>,
        #[arg(long, requires = "maven_repo", help = "Artifact id of the published API artifact")]
        artifact_id: Option<String>,
        #[arg(
            long,
            help = "File extension of the published API artifact (jars are searched for a description)",
            default_value = "jar"
        )]
        artifact_extension: String,
        #[arg(long, help = "Output format", value_enum, default_value = "text")]
        format: OutputFormat,
        #[arg(long, help = "YAML configuration file with a `breaking:` section")]
        config: Option<PathBuf>,
        #[arg(long, help = "Rules to use (comma-separated)")]
        use_rules: Option<String>,
        #[arg(long, help = "Categories to use (comma-separated)")]
        use_categories: Option<String>,
        #[arg(long, help = "Rules to exclude (comma-separated)")]
        except_rules: Option<String>,
    },
    #[command(about = "Compare two API descriptions for compatibility")]
    Compare {
        #[arg(help = "Path to the old API description")]
        old_file: PathBuf,
        #[arg(help = "Path to the new API description")]
        new_file: PathBuf,
    },
    #[command(about = "Generate semantic fingerprint for an API description")]
    Fingerprint {
        #[arg(help = "Path to the API description")]
        file: PathBuf,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match execute(args.command) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn execute(command: Commands) -> Result<u8> {
    match command {
        Commands::Check {
            old_api,
            new_api,
            maven_repo,
            group_id,
            artifact_id,
            artifact_extension,
            format,
            config,
            use_rules,
            use_categories,
            except_rules,
        } => {
            let mut config = match config {
                Some(path) => BreakingConfig::from_yaml_file(&path).with_context(|| {
                    format!("Failed to load configuration '{}'", path.display())
                })?,
                None => BreakingConfig::default(),
            };
            if let Some(rules) = use_rules {
                config.use_rules = split_list(&rules);
                config.use_categories.clear();
            }
            if let Some(categories) = use_categories {
                config.use_categories = split_list(&categories);
            }
            if let Some(except) = except_rules {
                config.except_rules = split_list(&except);
            }

            let maven = match (maven_repo, group_id, artifact_id) {
                (Some(repo), Some(group), Some(artifact)) => Some(
                    ArtifactCoordinate::new(repo, group, artifact)
                        .with_extension(artifact_extension),
                ),
                (Some(_), _, _) => {
                    anyhow::bail!("--maven-repo requires both --group-id and --artifact-id")
                }
                _ => None,
            };

            let options = Options {
                old_api_path: old_api,
                new_api_path: new_api,
                maven,
                config,
                format: format.into(),
            };
            let resolver = MavenResolver::over_http();
            let result = runner::run(&options, &resolver, &mut io::stdout().lock())?;
            Ok(report::exit_code(&result))
        }
        Commands::Compare { old_file, new_file } => {
            let old_spec = ApiSpec::from_path(&old_file)
                .with_context(|| format!("Failed to load old file '{}'", old_file.display()))?;
            let new_spec = ApiSpec::from_path(&new_file)
                .with_context(|| format!("Failed to load new file '{}'", new_file.display()))?;

            match old_spec.compare_with(&new_spec)? {
                Compatibility::Green => {
                    println!("Green: Descriptions are semantically identical");
                    Ok(EXIT_COMPATIBLE)
                }
                Compatibility::Yellow => {
                    println!("Yellow: New description is backward-compatible with old description");
                    Ok(EXIT_COMPATIBLE)
                }
                Compatibility::Red => {
                    println!("Red: Breaking change detected");
                    Ok(EXIT_BREAKING)
                }
            }
        }
        Commands::Fingerprint { file } => {
            let spec = ApiSpec::from_path(&file)
                .with_context(|| format!("Failed to load file '{}'", file.display()))?;
            println!("{}", spec.fingerprint);
            Ok(EXIT_COMPATIBLE)
        }
    }
}
