//! Command-line entry point for the banana core.
//!
//! # Usage
//!
//! ```text
//! banana ping
//! banana split-pdf <pdf> <output-dir>
//! banana api-keys [--ensure <source> [--export]]
//! banana project create [--id <id>] [--type <creation-type>] [--prompt <text>]
//! banana merge-outline <project-id> <outline.json>
//! banana pages <project-id>
//! ```
//!
//! Settings come from `BANANA_*` environment variables; `--db` overrides the
//! database path.

use anyhow::{Context, Result};
use banana_core::db::open_db;
use banana_core::{
    collect_env_api_keys, ensure_namespace_key, init_logging, init_stderr_logging,
    namespace_key_name, split_pdf_to_pages, CoreConfig, EnvSource, OutlineEntry,
    PageMergeService, ProcessEnv, Project, ProjectRepository, SqlitePageRepository,
    SqliteProjectRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "banana",
    version,
    about = "Outline/page maintenance tools for the banana slide backend",
    long_about = None,
)]
struct Cli {
    /// SQLite database path (overrides BANANA_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log to stderr at the configured level instead of warnings only.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print core linkage and version.
    Ping,

    /// Split a PDF into one single-page PDF per page.
    SplitPdf {
        pdf: PathBuf,
        output_dir: PathBuf,
    },

    /// Print the configured vendor keys as a JSON object.
    ///
    /// With `--ensure`, print the namespaced variable name the vendor's key
    /// resolves to instead.
    ApiKeys {
        /// Vendor whose key backs `{NAMESPACE}_{VENDOR}_API_KEY`.
        #[arg(long)]
        ensure: Option<String>,

        /// Print `export NAME='value'` for the shell to eval (reveals the key).
        #[arg(long, requires = "ensure")]
        export: bool,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Merge an outline JSON array (`[{"title", "points"}]`) into a project's pages.
    MergeOutline {
        project_id: String,
        outline: PathBuf,
    },

    /// Print the stored pages of a project as JSON.
    Pages { project_id: String },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    /// Create an empty project and print its id.
    Create {
        #[arg(long)]
        id: Option<String>,
        #[arg(long = "type", default_value = "idea")]
        creation_type: String,
        #[arg(long)]
        prompt: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut env = ProcessEnv;
    let mut config = CoreConfig::from_env(&env).context("invalid BANANA_* configuration")?;
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    setup_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Ping => {
            println!("banana_core ping={}", banana_core::ping());
            println!("banana_core version={}", banana_core::core_version());
        }
        Commands::SplitPdf { pdf, output_dir } => {
            let paths = split_pdf_to_pages(&pdf, &output_dir)
                .with_context(|| format!("failed to split {}", pdf.display()))?;
            for path in paths {
                println!("{}", path.display());
            }
        }
        Commands::ApiKeys { ensure, export } => {
            let mut stdout = std::io::stdout().lock();
            run_api_keys(
                &mut env,
                ensure.as_deref(),
                export,
                &config.key_namespace,
                &mut stdout,
            )?;
        }
        Commands::Project {
            command:
                ProjectCommand::Create {
                    id,
                    creation_type,
                    prompt,
                },
        } => {
            let conn = open_db(&config.db_path)?;
            let repo = SqliteProjectRepository::try_new(&conn)?;
            let mut project = match id {
                Some(id) => Project::with_id(id, creation_type),
                None => Project::new(creation_type),
            };
            project.idea_prompt = prompt;
            let id = repo.create_project(&project)?;
            info!("event=project_create module=cli status=ok project_id={id}");
            println!("{id}");
        }
        Commands::MergeOutline {
            project_id,
            outline,
        } => {
            let raw = std::fs::read_to_string(&outline)
                .with_context(|| format!("failed to read {}", outline.display()))?;
            let entries: Vec<OutlineEntry> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not an outline array", outline.display()))?;

            let mut conn = open_db(&config.db_path)?;
            let repo = SqlitePageRepository::try_new(&mut conn)?;
            let pages = PageMergeService::new(repo).merge_pages(&project_id, &entries)?;
            println!("{}", serde_json::to_string_pretty(&pages)?);
        }
        Commands::Pages { project_id } => {
            let mut conn = open_db(&config.db_path)?;
            let repo = SqlitePageRepository::try_new(&mut conn)?;
            let pages = PageMergeService::new(repo).list_pages(&project_id)?;
            println!("{}", serde_json::to_string_pretty(&pages)?);
        }
    }

    Ok(())
}

/// A child process cannot change its parent's environment, so the resolved
/// name (or an `export` line) is printed for the caller to act on.
fn run_api_keys(
    env: &mut impl EnvSource,
    ensure: Option<&str>,
    export: bool,
    namespace: &str,
    out: &mut impl Write,
) -> Result<()> {
    let Some(source) = ensure else {
        if let Some(json) = collect_env_api_keys(&*env) {
            writeln!(out, "{json}")?;
        }
        return Ok(());
    };

    if !ensure_namespace_key(env, source, namespace) {
        anyhow::bail!("no API key found for `{source}`");
    }
    let name = namespace_key_name(namespace, source);
    if export {
        let value = env.var(&name).unwrap_or_default();
        writeln!(out, "export {name}='{}'", value.replace('\'', "'\\''"))?;
    } else {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

fn setup_logging(config: &CoreConfig, verbose: bool) -> Result<()> {
    match &config.log_dir {
        Some(dir) => {
            let dir = dir
                .to_str()
                .context("BANANA_LOG_DIR must be valid UTF-8")?;
            init_logging(config.log_level, dir)?;
        }
        None => {
            let level = if verbose { config.log_level } else { "warn" };
            init_stderr_logging(level)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run_api_keys, Cli, Commands};
    use banana_core::{EnvSource, MapEnv};
    use clap::{CommandFactory, Parser};

    fn api_keys_output(
        env: &mut MapEnv,
        ensure: Option<&str>,
        export: bool,
    ) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run_api_keys(env, ensure, export, "BANANA", &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_db_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["banana", "pages", "proj-1", "--db", "/tmp/x.db"]);
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::Pages { project_id } if project_id == "proj-1"));
    }

    #[test]
    fn api_keys_prints_collected_json() {
        let mut env = MapEnv::new()
            .with("QWEN_API_KEY", "q-key")
            .with("OPENAI_API_KEY", "o-key");
        let out = api_keys_output(&mut env, None, false).unwrap();
        assert_eq!(out, "{\"openai\":\"o-key\",\"qwen\":\"q-key\"}\n");
    }

    #[test]
    fn api_keys_prints_nothing_without_keys() {
        let out = api_keys_output(&mut MapEnv::new(), None, false).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn api_keys_ensure_prints_namespaced_name_only() {
        let mut env = MapEnv::new().with("QWEN_API_KEY", "secret");
        let out = api_keys_output(&mut env, Some("qwen"), false).unwrap();
        assert_eq!(out, "BANANA_QWEN_API_KEY\n");
        assert!(!out.contains("secret"));
        assert_eq!(env.var("BANANA_QWEN_API_KEY").as_deref(), Some("secret"));
    }

    #[test]
    fn api_keys_ensure_export_quotes_value() {
        let mut env = MapEnv::new().with("QWEN_API_KEY", "it's");
        let out = api_keys_output(&mut env, Some("qwen"), true).unwrap();
        assert_eq!(out, "export BANANA_QWEN_API_KEY='it'\\''s'\n");
    }

    #[test]
    fn api_keys_ensure_without_key_is_an_error() {
        let err = api_keys_output(&mut MapEnv::new(), Some("kimi"), false).unwrap_err();
        assert!(err.to_string().contains("kimi"));
    }

    #[test]
    fn export_flag_requires_ensure() {
        assert!(Cli::try_parse_from(["banana", "api-keys", "--export"]).is_err());
    }
}
