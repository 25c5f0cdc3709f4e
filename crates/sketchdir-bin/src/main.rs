use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use sketchdir_core::config::AppConfig;
use sketchdir_core::handle_store::HandleStore;
use sketchdir_core::{
    Command, CommandOutcome, DiagramDocument, EditorBinder, EditorState, FileSystemContext,
    MoveOutcome, Session,
};
use sketchdir_local::{JsonFileStore, PathPicker};
use sketchdir_platform::DirectoryHandle;

mod render;

#[derive(Parser, Debug)]
#[command(name = "sketchdir")]
#[command(about = "Browse and edit a directory of diagram files")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, env = "SKETCHDIR_CONFIG_PATH", global = true)]
    config_path: Option<PathBuf>,

    /// Where the last opened directory is remembered
    #[arg(long, env = "SKETCHDIR_STORE_PATH", global = true)]
    store_path: Option<PathBuf>,

    /// Quiet period before editor changes are written, in milliseconds
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SKETCHDIR_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a directory and remember it for later runs
    Open { dir: PathBuf },
    /// Print the directory tree (default)
    Tree,
    /// Create a diagram file; the extension is added when missing
    NewFile {
        /// Folder id, or "" / "." for the root
        parent: String,
        name: String,
    },
    /// Create a folder
    NewFolder { parent: String, name: String },
    /// Delete a file or folder, including its contents
    Rm { node: String },
    /// Move a file into another folder
    Mv { node: String, destination: String },
    /// Load a diagram the way the editor does and summarize it
    Show { node: String },
    /// Feed a scene (JSON file) to the editor as if the canvas changed, then save
    Apply { node: String, scene: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!("sketchdir v{}", env!("CARGO_PKG_VERSION"));

    // Load config, CLI args override it
    let config_path = cli.config_path.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load_or_default(&config_path)?;
    if let Some(path) = cli.store_path.clone() {
        config.store_path = Some(path);
    }
    if let Some(ms) = cli.debounce_ms {
        config.save_debounce_ms = ms;
    }

    let command = cli.command.unwrap_or(Commands::Tree);
    let choice = match &command {
        Commands::Open { dir } => Some(dir.clone()),
        _ => None,
    };

    let mut session = build_session(&config, choice);
    let result = run(&mut session, command).await;
    session.shutdown().await;
    result
}

fn build_session(config: &AppConfig, choice: Option<PathBuf>) -> Session {
    let store = JsonFileStore::new(config.resolved_store_path());
    let handles = HandleStore::new(Arc::new(store));
    let picker = Arc::new(PathPicker::new(choice));
    let context = FileSystemContext::new(picker, handles, config.file_extension.clone());
    Session::new(context, EditorBinder::from_config(config))
}

async fn run(session: &mut Session, command: Commands) -> Result<()> {
    if let Commands::Open { dir } = &command {
        let outcome = session
            .execute(Command::OpenDirectory)
            .await
            .with_context(|| format!("failed to open {}", dir.display()))?;
        if matches!(outcome, CommandOutcome::Opened(false)) {
            return Ok(());
        }
        return print_tree(session);
    }

    let restored = session
        .execute(Command::RestoreDirectory)
        .await
        .context("failed to restore the last directory")?;
    if !matches!(restored, CommandOutcome::Restored(true)) {
        anyhow::bail!("no directory open, use `sketchdir open <DIR>` first");
    }

    match command {
        Commands::Open { .. } | Commands::Tree => print_tree(session),
        Commands::NewFile { parent, name } => {
            let outcome = session
                .execute(Command::CreateFile {
                    parent: node_id(&parent),
                    name: name.clone(),
                })
                .await
                .with_context(|| format!("failed to create file {}", name))?;
            report_created(outcome);
            print_tree(session)
        }
        Commands::NewFolder { parent, name } => {
            let outcome = session
                .execute(Command::CreateFolder {
                    parent: node_id(&parent),
                    name: name.clone(),
                })
                .await
                .with_context(|| format!("failed to create folder {}", name))?;
            report_created(outcome);
            print_tree(session)
        }
        Commands::Rm { node } => {
            session
                .execute(Command::Delete { node: node_id(&node) })
                .await
                .with_context(|| format!("failed to delete {}", node))?;
            print_tree(session)
        }
        Commands::Mv { node, destination } => {
            let outcome = session
                .execute(Command::Move {
                    node: node_id(&node),
                    destination: node_id(&destination),
                })
                .await
                .with_context(|| format!("failed to move {}", node))?;
            if let CommandOutcome::Moved(moved) = outcome {
                report_move(&node, moved);
            }
            print_tree(session)
        }
        Commands::Show { node } => {
            open_in_editor(session, &node).await?;
            match session.editor().state() {
                EditorState::Ready(doc) => {
                    println!("{}", render::document_summary(&node, doc));
                    Ok(())
                }
                EditorState::Failed { message } => anyhow::bail!("{} (run again to reload)", message),
                EditorState::Empty => Ok(()),
            }
        }
        Commands::Apply { node, scene } => {
            let text = std::fs::read_to_string(&scene)
                .with_context(|| format!("failed to read scene {}", scene.display()))?;
            let doc: DiagramDocument =
                serde_json::from_str(&text).with_context(|| "scene is not a diagram document")?;

            open_in_editor(session, &node).await?;
            if let EditorState::Failed { message } = session.editor().state() {
                anyhow::bail!("{}", message);
            }
            session.editor_mut().on_change(doc).await;
            session.editor_mut().flush().await;
            info!("applied {} to {}", scene.display(), node);
            Ok(())
        }
    }
}

async fn open_in_editor(session: &mut Session, node: &str) -> Result<()> {
    session
        .execute(Command::Select(Some(node_id(node))))
        .await
        .with_context(|| format!("failed to open {}", node))?;
    Ok(())
}

fn print_tree(session: &mut Session) -> Result<()> {
    if let Some(snapshot) = session.context().snapshot().cloned() {
        session.explorer_mut().expand_all(&snapshot);
    }
    let root = session
        .context()
        .root()
        .map(|r| r.name().to_string())
        .unwrap_or_default();
    print!("{}", render::tree(&root, &session.rows()));
    Ok(())
}

fn report_created(outcome: CommandOutcome) {
    if let CommandOutcome::Created(id) = outcome {
        println!("created {}", id);
    }
}

fn report_move(node: &str, outcome: MoveOutcome) {
    match outcome {
        MoveOutcome::Moved => println!("moved {}", node),
        MoveOutcome::SameLocation => println!("{} is already there", node),
        MoveOutcome::CopiedSourceRetained { error } => {
            warn!("original of {} could not be removed: {}", node, error);
            println!(
                "copied {} but the original is still in place; remove it with `sketchdir rm {}`",
                node, node
            );
        }
    }
}

/// Accept `.`, `./a` and `/a/` as well as bare ids
fn node_id(raw: &str) -> String {
    let trimmed = raw.trim_start_matches("./").trim_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}
