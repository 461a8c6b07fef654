//! notebook: command-line front end for the ordered notebook tree.
//!
//! Plays the role of the UI layer: it validates names, calls the tree
//! store's operations and prints listings in display order.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tree_store::names::{display_name, note_file_name};
use tree_store::{
    validate_name, AppStateStore, Autosaver, CreateOutcome, EntryKind, OpenTab, RenameOutcome,
    TreeStore, DEFAULT_FOLDERS,
};

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "notebook")]
#[command(about = "Ordered markdown notebook")]
struct Args {
    /// Notebook base directory (defaults to NOTEBOOK_DIR or the platform data dir)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the default folders in an empty notebook
    Init,
    /// List top-level folders
    Folders,
    /// List folders and notes of a folder ("" for the base folder)
    Items {
        #[arg(default_value = "")]
        folder: String,
    },
    /// List notes of a folder
    Files { folder: String },
    /// Create a folder (top-level, or inside --parent)
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Create an empty note
    Touch { folder: String, name: String },
    /// Delete a folder and everything in it
    RmFolder { path: String },
    /// Delete a note
    Rm { folder: String, name: String },
    /// Rename a folder (path may be nested: "Work/Old")
    MvFolder { path: String, new_name: String },
    /// Rename a note
    Mv {
        folder: String,
        old: String,
        new: String,
    },
    /// Put entries of a folder in the given order ("" for the base folder)
    Reorder {
        folder: String,
        names: Vec<String>,
        /// Only reorder notes, keeping folders ahead of them
        #[arg(long)]
        files_only: bool,
    },
    /// Print a note
    Cat { folder: String, file: String },
    /// Write stdin into a note, autosaving as lines arrive
    Write {
        folder: String,
        file: String,
        /// Autosave period in milliseconds
        #[arg(long, default_value_t = 1000)]
        autosave_ms: u64,
    },
    /// Show open tabs
    Tabs,
    /// Open a note in a tab
    Open { folder: String, file: String },
    /// Close a tab
    Close { folder: String, file: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Respects RUST_LOG, defaults to info (or debug with --verbose). Logs go to
    // stderr so listings on stdout stay clean.
    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(args.dir)?;
    debug!("Notebook dir: {:?}", config.notebook_dir);
    debug!("State file: {:?}", config.state_file);

    let store = TreeStore::open(&config.notebook_dir)?;
    let state_store = AppStateStore::new(&config.state_file);

    run(args.command, store, &state_store).await
}

async fn run(command: Command, store: TreeStore, state_store: &AppStateStore) -> Result<()> {
    match command {
        Command::Init => {
            let created = store.init_defaults(DEFAULT_FOLDERS)?;
            if created.is_empty() {
                println!("Notebook already has folders");
            } else {
                println!("Created {}", created.join(", "));
            }
        }
        Command::Folders => {
            for name in store.list_folders()? {
                println!("{}", name);
            }
        }
        Command::Items { folder } => {
            for entry in store.list_items(&folder)? {
                match entry.kind {
                    EntryKind::Folder => println!("{}/", entry.name),
                    EntryKind::File => println!("{}", entry.name),
                }
            }
        }
        Command::Files { folder } => {
            for name in store.list_markdown_files(&folder)? {
                println!("{}", display_name(&name));
            }
        }
        Command::Mkdir { name, parent } => {
            let parent = parent.unwrap_or_default();
            validate_name(&name, &store.list_subfolders(&parent)?)?;
            if store.create_subfolder(&parent, &name)? == CreateOutcome::AlreadyExisted {
                warn!("Folder {:?} already existed", name);
            }
        }
        Command::Touch { folder, name } => {
            let file_name = note_file_name(&name);
            validate_name(&file_name, &store.list_markdown_files(&folder)?)?;
            store.create_file(&folder, &file_name)?;
        }
        Command::RmFolder { path } => {
            if !store.delete_folder(&path)? {
                bail!("No folder {:?}", path);
            }
        }
        Command::Rm { folder, name } => {
            if !store.delete_markdown_file(&folder, &name)? {
                bail!("No note {:?} in {:?}", name, folder);
            }
        }
        Command::MvFolder { path, new_name } => {
            let parent = path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
            validate_name(&new_name, &store.list_subfolders(parent)?)?;
            report_rename(store.rename_folder(&path, &new_name)?, &path)?;
        }
        Command::Mv { folder, old, new } => {
            let new = note_file_name(&new);
            validate_name(&new, &store.list_markdown_files(&folder)?)?;
            report_rename(store.rename_markdown_file(&folder, &old, &new)?, &old)?;
        }
        Command::Reorder {
            folder,
            names,
            files_only,
        } => {
            if files_only {
                let names: Vec<String> = names.iter().map(|n| note_file_name(n)).collect();
                store.reorder_files(&folder, &names)?;
            } else {
                store.reorder_items(&folder, &names)?;
            }
        }
        Command::Cat { folder, file } => {
            print!("{}", store.read_note(&folder, &file)?);
        }
        Command::Write {
            folder,
            file,
            autosave_ms,
        } => {
            write_from_stdin(store, state_store, &folder, &file, autosave_ms).await?;
        }
        Command::Tabs => {
            let mut state = state_store.load();
            state.retain_existing(&store);
            for tab in &state.open_tabs {
                let marker = if state.last_opened.as_ref() == Some(tab) { "*" } else { " " };
                println!("{} {}/{}", marker, tab.folder, display_name(&tab.file));
            }
        }
        Command::Open { folder, file } => {
            let file = note_file_name(&file);
            if !store.note_path(&folder, &file)?.is_file() {
                bail!("No note {:?} in {:?}", file, folder);
            }
            let mut state = state_store.load();
            state.open_tab(OpenTab::new(folder, file));
            state_store.save(&state)?;
        }
        Command::Close { folder, file } => {
            let mut state = state_store.load();
            state.close_tab(&OpenTab::new(folder, note_file_name(&file)));
            state_store.save(&state)?;
        }
    }
    Ok(())
}

fn report_rename(outcome: RenameOutcome, what: &str) -> Result<()> {
    match outcome {
        RenameOutcome::Renamed => Ok(()),
        RenameOutcome::SourceMissing => bail!("{:?} does not exist", what),
        RenameOutcome::TargetExists => bail!("Target name is already taken"),
    }
}

/// Stream stdin into a note, with the autosaver persisting as lines arrive.
async fn write_from_stdin(
    store: TreeStore,
    state_store: &AppStateStore,
    folder: &str,
    file: &str,
    autosave_ms: u64,
) -> Result<()> {
    let file = note_file_name(file);
    let store = Arc::new(store);

    let mut state = state_store.load();
    state.open_tab(OpenTab::new(folder, file.as_str()));
    state_store.save(&state)?;

    let autosaver = Autosaver::spawn(Arc::clone(&store), Duration::from_millis(autosave_ms));
    let mut content = store.read_note(folder, &file)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!("Writing to {}/{} (Ctrl+C or EOF to finish)", folder, file);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        content.push_str(&line);
                        content.push('\n');
                        autosaver.update(folder, &file, &content);
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    autosaver.shutdown().await?;
    Ok(())
}
