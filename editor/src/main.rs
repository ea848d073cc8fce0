use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use nodist_core::inspect::{Dynamic, inspect_with};
use nodist_core::record::{self, Format};
use nodist_editor::config::{EditorConfig, load_or_default};
use nodist_editor::{DirectoryArchive, SceneStorage, StorageError, demo, log_capture};
use nodist_offload::OffloadChannel;

/// nodist scene archive tool.
#[derive(Parser, Debug)]
#[command(
    name = "nodist",
    version,
    about = "Save, load and inspect nodist scene archives"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "nodist.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a sample scene archive into a directory.
    Demo {
        /// Archive directory.
        dir: PathBuf,

        /// Number of meshes sharing the sample geometry.
        #[arg(long, default_value = "8")]
        meshes: usize,

        /// Rim vertices of the sample geometry.
        #[arg(long, default_value = "1024")]
        vertices: usize,
    },
    /// Load an archive and print its record.
    Inspect {
        /// Archive directory.
        dir: PathBuf,

        /// Nesting depth before values are elided.
        #[arg(long)]
        max_depth: Option<usize>,

        /// Items printed per list or map.
        #[arg(long)]
        max_items: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let defaults = EditorConfig::default();
    if let Err(e) = log_capture::install(&defaults.log.filter) {
        eprintln!("{e}");
    }
    let config = load_or_default(&cli.config);
    if config.log.filter != defaults.log.filter
        && let Err(e) = log_capture::set_filter(&config.log.filter)
    {
        log::warn!("{e}");
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn open(dir: PathBuf, config: &EditorConfig) -> Result<SceneStorage<DirectoryArchive>, StorageError> {
    let channel = OffloadChannel::spawn(config.worker_config())?;
    Ok(SceneStorage::new(DirectoryArchive::new(dir), channel).with_policy(config.codec_policy()))
}

fn run(command: Command, config: &EditorConfig) -> Result<(), StorageError> {
    match command {
        Command::Demo {
            dir,
            meshes,
            vertices,
        } => {
            let scene = demo::demo_scene(meshes, vertices)
                .map_err(|e| StorageError::Format(e.to_string()))?;
            let mut storage = open(dir, config)?;
            let summary = storage.save(&scene)?;
            println!(
                "wrote {} nodes to {} ({} buffer files, {} bytes, {} bytes of text)",
                summary.nodes,
                storage.archive().root().display(),
                summary.bins,
                summary.bin_bytes,
                summary.text_bytes
            );
        }
        Command::Inspect {
            dir,
            max_depth,
            max_items,
        } => {
            let mut limits = config.inspector_limits();
            limits.max_depth = max_depth.unwrap_or(limits.max_depth);
            limits.max_items = max_items.unwrap_or(limits.max_items);
            let mut storage = open(dir, config)?;

            let text = storage.read_text()?;
            let value: serde_json::Value = record::decode(&text, Format::Json)?;
            println!("{}", inspect_with(&Dynamic::from(value), limits));

            let root = storage.load()?;
            let mut meshes = 0;
            root.walk(&mut |node| {
                if node.geometry.is_some() {
                    meshes += 1;
                }
            });
            println!("{} nodes, {} with geometry", root.node_count(), meshes);
        }
    }
    Ok(())
}
