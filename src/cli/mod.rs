//! CLI argument definitions for pfe.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::PrefKind;

/// Version string with build metadata from build.rs.
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PFE_GIT_COMMIT"),
    ", built ",
    env!("PFE_BUILD_TIMESTAMP"),
    ")"
);

/// pfe - inspect and edit typed XML preference files.
///
/// Reading never needs privileges beyond file access. Editing replaces the
/// whole file through an atomic rename that preserves the original owner
/// and a 0660 mode, then terminates the owning process so it re-reads the
/// file; replacing files owned by other users requires root.
#[derive(Parser, Debug)]
#[command(name = "pfe")]
#[command(author, version, long_version = LONG_VERSION)]
#[command(about = "A CLI tool for inspecting and editing typed XML preference files")]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true, env = "PFE_HUMAN")]
    pub human_readable: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all entries of a preference file
    Cat {
        /// Preference file to read
        file: PathBuf,
    },

    /// Show a single entry
    Get {
        /// Preference file to read
        file: PathBuf,
        /// Key to look up
        key: String,
    },

    /// List the keys of a preference file in display order
    Keys {
        /// Preference file to read
        file: PathBuf,
    },

    /// Create or update an entry, then save the file
    ///
    /// With --rename-from the entry previously stored under that key is
    /// renamed to <KEY>; renaming onto an existing key overwrites it.
    Set {
        /// Preference file to edit (created if missing)
        file: PathBuf,
        /// Key to create or update
        key: String,
        /// New value; hex for --type byte-array, comma-separated for --type set
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Value kind
        #[arg(long = "type", value_enum, default_value = "string")]
        kind: PrefKind,
        /// Rename this existing key to <KEY> instead of creating a new entry
        #[arg(long, value_name = "OLD_KEY")]
        rename_from: Option<String>,
        #[command(flatten)]
        save: SaveOpts,
    },

    /// Remove an entry, then save the file
    Rm {
        /// Preference file to edit
        file: PathBuf,
        /// Key to remove (absent keys are a no-op)
        key: String,
        #[command(flatten)]
        save: SaveOpts,
    },

    /// Validate a raw payload and save it onto a preference file
    Save {
        /// Target preference file
        file: PathBuf,
        /// Read the payload from this file instead of stdin
        #[arg(long, value_name = "PAYLOAD")]
        from: Option<PathBuf>,
        #[command(flatten)]
        save: SaveOpts,
    },

    /// Check that a preference file decodes cleanly
    Validate {
        /// Preference file to check
        file: PathBuf,
    },
}

/// Flags shared by every command that runs the save protocol.
#[derive(Args, Debug, Default)]
pub struct SaveOpts {
    /// Process name to terminate after the save so it re-reads the file.
    /// Defaults to the owner inferred from a .../<owner>/shared_prefs/
    /// path when kill-on-save is enabled.
    #[arg(long = "kill", value_name = "PROCESS")]
    pub kill: Option<String>,

    /// Never terminate a process after the save
    #[arg(long = "no-kill", conflicts_with = "kill")]
    pub no_kill: bool,

    /// Copy the current file content to <file>.bak before replacing it
    #[arg(long)]
    pub backup: bool,
}
