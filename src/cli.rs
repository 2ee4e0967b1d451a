use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tome", version, about = "Scan a device for FictionBook e-books and catalogue them")]
pub struct Cli {
    /// Configuration file layered over the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report what would change without writing to the catalogue.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the configured roots and ingest any new books
    Scan,
    /// List every catalogued book
    List,
    /// Show everything known about one book
    Show { id: i64 },
    /// List other books in the same series
    Related { id: i64 },
    /// Mark a book as a favourite
    Favourite {
        id: i64,
        /// Remove the mark instead
        #[arg(long)]
        unset: bool,
    },
    /// Forget a book (the file on the device is left alone)
    Delete { id: i64 },
}
