use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bufctl::printer::format_report;
use bufctl::workload::{init_pages, peek, scan, touch};
use storage::BufferConfig;

#[derive(Parser, Debug)]
#[command(name = "bufctl", about = "Drive the page buffer cache over a page file")]
struct Args {
    #[arg(long, value_name = "PATH", default_value = "pages.db")]
    db: PathBuf,

    /// Number of frames in the buffer pool.
    #[arg(long, default_value_t = BufferConfig::default().num_frames)]
    frames: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append stamped pages to the file.
    Init {
        #[arg(long, default_value_t = 16)]
        pages: u32,
    },
    /// Read every page through the cache and report hit/miss counters.
    Scan {
        #[arg(long, default_value_t = 1)]
        passes: u32,
    },
    /// Write text into a page through the cache.
    Touch {
        #[arg(long)]
        page: u32,
        #[arg(long)]
        text: String,
    },
    /// Print text previously stored with `touch`, bypassing the cache.
    Peek {
        #[arg(long)]
        page: u32,
        #[arg(long, default_value_t = 32)]
        len: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if let Some(parent) = args.db.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("create db directory")?;
    }

    match args.command {
        Command::Init { pages } => {
            let allocated = init_pages(&args.db, args.frames, pages)?;
            if let (Some(first), Some(last)) = (allocated.first(), allocated.last()) {
                println!("allocated pages {first}..={last} in {}", args.db.display());
            }
        }
        Command::Scan { passes } => {
            let report = scan(&args.db, args.frames, passes)?;
            println!("{}", format_report(&report));
        }
        Command::Touch { page, text } => {
            touch(&args.db, args.frames, page, &text)?;
            println!("wrote {} bytes to page {page}", text.len());
        }
        Command::Peek { page, len } => {
            println!("{}", peek(&args.db, page, len)?);
        }
    }
    Ok(())
}
