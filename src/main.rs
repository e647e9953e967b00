use clap::{Parser, Subcommand};
use pagestore::storage::{self, PAGE_SIZE, PageFile, StorageResult};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pagestore", about = "Inspect and manage fixed-size page files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new one-page file (truncates an existing file)
    Create { file: String },
    /// Delete a page file
    Destroy { file: String },
    /// Show page count and byte length of a page file
    Info { file: String },
    /// Grow a file to at least the given number of pages
    Grow { file: String, pages: usize },
    /// Hex-dump one page
    Dump { file: String, page: usize },
}

fn main() -> ExitCode {
    storage::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> StorageResult<()> {
    match command {
        Command::Create { file } => {
            PageFile::create(&file)?;
            println!("created {file} with 1 page ({PAGE_SIZE} bytes)");
        }
        Command::Destroy { file } => {
            PageFile::destroy(&file)?;
            println!("removed {file}");
        }
        Command::Info { file } => {
            let mut handle = PageFile::open(&file)?;
            println!("file:       {}", handle.file_name());
            println!("page size:  {PAGE_SIZE} bytes");
            println!("pages:      {}", handle.total_num_pages);
            println!(
                "bytes:      {}",
                handle.total_num_pages as u64 * PAGE_SIZE as u64
            );
            handle.close()?;
        }
        Command::Grow { file, pages } => {
            let mut handle = PageFile::open(&file)?;
            let before = handle.total_num_pages;
            handle.ensure_capacity(pages)?;
            println!("{file}: {before} -> {} pages", handle.total_num_pages);
            handle.close()?;
        }
        Command::Dump { file, page } => {
            let mut handle = PageFile::open(&file)?;
            let mut buf = vec![0u8; PAGE_SIZE];
            handle.read_block(page, &mut buf)?;
            handle.close()?;
            dump_page(page, &buf);
        }
    }
    Ok(())
}

fn dump_page(page: usize, buf: &[u8]) {
    for (row, chunk) in buf.chunks(16).enumerate() {
        let offset = page * PAGE_SIZE + row * 16;
        print!("{offset:08x} ");
        for b in chunk {
            print!(" {b:02x}");
        }
        println!();
    }
}
