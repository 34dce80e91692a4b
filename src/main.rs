use std::env;
use std::path::PathBuf;
use tracing::{error, info};

use memfetch::library::{LibraryError, LibraryState};
use memfetch::{Config, LibraryEvent, LibraryHandle, LibraryService, MediaClient};

enum Command {
    Import(PathBuf),
    Download,
    List,
    Status,
}

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map(String::as_str).unwrap_or("memfetch");

    let command = match parse_command(args.get(1..).unwrap_or(&[])) {
        Ok(command) => command,
        Err(message) => {
            error!("{}", message);
            print_usage(program_name);
            std::process::exit(1);
        }
    };

    let config = Config::load();
    let library = LibraryService::start(
        tokio::runtime::Handle::current(),
        config,
        MediaClient::http(),
    );

    let result = match command {
        Command::Import(path) => run_import(&library, path).await,
        Command::Download => run_download(&library).await,
        Command::List => run_list(&library).await,
        Command::Status => run_status(&library).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    match args {
        [command, path] if command == "import" => Ok(Command::Import(PathBuf::from(path))),
        [command] if command == "import" => Err("import requires a file path".to_string()),
        [command] if command == "download" => Ok(Command::Download),
        [command] if command == "list" => Ok(Command::List),
        [command] if command == "status" => Ok(Command::Status),
        [] => Err("No command specified".to_string()),
        [command, ..] => Err(format!("Unknown arguments starting at: {}", command)),
    }
}

async fn run_import(library: &LibraryHandle, path: PathBuf) -> Result<(), LibraryError> {
    if !path.exists() {
        error!("Export file not found: {}", path.display());
        std::process::exit(1);
    }

    info!("Importing {}", path.display());
    library.load_json_file(path).await?;
    library.flush().await?;

    let state = library.snapshot().await?;
    println!("{}", state.status_message);
    Ok(())
}

async fn run_download(library: &LibraryHandle) -> Result<(), LibraryError> {
    let mut events = library.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                LibraryEvent::Progress(progress) => {
                    println!(
                        "[{}/{}] {:.0}%",
                        progress.completed,
                        progress.total,
                        progress.fraction() * 100.0
                    );
                }
                LibraryEvent::DownloadComplete(_) => break,
                _ => {}
            }
        }
    });

    let summary = library.download_and_wait().await?;
    let _ = printer.await;

    let state = library.snapshot().await?;
    println!("{}", state.status_message);
    println!(
        "  {} downloaded, {} already present, {} failed",
        summary.downloaded, summary.already_present, summary.failed
    );
    Ok(())
}

async fn run_list(library: &LibraryHandle) -> Result<(), LibraryError> {
    let state = library.snapshot().await?;
    print_sections(&state);
    Ok(())
}

async fn run_status(library: &LibraryHandle) -> Result<(), LibraryError> {
    let state = library.snapshot().await?;
    let videos = state.all_memories.iter().filter(|m| m.is_video()).count();

    println!("{}", state.status_message);
    println!(
        "  {} memories ({} videos, {} images)",
        state.all_memories.len(),
        videos,
        state.all_memories.len() - videos
    );
    println!("  {} downloaded", state.downloaded_files.len());
    Ok(())
}

fn print_sections(state: &LibraryState) {
    if state.sections.is_empty() {
        println!("{}", state.status_message);
        return;
    }

    for year in &state.sections {
        println!("{} ({})", year.year, year.memory_count());
        for month in &year.months {
            println!("  {} ({})", month.month, month.memories.len());
            for memory in &month.memories {
                let mark = if state.downloaded_files.contains(memory.key()) {
                    "x"
                } else {
                    " "
                };
                println!("    [{}] {} {}", mark, memory.date, memory.kind().extension());
            }
        }
    }
}

fn print_usage(program_name: &str) {
    eprintln!("Usage:");
    eprintln!("  {} import <export.json>", program_name);
    eprintln!("  {} download", program_name);
    eprintln!("  {} list", program_name);
    eprintln!("  {} status", program_name);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MEMFETCH_STORAGE_PATH   where the state file and media are kept");
    eprintln!("  MEMFETCH_MAX_DOWNLOADS  concurrent downloads (default 5)");
}
