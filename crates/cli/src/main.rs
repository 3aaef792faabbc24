use clap::{Parser, Subcommand};
use filedock_core::config::{max_file_size_from_env_value, upload_dir_from_env_value};
use filedock_core::{
    BatchOutcome, CatalogService, CoreConfig, FileDescriptor, FileListing, UploadService,
    UploadStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "filedock")]
#[command(about = "filedock batch file ingestion CLI")]
struct Cli {
    /// Upload directory (defaults to ./uploads)
    #[arg(long, global = true, env = "UPLOAD_PATH")]
    upload_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every file directly inside a folder
    Upload {
        /// Source folder
        folder: PathBuf,
        /// Store a file under a different name (repeatable)
        #[arg(long = "rename", value_name = "OLD=NEW", value_parser = parse_rename)]
        renames: Vec<(String, String)>,
    },
    /// Show the files a folder upload would submit
    ListFolder {
        /// Source folder
        folder: PathBuf,
    },
    /// Count and size the stored files
    Stats,
    /// List every stored file
    List,
    /// Search stored files by name
    Search {
        /// Case-insensitive name fragment
        term: String,
    },
    /// Delete a stored file
    Delete {
        /// Stored file name
        name: String,
    },
}

fn parse_rename(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((old, new)) if !old.is_empty() && !new.trim().is_empty() => {
            Ok((old.to_string(), new.to_string()))
        }
        _ => Err(format!("expected OLD=NEW, got '{}'", value)),
    }
}

fn apply_renames(files: Vec<FileDescriptor>, renames: &[(String, String)]) -> Vec<FileDescriptor> {
    files
        .into_iter()
        .map(|file| {
            match renames.iter().find(|(old, _)| old == file.original_name()) {
                Some((_, new)) => file.with_new_name(new.clone()),
                None => file,
            }
        })
        .collect()
}

fn print_outcome(outcome: &BatchOutcome) {
    for result in &outcome.results {
        match result.status() {
            UploadStatus::Done => println!(
                "[{}] {} -> {}",
                result.status(),
                result.original_name(),
                result
                    .final_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| result.new_name().to_string())
            ),
            _ => println!(
                "[{}] {}: {}",
                result.status(),
                result.original_name(),
                result.error().unwrap_or_default()
            ),
        }
    }

    let summary = &outcome.summary;
    println!(
        "Total: {}, Done: {}, Failed: {}, Duplicate: {}, Pending: {}",
        summary.total, summary.done, summary.failed, summary.duplicate, summary.pending
    );
}

fn print_listing(listing: &FileListing) {
    if listing.files.is_empty() {
        println!("No files found.");
        return;
    }
    for file in &listing.files {
        println!(
            "{}  {} bytes  {}  id: {}",
            file.relative_path, file.size, file.media_type, file.id
        );
    }
    println!("{} files, {} bytes", listing.total_files, listing.total_size);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filedock=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let upload_dir = upload_dir_from_env_value(cli.upload_dir, &std::env::current_dir()?);
    let max_file_size = max_file_size_from_env_value(std::env::var("MAX_FILE_SIZE").ok())?;
    let cfg = Arc::new(CoreConfig::new(upload_dir, max_file_size)?);

    match cli.command {
        Some(Commands::Upload { folder, renames }) => {
            let service = UploadService::new(cfg);
            let listing = service.list_folder(&folder)?;
            if listing.files.is_empty() {
                println!("No files found in {}", folder.display());
                return Ok(());
            }
            let outcome = service.ingest(apply_renames(listing.files, &renames))?;
            print_outcome(&outcome);
        }
        Some(Commands::ListFolder { folder }) => {
            let listing = UploadService::new(cfg).list_folder(&folder)?;
            for file in &listing.files {
                println!(
                    "{}  {} bytes  {}",
                    file.original_name(),
                    file.size(),
                    file.media_type().unwrap_or_default()
                );
            }
            println!("{} files, {} bytes", listing.total_files, listing.total_size);
        }
        Some(Commands::Stats) => match UploadService::new(cfg).stats() {
            Ok(stats) => {
                for file in &stats.files {
                    println!("{}  {} bytes", file.name, file.size);
                }
                println!("{} files, {} bytes", stats.total_files, stats.total_size);
            }
            Err(e) => eprintln!("Error reading upload statistics: {}", e),
        },
        Some(Commands::List) => print_listing(&CatalogService::new(cfg).list_all()?),
        Some(Commands::Search { term }) => {
            print_listing(&CatalogService::new(cfg).search(&term)?)
        }
        Some(Commands::Delete { name }) => match CatalogService::new(cfg).delete_by_name(&name) {
            Ok(()) => println!("Deleted {}", name),
            Err(e) => eprintln!("Error deleting {}: {}", name, e),
        },
        None => {
            println!("Use 'filedock --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_rename() {
        assert_eq!(
            parse_rename("a.txt=b.txt").unwrap(),
            ("a.txt".to_string(), "b.txt".to_string())
        );
        assert!(parse_rename("a.txt").is_err());
        assert!(parse_rename("=b.txt").is_err());
        assert!(parse_rename("a.txt= ").is_err());
    }

    #[test]
    fn test_apply_renames_matches_original_name() {
        let files = vec![
            FileDescriptor::from_path("1", "a.txt", "/in/a.txt"),
            FileDescriptor::from_path("2", "b.txt", "/in/b.txt"),
        ];

        let renamed = apply_renames(files, &[("b.txt".into(), "report".into())]);

        assert_eq!(renamed[0].new_name(), None);
        assert_eq!(renamed[1].new_name(), Some("report"));
    }

    #[test]
    fn test_upload_into_unusable_destination_is_an_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a.txt"), "alpha").unwrap();
        let blocker = temp.path().join("uploads");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let cli = Cli::parse_from([
            "filedock".into(),
            "upload".into(),
            source.into_os_string(),
            "--upload-dir".into(),
            blocker.into_os_string(),
        ]);

        assert!(run(cli).is_err());
    }

    #[test]
    fn test_cli_parses_global_upload_dir() {
        let cli = Cli::parse_from(["filedock", "search", "report", "--upload-dir", "/srv/files"]);
        assert_eq!(cli.upload_dir.as_deref(), Some("/srv/files"));
        assert!(matches!(cli.command, Some(Commands::Search { term }) if term == "report"));
    }
}
