//! CLI entry point for `maildepot`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};

use maildepot::config;
use maildepot::ingest::{self, ImapSource, IngestionSource, MockSource};
use maildepot::model::Message;
use maildepot::store::{FileStore, MessageStore};

#[derive(Parser)]
#[command(name = "maildepot", version, about = "Local folder-organized mailbox store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mailbox storage root (defaults to the configured directory)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List folders
    Folders,
    /// List messages in a folder, newest first
    List {
        #[arg(default_value = "INBOX")]
        folder: String,
        /// Show at most this many messages
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Search messages in a folder
    Search {
        query: String,
        #[arg(default_value = "INBOX")]
        folder: String,
    },
    /// Create a new folder
    NewFolder {
        name: String,
    },
    /// Move a message between folders
    Move {
        id: String,
        source: String,
        target: String,
    },
    /// Delete a message (soft-deletes into Trash; permanent from Trash)
    Delete {
        id: String,
        #[arg(default_value = "INBOX")]
        folder: String,
    },
    /// Generate synthetic test messages
    Mock {
        #[arg(default_value = "INBOX")]
        folder: String,
        #[arg(short, long, default_value_t = 5)]
        count: usize,
    },
    /// Import messages from a JSON array file
    Import {
        file: PathBuf,
        #[arg(default_value = "INBOX")]
        folder: String,
    },
    /// Fetch recent messages from an IMAP server
    Fetch {
        #[arg(default_value = "INBOX")]
        folder: String,
        /// Fetch at most this many of the newest messages
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Server hostname (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,
        /// Account name (defaults to the configured username)
        #[arg(long)]
        username: Option<String>,
        /// Account password
        #[arg(long, env = "MAILDEPOT_IMAP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level);

    // Commands that never touch the store
    match &cli.command {
        Commands::Completions { shell } => return cmd_completions(*shell),
        Commands::Manpage => return cmd_manpage(),
        _ => {}
    }

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config::data_dir(&config));
    let mut store = FileStore::open(&data_dir)?;

    match cli.command {
        Commands::Folders => cmd_folders(&store),
        Commands::List { folder, limit } => cmd_list(&store, &folder, limit),
        Commands::Search { query, folder } => cmd_search(&store, &query, &folder),
        Commands::NewFolder { name } => cmd_new_folder(&mut store, &name),
        Commands::Move { id, source, target } => cmd_move(&mut store, &id, &source, &target),
        Commands::Delete { id, folder } => cmd_delete(&mut store, &id, &folder),
        Commands::Mock { folder, count } => cmd_mock(&mut store, &folder, count),
        Commands::Import { file, folder } => cmd_import(&mut store, &file, &folder),
        Commands::Fetch {
            folder,
            limit,
            host,
            username,
            password,
        } => {
            let host = host.unwrap_or_else(|| config.imap.host.clone());
            let username = username.unwrap_or_else(|| config.imap.username.clone());
            cmd_fetch(&mut store, &folder, limit, &host, config.imap.port, &username, &password)
        }
        Commands::Completions { .. } | Commands::Manpage => unreachable!("handled above"),
    }
}

/// Set up tracing with stderr output.
fn setup_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_folders(store: &FileStore) -> anyhow::Result<()> {
    for folder in store.folders() {
        println!("{folder}");
    }
    Ok(())
}

fn cmd_list(store: &FileStore, folder: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let messages = store.list(folder, limit)?;
    if messages.is_empty() {
        println!("No messages in '{folder}'");
        return Ok(());
    }
    for message in &messages {
        print_message(message);
    }
    println!("{} message(s)", messages.len());
    Ok(())
}

fn cmd_search(store: &FileStore, query: &str, folder: &str) -> anyhow::Result<()> {
    let matches = store.search(query, folder)?;
    if matches.is_empty() {
        println!("No matches for '{query}' in '{folder}'");
        return Ok(());
    }
    for message in &matches {
        print_message(message);
    }
    println!("{} match(es)", matches.len());
    Ok(())
}

fn cmd_new_folder(store: &mut FileStore, name: &str) -> anyhow::Result<()> {
    store.create_folder(name)?;
    println!("Created folder '{name}'");
    Ok(())
}

fn cmd_move(store: &mut FileStore, id: &str, source: &str, target: &str) -> anyhow::Result<()> {
    if store.move_message(id, source, target)? {
        println!("Moved '{id}' from '{source}' to '{target}'");
    } else {
        println!("No message '{id}' in '{source}'");
    }
    Ok(())
}

fn cmd_delete(store: &mut FileStore, id: &str, folder: &str) -> anyhow::Result<()> {
    if store.delete(id, folder)? {
        if folder == maildepot::store::TRASH_FOLDER {
            println!("Permanently deleted '{id}'");
        } else {
            println!("Moved '{id}' to Trash");
        }
    } else {
        println!("No message '{id}' in '{folder}'");
    }
    Ok(())
}

fn cmd_mock(store: &mut FileStore, folder: &str, count: usize) -> anyhow::Result<()> {
    let stored = MockSource::new().fetch(store, folder, count)?;
    println!("Generated {} message(s) into '{folder}'", stored.len());
    Ok(())
}

fn cmd_import(store: &mut FileStore, file: &Path, folder: &str) -> anyhow::Result<()> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} messages")
            .expect("static progress template"),
    );
    let progress = |done: usize, total: usize| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    };

    let imported = ingest::import::import_json(file, store, folder, Some(&progress))?;
    bar.finish_and_clear();
    println!(
        "Imported {} message(s) from {} into '{folder}'",
        imported.len(),
        file.display()
    );
    Ok(())
}

fn cmd_fetch(
    store: &mut FileStore,
    folder: &str,
    limit: usize,
    host: &str,
    port: u16,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    if host.is_empty() || username.is_empty() {
        anyhow::bail!("no IMAP host/username configured; pass --host/--username or set them in the config file");
    }

    let mut source = ImapSource::new(host, port, username, password);
    let stored = source.fetch(store, folder, limit)?;
    println!("Fetched {} message(s) into '{folder}'", stored.len());
    Ok(())
}

fn print_message(message: &Message) {
    let read_marker = if message.is_read { ' ' } else { '*' };
    println!(
        "{read_marker} {}  {:<30}  {}  [{}]",
        message.date, message.sender, message.subject, message.id
    );
    for attachment in &message.attachments {
        println!(
            "    {} ({}, {})",
            attachment.filename(),
            attachment.content_type(),
            format_size(attachment.size(), DECIMAL)
        );
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "maildepot", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
