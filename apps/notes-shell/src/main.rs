//! notes-shell — terminal front end for Universe Notes.
//!
//! Renders the planet list and drives the creation form through a small set
//! of line commands. Storage is SQLite (default) or in-memory; the image
//! picker browses `IMAGE_DIR`.
//!
//! Run:
//! ```bash
//! IMAGE_DIR=~/Pictures cargo run -p notes-shell
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;
mod picker;

use std::io::{self, Write};
use std::process;

use domain::adapters::memory_kv::InMemoryKv;
use domain::ids::TimestampIdGenerator;
use domain::screen::PlanetScreen;
use domain::store::{LoadOutcome, PlanetListStore};
use domain::{CoreError, KeyValueStore, PlanetId, SystemClock};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::picker::DirectoryPicker;

// Storage backend chosen at startup (sqlite is feature-gated).
enum AnyKv {
    Memory(InMemoryKv),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteKv),
}

impl KeyValueStore for AnyKv {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match self {
            AnyKv::Memory(kv) => kv.get(key),
            #[cfg(feature = "sqlite")]
            AnyKv::Sqlite(kv) => kv.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        match self {
            AnyKv::Memory(kv) => kv.set(key, value),
            #[cfg(feature = "sqlite")]
            AnyKv::Sqlite(kv) => kv.set(key, value),
        }
    }
}

type Screen = PlanetScreen<AnyKv, TimestampIdGenerator<SystemClock>, DirectoryPicker>;

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

// Construct a storage backend based on config and feature flags.
fn build_storage(cfg: &config::Config) -> AnyKv {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => match sqlite_adapter::SqliteKv::new(&cfg.db_path) {
            Ok(kv) => AnyKv::Sqlite(kv),
            Err(e) => {
                error!(error = %e, path = %cfg.db_path.display(), "failed to open sqlite store, using memory");
                AnyKv::Memory(InMemoryKv::new())
            }
        },
        _ => AnyKv::Memory(InMemoryKv::new()),
    }
}

fn print_help() {
    println!(
        "Commands:\n  \
         list              show planets\n  \
         new               open the new-planet form\n  \
         title <text>      set the form title\n  \
         pick              choose an image for the form\n  \
         save              add the planet from the form\n  \
         cancel            discard the form\n  \
         delete <id>       remove a planet\n  \
         help              this text\n  \
         quit              leave"
    );
}

fn render(screen: &mut Screen) {
    for notice in screen.take_notices() {
        println!("! {}: {}", notice.heading, notice.body);
    }

    println!("== Planets ==");
    if screen.planets().is_empty() {
        println!("  (no planets yet)");
    }
    for p in screen.planets() {
        match &p.image {
            Some(img) => println!("  [{}] {}  ({})", p.id, p.title, img),
            None => println!("  [{}] {}", p.id, p.title),
        }
    }

    let form = screen.form();
    if form.is_open() {
        let image = form.staged_image().map(|i| i.as_str()).unwrap_or("none");
        println!("-- New Planet: title={:?} image={}", form.title(), image);
    }
}

enum Flow {
    Continue,
    Quit,
}

fn handle(screen: &mut Screen, line: &str) -> Flow {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    match cmd {
        "" => {}
        "list" | "ls" => {}
        "new" | "add" => screen.open_form(),
        "title" => {
            if !screen.form().is_open() {
                screen.open_form();
            }
            screen.set_title(rest);
        }
        "pick" => {
            if !screen.form().is_open() {
                screen.open_form();
            }
            screen.request_image_selection();
        }
        "save" => match screen.save() {
            Ok(Some(p)) => println!("added {} ({})", p.title, p.id),
            Ok(None) => {}
            Err(e) => eprintln!("error: {}", e),
        },
        "cancel" => screen.cancel(),
        "delete" | "rm" => match PlanetId::new(rest) {
            Ok(id) => match screen.delete(&id) {
                Ok(true) => println!("deleted {}", id),
                Ok(false) => println!("no planet with id {}", id),
                Err(e) => eprintln!("error: {}", e),
            },
            Err(_) => eprintln!("usage: delete <id>"),
        },
        "help" | "?" => {
            print_help();
            return Flow::Continue;
        }
        "quit" | "exit" | "q" => return Flow::Quit,
        other => {
            eprintln!("unknown command: {} (try 'help')", other);
            return Flow::Continue;
        }
    }
    render(screen);
    Flow::Continue
}

fn run() -> Result<(), String> {
    let cfg = config::Config::from_env().map_err(|e| e.to_string())?;
    init_tracing(&cfg);
    cfg.warn_if_volatile();

    let store = PlanetListStore::new(build_storage(&cfg), TimestampIdGenerator::new(SystemClock))
        .with_policy(cfg.persist_policy);
    let mut screen = PlanetScreen::new(store, DirectoryPicker::new(&cfg.image_dir));

    println!("Universe Notes v{}", env!("CARGO_PKG_VERSION"));
    match screen.start() {
        Some(LoadOutcome::Loaded { count, skipped }) => info!(count, skipped, "planets loaded"),
        Some(LoadOutcome::Recovered { reason }) => info!(%reason, "started with an empty list"),
        _ => {}
    }
    render(&mut screen);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;
        let mut line = String::new();
        // Read one line at a time: the picker reads stdin too.
        let n = stdin.read_line(&mut line).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        if let Flow::Quit = handle(&mut screen, &line) {
            break;
        }
    }

    if let Err(e) = screen.flush() {
        error!(error = %e, "final save failed");
    }
    Ok(())
}

fn main() {
    if let Err(msg) = run() {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
