//! MoMem CLI
//!
//! Command-line interface for managing databases, collections and records.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use momem::catalog::Catalog;
use momem::codec::{self, OffsetIndex, Value, RECORD_FIELDS};
use momem::storage::FileStore;
use momem::{Config, RandomIds, Record, RecordStore, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// MoMem CLI
#[derive(Parser, Debug)]
#[command(name = "momem")]
#[command(about = "Flat-file record store")]
#[command(version)]
struct Args {
    /// Root directory holding every database
    #[arg(short, long, default_value = "./momem_data")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage databases
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Manage collections
    Col {
        #[command(subcommand)]
        action: ColAction,
    },

    /// Store a file as a record and print its id
    Put {
        database: String,
        collection: String,
        /// File to store
        file: PathBuf,

        /// Description of the file
        #[arg(short, long, default_value = "")]
        desc: String,

        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Note as key=value (repeatable)
        #[arg(short, long = "note")]
        notes: Vec<String>,
    },

    /// Print a record's metadata, optionally writing its payload to a file
    Get {
        database: String,
        collection: String,
        id: String,

        /// Write the payload here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List record ids in a collection
    List { database: String, collection: String },

    /// Delete a record
    Delete {
        database: String,
        collection: String,
        id: String,
    },

    /// Print the header and field offsets of an encoded record file
    Inspect { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Create { name: String },
    List,
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum ColAction {
    Create { database: String, name: String },
    List { database: String },
    Delete { database: String, name: String },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,momem=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::builder().root_dir(&args.root).build();

    if let Err(e) = run(&config, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config, command: Commands) -> Result<()> {
    // Inspect reads a bare file and never touches the catalog
    let open_catalog = || Catalog::open(config);

    match command {
        Commands::Inspect { path } => inspect(&path)?,
        Commands::Db { action } => {
            let catalog = open_catalog()?;
            match action {
                DbAction::Create { name } => {
                    catalog.create_database(&name)?;
                }
                DbAction::List => {
                    for name in catalog.list_databases()? {
                        println!("{}", name);
                    }
                }
                DbAction::Delete { name } => catalog.delete_database(&name)?,
            }
        }
        Commands::Col { action } => {
            let catalog = open_catalog()?;
            match action {
                ColAction::Create { database, name } => {
                    catalog.database(&database)?.create_collection(&name)?;
                }
                ColAction::List { database } => {
                    for name in catalog.database(&database)?.list_collections()? {
                        println!("{}", name);
                    }
                }
                ColAction::Delete { database, name } => {
                    catalog.database(&database)?.collection(&name)?.delete()?;
                }
            }
        }
        Commands::Put {
            database,
            collection,
            file,
            desc,
            tags,
            notes,
        } => {
            let mut store = open_store(&open_catalog()?, config, &database, &collection)?;

            let data = fs::read(&file)?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let mut record = Record::from_file(name, data).with_description(desc);
            for tag in tags {
                record = record.with_tag(tag);
            }
            for note in notes {
                let (key, value) = note.split_once('=').unwrap_or((note.as_str(), ""));
                record = record.with_note(key, value);
            }

            println!("{}", store.save(&record)?);
        }
        Commands::Get {
            database,
            collection,
            id,
            out,
        } => {
            let store = open_store(&open_catalog()?, config, &database, &collection)?;
            let record = store.load(&id)?;

            println!("name:        {}", record.name);
            println!("type:        {}", record.file_type);
            println!("size:        {}", record.size);
            println!("modified:    {}", record.modified);
            println!("description: {}", record.description);
            println!("tags:        {}", record.tags.join(", "));
            for (key, value) in record.notes.iter() {
                println!("note:        {} = {}", summarize(key), summarize(value));
            }

            if let Some(out) = out {
                fs::write(&out, &record.data)?;
                println!("payload written to {}", out.display());
            }
        }
        Commands::List {
            database,
            collection,
        } => {
            let store = open_store(&open_catalog()?, config, &database, &collection)?;
            for id in store.ids()? {
                println!("{}", id);
            }
        }
        Commands::Delete {
            database,
            collection,
            id,
        } => {
            open_store(&open_catalog()?, config, &database, &collection)?.remove(&id)?;
        }
    }

    Ok(())
}

fn open_store(
    catalog: &Catalog,
    config: &Config,
    database: &str,
    collection: &str,
) -> Result<RecordStore<FileStore, RandomIds>> {
    let storage = catalog.database(database)?.collection(collection)?.store()?;
    Ok(RecordStore::new(
        storage,
        RandomIds::from_config(config),
        config.max_id_attempts,
    ))
}

/// Walk a record through its offset index without a full decode
fn inspect(path: &Path) -> Result<()> {
    let buf = fs::read(path)?;
    let index = OffsetIndex::of_record(&buf)?;

    println!("total length: {} bytes", buf.len());
    println!("field list:   {} fields at byte {}", index.len(), index.list_position());

    for (i, (name, _)) in RECORD_FIELDS.iter().enumerate() {
        let offset = index.get(i).unwrap_or_default();
        let value = codec::seek(&buf, &index, i)?;
        println!("  [{}] {:<12} @ {:>8}  {}", i, name, offset, summarize(&value));
    }
    Ok(())
}

fn summarize(value: &Value) -> String {
    match value {
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Timestamp(t) => format!("{} (posix)", t),
        Value::String(s) => format!("{:?}", s),
        Value::Bytes(b) => format!("<{} bytes>", b.len()),
        Value::List(items) => format!("[{} items]", items.len()),
        Value::Dict(d) => format!("{{{} entries}}", d.len()),
        Value::Record(fields) => format!("record({} fields)", fields.len()),
    }
}
