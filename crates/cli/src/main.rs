mod settings;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use face_ledger_core::ledger::domain::face::PersonGuess;
use face_ledger_core::ledger::domain::ledger_error::LedgerError;
use face_ledger_core::ledger::domain::person::ScoredFace;
use face_ledger_core::ledger::face_database::{FaceDatabase, LedgerConfig};
use face_ledger_core::recognition::infrastructure::recorded_backend::RecordedBackend;

use settings::Settings;

/// Confirm and guess face identities against recorded recognition results.
#[derive(Parser)]
#[command(name = "face-ledger")]
struct Cli {
    /// JSON recording of recognition service responses.
    #[arg(long)]
    recording: PathBuf,

    /// Collection id (defaults to the saved setting).
    #[arg(long)]
    collection: Option<String>,

    /// Bucket holding the images (defaults to the saved setting).
    #[arg(long)]
    bucket: Option<String>,

    /// Create the collection before doing anything else.
    #[arg(long)]
    create: bool,

    /// Register and index an image (repeatable).
    #[arg(long)]
    image: Vec<String>,

    /// Confirm a face as a person: FACE_ID=NAME (repeatable).
    #[arg(long)]
    confirm: Vec<String>,

    /// Print ranked faces for a person (repeatable).
    #[arg(long)]
    guess: Vec<String>,

    /// Print who a face might be (repeatable).
    #[arg(long)]
    who: Vec<String>,

    /// Print all known face ids.
    #[arg(long)]
    list_faces: bool,

    /// Re-list the collection and re-run searches instead of using caches.
    #[arg(long)]
    refresh: bool,

    /// Only print confirmed faces for --guess.
    #[arg(long)]
    no_guess: bool,

    /// Store --collection and --bucket as the new defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let confirmations = cli
        .confirm
        .iter()
        .map(|arg| parse_confirmation(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let settings = resolve_settings(&cli);
    if cli.save_settings {
        settings.save();
    }

    let backend = RecordedBackend::open(&cli.recording)?;
    let mut db = FaceDatabase::new(
        Box::new(backend),
        LedgerConfig {
            collection_id: settings.collection_id,
            bucket: settings.bucket,
            create_collection: cli.create,
        },
    )?;

    for url in &cli.image {
        let face_ids = register_image(&mut db, url)?;
        println!("{url}: {}", face_ids.join(", "));
    }

    for (face_id, name) in &confirmations {
        db.get_person(name, true)?;
        db.confirm(face_id, name)?;
    }

    if cli.list_faces {
        for face_id in db.list_faces(cli.refresh)? {
            println!("{face_id}");
        }
    }

    for name in &cli.guess {
        let ranked = db.person_faces(name, !cli.no_guess, cli.refresh)?;
        print!("{}", format_ranked(name, &ranked));
    }

    for face_id in &cli.who {
        let guesses = db.face_person(face_id)?;
        print!("{}", format_guesses(face_id, &guesses));
    }

    log::info!(
        "Session on {}: {} images, {} persons",
        db.collection_id(),
        db.list_images().len(),
        db.list_persons().len()
    );
    Ok(())
}

fn resolve_settings(cli: &Cli) -> Settings {
    let mut settings = Settings::load();
    if let Some(collection) = &cli.collection {
        settings.collection_id = collection.clone();
    }
    if let Some(bucket) = &cli.bucket {
        settings.bucket = bucket.clone();
    }
    settings
}

fn parse_confirmation(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((face_id, name)) if !face_id.trim().is_empty() && !name.trim().is_empty() => {
            Ok((face_id.trim().to_string(), name.trim().to_string()))
        }
        _ => Err(format!("--confirm expects FACE_ID=NAME, got '{arg}'")),
    }
}

fn format_ranked(name: &str, ranked: &[ScoredFace]) -> String {
    let mut out = format!("{name}:\n");
    if ranked.is_empty() {
        out.push_str("  (no faces)\n");
    }
    for face in ranked {
        out.push_str(&format!("  {:5.1}%  {}\n", face.score * 100.0, face.face_id));
    }
    out
}

fn format_guesses(face_id: &str, guesses: &[PersonGuess]) -> String {
    let mut out = format!("{face_id}:\n");
    if guesses.is_empty() {
        out.push_str("  (unknown)\n");
    }
    for guess in guesses {
        out.push_str(&format!("  {:5.1}%  {}\n", guess.score * 100.0, guess.name));
    }
    out
}

/// Registers `url` with detection, or indexes it in place if an earlier
/// response already mentioned it.
fn register_image(db: &mut FaceDatabase, url: &str) -> Result<Vec<String>, LedgerError> {
    if db.image(url).is_none() {
        db.add_image(url, true)?;
    }
    Ok(db.image_faces(url)?.to_vec())
}
