use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use storage::repository::Storage;
use tracker_core::model::{
    BookDraft, BookId, Genre, GoalDraft, GoalType, SessionDraft, UserId, UserProfile,
};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    books: u32,
    days: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidBooks { raw: String },
    InvalidDays { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => {
                write!(f, "invalid --user value (expected UUID): {raw}")
            }
            ArgsError::InvalidBooks { raw } => write!(f, "invalid --books value: {raw}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TRACKER_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = std::env::var("TRACKER_USER_ID")
            .ok()
            .and_then(|value| value.parse::<Uuid>().ok())
            .map_or_else(|| UserId::new(Uuid::from_u128(1)), UserId::new);
        let mut books = std::env::var("TRACKER_BOOKS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut days = std::env::var("TRACKER_DAYS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(14);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    let parsed: Uuid = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    user_id = UserId::new(parsed);
                }
                "--books" => {
                    let value = require_value(&mut args, "--books")?;
                    books = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidBooks { raw: value.clone() })?;
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            books,
            days,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --user <uuid>             Owner of the seeded shelf");
    eprintln!("  --books <n>               Number of sample books (default: 3)");
    eprintln!("  --days <n>                Spread sessions over the last n days (default: 14)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TRACKER_DB_URL, TRACKER_USER_ID, TRACKER_BOOKS, TRACKER_DAYS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let profile = UserProfile::new(args.user_id, false, "Seeded demo shelf", None, now)?;
    storage.profiles.upsert_profile(&profile).await?;

    let samples = [
        ("Dune", "Frank Herbert", 412_u32, Genre::SciFiFantasy),
        ("The Name of the Rose", "Umberto Eco", 512, Genre::Mystery),
        ("Meditations", "Marcus Aurelius", 254, Genre::Philosophy),
        ("Project Hail Mary", "Andy Weir", 476, Genre::SciFiFantasy),
        ("The Power Broker", "Robert Caro", 1246, Genre::BiographyMemoir),
    ];

    let mut book_ids: Vec<BookId> = Vec::new();
    for i in 0..args.books {
        let (title, author, pages, genre) = samples[(i as usize) % samples.len()];
        let validated =
            BookDraft::new(args.user_id, title, author, pages, genre).validate(now)?;
        book_ids.push(storage.books.insert_book(&validated).await?);
    }

    let mut sessions = 0_u32;
    for day in 0..args.days {
        // Skip every third day so the seeded heatmap has gaps to show.
        if day % 3 == 2 || book_ids.is_empty() {
            continue;
        }
        let book_id = book_ids[(day as usize) % book_ids.len()];
        let start = now - Duration::days(i64::from(day)) - Duration::minutes(40);
        let draft = SessionDraft::new(
            args.user_id,
            book_id,
            15 + day % 25,
            start,
            start + Duration::minutes(30),
        );
        storage
            .sessions
            .insert_session(&draft.validate(now)?)
            .await?;
        sessions += 1;
    }

    let today = now.date_naive();
    let mut goal_draft = GoalDraft::new(
        args.user_id,
        GoalType::Monthly,
        600,
        today - Duration::days(10),
        today + Duration::days(20),
    );
    goal_draft.target_books = 2;
    storage.goals.insert_goal(&goal_draft.validate(now)?).await?;

    println!(
        "Seeded {} books, {} sessions and 1 goal for user {} into {}",
        book_ids.len(),
        sessions,
        args.user_id,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
