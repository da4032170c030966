//! # Seed Data Generator
//!
//! Populates the database with demo hotels, rooms and guests for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by LODGING_DATABASE_PATH (default ./lodging.db)
//! cargo run -p lodging-db --bin seed
//!
//! # Specify database path
//! cargo run -p lodging-db --bin seed -- --db ./data/lodging.db
//!
//! # Rooms per hotel
//! cargo run -p lodging-db --bin seed -- --rooms 40
//! ```
//!
//! ## Generated Data
//! - One admin and a handful of guest accounts
//! - Rooms for each demo hotel, numbered `{floor}{index:02}`
//! - Categories cycle single → double → suite, with a presidential
//!   suite on the top floor
//! - Nightly rates 1000 - 3500 minor units, capacity 1 - 4

use chrono::Utc;
use lodging_core::{Room, RoomCategory, User, UserRole};
use lodging_db::{Database, LodgingConfig};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Demo hotel ids. Hotels themselves live in the catalogue service.
const HOTELS: &[&str] = &["hotel-harbour-view", "hotel-old-town", "hotel-lakeside"];

/// (email, full name, role)
const USERS: &[(&str, &str, UserRole)] = &[
    ("admin@lodging.test", "Front Desk Admin", UserRole::Admin),
    ("asha@lodging.test", "Asha Rao", UserRole::Guest),
    ("daniel@lodging.test", "Daniel Okafor", UserRole::Guest),
    ("mei@lodging.test", "Mei Tanaka", UserRole::Guest),
    ("lucas@lodging.test", "Lucas Moreau", UserRole::Guest),
];

/// (category, capacity, base rate)
const ROOM_TYPES: &[(RoomCategory, i64, i64)] = &[
    (RoomCategory::Single, 1, 1000),
    (RoomCategory::Double, 2, 1800),
    (RoomCategory::Suite, 4, 3000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = LodgingConfig::load()?;
    let mut rooms_per_hotel: usize = 12;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--rooms" | "-r" => {
                if i + 1 < args.len() {
                    rooms_per_hotel = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lodging Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: $LODGING_DATABASE_PATH)");
                println!("  -r, --rooms <N>     Rooms per hotel (default: 12)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Lodging Seed Data Generator");
    println!("==============================");
    println!("Database: {}", config.database_path);
    println!("Hotels:   {}", HOTELS.len());
    println!("Rooms:    {} per hotel", rooms_per_hotel);
    println!();

    let db = Database::new(config.db_config()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.rooms().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} rooms", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    println!();
    println!("Creating users...");
    let mut users = 0;
    for (email, full_name, role) in USERS {
        if db.users().get_by_email(email).await?.is_some() {
            continue;
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            phone: None,
            role: *role,
            is_active: true,
            created_at: Utc::now(),
        };
        db.users().insert(&user).await?;
        users += 1;
    }
    println!("  Created {} users", users);

    println!();
    println!("Creating rooms...");
    let mut generated = 0;
    for (hotel_idx, hotel_id) in HOTELS.iter().enumerate() {
        for room_idx in 0..rooms_per_hotel {
            let room = generate_room(hotel_id, hotel_idx, room_idx, rooms_per_hotel);

            if let Err(e) = db.rooms().insert(&room).await {
                eprintln!("Failed to insert {} {}: {}", hotel_id, room.room_number, e);
                continue;
            }
            generated += 1;
        }
        info!(hotel_id = %hotel_id, "Seeded hotel rooms");
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} rooms in {:?}", generated, elapsed);

    let active = db.rooms().list_active().await?;
    let suites = active.iter().filter(|r| r.category.is_premium()).count();
    println!("  Active rooms: {} ({} premium)", active.len(), suites);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one room. Ten rooms per floor; the last room of each hotel is the
/// presidential suite.
fn generate_room(hotel_id: &str, hotel_idx: usize, room_idx: usize, per_hotel: usize) -> Room {
    let now = Utc::now();
    let floor = room_idx / 10 + 1;
    let room_number = format!("{}{:02}", floor, room_idx % 10 + 1);

    let (category, capacity, base_price_cents) = if room_idx + 1 == per_hotel {
        (RoomCategory::Presidential, 4, 3500)
    } else {
        let (category, capacity, rate) = ROOM_TYPES[room_idx % ROOM_TYPES.len()];
        // Vary the rate a little per hotel and floor, staying inside the band
        let rate = (rate + (hotel_idx as i64) * 100 + (floor as i64 - 1) * 50).min(3500);
        (category, capacity, rate)
    };

    Room {
        id: Uuid::new_v4().to_string(),
        hotel_id: hotel_id.to_string(),
        room_number,
        category,
        capacity,
        base_price_cents,
        description: Some(format!("{} room, sleeps {}", category, capacity)),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
