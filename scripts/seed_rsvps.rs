//! Fills a development RSVP backend with random guest responses.
//!
//! Usage: `cargo run --bin seed_rsvps -- [COUNT]` with the same config file
//! and environment variables as `rsvp-admin`.

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use rsvp_admin::config::DashboardConfig;
use rsvp_admin::domain::rsvp::Answer;
use rsvp_admin::services::{RsvpSubmission, SubmissionService};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const FIRST_NAMES: [&str; 10] = [
    "Amelia", "Bruno", "Chloe", "Dmitri", "Elena", "Farah", "Gustavo", "Hana", "Isaac", "Julia",
];
const LAST_NAMES: [&str; 8] = [
    "Okafor", "Lindqvist", "Moreau", "Tanaka", "Silva", "Novak", "Haddad", "Walsh",
];
const FOODS: [&str; 6] = ["", "", "", "Vegetarian", "Gluten free", "Shellfish allergy"];

fn random_submission(rng: &mut impl Rng, index: usize) -> RsvpSubmission {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Guest");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Doe");
    let attending = if rng.gen_bool(0.8) { Answer::Yes } else { Answer::No };
    let bringing_guest = rng.gen_bool(0.4);
    let needs_room = rng.gen_bool(0.3);

    RsvpSubmission {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!(
            "{}.{}+{index}@example.com",
            first.to_lowercase(),
            last.to_lowercase()
        ),
        attending: Some(attending),
        bringing_guest: Some(if bringing_guest { Answer::Yes } else { Answer::No }),
        guest_first_name: if bringing_guest {
            FIRST_NAMES.choose(rng).copied().unwrap_or("Plus").to_string()
        } else {
            String::new()
        },
        guest_last_name: if bringing_guest { last.to_string() } else { String::new() },
        food_restrictions: FOODS.choose(rng).copied().unwrap_or("").to_string(),
        needs_hotel_room: Some(if needs_room { Answer::Yes } else { Answer::No }),
        number_of_rooms: if needs_room {
            rng.gen_range(1..=2).to_string()
        } else {
            String::new()
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let count: usize = match std::env::args().nth(1) {
        Some(raw) => raw.parse()?,
        None => 25,
    };

    let config = DashboardConfig::load()?;
    let service = SubmissionService::new(Arc::new(config.record_store()?));

    let mut rng = rand::thread_rng();
    let submissions: Vec<RsvpSubmission> =
        (0..count).map(|i| random_submission(&mut rng, i)).collect();

    let mut created = 0;
    for submission in &submissions {
        match service.submit(submission).await {
            Ok(_) => created += 1,
            Err(error) => eprintln!("Skipped {}: {error}", submission.email),
        }
    }

    println!("Created {created} of {count} RSVPs");
    Ok(())
}
