// libs/booking-cell/src/store/catalog.rs
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::models::{Review, ReviewStatus, Service, Specialist};

fn service(id: &str, name: &str, category: &str, price: f64, duration: i32, specialist: &str) -> Service {
    Service {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price,
        duration,
        specialist_ids: vec![specialist.to_string()],
    }
}

/// Service menu used when no database is configured.
pub fn default_services() -> Vec<Service> {
    vec![
        // Hair
        service("1", "Women's Haircut", "Women", 50.0, 60, "1"),
        service("2", "Men's Haircut", "Men", 30.0, 30, "1"),
        service("3", "Child's Haircut", "Children", 25.0, 30, "1"),
        service("4", "Hair Coloring", "Women", 120.0, 120, "1"),
        service("5", "Blow Dry & Styling", "Women", 40.0, 45, "1"),
        // Beauty
        service("6", "Basic Facial", "Face", 60.0, 60, "2"),
        service("7", "Deep Cleaning Facial", "Face", 80.0, 90, "2"),
        service("8", "Eyebrow Shaping", "Face", 15.0, 15, "2"),
        service("9", "Full Body Waxing", "Body", 100.0, 90, "2"),
        // Nails
        service("10", "Classic Manicure", "Nails", 30.0, 45, "3"),
        service("11", "Gel Manicure", "Nails", 50.0, 60, "3"),
        service("12", "Pedicure", "Nails", 55.0, 60, "3"),
        service("13", "Gel Pedicure", "Nails", 70.0, 75, "3"),
        service("14", "Ear Piercing", "Piercing", 35.0, 15, "1"),
    ]
}

/// Specialists written to a fresh local data directory.
pub fn default_specialists() -> Vec<Specialist> {
    vec![
        Specialist {
            id: "1".to_string(),
            name: "Miglena Todorova".to_string(),
            role: "Pro Hair Specialist".to_string(),
            bio: "The main specialist and expert in all hair treatments, cuts, and coloring.".to_string(),
            image: Some("/specialist-1.jpg".to_string()),
            phone: Some("+359 89 786 5829".to_string()),
            instagram: Some("miglena_hair".to_string()),
            twitter: None,
            facebook: Some("Megi75f".to_string()),
        },
        Specialist {
            id: "2".to_string(),
            name: "Monika".to_string(),
            role: "Beautician".to_string(),
            bio: "Expert beautician providing top-tier facial and body treatments.".to_string(),
            image: Some("/specialist-2.jpg".to_string()),
            phone: Some("+359 88 123 4567".to_string()),
            instagram: Some("monika_beauty".to_string()),
            twitter: None,
            facebook: None,
        },
        Specialist {
            id: "3".to_string(),
            name: "Galina Petrova".to_string(),
            role: "Manicurist".to_string(),
            bio: "Professional manicurist offering classic and gel nail services.".to_string(),
            image: Some("/specialist-3.jpg".to_string()),
            phone: Some("+359 88 987 6543".to_string()),
            instagram: None,
            twitter: None,
            facebook: None,
        },
    ]
}

fn review(seq: u128, client_name: &str, rating: i64, comment: &str, day: u32) -> Review {
    Review {
        id: Uuid::from_u128(seq),
        client_name: client_name.to_string(),
        rating,
        comment: comment.to_string(),
        status: ReviewStatus::Approved,
        created_at: Utc
            .with_ymd_and_hms(2023, 10, day, 12, 0, 0)
            .single()
            .unwrap_or_default(),
    }
}

/// Published reviews a fresh local data directory starts with.
pub fn default_reviews() -> Vec<Review> {
    vec![
        review(1, "Alice Johnson", 5, "Amazing service! The haircut was exactly what I wanted.", 15),
        review(2, "Michael Brown", 4, "Great atmosphere and friendly staff. Highly recommend.", 20),
        review(3, "Sarah Davis", 5, "Best salon in town! Love my new color.", 25),
    ]
}
