use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Lowercase ASCII slug of a station name, `station` when nothing survives
pub fn station_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "station".to_string()
    } else {
        slug.to_string()
    }
}

/// Default Parquet filename: output/{station}-daily-{YYMMDD}.parquet
pub fn generate_default_parquet_filename(station_name: &str) -> PathBuf {
    let now = Local::now();
    let filename = format!(
        "{}-daily-{:02}{:02}{:02}.parquet",
        station_slug(station_name),
        now.year() % 100,
        now.month(),
        now.day()
    );
    PathBuf::from("output").join(filename)
}
