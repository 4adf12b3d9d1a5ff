//! Value synthesis: map a declared datatype to a generated literal.
//!
//! Literals are plain text in the form PostgreSQL-compatible databases
//! accept on bulk load (`2021-03-04`, `true`, `12.50`, ...). They are
//! never empty and never longer than a declared character length.

mod types;

pub use types::{Datatype, DEFAULT_NUMERIC};

use crate::error::SynthError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Generated dates fall between 1970-01-01 and roughly 2029
const DATE_SPAN_DAYS: i32 = 365 * 60;

/// Most integer digits generated for a numeric column
const MAX_INTEGER_DIGITS: u32 = 15;

/// Produces one literal per call for a declared datatype.
pub trait ValueSynthesizer {
    fn synthesize(&mut self, datatype: &str) -> Result<String, SynthError>;
}

/// Synthesizer backed by the `fake` crate
pub struct FakeSynthesizer {
    rng: StdRng,
}

impl FakeSynthesizer {
    /// Create a synthesizer; the same seed yields the same literals.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn generate(&mut self, datatype: Datatype) -> String {
        let rng = &mut self.rng;
        match datatype {
            Datatype::SmallInt => rng.random::<i16>().to_string(),
            Datatype::Integer => rng.random::<i32>().to_string(),
            Datatype::BigInt => rng.random::<i64>().to_string(),
            Datatype::Real => format!("{:.3}", rng.random_range(-100_000.0f32..100_000.0)),
            Datatype::Double => format!("{:.6}", rng.random_range(-1.0e9f64..1.0e9)),
            Datatype::Numeric { precision, scale } => numeric(rng, precision, scale),
            Datatype::Boolean => rng.random_bool(0.5).to_string(),
            Datatype::Char { length } => {
                let word: String = Word().fake_with_rng(rng);
                truncate(word, length as usize)
            }
            Datatype::Varchar { length: Some(length) } => {
                let sentence: String = Sentence(2..6).fake_with_rng(rng);
                truncate(sentence, length as usize)
            }
            Datatype::Varchar { length: None } => match rng.random_range(0..4) {
                0 => Name().fake_with_rng(rng),
                1 => CompanyName().fake_with_rng(rng),
                2 => SafeEmail().fake_with_rng(rng),
                _ => Sentence(2..6).fake_with_rng(rng),
            },
            Datatype::Text => Sentence(4..12).fake_with_rng(rng),
            Datatype::Date => random_date(rng).format("%Y-%m-%d").to_string(),
            Datatype::Time => random_time(rng).format("%H:%M:%S").to_string(),
            Datatype::Timestamp => random_timestamp(rng)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            Datatype::TimestampTz => format!(
                "{}+00",
                random_timestamp(rng).format("%Y-%m-%d %H:%M:%S")
            ),
            Datatype::Interval => format!(
                "{} days {} hours",
                rng.random_range(0..365),
                rng.random_range(0..24)
            ),
            Datatype::Uuid => format!(
                "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
                rng.random::<u32>(),
                rng.random::<u16>(),
                (rng.random::<u16>() & 0x0FFF) | 0x4000, // Version 4
                (rng.random::<u16>() & 0x3FFF) | 0x8000, // Variant
                rng.random::<u64>() & 0xFFFF_FFFF_FFFF_u64
            ),
            Datatype::Json => {
                let name: String = Name().fake_with_rng(rng);
                serde_json::json!({ "id": rng.random_range(1..100_000), "name": name })
                    .to_string()
            }
        }
    }
}

impl ValueSynthesizer for FakeSynthesizer {
    fn synthesize(&mut self, datatype: &str) -> Result<String, SynthError> {
        let parsed = Datatype::parse(datatype)?;
        Ok(self.generate(parsed))
    }
}

fn numeric(rng: &mut StdRng, precision: u32, scale: u32) -> String {
    let integer_digits = (precision - scale).min(MAX_INTEGER_DIGITS);
    let integer = if integer_digits == 0 {
        0
    } else {
        rng.random_range(0..10u64.pow(integer_digits))
    };

    let mut out = String::new();
    if rng.random_bool(0.2) {
        out.push('-');
    }
    out.push_str(&integer.to_string());
    if scale > 0 {
        out.push('.');
        for _ in 0..scale {
            out.push((b'0' + rng.random_range(0..10u8)) as char);
        }
    }
    out
}

fn random_date(rng: &mut StdRng) -> NaiveDate {
    let days = rng.random_range(0..DATE_SPAN_DAYS);
    NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days).unwrap_or_default()
}

fn random_time(rng: &mut StdRng) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(rng.random_range(0..86_400), 0)
        .unwrap_or_default()
}

fn random_timestamp(rng: &mut StdRng) -> NaiveDateTime {
    NaiveDateTime::new(random_date(rng), random_time(rng))
}

/// Cut `text` to at most `max` characters, never leaving it empty.
fn truncate(text: String, max: usize) -> String {
    let cut: String = text.chars().take(max).collect();
    let cut = cut.trim_end();
    if cut.is_empty() {
        "x".to_string()
    } else {
        cut.to_string()
    }
}
