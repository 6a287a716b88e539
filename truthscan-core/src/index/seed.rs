//! Starter corpus loaded into a freshly created index.

use super::record::{HoaxMetadata, Verdict};

/// (text, source, category) for each seeded hoax. All are labelled FAKE.
const SEED_HOAXES: [(&str, &str, &str); 5] = [
    (
        "5G towers cause coronavirus spread and illness",
        "Debunked by WHO and scientific community",
        "health_misinformation",
    ),
    (
        "Vaccines contain microchips for tracking people",
        "Conspiracy theory debunked by fact-checkers",
        "vaccine_misinformation",
    ),
    (
        "Climate change is a hoax invented by governments",
        "Contradicts scientific consensus",
        "climate_denial",
    ),
    (
        "Drinking bleach cures diseases and infections",
        "Dangerous myth debunked by medical experts",
        "health_misinformation",
    ),
    (
        "Moon landing was faked in a studio",
        "Conspiracy theory debunked",
        "conspiracy",
    ),
];

/// Number of statements in the starter corpus.
pub const SEED_COUNT: usize = SEED_HOAXES.len();

/// Iterate over the starter corpus as (text, metadata) pairs.
pub fn seed_hoaxes() -> impl Iterator<Item = (&'static str, HoaxMetadata)> {
    SEED_HOAXES.iter().map(|(text, source, category)| {
        (*text, HoaxMetadata::new(Verdict::Fake, *source, *category))
    })
}
