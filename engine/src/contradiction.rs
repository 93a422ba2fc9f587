//! Contradiction Detection — spot a user correcting something said earlier

use std::sync::LazyLock;

use regex::Regex;

static CORRECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(det stämmer inte|stämmer inte riktigt|jag menade|jag menar egentligen|jag hade fel|fel av mig|rättelse|nej vänta|jag måste rätta|actually|correction|i meant|that's wrong|that is wrong)\b",
    )
    .unwrap()
});

/// Detects correction phrases in Swedish and English.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContradictionDetector;

impl ContradictionDetector {
    pub fn new() -> Self {
        Self
    }

    /// The first correction phrase in `message`, lowercased.
    pub fn detect(&self, message: &str) -> Option<String> {
        CORRECTION_PATTERN
            .find(message)
            .map(|m| m.as_str().to_lowercase())
    }
}
