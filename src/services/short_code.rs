use crate::error::{AppError, AppResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Character set for generating short codes.
const ALPHABET_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Minimum length of a caller-supplied shortcode
pub const MIN_SHORTCODE_LENGTH: usize = 3;

/// Maximum length of a caller-supplied shortcode
pub const MAX_SHORTCODE_LENGTH: usize = 64;

static SHORTCODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^[a-zA-Z0-9]{{{},{}}}$",
        MIN_SHORTCODE_LENGTH, MAX_SHORTCODE_LENGTH
    ))
    .expect("shortcode pattern is a valid regex")
});

/// Shortcode format rules and random candidate generation.
///
/// Uniqueness is not decided here: the registry re-checks every candidate inside
/// the same critical section that inserts it.
#[derive(Debug, Clone)]
pub struct ShortCodeService {
    length: usize,
    max_attempts: u32,
    reserved: HashSet<String>,
    generate: fn(usize) -> String,
}

fn random_code(length: usize) -> String {
    nanoid::nanoid!(length, ALPHABET_CHARS)
}

impl ShortCodeService {
    pub fn new<I, S>(length: usize, max_attempts: u32, reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            length,
            max_attempts: max_attempts.max(1),
            reserved: reserved
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
            generate: random_code,
        }
    }

    /// Replace the random source, so collisions can be forced
    #[cfg(test)]
    pub(crate) fn with_generator(mut self, generate: fn(usize) -> String) -> Self {
        self.generate = generate;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw one random candidate of the configured length.
    ///
    /// nanoid pulls from a thread-local RNG, so concurrent callers draw independently.
    pub fn candidate(&self) -> String {
        (self.generate)(self.length)
    }

    /// Whether `code` collides with a reserved route name (case-insensitive)
    pub fn is_reserved(&self, code: &str) -> bool {
        self.reserved.contains(&code.to_ascii_lowercase())
    }

    /// Whether `code` has the shape of a shortcode at all
    pub fn is_well_formed(code: &str) -> bool {
        SHORTCODE_PATTERN.is_match(code)
    }

    /// Whether a path segment may be looked up as a shortcode
    pub fn is_routable(&self, segment: &str) -> bool {
        Self::is_well_formed(segment) && !self.is_reserved(segment)
    }

    /// Validate a caller-supplied shortcode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidShortcode` if the code is not 3-64 alphanumeric
    /// characters or is a reserved word.
    pub fn validate(&self, code: &str) -> AppResult<()> {
        if !Self::is_well_formed(code) {
            return Err(AppError::InvalidShortcode(format!(
                "must be {}-{} alphanumeric characters",
                MIN_SHORTCODE_LENGTH, MAX_SHORTCODE_LENGTH
            )));
        }

        if self.is_reserved(code) {
            return Err(AppError::InvalidShortcode(format!("'{}' is reserved", code)));
        }

        Ok(())
    }
}
