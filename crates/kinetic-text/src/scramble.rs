//! Scramble-text frame generation.
//!
//! A [`Scrambler`] morphs one string into another: the destination is
//! revealed left to right as progress advances while the unrevealed tail is
//! filled with characters drawn from an [`Alphabet`]. Whitespace is never
//! scrambled so word boundaries stay put.
//!
//! # Usage
//!
//! ```ignore
//! let mut scrambler = Scrambler::new("", "Hello", &Alphabet::UpperCase, 0.85, 7);
//! let frame = scrambler.render(0.5, 1.0 / 60.0);
//! assert!(frame.starts_with("He"));
//! assert_eq!(scrambler.render(1.0, 0.0), "Hello");
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Character set used by hover scrambles.
pub const DEFAULT_HOVER_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz!@#$%^&*()_+-=[]{}|;:\"";

const UPPER_CASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER_CASE: &str = "abcdefghijklmnopqrstuvwxyz";

/// Noise refresh interval at speed 1.0, in seconds.
const BASE_REFRESH_INTERVAL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alphabet {
    #[default]
    UpperCase,
    LowerCase,
    Custom(String),
}

impl Alphabet {
    /// `upperCase` and `lowerCase` select the named sets; any other
    /// non-empty string is used verbatim.
    pub fn parse(value: &str) -> Self {
        match value {
            "upperCase" => Self::UpperCase,
            "lowerCase" => Self::LowerCase,
            "" => Self::UpperCase,
            custom => Self::Custom(custom.to_string()),
        }
    }

    pub fn chars(&self) -> Vec<char> {
        match self {
            Self::UpperCase => UPPER_CASE.chars().collect(),
            Self::LowerCase => LOWER_CASE.chars().collect(),
            Self::Custom(custom) => custom.chars().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scrambler {
    from: Vec<char>,
    to: Vec<char>,
    alphabet: Vec<char>,
    refresh_interval: f64,
    since_refresh: f64,
    noise: Vec<char>,
    rng: SmallRng,
}

impl Scrambler {
    pub fn new(from: &str, to: &str, alphabet: &Alphabet, speed: f64, seed: u64) -> Self {
        let mut alphabet = alphabet.chars();
        if alphabet.is_empty() {
            alphabet = UPPER_CASE.chars().collect();
        }
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        let from: Vec<char> = from.chars().collect();
        let to: Vec<char> = to.chars().collect();
        let mut scrambler = Self {
            refresh_interval: BASE_REFRESH_INTERVAL / speed,
            since_refresh: 0.0,
            noise: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
            from,
            to,
            alphabet,
        };
        scrambler.refresh_noise();
        scrambler
    }

    pub fn destination(&self) -> String {
        self.to.iter().collect()
    }

    fn refresh_noise(&mut self) {
        let len = self.from.len().max(self.to.len());
        self.noise = (0..len)
            .map(|_| self.alphabet[self.rng.gen_range(0..self.alphabet.len())])
            .collect();
    }

    /// Produce the frame for `progress` after `dt` seconds since the
    /// previous frame.
    pub fn render(&mut self, progress: f64, dt: f64) -> String {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        if progress >= 1.0 {
            return self.destination();
        }

        self.since_refresh += dt.max(0.0);
        if self.since_refresh >= self.refresh_interval {
            self.since_refresh = 0.0;
            self.refresh_noise();
        }

        let from_len = self.from.len() as f64;
        let to_len = self.to.len() as f64;
        let length = (from_len + (to_len - from_len) * progress).round() as usize;
        let revealed = ((to_len * progress).round() as usize).min(self.to.len());

        (0..length)
            .map(|i| {
                if i < revealed {
                    return self.to[i];
                }
                let reference = self.to.get(i).or_else(|| self.from.get(i));
                match reference {
                    Some(c) if c.is_whitespace() => *c,
                    _ => self.noise[i],
                }
            })
            .collect()
    }
}
