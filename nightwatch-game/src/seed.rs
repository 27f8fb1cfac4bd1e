//! Replay codes: `N<night>-<WORD><NN>`, e.g. `N1-LANTERN42`.
//!
//! A code names one of `WORDS.len() * 100` tickets. The ticket lives in the
//! low 16 bits of the seed and the upper bits are an `XxHash64` of night and
//! ticket, so each code decodes to exactly one seed.

use std::hash::Hasher;

use twox_hash::XxHash64;

use crate::constants::MAX_NIGHT;

pub const WORDS: [&str; 64] = [
    "LANTERN", "STATIC", "BREAKER", "VENT", "HATCH", "GAUGE", "RELAY", "SIREN", "CIRCUIT", "FUSE",
    "SHUTTER", "LOCKER", "KEYCARD", "BEACON", "MONITOR", "SIGNAL", "PULSE", "ECHO", "HOLLOW",
    "CORRIDOR", "LEDGER", "MEMO", "DOSSIER", "SPECIMEN", "SAMPLE", "CHAMBER", "VAULT", "GRATE",
    "PIPE", "VALVE", "CABLE", "SWITCH", "DIAL", "LEVER", "BATTERY", "FLARE", "TORCH", "CANDLE",
    "CURFEW", "MIDNIGHT", "DAWN", "DUSK", "SHIFT", "ROUNDS", "PATROL", "WARDEN", "KENNEL",
    "ARCHIVE", "ATRIUM", "GENERATOR", "FREEZER", "DOCK", "LAB", "SERVER", "HALLWAY", "CONTROL",
    "CAMERA", "PING", "SWEEP", "SHOCK", "LURE", "DOOR", "ALARM", "STAIRS",
];

const TICKET_MASK: u64 = 0xFFFF;
const NUMBERS_PER_WORD: u64 = 100;
const REPLAY_DOMAIN: &[u8] = b"nightwatch/replay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket(u64);

impl Ticket {
    fn count() -> u64 {
        u64::try_from(WORDS.len()).unwrap_or(1) * NUMBERS_PER_WORD
    }

    fn from_seed(seed: u64) -> Self {
        Self((seed & TICKET_MASK) % Self::count())
    }

    fn parse(raw: &str) -> Option<Self> {
        if raw.len() < 3 || !raw.is_ascii() {
            return None;
        }
        let (word, digits) = raw.split_at(raw.len() - 2);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: u64 = digits.parse().ok()?;
        let word = WORDS.iter().position(|w| w.eq_ignore_ascii_case(word))?;
        Some(Self(u64::try_from(word).ok()? * NUMBERS_PER_WORD + number))
    }

    fn word(self) -> &'static str {
        usize::try_from(self.0 / NUMBERS_PER_WORD)
            .ok()
            .and_then(|i| WORDS.get(i))
            .copied()
            .unwrap_or(WORDS[0])
    }

    const fn number(self) -> u64 {
        self.0 % NUMBERS_PER_WORD
    }

    fn seed(self, night: u8) -> u64 {
        let mut hasher = XxHash64::with_seed(u64::from(night));
        hasher.write(REPLAY_DOMAIN);
        hasher.write(&self.0.to_le_bytes());
        (hasher.finish() & !TICKET_MASK) | self.0
    }
}

/// Replay code for `(night, seed)`. Only the ticket bits of the seed show in
/// the code; [`parse_replay_code`] rebuilds the seed the code stands for.
#[must_use]
pub fn replay_code(night: u8, seed: u64) -> String {
    let ticket = Ticket::from_seed(seed);
    format!("N{night}-{}{:02}", ticket.word(), ticket.number())
}

/// Parse a replay code into `(night, seed)`. Case-insensitive.
#[must_use]
pub fn parse_replay_code(code: &str) -> Option<(u8, u64)> {
    let (prefix, rest) = code.trim().split_once('-')?;
    let night: u8 = prefix.strip_prefix(['N', 'n'])?.parse().ok()?;
    if !(1..=MAX_NIGHT).contains(&night) {
        return None;
    }
    let ticket = Ticket::parse(rest)?;
    Some((night, ticket.seed(night)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_seed_renders_the_same_code() {
        let (night, seed) = parse_replay_code("N3-LANTERN42").unwrap();
        assert_eq!(night, 3);
        assert_eq!(replay_code(night, seed), "N3-LANTERN42");
    }

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(
            parse_replay_code("n2-static07"),
            parse_replay_code("N2-STATIC07")
        );
    }

    #[test]
    fn night_is_part_of_the_seed() {
        let (_, a) = parse_replay_code("N1-VENT10").unwrap();
        let (_, b) = parse_replay_code("N2-VENT10").unwrap();
        assert_ne!(a, b);
        assert_eq!(a & TICKET_MASK, b & TICKET_MASK);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert_eq!(parse_replay_code("LANTERN42"), None);
        assert_eq!(parse_replay_code("N9-LANTERN42"), None);
        assert_eq!(parse_replay_code("N1-NOTAWORD42"), None);
        assert_eq!(parse_replay_code("N1-VENTXX"), None);
        assert_eq!(parse_replay_code("N1-VENT+1"), None);
    }

    #[test]
    fn any_seed_has_a_code_that_parses() {
        for seed in [0_u64, 1, 0xFFFF, 0xFFFF_FFFF, u64::MAX] {
            let code = replay_code(4, seed);
            let (night, parsed) = parse_replay_code(&code).unwrap();
            assert_eq!(night, 4);
            assert_eq!(replay_code(night, parsed), code);
        }
    }
}
