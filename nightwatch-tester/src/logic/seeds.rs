use anyhow::{Result, bail};
use nightwatch_game::{parse_replay_code, replay_code};
use std::collections::HashMap;

/// Seed metadata resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    /// Night a replay code was recorded for.
    pub source_night: Option<u8>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_night: None,
        }
    }

    #[must_use]
    pub const fn from_replay_code(seed: u64, night: u8, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_night: Some(night),
        }
    }

    /// Replay codes only apply to the night they were recorded on.
    #[must_use]
    pub fn matches_night(&self, night: u8) -> bool {
        self.source_night.is_none_or(|source| source == night)
    }

    #[must_use]
    pub fn replay_code_for_night(&self, night: u8) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.source_night)
            && source == night
        {
            return code.clone();
        }
        replay_code(night, self.seed)
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers and replay codes such as `N2-LANTERN42`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, u8), usize> = HashMap::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let info = if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Some((night, seed)) = parse_replay_code(token) {
            SeedInfo::from_replay_code(seed, night, token.to_uppercase())
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        let key = (info.seed, info.source_night.unwrap_or(0));
        match index.get(&key) {
            Some(&existing) => {
                if let Some(entry) = deduped.get_mut(existing)
                    && entry.code.is_none()
                    && info.code.is_some()
                {
                    *entry = info;
                }
            }
            None => {
                index.insert(key, deduped.len());
                deduped.push(info);
            }
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

/// Parse the `--nights` argument.
pub fn resolve_nights(tokens: &[String]) -> Result<Vec<u8>> {
    use nightwatch_game::constants::MAX_NIGHT;

    let mut nights = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            nights.extend(1..=MAX_NIGHT);
            continue;
        }
        let night: u8 = token
            .parse()
            .map_err(|_| anyhow::anyhow!("Unrecognized night: {token}"))?;
        if !(1..=MAX_NIGHT).contains(&night) {
            bail!("Night {night} is outside 1..={MAX_NIGHT}");
        }
        nights.push(night);
    }
    nights.sort_unstable();
    nights.dedup();
    if nights.is_empty() {
        nights.push(1);
    }
    Ok(nights)
}
