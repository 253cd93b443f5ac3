//! Symbol normalization and matching against the broker's symbol universe.

use relay_core::error::ResolveError;
use relay_core::types::AccountClass;
use tracing::{debug, warn};

/// Broker-specific suffixes, matched case-insensitively.
const KNOWN_SUFFIXES: &[&str] = &[".raw", ".m", ".c", ".pro", ".ecn", ".stp"];

const GOLD_TOKENS: &[&str] = &["XAU", "GOLD"];
const SILVER_TOKENS: &[&str] = &["XAG", "SILVER"];

/// Instruments that brokers list without a suffix on any account class.
const UNSUFFIXED_METALS: &[&str] = &["XAU", "XAG", "XPT", "XPD", "GOLD", "SILVER"];
const UNSUFFIXED_INDICES: &[&str] = &[
    "US30", "US100", "US500", "NAS100", "SPX500", "USTEC", "GER30", "GER40", "DE40", "UK100",
    "FRA40", "JP225", "AUS200", "HK50",
];
const UNSUFFIXED_CRYPTO: &[&str] = &["BTC", "ETH", "LTC", "XRP", "BCH", "SOL"];

/// Strip one known broker suffix, if present.
///
/// `XAUUSD.raw` -> `XAUUSD`, `EURUSD.M` -> `EURUSD`; anything else is
/// returned unchanged.
pub fn normalize(symbol: &str) -> &str {
    known_suffix(symbol)
        .map(|suffix| &symbol[..symbol.len() - suffix.len()])
        .unwrap_or(symbol)
}

fn known_suffix(symbol: &str) -> Option<&'static str> {
    KNOWN_SUFFIXES.iter().copied().find(|suffix| {
        symbol.len() > suffix.len()
            && symbol.is_char_boundary(symbol.len() - suffix.len())
            && symbol[symbol.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    })
}

fn contains_any(haystack_upper: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| haystack_upper.contains(t))
}

/// Maps alert symbols to broker-tradable symbols.
///
/// Resolution is a pure function of its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolResolver;

impl SymbolResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `raw` against the broker universe.
    ///
    /// `universe` is `None` when the symbol listing itself could not be
    /// fetched; only then is the suffix guess of [`Self::fallback`] used.
    pub fn resolve(
        &self,
        raw: &str,
        account_class: AccountClass,
        universe: Option<&[String]>,
    ) -> Result<String, ResolveError> {
        match universe {
            Some(universe) => self.match_universe(raw, universe),
            None => {
                let guess = self.fallback(raw, account_class);
                warn!("Symbol universe unavailable, guessing {} -> {}", raw, guess);
                Ok(guess)
            }
        }
    }

    /// Match against a fetched universe, in priority order.
    pub fn match_universe(&self, raw: &str, universe: &[String]) -> Result<String, ResolveError> {
        if universe.is_empty() {
            return Err(ResolveError::EmptyUniverse);
        }
        // A blank symbol would partially match every entry.
        if normalize(raw).trim().is_empty() {
            return Err(ResolveError::NotFound(raw.to_string()));
        }

        // Exact match wins over normalization.
        if universe.iter().any(|s| s == raw) {
            return Ok(raw.to_string());
        }

        let normalized = normalize(raw);
        if universe.iter().any(|s| s == normalized) {
            return Ok(normalized.to_string());
        }

        let upper = normalized.to_ascii_uppercase();
        let metal_tokens = if contains_any(&upper, GOLD_TOKENS) {
            Some(GOLD_TOKENS)
        } else if contains_any(&upper, SILVER_TOKENS) {
            Some(SILVER_TOKENS)
        } else {
            None
        };
        if let Some(tokens) = metal_tokens {
            if let Some(found) = universe
                .iter()
                .find(|s| contains_any(&s.to_ascii_uppercase(), tokens))
            {
                debug!("Resolved metal {} -> {}", raw, found);
                return Ok(found.clone());
            }
        }

        // First partial match in broker order; no disambiguation between
        // several candidates.
        if let Some(found) = universe.iter().find(|s| {
            let candidate = s.to_ascii_uppercase();
            !candidate.is_empty() && (upper.contains(&candidate) || candidate.contains(&upper))
        }) {
            debug!("Resolved {} -> {} by partial match", raw, found);
            return Ok(found.clone());
        }

        Err(ResolveError::NotFound(raw.to_string()))
    }

    /// Best-effort symbol guess for when the universe cannot be fetched.
    ///
    /// Metals, named indices, major crypto and oil are never suffixed. Other
    /// symbols on prop accounts get `.raw` unless they already carry a known
    /// suffix.
    pub fn fallback(&self, raw: &str, account_class: AccountClass) -> String {
        let upper = raw.to_ascii_uppercase();
        let never_suffixed = contains_any(&upper, UNSUFFIXED_METALS)
            || contains_any(&upper, UNSUFFIXED_INDICES)
            || contains_any(&upper, UNSUFFIXED_CRYPTO)
            || upper.contains("OIL");

        if never_suffixed || account_class != AccountClass::Prop || known_suffix(raw).is_some() {
            raw.to_string()
        } else {
            format!("{raw}.raw")
        }
    }
}
