//! Default values and environment-driven configuration.

/// Maximum day gap for NEXT_IN_COMMUNICATION_CHAIN inference.
pub const DEFAULT_CHAIN_WINDOW_DAYS: i64 = 14;

/// Search window for reply anchoring (informational, carried on reports).
pub const DEFAULT_REPLY_SEARCH_DAYS: i64 = 90;

/// Minimum narrative length before falling back to the raw document body.
pub const DEFAULT_NARRATIVE_MIN_CHARS: usize = 50;

/// Bounded retry attempts for transient backend failures.
pub const DEFAULT_COMMIT_RETRIES: u32 = 3;

/// Fixed backoff between retry attempts, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Run-level configuration for a single vault import.
///
/// CLI and config-file handling live in external tooling; this struct is the
/// seam they feed. `from_env` exists so library consumers and tests read the
/// same defaults services read at startup.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Promote selected warnings (invalid id version, missing provenance)
    /// to record-level errors.
    pub strict_mode: bool,
    /// Whether structure items are expected to carry provenance.
    pub provenance_required: bool,
    /// Day window for communication-chain inference.
    pub chain_window_days: i64,
    /// Day window for reply anchoring.
    pub reply_search_days: i64,
    /// Narrative-text minimum length (content-preservation fallback).
    pub narrative_min_chars: usize,
    /// Whether to run the inference rules after ingestion.
    pub calculated_relations: bool,
    /// Bounded retry attempts for backend phases.
    pub commit_retries: u32,
    /// Fixed backoff between retries, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            provenance_required: true,
            chain_window_days: DEFAULT_CHAIN_WINDOW_DAYS,
            reply_search_days: DEFAULT_REPLY_SEARCH_DAYS,
            narrative_min_chars: DEFAULT_NARRATIVE_MIN_CHARS,
            calculated_relations: true,
            commit_retries: DEFAULT_COMMIT_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl ImportConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `KORPUS_STRICT_MODE` | `false` | Promote selected warnings to errors |
    /// | `KORPUS_PROVENANCE_REQUIRED` | `true` | Expect provenance on structures |
    /// | `KORPUS_CHAIN_WINDOW_DAYS` | `14` | Chain-inference day window |
    /// | `KORPUS_REPLY_SEARCH_DAYS` | `90` | Reply-anchoring day window |
    /// | `KORPUS_NARRATIVE_MIN_CHARS` | `50` | Narrative fallback threshold |
    /// | `KORPUS_CALCULATED_RELATIONS` | `true` | Run inference rules |
    /// | `KORPUS_COMMIT_RETRIES` | `3` | Backend retry attempts |
    /// | `KORPUS_RETRY_BACKOFF_MS` | `500` | Backoff between retries |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            strict_mode: env_bool("KORPUS_STRICT_MODE", defaults.strict_mode),
            provenance_required: env_bool(
                "KORPUS_PROVENANCE_REQUIRED",
                defaults.provenance_required,
            ),
            chain_window_days: env_parse("KORPUS_CHAIN_WINDOW_DAYS", defaults.chain_window_days),
            reply_search_days: env_parse("KORPUS_REPLY_SEARCH_DAYS", defaults.reply_search_days),
            narrative_min_chars: env_parse(
                "KORPUS_NARRATIVE_MIN_CHARS",
                defaults.narrative_min_chars,
            ),
            calculated_relations: env_bool(
                "KORPUS_CALCULATED_RELATIONS",
                defaults.calculated_relations,
            ),
            commit_retries: env_parse("KORPUS_COMMIT_RETRIES", defaults.commit_retries),
            retry_backoff_ms: env_parse("KORPUS_RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
        }
    }

    /// Enable or disable strict mode.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Set the communication-chain day window.
    pub fn with_chain_window_days(mut self, days: i64) -> Self {
        self.chain_window_days = days;
        self
    }

    /// Enable or disable the inference phase.
    pub fn with_calculated_relations(mut self, enabled: bool) -> Self {
        self.calculated_relations = enabled;
        self
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
