//! Sentinel-delimited block scanning for event and micro-action notes.
//!
//! The block contract is line-oriented: a block opens at a line beginning
//! with `#event_id:` or `#micro_id:` (the rest of the line is the raw
//! label) and runs until the next sentinel line or a line-exact `---`
//! divider. Implemented as an explicit state machine rather than a
//! look-ahead regex.

use once_cell::sync::Lazy;
use regex::Regex;

use korpus_core::reference;
use korpus_core::{ImportWarnings, UNKNOWN_AUTHORITY};

/// Event block sentinel.
pub const EVENT_SENTINEL: &str = "#event_id:";
/// Micro-action block sentinel.
pub const MICRO_SENTINEL: &str = "#micro_id:";

/// Bullet `- key: value` line inside a block.
pub static KV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*([A-Za-z0-9_]+)\s*:\s*(.+?)\s*$").unwrap());

/// `**Description**` mode-switch label line.
pub static DESCRIPTION_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\*\*\s*Description\s*\*{0,2}\s*:?\s*$").unwrap());

/// `**Observations**` mode-switch label line.
pub static OBSERVATION_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\*\*\s*Observations?\s*\*{0,2}\s*:?\s*$").unwrap());

/// Which sentinel a scan collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Event,
    MicroAction,
}

impl BlockKind {
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::Event => EVENT_SENTINEL,
            Self::MicroAction => MICRO_SENTINEL,
        }
    }
}

/// One raw block: the sentinel's label plus the captured lines.
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub label: String,
    pub lines: Vec<String>,
}

/// Scan a note body for blocks of the requested kind.
///
/// Blocks of the other kind still terminate capture; their content is not
/// returned.
pub fn scan_blocks(text: &str, kind: BlockKind) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock> = None;

    for line in text.lines() {
        let sentinel = [EVENT_SENTINEL, MICRO_SENTINEL]
            .iter()
            .find(|s| line.starts_with(**s))
            .copied();

        if let Some(sentinel) = sentinel {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            if sentinel == kind.sentinel() {
                current = Some(RawBlock {
                    label: line[sentinel.len()..].trim().to_string(),
                    lines: Vec::new(),
                });
            }
            continue;
        }

        if line.trim() == "---" {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }

        if let Some(block) = current.as_mut() {
            block.lines.push(line.to_string());
        }
    }

    if let Some(block) = current.take() {
        blocks.push(block);
    }

    blocks
}

/// Resolve a participant field value into an entity id.
///
/// The `UNKNOWN_AUTHORITY` sentinel survives intact, including through
/// resolution failures of UNKNOWN-marked values; anything else goes
/// through the reference grammar, and failures drop the participant
/// (already logged by `clean`).
pub fn resolve_participant(
    value: &str,
    warnings: &mut ImportWarnings,
    file: &str,
) -> Option<String> {
    if value == UNKNOWN_AUTHORITY {
        return Some(UNKNOWN_AUTHORITY.to_string());
    }

    match reference::clean(value, warnings, file, 0) {
        Ok(id) => Some(id),
        Err(_) if value.to_uppercase().contains("UNKNOWN") => {
            Some(UNKNOWN_AUTHORITY.to_string())
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "3b1e2b2a-9c4d-4c1e-8f2a-1b2c3d4e5f6a";

    #[test]
    fn test_scan_single_block() {
        let text = "preamble\n#event_id: arrest-1942\n- date_edtf: 1942\n- victim: x\n";
        let blocks = scan_blocks(text, BlockKind::Event);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].label, "arrest-1942");
        assert_eq!(blocks[0].lines.len(), 2);
    }

    #[test]
    fn test_block_ends_at_next_sentinel() {
        let text = "#event_id: a\n- k: 1\n#event_id: b\n- k: 2\n";
        let blocks = scan_blocks(text, BlockKind::Event);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines, vec!["- k: 1"]);
        assert_eq!(blocks[1].label, "b");
    }

    #[test]
    fn test_block_ends_at_divider() {
        let text = "#event_id: a\n- k: 1\n---\ntrailing text\n";
        let blocks = scan_blocks(text, BlockKind::Event);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec!["- k: 1"]);
    }

    #[test]
    fn test_other_sentinel_terminates_but_is_not_collected() {
        let text = "#event_id: a\n- k: 1\n#micro_id: m\n- k: 2\n";
        let events = scan_blocks(text, BlockKind::Event);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].lines, vec!["- k: 1"]);

        let micros = scan_blocks(text, BlockKind::MicroAction);
        assert_eq!(micros.len(), 1);
        assert_eq!(micros[0].label, "m");
    }

    #[test]
    fn test_kv_regex() {
        let caps = KV_RE.captures("  - action_type: letter_sent  ").unwrap();
        assert_eq!(&caps[1], "action_type");
        assert_eq!(&caps[2], "letter_sent");
        assert!(KV_RE.captures("- not a kv line").is_none());
    }

    #[test]
    fn test_label_line_matchers() {
        assert!(DESCRIPTION_LABEL_RE.is_match("**Description**"));
        assert!(DESCRIPTION_LABEL_RE.is_match("** Description :"));
        assert!(OBSERVATION_LABEL_RE.is_match("**Observation**:"));
        assert!(OBSERVATION_LABEL_RE.is_match("**Observations**"));
        assert!(!DESCRIPTION_LABEL_RE.is_match("**Description** of the scene"));
    }

    #[test]
    fn test_resolve_participant_sentinel_survives() {
        let mut warnings = ImportWarnings::new();
        assert_eq!(
            resolve_participant("UNKNOWN_AUTHORITY", &mut warnings, "a.md").as_deref(),
            Some(UNKNOWN_AUTHORITY)
        );
        assert_eq!(
            resolve_participant("UNKNOWN consulate", &mut warnings, "a.md").as_deref(),
            Some(UNKNOWN_AUTHORITY)
        );
    }

    #[test]
    fn test_resolve_participant_wikilink_and_failure() {
        let mut warnings = ImportWarnings::new();
        let link = format!("[[/id/person/{UUID}]]");
        assert_eq!(
            resolve_participant(&link, &mut warnings, "a.md"),
            Some(format!("/id/person/{UUID}"))
        );
        assert_eq!(resolve_participant("[[garbage]]", &mut warnings, "a.md"), None);
    }
}
