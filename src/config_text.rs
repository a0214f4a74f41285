//! Parser for the bot's Python-style settings file.
//!
//! Only six top-level dictionaries are of interest to the dashboard. Each is
//! located by name, its body is cut at the first closing brace, and the body
//! is tokenized into `key: value` entries with tagged scalar values. Parsing
//! is lenient: anything that does not look like an entry is skipped.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// The settings blocks the dashboard displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockName {
    DecisionThresholds,
    InvestmentRatios,
    SignalStrengths,
    IndicatorWeights,
    IndicatorUsage,
    TradingSettings,
}

impl BlockName {
    pub const ALL: [BlockName; 6] = [
        BlockName::DecisionThresholds,
        BlockName::InvestmentRatios,
        BlockName::SignalStrengths,
        BlockName::IndicatorWeights,
        BlockName::IndicatorUsage,
        BlockName::TradingSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockName::DecisionThresholds => "DECISION_THRESHOLDS",
            BlockName::InvestmentRatios => "INVESTMENT_RATIOS",
            BlockName::SignalStrengths => "SIGNAL_STRENGTHS",
            BlockName::IndicatorWeights => "INDICATOR_WEIGHTS",
            BlockName::IndicatorUsage => "INDICATOR_USAGE",
            BlockName::TradingSettings => "TRADING_SETTINGS",
        }
    }

    /// Human title used by the renderers.
    pub fn title(&self) -> &'static str {
        match self {
            BlockName::DecisionThresholds => "Decision thresholds",
            BlockName::InvestmentRatios => "Investment ratios",
            BlockName::SignalStrengths => "Signal strengths",
            BlockName::IndicatorWeights => "Indicator weights",
            BlockName::IndicatorUsage => "Indicator usage",
            BlockName::TradingSettings => "Trading settings",
        }
    }
}

/// A scalar from the settings file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ConfigValue {
    /// Coerce a raw value token. Order matters: boolean literals, then
    /// finite numbers, then quoted strings, then the raw text.
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "True" | "true" => return ConfigValue::Bool(true),
            "False" | "false" => return ConfigValue::Bool(false),
            _ => {}
        }

        if let Ok(n) = raw.parse::<f64>() {
            if n.is_finite() {
                return ConfigValue::Number(n);
            }
        }

        if let Some(q) = raw.chars().next().filter(|c| is_quote(*c)) {
            let inner = &raw[1..];
            let inner = inner.strip_suffix(q).unwrap_or(inner);
            return ConfigValue::Text(inner.to_string());
        }

        ConfigValue::Text(raw.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// A nested dictionary that was captured as opaque text.
    pub fn is_nested(&self) -> bool {
        matches!(self, ConfigValue::Text(s) if s.starts_with('{'))
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Number(n) => write!(f, "{}", n),
            ConfigValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Entries of one settings block, in source order.
///
/// Re-assigning a key replaces the value but keeps the key's first position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigBlock {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ConfigBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The blocks found in one settings text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedConfig {
    blocks: BTreeMap<BlockName, ConfigBlock>,
    fingerprint: String,
}

impl ParsedConfig {
    pub fn get(&self, name: BlockName) -> Option<&ConfigBlock> {
        self.blocks.get(&name)
    }

    pub fn contains(&self, name: BlockName) -> bool {
        self.blocks.contains_key(&name)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockName, &ConfigBlock)> {
        self.blocks.iter().map(|(k, v)| (*k, v))
    }

    /// SHA-256 of the source text, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Parse the settings text. Never fails; missing blocks are simply absent.
pub fn parse(text: &str) -> ParsedConfig {
    let mut blocks = BTreeMap::new();
    for name in BlockName::ALL {
        if let Some(body) = find_block(text, name.as_str()) {
            blocks.insert(name, parse_block_body(body));
        }
    }
    ParsedConfig {
        blocks,
        fingerprint: fingerprint(text),
    }
}

pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Body of the first `NAME = { ... }` in `text`, up to the first `}`.
fn find_block<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    for (idx, _) in text.match_indices(name) {
        let rest = text[idx + name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else { continue };
        let Some(rest) = rest.trim_start().strip_prefix('{') else { continue };
        // Nested braces are not tracked: the first `}` ends the block.
        return rest.find('}').map(|end| &rest[..end]);
    }
    None
}

/// Tokenize a block body into entries.
pub fn parse_block_body(body: &str) -> ConfigBlock {
    let mut block = ConfigBlock::new();
    let cleaned = strip_comments(body);
    for entry in cleaned.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if let Some((key, value)) = parse_entry(entry) {
            block.insert(key, value);
        }
    }
    block
}

/// Drop `# ...` up to end of line, ignoring `#` inside quoted strings.
///
/// Runs before the comma split, so commas inside a comment never produce
/// entries; anything after `#` on the same line is comment text, entries
/// included.
fn strip_comments(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for line in body.lines() {
        let mut quote: Option<char> = None;
        let mut cut = line.len();
        for (i, c) in line.char_indices() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if is_quote(c) => quote = Some(c),
                None if c == '#' => {
                    cut = i;
                    break;
                }
                None => {}
            }
        }
        out.push_str(&line[..cut]);
        out.push('\n');
    }
    out
}

/// `key: value` with an optionally quoted, non-empty key.
fn parse_entry(entry: &str) -> Option<(String, ConfigValue)> {
    let rest = entry.strip_prefix(is_quote).unwrap_or(entry);

    let key_end = rest.find(|c: char| c == ':' || is_quote(c))?;
    let key = rest[..key_end].trim();
    if key.is_empty() {
        return None;
    }

    let rest = &rest[key_end..];
    let rest = rest.strip_prefix(is_quote).unwrap_or(rest);
    let raw = rest.trim_start().strip_prefix(':')?.trim();
    if raw.is_empty() {
        return None;
    }

    Some((key.to_string(), ConfigValue::coerce(raw)))
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}
