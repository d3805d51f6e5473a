//! Keyword domain gate
//!
//! Client-side filter consulted once per inbound message, after the message
//! is persisted. Out-of-scope messages never reach the completion service.

/// Gate outcome for one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Allowed,
    Blocked,
}

/// Metals and alloys vocabulary. Entries are lowercase and long enough not
/// to hit common words ("ore" would match "more", "iron" "environment").
const METALS_VOCABULARY: &[&str] = &[
    "metal",
    "alloy",
    "brass",
    "bronze",
    "copper",
    "steel",
    "stainless",
    "aluminium",
    "aluminum",
    "titanium",
    "nickel",
    "zinc",
    "magnesium",
    "tungsten",
    "inconel",
    "cast iron",
    "wrought",
    "tensile",
    "yield strength",
    "hardness",
    "ductil",
    "elongation",
    "machinab",
    "corrosion",
    "annealing",
    "tempering",
    "quench",
    "welding",
    "brazing",
    "solder",
    "forging",
    "casting",
    "extrusion",
    "heat treat",
    "metallurg",
    "cz108",
    "cz121",
    "c360",
    "en8",
    "304l",
    "316l",
    "6061",
    "7075",
];

/// Case-insensitive substring classifier over a fixed vocabulary
#[derive(Debug, Clone)]
pub struct DomainGate {
    keywords: Vec<String>,
}

impl DomainGate {
    /// Fixed reply for out-of-scope messages, stored as the assistant turn
    pub const REFUSAL: &'static str = "I can only help with questions about metals and alloys: \
grades, properties, heat treatment, machining, joining and corrosion. Please ask me \
something about those topics.";

    /// Gate over a custom vocabulary
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// True when `text` mentions at least one vocabulary entry
    pub fn is_in_scope(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let haystack = text.to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    pub fn evaluate(&self, text: &str) -> GateVerdict {
        if self.is_in_scope(text) {
            GateVerdict::Allowed
        } else {
            GateVerdict::Blocked
        }
    }
}

impl Default for DomainGate {
    fn default() -> Self {
        Self::new(METALS_VOCABULARY)
    }
}
