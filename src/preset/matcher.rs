//! Filename -> rule resolution

use super::PresetRule;

/// Resolve the rule for a filename.
///
/// The filename is lowercased and the first rule (in ascending-priority
/// order, which loaded sets guarantee) with at least one keyword appearing
/// as a substring wins. Substring, not whole-word, and no scoring across
/// multiple hits. `None` means no rule matched.
pub fn match_rule<'a>(filename: &str, rules: &'a [PresetRule]) -> Option<&'a PresetRule> {
    let lowered = filename.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw.as_str())))
}
