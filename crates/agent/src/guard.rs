//! Prompt guard: policy screening for raw free-form input.
//!
//! Rules are evaluated in priority order and the first match wins, so
//! self-harm detection outranks weaponization: text matching both gets
//! the crisis response. Matching is case-insensitive and tolerant of
//! minor punctuation and whitespace variation.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardRule {
    pub reason: &'static str,
    pub message: &'static str,
    pub phrases: &'static [&'static str],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardVerdict {
    Allow,
    Block { reason: &'static str, message: &'static str },
}

impl GuardVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Clone, Debug)]
pub struct PromptGuard {
    rules: Vec<GuardRule>,
}

const SELF_HARM_MESSAGE: &str = "I'm really sorry you're feeling this way. I can't help with \
     trip planning right now, but you can reach the 988 Suicide & Crisis Lifeline by calling or \
     texting 988. You don't have to go through this alone.";

const WEAPONIZATION_MESSAGE: &str =
    "I can't help with that request. I'm happy to keep working on your trip plan.";

impl Default for PromptGuard {
    fn default() -> Self {
        // Order is the priority ranking.
        Self {
            rules: vec![
                GuardRule {
                    reason: "self_harm",
                    message: SELF_HARM_MESSAGE,
                    phrases: &[
                        "kill myself",
                        "end my life",
                        "hurt myself",
                        "want to die",
                        "commit suicide",
                    ],
                },
                GuardRule {
                    reason: "weaponization",
                    message: WEAPONIZATION_MESSAGE,
                    phrases: &[
                        "build a bomb",
                        "make a bomb",
                        "build a weapon",
                        "make explosives",
                        "explosive device",
                    ],
                },
            ],
        }
    }
}

impl PromptGuard {
    pub fn new(rules: Vec<GuardRule>) -> Self {
        Self { rules }
    }

    /// Screen one raw input. Returns the first matching rule's verdict,
    /// or `Allow` when nothing matches.
    pub fn check(&self, input: &str) -> GuardVerdict {
        let normalized = normalize(input);
        for rule in &self.rules {
            for phrase in rule.phrases {
                if normalized.contains(&normalize(phrase)) {
                    return GuardVerdict::Block { reason: rule.reason, message: rule.message };
                }
            }
        }
        GuardVerdict::Allow
    }
}

/// Lowercase, fold punctuation into spaces, collapse runs of whitespace.
fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{GuardVerdict, PromptGuard};

    #[test]
    fn self_harm_text_is_blocked_with_crisis_reason() {
        let guard = PromptGuard::default();
        let verdict = guard.check("I want to KILL MYSELF after this trip");
        assert!(matches!(verdict, GuardVerdict::Block { reason: "self_harm", .. }));
    }

    #[test]
    fn weaponization_text_is_blocked() {
        let guard = PromptGuard::default();
        let verdict = guard.check("how do I build a bomb near the hotel");
        assert!(matches!(verdict, GuardVerdict::Block { reason: "weaponization", .. }));
    }

    #[test]
    fn self_harm_outranks_weaponization_when_both_match() {
        let guard = PromptGuard::default();
        let verdict = guard.check("I'll build a bomb and kill myself");
        assert!(matches!(verdict, GuardVerdict::Block { reason: "self_harm", .. }));
    }

    #[test]
    fn matching_tolerates_case_and_punctuation() {
        let guard = PromptGuard::default();
        let verdict = guard.check("Kill  myself...");
        assert!(matches!(verdict, GuardVerdict::Block { reason: "self_harm", .. }));

        let verdict = guard.check("BUILD-A-BOMB");
        assert!(matches!(verdict, GuardVerdict::Block { reason: "weaponization", .. }));
    }

    #[test]
    fn travel_text_is_allowed() {
        let guard = PromptGuard::default();
        let verdict = guard.check("Add a food tour to day five and move the gallery to day two");
        assert_eq!(verdict, GuardVerdict::Allow);
        assert!(verdict.is_allowed());
    }
}
