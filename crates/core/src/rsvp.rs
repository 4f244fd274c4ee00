//! RSVP reply interpretation and localized guest-facing texts.
//!
//! Guests answer invitations either by tapping a quick-reply button or
//! by typing free text. Both paths funnel through [`parse_reply`],
//! which matches bilingual (English / Swahili) keyword sets and also
//! remembers which language the guest used so the confirmation can be
//! sent in the same language.

/// A guest's attendance decision extracted from a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpChoice {
    Accept,
    Decline,
}

/// Language a guest replied in. Drives the confirmation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Swahili,
}

/// English accept keywords (lowercase, punctuation-free).
const ACCEPT_EN: &[&str] = &["yes", "confirm", "accept", "attending", "i will attend"];

/// English decline keywords.
const DECLINE_EN: &[&str] = &["no", "decline", "cancel", "not attending", "cant make it"];

/// Swahili accept keywords.
const ACCEPT_SW: &[&str] = &["ndiyo", "ndio", "nakubali", "nitahudhuria", "thibitisha"];

/// Swahili decline keywords.
const DECLINE_SW: &[&str] = &["hapana", "sitahudhuria", "sikubali", "kataa", "sitaweza"];

/// Interactive button payload ids routed straight to a choice.
const PAYLOAD_ACCEPT: &str = "rsvp_accept";
const PAYLOAD_DECLINE: &str = "rsvp_decline";

/// Interpret a button title, button payload, or free-text message as an
/// RSVP decision.
///
/// Matching is case-insensitive and ignores surrounding punctuation.
/// Returns `None` when the text matches neither language's keyword
/// sets, so ordinary chat messages are left alone.
pub fn parse_reply(text: &str) -> Option<(RsvpChoice, Language)> {
    let cleaned = clean(text);
    if cleaned.is_empty() {
        return None;
    }

    // Structured button payloads are unambiguous; treat them as English
    // since the confirmation language comes from the button title path
    // whenever one is available.
    if cleaned == PAYLOAD_ACCEPT {
        return Some((RsvpChoice::Accept, Language::English));
    }
    if cleaned == PAYLOAD_DECLINE {
        return Some((RsvpChoice::Decline, Language::English));
    }

    if ACCEPT_EN.contains(&cleaned.as_str()) {
        return Some((RsvpChoice::Accept, Language::English));
    }
    if DECLINE_EN.contains(&cleaned.as_str()) {
        return Some((RsvpChoice::Decline, Language::English));
    }
    if ACCEPT_SW.contains(&cleaned.as_str()) {
        return Some((RsvpChoice::Accept, Language::Swahili));
    }
    if DECLINE_SW.contains(&cleaned.as_str()) {
        return Some((RsvpChoice::Decline, Language::Swahili));
    }

    None
}

/// Lowercase, trim, and collapse inner whitespace; strip punctuation.
fn clean(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Localized confirmation sent after a resolved RSVP.
///
/// Always generic and non-technical per the guest-facing error policy.
pub fn confirmation_text(choice: RsvpChoice, language: Language, guest_name: &str) -> String {
    match (choice, language) {
        (RsvpChoice::Accept, Language::English) => format!(
            "Thank you {guest_name}! Your attendance is confirmed. We look forward to seeing you."
        ),
        (RsvpChoice::Decline, Language::English) => format!(
            "Thank you for letting us know, {guest_name}. We are sorry you cannot make it."
        ),
        (RsvpChoice::Accept, Language::Swahili) => {
            format!("Asante {guest_name}! Umethibitisha kuhudhuria. Tunakusubiri kwa hamu.")
        }
        (RsvpChoice::Decline, Language::Swahili) => {
            format!("Asante kwa kutufahamisha, {guest_name}. Pole, tutakukumbuka.")
        }
    }
}

/// Acknowledgement for a guest repeating a decision they already made.
pub fn already_recorded_text(choice: RsvpChoice, language: Language, guest_name: &str) -> String {
    match (choice, language) {
        (RsvpChoice::Accept, Language::English) => {
            format!("{guest_name}, your attendance is already confirmed. See you there!")
        }
        (RsvpChoice::Decline, Language::English) => {
            format!("{guest_name}, we already have your regrets recorded.")
        }
        (RsvpChoice::Accept, Language::Swahili) => {
            format!("{guest_name}, tayari umethibitisha kuhudhuria. Tutaonana!")
        }
        (RsvpChoice::Decline, Language::Swahili) => {
            format!("{guest_name}, tayari tumepokea taarifa yako ya kutokuhudhuria.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_accept_keywords() {
        for text in ["yes", "Yes", "CONFIRM", "  attending  ", "I will attend"] {
            assert_eq!(
                parse_reply(text),
                Some((RsvpChoice::Accept, Language::English)),
                "{text:?} should accept"
            );
        }
    }

    #[test]
    fn english_decline_keywords() {
        assert_eq!(
            parse_reply("No"),
            Some((RsvpChoice::Decline, Language::English))
        );
        assert_eq!(
            parse_reply("not attending"),
            Some((RsvpChoice::Decline, Language::English))
        );
    }

    #[test]
    fn swahili_keywords_detect_language() {
        assert_eq!(
            parse_reply("Ndiyo"),
            Some((RsvpChoice::Accept, Language::Swahili))
        );
        assert_eq!(
            parse_reply("nitahudhuria"),
            Some((RsvpChoice::Accept, Language::Swahili))
        );
        assert_eq!(
            parse_reply("Hapana"),
            Some((RsvpChoice::Decline, Language::Swahili))
        );
    }

    #[test]
    fn button_payload_ids_match() {
        assert_eq!(
            parse_reply("rsvp_accept"),
            Some((RsvpChoice::Accept, Language::English))
        );
        assert_eq!(
            parse_reply("rsvp_decline"),
            Some((RsvpChoice::Decline, Language::English))
        );
    }

    #[test]
    fn punctuation_is_ignored() {
        assert_eq!(
            parse_reply("Yes!"),
            Some((RsvpChoice::Accept, Language::English))
        );
        assert_eq!(
            parse_reply("ndiyo."),
            Some((RsvpChoice::Accept, Language::Swahili))
        );
    }

    #[test]
    fn unrelated_text_is_none() {
        assert_eq!(parse_reply("what time does it start?"), None);
        assert_eq!(parse_reply(""), None);
        assert_eq!(parse_reply("nope"), None);
    }

    #[test]
    fn confirmation_includes_guest_name() {
        let text = confirmation_text(RsvpChoice::Accept, Language::Swahili, "Amina");
        assert!(text.contains("Amina"));
        assert!(text.contains("Asante"));
    }

    #[test]
    fn already_recorded_differs_from_confirmation() {
        let first = confirmation_text(RsvpChoice::Accept, Language::English, "Joy");
        let repeat = already_recorded_text(RsvpChoice::Accept, Language::English, "Joy");
        assert_ne!(first, repeat);
        assert!(repeat.contains("already"));
    }
}
