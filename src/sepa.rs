//! SEPA purpose-field handling. Sparda exports pack the whole remittance
//! information into one free-text column, tagged with SEPA subfield markers
//! ("SVWZ+ ", "EREF+ ", ...) and prefixed with the counterparty and booking
//! kind. This module splits that text back into its parts.

use std::sync::OnceLock;

use regex::Regex;

/// Booking-kind tokens the portal appends to the counterparty name.
pub const KIND_TOKENS: &[&str] = &[
    "SEPA-ÜBERWEISUNG",
    "SEPA-LOHN/GEHALT",
    "SEPA-BASISLASTSCHRIFT",
    "SEPA-DAUERAUFTRAG",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SepaFields {
    /// Counterparty name split off the untagged leading text.
    pub recipient: Option<String>,
    /// Booking-kind token, e.g. "SEPA-ÜBERWEISUNG" or "GIROCARD".
    pub kind: Option<String>,
    /// Untagged leading text when neither a kind token nor a card-payment
    /// blob was recognized.
    pub leading: Option<String>,
    /// SVWZ+ — the actual remittance text.
    pub purpose: Option<String>,
    /// EREF+ — end-to-end reference.
    pub end_to_end_ref: Option<String>,
    /// Merchant reference preceding the timestamp in a card-payment blob.
    pub card_reference: Option<String>,
    /// ABWA+ / ABWE+ — deviating originator / recipient.
    pub alt_payer: Option<String>,
    pub alt_recipient: Option<String>,
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z]{3,4}\+) ").unwrap())
}

/// Card payments carry no SEPA tags; the terminal writes one fixed-shape
/// blob instead: merchant reference, timestamp, trace, currency and amount,
/// EC trace numbers, PAN, merchant name, card expiry, scheme, entry/auth
/// methods.
fn card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?P<reference>.*)",
            r"(?P<datetime>\d{2}\.\d{2}\.\d{4} \d{2}\.\d{2}\.\d{2}) ",
            r"(?:OFFLIN|\d{6}) ",
            r"(?P<currency>[A-Z]{3})\s+",
            r"(?P<amount>-?\d+,\d{2}) ",
            r"EC\s+[A-Z]*\d+\s*\d*\s*",
            r"PAN (?P<pan>\d+) ",
            r"(?P<recipient>.*?)\d{3} ",
            r"(?P<expiry>\d{2}/\d{4}) ",
            r"(?P<kind>GIROCARD|nicht GIRO) ",
            r"(?P<entry>[A-Z]{4})/",
            r"(?P<auth>[A-Z]{4})/+\d*",
        ))
        .unwrap()
    })
}

/// The portal wraps purpose text at a fixed column width and injects a space
/// at every break. Undo that: drop the space found at index 53 and then at
/// every further 54-character stride.
pub fn repair_wrapped_text(value: &str) -> String {
    let mut chars: Vec<char> = value.chars().collect();
    let mut i = 53;
    while i < chars.len() {
        if chars[i] == ' ' {
            chars.remove(i);
        }
        i += 54;
    }
    chars.into_iter().collect()
}

/// Split a purpose field into its tagged subfields. Unknown tags are dropped;
/// the text before the first tag is the counterparty plus booking kind.
pub fn split_fields(reference: &str) -> SepaFields {
    let mut out = SepaFields::default();
    let mut tag = "";
    let mut start = 0;
    for m in tag_re().find_iter(reference) {
        assign(&mut out, tag, reference[start..m.start()].trim());
        // Matched text is e.g. "SVWZ+ "; keep the tag without the space.
        tag = reference[m.start()..m.end() - 1].trim_start();
        start = m.end();
    }
    assign(&mut out, tag, reference[start..].trim());
    out
}

fn assign(out: &mut SepaFields, tag: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let value = collapse_whitespace(value);
    match tag {
        "" => split_leading(out, &value),
        "SVWZ+" => out.purpose = Some(value),
        "EREF+" => out.end_to_end_ref = Some(value),
        "ABWA+" => out.alt_payer = Some(value),
        "ABWE+" => out.alt_recipient = Some(value),
        // MREF+, CRED+, DEBT+, IBAN+, BIC+ identify the counterparty
        // account and mandate; nothing in the output model carries them.
        _ => {}
    }
}

/// The untagged leading text is either "<counterparty> <kind token>" or a
/// card-payment blob; anything else stays as-is.
fn split_leading(out: &mut SepaFields, value: &str) {
    for kind in KIND_TOKENS {
        if let Some(prefix) = value.strip_suffix(kind) {
            out.kind = Some((*kind).to_string());
            let recipient = prefix.trim();
            if !recipient.is_empty() {
                out.recipient = Some(recipient.to_string());
            }
            return;
        }
    }
    if let Some(caps) = card_re().captures(value) {
        out.kind = caps.name("kind").map(|m| m.as_str().to_string());
        out.recipient = caps
            .name("recipient")
            .map(|m| collapse_whitespace(m.as_str()))
            .filter(|r| !r.is_empty());
        out.card_reference = caps
            .name("reference")
            .map(|m| collapse_whitespace(m.as_str()))
            .filter(|r| !r.is_empty());
        return;
    }
    out.leading = Some(value.to_string());
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
