// services/payments-rs/src/fingerprint.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Caller-supplied content subject to idempotency.
///
/// Field declaration order is the canonical serialization order:
/// `{"ccNumber":..,"amount":..}`. Do not reorder.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPayload {
    #[serde(rename = "ccNumber")]
    pub card_number: String,
    pub amount: String,
}

impl PaymentPayload {
    pub fn new(card_number: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
            amount: amount.into(),
        }
    }

    /// Name of the first required field that is empty, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.card_number.is_empty() {
            Some("ccNumber")
        } else if self.amount.is_empty() {
            Some("amount")
        } else {
            None
        }
    }

    pub fn masked_card(&self) -> String {
        mask_card(&self.card_number)
    }
}

impl fmt::Debug for PaymentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentPayload")
            .field("card_number", &self.masked_card())
            .field("amount", &self.amount)
            .finish()
    }
}

/// Keeps only the last four characters of a card identifier.
pub fn mask_card(card: &str) -> String {
    let chars: Vec<char> = card.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

/// Lowercase hex SHA-256 of a payload's canonical form. Always 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub const HEX_LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compact JSON with fields in declaration order.
pub fn canonical_bytes(payload: &PaymentPayload) -> Vec<u8> {
    // a struct of two Strings cannot fail to serialize
    serde_json::to_vec(payload).expect("payment payload serializes to json")
}

pub fn derive(payload: &PaymentPayload) -> Fingerprint {
    let digest = Sha256::digest(canonical_bytes(payload));
    Fingerprint(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_fixed_order_compact_json() {
        let p = PaymentPayload::new("4111111111111111", "9.99");
        assert_eq!(
            canonical_bytes(&p),
            br#"{"ccNumber":"4111111111111111","amount":"9.99"}"#.to_vec()
        );
    }

    #[test]
    fn known_digest() {
        let fp = derive(&PaymentPayload::new("4111111111111111", "9.99"));
        assert_eq!(
            fp.as_str(),
            "4be9a4092ae3333d5ff289c053ee266a42469c9b276790c243b2c6ede0415bb2"
        );
        assert_eq!(fp.as_str().len(), Fingerprint::HEX_LEN);
    }

    #[test]
    fn deterministic_and_content_sensitive() {
        let a = PaymentPayload::new("4111111111111111", "10.00");
        let b = PaymentPayload::new("4111111111111111", "10.00");
        let c = PaymentPayload::new("4111111111111111", "10.0");
        assert_eq!(derive(&a), derive(&a));
        assert_eq!(derive(&a), derive(&b));
        assert_ne!(derive(&a), derive(&c));
        assert_eq!(
            derive(&a).as_str(),
            "053983efbf52f10a1905236933ccd120013b0e77761077d4e9ccb248f7f986aa"
        );
    }

    #[test]
    fn field_boundaries_do_not_collide() {
        let a = PaymentPayload::new("41", "11");
        let b = PaymentPayload::new("411", "1");
        assert_ne!(derive(&a), derive(&b));
    }

    #[test]
    fn hex_is_lowercase() {
        let fp = derive(&PaymentPayload::new("5500000000000004", "1"));
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn debug_masks_card() {
        let p = PaymentPayload::new("4111111111111111", "9.99");
        let s = format!("{:?}", p);
        assert!(!s.contains("4111111111111111"));
        assert!(s.contains("************1111"));
        assert_eq!(mask_card("12"), "12");
    }

    #[test]
    fn missing_field_reports_first_empty() {
        assert_eq!(PaymentPayload::new("", "").missing_field(), Some("ccNumber"));
        assert_eq!(PaymentPayload::new("4111", "").missing_field(), Some("amount"));
        assert_eq!(PaymentPayload::new("4111", "1").missing_field(), None);
    }
}
