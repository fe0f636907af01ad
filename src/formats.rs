//! Pluggable format checks
//!
//! Email grammar, payment-card checksums and color parsing are treated as
//! opaque capabilities with the signature `fn(&str) -> bool`. The defaults
//! delegate to the `validator` and `csscolorparser` crates; tests swap in
//! fakes through [`FormatCheckers`].

use validator::{ValidateCreditCard, ValidateEmail};

/// A text to valid/invalid capability.
pub type FormatCheck = fn(&str) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    PaymentCard,
    Color,
}

impl Format {
    pub fn error_code(self) -> &'static str {
        match self {
            Self::Email => "value_error.email",
            Self::PaymentCard => "value_error.payment_card_number",
            Self::Color => "value_error.color",
        }
    }

    pub fn error_message(self) -> &'static str {
        match self {
            Self::Email => "value is not a valid email address",
            Self::PaymentCard => "value is not a valid payment card number",
            Self::Color => "value is not a valid color",
        }
    }
}

/// The set of format capabilities a validator uses.
#[derive(Debug, Clone, Copy)]
pub struct FormatCheckers {
    pub email: FormatCheck,
    pub payment_card: FormatCheck,
    pub color: FormatCheck,
}

impl Default for FormatCheckers {
    fn default() -> Self {
        Self {
            email: is_valid_email,
            payment_card: is_valid_payment_card,
            color: is_valid_color,
        }
    }
}

impl FormatCheckers {
    pub fn check(&self, format: Format, value: &str) -> bool {
        match format {
            Format::Email => (self.email)(value),
            Format::PaymentCard => (self.payment_card)(value),
            Format::Color => (self.color)(value),
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    value.validate_email()
}

/// Surrounding whitespace is ignored. The rest must be 12 to 19 digits,
/// pass the card checksum and have a length the card's brand allows.
pub fn is_valid_payment_card(value: &str) -> bool {
    let number = value.trim();
    let digits_only = number.bytes().all(|b| b.is_ascii_digit());
    digits_only
        && (12..=19).contains(&number.len())
        && brand_length_ok(number)
        && number.validate_credit_card()
}

/// Visa is 13, 16 or 19 digits, Mastercard 16 and American Express 15.
fn brand_length_ok(number: &str) -> bool {
    let len = number.len();
    match number.get(..2).and_then(|p| p.parse::<u8>().ok()) {
        Some(40..=49) => matches!(len, 13 | 16 | 19),
        Some(51..=55) => len == 16,
        Some(34 | 37) => len == 15,
        _ => true,
    }
}

/// Any CSS color: a name, hex digits, or an `rgb()`/`hsl()` style function.
pub fn is_valid_color(value: &str) -> bool {
    csscolorparser::parse(value).is_ok()
}
