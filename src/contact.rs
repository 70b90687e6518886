use serde::Serialize;

use crate::models::driver::Driver;

const COUNTRY_CODE: &str = "254";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactLinks {
    pub tel: String,
    pub whatsapp: String,
}

/// Normalises a Kenyan phone number to international digits (`2547XXXXXXXX`).
/// Returns `None` when the input cannot be a phone number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '+' | '.'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let international = if let Some(local) = digits.strip_prefix('0') {
        format!("{COUNTRY_CODE}{local}")
    } else if digits.len() == 9 && (digits.starts_with('7') || digits.starts_with('1')) {
        format!("{COUNTRY_CODE}{digits}")
    } else {
        digits
    };

    (10..=15).contains(&international.len()).then_some(international)
}

pub fn links_for(driver: &Driver) -> Option<ContactLinks> {
    let phone = normalize_phone(&driver.phone)?;
    let whatsapp = driver
        .whatsapp
        .as_deref()
        .and_then(normalize_phone)
        .unwrap_or_else(|| phone.clone());

    Some(ContactLinks {
        tel: format!("tel:+{phone}"),
        whatsapp: format!("https://wa.me/{whatsapp}"),
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_phone;

    #[test]
    fn local_numbers_gain_the_country_code() {
        assert_eq!(normalize_phone("0712345678").as_deref(), Some("254712345678"));
        assert_eq!(normalize_phone("0110 123 456").as_deref(), Some("254110123456"));
        assert_eq!(normalize_phone("712345678").as_deref(), Some("254712345678"));
    }

    #[test]
    fn international_numbers_are_kept() {
        assert_eq!(normalize_phone("+254 712-345-678").as_deref(), Some("254712345678"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(normalize_phone("call me"), None);
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("12345"), None);
    }
}
