//! Phone number normalizer — raw phone string → WhatsApp candidate identifiers.
//!
//! Brazilian mobile numbers are written both with and without the extra mobile
//! `9` in front of the subscriber number, and the channel only recognizes one
//! of the two forms for a given account. Both are produced so the dispatcher
//! can try them in order.

/// Country calling code prepended to every candidate.
pub const COUNTRY_CODE: &str = "55";

/// Suffix the channel uses for individual chats.
pub const CHAT_SUFFIX: &str = "@c.us";

/// Minimum number of digits (area code + subscriber) for a usable number.
pub const MIN_DIGITS: usize = 10;

const AREA_CODE_LEN: usize = 2;
const MOBILE_PREFIX: char = '9';

/// Derive candidate chat identifiers from a raw phone string.
///
/// Returns an empty list when fewer than [`MIN_DIGITS`] digits remain after
/// stripping formatting. Otherwise returns exactly two identifiers, without
/// the mobile `9` first and with it second.
pub fn candidates(raw: &str) -> Vec<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < MIN_DIGITS {
        return Vec::new();
    }

    let (area, subscriber) = digits.split_at(AREA_CODE_LEN);
    let without_nine = subscriber.strip_prefix(MOBILE_PREFIX).unwrap_or(subscriber);

    vec![
        chat_id(area, without_nine, false),
        chat_id(area, without_nine, true),
    ]
}

fn chat_id(area: &str, subscriber: &str, mobile_prefix: bool) -> String {
    let nine = if mobile_prefix { "9" } else { "" };
    format!("{COUNTRY_CODE}{area}{nine}{subscriber}{CHAT_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_numbers_yield_nothing() {
        assert!(candidates("").is_empty());
        assert!(candidates("abc").is_empty());
        assert!(candidates("98765-432").is_empty());
        assert!(candidates("(11) 8765-432").is_empty());
    }

    #[test]
    fn test_number_with_mobile_nine() {
        assert_eq!(
            candidates("(11) 98765-4321"),
            vec!["551187654321@c.us", "5511987654321@c.us"]
        );
    }

    #[test]
    fn test_number_without_mobile_nine() {
        assert_eq!(
            candidates("21 8765 4321"),
            vec!["552187654321@c.us", "5521987654321@c.us"]
        );
    }

    #[test]
    fn test_only_one_leading_nine_is_stripped() {
        assert_eq!(
            candidates("11 99876-5432"),
            vec!["551198765432@c.us", "5511998765432@c.us"]
        );
    }

    #[test]
    fn test_exactly_ten_digits_accepted() {
        let out = candidates("1187654321");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_candidates_share_prefix_and_differ_by_nine() {
        for raw in ["+55 (11) 9 8765-4321", "31-3333-4444", "4799999999", "85 9 1234 5678"] {
            let out = candidates(raw);
            assert_eq!(out.len(), 2, "{raw}");

            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            let prefix = format!("55{}", &digits[..2]);
            assert!(out[0].starts_with(&prefix));
            assert!(out[1].starts_with(&prefix));

            let first = out[0].strip_prefix(&prefix).unwrap();
            let second = out[1].strip_prefix(&prefix).unwrap();
            assert_eq!(second, format!("9{first}"));
        }
    }

    #[test]
    fn test_idempotent() {
        assert_eq!(candidates("(11) 98765-4321"), candidates("(11) 98765-4321"));
    }
}
