//! Best-effort decomposition of the composed single-line address back into parts.
//!
//! The composed form joins the present components with " - " and ends with a
//! "City, State" locality segment (see [`meli_tools::helpers::compose_address`]).
//! Odoo wants street and locality separately, so we split on the same delimiters.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAddress {
    pub street: Option<String>,
    pub number: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

pub fn parse_address(address: &str) -> ParsedAddress {
    let mut parsed = ParsedAddress::default();
    let segments: Vec<&str> =
        address.split(" - ").map(str::trim).filter(|s| !s.is_empty()).collect();
    let mut rest: &[&str] = &segments;
    if let Some((last, head)) = rest.split_last() {
        if let Some((city, state)) = last.split_once(", ") {
            parsed.city = Some(city.to_string());
            parsed.state = Some(state.to_string());
            rest = head;
        } else if head.last().map(|s| is_zip(s)).unwrap_or(false) {
            // A zip right before it means the tail is a bare locality.
            parsed.city = Some(last.to_string());
            rest = head;
        }
    }
    if let Some((last, head)) = rest.split_last() {
        if is_zip(last) {
            parsed.zip = Some(last.to_string());
            rest = head;
        }
    }
    parsed.street = rest.first().map(|s| s.to_string());
    parsed.number = rest.get(1).map(|s| s.to_string());
    parsed
}

fn is_zip(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric()) && segment.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn full_address_decomposes() {
        let parsed = parse_address("Main - 123 - 00100 - Metropolis, NY");
        assert_eq!(parsed.street.as_deref(), Some("Main"));
        assert_eq!(parsed.number.as_deref(), Some("123"));
        assert_eq!(parsed.zip.as_deref(), Some("00100"));
        assert_eq!(parsed.city.as_deref(), Some("Metropolis"));
        assert_eq!(parsed.state.as_deref(), Some("NY"));
    }

    #[test]
    fn courier_comment_does_not_shift_locality() {
        let parsed = parse_address("Main - 123 - Apt 4B - 00100 - Metropolis, NY");
        assert_eq!(parsed.street.as_deref(), Some("Main"));
        assert_eq!(parsed.number.as_deref(), Some("123"));
        assert_eq!(parsed.zip.as_deref(), Some("00100"));
        assert_eq!(parsed.city.as_deref(), Some("Metropolis"));
        assert_eq!(parsed.state.as_deref(), Some("NY"));
    }

    #[test]
    fn missing_state_leaves_city_bare() {
        let parsed = parse_address("Main - 123 - 00100 - Metropolis");
        assert_eq!(parsed.zip.as_deref(), Some("00100"));
        assert_eq!(parsed.city.as_deref(), Some("Metropolis"));
        assert_eq!(parsed.state, None);
    }

    #[test]
    fn street_only_address() {
        let parsed = parse_address("Main");
        assert_eq!(parsed.street.as_deref(), Some("Main"));
        assert_eq!(parsed.number, None);
        assert_eq!(parsed.city, None);
    }

    #[test]
    fn empty_address_parses_to_nothing() {
        assert_eq!(parse_address(""), ParsedAddress::default());
    }
}
