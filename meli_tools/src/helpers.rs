/// Composes a single-line postal address from its components.
///
/// Non-empty parts are joined with `" - "`. The last part is itself formatted as
/// `"<zip> - <city>, <state>"`, degrading gracefully when any of those three are
/// missing. An address with no components at all yields an empty string.
///
/// E.g. `("Main", "123", "", "00100", "Metropolis", "NY")` becomes
/// `"Main - 123 - 00100 - Metropolis, NY"`.
pub fn compose_address(street: &str, number: &str, comment: &str, zip: &str, city: &str, state: &str) -> String {
    let locality = match (city.is_empty(), state.is_empty()) {
        (false, false) => format!("{city}, {state}"),
        (false, true) => city.to_string(),
        (true, false) => state.to_string(),
        (true, true) => String::new(),
    };
    let tail = match (zip.is_empty(), locality.is_empty()) {
        (false, false) => format!("{zip} - {locality}"),
        (false, true) => zip.to_string(),
        (true, _) => locality,
    };
    [street, number, comment, tail.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<&str>>()
        .join(" - ")
}

#[cfg(test)]
mod test {
    use super::compose_address;

    #[test]
    fn full_address_with_empty_comment() {
        let address = compose_address("Main", "123", "", "00100", "Metropolis", "NY");
        assert_eq!(address, "Main - 123 - 00100 - Metropolis, NY");
    }

    #[test]
    fn comment_is_included_when_present() {
        let address = compose_address("Main", "123", "Apt 4B", "00100", "Metropolis", "NY");
        assert_eq!(address, "Main - 123 - Apt 4B - 00100 - Metropolis, NY");
    }

    #[test]
    fn missing_state_drops_the_comma() {
        let address = compose_address("Main", "123", "", "00100", "Metropolis", "");
        assert_eq!(address, "Main - 123 - 00100 - Metropolis");
    }

    #[test]
    fn missing_zip_keeps_city_and_state() {
        let address = compose_address("Main", "", "", "", "Metropolis", "NY");
        assert_eq!(address, "Main - Metropolis, NY");
    }

    #[test]
    fn only_state() {
        assert_eq!(compose_address("", "", "", "", "", "NY"), "NY");
    }

    #[test]
    fn empty_components_yield_empty_string() {
        assert_eq!(compose_address("", "", "", "", "", ""), "");
    }
}
