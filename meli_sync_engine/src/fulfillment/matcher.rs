use serde_json::{json, Value};

use crate::db_types::BuyerInfo;

/// A partner lookup strategy. The pipeline is tried in order and stops at the first
/// strategy that yields a hit; name and email comparisons are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerMatcher {
    Name,
    TaxId,
    Email,
    Phone,
}

impl PartnerMatcher {
    pub const PIPELINE: [PartnerMatcher; 4] =
        [PartnerMatcher::Name, PartnerMatcher::TaxId, PartnerMatcher::Email, PartnerMatcher::Phone];

    /// The res.partner search domain for this strategy, or None when the buyer
    /// snapshot lacks the field it matches on.
    pub fn domain(&self, buyer: &BuyerInfo) -> Option<Value> {
        let non_empty = |s: &Option<String>| s.clone().filter(|v| !v.is_empty());
        match self {
            PartnerMatcher::Name => Some(json!([["name", "=ilike", buyer.display_name()]])),
            PartnerMatcher::TaxId => non_empty(&buyer.identification_number).map(|n| json!([["vat", "=", n]])),
            PartnerMatcher::Email => non_empty(&buyer.email).map(|e| json!([["email", "=ilike", e]])),
            PartnerMatcher::Phone => non_empty(&buyer.phone).map(|p| json!([["phone", "=", p]])),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn buyer() -> BuyerInfo {
        BuyerInfo {
            id: 7,
            nickname: Some("JDOE".to_string()),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            phone: None,
            identification_kind: Some("DNI".to_string()),
            identification_number: Some("12345678".to_string()),
        }
    }

    #[test]
    fn name_matcher_always_produces_a_domain() {
        let domain = PartnerMatcher::Name.domain(&buyer()).unwrap();
        assert_eq!(domain, json!([["name", "=ilike", "Jane Doe"]]));
    }

    #[test]
    fn matchers_skip_missing_fields() {
        let b = buyer();
        assert_eq!(PartnerMatcher::TaxId.domain(&b).unwrap(), json!([["vat", "=", "12345678"]]));
        assert_eq!(PartnerMatcher::Email.domain(&b).unwrap(), json!([["email", "=ilike", "jane@example.com"]]));
        assert!(PartnerMatcher::Phone.domain(&b).is_none());
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let mut b = buyer();
        b.email = Some(String::new());
        assert!(PartnerMatcher::Email.domain(&b).is_none());
    }
}
