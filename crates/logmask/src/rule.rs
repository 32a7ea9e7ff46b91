//! Field rules and the converter built from them.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{MaskError, Result};
use crate::transform::Transform;

/// Binds one transform to the field names it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    transform: Transform,
    fields: Vec<String>,
}

impl Rule {
    /// Create a rule applying `transform` to every field in `fields`.
    pub fn new<I, S>(transform: Transform, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule {
            transform,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Rule starring every character of the matched fields.
    pub fn full_exclusion<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::new(Transform::FullExclusion, fields)
    }

    /// Rule masking the matched fields as personal names.
    pub fn mask_name<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::new(Transform::MaskName, fields)
    }

    /// Rule masking the matched fields as email addresses.
    pub fn mask_email<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::new(Transform::MaskEmail, fields)
    }

    /// Rule masking the matched fields as phone or card numbers.
    pub fn mask_card_and_phone<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::new(Transform::MaskPhoneAndCard, fields)
    }

    /// Rule masking the query parameters of the matched fields as URLs.
    pub fn mask_url<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::new(Transform::MaskUrl, fields)
    }

    /// The transform this rule applies.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// The field names this rule covers.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Immutable field-to-transform mapping, built once at configuration
/// time and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    fields: HashMap<String, Transform>,
}

impl Converter {
    /// Build a converter from rules.
    ///
    /// Two rules claiming the same field name is a configuration bug
    /// and fails here, before the converter can ever be used.
    pub fn new<I>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut fields = HashMap::new();
        for rule in rules {
            for field in &rule.fields {
                if fields.insert(field.clone(), rule.transform).is_some() {
                    return Err(MaskError::DuplicateField {
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(Converter { fields })
    }

    /// Mask `value` with the transform registered for `key`, or hand it
    /// back unchanged when no rule matches.
    pub fn hide<'v>(&self, key: &str, value: &'v str) -> Cow<'v, str> {
        match self.fields.get(key) {
            Some(transform) => Cow::Owned(transform.apply(value, self)),
            None => Cow::Borrowed(value),
        }
    }

    /// Number of field names with a rule attached.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether no field has a rule.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_applies_matching_rule() {
        let conv = Converter::new(vec![Rule::full_exclusion(["password"])]).unwrap();
        assert_eq!(conv.hide("password", "awesome"), "*******");
    }

    #[test]
    fn converter_passes_unmatched_field_through() {
        let conv = Converter::new(vec![Rule::full_exclusion(["password"])]).unwrap();
        assert!(matches!(conv.hide("username", "employee"), Cow::Borrowed("employee")));
    }

    #[test]
    fn converter_empty_value_stays_empty() {
        let conv = Converter::new(vec![
            Rule::full_exclusion(["password"]),
            Rule::mask_email(["email"]),
            Rule::mask_name(["name"]),
            Rule::mask_card_and_phone(["phone"]),
            Rule::mask_url(["url"]),
        ])
        .unwrap();
        for key in ["password", "email", "name", "phone", "url"] {
            assert_eq!(conv.hide(key, ""), "", "key {:?}", key);
        }
    }

    #[test]
    fn duplicate_field_fails_at_build_time() {
        let err = Converter::new(vec![
            Rule::full_exclusion(["token", "login"]),
            Rule::mask_name(["login"]),
        ])
        .unwrap_err();
        match err {
            MaskError::DuplicateField { field } => assert_eq!(field, "login"),
            other => panic!("expected DuplicateField, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_within_one_rule_also_fails() {
        let err = Converter::new(vec![Rule::full_exclusion(["token", "token"])]).unwrap_err();
        assert!(matches!(err, MaskError::DuplicateField { .. }));
    }

    #[test]
    fn len_counts_fields_not_rules() {
        let conv = Converter::new(vec![Rule::full_exclusion(["a", "b", "c"])]).unwrap();
        assert_eq!(conv.len(), 3);
        assert!(!conv.is_empty());
        assert!(Converter::default().is_empty());
    }

    #[test]
    fn rule_accessors() {
        let rule = Rule::mask_email(["email", "contact"]);
        assert_eq!(rule.transform(), Transform::MaskEmail);
        assert_eq!(rule.fields(), ["email", "contact"]);
    }
}
