//! Pure tag mutations over a property bag.
//!
//! These never touch storage. Callers persist the touched field with
//! [`Properties::patch_for`].

use crate::{PropertyKey, Properties, TagSet};

/// Add `value` to `key`.
///
/// Tag fields gain `value` unless already present. Scalar fields are
/// overwritten with it.
pub fn add_tag(properties: &Properties, key: PropertyKey, value: &str) -> Properties {
    let mut next = properties.clone();
    match key {
        PropertyKey::Tag(field) => {
            next.tags_mut(field).insert(value);
        }
        PropertyKey::Text(field) => next.set_text(field, Some(value.to_string())),
    }
    next
}

/// Remove `value` from `key`. No-op for scalar fields and absent values.
pub fn remove_tag(properties: &Properties, key: PropertyKey, value: &str) -> Properties {
    let mut next = properties.clone();
    if let PropertyKey::Tag(field) = key {
        next.tags_mut(field).remove(value);
    }
    next
}

/// Options from `options` that are not yet in `selected`, in option order.
pub fn available_options(options: &[String], selected: &TagSet) -> Vec<String> {
    options
        .iter()
        .filter(|option| !selected.contains(option))
        .cloned()
        .collect()
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::TagField;
    use proptest::prelude::*;

    fn arb_tag_field() -> impl Strategy<Value = TagField> {
        proptest::sample::select(TagField::ALL.to_vec())
    }

    fn arb_properties() -> impl Strategy<Value = Properties> {
        (
            proptest::collection::vec("[a-z]{1,6}", 0..4),
            proptest::collection::vec("[A-Z]{1,3}", 0..4),
            proptest::option::of("[a-z]{1,8}"),
        )
            .prop_map(|(audience, compliance, priority)| Properties {
                audience: audience.into(),
                compliance: compliance.into(),
                priority,
                ..Properties::default()
            })
    }

    proptest! {
        #[test]
        fn prop_add_tag_is_idempotent(
            props in arb_properties(),
            field in arb_tag_field(),
            value in "[a-zA-Z ]{1,12}"
        ) {
            let once = add_tag(&props, field.into(), &value);
            let twice = add_tag(&once, field.into(), &value);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_remove_inverts_add_of_new_value(
            props in arb_properties(),
            field in arb_tag_field(),
            value in "[a-zA-Z ]{1,12}"
        ) {
            prop_assume!(!props.tags(field).contains(&value));
            let added = add_tag(&props, field.into(), &value);
            prop_assert_eq!(remove_tag(&added, field.into(), &value), props);
        }
    }
}
