//! Search Engine.
//!
//! `find-init` copies a template into the session and resets the cursor;
//! `find` advances the cursor and matches object attributes against it;
//! `find-final` drops the template copy. State lives on [`Session`]
//! itself (`search_cursor`, `search_template`) since at most one search
//! is active per session, mirroring the operation state machine's
//! single-slot approach.

use crate::attribute::TemplateAttribute;
use crate::error::BridgeError;
use crate::session::Session;

/// Begin a search: deep-copy `template` into the session and reset the
/// cursor to the start of its bound object list. A second `find-init`
/// without an intervening `find-final` simply replaces the template and
/// cursor, matching this bridge's single-active-search model.
pub fn find_init(session: &mut Session, template: Vec<TemplateAttribute>) {
    session.search_template = Some(template);
    session.search_cursor = 0;
}

/// An object matches the template iff every template attribute is
/// present on the object with an equal length and equal value bytes.
/// A template attribute carrying `None` (a null value pointer) only
/// matches an object attribute that is itself absent a value; since
/// every object attribute in this store carries a concrete byte value,
/// a `None` template entry never matches here. An empty template
/// matches every object.
fn object_matches(session: &Session, object_index: usize, template: &[TemplateAttribute]) -> bool {
    let object = &session.objects[object_index];
    template.iter().all(|want| match object.attributes.get(want.kind) {
        None => false,
        Some(attr) => match &want.value {
            None => false,
            Some(value) => &attr.value == value,
        },
    })
}

/// Advance the cursor over the session's bound object list, collecting
/// up to `max` matching handles. `max == 0` is rejected with
/// *arguments-bad* rather than silently returning nothing.
pub fn find(session: &mut Session, max: usize) -> Result<Vec<u64>, BridgeError> {
    if max == 0 {
        return Err(BridgeError::ArgumentsBad);
    }
    let template = session.search_template.clone().unwrap_or_default();
    let mut matches = Vec::new();
    while session.search_cursor < session.objects.len() && matches.len() < max {
        let index = session.search_cursor;
        session.search_cursor += 1;
        if object_matches(session, index, &template) {
            matches.push((index + 1) as u64);
        }
    }
    Ok(matches)
}

/// Release the template copy. The cursor is left as-is; a fresh
/// `find-init` always resets it regardless.
pub fn find_final(session: &mut Session) {
    session.search_template = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeStore};
    use crate::constants::{CKA_CLASS, CKA_LABEL, CKO_CERTIFICATE, CKO_PUBLIC_KEY};
    use crate::object::{Object, ObjectClass};
    use std::sync::Arc;

    fn sample_session() -> Session {
        let objects = vec![
            Object {
                owning_identity: Some(0),
                class: ObjectClass::Certificate,
                attributes: AttributeStore::new(vec![
                    Attribute::u64_attr(CKA_CLASS, CKO_CERTIFICATE),
                    Attribute::bytes_attr(CKA_LABEL, "Alice"),
                ]),
            },
            Object {
                owning_identity: Some(0),
                class: ObjectClass::PublicKey,
                attributes: AttributeStore::new(vec![
                    Attribute::u64_attr(CKA_CLASS, CKO_PUBLIC_KEY),
                    Attribute::bytes_attr(CKA_LABEL, "Alice"),
                ]),
            },
            Object {
                owning_identity: Some(1),
                class: ObjectClass::Certificate,
                attributes: AttributeStore::new(vec![
                    Attribute::u64_attr(CKA_CLASS, CKO_CERTIFICATE),
                    Attribute::bytes_attr(CKA_LABEL, "Bob"),
                ]),
            },
        ];
        Session::new(0, None, Arc::new(objects))
    }

    #[test]
    fn empty_template_matches_every_object() {
        let mut session = sample_session();
        find_init(&mut session, vec![]);
        let handles = find(&mut session, 10).unwrap();
        assert_eq!(handles, vec![1, 2, 3]);
    }

    #[test]
    fn template_narrows_to_matching_class() {
        let mut session = sample_session();
        find_init(
            &mut session,
            vec![TemplateAttribute {
                kind: CKA_CLASS,
                value: Some(CKO_CERTIFICATE.to_le_bytes().to_vec()),
            }],
        );
        let handles = find(&mut session, 10).unwrap();
        assert_eq!(handles, vec![1, 3]);
    }

    #[test]
    fn null_value_pointer_does_not_match_a_concrete_attribute_value() {
        let mut session = sample_session();
        find_init(
            &mut session,
            vec![TemplateAttribute {
                kind: CKA_LABEL,
                value: None,
            }],
        );
        let handles = find(&mut session, 10).unwrap();
        assert!(handles.is_empty());
    }

    #[test]
    fn find_is_resumable_across_calls() {
        let mut session = sample_session();
        find_init(&mut session, vec![]);
        let first = find(&mut session, 2).unwrap();
        assert_eq!(first, vec![1, 2]);
        let second = find(&mut session, 2).unwrap();
        assert_eq!(second, vec![3]);
        let third = find(&mut session, 2).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn zero_max_is_arguments_bad() {
        let mut session = sample_session();
        find_init(&mut session, vec![]);
        assert_eq!(find(&mut session, 0).unwrap_err(), BridgeError::ArgumentsBad);
    }

    #[test]
    fn find_final_drops_template_without_disturbing_cursor() {
        let mut session = sample_session();
        find_init(&mut session, vec![]);
        find(&mut session, 1).unwrap();
        find_final(&mut session);
        assert!(session.search_template.is_none());
        assert_eq!(session.search_cursor, 1);
    }
}
