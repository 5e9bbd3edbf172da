//! Structural invariants of a parsed session.

use crate::core::model::{MAX_GROUP_SECONDS, MIN_GROUP_SECONDS, Session, Span};

/// Check the invariants every parsed session must satisfy:
/// - At least one group
/// - Every group has `item_count >= 1` and a non-empty name
/// - `seconds` within `[1, 86400]`
/// - Groups tile the item sequence contiguously and in order
/// - Every span lies inside the buffer and items are non-empty
pub fn validate_invariants(session: &Session) -> Vec<String> {
    let mut errors = Vec::new();
    let buffer_len = session.buffer().len();

    if session.group_count() == 0 {
        errors.push("session has no groups".to_string());
    }

    let mut next_item = 0usize;
    for (index, group) in session.groups().iter().enumerate() {
        if group.item_count == 0 {
            errors.push(format!("group {index}: no items"));
        }
        if !(MIN_GROUP_SECONDS..=MAX_GROUP_SECONDS).contains(&group.seconds) {
            errors.push(format!("group {index}: seconds {} out of range", group.seconds));
        }
        if group.item_start as usize != next_item {
            errors.push(format!(
                "group {index}: item_start {} expected {}",
                group.item_start, next_item
            ));
        }
        if group.name.length == 0 || !in_bounds(group.name, buffer_len) {
            errors.push(format!("group {index}: name span out of bounds"));
        }
        next_item = group.item_start as usize + group.item_count as usize;
    }

    if next_item != session.item_count() {
        errors.push(format!(
            "groups cover {} items but session has {}",
            next_item,
            session.item_count()
        ));
    }

    for (index, item) in session.items().iter().enumerate() {
        if item.length == 0 {
            errors.push(format!("item {index}: empty"));
        }
        if !in_bounds(*item, buffer_len) {
            errors.push(format!("item {index}: span out of bounds"));
        }
    }

    errors
}

fn in_bounds(span: Span, buffer_len: usize) -> bool {
    span.offset as usize + span.length as usize <= buffer_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_empty_groups_and_bad_spans() {
        let mut session = Session::with_buffer(b"[A|1]".to_vec());
        session.push_group(Span { offset: 1, length: 1 }, 1);
        session.push_group(Span { offset: 1, length: 1 }, 90_000);
        session.push_item(Span { offset: 3, length: 10 });

        let errors = validate_invariants(&session);
        assert!(errors.iter().any(|err| err == "group 0: no items"));
        assert!(errors.iter().any(|err| err.contains("seconds 90000")));
        assert!(errors.iter().any(|err| err == "item 0: span out of bounds"));
    }

    #[test]
    fn empty_session_is_invalid() {
        let session = Session::with_buffer(Vec::new());
        assert_eq!(validate_invariants(&session), vec!["session has no groups"]);
    }
}
