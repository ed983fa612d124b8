use proptest::prelude::*;

use super::*;

fn spans(cs: &ChangeSet) -> Vec<(CharIdx, CharIdx, CharIdx, CharIdx)> {
	let mut out = Vec::new();
	cs.for_each_change(|a, b, c, d| out.push((a, b, c, d)));
	out
}

#[test]
fn test_changeset_from_changes_apply() {
	let mut doc = Rope::from("hello world");
	let cs = ChangeSet::from_changes(
		doc.slice(..),
		[Change::delete(0, 5), Change::insert(6, "big ")],
	)
	.unwrap();
	assert_eq!(cs.len(), 11);
	cs.apply(&mut doc);
	assert_eq!(doc.to_string(), " big world");
	assert_eq!(cs.len_after(), 10);
}

#[test]
fn test_changeset_rejects_out_of_bounds() {
	let doc = Rope::from("abc");
	let err = ChangeSet::from_changes(doc.slice(..), [Change::delete(2, 9)]).unwrap_err();
	assert_eq!(err, TransactionError::OutOfBounds { from: 2, to: 9, len: 3 });
}

#[test]
fn test_changeset_rejects_overlap() {
	let doc = Rope::from("abcdef");
	let err = ChangeSet::from_changes(doc.slice(..), [Change::delete(2, 4), Change::delete(3, 5)])
		.unwrap_err();
	assert_eq!(err, TransactionError::Overlapping { at: 3 });
}

#[test]
fn test_for_each_change_insertion() {
	let doc = Rope::from("0123456789");
	let cs = ChangeSet::from_changes(doc.slice(..), [Change::insert(5, "abc")]).unwrap();
	assert_eq!(spans(&cs), vec![(5, 5, 5, 8)]);
}

#[test]
fn test_for_each_change_deletion() {
	let doc = Rope::from("0123456789");
	let cs = ChangeSet::from_changes(doc.slice(..), [Change::delete(5, 8)]).unwrap();
	assert_eq!(spans(&cs), vec![(5, 8, 5, 5)]);
}

#[test]
fn test_for_each_change_replacement_collapses() {
	let doc = Rope::from("0123456789");
	let cs = ChangeSet::from_changes(
		doc.slice(..),
		[Change {
			start: 2,
			end: 4,
			replacement: Some("xyz".into()),
		}],
	)
	.unwrap();
	assert_eq!(spans(&cs), vec![(2, 4, 2, 5)]);
}

#[test]
fn test_for_each_change_multiple_spans_in_order() {
	let doc = Rope::from("0123456789");
	let cs = ChangeSet::from_changes(doc.slice(..), [Change::delete(1, 2), Change::insert(7, "ab")])
		.unwrap();
	assert_eq!(spans(&cs), vec![(1, 2, 1, 1), (7, 7, 6, 8)]);
}

#[test]
fn test_for_each_change_identity_reports_nothing() {
	let doc = Rope::from("abc");
	assert!(spans(&ChangeSet::identity(doc.slice(..))).is_empty());
}

#[test]
fn test_invert_restores_document() {
	let original = Rope::from("hello world");
	let mut doc = original.clone();
	let cs = ChangeSet::from_changes(
		doc.slice(..),
		[Change {
			start: 0,
			end: 5,
			replacement: Some("goodbye".into()),
		}],
	)
	.unwrap();
	let inverse = cs.invert(&doc);
	cs.apply(&mut doc);
	assert_eq!(doc.to_string(), "goodbye world");
	inverse.apply(&mut doc);
	assert_eq!(doc, original);
}

#[test]
fn test_map_pos_bias() {
	let doc = Rope::from("hello");
	let cs = ChangeSet::from_changes(doc.slice(..), [Change::insert(2, "XX")]).unwrap();
	assert_eq!(cs.map_pos(2, Bias::Left), 2);
	assert_eq!(cs.map_pos(2, Bias::Right), 4);
	assert_eq!(cs.map_pos(4, Bias::Left), 6);
	assert_eq!(cs.map_pos(1, Bias::Right), 1);
}

#[test]
fn test_transaction_steps_and_selection() {
	let doc = Rope::from("hello");
	let mut tr = Transaction::new(&doc, 0);
	tr.set_selection(Selection::point(5));
	tr.insert(5, " world").unwrap().delete(0, 1).unwrap();
	assert_eq!(tr.doc().to_string(), "ello world");
	assert_eq!(tr.steps().len(), 2);
	assert!(tr.doc_changed());
	assert_eq!(tr.selection(), Some(Selection::point(10)));
	assert_eq!(tr.map_pos(5, Bias::Right), 10);
}

#[test]
fn test_transaction_step_length_mismatch() {
	let doc = Rope::from("hello");
	let other = Rope::from("hi");
	let mut tr = Transaction::new(&doc, 0);
	let err = tr.step(ChangeSet::identity(other.slice(..))).unwrap_err();
	assert_eq!(err, TransactionError::LengthMismatch { expected: 2, actual: 5 });
	assert!(tr.steps().is_empty());
}

#[test]
fn test_transaction_meta_only() {
	let key = MetaKey::unique();
	let doc = Rope::from("text");
	let mut tr = Transaction::new(&doc, 3);
	tr.set_meta(key, "tag").set_undo_policy(UndoPolicy::Skip);
	assert!(!tr.doc_changed());
	assert_eq!(tr.meta::<&str>(&key), Some(&"tag"));
	assert_eq!(tr.undo_policy(), UndoPolicy::Skip);
	assert_eq!(tr.base_version(), 3);
}

#[test]
fn test_transaction_ids_are_unique() {
	let doc = Rope::new();
	let a = Transaction::new(&doc, 0);
	let b = Transaction::new(&doc, 0);
	assert_ne!(a.id(), b.id());
}

/// Generates a random ASCII document of variable length.
fn arb_document() -> impl Strategy<Value = Rope> {
	"[ -~\n]{0,120}".prop_map(|s| Rope::from(s.as_str()))
}

/// Generates a document together with one valid change against it.
fn arb_doc_and_change() -> impl Strategy<Value = (Rope, Change)> {
	arb_document().prop_flat_map(|doc| {
		let len = doc.len_chars();
		(0..=len).prop_flat_map(move |start| {
			let doc = doc.clone();
			(start..=len, proptest::option::of("[a-z]{1,8}")).prop_map(move |(end, replacement)| {
				(
					doc.clone(),
					Change {
						start,
						end,
						replacement,
					},
				)
			})
		})
	})
}

proptest! {
	#[test]
	fn prop_invert_roundtrips((doc, change) in arb_doc_and_change()) {
		let cs = ChangeSet::from_changes(doc.slice(..), [change]).unwrap();
		let mut edited = doc.clone();
		let inverse = cs.invert(&doc);
		cs.apply(&mut edited);
		prop_assert_eq!(edited.len_chars(), cs.len_after());
		inverse.apply(&mut edited);
		prop_assert_eq!(edited, doc);
	}

	#[test]
	fn prop_reported_spans_fit_new_document((doc, change) in arb_doc_and_change()) {
		let cs = ChangeSet::from_changes(doc.slice(..), [change.clone()]).unwrap();
		let mut count = 0;
		cs.for_each_change(|old_from, old_to, new_from, new_to| {
			count += 1;
			assert_eq!(old_from, change.start);
			assert_eq!(old_to, change.end);
			assert!(new_from <= new_to && new_to <= cs.len_after());
		});
		let is_noop = change.start == change.end && change.replacement.is_none();
		prop_assert_eq!(count, usize::from(!is_noop));
	}
}
