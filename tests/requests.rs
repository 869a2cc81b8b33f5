mod common;

use common::{harness, immediate, issued, number, page, param, with_keywords};
use list_search::{Dispatch, FetchError, Initial, ListEvent, Options, Validation, ValidationGate, Value};

#[test]
fn latest_request_wins() {
	let mut h = harness(Options::default(), with_keywords(""), "");
	assert_eq!(h.list.mount(), Dispatch::Idle);

	assert!(matches!(h.list.set_parameter("keywords", "a"), Dispatch::Scheduled(_)));
	let first = issued(h.elapse());
	assert!(matches!(h.list.set_parameter("keywords", "ab"), Dispatch::Scheduled(_)));
	let second = issued(h.elapse());
	assert_eq!(*h.transport.aborted.borrow(), [first]);

	h.list.resolve(first, Ok(page(vec![100], 10, 0, Some(1))));
	assert!(h.list.result().items().is_empty());
	assert!(h.list.is_loading());

	h.list.resolve(second, Ok(page(vec![1, 2], 10, 0, Some(2))));
	assert_eq!(h.list.result().items(), [1, 2]);
	assert!(!h.list.is_loading());

	// Late duplicates change nothing either.
	h.list.resolve(first, Ok(page(vec![100], 10, 0, Some(1))));
	assert_eq!(h.list.result().items(), [1, 2]);
}

#[test]
fn debounce_coalesces_bursts() {
	let mut h = harness(Options::default(), with_keywords(""), "");
	h.list.mount();

	let ids: Vec<_> = ["s", "sh", "sho", "shoe"]
		.iter()
		.map(|keywords| match h.list.set_parameter("keywords", *keywords) {
			Dispatch::Scheduled(id) => id,
			other => panic!("Expected a scheduled search, got {:?}", other),
		})
		.collect();
	assert_eq!(*h.timer.cancelled.borrow(), ids[..3]);
	assert_eq!(h.transport.count(), 0);
	assert!(h.list.is_search_pending());

	assert_eq!(h.list.timer_elapsed(ids[0]), Dispatch::Idle);
	assert_eq!(h.transport.count(), 0);

	issued(h.list.timer_elapsed(ids[3]));
	assert_eq!(h.transport.count(), 1);
	assert_eq!(param(&h.transport.last(), "keywords").as_deref(), Some("shoe"));
	assert!(!h.list.is_search_pending());
}

#[test]
fn submit_skips_the_debounce() {
	let mut h = harness(Options::default(), with_keywords(""), "");
	h.list.mount();

	h.list.set_parameter("keywords", "a");
	issued(h.list.submit());
	assert!(!h.list.is_search_pending());
	assert_eq!(*h.timer.armed.borrow(), None);
	assert_eq!(h.transport.count(), 1);
}

#[test]
fn live_search_waits_for_the_first_immediate_fetch() {
	let mut h = harness(immediate(), with_keywords(""), "");
	issued(h.list.mount());
	assert!(!h.list.live_search_enabled());
	assert_eq!(h.list.set_parameter("keywords", "a"), Dispatch::Idle);

	h.serve(3);
	assert!(h.list.live_search_enabled());
	assert!(matches!(h.list.set_parameter("keywords", "ab"), Dispatch::Scheduled(_)));
}

#[test]
fn live_search_can_be_disabled() {
	let mut h = harness(
		Options {
			live_search: false,
			..Options::default()
		},
		with_keywords(""),
		"",
	);
	h.list.mount();
	assert_eq!(h.list.set_parameter("keywords", "a"), Dispatch::Idle);
	issued(h.list.submit());
}

#[test]
fn total_change_triggers_exactly_one_refetch() {
	let mut h = harness(immediate(), Initial::default(), "");
	h.list.mount();
	h.serve(25);
	assert_eq!(h.list.result().items(), (0..10).collect::<Vec<_>>().as_slice());

	let append = issued(h.list.more(false));
	assert_eq!(number(&h.transport.last(), "offset"), 10);
	h.list.resolve(append, Ok(page(10..20, 10, 10, Some(30))));

	assert_eq!(h.transport.count(), 3);
	let refetch = h.transport.last();
	assert_eq!(number(&refetch, "limit"), 10);
	assert_eq!(number(&refetch, "offset"), 0);
	assert_eq!(h.list.result().items().len(), 10, "The appended page must not be applied.");
	assert!(h.list.is_loading());

	// The refetch doesn't refetch again, even if the total moved once more.
	h.list.resolve(refetch.token, Ok(page(0..10, 10, 0, Some(31))));
	assert_eq!(h.transport.count(), 3);
	assert_eq!(h.list.result().pagination().total, Some(31));
	assert_eq!(h.list.result().items(), (0..10).collect::<Vec<_>>().as_slice());
	assert!(!h.list.is_loading());
}

#[test]
fn submitting_supersedes_the_refetch() {
	let mut h = harness(immediate(), Initial::default(), "");
	h.list.mount();
	h.serve(25);
	let append = issued(h.list.more(false));
	h.list.resolve(append, Ok(page(10..20, 10, 10, Some(30))));
	let refetch = h.transport.last();

	let clean = issued(h.list.submit());
	assert_ne!(clean, refetch.token);
	assert_eq!(h.transport.aborted.borrow().last(), Some(&refetch.token));

	h.list.resolve(refetch.token, Ok(page(100..110, 10, 0, Some(30))));
	assert_eq!(h.list.result().items(), (0..10).collect::<Vec<_>>().as_slice());
	assert!(h.list.is_loading());

	h.serve(30);
	assert_eq!(h.transport.count(), 4);
	assert_eq!(h.list.result().pagination().total, Some(30));
	assert!(!h.list.is_loading());
}

#[test]
fn head_of_sequence_requests_never_refetch() {
	let mut h = harness(immediate(), Initial::default(), "");
	h.list.mount();
	h.serve(25);

	h.list.toggle_facet_value("color", "red");
	issued(h.elapse());
	h.serve(3);

	assert_eq!(h.transport.count(), 2);
	assert_eq!(h.list.result().pagination().total, Some(3));
	assert_eq!(h.list.result().items(), [0, 1, 2]);
}

#[test]
fn exemptions_are_configurable() {
	let mut h = harness(
		Options {
			immediate: true,
			refetch_exempt: Vec::new(),
			..Options::default()
		},
		Initial::default(),
		"",
	);
	h.list.mount();
	h.serve(25);

	h.list.toggle_facet_value("color", "red");
	issued(h.elapse());
	h.serve(3);
	assert_eq!(h.transport.count(), 3);
}

#[test]
fn failures_keep_the_previous_result() {
	let mut h = harness(immediate(), Initial::default(), "");
	h.list.mount();
	h.serve(25);
	h.take_events();

	let append = issued(h.list.more(false));
	h.list.resolve(append, Err(FetchError::Status(500)));

	assert_eq!(h.list.result().items().len(), 10);
	assert!(!h.list.is_loading());
	assert_eq!(h.take_events(), [ListEvent::LoadingBegan, ListEvent::LoadingEnded, ListEvent::Failed(FetchError::Status(500))]);
}

#[test]
fn cancellation_is_silent() {
	let mut h = harness(immediate(), Initial::default(), "");
	let token = issued(h.list.mount());
	h.list.resolve(token, Err(FetchError::Cancelled));

	assert!(!h.list.is_loading());
	assert_eq!(h.take_events(), [ListEvent::LoadingBegan, ListEvent::LoadingEnded]);
}

#[test]
fn events_follow_a_fetch() {
	let mut h = harness(immediate(), Initial::default(), "");
	h.list.mount();
	h.serve(4);

	assert_eq!(
		h.take_events(),
		[ListEvent::LoadingBegan, ListEvent::LoadingEnded, ListEvent::ResultChanged, ListEvent::ItemCountChanged(4)]
	);
}

#[test]
fn invalid_queries_are_not_sent() {
	let options = Options {
		validation: Validation::NonEmpty("keywords".to_owned()),
		..Options::default()
	};
	let mut h = harness(options, with_keywords(""), "");
	h.list.mount();

	assert!(!h.list.is_valid());
	assert_eq!(h.list.submit(), Dispatch::Rejected);
	assert_eq!(h.transport.count(), 0);

	h.list.set_parameter("keywords", "a");
	issued(h.elapse());
	h.serve(5);
	assert_eq!(h.list.result().items().len(), 5);
	assert_eq!(h.location.current(), "keywords=a&limit=10&offset=0");

	h.list.set_parameter("keywords", "ab");
	let pending = issued(h.elapse());
	assert_eq!(h.list.set_parameter("keywords", ""), Dispatch::Rejected);

	assert_eq!(h.transport.aborted.borrow().last(), Some(&pending));
	assert!(!h.list.is_loading());
	assert!(!h.list.is_search_pending());
	assert!(h.list.result().items().is_empty());
	assert_eq!(h.location.current(), "");
	assert_eq!(h.list.query().parameters().get("keywords"), Some(&Value::from("")), "Edits are kept.");
}

#[test]
fn custom_validators_see_the_whole_query() {
	let mut h = harness(immediate(), Initial::default(), "");
	h.list = h.list.with_validator(ValidationGate::new(|query| query.get("color").map_or(false, |color| !color.is_empty())));

	assert_eq!(h.list.mount(), Dispatch::Rejected);
	assert_eq!(h.list.set_facet("color", vec!["red".to_owned()]), Dispatch::Idle, "Live search starts after the first fetch.");
	issued(h.list.submit());
}

#[test]
fn parameter_transform_only_affects_the_wire() {
	let mut h = harness(immediate(), with_keywords("a"), "");
	h.list = h.list.with_param_transform(|mut params| {
		params.insert("culture", "en-US");
		params
	});
	h.list.mount();

	assert_eq!(param(&h.transport.last(), "culture").as_deref(), Some("en-US"));
	h.serve(1);
	assert_eq!(h.location.current(), "keywords=a&limit=10&offset=0");
}

#[test]
fn result_transform_runs_before_reconciliation() {
	let mut h = harness(immediate(), Initial::default(), "");
	h.list = h.list.with_result_transform(|mut page| {
		page.items.retain(|item| item % 2 == 0);
		page
	});
	h.list.mount();
	h.serve(6);
	assert_eq!(h.list.result().items(), [0, 2, 4]);
}

#[test]
fn cancel_drops_everything_pending() {
	let mut h = harness(Options::default(), with_keywords(""), "");
	h.list.mount();
	h.list.set_parameter("keywords", "a");
	let token = issued(h.elapse());
	h.list.set_parameter("keywords", "ab");

	h.list.cancel();
	assert!(!h.list.is_loading());
	assert!(!h.list.is_search_pending());
	assert_eq!(*h.transport.aborted.borrow(), [token]);

	h.list.resolve(token, Ok(page(vec![1], 10, 0, Some(1))));
	assert!(h.list.result().items().is_empty());
}
