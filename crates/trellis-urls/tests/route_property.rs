//! Property-based tests for route matching and assembly.
//!
//! # Properties Tested
//!
//! - A segment value assembled into a path matches back to the same value
//! - An optional segment equal to its default is left out of the path and
//!   restored from the default on match
//! - A nested part route name assembles to a path that matches the same name
//! - Stack ordering is by descending priority, stable for equal priorities

use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use trellis_urls::{Literal, Params, Part, RouteStack, Segment};

// =============================================================================
// Strategy Definitions
// =============================================================================

/// Printable segment values, including characters that need escaping.
fn segment_value_strategy() -> impl Strategy<Value = String> {
	prop::string::string_regex("[a-zA-Z0-9 _.~%/?#-]{1,24}").expect("valid regex for segment value")
}

/// Two-letter locales; `en` is the route default.
fn locale_strategy() -> impl Strategy<Value = String> {
	prop_oneof![Just("en".to_string()), "[a-z]{2}"]
}

fn priorities_strategy() -> impl Strategy<Value = Vec<i32>> {
	prop::collection::vec(-3i32..3, 1..12)
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
	/// Property: assembling then matching a segment route returns the value.
	#[test]
	fn test_segment_value_survives_assembly(value in segment_value_strategy()) {
		let mut router = RouteStack::new();
		router.add_route("item", Segment::new("/items/:id").unwrap());
		let mut params = Params::new();
		params.insert("id".into(), json!(value.clone()));

		let url = router.assemble("item", &params).unwrap();
		let m = router.match_path(&url).unwrap();

		prop_assert_eq!(m.param("id"), Some(&json!(value)));
	}

	/// Property: optional segments are omitted when they hold the default.
	#[test]
	fn test_optional_segment_default_round_trip(
		name in "[a-z]{1,12}",
		locale in locale_strategy(),
	) {
		let mut defaults = Params::new();
		defaults.insert("locale".into(), json!("en"));
		let mut router = RouteStack::new();
		router.add_route(
			"page",
			Segment::with_options("/page/:name[/:locale]", HashMap::new(), defaults).unwrap(),
		);
		let mut params = Params::new();
		params.insert("name".into(), json!(name.clone()));
		params.insert("locale".into(), json!(locale.clone()));

		let url = router.assemble("page", &params).unwrap();
		let m = router.match_path(&url).unwrap();

		prop_assert_eq!(url == format!("/page/{name}"), locale == "en");
		prop_assert_eq!(m.param("name"), Some(&json!(name)));
		prop_assert_eq!(m.param("locale"), Some(&json!(locale)));
	}

	/// Property: a nested route name survives assembly and matching.
	#[test]
	fn test_nested_part_name_round_trip(
		slug in segment_value_strategy(),
		terminate in any::<bool>(),
	) {
		let mut comments = RouteStack::new();
		comments.add_route("comments", Literal::new("/comments"));
		let mut posts = RouteStack::new();
		posts.add_route("post", Part::new(Segment::new("/:slug").unwrap(), true, comments));
		let mut router = RouteStack::new();
		router.add_route("blog", Part::new(Literal::new("/blog"), terminate, posts));
		let mut params = Params::new();
		params.insert("slug".into(), json!(slug.clone()));

		for name in ["blog/post", "blog/post/comments"] {
			let url = router.assemble(name, &params).unwrap();
			let m = router.match_path(&url).unwrap();

			prop_assert_eq!(m.matched_route_name(), Some(name));
			prop_assert_eq!(m.param("slug"), Some(&json!(slug.clone())));
			prop_assert_eq!(m.length(), url.len());
		}
	}

	/// Property: names come out sorted by priority, ties in insertion order.
	#[test]
	fn test_stack_order_is_stable_priority_sort(priorities in priorities_strategy()) {
		let mut router = RouteStack::new();
		for (i, priority) in priorities.iter().enumerate() {
			router.add_route_with_priority(format!("r{i}"), Literal::new("/"), *priority);
		}

		let mut expected: Vec<(usize, i32)> = priorities.iter().copied().enumerate().collect();
		expected.sort_by(|a, b| b.1.cmp(&a.1));
		let expected: Vec<String> = expected.into_iter().map(|(i, _)| format!("r{i}")).collect();

		prop_assert_eq!(router.names(), expected);
	}
}
