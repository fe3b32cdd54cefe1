//! Integration tests for applications assembled from TOML configuration.

use rstest::{fixture, rstest};
use std::io::Write;
use trellis::prelude::*;

const CONFIG: &str = r#"
[router]
base_url = "/app"

[router.routes.home]
type = "literal"
route = "/"
defaults = { controller = "home", action = "index" }

[router.routes.shop]
type = "literal"
route = "/shop"
may_terminate = true
defaults = { __NAMESPACE__ = "shop", controller = "catalog", action = "index" }

[router.routes.shop.child_routes.item]
type = "segment"
route = "/item/:sku"
constraints = { sku = "[0-9]+" }
defaults = { action = "show" }

[controllers]
module_routes = true
aliases = { home = "site::Home" }

[logging]
level = "warn"
"#;

// ============================================================================
// Fixtures
// ============================================================================

#[fixture]
fn controllers() -> ControllerManager {
	let mut controllers = ControllerManager::new();
	controllers
		.register_controller(
			"site::Home",
			ActionController::new(()).action("index", |_, ctx| {
				let params = Params::from([("sku".to_string(), serde_json::json!(7))]);
				let url = ctx.url(Some("shop/item"), &params, false)?;
				Ok(ActionResult::Response(Response::ok().with_body(url)))
			}),
		)
		.register_controller(
			"shop::Catalog",
			ActionController::new(())
				.action("index", |_, _| Ok(ActionResult::Response(Response::ok().with_body("catalog"))))
				.action("show", |_, ctx| {
					let sku = ctx.param("sku").unwrap_or_default();
					Ok(ActionResult::Response(Response::ok().with_body(format!("item {sku}"))))
				}),
		);
	controllers
}

#[fixture]
fn app(controllers: ControllerManager) -> Application {
	let config = ApplicationConfig::from_toml_str(CONFIG).unwrap();
	trellis::logging::init(&config.logging).unwrap();
	config.build_application(controllers).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[rstest]
#[case("/app/shop", StatusCode::OK, "catalog")]
#[case("/app/shop/item/42", StatusCode::OK, "item 42")]
#[case("/app/", StatusCode::OK, "/app/shop/item/7")]
fn test_configured_routes_dispatch(
	app: Application,
	#[case] path: &str,
	#[case] status: StatusCode,
	#[case] body: &str,
) {
	// Act
	let response = app.run(Request::get(path).unwrap()).unwrap();

	// Assert
	assert_eq!(response.status, status);
	assert_eq!(response.body, body);
}

#[rstest]
#[case("/app/shop/item/abc")]
#[case("/shop")]
#[case("/app/blog")]
fn test_unmatched_paths_are_not_found(app: Application, #[case] path: &str) {
	let response = app.run(Request::get(path).unwrap()).unwrap();

	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
fn test_config_file_round_trip(controllers: ControllerManager) {
	// Arrange
	let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
	file.write_all(CONFIG.as_bytes()).unwrap();

	// Act
	let config = ApplicationConfig::from_file(file.path()).unwrap();
	let app = config.build_application(controllers).unwrap();

	// Assert
	let params = Params::from([("sku".to_string(), serde_json::json!("9"))]);
	assert_eq!(app.router().assemble("shop/item", &params).unwrap(), "/app/shop/item/9");
	assert!(app.controllers().has("home"));
}
