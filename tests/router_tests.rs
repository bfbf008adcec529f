use inkwell_routing::router::{RedirectType, Resolution};
use inkwell_routing::{AppConfig, Engine};

use http::Method;

mod common;
use common::fixtures::{resolver, ROUTES_YAML};

fn engine() -> Engine {
    let config = AppConfig::from_yaml_str(ROUTES_YAML).expect("failed to parse routes");
    Engine::from_config(&config, resolver()).expect("failed to compile routes")
}

fn assert_route_match(engine: &Engine, method: Method, path: &str, expected_action: &str) {
    let result = engine.resolve(&method, path);
    match &result {
        Resolution::Dispatch { action, .. } => {
            println!("✅ {} {} → {}", method, path, result);
            assert_eq!(
                action, expected_action,
                "Action mismatch for {} {}: expected '{}', got '{}'",
                method, path, expected_action, action
            );
        }
        other => {
            println!("❌ {} {} → {}", method, path, other);
            assert_eq!(
                expected_action, "<none>",
                "Expected route to match for {} {}",
                method, path
            );
        }
    }
}

fn params_of(resolution: &Resolution) -> Vec<(String, String)> {
    match resolution {
        Resolution::Dispatch { params, .. } => params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        other => panic!("expected dispatch, got {other}"),
    }
}

#[test]
fn test_router_user_by_id() {
    let engine = engine();
    assert_route_match(&engine, Method::GET, "/users/42", "UsersController::show");
    assert_eq!(
        params_of(&engine.resolve(&Method::GET, "/users/42")),
        vec![("id".to_string(), "42".to_string())]
    );
}

#[test]
fn test_router_post_only_link() {
    let engine = engine();
    assert_route_match(&engine, Method::POST, "/users", "UsersController::create");
    assert_eq!(
        engine.resolve(&Method::GET, "/users"),
        Resolution::Handle { status: 405 }
    );
}

#[test]
fn test_router_head_follows_get() {
    let engine = engine();
    assert_route_match(&engine, Method::HEAD, "/users/7", "UsersController::show");
}

#[test]
fn test_router_word_separator_in_literal() {
    let engine = engine();
    assert_route_match(&engine, Method::GET, "/user_profile/ada", "UsersController::profile");
    assert_route_match(&engine, Method::GET, "/user-profile/ada", "UsersController::profile");
    assert_route_match(
        &engine,
        Method::GET,
        "/user-profile/ada-lovelace",
        "UsersController::profile",
    );
}

#[test]
fn test_router_rest_parameter() {
    let engine = engine();
    let r = engine.resolve(&Method::GET, "/files/docs/2024/report.pdf");
    assert_eq!(
        params_of(&r),
        vec![("path".to_string(), "docs/2024/report.pdf".to_string())]
    );
}

#[test]
fn test_router_base_url_block() {
    let engine = engine();
    assert_route_match(&engine, Method::GET, "/admin", "AdminController::index");
    assert_route_match(&engine, Method::GET, "/admin/reports/2024", "AdminController::report");
    assert_route_match(&engine, Method::GET, "/admin/reports/twenty", "<none>");
}

#[test]
fn test_router_restless_trailing_slash() {
    let engine = engine();
    assert_route_match(&engine, Method::GET, "/users/42/", "UsersController::show");
    assert_eq!(
        params_of(&engine.resolve(&Method::GET, "/users/42/")),
        params_of(&engine.resolve(&Method::GET, "/users/42"))
    );
}

#[test]
fn test_router_strict_trailing_slash() {
    let mut config = AppConfig::from_yaml_str(ROUTES_YAML).unwrap();
    config.routing.restless = false;
    let engine = Engine::from_config(&config, resolver()).unwrap();
    assert_route_match(&engine, Method::GET, "/users/42", "UsersController::show");
    assert_route_match(&engine, Method::GET, "/users/42/", "<none>");
}

#[test]
fn test_router_redirects() {
    let engine = engine();
    assert_eq!(
        engine.resolve(&Method::GET, "/old"),
        Resolution::Redirect {
            location: "/new".to_string(),
            kind: RedirectType::Permanent,
        }
    );
    assert_eq!(
        engine.resolve(&Method::GET, "/legacy/users/5"),
        Resolution::Redirect {
            location: "/users/5".to_string(),
            kind: RedirectType::Permanent,
        }
    );
    assert_eq!(
        engine.resolve(&Method::GET, "/away"),
        Resolution::Redirect {
            location: "https://example.com/elsewhere".to_string(),
            kind: RedirectType::Found,
        }
    );
}

#[test]
fn test_router_unknown_path() {
    let engine = engine();
    assert_route_match(&engine, Method::GET, "/unknown", "<none>");
    assert_eq!(
        engine.resolve(&Method::GET, "/unknown"),
        Resolution::Handle { status: 404 }
    );
}

#[test]
fn test_router_reverse_routing() {
    let engine = engine();
    assert_eq!(
        engine.url_for("UsersController::show", [("id", "9")]).unwrap(),
        "/users/9"
    );
    assert_eq!(
        engine.url_for("AdminController::report", [("year", "2023")]).unwrap(),
        "/admin/reports/2023"
    );
    assert!(engine.url_for("AdminController::report", [("year", "x")]).is_err());
}

#[test]
fn test_router_toml_first_written_link_wins() {
    let toml = r#"
[[routes]]
base_url = "/"

[routes.links]
"/zeta/:x" = "Z::first"
"/alpha" = "A::show"
"/[!:any]/:y" = "Z::second"
"#;
    let file = common::temp_files::create_temp_config(toml, "toml");
    let config = inkwell_routing::load_config(file.path()).unwrap();
    let engine = Engine::from_config(&config, resolver()).unwrap();
    assert_route_match(&engine, Method::GET, "/zeta/1", "Z::first");
    assert_route_match(&engine, Method::GET, "/other/1", "Z::second");
}

#[test]
fn test_router_strict_base_root() {
    let mut config = AppConfig::from_yaml_str(ROUTES_YAML).unwrap();
    config.routing.restless = false;
    let engine = Engine::from_config(&config, resolver()).unwrap();
    assert_route_match(&engine, Method::GET, "/admin", "AdminController::index");
    assert_eq!(
        engine.resolve(&Method::GET, "/admin/"),
        Resolution::Handle { status: 404 }
    );
}
