use std::sync::Arc;

use http::Method;

use super::{Collection, Engine, RedirectType, Resolution};
use crate::dispatcher::ControllerResolver;

fn engine(build: impl FnOnce(&mut Collection)) -> Engine {
    let mut collection = Collection::default();
    build(&mut collection);
    Engine::new(collection, Arc::new(ControllerResolver::new()))
}

fn dispatched(resolution: &Resolution) -> (&str, Vec<(&str, &str)>) {
    match resolution {
        Resolution::Dispatch { action, params, .. } => (
            action.as_str(),
            params.iter().map(|(k, v)| (k.as_ref(), v.as_str())).collect(),
        ),
        other => panic!("expected dispatch, got {other}"),
    }
}

#[test]
fn test_literal_route_matches_only_itself() {
    let e = engine(|c| {
        c.link("/", "/about", "Pages::about".parse().unwrap()).unwrap();
    });
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/about")).0, "Pages::about");
    assert_eq!(e.resolve(&Method::GET, "/about/x"), Resolution::Handle { status: 404 });
    assert_eq!(e.resolve(&Method::GET, "/abou"), Resolution::Handle { status: 404 });
}

#[test]
fn test_first_registered_wins() {
    let e = engine(|c| {
        c.link("/", "/users/:id", "Users::first".parse().unwrap()).unwrap();
        c.link("/", "/users/:id", "Users::second".parse().unwrap()).unwrap();
    });
    let r = e.resolve(&Method::GET, "/users/1");
    assert_eq!(dispatched(&r).0, "Users::first");
    assert!(matches!(r, Resolution::Dispatch { index: 0, .. }));
}

#[test]
fn test_restless_toggle() {
    let mut e = engine(|c| {
        c.link("/", "/p", "Pages::p".parse().unwrap()).unwrap();
        c.link("/", "/q/", "Pages::q".parse().unwrap()).unwrap();
    });
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/p/")).0, "Pages::p");
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/q")).0, "Pages::q");

    e.set_restless(false);
    assert_eq!(e.resolve(&Method::GET, "/p/"), Resolution::Handle { status: 404 });
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/p")).0, "Pages::p");
}

#[test]
fn test_root_is_never_toggled() {
    let e = engine(|c| {
        c.link("/", "/x/", "Pages::x".parse().unwrap()).unwrap();
    });
    assert_eq!(e.resolve(&Method::GET, "/"), Resolution::Handle { status: 404 });
}

#[test]
fn test_link_beats_redirect() {
    let e = engine(|c| {
        c.redirect("/", "/old", "/new", RedirectType::Permanent).unwrap();
        c.link("/", "/old", "Legacy::show".parse().unwrap()).unwrap();
    });
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/old")).0, "Legacy::show");
}

#[test]
fn test_redirect_joins_base_url() {
    let e = engine(|c| {
        c.redirect("/docs", "/v1/[*:page]", "/v2/:page", RedirectType::Temporary)
            .unwrap();
    });
    assert_eq!(
        e.resolve(&Method::GET, "/docs/v1/guide/intro"),
        Resolution::Redirect {
            location: "/docs/v2/guide/intro".to_string(),
            kind: RedirectType::Temporary,
        }
    );
}

#[test]
fn test_method_mismatch_is_405() {
    let e = engine(|c| {
        c.link_with_methods("/", "/items", "Items::create".parse().unwrap(), Some(vec![Method::POST]))
            .unwrap();
    });
    assert_eq!(dispatched(&e.resolve(&Method::POST, "/items")).0, "Items::create");
    assert_eq!(e.resolve(&Method::GET, "/items"), Resolution::Handle { status: 405 });
}

#[test]
fn test_method_mismatch_beats_redirect() {
    let e = engine(|c| {
        c.link_with_methods("/", "/items", "Items::create".parse().unwrap(), Some(vec![Method::POST]))
            .unwrap();
        c.redirect("/", "/items", "/catalog", RedirectType::Permanent).unwrap();
    });
    assert_eq!(e.resolve(&Method::GET, "/items"), Resolution::Handle { status: 405 });
    assert_eq!(dispatched(&e.resolve(&Method::POST, "/items")).0, "Items::create");
}

#[test]
fn test_strict_base_root_rejects_trailing_slash() {
    let mut e = engine(|c| {
        c.link("/admin", "/", "Admin::index".parse().unwrap()).unwrap();
    });
    e.set_restless(false);
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/admin")).0, "Admin::index");
    assert_eq!(e.resolve(&Method::GET, "/admin/"), Resolution::Handle { status: 404 });
}

#[test]
fn test_method_fallthrough_to_later_link() {
    let e = engine(|c| {
        c.link_with_methods("/", "/items", "Items::create".parse().unwrap(), Some(vec![Method::POST]))
            .unwrap();
        c.link_with_methods("/", "/items", "Items::list".parse().unwrap(), Some(vec![Method::GET]))
            .unwrap();
    });
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/items")).0, "Items::list");
    assert_eq!(dispatched(&e.resolve(&Method::HEAD, "/items")).0, "Items::list");
}

#[test]
fn test_default_status_is_configurable() {
    let mut e = engine(|_| {});
    e.set_default_status(410);
    assert_eq!(e.resolve(&Method::GET, "/gone"), Resolution::Handle { status: 410 });
}

#[test]
fn test_base_url_scoping() {
    let e = engine(|c| {
        c.link("/admin", "/", "Admin::index".parse().unwrap()).unwrap();
        c.link("/admin", "/users/[+:id]", "Admin::user".parse().unwrap()).unwrap();
    });
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/admin")).0, "Admin::index");
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/admin/")).0, "Admin::index");
    assert_eq!(
        dispatched(&e.resolve(&Method::GET, "/admin/users/7")).1,
        vec![("id", "7")]
    );
    assert_eq!(e.resolve(&Method::GET, "/users/7"), Resolution::Handle { status: 404 });
}

#[test]
fn test_replace_collection() {
    let e = engine(|c| {
        c.link("/", "/a", "A::a".parse().unwrap()).unwrap();
    });
    let mut next = Collection::default();
    next.link("/", "/b", "B::b".parse().unwrap()).unwrap();
    e.replace_collection(next);

    assert_eq!(e.resolve(&Method::GET, "/a"), Resolution::Handle { status: 404 });
    assert_eq!(dispatched(&e.resolve(&Method::GET, "/b")).0, "B::b");
}
