use gantry::http::{header, Body, Method, StatusCode};
use gantry::{endpoint_fn, Config, Context, Endpoint, Gantry, Rejection, RouteError, Router};

fn request(method: Method, uri: &str) -> http::Request<Body> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> http::Request<Body> {
    request(Method::GET, uri)
}

async fn named(cx: &mut Context) -> Result<(), Rejection> {
    let body = match cx.param("name") {
        Some(name) => format!("speaker {}", name),
        None => "all speakers".to_owned(),
    };
    cx.send(body)?;
    Ok(())
}

async fn fixed(cx: &mut Context) -> Result<(), Rejection> {
    cx.send("fixed")?;
    Ok(())
}

async fn fallback(cx: &mut Context) -> Result<(), Rejection> {
    cx.send((StatusCode::NOT_FOUND, "custom not found"))?;
    Ok(())
}

fn named_endpoint() -> impl Endpoint {
    endpoint_fn(|cx| Box::pin(named(cx)))
}

fn fixed_endpoint() -> impl Endpoint {
    endpoint_fn(|cx| Box::pin(fixed(cx)))
}

#[tokio::test]
async fn first_registered_route_wins() {
    let app = Gantry::new()
        .get("/speakers/:name", named_endpoint())
        .unwrap()
        .get("/speakers/alice", fixed_endpoint())
        .unwrap()
        .build();

    let res = app.dispatch(get("/speakers/alice")).await;
    assert_eq!(&res.body()[..], b"speaker alice");

    let app = Gantry::new()
        .get("/speakers/alice", fixed_endpoint())
        .unwrap()
        .get("/speakers/:name", named_endpoint())
        .unwrap()
        .build();

    let res = app.dispatch(get("/speakers/alice")).await;
    assert_eq!(&res.body()[..], b"fixed");

    let res = app.dispatch(get("/speakers/bob")).await;
    assert_eq!(&res.body()[..], b"speaker bob");
}

#[tokio::test]
async fn optional_trailing_segments() {
    let app = Gantry::new()
        .get("/speakers/:name?", named_endpoint())
        .unwrap()
        .build();

    for (path, expected) in [
        ("/speakers", "all speakers"),
        ("/speakers/", "all speakers"),
        ("/speakers/hilda", "speaker hilda"),
        ("/speakers/hilda/", "speaker hilda"),
    ] {
        let res = app.dispatch(get(path)).await;
        assert_eq!(res.status(), StatusCode::OK, "{}", path);
        assert_eq!(&res.body()[..], expected.as_bytes(), "{}", path);
    }

    let res = app.dispatch(get("/speakers/hilda/talks")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn parameters_are_percent_decoded() {
    let app = Gantry::new()
        .get("/speakers/:name", named_endpoint())
        .unwrap()
        .build();

    let res = app.dispatch(get("/speakers/j%C3%BCrgen%20k")).await;
    assert_eq!(res.body()[..], *"speaker jürgen k".as_bytes());
}

#[tokio::test]
async fn methods_must_match() {
    let app = Gantry::new()
        .post("/feedback", fixed_endpoint())
        .unwrap()
        .build();

    let res = app.dispatch(get("/feedback")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.dispatch(request(Method::POST, "/feedback")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unmatched_requests_fall_through() {
    let app = Gantry::new()
        .get("/", fixed_endpoint())
        .unwrap()
        .wrap(gantry::middleware_fn(|cx, _| Box::pin(fallback(cx))))
        .build();

    let res = app.dispatch(get("/missing")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(&res.body()[..], b"custom not found");
}

#[tokio::test]
async fn method_not_allowed() {
    let config = Config {
        method_not_allowed: true,
        ..Config::default()
    };

    let app = Gantry::new()
        .configure(config)
        .get("/feedback", fixed_endpoint())
        .unwrap()
        .put("/feedback", fixed_endpoint())
        .unwrap()
        .build();

    let res = app.dispatch(request(Method::DELETE, "/feedback")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()[header::ALLOW], "GET, PUT");

    let res = app.dispatch(request(Method::DELETE, "/other")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configure_applies_to_routes_not_yet_mounted() {
    let config = Config {
        method_not_allowed: true,
        ..Config::default()
    };

    let app = Gantry::new()
        .get("/feedback", fixed_endpoint())
        .unwrap()
        .configure(config)
        .build();

    let res = app.dispatch(request(Method::PUT, "/feedback")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()[header::ALLOW], "GET");
}

#[tokio::test]
async fn later_routers_handle_other_methods() {
    let config = Config {
        method_not_allowed: true,
        ..Config::default()
    };

    let app = Gantry::new()
        .configure(config)
        .get("/feedback", fixed_endpoint())
        .unwrap()
        .wrap(gantry::middleware_fn(|cx, next| {
            Box::pin(async move {
                next.run(cx).await;
                Ok(())
            })
        }))
        .post("/feedback", fixed_endpoint())
        .unwrap()
        .build();

    let res = app.dispatch(request(Method::POST, "/feedback")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(&res.body()[..], b"fixed");

    let res = app.dispatch(request(Method::DELETE, "/feedback")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()[header::ALLOW], "GET, POST");
}

#[tokio::test]
async fn fallbacks_run_before_method_not_allowed() {
    let config = Config {
        method_not_allowed: true,
        ..Config::default()
    };

    let app = Gantry::new()
        .configure(config)
        .get("/feedback", fixed_endpoint())
        .unwrap()
        .wrap(gantry::middleware_fn(|cx, _| Box::pin(fallback(cx))))
        .build();

    let res = app.dispatch(request(Method::DELETE, "/feedback")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(&res.body()[..], b"custom not found");
    assert!(res.headers().get(header::ALLOW).is_none());
}

#[tokio::test]
async fn nest_paths_without_a_leading_slash() {
    let speakers = Router::new()
        .get("/", fixed_endpoint())
        .unwrap()
        .get("/:name", named_endpoint())
        .unwrap();

    let app = Gantry::new().nest("speakers/", speakers).build();

    let res = app.dispatch(get("/speakers")).await;
    assert_eq!(&res.body()[..], b"fixed");

    let res = app.dispatch(get("/speakers/lorenzo")).await;
    assert_eq!(&res.body()[..], b"speaker lorenzo");

    let res = app.dispatch(get("/speakersx")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nested_routers() {
    let speakers = Router::new()
        .get("/", fixed_endpoint())
        .unwrap()
        .get("/:name", named_endpoint())
        .unwrap();

    let app = Gantry::new().nest("/speakers", speakers).build();

    let res = app.dispatch(get("/speakers")).await;
    assert_eq!(&res.body()[..], b"fixed");

    let res = app.dispatch(get("/speakers/lorenzo")).await;
    assert_eq!(&res.body()[..], b"speaker lorenzo");

    let res = app.dispatch(get("/lorenzo")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn match_route() {
    let router = Router::new()
        .get("/speakers/:name?", named_endpoint())
        .unwrap()
        .post("/speakers/:name", fixed_endpoint())
        .unwrap();

    let matched = router.match_route(&Method::GET, "/speakers/alice").unwrap();
    assert_eq!(matched.pattern.as_str(), "/speakers/:name?");
    assert_eq!(matched.params.get("name"), Some("alice"));

    let matched = router.match_route(&Method::GET, "/speakers").unwrap();
    assert!(matched.params.get("name").is_none());

    assert!(router.match_route(&Method::POST, "/speakers").is_none());
    assert!(router.match_route(&Method::PUT, "/speakers/alice").is_none());
    assert!(router.match_route(&Method::GET, "/talks").is_none());

    assert_eq!(
        router.allowed_methods("/speakers/alice"),
        [Method::GET, Method::POST]
    );
}

#[test]
fn malformed_patterns_are_rejected() {
    let route = |pattern: &str| Router::new().get(pattern, fixed_endpoint()).err();

    assert!(matches!(
        route("/a/:x?/:y?"),
        Some(RouteError::MultipleOptional(_))
    ));
    assert!(matches!(
        route("/a/:x?/b"),
        Some(RouteError::OptionalNotTrailing { .. })
    ));
    assert!(matches!(
        route("/a/:x/:x"),
        Some(RouteError::DuplicateParam { .. })
    ));
    assert!(matches!(route("/a/:"), Some(RouteError::EmptyParam(_))));
    assert!(matches!(route("a"), Some(RouteError::MissingSlash(_))));
    assert!(route("/a/:x/b/:y?").is_none());
}
