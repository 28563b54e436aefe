use std::sync::{Arc, Mutex};
use std::time::Duration;

use gantry::http::{Body, StatusCode};
use gantry::{async_trait, endpoint_fn, Context, Gantry, Middleware, Next, Rejection};
use tokio::time::Instant;

type Log = Arc<Mutex<Vec<&'static str>>>;

fn get(uri: &str) -> http::Request<Body> {
    http::Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Never completes.
struct Hang;

#[async_trait]
impl Middleware for Hang {
    async fn call(&self, _: &mut Context, _: Next<'_>) -> Result<(), Rejection> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Returns without continuing or finalizing.
struct Stall;

#[async_trait]
impl Middleware for Stall {
    async fn call(&self, _: &mut Context, _: Next<'_>) -> Result<(), Rejection> {
        Ok(())
    }
}

/// Sleeps, then continues.
struct Delay(Duration);

#[async_trait]
impl Middleware for Delay {
    async fn call(&self, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection> {
        tokio::time::sleep(self.0).await;
        next.run(cx).await;
        Ok(())
    }
}

/// Sleeps, then responds.
struct Slow(Log, Duration);

#[async_trait]
impl Middleware for Slow {
    async fn call(&self, cx: &mut Context, _: Next<'_>) -> Result<(), Rejection> {
        self.0.lock().unwrap().push("started");
        tokio::time::sleep(self.1).await;
        self.0.lock().unwrap().push("finished");
        cx.send("slow")?;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn pending_units_time_out() {
    let app = Gantry::new()
        .hang_timeout(Duration::from_secs(5))
        .wrap(Hang)
        .build();

    let start = Instant::now();
    let res = app.dispatch(get("/")).await;

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(res.is_finalized());
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn stalled_chains_time_out() {
    let app = Gantry::new()
        .hang_timeout(Duration::from_secs(5))
        .wrap(Stall)
        .build();

    let start = Instant::now();
    let res = app.dispatch(get("/")).await;

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(res.body().is_empty());
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn progress_resets_the_hang_timer() {
    let log = Log::default();

    let app = Gantry::new()
        .hang_timeout(Duration::from_secs(5))
        .wrap(Delay(Duration::from_secs(4)))
        .wrap(Delay(Duration::from_secs(4)))
        .wrap(Slow(log.clone(), Duration::from_secs(4)))
        .build();

    let res = app.dispatch(get("/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(&res.body()[..], b"slow");
}

#[tokio::test(start_paused = true)]
async fn closed_connections_abandon_the_request() {
    let log = Log::default();

    let app = Gantry::new()
        .wrap(Slow(log.clone(), Duration::from_secs(1)))
        .build();

    let closed = tokio::time::sleep(Duration::from_millis(100));
    let res = app.dispatch_until(get("/"), closed).await;
    assert!(res.is_none());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(*log.lock().unwrap(), ["started"]);
}

#[tokio::test(start_paused = true)]
async fn open_connections_complete() {
    let log = Log::default();

    let app = Gantry::new()
        .wrap(Slow(log.clone(), Duration::from_secs(1)))
        .build();

    let res = app
        .dispatch_until(get("/"), std::future::pending())
        .await
        .unwrap();
    assert_eq!(&res.body()[..], b"slow");
    assert_eq!(*log.lock().unwrap(), ["started", "finished"]);
}

#[tokio::test(start_paused = true)]
async fn requests_are_independent() {
    let app = Gantry::new()
        .hang_timeout(Duration::from_secs(5))
        .wrap(gantry::middleware_fn(|cx, next| {
            Box::pin(async move {
                if cx.path() == "/hang" {
                    std::future::pending::<()>().await;
                }
                next.run(cx).await;
                Ok(())
            })
        }))
        .get("/fast", endpoint_fn(|cx| Box::pin(fast(cx))))
        .unwrap()
        .build();

    let (hung, fast) = tokio::join!(app.dispatch(get("/hang")), app.dispatch(get("/fast")));
    assert_eq!(hung.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(fast.status(), StatusCode::OK);
}

async fn fast(cx: &mut Context) -> Result<(), Rejection> {
    cx.send("fast")?;
    Ok(())
}

struct Catalog {
    talks: Vec<&'static str>,
}

impl Catalog {
    async fn count(&self) -> usize {
        tokio::task::yield_now().await;
        self.talks.len()
    }
}

/// Fills request locals from an injected service.
struct CountTalks;

#[async_trait]
impl Middleware for CountTalks {
    async fn call(&self, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection> {
        let count = match cx.state::<Catalog>() {
            Some(catalog) => catalog.count().await,
            None => 0,
        };

        cx.locals_mut().insert("talks", count);
        next.run(cx).await;
        Ok(())
    }
}

async fn talks(cx: &mut Context) -> Result<(), Rejection> {
    let talks = cx.locals().get("talks").cloned().unwrap_or_default();
    cx.send(format!("{} talks", talks))?;
    Ok(())
}

#[tokio::test]
async fn injected_state_fills_request_locals() {
    let app = Gantry::new()
        .inject(Catalog {
            talks: vec!["ownership", "lifetimes", "async"],
        })
        .wrap(CountTalks)
        .get("/talks", endpoint_fn(|cx| Box::pin(talks(cx))))
        .unwrap()
        .build();

    let res = app.dispatch(get("/talks")).await;
    assert_eq!(&res.body()[..], b"3 talks");
}

async fn search(cx: &mut Context) -> Result<(), Rejection> {
    let body = format!(
        "{}:{}",
        cx.query("q").unwrap_or("-"),
        cx.query("page").unwrap_or("1")
    );
    cx.send(body)?;
    Ok(())
}

#[tokio::test]
async fn query_parameters() {
    let app = Gantry::new()
        .get("/search", endpoint_fn(|cx| Box::pin(search(cx))))
        .unwrap()
        .build();

    let res = app.dispatch(get("/search?q=rust%20lang&page=2")).await;
    assert_eq!(&res.body()[..], b"rust lang:2");

    let res = app.dispatch(get("/search")).await;
    assert_eq!(&res.body()[..], b"-:1");
}

#[tokio::test]
async fn request_bodies_are_readable() {
    async fn echo(cx: &mut Context) -> Result<(), Rejection> {
        let body = cx
            .request_mut()
            .body_mut()
            .bytes()
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;
        cx.send(body)?;
        Ok(())
    }

    let app = Gantry::new()
        .post("/echo", endpoint_fn(|cx| Box::pin(echo(cx))))
        .unwrap()
        .build();

    let req = http::Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from("hello"))
        .unwrap();

    let res = app.dispatch(req).await;
    assert_eq!(&res.body()[..], b"hello");
    assert_eq!(
        res.headers()[http::header::CONTENT_TYPE],
        "application/octet-stream"
    );
}

#[tokio::test]
async fn responses_convert_to_http() {
    let app = Gantry::new()
        .get("/fast", endpoint_fn(|cx| Box::pin(fast(cx))))
        .unwrap()
        .build();

    let res = app.dispatch(get("/fast")).await.into_http();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(&res.body()[..], b"fast");
}

#[tokio::test]
async fn json_responses() {
    async fn status(cx: &mut Context) -> Result<(), Rejection> {
        let talks = cx.query("talks").unwrap_or("0").to_owned();
        cx.send(gantry::Json(serde_json::json!({ "talks": talks })))?;
        Ok(())
    }

    let app = Gantry::new()
        .get("/status", endpoint_fn(|cx| Box::pin(status(cx))))
        .unwrap()
        .build();

    let res = app.dispatch(get("/status?talks=3")).await;
    assert_eq!(res.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(&res.body()[..], br#"{"talks":"3"}"#);
}
