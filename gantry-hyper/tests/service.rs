use gantry::http::StatusCode;
use gantry::{endpoint_fn, Context, Gantry, Rejection};
use gantry_hyper::Serve;
use hyper::service::Service;

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

#[tokio::test]
async fn hyper_bodies_stream_through() {
    let mut service = Gantry::new()
        .post("/echo", endpoint_fn(|cx| Box::pin(echo(cx))))
        .unwrap()
        .build()
        .into_service();

    let (mut tx, body) = hyper::Body::channel();
    let req = hyper::Request::post("/echo").body(body).unwrap();

    let send = async move {
        tx.send_data("hello ".into()).await.unwrap();
        tx.send_data("gantry".into()).await.unwrap();
    };

    let (res, ()) = tokio::join!(service.call(req), send);
    let res = res.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    assert_eq!(&body[..], b"hello gantry");
}

#[tokio::test]
async fn unmatched_requests_are_not_found() {
    let mut service = Gantry::new().build().into_service();

    let req = hyper::Request::get("/nowhere").body(hyper::Body::empty()).unwrap();
    let res = service.call(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
