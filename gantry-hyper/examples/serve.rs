use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use gantry::http::StatusCode;
use gantry::template::DirSource;
use gantry::{
    async_trait, endpoint_fn, locals, recover_fn, Context, Gantry, Html, Locals, Middleware, Next,
    Rejection, Router,
};
use gantry_hyper::Serve;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Serialize)]
struct Speaker {
    name: String,
    title: String,
    summary: String,
}

/// Looks up the speakers of the meetup.
struct Speakers {
    speakers: Vec<Speaker>,
}

impl Speakers {
    fn new() -> Self {
        let speaker = |name: &str, title: &str, summary: &str| Speaker {
            name: name.to_owned(),
            title: title.to_owned(),
            summary: summary.to_owned(),
        };

        Speakers {
            speakers: vec![
                speaker("lorenzo", "Ownership in practice", "Borrowing without tears."),
                speaker("hilda", "Async all the way down", "What a future really is."),
                speaker("javier", "<Unsafe> at any speed", "When the borrow checker steps aside."),
            ],
        }
    }

    async fn all(&self) -> Vec<Speaker> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.speakers.clone()
    }

    async fn find(&self, name: &str) -> Option<Speaker> {
        self.all().await.into_iter().find(|s| s.name == name)
    }
}

/// Makes the speaker list available to every template.
struct LoadSpeakers;

#[derive(Serialize)]
struct SpeakerList {
    speakers: Vec<Speaker>,
}

#[async_trait]
impl Middleware for LoadSpeakers {
    async fn call(&self, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection> {
        let speakers = match cx.state::<Speakers>() {
            Some(speakers) => speakers.all().await,
            None => Vec::new(),
        };

        let list = Locals::from_serialize(&SpeakerList { speakers }).map_err(Rejection::internal)?;
        cx.locals_mut().extend(list);

        next.run(cx).await;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeakerPage {
    page_title: String,
    speaker: Speaker,
}

async fn index(cx: &mut Context) -> Result<(), Rejection> {
    cx.render_page("index", locals! { "pageTitle" => "Home" }).await
}

async fn speakers(cx: &mut Context) -> Result<(), Rejection> {
    let name = match cx.param("name").map(str::to_owned) {
        Some(name) => name,
        None => return cx.render_page("speakers", locals! { "pageTitle" => "Speakers" }).await,
    };

    let speaker = match cx.state::<Speakers>() {
        Some(speakers) => speakers.find(&name).await,
        None => None,
    };

    let speaker = speaker.ok_or(StatusCode::NOT_FOUND)?;
    let page = SpeakerPage {
        page_title: speaker.name.clone(),
        speaker,
    };

    let locals = Locals::from_serialize(&page).map_err(Rejection::internal)?;
    cx.render_page("speaker", locals).await
}

async fn feedback(cx: &mut Context) -> Result<(), Rejection> {
    let body = cx.request_mut().body_mut().bytes().await.map_err(|err| {
        tracing::warn!(error = %err, "failed to read feedback");
        StatusCode::BAD_REQUEST
    })?;

    tracing::info!(bytes = body.len(), "received feedback");
    cx.send((StatusCode::ACCEPTED, "Thanks for the feedback!"))?;
    Ok(())
}

async fn render_error(err: Rejection, cx: &mut Context) -> Result<(), Rejection> {
    let status = err.status();
    tracing::warn!(error = %err, %status, "request failed");

    let locals = locals! {
        "pageTitle" => "Error",
        "message" => err.to_string(),
        "status" => status.as_u16(),
    };

    match cx.render("error", locals).await {
        Ok(html) => cx.send((status, Html(html)))?,
        Err(render) => {
            tracing::error!(error = %render, "failed to render error page");
            cx.send(status)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gantry=debug")),
        )
        .init();

    let views = Path::new(env!("CARGO_MANIFEST_DIR")).join("examples/views");

    let speaker_routes = Router::new().get("/:name?", endpoint_fn(|cx| Box::pin(speakers(cx))))?;

    let dispatcher = Gantry::new()
        .global("siteName", "ROUX Meetups")
        .inject(Speakers::new())
        .templates(DirSource::new(views))
        .wrap(LoadSpeakers)
        .get("/", endpoint_fn(|cx| Box::pin(index(cx))))?
        .post("/feedback", endpoint_fn(|cx| Box::pin(feedback(cx))))?
        .nest("/speakers", speaker_routes)
        .recover(recover_fn(|err, cx, _next| Box::pin(render_error(err, cx))))
        .build();

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    dispatcher.serve(addr)?.await?;
    Ok(())
}
