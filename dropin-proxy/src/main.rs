use std::{env, fs, net::SocketAddr, process};

use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Local;
use log::{error, info};
use serde::Deserialize;
use tokio::net::TcpListener;

use dropin_parser::parse_schedule;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    // Given a path argument we act as an offline runner over a saved page
    // instead of serving HTTP.
    if let Some(path) = env::args().nth(1) {
        return run_local(&path);
    }

    const DROPIN_PROXY_ADDR: &str = "DROPIN_PROXY_ADDR";

    let Ok(addr) = env::var(DROPIN_PROXY_ADDR).map_or_else(
        |_| Ok(SocketAddr::from(([127, 0, 0, 1], 8080))),
        |value| value.parse(),
    ) else {
        eprintln!("Failed to parse `{DROPIN_PROXY_ADDR}` environment variable");
        process::exit(1);
    };

    let router = Router::new().route("/", post(handle_schedule));

    let listener = TcpListener::bind(addr).await?;
    info!("Listening at http://{addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "dropin_proxy=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

fn run_local(path: &str) -> anyhow::Result<()> {
    let html = fs::read_to_string(path).with_context(|| format!("Failed to read `{path}`"))?;
    let schedule = parse_schedule(&html, Local::now().naive_local())?;
    println!("{}", serde_json::to_string_pretty(&schedule)?);
    Ok(())
}

#[derive(Deserialize)]
struct ScheduleRequest {
    url: String,
}

async fn handle_schedule(Json(request): Json<ScheduleRequest>) -> Response {
    info!("Scraping {}", request.url);

    let html = match fetch_html(&request.url).await {
        Ok(html) => html,
        Err(err) => {
            error!("Fetching {} failed: {err}", request.url);
            return (
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch schedule page: {err}"),
            )
                .into_response();
        }
    };

    match parse_schedule(&html, Local::now().naive_local()) {
        Ok(schedule) => Json(schedule).into_response(),
        Err(err) => {
            error!("Parsing {} failed: {err}", request.url);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Failed to parse schedule page: {err}"),
            )
                .into_response()
        }
    }
}

async fn fetch_html(url: &str) -> reqwest::Result<String> {
    reqwest::get(url).await?.error_for_status()?.text().await
}
