//! JSON endpoints over a bare TCP listener.
//!
//! Only the request line is inspected. `/api/snapshot` runs a full refresh so
//! a polling client sees current files; `/api/chart` reloads only the chart.

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::dashboard::{ChartSection, ConfigView, Dashboard};
use crate::logging::{info, obj, v_str, warn, Domain};
use crate::settings::{clamp_days, DEFAULT_DAYS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Snapshot { days: usize },
    Chart { days: usize },
    Config,
    Health,
    NotFound,
}

/// Route a request line such as `GET /api/chart?days=30 HTTP/1.1`.
pub fn route(request_line: &str) -> Route {
    let mut parts = request_line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        return Route::NotFound;
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    match path {
        "/api/snapshot" => Route::Snapshot { days: days_param(query) },
        "/api/chart" => Route::Chart { days: days_param(query) },
        "/api/config" => Route::Config,
        "/api/health" => Route::Health,
        _ => Route::NotFound,
    }
}

/// `days` from a query string, defaulted and clamped.
fn days_param(query: &str) -> usize {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "days")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .map(clamp_days)
        .unwrap_or(DEFAULT_DAYS)
}

fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

type Reply = (&'static str, &'static str, String);

async fn respond(dashboard: &Mutex<Dashboard>, route: &Route) -> Result<Reply> {
    let ok = |body: String| -> Result<Reply> { Ok(("200 OK", "application/json", body)) };
    match route {
        Route::Health => ok(json!({"status": "ok"}).to_string()),
        Route::Snapshot { days } => {
            let mut dash = dashboard.lock().await;
            let snapshot = dash.refresh_now(*days).await;
            ok(serde_json::to_string(snapshot).context("encoding snapshot")?)
        }
        Route::Chart { days } => {
            // Changing the period only reloads the per-day logs.
            let dash = dashboard.lock().await;
            let today = Local::now().date_naive();
            let chart = ChartSection::from_points(dash.load_chart(*days, today).await);
            ok(serde_json::to_string(&chart).context("encoding chart")?)
        }
        Route::Config => {
            let mut dash = dashboard.lock().await;
            if let Err(err) = dash.load_config().await {
                warn(Domain::Server, "config_reload_failed", obj(&[("msg", v_str(&format!("{:#}", err)))]));
            }
            let view = dash.config().map(ConfigView::from_parsed);
            ok(serde_json::to_string(&view).context("encoding config")?)
        }
        Route::NotFound => Ok(("404 NOT FOUND", "text/plain", "Not Found".to_string())),
    }
}

async fn handle(stream: TcpStream, dashboard: Arc<Mutex<Dashboard>>) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut request_line = String::new();
    BufReader::new(read)
        .read_line(&mut request_line)
        .await
        .context("reading request line")?;

    let route = route(request_line.trim_end());
    let (status, content_type, body) = match respond(&dashboard, &route).await {
        Ok(reply) => reply,
        Err(err) => (
            "500 INTERNAL SERVER ERROR",
            "application/json",
            json!({"error": format!("{:#}", err)}).to_string(),
        ),
    };
    info(
        Domain::Server,
        "request",
        obj(&[
            ("line", v_str(request_line.trim_end())),
            ("status", v_str(status)),
        ]),
    );

    write
        .write_all(response(status, content_type, &body).as_bytes())
        .await
        .context("writing response")?;
    write.shutdown().await.ok();
    Ok(())
}

/// Accept connections until the process is stopped.
pub async fn serve(dashboard: Dashboard, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info(Domain::Server, "listening", obj(&[("addr", v_str(addr))]));

    let dashboard = Arc::new(Mutex::new(dashboard));
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn(Domain::Server, "accept_failed", obj(&[("msg", v_str(&err.to_string()))]));
                continue;
            }
        };
        let dashboard = dashboard.clone();
        tokio::spawn(async move {
            if let Err(err) = handle(stream, dashboard).await {
                warn(
                    Domain::Server,
                    "connection_failed",
                    obj(&[("peer", v_str(&peer.to_string())), ("msg", v_str(&format!("{:#}", err)))]),
                );
            }
        });
    }
}
