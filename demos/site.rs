//! Demo site exercising routing, parameters, cookies, redirects, and static files.
//!
//! ```text
//! STOA_STATIC_ROOT=./public RUST_LOG=stoa=debug cargo run --example site
//! ```

use std::time::SystemTime;

use stoa::http::StatusCode;
use stoa::{Config, Cookie, HandlerResult, Request, Response, Router, Server};
use tracing_subscriber::EnvFilter;

const METHOD_NOT_ALLOWED: &str = "<html><body><h1>405 Method Not Allowed</h1></body></html>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut router = Router::new();
    router
        .route("/now", now)?
        .route("/show_request", show_request)?
        .route("/parameters", parameters)?
        .route("/user/<user_id>/profile", user_profile)?
        .route("/set_cookie", set_cookie)?
        .route("/login", login)?
        .route("/welcome", welcome)?;

    let server = Server::bind(Config::from_env()).await?;
    tokio::select! {
        () = server.run(router) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }
    Ok(())
}

async fn now(_request: Request) -> HandlerResult {
    let body = render(
        "<html><body><h1>Now: {{ now }}</h1></body></html>",
        &[("now", httpdate::fmt_http_date(SystemTime::now()))],
    );
    Ok(Response::ok().body(body))
}

async fn show_request(request: Request) -> HandlerResult {
    let headers: String = request
        .headers()
        .iter()
        .map(|(name, value)| format!("{}: {}\n", escape(name), escape(value)))
        .collect();
    let body = render(
        "<html><body>\
         <h1>Request Line:</h1><p>{{ method }} {{ path }} {{ version }}</p>\
         <h1>Headers:</h1><pre>{{ headers }}</pre>\
         <h1>Body:</h1><pre>{{ body }}</pre>\
         </body></html>",
        &[
            ("method", escape(request.method().as_str())),
            ("path", escape(request.path())),
            ("version", escape(request.version())),
            ("headers", headers),
            ("body", escape(&String::from_utf8_lossy(request.body()))),
        ],
    );
    Ok(Response::ok().body(body))
}

async fn parameters(request: Request) -> HandlerResult {
    if request.method().as_str() != "POST" {
        return Ok(Response::new(StatusCode::MethodNotAllowed).body(METHOD_NOT_ALLOWED));
    }

    let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(request.body())?;
    let items: String = fields
        .iter()
        .map(|(k, v)| format!("<li>{} = {}</li>", escape(k), escape(v)))
        .collect();
    let body = render(
        "<html><body><h1>Params:</h1><ul>{{ items }}</ul></body></html>",
        &[("items", items)],
    );
    Ok(Response::ok().body(body))
}

async fn user_profile(request: Request) -> HandlerResult {
    let user_id = request.param("user_id").ok_or("route did not capture user_id")?;
    let body = render(
        "<html><body><h1>Profile</h1><p>ID: {{ user_id }}</p></body></html>",
        &[("user_id", escape(user_id))],
    );
    Ok(Response::ok().body(body))
}

async fn set_cookie(_request: Request) -> HandlerResult {
    Ok(Response::ok()
        .body("<html><body><h1>Cookies set</h1></body></html>")
        .cookie(Cookie::new("username", "Naoki").http_only(true))
        .cookie(Cookie::new("email", "naoki@example.com").path("/")))
}

async fn login(request: Request) -> HandlerResult {
    match request.method().as_str() {
        "GET" => Ok(Response::ok().body(
            "<html><body><form action=\"/login\" method=\"post\">\
             <input name=\"username\"><input name=\"email\"><button>Login</button>\
             </form></body></html>",
        )),
        "POST" => {
            let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(request.body())?;
            let mut response = Response::redirect("/welcome");
            for (name, value) in fields {
                if name == "username" || name == "email" {
                    response = response.cookie(Cookie::new(name, value).max_age(3600).http_only(true));
                }
            }
            Ok(response)
        }
        _ => Ok(Response::new(StatusCode::MethodNotAllowed).body(METHOD_NOT_ALLOWED)),
    }
}

async fn welcome(request: Request) -> HandlerResult {
    let Some(username) = request.cookie("username") else {
        return Ok(Response::redirect("/login"));
    };
    let body = render(
        "<html><body><h1>Welcome, {{ username }}!</h1><p>email: {{ email }}</p></body></html>",
        &[
            ("username", escape(username)),
            ("email", escape(request.cookie("email").unwrap_or(""))),
        ],
    );
    Ok(Response::ok().body(body))
}

// Stand-in template engine: substitutes `{{ key }}`.
fn render(template: &str, context: &[(&str, String)]) -> String {
    context.iter().fold(template.to_owned(), |page, (key, value)| {
        page.replace(&format!("{{{{ {key} }}}}"), value)
    })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
