use crate::data::catalog::Catalogs;
use crate::server::api::{self, ApiError};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    fn json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

type Handler = fn(&str, &Catalogs) -> Result<String, ApiError>;

/// Route a request, loading catalogs from the configured data directory for
/// endpoints that need them.
pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    let path = strip_query(path);
    if method == "GET" && path == "/api/health" {
        return respond(api::health_payload());
    }
    let Some(handler) = post_handler(method, path) else {
        return not_found(method, path);
    };
    match api::request_catalogs() {
        Ok(catalogs) => respond(handler(body, &catalogs)),
        Err(err) => respond(Err(err)),
    }
}

/// Route a request against already loaded catalogs.
pub fn route_with_catalogs(method: &str, path: &str, body: &str, catalogs: &Catalogs) -> HttpResponse {
    let path = strip_query(path);
    if method == "GET" && path == "/api/health" {
        return respond(api::health_payload());
    }
    match post_handler(method, path) {
        Some(handler) => respond(handler(body, catalogs)),
        None => not_found(method, path),
    }
}

fn post_handler(method: &str, path: &str) -> Option<Handler> {
    if method != "POST" {
        return None;
    }
    match path {
        "/api/stats" => Some(api::stats_payload),
        "/api/damage" => Some(api::damage_payload),
        "/api/optimize" => Some(api::optimize_payload),
        "/api/sp-tree" => Some(api::sp_tree_payload),
        _ => None,
    }
}

fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

fn respond(result: Result<String, ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(err) => {
            let (status_code, status_text) = err.status();
            if status_code >= 500 {
                tracing::error!(%err, "request failed");
            } else {
                tracing::debug!(%err, "request rejected");
            }
            error_response(status_code, status_text, &err.to_string())
        }
    }
}

fn not_found(method: &str, path: &str) -> HttpResponse {
    error_response(404, "Not Found", &format!("no route for {method} {path}"))
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}
