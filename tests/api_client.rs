use std::thread;
use std::time::Duration;
use tiny_http::{Response, Server};

use rs_mail_dashboard::api::http::HttpApi;
use rs_mail_dashboard::api::{ApiError, ClassifierApi};
use rs_mail_dashboard::controller::run_recheck;

const EMAILS: &str = r#"{"emails":[
  {"id":"1","from":"a@x.com","subject":"Hi","body":"b","extracted_text":"b",
   "routed_to":"Sales","category":"Inquiry","date":"2025-01-01T00:00:00.000Z",
   "is_spam":false,"is_duplicate":false,"confidence":0.9},
  {"id":"2","from":"b@x.com","subject":"Win","body":"b","extracted_text":"b",
   "routed_to":"Customer Service","date":"2025-01-02T00:00:00.000Z","is_spam":true}
]}"#;

const ONE: &str = r#"{"id":"9","from":"c@x.com","subject":"Re","body":"b",
  "extracted_text":"b","routed_to":"Sales","date":"2025-01-03T00:00:00.000Z"}"#;

/// Serves `route(path) -> (status, body)` on an ephemeral port.
fn serve(route: fn(&str) -> (u16, &'static str)) -> HttpApi {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().port();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let (code, body) = route(request.url());
            let _ = request.respond(Response::from_string(body).with_status_code(code));
        }
    });
    HttpApi::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(5)).unwrap()
}

fn happy(path: &str) -> (u16, &'static str) {
    match path {
        "/" => (200, r#"{"message":"Email Classifier API is running!"}"#),
        "/classify-emails" => (200, EMAILS),
        "/recheck-emails" => (200, ONE),
        _ => (404, "not found"),
    }
}

#[test]
fn health_reports_backend_message() {
    let api = serve(happy);
    let h = api.check_health();
    assert!(h.is_running);
    assert_eq!(h.message, "Email Classifier API is running!");
}

#[test]
fn health_is_offline_on_error_status() {
    let api = serve(|_| (503, "down"));
    let h = api.check_health();
    assert!(!h.is_running);
    assert_eq!(h.message, "API is not running");
}

#[test]
fn health_is_offline_when_nothing_listens() {
    // grab a free port, then close it
    let port = {
        let s = Server::http("127.0.0.1:0").unwrap();
        s.server_addr().port()
    };
    let api = HttpApi::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(1)).unwrap();
    assert!(!api.check_health().is_running);
}

#[test]
fn classify_emails_parses_list_and_optionals() {
    let api = serve(happy);
    let emails = api.classify_emails().unwrap();
    assert_eq!(emails.len(), 2);
    assert_eq!(emails[0].category.as_deref(), Some("Inquiry"));
    assert_eq!(emails[1].category, None);
    assert!(emails[1].spam());
    assert!(!emails[1].duplicate());
}

#[test]
fn error_status_is_reported() {
    let api = serve(|_| (500, "boom"));
    match api.classify_emails() {
        Err(ApiError::Status(500)) => {}
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn malformed_body_is_reported() {
    let api = serve(|_| (200, "{\"emails\": 3}"));
    assert!(matches!(api.classify_emails(), Err(ApiError::Malformed(_))));
}

#[test]
fn recheck_then_fetch_returns_full_list() {
    let api = serve(happy);
    let one = api.recheck_emails().unwrap();
    assert_eq!(one.id, "9");

    let all = run_recheck(&api).unwrap();
    assert_eq!(all.len(), 2);
}
