//! Mock CAS login page for local development.
//!
//! Mounted by `auth_routes` when the `mock` feature is enabled:
//! - `GET /auth/mock/login?service=` renders a netid/name form
//! - `POST /auth/mock/login` mints a ticket and redirects to `service?ticket=`

mod templates;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use url::Url;

use crate::providers::mock::MockTicket;

#[derive(Deserialize)]
struct LoginQuery {
    service: String,
}

#[derive(Deserialize)]
struct LoginForm {
    netid: String,
    name: Option<String>,
    service: String,
}

pub(crate) fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/auth/mock/login", get(login_page).post(login_submit))
}

async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(templates::login_page(&query.service))
}

async fn login_submit(Form(form): Form<LoginForm>) -> Response {
    let netid = form.netid.trim();
    if netid.is_empty() {
        return (StatusCode::BAD_REQUEST, "netid is required").into_response();
    }

    let mut service = match Url::parse(&form.service) {
        Ok(url) => url,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("invalid service: {e}")).into_response(),
    };

    let ticket = MockTicket {
        netid: netid.to_string(),
        name: form.name.filter(|n| !n.trim().is_empty()),
    }
    .encode();
    service.query_pairs_mut().append_pair("ticket", &ticket);

    tracing::debug!(netid = %netid, "Issued mock CAS ticket");
    Redirect::to(service.as_str()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn submit_redirects_back_with_ticket() {
        let app: Router = routes();
        let body = "netid=d12345a&name=Jane+Doe&service=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback%3Fnext%3D%252Fdb%252F";
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/mock/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        let url = Url::parse(location).unwrap();
        assert_eq!(url.path(), "/auth/callback");
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["next", "ticket"]);
    }

    #[tokio::test]
    async fn page_escapes_service() {
        let app: Router = routes();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/mock/login?service=%22%3E%3Cscript%3E")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
        assert!(!html.contains("\"><script>"));
    }
}
