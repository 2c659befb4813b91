use crate::commands;
use crate::error::{Error, ErrorType};
use crate::model::{TransactionFilter, TransactionRecord};
use crate::pagination::Page;
use crate::report::ReportRequest;
use crate::Config;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Response, StatusCode, Uri};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, error};
use url::Url;

const JSON: &str = "application/json";

/// A page of transactions as returned by `GET /transactions/`.
#[derive(Debug, Serialize)]
struct ApiPage<'a> {
    count: u64,
    next: Option<String>,
    previous: Option<String>,
    results: &'a [TransactionRecord],
}

/// The query string of a request. A repeated parameter takes its last value.
struct Query(HashMap<String, String>);

impl Query {
    fn parse(uri: &Uri) -> Self {
        let pairs = url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes());
        Self(pairs.into_owned().collect())
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn filter(&self) -> TransactionFilter {
        TransactionFilter::from_params(
            self.get("transaction_type"),
            self.get("status"),
            self.get("year"),
        )
    }
}

/// Dispatches a request to its handler and renders the outcome as a JSON response. `host` is the
/// value of the `Host` header, used to build the `next` and `previous` links.
pub(crate) async fn route(
    config: &Config,
    method: &Method,
    uri: &Uri,
    host: Option<&str>,
) -> Response<String> {
    let path = uri.path().trim_end_matches('/');
    let known = matches!(path, "/transactions" | "/transactions/report");
    if !known {
        return detail(StatusCode::NOT_FOUND, "Not found.");
    }
    if *method != Method::GET && *method != Method::HEAD {
        let mut response = detail(
            StatusCode::METHOD_NOT_ALLOWED,
            &format!("Method \"{method}\" not allowed."),
        );
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        return response;
    }

    let query = Query::parse(uri);
    let result = if path == "/transactions" {
        list(config, &query, uri, host).await
    } else {
        report(config, &query).await
    };
    match result {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

async fn list(
    config: &Config,
    query: &Query,
    uri: &Uri,
    host: Option<&str>,
) -> crate::Result<Response<String>> {
    let request = config
        .pagination()
        .request(query.get("page"), query.get("page_size"))
        .map_err(|e| Error::new(ErrorType::NotFound, e))?;
    let page = commands::list_page(config, &query.filter(), request).await?;
    let url = absolute_url(config, uri, host);
    let body = api_page(&page, url.as_ref());
    json_response(StatusCode::OK, &body)
}

async fn report(config: &Config, query: &Query) -> crate::Result<Response<String>> {
    let request = ReportRequest::parse(query.get("row_field"), query.get("column_fields"))
        .map_err(|e| Error::new(ErrorType::Request, e))?;
    let result = commands::build(config.db(), &query.filter(), &request).await?;
    json_response(StatusCode::OK, &result)
}

fn api_page<'a>(page: &'a Page<TransactionRecord>, url: Option<&Url>) -> ApiPage<'a> {
    let link = |number: Option<u64>| Some(with_page(url?, number?).to_string());
    ApiPage {
        count: page.count,
        next: link(page.window.next()),
        previous: link(page.window.previous()),
        results: &page.results,
    }
}

/// The URL the client used, rebuilt from the `Host` header or, failing that, the listen address.
fn absolute_url(config: &Config, uri: &Uri, host: Option<&str>) -> Option<Url> {
    let host = host.map_or_else(|| config.listen().to_string(), str::to_string);
    let path_and_query = uri.path_and_query().map_or("/", |p| p.as_str());
    match Url::parse(&format!("http://{host}{path_and_query}")) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!("Unable to build an absolute URL for {uri} with host '{host}': {e}");
            None
        }
    }
}

/// Sets the `page` parameter of `url`, keeping the others. The first page is linked without a
/// `page` parameter. Parameters are sorted by name.
fn with_page(url: &Url, number: u64) -> Url {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(k, _)| k != "page")
        .collect();
    if number > 1 {
        pairs.push(("page".to_string(), number.to_string()));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut url = url.clone();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url
}

fn error_response(e: Error) -> Response<String> {
    match e.error_type() {
        ErrorType::Request => detail(StatusCode::BAD_REQUEST, &e.to_string()),
        ErrorType::NotFound => detail(StatusCode::NOT_FOUND, &e.to_string()),
        _ => {
            error!("Request failed: {e:?}");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
        }
    }
}

fn detail(status: StatusCode, message: &str) -> Response<String> {
    let mut response = Response::new(json!({ "detail": message }).to_string());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> crate::Result<Response<String>> {
    let body = serde_json::to_string(body).map_err(|e| Error::new(ErrorType::Service, e))?;
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON));
    Ok(response)
}
