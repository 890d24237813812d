//! Connection to the CalDAV server holding the task-list calendar.

use canvas_sync_core::config::CalDavSettings;
use canvas_sync_core::{SyncError, SyncResult};
use http::Uri;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use libdav::CalDavClient;
use libdav::dav::WebDavClient;
use tower::ServiceBuilder;
use tower_http::auth::AddAuthorization;
use tower_http::follow_redirect::{FollowRedirect, FollowRedirectLayer};

type DavHttpClient = FollowRedirect<AddAuthorization<Client<HttpsConnector<HttpConnector>, String>>>;

pub type TodoCalDavClient = CalDavClient<DavHttpClient>;

/// Build a client for `caldav-url`, logging in with `caldav-user` / `caldav-password`.
///
/// Plain `http://` is accepted for servers on the local network.
pub fn create_caldav_client(settings: &CalDavSettings) -> SyncResult<TodoCalDavClient> {
    let server: Uri = settings
        .url
        .parse()
        .map_err(|e| SyncError::Config(format!("Invalid caldav-url '{}': {e}", settings.url)))?;

    let connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| SyncError::CalDav(format!("No usable TLS root certificates: {e}")))?
        .https_or_http()
        .enable_http1()
        .build();

    let authorized = AddAuthorization::basic(
        Client::builder(TokioExecutor::new()).build(connector),
        &settings.user,
        &settings.password,
    );

    // caldav-url may redirect, e.g. from /.well-known/caldav
    let http = ServiceBuilder::new()
        .layer(FollowRedirectLayer::new())
        .service(authorized);

    Ok(CalDavClient::new(WebDavClient::new(server, http)))
}

/// Href of the `.ics` resource for the todo with `uid` inside `calendar_href`.
pub fn todo_href(calendar_href: &str, uid: &str) -> String {
    format!("{}/{uid}.ics", calendar_href.trim_end_matches('/'))
}

/// Server-relative href of `caldav-calendar-url`.
///
/// `https://dav.example.com/calendars/student/tasks/` becomes `/calendars/student/tasks/`.
/// Anything that is not an absolute URL is taken to be an href already.
pub fn calendar_href(calendar_url: &str) -> String {
    match calendar_url.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() => uri.path().to_string(),
        _ => calendar_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> CalDavSettings {
        CalDavSettings {
            url: url.to_string(),
            user: "student".to_string(),
            password: "secret".to_string(),
            calendar_url: "https://dav.example.com/calendars/student/tasks/".to_string(),
        }
    }

    #[test]
    fn test_todo_href() {
        assert_eq!(
            todo_href("/calendars/student/tasks/", "abc-123"),
            "/calendars/student/tasks/abc-123.ics"
        );
        assert_eq!(
            todo_href("/calendars/student/tasks", "abc-123"),
            "/calendars/student/tasks/abc-123.ics"
        );
    }

    #[test]
    fn test_calendar_href() {
        assert_eq!(
            calendar_href("https://dav.example.com/calendars/student/tasks/"),
            "/calendars/student/tasks/"
        );
        assert_eq!(calendar_href("/already/a/path/"), "/already/a/path/");
    }

    #[test]
    fn test_invalid_caldav_url_is_config_error() {
        let result = create_caldav_client(&settings("not a url"));
        assert!(matches!(result, Err(SyncError::Config(_))));
    }
}
