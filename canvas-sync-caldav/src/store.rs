//! Todo store backed by a single CalDAV calendar collection.

use canvas_sync_core::config::CalDavSettings;
use canvas_sync_core::ics::{generate_ics, parse_todo};
use canvas_sync_core::store::TodoStore;
use canvas_sync_core::todo::{Todo, TodoResource};
use canvas_sync_core::{SyncError, SyncResult};
use chrono::Utc;
use libdav::caldav::GetCalendarResources;
use libdav::dav::{GetEtag, PutResource, mime_types};
use tracing::{debug, warn};

use crate::caldav::{TodoCalDavClient, calendar_href, create_caldav_client, todo_href};

pub struct CalDavTodoStore {
    caldav: TodoCalDavClient,
    calendar_href: String,
}

impl CalDavTodoStore {
    pub fn new(settings: &CalDavSettings) -> SyncResult<Self> {
        Ok(Self {
            caldav: create_caldav_client(settings)?,
            calendar_href: calendar_href(&settings.calendar_url),
        })
    }

    /// Re-fetch a single resource to pick up server-assigned values.
    async fn fetch(&self, href: &str) -> Option<TodoResource> {
        let response = self
            .caldav
            .request(GetCalendarResources::new(&self.calendar_href).with_hrefs([href]))
            .await
            .ok()?;

        let resource = response.resources.into_iter().next()?;
        let content = resource.content.ok()?;
        match to_todo_resource(resource.href, Some(content.etag), content.data) {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(%href, "Re-fetched todo did not parse: {e}");
                None
            }
        }
    }
}

impl TodoStore for CalDavTodoStore {
    async fn todos(&self) -> SyncResult<Vec<TodoResource>> {
        let response = self
            .caldav
            .request(GetCalendarResources::new(&self.calendar_href))
            .await
            .map_err(|e| {
                SyncError::CalDav(format!(
                    "Failed to fetch calendar resources from {}: {e}",
                    self.calendar_href
                ))
            })?;

        // A skipped resource may be a tracked todo, so unreadable ones fail the listing
        let mut todos = Vec::new();
        for resource in response.resources {
            let content = resource.content.map_err(|status| {
                SyncError::CalDav(format!(
                    "Server returned {status} for calendar resource {}",
                    resource.href
                ))
            })?;

            match to_todo_resource(resource.href, Some(content.etag), content.data)? {
                Some(todo) => todos.push(todo),
                None => debug!("Skipping calendar resource without a VTODO"),
            }
        }

        debug!("Fetched {} todos from {}", todos.len(), self.calendar_href);
        Ok(todos)
    }

    async fn create_todo(&self, todo: &Todo) -> SyncResult<TodoResource> {
        let ics_content = generate_ics(todo, Utc::now());
        let href = todo_href(&self.calendar_href, &todo.uid);

        // If-None-Match: * so an existing resource is never overwritten
        let response = self
            .caldav
            .request(PutResource::new(&href).create(&ics_content, mime_types::CALENDAR))
            .await
            .map_err(|e| SyncError::CalDav(format!("Failed to create todo '{}': {e}", todo.summary)))?;

        if let Some(fetched) = self.fetch(&href).await {
            return Ok(fetched);
        }

        Ok(TodoResource {
            href,
            etag: response.etag,
            raw: ics_content,
            todo: todo.clone(),
        })
    }

    async fn update_todo(&self, resource: &TodoResource) -> SyncResult<TodoResource> {
        let etag = match &resource.etag {
            Some(etag) => etag.clone(),
            None => {
                self.caldav
                    .request(GetEtag::new(&resource.href))
                    .await
                    .map_err(|e| {
                        SyncError::CalDav(format!(
                            "Failed to get etag for '{}': {e}",
                            resource.todo.summary
                        ))
                    })?
                    .etag
            }
        };

        // If-Match so concurrent edits on the server are not clobbered
        let response = self
            .caldav
            .request(PutResource::new(&resource.href).update(
                &resource.raw,
                mime_types::CALENDAR,
                &etag,
            ))
            .await
            .map_err(|e| {
                SyncError::CalDav(format!(
                    "Failed to update todo '{}': {e}",
                    resource.todo.summary
                ))
            })?;

        if let Some(fetched) = self.fetch(&resource.href).await {
            return Ok(fetched);
        }

        Ok(TodoResource {
            etag: response.etag,
            ..resource.clone()
        })
    }
}

/// Wrap fetched calendar data.
///
/// `Ok(None)` only for documents without a VTODO (events, journals). A VTODO that does not
/// parse is a data-integrity error.
fn to_todo_resource(
    href: String,
    etag: Option<String>,
    raw: String,
) -> SyncResult<Option<TodoResource>> {
    let Some(todo) = parse_todo(&raw) else {
        if mentions_vtodo(&raw) {
            return Err(SyncError::DataIntegrity {
                summary: href,
                reason: "calendar resource holds a VTODO that could not be parsed".to_string(),
            });
        }
        return Ok(None);
    };

    Ok(Some(TodoResource {
        href,
        etag,
        raw,
        todo,
    }))
}

fn mentions_vtodo(raw: &str) -> bool {
    raw.lines()
        .any(|line| line.trim().eq_ignore_ascii_case("BEGIN:VTODO"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_todo_resource_keeps_raw_and_etag() {
        let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VTODO\r\nUID:t1\r\n\
SUMMARY:Problem Set 4\r\nX-APPLE-SORT-ORDER:12\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";

        let resource = to_todo_resource(
            "/calendars/student/tasks/t1.ics".to_string(),
            Some("\"etag-1\"".to_string()),
            raw.to_string(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(resource.todo.uid, "t1");
        assert_eq!(resource.etag.as_deref(), Some("\"etag-1\""));
        assert_eq!(resource.raw, raw);
    }

    #[test]
    fn test_to_todo_resource_skips_events() {
        let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\nUID:e1\r\n\
SUMMARY:Lecture\r\nDTSTART:20240301T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

        let result = to_todo_resource("/cal/e1.ics".to_string(), None, raw.to_string());
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_to_todo_resource_never_drops_lowercase_todo() {
        let raw = "begin:vcalendar\r\nversion:2.0\r\nbegin:vtodo\r\nuid:t2\r\n\
summary:Problem Set 4\r\ndescription:assignment-id: 101:55\r\nend:vtodo\r\nend:vcalendar\r\n";

        let result = to_todo_resource("/cal/t2.ics".to_string(), None, raw.to_string());
        match result {
            Ok(Some(resource)) => assert_eq!(resource.todo.uid, "t2"),
            Ok(None) => panic!("A VTODO must not be skipped silently"),
            Err(e) => assert!(matches!(e, SyncError::DataIntegrity { .. })),
        }
    }

    #[test]
    fn test_to_todo_resource_rejects_todo_without_uid() {
        let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VTODO\r\n\
SUMMARY:Problem Set 4\r\nDESCRIPTION:assignment-id: 101:55\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";

        let err = to_todo_resource("/cal/broken.ics".to_string(), None, raw.to_string())
            .unwrap_err();
        match err {
            SyncError::DataIntegrity { summary, .. } => assert_eq!(summary, "/cal/broken.ics"),
            other => panic!("Expected DataIntegrity, got {:?}", other),
        }
    }
}
