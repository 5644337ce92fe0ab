//! Endpoint paths, relative to the configured base URL

/// `POST` - persist a workflow definition
pub const WORKFLOW_SAVE_PATH: &str = "/workflow/save";

/// `POST` - start or advance a workflow session
pub const WORKFLOW_EXECUTE_PATH: &str = "/client/workflow";

/// `GET` - server liveness
pub const HEALTHCHECK_PATH: &str = "/healthcheck";

use url::Url;

/// Path segment under which screen schemas live
pub const SCREENS_SEGMENT: &str = "screens";

/// `GET` - screen schema by id, as `{base}/screens/{screen_id}`.
///
/// The id is percent-encoded as one segment, so `/`, `?` and `#` stay inside it.
/// `None` when `base_url` cannot carry a path (`mailto:` and the like).
pub fn screen_url(base_url: &Url, screen_id: &str) -> Option<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push(SCREENS_SEGMENT)
        .push(screen_id);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn screen_url_appends_to_base_path() {
        assert_eq!(
            screen_url(&base("http://host:8000"), "main").unwrap().as_str(),
            "http://host:8000/screens/main"
        );
        assert_eq!(
            screen_url(&base("https://cdn.example.com/ui/"), "main")
                .unwrap()
                .as_str(),
            "https://cdn.example.com/ui/screens/main"
        );
    }

    #[test]
    fn screen_id_is_one_encoded_segment() {
        let url = screen_url(&base("http://host"), "a/b c?d#e").unwrap();
        assert_eq!(url.as_str(), "http://host/screens/a%2Fb%20c%3Fd%23e");
        assert_eq!(url.path_segments().unwrap().count(), 2);
    }

    #[test]
    fn base_without_path_is_rejected() {
        assert_eq!(screen_url(&base("mailto:ops@example.com"), "main"), None);
    }
}
