//! Links handed to external tools.

/// JOSM remote control listens here unless configured otherwise.
pub const DEFAULT_JOSM_PORT: u16 = 8111;

/// `{api_base}/traces/{id}.gpx`
pub fn gpx_url(api_base: &str, id: &str) -> String {
    format!("{}/traces/{}.gpx", api_base.trim_end_matches('/'), id)
}

/// JOSM remote-control import link for a GPX file.
///
/// The GPX URL is passed through verbatim; JOSM reads everything after
/// `url=` as the target.
pub fn josm_import_url(port: u16, gpx_url: &str) -> String {
    format!("http://127.0.0.1:{port}/import?url={gpx_url}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpx_url_from_base() {
        assert_eq!(
            gpx_url("https://api.example.org", "42"),
            "https://api.example.org/traces/42.gpx"
        );
        assert_eq!(
            gpx_url("https://api.example.org/", "42"),
            "https://api.example.org/traces/42.gpx"
        );
    }

    #[test]
    fn josm_link() {
        let gpx = gpx_url("https://api.example.org", "42");
        assert_eq!(
            josm_import_url(DEFAULT_JOSM_PORT, &gpx),
            "http://127.0.0.1:8111/import?url=https://api.example.org/traces/42.gpx"
        );
    }
}
