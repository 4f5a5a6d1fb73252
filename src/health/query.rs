// src/health/query.rs

/// The service a caller asks about, and whether warnings should still pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceQuery {
    pub service_id: String,
    pub warn_enabled: bool,
}

impl ServiceQuery {
    pub fn new(service_id: impl Into<String>, warn_enabled: bool) -> Self {
        Self {
            service_id: service_id.into(),
            warn_enabled,
        }
    }

    /// Read `service` and `warn` from a raw query string. The first
    /// occurrence of each key wins; only the literal `true` enables warn mode.
    pub fn from_query_string(query: Option<&str>) -> Self {
        let mut service_id = None;
        let mut warn = None;

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "service" if service_id.is_none() => service_id = Some(value.into_owned()),
                "warn" if warn.is_none() => warn = Some(value.into_owned()),
                _ => {}
            }
        }

        Self {
            service_id: service_id.unwrap_or_default(),
            warn_enabled: warn.as_deref() == Some("true"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_service_and_warn() {
        let query = ServiceQuery::from_query_string(Some("service=web&warn=true"));
        assert_eq!(query, ServiceQuery::new("web", true));
    }

    #[test]
    fn missing_parameters_default_to_empty_and_false() {
        assert_eq!(ServiceQuery::from_query_string(None), ServiceQuery::default());
        assert_eq!(ServiceQuery::from_query_string(Some("")), ServiceQuery::default());
    }

    #[test]
    fn only_literal_true_enables_warn() {
        for value in ["false", "TRUE", "True", "1", "yes", ""] {
            let query = ServiceQuery::from_query_string(Some(&format!("service=web&warn={value}")));
            assert!(!query.warn_enabled, "warn={value} should not enable warn mode");
        }
    }

    #[test]
    fn decodes_percent_escapes() {
        let query = ServiceQuery::from_query_string(Some("service=my%20svc%2Fv2&warn=tru%65"));
        assert_eq!(query, ServiceQuery::new("my svc/v2", true));
    }

    #[test]
    fn first_occurrence_wins() {
        let query =
            ServiceQuery::from_query_string(Some("service=web&service=db&warn=false&warn=true"));
        assert_eq!(query, ServiceQuery::new("web", false));
    }
}
