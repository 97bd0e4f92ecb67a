//! List query parameters.

use super::error::PipelineError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 50;

/// Raw list parameters as received from the client.
///
/// Filters and sort stay in their wire form until the pipeline knows the
/// resource they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `ref;op;val` strings, one per `filter` parameter.
    pub filters: Vec<String>,
    /// `ref;asc|desc`
    pub sort: Option<String>,
}

impl ListQuery {
    /// Parse a query string. `filter` may repeat; empty values count as
    /// absent.
    pub fn from_query(query: &str) -> Result<Self, PipelineError> {
        let mut out = ListQuery::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "page" => out.page = Some(parse_count("page", &value)?),
                "per_page" => out.per_page = Some(parse_count("per_page", &value)?),
                "filter" => out.filters.push(value.into_owned()),
                "sort" => out.sort = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(out)
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn filter(mut self, raw: impl Into<String>) -> Self {
        self.filters.push(raw.into());
        self
    }

    pub fn sort(mut self, raw: impl Into<String>) -> Self {
        self.sort = Some(raw.into());
        self
    }
}

fn parse_count(name: &str, raw: &str) -> Result<u64, PipelineError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| PipelineError::BadRequest(format!("Invalid {name}: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let q = ListQuery::from_query(
            "page=2&per_page=10&filter=age%3Bgt%3B18&filter=name;like;a&sort=name;desc&x=1",
        )
        .unwrap();
        assert_eq!(q.page, Some(2));
        assert_eq!(q.per_page, Some(10));
        assert_eq!(q.filters, vec!["age;gt;18", "name;like;a"]);
        assert_eq!(q.sort.as_deref(), Some("name;desc"));
    }

    #[test]
    fn test_empty_values_are_defaults() {
        let q = ListQuery::from_query("page=&per_page=&sort=").unwrap();
        assert_eq!(q, ListQuery::default());
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(matches!(
            ListQuery::from_query("page=-1"),
            Err(PipelineError::BadRequest(_))
        ));
        assert!(ListQuery::from_query("per_page=ten").is_err());
    }
}
