//! Query DTOs - Data Transfer Objects per query di ricerca

use crate::core::AppError;
use crate::repositories::{PageRequest, Search};
use std::collections::HashMap;

/// Query string di `GET /products`: `page`, `page_size`, ogni altra chiave è un filtro di uguaglianza
///
/// Parsed by hand from a `HashMap` because `serde_urlencoded` cannot combine numeric fields
/// with a flattened map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductListQuery {
    pub page: PageRequest,
    pub search: Search,
}

impl ProductListQuery {
    pub fn from_params(params: HashMap<String, String>) -> Result<Self, AppError> {
        let mut page = PageRequest::default();
        let mut search = Search::new();

        // ordine stabile dei filtri, HashMap non ne garantisce uno
        let mut params: Vec<(String, String)> = params.into_iter().collect();
        params.sort();

        for (key, value) in params {
            match key.as_str() {
                "page" => page.page = parse_positive(&value, "Invalid page")?,
                "page_size" => page.page_size = parse_positive(&value, "Invalid page_size")?,
                _ => search = search.eq(key, value),
            }
        }

        if page.checked_offset().is_none() {
            return Err(AppError::bad_request("Invalid page")
                .with_details(format!("page {} is out of range", page.page)));
        }

        Ok(Self { page, search })
    }
}

fn parse_positive(value: &str, message: &'static str) -> Result<u64, AppError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::bad_request(message)
            .with_details(format!("`{value}` is not a positive integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::Operator;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = ProductListQuery::from_params(HashMap::new()).unwrap();
        assert_eq!(query.page, PageRequest::default());
        assert!(query.search.is_empty());
    }

    #[test]
    fn test_page_and_filters() {
        let query = ProductListQuery::from_params(params(&[
            ("page", "2"),
            ("page_size", "5"),
            ("is_active", "true"),
        ]))
        .unwrap();
        assert_eq!(query.page, PageRequest::new(2, 5));
        assert_eq!(query.search.filters().len(), 1);
        assert_eq!(query.search.filters()[0].column, "is_active");
        assert_eq!(query.search.filters()[0].operator, Operator::Eq);
    }

    #[test]
    fn test_invalid_page_is_rejected() {
        assert!(ProductListQuery::from_params(params(&[("page", "zero")])).is_err());
        assert!(ProductListQuery::from_params(params(&[("page_size", "0")])).is_err());
    }

    #[test]
    fn test_out_of_range_page_is_rejected() {
        let max = u64::MAX.to_string();
        let err = ProductListQuery::from_params(params(&[("page", max.as_str())])).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);

        // con page_size 1 l'offset resta rappresentabile
        let query = ProductListQuery::from_params(params(&[("page", max.as_str()), ("page_size", "1")]))
            .unwrap();
        assert_eq!(query.page.offset(), u64::MAX - 1);
    }
}
