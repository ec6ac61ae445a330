use crate::error::ApiError;
use crate::models::{RecipeResponse, UserResponse, UserWithRecipesResponse};
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Page number (1-based) and page size taken from `?page=&limit=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = match limit {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(l) => l.min(MAX_PAGE_SIZE),
        };
        PageRequest { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Any page past the last one is a 404, except page 1 of an empty list.
    pub fn ensure_exists(&self, count: u64) -> Result<(), ApiError> {
        if self.page > 1 && self.offset() >= count {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    fn has_next(&self, count: u64) -> bool {
        self.offset() + self.limit < count
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    RecipePage = Page<RecipeResponse>,
    UserPage = Page<UserResponse>,
    SubscriptionPage = Page<UserWithRecipesResponse>
)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(req: &HttpRequest, request: PageRequest, count: u64, results: Vec<T>) -> Self {
        let next = request
            .has_next(count)
            .then(|| page_url(req, Some(request.page + 1)));
        let previous = match request.page {
            1 => None,
            2 => Some(page_url(req, None)),
            page => Some(page_url(req, Some(page - 1))),
        };
        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Absolute URL of the current request with `page` replaced (or dropped).
fn page_url(req: &HttpRequest, page: Option<u64>) -> String {
    let mut pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(req.query_string()).unwrap_or_default();
    pairs.retain(|(key, _)| key != "page");
    if let Some(page) = page {
        pairs.push(("page".to_string(), page.to_string()));
    }

    let info = req.connection_info();
    let base = format!("{}://{}{}", info.scheme(), info.host(), req.path());
    match serde_urlencoded::to_string(&pairs) {
        Ok(query) if !query.is_empty() => format!("{}?{}", base, query),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn defaults_and_caps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(3), Some(500)).limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(Some(3), Some(6)).offset(), 12);
    }

    #[test]
    fn pages_past_the_end_do_not_exist() {
        let request = PageRequest::new(Some(2), Some(5));
        assert!(request.ensure_exists(6).is_ok());
        assert!(matches!(request.ensure_exists(5), Err(ApiError::NotFound)));
        assert!(PageRequest::new(Some(1), None).ensure_exists(0).is_ok());
    }

    #[test]
    fn links_keep_other_query_parameters() {
        let req = TestRequest::get()
            .uri("/api/recipes?author=3&page=2&limit=1")
            .insert_header(("Host", "food.example"))
            .to_http_request();
        let page = Page::new(&req, PageRequest::new(Some(2), Some(1)), 3, vec![()]);
        assert_eq!(
            page.next.as_deref(),
            Some("http://food.example/api/recipes?author=3&limit=1&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://food.example/api/recipes?author=3&limit=1")
        );
    }

    #[test]
    fn last_page_has_no_next() {
        let req = TestRequest::get()
            .uri("/api/users")
            .insert_header(("Host", "food.example"))
            .to_http_request();
        let page = Page::new(&req, PageRequest::new(None, None), 4, vec![1, 2, 3, 4]);
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
        assert_eq!(page.count, 4);
    }
}
