use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;
        (page, limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_and_clamps() {
        let p = Pagination {
            page: None,
            limit: None,
        };
        assert_eq!(p.normalize(), (1, 20, 0));

        let p = Pagination {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(p.normalize(), (3, 10, 20));

        let p = Pagination {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
    }
}
