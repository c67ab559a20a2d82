//! Persistence layer: sqlx repositories over PostgreSQL.
//!
//! Carts and orders keep their line items as JSONB documents; every cart
//! write is conditional on the version the caller loaded.

pub mod carts;
pub mod coupons;
pub mod orders;

/// OFFSET for a 1-based page. Widened before multiplying so an
/// arbitrarily large caller-supplied page cannot overflow.
pub fn page_offset(page: u32, limit: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 8), 0);
        assert_eq!(page_offset(3, 6), 12);
        // Page numbers below 1 clamp to the first page.
        assert_eq!(page_offset(0, 8), 0);
    }

    #[test]
    fn test_page_offset_survives_huge_pages() {
        assert_eq!(page_offset(u32::MAX, 100), (i64::from(u32::MAX) - 1) * 100);
    }
}
