pub mod bus;
pub mod demo;
pub mod domain;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod routing;
pub mod store;
pub mod validate;
pub mod views;

#[cfg(test)]
mod tests {
    use super::error::LedgerError;

    #[test]
    fn not_found_carries_the_missing_id() {
        let err = LedgerError::NotFound {
            id: "SEVA123".to_string(),
        };
        assert_eq!(err.to_string(), "complaint not found: SEVA123");
        assert!(err.field_errors().is_empty());
    }
}
