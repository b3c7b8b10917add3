pub mod artifacts;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod jobs;
pub mod report;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("DB_TEST", "db failed")
            .with_details("path=x")
            .with_retryable(true);
        assert_eq!(err.code, "DB_TEST");
        assert_eq!(err.message, "db failed");
        assert!(err.retryable);
        assert_eq!(err.to_string(), "[DB_TEST] db failed (path=x)");
    }
}
