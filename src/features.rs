// src/features.rs

/// Is the parallel engine enabled for the enumeration façade?
pub fn parallel_available() -> bool {
    cfg!(feature = "parallel")
}

/// Is high-precision support compiled in?
pub fn high_precision_available() -> bool {
    cfg!(feature = "high-precision")
}

/// Log which optional features were compiled in.
pub fn log_features() {
    log::info!(
        "Feature status - Parallel: {}, High-Precision: {}",
        parallel_available(),
        high_precision_available()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_detection() {
        assert_eq!(parallel_available(), cfg!(feature = "parallel"));
        assert_eq!(high_precision_available(), cfg!(feature = "high-precision"));
    }
}
