//! Shipping weight resolution.

/// Returns the shipping weight used for the hidden-fee lookup.
///
/// The affiliate item's declared real weight wins when it is set and
/// positive; otherwise the primary item's weight is used.
///
/// # Examples
///
/// ```
/// use sip_price_engine::calculation::resolve_real_weight;
///
/// assert_eq!(resolve_real_weight(Some(800), 500), 800);
/// assert_eq!(resolve_real_weight(Some(0), 500), 500);
/// assert_eq!(resolve_real_weight(None, 500), 500);
/// ```
pub fn resolve_real_weight(affiliate_real_weight: Option<i64>, primary_weight: i64) -> i64 {
    match affiliate_real_weight {
        Some(weight) if weight > 0 => weight,
        _ => primary_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affiliate_weight_preferred_even_when_lighter() {
        assert_eq!(resolve_real_weight(Some(100), 500), 100);
    }

    #[test]
    fn test_negative_affiliate_weight_falls_back() {
        assert_eq!(resolve_real_weight(Some(-1), 500), 500);
    }

    #[test]
    fn test_fallback_keeps_primary_weight_verbatim() {
        assert_eq!(resolve_real_weight(None, 0), 0);
    }
}
