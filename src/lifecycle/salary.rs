//! Salary range display formatting.

/// Render a salary range for display.
///
/// Rupee amounts above one hundred thousand are shown in lakh (`L`); any other
/// currency shows amounts above one thousand in thousands (`k`). Division is
/// integer division, so fractions are dropped.
pub fn salary_range(min: i64, max: i64, currency: &str) -> String {
    format!(
        "{currency}{} - {currency}{}",
        compact_amount(min, currency),
        compact_amount(max, currency)
    )
}

fn compact_amount(amount: i64, currency: &str) -> String {
    if currency == "₹" {
        if amount > 100_000 {
            return format!("{}L", amount / 100_000);
        }
    } else if amount > 1_000 {
        return format!("{}k", amount / 1_000);
    }
    amount.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_for_non_rupee() {
        assert_eq!(salary_range(60_000, 90_000, "$"), "$60k - $90k");
        assert_eq!(salary_range(1_000, 1_999, "€"), "€1000 - €1k");
        assert_eq!(salary_range(0, 500, "£"), "£0 - £500");
    }

    #[test]
    fn lakh_for_rupee() {
        assert_eq!(salary_range(500_000, 2_500_000, "₹"), "₹5L - ₹25L");
        assert_eq!(salary_range(100_000, 150_000, "₹"), "₹100000 - ₹1L");
        // Rupee amounts never use the thousands suffix.
        assert_eq!(salary_range(50_000, 99_999, "₹"), "₹50000 - ₹99999");
    }
}
