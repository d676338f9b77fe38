//! String formatting utilities.
//!
//! Provides functions for formatting identifiers and monetary amounts for
//! terminal display.

/// Utility function to truncate an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Formats a monetary total for display.
///
/// Amounts are integral minor units on this wire; the currency code is
/// uppercased and appended (e.g. `28990000 VND`).
pub fn format_amount(amount: i64, currency: &str) -> String {
	format!("{} {}", amount, currency.to_uppercase())
}
