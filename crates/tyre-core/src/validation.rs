//! # Request Checks
//!
//! Turns caller requests into validated values before the ledger looks
//! anything up. Tyre sizes are normalized here, so `185/65r15` and
//! `185/65R15 ` address the same stock key.
//!
//! ```text
//! AddStockRequest   ──validate_add_stock──► StockReceipt
//! RecordSaleRequest ──validate_sale───────► SaleEntry (date resolved, total computed)
//! ```
//!
//! What is left to the store: `quantity >= 0` CHECKs, the `(date, tyre_size)`
//! unique key and the immutability triggers.
//!
//! ## Usage
//! ```rust
//! use tyre_core::validation::{normalize_tyre_size, validate_quantity};
//!
//! assert_eq!(normalize_tyre_size(" 185/65r15 ").unwrap(), "185/65R15");
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AddStockRequest, RecordSaleRequest, SaleEntry, StockReceipt};
use crate::{MAX_AMOUNT_CENTS, MAX_QUANTITY, MAX_TYRE_SIZE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 100;
const MAX_LOCATION_LEN: usize = 100;
const MAX_COMMENT_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a tyre size and returns its canonical key form.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_TYRE_SIZE_LEN`] characters
/// - Letters, digits, `/`, `-`, `.` and single spaces only
///
/// ## Example
/// ```rust
/// use tyre_core::validation::normalize_tyre_size;
///
/// assert_eq!(normalize_tyre_size("185/65r15").unwrap(), "185/65R15");
/// assert_eq!(normalize_tyre_size("205/55 r16  91v").unwrap(), "205/55 R16 91V");
/// assert!(normalize_tyre_size("").is_err());
/// assert!(normalize_tyre_size("185/65R15;DROP").is_err());
/// ```
pub fn normalize_tyre_size(raw: &str) -> ValidationResult<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return Err(ValidationError::Required {
            field: "tyre_size".to_string(),
        });
    }

    if collapsed.len() > MAX_TYRE_SIZE_LEN {
        return Err(ValidationError::TooLong {
            field: "tyre_size".to_string(),
            max: MAX_TYRE_SIZE_LEN,
        });
    }

    if !collapsed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '.' | ' '))
    {
        return Err(ValidationError::InvalidFormat {
            field: "tyre_size".to_string(),
            reason: "must contain only letters, digits, '/', '-', '.' and spaces".to_string(),
        });
    }

    if !collapsed.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "tyre_size".to_string(),
            reason: "must contain a dimension".to_string(),
        });
    }

    Ok(collapsed.to_ascii_uppercase())
}

/// Validates a required free-text field and returns it trimmed.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional phone number. Blank input counts as absent.
///
/// ## Rules
/// - Optional leading `+`
/// - 7 to 15 digits; spaces and hyphens are ignored
///
/// ## Example
/// ```rust
/// use tyre_core::validation::validate_phone_number;
///
/// assert_eq!(validate_phone_number(Some("+92 300-1234567")).unwrap().as_deref(), Some("+923001234567"));
/// assert_eq!(validate_phone_number(Some("  ")).unwrap(), None);
/// assert!(validate_phone_number(Some("call me")).is_err());
/// ```
pub fn validate_phone_number(phone: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let (plus, rest) = match phone.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", phone),
    };

    let digits: String = rest.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let valid = digits.chars().all(|c| c.is_ascii_digit()) && (7..=15).contains(&digits.len());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must be 7 to 15 digits with an optional leading '+'".to_string(),
        });
    }

    Ok(Some(format!("{plus}{digits}")))
}

fn optional_comment(comment: Option<&str>) -> ValidationResult<Option<String>> {
    match comment.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(None),
        Some(c) if c.chars().count() > MAX_COMMENT_LEN => Err(ValidationError::TooLong {
            field: "comment".to_string(),
            max: MAX_COMMENT_LEN,
        }),
        Some(c) => Ok(Some(c.to_string())),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a receipt or sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount in minor units: `0..=MAX_AMOUNT_CENTS`.
///
/// ## Example
/// ```rust
/// use tyre_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("ssp", 0).is_ok());
/// assert!(validate_amount_cents("ssp", -1).is_err());
/// assert!(validate_amount_cents("total_amount", i64::MAX).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<Money> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(Money::from_cents(cents))
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a stock receipt and normalizes its key.
pub fn validate_add_stock(req: &AddStockRequest) -> ValidationResult<StockReceipt> {
    let tyre_size = normalize_tyre_size(&req.tyre_size)?;
    validate_quantity(req.quantity)?;

    Ok(StockReceipt {
        date: req.date,
        tyre_size,
        quantity: req.quantity,
        ssp: validate_amount_cents("ssp", req.ssp_cents)?,
        total_amount: validate_amount_cents("total_amount", req.total_amount_cents)?,
        price_per_unit: validate_amount_cents("price_per_unit", req.price_per_unit_cents)?,
        location: validate_required_text("location", &req.location, MAX_LOCATION_LEN)?,
    })
}

/// Validates a sale, resolves its date against `today` and computes the
/// line total.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tyre_core::types::RecordSaleRequest;
/// use tyre_core::validation::validate_sale;
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
/// let req = RecordSaleRequest {
///     date: None,
///     tyre_size: "185/65r15".into(),
///     quantity: 10,
///     customer_name: "Bilal".into(),
///     phone_number: None,
///     comment: None,
///     price_per_unit_cents: 1_200,
/// };
/// let entry = validate_sale(&req, today).unwrap();
/// assert_eq!(entry.date, today);
/// assert_eq!(entry.total_amount.cents(), 12_000);
/// ```
pub fn validate_sale(req: &RecordSaleRequest, today: NaiveDate) -> CoreResult<SaleEntry> {
    let tyre_size = normalize_tyre_size(&req.tyre_size)?;
    validate_quantity(req.quantity)?;
    let price_per_unit = validate_amount_cents("price_per_unit", req.price_per_unit_cents)?;
    let customer_name = validate_required_text("customer_name", &req.customer_name, MAX_NAME_LEN)?;
    let phone_number = validate_phone_number(req.phone_number.as_deref())?;
    let comment = optional_comment(req.comment.as_deref())?;

    let total_amount = price_per_unit
        .checked_multiply_quantity(req.quantity)
        .ok_or_else(|| CoreError::AmountOverflow {
            field: "total_amount".to_string(),
        })?;

    Ok(SaleEntry {
        date: req.date.unwrap_or(today),
        tyre_size,
        quantity: req.quantity,
        price_per_unit,
        total_amount,
        customer_name,
        phone_number,
        comment,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn stock_request() -> AddStockRequest {
        AddStockRequest {
            date: date(),
            tyre_size: " 185/65r15 ".to_string(),
            quantity: 50,
            ssp_cents: 1_300,
            total_amount_cents: 50_000,
            price_per_unit_cents: 1_000,
            location: "Main St".to_string(),
        }
    }

    fn sale_request() -> RecordSaleRequest {
        RecordSaleRequest {
            date: Some(date()),
            tyre_size: "185/65R15".to_string(),
            quantity: 10,
            customer_name: "Bilal".to_string(),
            phone_number: Some("0300 1234567".to_string()),
            comment: Some("  ".to_string()),
            price_per_unit_cents: 1_200,
        }
    }

    #[test]
    fn test_normalize_tyre_size() {
        assert_eq!(normalize_tyre_size("185/65R15").unwrap(), "185/65R15");
        assert_eq!(normalize_tyre_size("lt 235/75r15").unwrap(), "LT 235/75R15");
        assert_eq!(normalize_tyre_size("7.50-16").unwrap(), "7.50-16");

        assert!(normalize_tyre_size("   ").is_err());
        assert!(normalize_tyre_size("R").is_err());
        assert!(normalize_tyre_size("185/65R15*").is_err());
        assert!(normalize_tyre_size(&"1".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert_eq!(validate_phone_number(None).unwrap(), None);
        assert_eq!(
            validate_phone_number(Some("0300-1234567")).unwrap().as_deref(),
            Some("03001234567")
        );
        assert!(validate_phone_number(Some("12345")).is_err());
        assert!(validate_phone_number(Some("+1 (555) 0100")).is_err());
    }

    #[test]
    fn test_validate_add_stock_normalizes_key() {
        let receipt = validate_add_stock(&stock_request()).unwrap();
        assert_eq!(receipt.tyre_size, "185/65R15");
        assert_eq!(receipt.total_amount.cents(), 50_000);
        assert_eq!(receipt.location, "Main St");
    }

    #[test]
    fn test_validate_add_stock_rejects_bad_input() {
        let mut req = stock_request();
        req.location = "  ".to_string();
        assert!(matches!(
            validate_add_stock(&req),
            Err(ValidationError::Required { .. })
        ));

        let mut req = stock_request();
        req.ssp_cents = -1;
        assert!(matches!(
            validate_add_stock(&req),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_amounts_are_capped() {
        assert!(validate_amount_cents("total_amount", MAX_AMOUNT_CENTS).is_ok());

        let mut req = stock_request();
        req.total_amount_cents = i64::MAX;
        assert!(matches!(
            validate_add_stock(&req),
            Err(ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. })
        ));

        let mut req = sale_request();
        req.price_per_unit_cents = MAX_AMOUNT_CENTS + 1;
        assert!(validate_sale(&req, date()).unwrap_err().is_validation());
    }

    #[test]
    fn test_validate_sale() {
        let entry = validate_sale(&sale_request(), date()).unwrap();
        assert_eq!(entry.total_amount.cents(), 12_000);
        assert_eq!(entry.phone_number.as_deref(), Some("03001234567"));
        assert_eq!(entry.comment, None);
    }

    #[test]
    fn test_validate_sale_requires_customer() {
        let mut req = sale_request();
        req.customer_name = String::new();
        let err = validate_sale(&req, date()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_validate_sale_overflow() {
        let mut req = sale_request();
        req.price_per_unit_cents = MAX_AMOUNT_CENTS;
        req.quantity = MAX_QUANTITY;
        let err = validate_sale(&req, date()).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }
}
