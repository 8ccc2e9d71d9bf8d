use core::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, FieldError, PartId};

use crate::report::StockStatus;

/// Physical condition of a catalog line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    New,
    Serviceable,
    Unserviceable,
    Quarantined,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::New,
        Condition::Serviceable,
        Condition::Unserviceable,
        Condition::Quarantined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::Serviceable => "Serviceable",
            Condition::Unserviceable => "Unserviceable",
            Condition::Quarantined => "Quarantined",
        }
    }
}

impl core::fmt::Display for Condition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::validation("condition", "must not be empty"));
        }
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                DomainError::validation(
                    "condition",
                    "must be one of: New, Serviceable, Unserviceable, Quarantined",
                )
            })
    }
}

/// Largest unit cost the `NUMERIC(10, 2)` column can hold.
fn max_unit_cost() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Editable attributes of a part: everything except its id and quantity.
///
/// Quantity is deliberately absent; it only ever changes through the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartAttributes {
    pub part_number: String,
    pub description: String,
    pub category: String,
    pub manufacturer: String,
    pub serial_number: Option<String>,
    pub batch_number: Option<String>,
    pub reorder_point: i64,
    pub location: String,
    pub condition: Condition,
    pub cert_of_conformance: Option<String>,
    pub shelf_life: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_cost: Decimal,
}

impl PartAttributes {
    /// Trim text, fold blank optionals to `None`, round cost to cents, then
    /// check every field and report all failures at once.
    pub fn normalized(mut self) -> DomainResult<Self> {
        self.part_number = self.part_number.trim().to_string();
        self.description = self.description.trim().to_string();
        self.category = self.category.trim().to_string();
        self.manufacturer = self.manufacturer.trim().to_string();
        self.location = self.location.trim().to_string();
        self.serial_number = non_blank(self.serial_number);
        self.batch_number = non_blank(self.batch_number);
        self.cert_of_conformance = non_blank(self.cert_of_conformance);
        self.unit_cost = self.unit_cost.round_dp(2);

        let mut errors = Vec::new();
        for (field, value, max) in [
            ("partNumber", &self.part_number, Some(50)),
            ("description", &self.description, None),
            ("category", &self.category, Some(50)),
            ("manufacturer", &self.manufacturer, Some(100)),
            ("location", &self.location, Some(100)),
        ] {
            if value.is_empty() {
                errors.push(FieldError::new(field, "must not be empty"));
            } else if let Some(max) = max {
                check_length(&mut errors, field, value, max);
            }
        }
        for (field, value) in [
            ("serialNumber", &self.serial_number),
            ("batchNumber", &self.batch_number),
            ("certOfConformance", &self.cert_of_conformance),
        ] {
            if let Some(value) = value {
                check_length(&mut errors, field, value, 100);
            }
        }
        if self.reorder_point < 0 {
            errors.push(FieldError::new("reorderPoint", "must be >= 0"));
        }
        if self.unit_cost < Decimal::ZERO {
            errors.push(FieldError::new("unitCost", "must be >= 0"));
        } else if self.unit_cost > max_unit_cost() {
            errors.push(FieldError::new("unitCost", "must be <= 99999999.99"));
        }

        DomainError::check_fields(errors)?;
        Ok(self)
    }
}

/// Column widths in the parts table are counted in characters.
fn check_length(errors: &mut Vec<FieldError>, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(FieldError::new(field, format!("must be at most {max} characters")));
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Request to add a part to the catalog.
///
/// `opening_quantity` is booked through the ledger as an IN movement, never
/// written to the part row directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPart {
    pub attributes: PartAttributes,
    pub opening_quantity: i64,
}

impl NewPart {
    pub fn normalized(self) -> DomainResult<Self> {
        let mut errors = Vec::new();
        if self.opening_quantity < 0 {
            errors.push(FieldError::new("quantity", "must be >= 0"));
        }

        match self.attributes.normalized() {
            Ok(attributes) if errors.is_empty() => Ok(Self {
                attributes,
                opening_quantity: self.opening_quantity,
            }),
            Ok(_) => Err(DomainError::Validation(errors)),
            Err(DomainError::Validation(more)) => {
                errors.extend(more);
                Err(DomainError::Validation(errors))
            }
            Err(other) => Err(other),
        }
    }
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: PartId,
    #[serde(flatten)]
    pub attributes: PartAttributes,
    pub quantity: i64,
}

impl Part {
    pub fn part_number(&self) -> &str {
        &self.attributes.part_number
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.quantity, self.attributes.reorder_point)
    }

    /// Book value: quantity × unit cost.
    pub fn stock_value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.attributes.unit_cost
    }

    /// Days from `today` until shelf-life expiry; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.attributes
            .shelf_life
            .map(|expiry| (expiry - today).num_days())
    }

    /// Check an optional client-supplied quantity on an attribute update.
    ///
    /// Clients that echo the whole part back are fine; anything else has to go
    /// through a movement.
    pub fn ensure_quantity_unchanged(&self, requested: Option<i64>) -> DomainResult<()> {
        match requested {
            Some(q) if q != self.quantity => Err(DomainError::validation(
                "quantity",
                "quantity is ledger-managed; record an IN/OUT movement instead",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn attributes(part_number: &str) -> PartAttributes {
        PartAttributes {
            part_number: part_number.to_string(),
            description: "EFIS Display Unit".to_string(),
            category: "Avionics".to_string(),
            manufacturer: "Honeywell".to_string(),
            serial_number: Some("SN-EF-77231".to_string()),
            batch_number: Some("BT-2025-002".to_string()),
            reorder_point: 4,
            location: "Warehouse B".to_string(),
            condition: Condition::Serviceable,
            cert_of_conformance: None,
            shelf_life: NaiveDate::from_ymd_opt(2027, 12, 1),
            unit_cost: Decimal::from(32000),
        }
    }

    pub(crate) fn part(id: i64, quantity: i64) -> Part {
        Part {
            id: PartId::new(id),
            attributes: attributes("PN-3305-C"),
            quantity,
        }
    }

    #[test]
    fn normalization_trims_and_folds_blanks() {
        let mut attrs = attributes("  PN-1  ");
        attrs.serial_number = Some("   ".to_string());
        attrs.unit_cost = Decimal::new(12345, 3);

        let attrs = attrs.normalized().unwrap();
        assert_eq!(attrs.part_number, "PN-1");
        assert_eq!(attrs.serial_number, None);
        assert_eq!(attrs.unit_cost.to_string(), "12.34");
    }

    #[test]
    fn every_failing_field_is_reported() {
        let mut attrs = attributes("");
        attrs.description = " ".to_string();
        attrs.reorder_point = -1;
        attrs.unit_cost = Decimal::from(-5);

        let Err(DomainError::Validation(errors)) = attrs.normalized() else {
            panic!("expected validation failure");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["partNumber", "description", "reorderPoint", "unitCost"]);
    }

    #[test]
    fn text_longer_than_its_column_is_rejected() {
        let mut attrs = attributes(&"P".repeat(51));
        attrs.batch_number = Some("B".repeat(101));
        attrs.description = "D".repeat(500);

        let Err(DomainError::Validation(errors)) = attrs.normalized() else {
            panic!("expected validation failure");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["partNumber", "batchNumber"]);
    }

    #[test]
    fn length_limits_count_characters_not_bytes() {
        let attrs = attributes(&"\u{00c9}".repeat(50));
        assert!(attrs.normalized().is_ok());
    }

    #[test]
    fn negative_opening_quantity_is_rejected_with_attribute_errors() {
        let mut attrs = attributes("PN-1");
        attrs.location = String::new();
        let new_part = NewPart {
            attributes: attrs,
            opening_quantity: -3,
        };

        let Err(DomainError::Validation(errors)) = new_part.normalized() else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "quantity");
        assert_eq!(errors[1].field, "location");
    }

    #[test]
    fn condition_parsing_is_case_insensitive_but_closed() {
        assert_eq!("quarantined".parse::<Condition>().unwrap(), Condition::Quarantined);
        assert!("Scrap".parse::<Condition>().is_err());
        assert!("".parse::<Condition>().is_err());
    }

    #[test]
    fn quantity_echo_is_tolerated_but_changes_are_not() {
        let p = part(1, 3);
        assert!(p.ensure_quantity_unchanged(None).is_ok());
        assert!(p.ensure_quantity_unchanged(Some(3)).is_ok());
        assert!(matches!(
            p.ensure_quantity_unchanged(Some(10)),
            Err(DomainError::Validation(e)) if e[0].field == "quantity"
        ));
    }

    #[test]
    fn serializes_flat_camel_case() {
        let json = serde_json::to_value(part(5, 3)).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["partNumber"], "PN-3305-C");
        assert_eq!(json["reorderPoint"], 4);
        assert_eq!(json["condition"], "Serviceable");
        assert_eq!(json["unitCost"], 32000.0);
        assert_eq!(json["shelfLife"], "2027-12-01");
    }

    #[test]
    fn value_and_expiry() {
        let p = part(1, 3);
        assert_eq!(p.stock_value(), Decimal::from(96000));
        let today = NaiveDate::from_ymd_opt(2027, 11, 1).unwrap();
        assert_eq!(p.days_until_expiry(today), Some(30));
    }
}
