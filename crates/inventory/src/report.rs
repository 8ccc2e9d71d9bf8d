use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::PartId;

use crate::part::{Condition, Part};

/// Parts whose shelf life ends within this many days are flagged as expiring.
pub const EXPIRY_WARNING_DAYS: i64 = 90;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "In Stock")]
    InStock,
}

impl StockStatus {
    /// Empty bins are out of stock; anything at or under the reorder point is low.
    pub fn classify(quantity: i64, reorder_point: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= reorder_point {
            StockStatus::Low
        } else {
            StockStatus::InStock
        }
    }
}

/// One part as it appears in a report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub id: PartId,
    pub part_number: String,
    pub description: String,
    pub location: String,
    pub quantity: i64,
    pub reorder_point: i64,
    pub status: StockStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
}

impl ReportLine {
    fn new(part: &Part, today: NaiveDate) -> Self {
        Self {
            id: part.id,
            part_number: part.attributes.part_number.clone(),
            description: part.attributes.description.clone(),
            location: part.attributes.location.clone(),
            quantity: part.quantity,
            reorder_point: part.attributes.reorder_point,
            status: part.stock_status(),
            days_until_expiry: part.days_until_expiry(today),
        }
    }
}

/// Point-in-time snapshot of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub as_of: NaiveDate,
    pub total_parts: usize,
    pub total_units: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    pub out_of_stock: Vec<ReportLine>,
    pub low_stock: Vec<ReportLine>,
    pub expiring: Vec<ReportLine>,
    pub expired: Vec<ReportLine>,
    pub quarantined: Vec<ReportLine>,
}

impl InventoryReport {
    pub fn build(parts: &[Part], today: NaiveDate) -> Self {
        let mut report = Self {
            as_of: today,
            total_parts: parts.len(),
            total_units: 0,
            total_value: Decimal::ZERO,
            out_of_stock: Vec::new(),
            low_stock: Vec::new(),
            expiring: Vec::new(),
            expired: Vec::new(),
            quarantined: Vec::new(),
        };

        for part in parts {
            report.total_units += part.quantity;
            report.total_value += part.stock_value();

            let line = ReportLine::new(part, today);
            match line.status {
                StockStatus::OutOfStock => report.out_of_stock.push(line.clone()),
                StockStatus::Low => report.low_stock.push(line.clone()),
                StockStatus::InStock => {}
            }
            match line.days_until_expiry {
                Some(days) if days <= 0 => report.expired.push(line.clone()),
                Some(days) if days <= EXPIRY_WARNING_DAYS => report.expiring.push(line.clone()),
                _ => {}
            }
            if part.attributes.condition == Condition::Quarantined {
                report.quarantined.push(line);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::tests::part;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(StockStatus::classify(0, 4), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(4, 4), StockStatus::Low);
        assert_eq!(StockStatus::classify(5, 4), StockStatus::InStock);
        assert_eq!(StockStatus::classify(0, 0), StockStatus::OutOfStock);
    }

    #[test]
    fn report_sections() {
        let mut empty = part(1, 0);
        empty.attributes.shelf_life = NaiveDate::from_ymd_opt(2026, 2, 1);

        let mut low = part(2, 3);
        low.attributes.shelf_life = NaiveDate::from_ymd_opt(2026, 4, 1);

        let mut healthy = part(3, 10);
        healthy.attributes.shelf_life = None;
        healthy.attributes.condition = Condition::Quarantined;

        let report = InventoryReport::build(&[empty, low, healthy], today());
        assert_eq!(report.total_parts, 3);
        assert_eq!(report.total_units, 13);
        assert_eq!(report.total_value, Decimal::from(13 * 32000));

        let ids = |lines: &[ReportLine]| lines.iter().map(|l| l.id.get()).collect::<Vec<_>>();
        assert_eq!(ids(&report.out_of_stock), vec![1]);
        assert_eq!(ids(&report.low_stock), vec![2]);
        assert_eq!(ids(&report.expired), vec![1]);
        assert_eq!(ids(&report.expiring), vec![2]);
        assert_eq!(ids(&report.quarantined), vec![3]);
        assert_eq!(report.expiring[0].days_until_expiry, Some(31));
    }

    #[test]
    fn expiry_on_the_day_counts_as_expired() {
        let mut p = part(1, 5);
        p.attributes.shelf_life = Some(today());
        let report = InventoryReport::build(&[p], today());
        assert_eq!(report.expired.len(), 1);
        assert!(report.expiring.is_empty());
    }

    #[test]
    fn money_goes_out_as_json_numbers() {
        let mut p = part(1, 2);
        p.attributes.unit_cost = Decimal::new(125050, 2);
        let report = InventoryReport::build(&[p], today());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalValue"], 2501.0);
        assert_eq!(json["lowStock"][0]["partNumber"], "PN-3305-C");

        let back: InventoryReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.total_value, Decimal::new(2501, 0));
    }
}
