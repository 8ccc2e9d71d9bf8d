//! Demo catalog used to seed empty stores.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::part::{Condition, NewPart, PartAttributes};

struct Row {
    part_number: &'static str,
    description: &'static str,
    category: &'static str,
    manufacturer: &'static str,
    serial_number: &'static str,
    batch_number: &'static str,
    quantity: i64,
    reorder_point: i64,
    location: &'static str,
    condition: Condition,
    cert_of_conformance: &'static str,
    shelf_life: Option<(i32, u32, u32)>,
    unit_cost_cents: i64,
}

const ROWS: [Row; 8] = [
    Row {
        part_number: "PN-7201-A",
        description: "Turbine Blade Assembly",
        category: "Engine",
        manufacturer: "Rolls-Royce",
        serial_number: "SN-TR-90412",
        batch_number: "BT-2025-001",
        quantity: 12,
        reorder_point: 5,
        location: "Warehouse A",
        condition: Condition::New,
        cert_of_conformance: "COC-RR-2025-0412",
        shelf_life: Some((2028, 6, 15)),
        unit_cost_cents: 1_450_000,
    },
    Row {
        part_number: "PN-3305-C",
        description: "EFIS Display Unit",
        category: "Avionics",
        manufacturer: "Honeywell",
        serial_number: "SN-EF-77231",
        batch_number: "BT-2025-002",
        quantity: 3,
        reorder_point: 4,
        location: "Warehouse B",
        condition: Condition::Serviceable,
        cert_of_conformance: "COC-HW-2025-0098",
        shelf_life: Some((2027, 12, 1)),
        unit_cost_cents: 3_200_000,
    },
    Row {
        part_number: "PN-1150-B",
        description: "Hydraulic Pump Assy",
        category: "Hydraulic",
        manufacturer: "Parker Hannifin",
        serial_number: "SN-HP-55102",
        batch_number: "BT-2024-088",
        quantity: 8,
        reorder_point: 3,
        location: "Hangar 1",
        condition: Condition::New,
        cert_of_conformance: "COC-PH-2024-0088",
        shelf_life: Some((2029, 3, 20)),
        unit_cost_cents: 870_000,
    },
    Row {
        part_number: "PN-6600-D",
        description: "Main Landing Gear Actuator",
        category: "Landing Gear",
        manufacturer: "Safran",
        serial_number: "SN-LG-34201",
        batch_number: "BT-2025-015",
        quantity: 2,
        reorder_point: 2,
        location: "Warehouse A",
        condition: Condition::Serviceable,
        cert_of_conformance: "COC-SF-2025-0015",
        shelf_life: Some((2030, 1, 10)),
        unit_cost_cents: 4_500_000,
    },
    Row {
        part_number: "PN-8820-E",
        description: "Generator Control Unit",
        category: "Electrical",
        manufacturer: "GE Aviation",
        serial_number: "SN-GC-61023",
        batch_number: "BT-2025-022",
        quantity: 0,
        reorder_point: 2,
        location: "Warehouse B",
        condition: Condition::Unserviceable,
        cert_of_conformance: "COC-GE-2025-0022",
        shelf_life: Some((2026, 8, 30)),
        unit_cost_cents: 1_850_000,
    },
    Row {
        part_number: "PN-4410-F",
        description: "Fuel Filter Element",
        category: "Consumable",
        manufacturer: "Pall Aerospace",
        serial_number: "",
        batch_number: "BT-2025-040",
        quantity: 45,
        reorder_point: 20,
        location: "Warehouse A",
        condition: Condition::New,
        cert_of_conformance: "COC-PA-2025-0040",
        shelf_life: Some((2026, 4, 1)),
        unit_cost_cents: 32_000,
    },
    Row {
        part_number: "PN-9901-G",
        description: "Wing Skin Panel (Repair)",
        category: "Airframe",
        manufacturer: "Boeing",
        serial_number: "SN-WS-11002",
        batch_number: "BT-2024-100",
        quantity: 1,
        reorder_point: 1,
        location: "Quarantine Bay",
        condition: Condition::Quarantined,
        cert_of_conformance: "",
        shelf_life: None,
        unit_cost_cents: 6_700_000,
    },
    Row {
        part_number: "PN-2255-H",
        description: "AN3-5A Bolt",
        category: "Hardware",
        manufacturer: "SPS Technologies",
        serial_number: "",
        batch_number: "BT-2025-060",
        quantity: 500,
        reorder_point: 200,
        location: "Warehouse A",
        condition: Condition::New,
        cert_of_conformance: "COC-SPS-2025-0060",
        shelf_life: None,
        unit_cost_cents: 150,
    },
];

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// The eight demo parts, with their on-hand quantity as the opening balance.
pub fn demo_parts() -> Vec<NewPart> {
    ROWS.iter()
        .map(|row| NewPart {
            attributes: PartAttributes {
                part_number: row.part_number.to_string(),
                description: row.description.to_string(),
                category: row.category.to_string(),
                manufacturer: row.manufacturer.to_string(),
                serial_number: optional(row.serial_number),
                batch_number: optional(row.batch_number),
                reorder_point: row.reorder_point,
                location: row.location.to_string(),
                condition: row.condition,
                cert_of_conformance: optional(row.cert_of_conformance),
                shelf_life: row
                    .shelf_life
                    .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
                unit_cost: Decimal::new(row.unit_cost_cents, 2),
            },
            opening_quantity: row.quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_catalog_is_valid() {
        let parts = demo_parts();
        assert_eq!(parts.len(), 8);
        for p in parts {
            assert!(p.clone().normalized().is_ok(), "{}", p.attributes.part_number);
        }
    }

    #[test]
    fn efis_unit_starts_below_reorder_point() {
        let efis = demo_parts()
            .into_iter()
            .find(|p| p.attributes.part_number == "PN-3305-C")
            .unwrap();
        assert_eq!(efis.opening_quantity, 3);
        assert_eq!(efis.attributes.unit_cost, Decimal::from(32000));
    }
}
