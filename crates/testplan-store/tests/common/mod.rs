#![allow(dead_code)]

use chrono::NaiveDate;
use testplan_core::{Test, TestPlan, Vehicle};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Two vehicles: one sequential with milestones, one explicit without
pub fn fleet_plan() -> TestPlan {
    TestPlan::new("fleet")
        .vehicle(
            Vehicle::new("V001")
                .sopm(date(2025, 1, 1))
                .lrm(date(2025, 6, 1))
                .vin("VF1ABC")
                .chassis("CH-01")
                .test(Test::new("Brakes", 3).responsible("Lab A"))
                .test(Test::new("Noise", 2).responsible("Lab B")),
        )
        .vehicle(
            Vehicle::new("V002")
                .test(Test::new("Climate", 4).starting(date(2025, 3, 10)))
                .test(Test::new("Brakes", 1).starting(date(2025, 3, 12))),
        )
}
