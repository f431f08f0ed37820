//! Generate dashboard output for a small sample snapshot

use chrono::{TimeZone, Utc};
use healthdash::DashboardConfig;

fn main() {
    let json = r#"{
        "steps": [
            { "date": "2025-05-05T09:00:00Z", "value": 8421 },
            { "date": "2025-05-06T09:00:00Z", "value": 10233 },
            { "date": "2025-05-12T09:00:00Z", "value": 6120 }
        ],
        "weight": [
            { "date": "2025-05-05T07:00:00Z", "value": 168.4 },
            { "date": "2025-05-06T07:00:00Z", "value": 167.9 },
            { "date": "2025-05-07T07:00:00Z", "value": 168.1 }
        ],
        "active_energy": [
            { "date": "2025-05-05T18:00:00Z", "value": 512.5 }
        ],
        "sleep": [
            { "start": "2025-05-06T23:00:00Z", "end": "2025-05-07T00:30:00Z", "stage": "deep" },
            { "start": "2025-05-07T00:30:00Z", "end": "2025-05-07T02:30:00Z", "stage": "rem" },
            { "start": "2025-05-07T02:30:00Z", "end": "2025-05-07T07:00:00Z", "stage": "core" }
        ]
    }"#;

    let config = DashboardConfig {
        utc_offset_minutes: -240,
        ..DashboardConfig::default()
    };
    let now = Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap();

    match healthdash::dashboard_to_json(json, &config, now) {
        Ok(dashboard) => print!("{dashboard}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
