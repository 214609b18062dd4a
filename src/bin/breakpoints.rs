//! Reasonableness check on the AQI breakpoint table.
//!
//! Print a table of sample PM2.5 concentrations swept across every bracket
//! boundary, with the index and category each maps to.

use airq::aqi::AqiResult;

fn main() {
    let samples = [
        0.0, 5.0, 12.0, 12.1, 20.0, 35.4, 35.5, 50.0, 55.4, 55.5, 100.0, 150.4, 150.5, 200.0,
        250.4, 250.5, 300.0, 350.4, 350.5, 450.0, 500.0, 750.0, 1000.0,
    ];
    for pm in samples {
        let aqi = AqiResult::from_concentration(pm).expect("sample in range");
        println!("{pm:>7.1} µg/m³ -> {:>3} {}", aqi.index, aqi.category);
    }
}
