//! Decoding the PurpleAir compact sensor feed.
//!
//! The public `data.json` feed compresses records into a list of field
//! names plus rows of positional values:
//!
//! ```json
//! {"fields":["ID","AGE","pm_1","conf","Type","Label","Lat","Lon"],
//!  "data":[[20,1,4.7,90,0,"Oak St",45.52,-122.68]]}
//! ```
//!
//! Only some columns matter here: `ID`, `Lat`, `Lon`, `pm_1` (the PM2.5
//! concentration), `Type` (0 means outdoor), and `AGE` (minutes since the
//! sensor reported, normalized to seconds). Everything else rides along
//! unread.

use serde::Deserialize;
use serde_json::Value;

use super::RawRecord;
use crate::Error;

/// The feed envelope. Rows hold mixed types (labels are strings), so cells
/// stay as raw JSON values until a column is read.
#[derive(Debug, Deserialize)]
struct Feed {
    fields: Vec<String>,
    data: Vec<Vec<Value>>,
}

/// Positions of the required columns within a row.
struct Columns {
    id: usize,
    lat: usize,
    lon: usize,
    pm: usize,
    sensor_type: usize,
    age: usize,
}

impl Columns {
    fn locate(fields: &[String]) -> Result<Self, Error> {
        let position = |name: &str| {
            fields
                .iter()
                .position(|field| field == name)
                .ok_or_else(|| Error::Feed(format!("feed has no {name:?} column: {fields:?}")))
        };
        Ok(Columns {
            id: position("ID")?,
            lat: position("Lat")?,
            lon: position("Lon")?,
            pm: position("pm_1")?,
            sensor_type: position("Type")?,
            age: position("AGE")?,
        })
    }
}

/// Decode feed text into records.
///
/// Rows missing a required cell, or with something non-numeric (or
/// non-finite) in one, are dropped rather than failing the feed: the
/// upstream regularly includes sensors with no current reading. Drops are
/// counted in a debug log.
pub fn decode_feed(text: &str) -> Result<Vec<RawRecord>, Error> {
    let feed = parse_envelope(text)?;
    tracing::debug!("feed fields: {:?}", feed.fields);
    let columns = Columns::locate(&feed.fields)?;

    let mut records = Vec::with_capacity(feed.data.len());
    let mut dropped = 0usize;
    for row in &feed.data {
        match decode_row(row, &columns) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!("dropped {dropped} rows with missing or unusable cells");
    }
    tracing::debug!("decoded {} sensor records", records.len());
    Ok(records)
}

fn decode_row(row: &[Value], columns: &Columns) -> Option<RawRecord> {
    let number = |column: usize| {
        row.get(column)
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite())
    };
    Some(RawRecord {
        id: number(columns.id)? as u32,
        latitude: number(columns.lat)?,
        longitude: number(columns.lon)?,
        concentration: number(columns.pm)?,
        sensor_type: number(columns.sensor_type)? as u8,
        // AGE is in minutes.
        age_seconds: (number(columns.age)? * 60.0) as u64,
    })
}

/// Parse the feed envelope, tolerating its known quirk: the upstream
/// sometimes emits `"data":[]` immediately followed by the real rows,
/// which is not JSON. One textual fix is attempted before giving up.
fn parse_envelope(text: &str) -> Result<Feed, Error> {
    match serde_json::from_str(text) {
        Ok(feed) => Ok(feed),
        Err(first) => {
            tracing::warn!("feed is not valid JSON ({first}); retrying with the data\":[] fix");
            let fixed = text.replacen("data\":[]", "data\":[", 1);
            serde_json::from_str(&fixed)
                .map_err(|err| Error::Feed(format!("unparseable even after the fix: {err}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{"version":"7.0.11",
        "fields":["ID","AGE","pm_1","conf","Type","Label","Lat","Lon"],
        "data":[
            [20,1,4.7,90,0,"Oak St",45.52,-122.68],
            [47,0,12.5,85,1,"Garage",45.53,-122.67],
            [99,480,30.1,70,0,"Ridge",45.60,-122.60]
        ]}"#;

    #[test]
    fn decodes_rows_by_field_name() {
        let records = decode_feed(FEED).expect("feed should decode");
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.id, 20);
        assert_eq!(first.latitude, 45.52);
        assert_eq!(first.longitude, -122.68);
        assert_eq!(first.concentration, 4.7);
        assert_eq!(first.sensor_type, 0);
        // 1 minute.
        assert_eq!(first.age_seconds, 60);

        assert_eq!(records[1].sensor_type, 1);
        assert_eq!(records[2].age_seconds, 480 * 60);
    }

    #[test]
    fn column_order_does_not_matter() {
        let reordered = r#"{"fields":["Lat","Lon","ID","Type","AGE","pm_1"],
            "data":[[45.52,-122.68,7,0,2,9.9]]}"#;
        let records = decode_feed(reordered).expect("feed should decode");
        assert_eq!(records[0].id, 7);
        assert_eq!(records[0].concentration, 9.9);
        assert_eq!(records[0].age_seconds, 120);
    }

    #[test]
    fn unusable_rows_are_dropped_not_fatal() {
        let feed = r#"{"fields":["ID","AGE","pm_1","Type","Lat","Lon"],
            "data":[
                [1,1,5.5,0,45.5,-122.6],
                [2,1,null,0,45.5,-122.6],
                [3,1,"offline",0,45.5,-122.6],
                [4,1,6.5,0,45.5],
                [5,1,6.6,0,45.5,-122.7]
            ]}"#;
        let records = decode_feed(feed).expect("feed should decode");
        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn truncated_data_marker_is_fixed_once() {
        // The upstream quirk: a spurious "data":[] before the real rows.
        let broken = r#"{"fields":["ID","AGE","pm_1","Type","Lat","Lon"],
            "data":[][1,1,5.5,0,45.5,-122.6]]}"#;
        let records = decode_feed(broken).expect("fix should apply");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn garbage_is_a_feed_error() {
        let err = decode_feed("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, Error::Feed(_)));
    }

    #[test]
    fn missing_column_is_a_feed_error() {
        let feed = r#"{"fields":["ID","AGE","Type","Lat","Lon"],"data":[]}"#;
        let err = decode_feed(feed).unwrap_err();
        match err {
            Error::Feed(message) => assert!(message.contains("pm_1"), "{message}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_data_is_fine() {
        let feed = r#"{"fields":["ID","AGE","pm_1","Type","Lat","Lon"],"data":[]}"#;
        let records = decode_feed(feed).expect("feed should decode");
        assert!(records.is_empty());
    }
}
