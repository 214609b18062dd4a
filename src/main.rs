use airq::cache::FileCache;
use airq::geo::GeoPoint;
use airq::sensors::{CachedSource, FileSource};
use airq::Settings;

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let latitude: f64 = args
        .next()
        .expect("usage: airq LAT LON [FEED]")
        .parse()
        .expect("LAT must be a number");
    let longitude: f64 = args
        .next()
        .expect("usage: airq LAT LON [FEED]")
        .parse()
        .expect("LON must be a number");
    let feed = args.next().unwrap_or_else(|| "data/data.json".to_string());
    tracing::info!("query position: {latitude}, {longitude}; feed: {feed}");

    let settings = Settings::default();
    let mut source = CachedSource::new(
        FileSource::new(feed),
        FileCache::new(std::env::temp_dir()),
        settings.cache_max_age,
    );

    let query = GeoPoint::new(latitude, longitude);
    let result = airq::estimate_at(query, &mut source, &settings).expect("could not estimate");

    // Is the air OK outside?
    let verdict = if result.aqi.index < 151 { "Yes" } else { "No" };
    let (low, high) = result.concentration_range();
    println!("{verdict}");
    println!(
        "PurpleAir sensors (~{:.1}km away)",
        result.nearest_distance_km
    );
    println!("say the Air Quality Index is");
    println!("{}", result.aqi);
    println!("(pm2.5 is between {} and {})", low.round(), high.round());
    println!("{}", result.aqi.description);
}
