use convective_profile::{ForecastLevel, ForecastProfile, SurfaceObservation};
use metfor::{Celsius, HectoPascal, MetersPSec};
use serde_json::Value;
use std::{fs::File, io::Read, path::PathBuf};

pub fn load_all_scenarios() -> [(SurfaceObservation, ForecastProfile); 4] {
    [
        load_scenario("convective.json"),
        load_scenario("stable.json"),
        load_scenario("elevated.json"),
        load_scenario("sparse_humidity.json"),
    ]
}

fn load_scenario(fname: &str) -> (SurfaceObservation, ForecastProfile) {
    let mut path = PathBuf::new();
    path.push("test_data");
    path.push(fname);

    let mut f = File::open(&path).expect(&format!("Error opening file: {:#?}", path));
    let mut contents = String::new();
    f.read_to_string(&mut contents)
        .expect(&format!("Error reading file: {:#?}", path));

    let doc: Value = serde_json::from_str(&contents).expect("Error parsing scenario");

    let sfc = &doc["surface"];
    let obs = SurfaceObservation::new(
        Celsius(sfc["temperature_c"].as_f64().unwrap()),
        HectoPascal(sfc["pressure_hpa"].as_f64().unwrap()),
    )
    .with_dew_point(sfc["dew_point_c"].as_f64().map(Celsius))
    .with_relative_humidity(sfc["relative_humidity"].as_f64())
    .with_wind_speed(sfc["wind_speed_mps"].as_f64().map(MetersPSec));

    let levels: Vec<ForecastLevel> = doc["levels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|lvl| {
            ForecastLevel::new(
                HectoPascal(lvl["pressure_hpa"].as_f64().unwrap()),
                lvl["temperature_c"].as_f64().map(Celsius),
                lvl["relative_humidity"].as_f64(),
            )
        })
        .collect();

    let forecast = ForecastProfile::new()
        .with_levels(levels)
        .with_upper_wind(doc["upper_wind_mps"].as_f64().map(MetersPSec));

    (obs, forecast)
}
