use chrono::NaiveDateTime;
use convective_profile::{ForecastLevel, ForecastProfile, SurfaceObservation};
use metfor::{Celsius, HectoPascal, MetersPSec, Quantity};
use serde::Deserialize;
use std::{fs::File, io::Read, path::PathBuf};

#[allow(unused_macros)] // False alarm
macro_rules! check_scenario {
    ($test_name:ident, $fname:expr) => {
        #[test]
        fn $test_name() {
            let (obs, forecast) = utils::load_scenario($fname);
            let result = convective_profile::ConvectiveEngine::default()
                .evaluate(&obs, &forecast)
                .unwrap();

            utils::check_invariants(&obs, &result);
        }
    };
}

#[derive(Deserialize)]
struct Scenario {
    surface: SurfaceRecord,
    model: Option<String>,
    valid_time: Option<NaiveDateTime>,
    surface_wind_mps: Option<f64>,
    upper_wind_mps: Option<f64>,
    levels: Vec<LevelRecord>,
}

#[derive(Deserialize)]
struct SurfaceRecord {
    temperature_c: f64,
    pressure_hpa: f64,
    dew_point_c: Option<f64>,
    relative_humidity: Option<f64>,
    wind_speed_mps: Option<f64>,
    wind_gust_mps: Option<f64>,
}

#[derive(Deserialize)]
struct LevelRecord {
    pressure_hpa: f64,
    temperature_c: Option<f64>,
    relative_humidity: Option<f64>,
}

#[allow(dead_code)]
pub fn load_all_scenarios() -> [(SurfaceObservation, ForecastProfile); 4] {
    [
        load_scenario("convective.json"),
        load_scenario("stable.json"),
        load_scenario("elevated.json"),
        load_scenario("sparse_humidity.json"),
    ]
}

pub fn load_scenario(fname: &str) -> (SurfaceObservation, ForecastProfile) {
    let mut path = PathBuf::new();
    path.push("test_data");
    path.push(fname);

    let mut f = File::open(&path).expect(&format!("Error opening file: {:#?}", path));
    let mut contents = String::new();
    f.read_to_string(&mut contents)
        .expect(&format!("Error reading file: {:#?}", path));

    let scenario: Scenario =
        serde_json::from_str(&contents).expect(&format!("Error parsing file: {:#?}", path));

    let sfc = scenario.surface;
    let obs = SurfaceObservation::new(Celsius(sfc.temperature_c), HectoPascal(sfc.pressure_hpa))
        .with_dew_point(sfc.dew_point_c.map(Celsius))
        .with_relative_humidity(sfc.relative_humidity)
        .with_wind_speed(sfc.wind_speed_mps.map(MetersPSec))
        .with_wind_gust(sfc.wind_gust_mps.map(MetersPSec));

    let levels: Vec<ForecastLevel> = scenario
        .levels
        .into_iter()
        .map(|lvl| {
            ForecastLevel::new(
                HectoPascal(lvl.pressure_hpa),
                lvl.temperature_c.map(Celsius),
                lvl.relative_humidity,
            )
        })
        .collect();

    let mut forecast = ForecastProfile::new()
        .with_levels(levels)
        .with_valid_time(scenario.valid_time)
        .with_surface_wind(scenario.surface_wind_mps.map(MetersPSec))
        .with_upper_wind(scenario.upper_wind_mps.map(MetersPSec));
    if let Some(model) = scenario.model {
        forecast = forecast.with_model(model);
    }

    (obs, forecast)
}

/// Properties every result must have, whatever the scenario.
#[allow(dead_code)]
pub fn check_invariants(obs: &SurfaceObservation, result: &convective_profile::ConvectiveResult) {
    use metfor::JpKg;

    assert!(result.sbcape() >= JpKg(0.0));
    assert!(result.cin() <= JpKg(0.0));
    if let Some(mucape) = result.mucape().into_option() {
        assert!(mucape >= result.sbcape());
        let mu_level = result.mu_level().unwrap();
        assert!(mu_level <= obs.pressure());
        assert!(mu_level >= HectoPascal(obs.pressure().unpack() - 300.0));
    }

    assert!(result.lcl_pressure() <= obs.pressure());
    if let Some(lfc) = result.lfc_pressure().into_option() {
        assert!(lfc <= result.lcl_pressure());
        assert!(result.el_pressure().unwrap() <= lfc);
    } else {
        assert_eq!(result.sbcape(), JpKg(0.0));
        assert_eq!(result.cin(), JpKg(0.0));
    }

    assert!(result.severity().score() <= convective_profile::MAX_SCORE);

    let pressure = result.profile().pressure_profile();
    assert_eq!(pressure[0], obs.pressure());
    assert!(pressure.windows(2).all(|pair| pair[0] > pair[1]));

    let record = result.to_record();
    assert!(record.to_json().is_ok());
}
