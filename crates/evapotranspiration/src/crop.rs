use std::{collections::BTreeMap, io::Write};

use crop_common::{DenseCurve, Doy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::Result,
    penman::{reference_et0, RadiationConfig},
    weather::DailyWeather,
};

/// Reference evapotranspiration keyed by day of year
pub type Et0Series = BTreeMap<Doy, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EtcRecord {
    pub doy: Doy,
    pub et0: f64,
    pub kc: f64,
    pub etc: f64,
}

/// ET0 for every weather day; a repeated day keeps its first record
pub fn et0_series(records: &[DailyWeather], config: &RadiationConfig) -> Et0Series {
    let mut series = Et0Series::new();
    for weather in records {
        if series.contains_key(&weather.doy) {
            warn!(doy = weather.doy, "duplicate weather day dropped");
            continue;
        }
        series.insert(weather.doy, reference_et0(weather, config));
    }
    debug!(days = series.len(), "reference evapotranspiration computed");
    series
}

/// ETc = ET0 x Kc for each day present in both inputs.
///
/// Days outside the Kc curve yield nothing.
pub fn crop_evapotranspiration(et0: &Et0Series, kc_curve: &DenseCurve) -> Vec<EtcRecord> {
    let range = kc_curve.start_doy()..=kc_curve.end_doy();
    et0.range(range)
        .filter_map(|(&doy, &et0)| {
            kc_curve.get(doy).map(|kc| EtcRecord {
                doy,
                et0,
                kc,
                etc: et0 * kc,
            })
        })
        .collect()
}

pub fn write_et0_csv<W: Write>(series: &Et0Series, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["doy", "et0"])?;
    for (doy, et0) in series {
        writer.write_record([doy.to_string(), et0.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_etc_csv<W: Write>(records: &[EtcRecord], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
