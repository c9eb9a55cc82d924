use std::{
    collections::HashSet,
    fs,
    io::Read,
    path::Path,
};

use crop_common::{utils, Doy};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{KcError, Result},
    types::{Observation, ObservationSet},
};

/// One row of an NDVI table. Either `doy` or `date` must be present.
#[derive(Debug, Deserialize)]
struct ObservationRow {
    #[serde(default)]
    doy: Option<i64>,
    #[serde(default)]
    date: Option<String>,
    average: f64,
}

/// Zonal statistics for one satellite scene
#[derive(Debug, Clone, Deserialize)]
pub struct SceneStats {
    pub average: Option<f64>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Read observations from a CSV with an `average` column and a `doy` or
/// `date` column.
pub fn read_observations_csv<P: AsRef<Path>>(path: P) -> Result<ObservationSet> {
    let file = fs::File::open(path.as_ref())?;
    read_observations(file)
}

pub fn read_observations<R: Read>(reader: R) -> Result<ObservationSet> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut observations = Vec::new();
    for (line, row) in csv_reader.deserialize::<ObservationRow>().enumerate() {
        let row = row?;
        let doy = match (row.doy, row.date.as_deref()) {
            (Some(doy), _) => utils::check_doy(doy)?,
            (None, Some(date)) => utils::doy_from_date_str(date)?,
            (None, None) => {
                return Err(KcError::Parse(format!(
                    "row {} has neither a doy nor a date",
                    line + 1
                )))
            }
        };
        observations.push(Observation::new(doy, row.average));
    }
    debug!(rows = observations.len(), "observations read");
    ObservationSet::new(dedup_first(observations))
}

/// Read every `*.json` scene file in a directory.
///
/// Scenes without an average are skipped. The acquisition date comes from
/// the file's `date` field, or else from the third `_`-separated token of
/// its name.
pub fn read_scene_dir<P: AsRef<Path>>(dir: P) -> Result<ObservationSet> {
    let mut paths: Vec<_> = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut observations = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = fs::read_to_string(path)?;
        let scene: SceneStats = serde_json::from_str(&text)?;
        let Some(average) = scene.average else {
            debug!(path = %path.display(), "scene has no average, skipped");
            continue;
        };
        let doy = match scene.date.as_deref() {
            Some(date) => utils::doy_from_date_str(date)?,
            None => doy_from_file_name(path)?,
        };
        observations.push(Observation::new(doy, average));
    }
    debug!(scenes = paths.len(), kept = observations.len(), "scene directory read");
    ObservationSet::new(dedup_first(observations))
}

fn doy_from_file_name(path: &Path) -> Result<Doy> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| KcError::Parse(format!("unreadable file name: {}", path.display())))?;
    let token = name
        .split('_')
        .nth(2)
        .ok_or_else(|| KcError::Parse(format!("no date token in file name: {}", name)))?;
    let token = token.strip_suffix(".json").unwrap_or(token);
    Ok(utils::doy_from_date_str(token)?)
}

/// Keep the first record for each day in encounter order
fn dedup_first(observations: Vec<Observation>) -> Vec<Observation> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(observations.len());
    for obs in observations {
        if seen.insert(obs.doy) {
            kept.push(obs);
        } else {
            warn!(doy = obs.doy, value = obs.value, "duplicate day of year dropped");
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_csv_with_doy_column() {
        let data = "doy,average,minimum\n120,0.4,0.1\n100,0.2,0.0\n110,0.3,0.1\n";
        let set = read_observations(data.as_bytes()).unwrap();
        let doys: Vec<Doy> = set.iter().map(|o| o.doy).collect();
        assert_eq!(doys, vec![100, 110, 120]);
        assert_eq!(set.last().unwrap().value, 0.4);
    }

    #[test]
    fn test_csv_with_dates_and_duplicates() {
        let data = "date,average\n2021-02-01,0.3\n2021-01-01,0.2\n2021-02-01,0.9\n";
        let set = read_observations(data.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.first().unwrap().doy, 1);
        assert_eq!(set.last().unwrap(), &Observation::new(32, 0.3));
    }

    #[test]
    fn test_csv_missing_day() {
        let data = "average\n0.3\n";
        assert!(read_observations(data.as_bytes()).is_err());
        let data = "doy,average\n400,0.3\n";
        assert!(matches!(read_observations(data.as_bytes()), Err(KcError::Common(_))));
    }

    #[test]
    fn test_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "doy,average").unwrap();
        writeln!(file, "150,0.65").unwrap();
        let set = read_observations_csv(file.path()).unwrap();
        assert_eq!(set.as_slice(), &[Observation::new(150, 0.65)]);
    }

    #[test]
    fn test_scene_dir() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| fs::write(dir.path().join(name), body).unwrap();
        write("plot_ndvi_2021-06-14_stats.json", r#"{"average": 0.55, "minimum": 0.2, "maximum": 0.8}"#);
        write("plot_ndvi_2021-05-01.json", r#"{"average": 0.35, "minimum": 0.1, "maximum": 0.6}"#);
        write("scene.json", r#"{"average": 0.7, "minimum": 0.3, "maximum": 0.9, "date": "2021-07-01"}"#);
        write("cloudy_ndvi_2021-06-20.json", r#"{"average": null}"#);
        write("notes.txt", "ignored");

        let set = read_scene_dir(dir.path()).unwrap();
        let pairs: Vec<(Doy, f64)> = set.iter().map(|o| (o.doy, o.value)).collect();
        assert_eq!(pairs, vec![(121, 0.35), (165, 0.55), (182, 0.7)]);
    }

    #[test]
    fn test_scene_without_date() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scene.json"), r#"{"average": 0.4}"#).unwrap();
        assert!(matches!(read_scene_dir(dir.path()), Err(KcError::Parse(_))));
    }
}
