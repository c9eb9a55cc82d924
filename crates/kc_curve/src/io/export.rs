use std::{fs, io::Write, path::Path};

use crop_common::DenseCurve;

use crate::{
    error::Result,
    types::{Breakpoint, KcOutput},
};

/// Write a daily curve as two columns, `doy` and `column`
pub fn write_curve_csv<W: Write>(curve: &DenseCurve, column: &str, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["doy", column])?;
    for (doy, value) in curve.iter() {
        writer.write_record([doy.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_curve_csv_file<P: AsRef<Path>>(curve: &DenseCurve, column: &str, path: P) -> Result<()> {
    let file = fs::File::create(path)?;
    write_curve_csv(curve, column, file)
}

pub fn write_breakpoints_csv<W: Write>(breakpoints: &[Breakpoint], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for breakpoint in breakpoints {
        writer.serialize(breakpoint)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_breakpoints_csv_file<P: AsRef<Path>>(breakpoints: &[Breakpoint], path: P) -> Result<()> {
    let file = fs::File::create(path)?;
    write_breakpoints_csv(breakpoints, file)
}

impl KcOutput {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the full report as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
