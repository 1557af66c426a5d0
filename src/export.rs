use std::io;
use std::path::Path;

use serde::Serialize;

use crate::session::SessionRecord;
use crate::transform::CoordinateTransform;

const HEADER: [&str; 4] = ["x", "y", "pixel_x", "pixel_y"];

#[derive(Debug, Serialize)]
struct ExportRow {
    x: f64,
    y: f64,
    pixel_x: f64,
    pixel_y: f64,
}

/// Write one CSV row per session with both world and map pixel coordinates.
/// The header is written even when there are no sessions.
pub fn write_csv<W: io::Write>(
    writer: W,
    sessions: &[SessionRecord],
    transform: &CoordinateTransform,
) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(HEADER)?;
    for session in sessions {
        let pixel = transform.apply(session);
        wtr.serialize(ExportRow {
            x: session.x,
            y: session.y,
            pixel_x: pixel.x,
            pixel_y: pixel.y,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv<P: AsRef<Path>>(
    path: P,
    sessions: &[SessionRecord],
    transform: &CoordinateTransform,
) -> csv::Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, sessions, transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows_in_order() {
        let mut out = Vec::new();
        let transform = CoordinateTransform {
            scale: 2.0,
            offset_x: 10.0,
            offset_y: 20.0,
        };
        write_csv(
            &mut out,
            &[SessionRecord::new(4.0, 8.0), SessionRecord::new(-2.0, 1.0)],
            &transform,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["x,y,pixel_x,pixel_y", "4.0,8.0,12.0,24.0", "-2.0,1.0,9.0,20.5"]);
    }

    #[test]
    fn empty_sessions_still_get_a_header() {
        let mut out = Vec::new();
        write_csv(&mut out, &[], &CoordinateTransform::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["x,y,pixel_x,pixel_y"]);
    }
}
