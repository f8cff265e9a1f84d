// Copyright 2023-2024 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! XYZ format reader and writer.
//!
//! A frame is an atom count, a free-text title and one `label x y z` line per atom.
//! Trajectories are frames concatenated in a single file.

use crate::Point;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

/// In-memory representation of a single XYZ frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub title: String,
    pub labels: Vec<String>,
    pub positions: Vec<Point>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.positions.len())?;
        writeln!(f, "{}", self.title)?;
        for (label, pos) in self.labels.iter().zip(self.positions.iter()) {
            writeln!(f, "{} {} {} {}", label, pos.x, pos.y, pos.z)?;
        }
        Ok(())
    }
}

/// Parse the next frame from a line iterator. Returns `None` at end of input.
///
/// `line_number` tracks the current line for error messages.
fn next_frame<R: BufRead>(
    lines: &mut Lines<R>,
    line_number: &mut usize,
) -> Option<anyhow::Result<Frame>> {
    // Line 1: atom count; skip blank separators between frames
    let count_line = loop {
        let line = lines.next()?;
        *line_number += 1;
        match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => break line,
            Err(err) => return Some(Err(err.into())),
        }
    };
    Some(parse_frame(count_line, lines, line_number))
}

fn parse_frame<R: BufRead>(
    count_line: String,
    lines: &mut Lines<R>,
    line_number: &mut usize,
) -> anyhow::Result<Frame> {
    let num_atoms: usize = count_line.trim().parse().map_err(|_| {
        anyhow::anyhow!(
            "Invalid atom count '{}' on line {}",
            count_line.trim(),
            line_number
        )
    })?;

    // Line 2: title
    let title = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("Missing title line after line {}", line_number))??;
    *line_number += 1;

    // the count is untrusted; vectors grow with the atom lines actually present
    let mut labels = Vec::new();
    let mut positions = Vec::new();

    for _ in 0..num_atoms {
        let line = lines.next().ok_or_else(|| {
            anyhow::anyhow!("Expected {} atoms but found {}", num_atoms, positions.len())
        })??;
        *line_number += 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            anyhow::bail!("Malformed atom line {}: '{}'", line_number, line);
        }
        let coordinate = |k: usize, axis: &str| -> anyhow::Result<f64> {
            parts[k].parse().map_err(|_| {
                anyhow::anyhow!("Invalid {} coordinate on line {}", axis, line_number)
            })
        };
        let position = Point::new(coordinate(1, "x")?, coordinate(2, "y")?, coordinate(3, "z")?);
        labels.push(parts[0].to_string());
        positions.push(position);
    }

    Ok(Frame {
        title: title.trim().to_string(),
        labels,
        positions,
    })
}

fn open_lines(path: &Path) -> anyhow::Result<Lines<BufReader<File>>> {
    let file =
        File::open(path).map_err(|e| anyhow::anyhow!("Cannot open '{}': {}", path.display(), e))?;
    Ok(BufReader::new(file).lines())
}

/// Read the first frame of a file.
pub fn read_frame(path: &Path) -> anyhow::Result<Frame> {
    let mut lines = open_lines(path)?;
    let mut line_number = 0;
    next_frame(&mut lines, &mut line_number)
        .ok_or_else(|| anyhow::anyhow!("Empty XYZ file: {}", path.display()))?
        .map_err(|e| anyhow::anyhow!("{} in {}", e, path.display()))
}

/// Read all frames of a trajectory. Fails on the first malformed frame.
pub fn read_trajectory(path: &Path) -> anyhow::Result<Vec<Frame>> {
    let mut lines = open_lines(path)?;
    let mut line_number = 0;
    let mut frames = Vec::new();
    while let Some(frame) = next_frame(&mut lines, &mut line_number) {
        frames.push(frame.map_err(|e| anyhow::anyhow!("{} in {}", e, path.display()))?);
    }
    Ok(frames)
}

/// Read the last successfully parsed frame of a trajectory.
///
/// Reading stops at the first malformed frame which typically is a
/// partially written frame at the end of an interrupted run.
pub fn read_latest(path: &Path) -> anyhow::Result<Frame> {
    let mut lines = open_lines(path)?;
    let mut line_number = 0;
    let mut latest = None;
    while let Some(frame) = next_frame(&mut lines, &mut line_number) {
        match frame {
            Ok(frame) => latest = Some(frame),
            Err(err) => {
                log::warn!("Ignoring trailing frame in {}: {}", path.display(), err);
                break;
            }
        }
    }
    latest.ok_or_else(|| anyhow::anyhow!("No complete frame in {}", path.display()))
}

/// Write a frame to `path`. If `append` is true, the frame is added to the end of the file.
pub fn write_frame(path: &Path, frame: &Frame, append: bool) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open '{}' for writing: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    write!(writer, "{frame}")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn two_beads(title: &str, x: f64) -> Frame {
        Frame {
            title: title.into(),
            labels: vec!["CA".into(), "CA".into()],
            positions: vec![Point::new(x, 2.0, 3.0), Point::new(4.0, 5.0, 6.0)],
        }
    }

    #[test]
    fn read_empty_file() {
        let path = std::env::temp_dir().join("beadfold_test_empty.xyz");
        std::fs::write(&path, "").unwrap();
        assert!(read_frame(&path).is_err());
        assert!(read_latest(&path).is_err());
        assert!(read_trajectory(&path).unwrap().is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn read_bad_atom_count() {
        let path = std::env::temp_dir().join("beadfold_test_bad_count.xyz");
        std::fs::write(&path, "abc\ncomment\n").unwrap();
        let err = read_frame(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid atom count"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn read_malformed_line() {
        let path = std::env::temp_dir().join("beadfold_test_malformed.xyz");
        std::fs::write(&path, "1\ncomment\nCA 1.0 2.0\n").unwrap();
        let err = read_frame(&path).unwrap_err();
        assert!(err.to_string().contains("Malformed"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn read_too_few_atoms() {
        let path = std::env::temp_dir().join("beadfold_test_few.xyz");
        std::fs::write(&path, "3\ncomment\nCA 1.0 2.0 3.0\n").unwrap();
        let err = read_frame(&path).unwrap_err();
        assert!(err.to_string().contains("Expected 3"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn huge_atom_count_is_an_error() {
        let path = std::env::temp_dir().join("beadfold_test_huge_count.xyz");
        std::fs::write(&path, "100000000000000\ntitle\nCA 1 2 3\n").unwrap();
        let err = read_frame(&path).unwrap_err();
        assert!(err.to_string().contains("Expected 100000000000000 atoms but found 1"));

        write_frame(&path, &two_beads("valid", 1.0), false).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "100000000000000\ntitle\nCA 1 2 3\n").unwrap();
        drop(file);
        assert_eq!(read_latest(&path).unwrap().title, "valid");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn write_then_read() {
        let path = std::env::temp_dir().join("beadfold_test_single.xyz");
        let frame = two_beads("test frame", 1.0);
        write_frame(&path, &frame, false).unwrap();
        let read_back = read_frame(&path).unwrap();
        assert_eq!(read_back.title, "test frame");
        assert_eq!(read_back.labels, frame.labels);
        assert_approx_eq!(f64, read_back.positions[1].z, 6.0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn trajectory_and_latest() {
        let path = std::env::temp_dir().join("beadfold_test_trajectory.xyz");
        write_frame(&path, &two_beads("first", 1.0), false).unwrap();
        write_frame(&path, &two_beads("second", 7.0), true).unwrap();
        let frames = read_trajectory(&path).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].title, "first");

        let latest = read_latest(&path).unwrap();
        assert_eq!(latest.title, "second");
        assert_approx_eq!(f64, latest.positions[0].x, 7.0);

        // a truncated trailing frame is ignored
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "2\nthird\nCA 1.0 1.0 1.0\n").unwrap();
        drop(file);
        assert_eq!(read_latest(&path).unwrap().title, "second");
        assert!(read_trajectory(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
