// Copyright 2023 Mikael Lund
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

//! # Live plotting with gnuplot
//!
//! Plots are streamed as commands and inline data to a `gnuplot` process.
//! Plotting is a convenience only; callers log failures and carry on.

use crate::{Chain, ContactMap};
use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Handle to a running `gnuplot -persist` process
#[derive(Debug)]
pub struct Gnuplot {
    child: Child,
    stdin: ChildStdin,
}

impl Gnuplot {
    /// Start gnuplot; fails if the executable cannot be found.
    pub fn spawn() -> anyhow::Result<Self> {
        let mut child = Command::new("gnuplot")
            .arg("-persist")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Cannot start gnuplot: {}", e))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("gnuplot has no standard input"))?;
        log::debug!("Started gnuplot with pid {}", child.id());
        Ok(Self { child, stdin })
    }

    /// Three dimensional line plot of the chain colored by height.
    pub fn plot_chain(&mut self, chain: &Chain, caption: &str) -> anyhow::Result<()> {
        write_chain(&mut self.stdin, chain, caption)?;
        Ok(self.stdin.flush()?)
    }

    /// Binary image of the native contacts.
    pub fn plot_contact_map(&mut self, contacts: &ContactMap, caption: &str) -> anyhow::Result<()> {
        write_contact_map(&mut self.stdin, contacts, caption)?;
        Ok(self.stdin.flush()?)
    }

    /// Energy as a function of the sample number, read from an energy file.
    pub fn plot_energies(&mut self, path: &Path) -> anyhow::Result<()> {
        write_energies(&mut self.stdin, path)?;
        Ok(self.stdin.flush()?)
    }
}

impl Drop for Gnuplot {
    fn drop(&mut self) {
        if writeln!(self.stdin, "quit").is_err() {
            log::debug!("gnuplot exited early");
        }
        // `-persist` keeps open windows alive after gnuplot exits
        if let Err(err) = self.child.wait() {
            log::debug!("Waiting for gnuplot failed: {}", err);
        }
    }
}

/// Strip characters that would end a single-quoted gnuplot string.
fn quote(caption: &str) -> String {
    caption.replace('\'', "")
}

pub(crate) fn write_chain(stream: &mut impl Write, chain: &Chain, caption: &str) -> anyhow::Result<()> {
    writeln!(stream, "set terminal wxt 0 noraise")?;
    writeln!(stream, "set title '{}'", quote(caption))?;
    writeln!(stream, "set view equal xyz")?;
    writeln!(stream, "set linetype 1 linecolor palette z linewidth 5")?;
    writeln!(stream, "unset tics")?;
    writeln!(stream, "unset border")?;
    writeln!(stream, "unset colorbox")?;
    writeln!(stream, "splot '-' title '' with lines")?;
    for pos in chain.positions() {
        writeln!(stream, "{:.6} {:.6} {:.6}", pos.x, pos.y, pos.z)?;
    }
    writeln!(stream, "e")?;
    Ok(())
}

pub(crate) fn write_contact_map(
    stream: &mut impl Write,
    contacts: &ContactMap,
    caption: &str,
) -> anyhow::Result<()> {
    let n = contacts.num_beads();
    writeln!(stream, "set title '{}'", quote(caption))?;
    writeln!(stream, "set terminal wxt 1 noraise")?;
    writeln!(stream, "set palette gray")?;
    writeln!(stream, "unset colorbox")?;
    writeln!(stream, "set tics out nooffset")?;
    writeln!(stream, "set xtics 0,5,{n}")?;
    writeln!(stream, "set ytics 0,5,{n}")?;
    writeln!(stream, "plot '-' matrix notitle with image")?;
    write!(stream, "{contacts}")?;
    writeln!(stream, "e\ne")?;
    Ok(())
}

pub(crate) fn write_energies(stream: &mut impl Write, path: &Path) -> anyhow::Result<()> {
    writeln!(stream, "set terminal wxt 2 noraise")?;
    writeln!(stream, "set title '{}'", quote(&path.display().to_string()))?;
    writeln!(stream, "set xlabel 'sample'")?;
    writeln!(stream, "set ylabel 'energy'")?;
    writeln!(stream, "plot '{}' using 0:1 notitle with lines", quote(&path.display().to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_script() {
        let chain = Chain::reference("1PGB").unwrap();
        let mut buffer = Vec::new();
        write_chain(&mut buffer, &chain, "it's native").unwrap();
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("set title 'its native'"));
        assert!(script.contains("13.935000 18.529000 29.843000"));
        assert_eq!(script.lines().count(), 8 + chain.len() + 1);
        assert!(script.ends_with("e\n"));
    }

    #[test]
    fn contact_map_script() {
        let chain = Chain::reference("2GB1").unwrap();
        let map = ContactMap::new(&chain, 10.0).unwrap();
        let mut buffer = Vec::new();
        write_contact_map(&mut buffer, &map, "2GB1").unwrap();
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("set xtics 0,5,56"));
        assert_eq!(script.lines().filter(|l| l.starts_with("0 ") || l.starts_with("1 ")).count(), 56);
    }

    #[test]
    fn energies_script() {
        let mut buffer = Vec::new();
        write_energies(&mut buffer, Path::new("out/energy_0.50.dat")).unwrap();
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.starts_with("set terminal wxt 2 noraise\n"));
        assert!(script.contains("set title 'out/energy_0.50.dat'"));
        assert!(script.ends_with("plot 'out/energy_0.50.dat' using 0:1 notitle with lines\n"));
    }
}
