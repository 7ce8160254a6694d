//! Line-based prompts on stdin/stdout (generic so tests can script them).

use anyhow::{bail, Result};
use std::io::{BufRead, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    /// One trimmed line. End of input is an error so loops cannot spin forever.
    pub fn ask(&mut self, msg: &str) -> Result<String> {
        write!(self.output, "{}", msg)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed");
        }
        Ok(line.trim().to_string())
    }

    pub fn ask_or(&mut self, msg: &str, default: &str) -> Result<String> {
        let answer = self.ask(msg)?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    /// Repeats until the answer is an integer in `min..=max`.
    pub fn int_in_range(&mut self, msg: &str, min: usize, max: usize) -> Result<usize> {
        loop {
            let raw = self.ask(msg)?;
            match raw.parse::<usize>() {
                Ok(n) if (min..=max).contains(&n) => return Ok(n),
                _ => self.say(&format!(
                    "Invalid input. Enter a number between {} and {}.",
                    min, max
                ))?,
            }
        }
    }

    /// Numbered menu; returns the index of the chosen item.
    pub fn pick<T>(
        &mut self,
        title: &str,
        items: &[T],
        label: impl Fn(&T) -> String,
    ) -> Result<usize> {
        self.say(&format!("\n{}", title))?;
        for (i, item) in items.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, label(item)))?;
        }
        let n = self.int_in_range(&format!("Enter choice [1-{}]: ", items.len()), 1, items.len())?;
        Ok(n - 1)
    }
}

/// Parses `"1,2,4-6"` into sorted, distinct values in `1..=max`.
/// Reversed ranges are swapped; anything unparsable is ignored.
pub fn parse_season_ranges(input: &str, max: usize) -> Vec<usize> {
    let mut out: Vec<usize> = Vec::new();
    let mut keep = |v: usize| {
        if (1..=max).contains(&v) {
            out.push(v);
        }
    };
    for part in input.split(',').map(str::trim) {
        match part.split_once('-') {
            Some((a, b)) => {
                let (Ok(a), Ok(b)) = (a.trim().parse::<usize>(), b.trim().parse::<usize>()) else {
                    continue;
                };
                let (lo, hi) = if a > b { (b, a) } else { (a, b) };
                for v in lo..=hi.min(max) {
                    keep(v);
                }
            }
            None => {
                if let Ok(v) = part.parse::<usize>() {
                    keep(v);
                }
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}
