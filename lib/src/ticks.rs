//! Logarithmic frequency-axis ticks
//!
//! Ticks are laid out decade by decade: each decade start is labeled, the
//! multiples 2..9 inside the decade are unlabeled minor ticks, and the final
//! tick sits exactly on the stop frequency with its own label.

use crate::{PlotError, Result};
use serde::Serialize;

/// Default first decade of a frequency axis, in Hz
pub const DEFAULT_TICK_START: f64 = 10.0;

/// A single tick position with its label (empty for minor ticks)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

impl Tick {
    fn major(position: f64) -> Self {
        Self {
            position,
            label: format_tick_label(position),
        }
    }

    fn minor(position: f64) -> Self {
        Self {
            position,
            label: String::new(),
        }
    }
}

/// Label a frequency in Hz, collapsing a trailing `000Hz` into `kHz`
///
/// `1000` becomes `"1kHz"`, `24000` becomes `"24kHz"`, `22050` stays `"22050Hz"`.
pub fn format_tick_label(freq: f64) -> String {
    let text = if freq.fract() == 0.0 && freq.abs() < 1e15 {
        format!("{}Hz", freq as i64)
    } else {
        format!("{}Hz", freq)
    };
    match text.strip_suffix("000Hz") {
        Some(prefix) if !prefix.is_empty() && prefix != "-" => format!("{}kHz", prefix),
        _ => text,
    }
}

/// Ordered ticks spanning `[start, stop]`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TickSet {
    ticks: Vec<Tick>,
}

impl TickSet {
    /// Decade ticks from `start` up to and including `stop`
    pub fn decades(start: f64, stop: f64) -> Result<Self> {
        if !(start > 0.0) || !start.is_finite() {
            return Err(PlotError::InvalidConfiguration(format!(
                "Tick start must be positive, got {}",
                start
            )));
        }
        if !(stop > start) || !stop.is_finite() {
            return Err(PlotError::InvalidConfiguration(format!(
                "Tick stop must exceed start: start {}, stop {}",
                start, stop
            )));
        }

        let mut ticks = vec![Tick::major(start)];
        let mut decade = start;

        'decades: loop {
            for multiplier in 2..=9 {
                let position = decade * multiplier as f64;
                if position > stop {
                    break 'decades;
                }
                ticks.push(Tick::minor(position));
            }

            decade *= 10.0;
            if decade > stop {
                break;
            }
            ticks.push(Tick::major(decade));
        }

        let last = ticks.last().map(|t| t.position).unwrap_or(start);
        if stop > last {
            ticks.push(Tick::major(stop));
        } else if let Some(tick) = ticks.last_mut() {
            // stop landed exactly on a minor tick
            tick.label = format_tick_label(stop);
        }

        log::debug!("Generated {} ticks from {} to {} Hz", ticks.len(), start, stop);
        Ok(Self { ticks })
    }

    /// Decade ticks from the default start (10 Hz) up to `stop`
    pub fn up_to(stop: f64) -> Result<Self> {
        Self::decades(DEFAULT_TICK_START, stop)
    }

    /// Merge caller-specified ticks, labeled, keeping positions sorted
    ///
    /// Positions already present are kept as they are.
    pub fn with_extra(self, extra: &[f64]) -> Self {
        self.with_extra_labeled(extra, format_tick_label)
    }

    /// Like `with_extra`, with labels produced by `label`
    pub fn with_extra_labeled(mut self, extra: &[f64], label: impl Fn(f64) -> String) -> Self {
        for &position in extra.iter().filter(|p| p.is_finite()) {
            let idx = self.ticks.partition_point(|t| t.position < position);
            let exists = self
                .ticks
                .get(idx)
                .map_or(false, |t| t.position == position);
            if !exists {
                self.ticks.insert(
                    idx,
                    Tick {
                        position,
                        label: label(position),
                    },
                );
            }
        }
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tick> {
        self.ticks.iter()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.ticks.iter().map(|t| t.position).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.ticks.iter().map(|t| t.label.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

impl<'a> IntoIterator for &'a TickSet {
    type Item = &'a Tick;
    type IntoIter = std::slice::Iter<'a, Tick>;

    fn into_iter(self) -> Self::IntoIter {
        self.ticks.iter()
    }
}
