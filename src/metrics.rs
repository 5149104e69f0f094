pub const BYTES_IN_GIGABYTE: f64 = 1_000_000_000.0;

/// Traffic samples of a single item fetched for one report window.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub item_id: String,
    pub time_from: i64,
    pub time_till: i64,
    values: Vec<u64>,
}

impl Series {
    pub fn new(item_id: &str, time_from: i64, time_till: i64, values: Vec<u64>) -> Series {
        Series {
            item_id: item_id.to_owned(),
            time_from,
            time_till,
            values,
        }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Traffic statistics in gigabytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficInfo {
    pub maximum: f64,
    pub mean: f64,
    pub fact_mean: f64,
    pub percentile95: f64,
}

impl TrafficInfo {
    pub fn calculate(samples: &[u64]) -> Option<TrafficInfo> {
        let maximum = max(samples)?;
        let mean = mean(samples)?;

        Some(TrafficInfo {
            maximum,
            mean,
            fact_mean: fact_mean(maximum, mean),
            percentile95: percentile95(samples)?,
        })
    }
}

pub fn mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let sum: u128 = samples.iter().map(|&value| u128::from(value)).sum();
    Some(sum as f64 / samples.len() as f64 / BYTES_IN_GIGABYTE)
}

pub fn max(samples: &[u64]) -> Option<f64> {
    samples.iter().max().map(|&value| value as f64 / BYTES_IN_GIGABYTE)
}

/// Average of peak and mean load used for capacity estimation.
pub fn fact_mean(maximum: f64, mean: f64) -> f64 {
    (maximum + mean) / 2.0
}

pub fn percentile95(samples: &[u64]) -> Option<f64> {
    percentile(samples, 95.0)
}

/// Percentile with linear interpolation between the closest ranks: the rank of `p` is
/// `p / 100 * (n - 1)` in the sorted samples.
pub fn percentile(samples: &[u64], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    let lower_value = sorted[lower] as f64;
    let upper_value = sorted[upper] as f64;
    let value = lower_value + (upper_value - lower_value) * (rank - lower as f64);

    Some(value / BYTES_IN_GIGABYTE)
}
