//! Pure indicator computations over aligned price series.
//!
//! Every function preserves input length. Positions inside an indicator's
//! warm-up window are `None`; callers must never treat the sentinel as
//! zero. Input slices of one call must have equal lengths. No value at
//! position `i` reads a bar after `i`.

use crate::value_objects::bar::Bar;

/// Simple moving average, defined from index `window - 1`.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    for i in 0..values.len() {
        if i + 1 >= window {
            let slice = &values[i + 1 - window..=i];
            out[i] = Some(slice.iter().sum::<f64>() / window as f64);
        }
    }
    out
}

fn ema_raw(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return out;
    };
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut current = first;
    out.push(current);
    for &value in &values[1..] {
        current = alpha * value + (1.0 - alpha) * current;
        out.push(current);
    }
    out
}

/// Exponential moving average seeded with the first value; defined from
/// index 0, no warm-up region.
pub fn ema(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    ema_raw(values, window).into_iter().map(Some).collect()
}

/// Relative Strength Index over the trailing `period` close-to-close
/// changes. Needs `period + 1` closes, so it is defined from index
/// `period`. A zero average loss maps to 100.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 {
        return out;
    }
    for i in period..closes.len() {
        let mut gains = 0.0;
        let mut losses = 0.0;
        for j in i + 1 - period..=i {
            let change = closes[j] - closes[j - 1];
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }
        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;
        out[i] = Some(if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        });
    }
    out
}

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD line (fast EMA minus slow EMA), its signal EMA, and the
/// histogram. Defined from index 0 because the EMAs are.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_window: usize) -> MacdSeries {
    let ema_fast = ema_raw(closes, fast);
    let ema_slow = ema_raw(closes, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| fast - slow)
        .collect();
    let signal_line = ema_raw(&macd_line, signal_window);
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(macd, signal)| macd - signal)
        .collect();
    MacdSeries {
        macd: macd_line.into_iter().map(Some).collect(),
        signal: signal_line.into_iter().map(Some).collect(),
        histogram: histogram.into_iter().map(Some).collect(),
    }
}

#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger Bands: SMA middle, bands at `width` sample standard
/// deviations over the same trailing window. The sample deviation needs
/// at least two points, so a window of 1 leaves the bands undefined.
pub fn bollinger_bands(closes: &[f64], window: usize, width: f64) -> BollingerSeries {
    let middle = sma(closes, window);
    let mut upper = vec![None; closes.len()];
    let mut lower = vec![None; closes.len()];
    if window >= 2 {
        for i in 0..closes.len() {
            if i + 1 < window {
                continue;
            }
            if let Some(mean) = middle[i] {
                let slice = &closes[i + 1 - window..=i];
                let variance = slice
                    .iter()
                    .map(|value| {
                        let diff = value - mean;
                        diff * diff
                    })
                    .sum::<f64>()
                    / (window as f64 - 1.0);
                let deviation = variance.sqrt();
                upper[i] = Some(mean + width * deviation);
                lower[i] = Some(mean - width * deviation);
            }
        }
    }
    BollingerSeries {
        upper,
        middle,
        lower,
    }
}

/// Average True Range. The first bar's true range has no previous close
/// and falls back to `high - low`; defined from index `period - 1`.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = closes.len();
    let mut out = vec![None; len];
    if period == 0 || len < period {
        return out;
    }
    let mut true_ranges = Vec::with_capacity(len);
    for i in 0..len {
        let range = highs[i] - lows[i];
        let tr = if i == 0 {
            range
        } else {
            let prev_close = closes[i - 1];
            range
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs())
        };
        true_ranges.push(tr);
    }
    for i in period - 1..len {
        let slice = &true_ranges[i + 1 - period..=i];
        out[i] = Some(slice.iter().sum::<f64>() / period as f64);
    }
    out
}

#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Stochastic oscillator. %K is defined from index `k_window - 1`; a flat
/// high-low window yields the neutral 50 instead of dividing by zero.
/// %D is the SMA of %K and lags it by `d_window - 1` more positions.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_window: usize,
    d_window: usize,
) -> StochasticSeries {
    let len = closes.len();
    let mut k = vec![None; len];
    if k_window == 0 || d_window == 0 {
        return StochasticSeries {
            d: vec![None; len],
            k,
        };
    }
    for i in 0..len {
        if i + 1 < k_window {
            continue;
        }
        let lowest = lows[i + 1 - k_window..=i]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let highest = highs[i + 1 - k_window..=i]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;
        k[i] = Some(if range == 0.0 {
            50.0
        } else {
            100.0 * (closes[i] - lowest) / range
        });
    }
    let d = sma_over_defined(&k, d_window);
    StochasticSeries { k, d }
}

/// On-Balance Volume: cumulative volume signed by the close-to-close
/// direction. The first bar has no direction and contributes nothing.
pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    let mut running = 0.0;
    for i in 0..closes.len() {
        if i > 0 {
            if closes[i] > closes[i - 1] {
                running += volumes[i];
            } else if closes[i] < closes[i - 1] {
                running -= volumes[i];
            }
        }
        out.push(Some(running));
    }
    out
}

fn sma_over_defined(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    'position: for i in 0..values.len() {
        if i + 1 < window {
            continue;
        }
        let mut sum = 0.0;
        for value in &values[i + 1 - window..=i] {
            match value {
                Some(v) => sum += v,
                None => continue 'position,
            }
        }
        out[i] = Some(sum / window as f64);
    }
    out
}

/// The indicator bundle the analyzer and the strategies consume, computed
/// in one pass over a bar series.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub sma_20: Vec<Option<f64>>,
    pub sma_50: Vec<Option<f64>>,
    pub sma_200: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub macd: MacdSeries,
    pub bollinger: BollingerSeries,
    pub atr_14: Vec<Option<f64>>,
    pub stochastic: StochasticSeries,
    pub obv: Vec<Option<f64>>,
}

impl IndicatorSet {
    pub fn compute(bars: &[Bar]) -> Self {
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        let highs: Vec<f64> = bars.iter().map(|bar| bar.high).collect();
        let lows: Vec<f64> = bars.iter().map(|bar| bar.low).collect();
        let volumes: Vec<f64> = bars.iter().map(|bar| bar.volume).collect();

        Self {
            sma_20: sma(&closes, 20),
            sma_50: sma(&closes, 50),
            sma_200: sma(&closes, 200),
            rsi_14: rsi(&closes, 14),
            macd: macd(&closes, 12, 26, 9),
            bollinger: bollinger_bands(&closes, 20, 2.0),
            atr_14: atr(&highs, &lows, &closes, 14),
            stochastic: stochastic(&highs, &lows, &closes, 14, 3),
            obv: obv(&closes, &volumes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup_and_values() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
    }

    #[test]
    fn sma_of_constant_series_is_the_constant() {
        let values = vec![42.5; 30];
        for value in sma(&values, 7).into_iter().skip(6) {
            assert_eq!(value, Some(42.5));
        }
    }

    #[test]
    fn ema_is_seeded_with_first_value() {
        let out = ema(&[10.0, 20.0], 9);
        assert_eq!(out[0], Some(10.0));
        let alpha = 2.0 / 10.0;
        let expected = alpha * 20.0 + (1.0 - alpha) * 10.0;
        assert!((out[1].expect("defined") - expected).abs() < 1e-12);
    }

    #[test]
    fn rsi_warmup_covers_period_plus_one_bars() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out.len(), closes.len());
        assert!(out[..14].iter().all(Option::is_none));
        assert!(out[14..].iter().all(Option::is_some));
    }

    #[test]
    fn rsi_is_100_when_there_are_no_losses() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out[19], Some(100.0));
    }

    #[test]
    fn rsi_is_bounded() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i * 7919) % 13) as f64 - 6.0)
            .collect();
        for value in rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let series = macd(&closes, 12, 26, 9);
        assert_eq!(series.macd.len(), closes.len());
        for i in 0..closes.len() {
            let (Some(m), Some(s), Some(h)) = (series.macd[i], series.signal[i], series.histogram[i])
            else {
                panic!("macd defined everywhere");
            };
            assert!((h - (m - s)).abs() < 1e-9);
        }
    }

    #[test]
    fn bollinger_bands_collapse_on_constant_series() {
        let closes = vec![50.0; 25];
        let bands = bollinger_bands(&closes, 20, 2.0);
        assert!(bands.upper[..19].iter().all(Option::is_none));
        assert_eq!(bands.middle[19], Some(50.0));
        assert_eq!(bands.upper[24], Some(50.0));
        assert_eq!(bands.lower[24], Some(50.0));
    }

    #[test]
    fn bollinger_bands_bracket_the_middle() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let bands = bollinger_bands(&closes, 20, 2.0);
        for i in 19..closes.len() {
            let (Some(upper), Some(middle), Some(lower)) =
                (bands.upper[i], bands.middle[i], bands.lower[i])
            else {
                panic!("bands defined from index 19");
            };
            assert!(upper > middle && middle > lower);
        }
    }

    #[test]
    fn atr_uses_gap_from_previous_close() {
        // Second bar gaps far above its own high-low range.
        let highs = vec![10.0, 30.0];
        let lows = vec![9.0, 29.0];
        let closes = vec![9.5, 29.5];
        let out = atr(&highs, &lows, &closes, 2);
        // tr0 = 1.0, tr1 = max(1.0, |30-9.5|, |29-9.5|) = 20.5
        assert_eq!(out[1], Some((1.0 + 20.5) / 2.0));
    }

    #[test]
    fn stochastic_flat_window_is_neutral() {
        let prices = vec![5.0; 20];
        let series = stochastic(&prices, &prices, &prices, 14, 3);
        assert_eq!(series.k[13], Some(50.0));
        assert_eq!(series.d[15], Some(50.0));
        assert_eq!(series.d[14], None);
    }

    #[test]
    fn stochastic_k_hits_extremes() {
        let mut highs: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let mut lows: Vec<f64> = highs.iter().map(|h| h - 1.0).collect();
        let closes = highs.clone();
        let series = stochastic(&highs, &lows, &closes, 14, 3);
        // Close at the window high.
        assert_eq!(series.k[19], Some(100.0));
        highs.reverse();
        lows.reverse();
        let closes: Vec<f64> = lows.clone();
        let series = stochastic(&highs, &lows, &closes, 14, 3);
        assert_eq!(series.k[19], Some(0.0));
    }

    #[test]
    fn obv_signs_volume_by_direction() {
        let closes = vec![10.0, 11.0, 11.0, 9.0];
        let volumes = vec![100.0, 200.0, 300.0, 400.0];
        let out = obv(&closes, &volumes);
        assert_eq!(out[0], Some(0.0));
        assert_eq!(out[1], Some(200.0));
        assert_eq!(out[2], Some(200.0));
        assert_eq!(out[3], Some(-200.0));
    }

    #[test]
    fn indicator_set_preserves_length() {
        let bars: Vec<Bar> = (0..25)
            .map(|i| Bar {
                symbol: "AAPL".to_string(),
                timestamp: i,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + (i % 3) as f64,
                volume: 1_000.0,
            })
            .collect();
        let set = IndicatorSet::compute(&bars);
        assert_eq!(set.sma_20.len(), bars.len());
        assert_eq!(set.sma_200.len(), bars.len());
        assert_eq!(set.rsi_14.len(), bars.len());
        assert_eq!(set.macd.histogram.len(), bars.len());
        assert_eq!(set.bollinger.lower.len(), bars.len());
        assert_eq!(set.atr_14.len(), bars.len());
        assert_eq!(set.stochastic.d.len(), bars.len());
        assert_eq!(set.obv.len(), bars.len());
        // 25 bars are short of the SMA 200 warm-up.
        assert!(set.sma_200.iter().all(Option::is_none));
    }
}
