//! Signal analyzer: classifies the latest bar of a series against the
//! indicator set, aggregates per-category scores and an overall scored
//! recommendation, and locates key levels and simple patterns.

use crate::services::indicators::IndicatorSet;
use crate::value_objects::bar::Bar;
use crate::value_objects::signal::{Signal, TechnicalSignal};
use serde_json::json;

/// Fewer observations than this yield a neutral result, not an error.
pub const MIN_BARS: usize = 20;

const SUPPORT_RESISTANCE_LOOKBACK: usize = 50;
const DEFAULT_LEVELS: usize = 3;

#[derive(Debug, Clone)]
pub struct TechnicalAnalysisResult {
    pub symbol: String,
    /// Timestamp of the last analyzed bar.
    pub timestamp: i64,
    pub current_price: f64,
    pub price_change_1d: f64,
    pub price_change_5d: f64,
    pub price_change_1m: f64,
    pub signals: Vec<TechnicalSignal>,
    pub trend_score: f64,
    pub momentum_score: f64,
    pub volatility_score: f64,
    pub volume_score: f64,
    pub overall_score: f64,
    pub overall_signal: Signal,
    pub confidence: f64,
    /// Levels below the current price, ascending.
    pub support_levels: Vec<f64>,
    /// Levels above the current price, ascending.
    pub resistance_levels: Vec<f64>,
    pub pivot_point: f64,
    pub patterns_detected: Vec<String>,
}

impl TechnicalAnalysisResult {
    fn neutral(symbol: &str, timestamp: i64, current_price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp,
            current_price,
            price_change_1d: 0.0,
            price_change_5d: 0.0,
            price_change_1m: 0.0,
            signals: Vec::new(),
            trend_score: 50.0,
            momentum_score: 50.0,
            volatility_score: 50.0,
            volume_score: 50.0,
            overall_score: 50.0,
            overall_signal: Signal::Hold,
            confidence: 0.5,
            support_levels: Vec::new(),
            resistance_levels: Vec::new(),
            pivot_point: 0.0,
            patterns_detected: Vec::new(),
        }
    }

    /// Flat mapping for downstream reporting.
    pub fn to_flat_json(&self) -> serde_json::Value {
        json!({
            "symbol": self.symbol,
            "current_price": self.current_price,
            "price_change_1d": self.price_change_1d,
            "trend_score": self.trend_score,
            "momentum_score": self.momentum_score,
            "volatility_score": self.volatility_score,
            "volume_score": self.volume_score,
            "overall_score": self.overall_score,
            "overall_signal": self.overall_signal.as_str(),
            "confidence": self.confidence,
            "support_levels": self.support_levels,
            "resistance_levels": self.resistance_levels,
            "patterns_detected": self.patterns_detected,
            "signals": self.signals.iter().map(|s| json!({
                "indicator": s.indicator,
                "signal": s.signal.as_str(),
                "strength": s.strength,
            })).collect::<Vec<_>>(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TechnicalAnalyzer;

impl TechnicalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, bars: &[Bar], symbol: &str) -> TechnicalAnalysisResult {
        let timestamp = bars.last().map(|bar| bar.timestamp).unwrap_or(0);
        let current_price = bars.last().map(|bar| bar.close).unwrap_or(0.0);
        let mut result = TechnicalAnalysisResult::neutral(symbol, timestamp, current_price);
        if bars.len() < MIN_BARS {
            return result;
        }

        let indicators = IndicatorSet::compute(bars);
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        let last = bars.len() - 1;

        if last >= 1 {
            result.price_change_1d = (closes[last] / closes[last - 1] - 1.0) * 100.0;
        }
        if last >= 4 {
            result.price_change_5d = (closes[last] / closes[last - 4] - 1.0) * 100.0;
        }
        if last >= 19 {
            result.price_change_1m = (closes[last] / closes[last - 19] - 1.0) * 100.0;
        }

        let trend = trend_signals(&indicators, current_price, last);
        let momentum = momentum_signals(&indicators, last);
        let volatility = volatility_signals(&indicators, current_price, last);
        let volume = volume_signals(bars, &indicators, last);

        result.trend_score = category_score(&trend);
        result.momentum_score = category_score(&momentum);
        result.volatility_score = category_score(&volatility);
        result.volume_score = category_score(&volume);

        result.overall_score = result.trend_score * 0.35
            + result.momentum_score * 0.30
            + result.volatility_score * 0.20
            + result.volume_score * 0.15;
        result.overall_signal = Signal::from_score(result.overall_score);

        result.signals = trend;
        result.signals.extend(momentum);
        result.signals.extend(volatility);
        result.signals.extend(volume);
        result.confidence = confidence(&result.signals);

        let (support, resistance) = support_resistance(bars, current_price, DEFAULT_LEVELS);
        result.support_levels = support;
        result.resistance_levels = resistance;
        result.pivot_point = (bars[last].high + bars[last].low + bars[last].close) / 3.0;
        result.patterns_detected = detect_patterns(&closes);

        result
    }
}

fn trend_signals(
    indicators: &IndicatorSet,
    current_price: f64,
    last: usize,
) -> Vec<TechnicalSignal> {
    let mut signals = Vec::new();

    if let Some(sma_20) = indicators.sma_20[last] {
        let signal = if current_price > sma_20 * 1.02 {
            TechnicalSignal::new(
                "SMA 20",
                sma_20,
                Signal::Buy,
                0.7,
                format!("Price above SMA 20 ({sma_20:.2})"),
            )
        } else if current_price < sma_20 * 0.98 {
            TechnicalSignal::new(
                "SMA 20",
                sma_20,
                Signal::Sell,
                0.7,
                format!("Price below SMA 20 ({sma_20:.2})"),
            )
        } else {
            TechnicalSignal::new(
                "SMA 20",
                sma_20,
                Signal::Hold,
                0.5,
                format!("Price near SMA 20 ({sma_20:.2})"),
            )
        };
        signals.push(signal);
    }

    if let Some(sma_50) = indicators.sma_50[last] {
        let signal = if current_price > sma_50 {
            TechnicalSignal::new(
                "SMA 50",
                sma_50,
                Signal::Buy,
                0.75,
                format!("Price above SMA 50 ({sma_50:.2})"),
            )
        } else {
            TechnicalSignal::new(
                "SMA 50",
                sma_50,
                Signal::Sell,
                0.75,
                format!("Price below SMA 50 ({sma_50:.2})"),
            )
        };
        signals.push(signal);
    }

    // Long-term trend gate.
    if let Some(sma_200) = indicators.sma_200[last] {
        let signal = if current_price > sma_200 {
            TechnicalSignal::new(
                "SMA 200",
                sma_200,
                Signal::StrongBuy,
                0.85,
                "Price above SMA 200, long-term bullish".to_string(),
            )
        } else {
            TechnicalSignal::new(
                "SMA 200",
                sma_200,
                Signal::StrongSell,
                0.85,
                "Price below SMA 200, long-term bearish".to_string(),
            )
        };
        signals.push(signal);
    }

    if last >= 1 {
        if let (Some(macd), Some(signal_line), Some(prev_macd), Some(prev_signal)) = (
            indicators.macd.macd[last],
            indicators.macd.signal[last],
            indicators.macd.macd[last - 1],
            indicators.macd.signal[last - 1],
        ) {
            let signal = if prev_macd <= prev_signal && macd > signal_line {
                TechnicalSignal::new(
                    "MACD",
                    macd,
                    Signal::StrongBuy,
                    0.9,
                    "MACD bullish crossover".to_string(),
                )
            } else if prev_macd >= prev_signal && macd < signal_line {
                TechnicalSignal::new(
                    "MACD",
                    macd,
                    Signal::StrongSell,
                    0.9,
                    "MACD bearish crossover".to_string(),
                )
            } else if macd > signal_line {
                TechnicalSignal::new(
                    "MACD",
                    macd,
                    Signal::Buy,
                    0.7,
                    "MACD above signal line".to_string(),
                )
            } else {
                TechnicalSignal::new(
                    "MACD",
                    macd,
                    Signal::Sell,
                    0.7,
                    "MACD below signal line".to_string(),
                )
            };
            signals.push(signal);
        }
    }

    signals
}

fn momentum_signals(indicators: &IndicatorSet, last: usize) -> Vec<TechnicalSignal> {
    let mut signals = Vec::new();

    if let Some(rsi) = indicators.rsi_14[last] {
        let signal = if rsi < 30.0 {
            TechnicalSignal::new(
                "RSI",
                rsi,
                Signal::StrongBuy,
                0.85,
                format!("RSI oversold ({rsi:.1})"),
            )
        } else if rsi < 40.0 {
            TechnicalSignal::new(
                "RSI",
                rsi,
                Signal::Buy,
                0.65,
                format!("RSI approaching oversold ({rsi:.1})"),
            )
        } else if rsi > 70.0 {
            TechnicalSignal::new(
                "RSI",
                rsi,
                Signal::StrongSell,
                0.85,
                format!("RSI overbought ({rsi:.1})"),
            )
        } else if rsi > 60.0 {
            TechnicalSignal::new(
                "RSI",
                rsi,
                Signal::Sell,
                0.65,
                format!("RSI approaching overbought ({rsi:.1})"),
            )
        } else {
            TechnicalSignal::new("RSI", rsi, Signal::Hold, 0.5, format!("RSI neutral ({rsi:.1})"))
        };
        signals.push(signal);
    }

    if let (Some(stoch_k), Some(stoch_d)) = (
        indicators.stochastic.k[last],
        indicators.stochastic.d[last],
    ) {
        let signal = if stoch_k < 20.0 {
            TechnicalSignal::new(
                "Stochastic",
                stoch_k,
                Signal::StrongBuy,
                0.8,
                format!("Stochastic oversold (%K {stoch_k:.1})"),
            )
        } else if stoch_k > 80.0 {
            TechnicalSignal::new(
                "Stochastic",
                stoch_k,
                Signal::StrongSell,
                0.8,
                format!("Stochastic overbought (%K {stoch_k:.1})"),
            )
        } else if stoch_k > stoch_d {
            TechnicalSignal::new(
                "Stochastic",
                stoch_k,
                Signal::Buy,
                0.6,
                "Stochastic %K above %D".to_string(),
            )
        } else {
            TechnicalSignal::new(
                "Stochastic",
                stoch_k,
                Signal::Sell,
                0.6,
                "Stochastic %K below %D".to_string(),
            )
        };
        signals.push(signal);
    }

    signals
}

fn volatility_signals(
    indicators: &IndicatorSet,
    current_price: f64,
    last: usize,
) -> Vec<TechnicalSignal> {
    let mut signals = Vec::new();

    if let (Some(upper), Some(middle), Some(lower)) = (
        indicators.bollinger.upper[last],
        indicators.bollinger.middle[last],
        indicators.bollinger.lower[last],
    ) {
        let signal = if current_price <= lower {
            TechnicalSignal::new(
                "Bollinger Bands",
                current_price,
                Signal::StrongBuy,
                0.85,
                "Price at lower Bollinger band".to_string(),
            )
        } else if current_price >= upper {
            TechnicalSignal::new(
                "Bollinger Bands",
                current_price,
                Signal::StrongSell,
                0.85,
                "Price at upper Bollinger band".to_string(),
            )
        } else if current_price < middle {
            TechnicalSignal::new(
                "Bollinger Bands",
                current_price,
                Signal::Buy,
                0.55,
                "Price below middle band".to_string(),
            )
        } else {
            TechnicalSignal::new(
                "Bollinger Bands",
                current_price,
                Signal::Sell,
                0.55,
                "Price above middle band".to_string(),
            )
        };
        signals.push(signal);
    }

    if let Some(atr) = indicators.atr_14[last] {
        if current_price > 0.0 {
            let atr_percent = atr / current_price * 100.0;
            let signal = if atr_percent > 5.0 {
                TechnicalSignal::new(
                    "ATR",
                    atr,
                    Signal::Hold,
                    0.4,
                    format!("High volatility (ATR {atr_percent:.1}%)"),
                )
            } else {
                TechnicalSignal::new(
                    "ATR",
                    atr,
                    Signal::Hold,
                    0.6,
                    format!("Normal volatility (ATR {atr_percent:.1}%)"),
                )
            };
            signals.push(signal);
        }
    }

    signals
}

fn volume_signals(bars: &[Bar], indicators: &IndicatorSet, last: usize) -> Vec<TechnicalSignal> {
    let mut signals = Vec::new();

    if last + 1 >= 20 {
        let current_volume = bars[last].volume;
        let window = &bars[last + 1 - 20..=last];
        let average_volume =
            window.iter().map(|bar| bar.volume).sum::<f64>() / window.len() as f64;

        if current_volume > average_volume * 1.5 {
            // Heavy volume confirms whichever way price moved.
            let signal = if bars[last].close > bars[last - 1].close {
                TechnicalSignal::new(
                    "Volume",
                    current_volume,
                    Signal::StrongBuy,
                    0.75,
                    "High volume on up day".to_string(),
                )
            } else {
                TechnicalSignal::new(
                    "Volume",
                    current_volume,
                    Signal::StrongSell,
                    0.75,
                    "High volume on down day".to_string(),
                )
            };
            signals.push(signal);
        } else if current_volume < average_volume * 0.5 {
            signals.push(TechnicalSignal::new(
                "Volume",
                current_volume,
                Signal::Hold,
                0.4,
                "Low volume, weak conviction".to_string(),
            ));
        }
    }

    if last >= 4 {
        if let (Some(obv), Some(obv_back)) = (indicators.obv[last], indicators.obv[last - 4]) {
            let signal = if obv - obv_back > 0.0 {
                TechnicalSignal::new(
                    "OBV",
                    obv,
                    Signal::Buy,
                    0.6,
                    "OBV trending up (accumulation)".to_string(),
                )
            } else {
                TechnicalSignal::new(
                    "OBV",
                    obv,
                    Signal::Sell,
                    0.6,
                    "OBV trending down (distribution)".to_string(),
                )
            };
            signals.push(signal);
        }
    }

    signals
}

fn category_score(signals: &[TechnicalSignal]) -> f64 {
    if signals.is_empty() {
        return 50.0;
    }
    let total_weight: f64 = signals.iter().map(|s| s.strength).sum();
    if total_weight <= 0.0 {
        return 50.0;
    }
    let weighted: f64 = signals.iter().map(|s| s.signal.score() * s.strength).sum();
    weighted / total_weight
}

fn confidence(signals: &[TechnicalSignal]) -> f64 {
    if signals.is_empty() {
        return 0.5;
    }
    let buys = signals.iter().filter(|s| s.signal.is_bullish()).count();
    let sells = signals.iter().filter(|s| s.signal.is_bearish()).count();
    let agreement = buys.max(sells) as f64 / signals.len() as f64;
    (0.4 + agreement * 0.5).clamp(0.1, 0.95)
}

fn support_resistance(
    bars: &[Bar],
    current_price: f64,
    levels: usize,
) -> (Vec<f64>, Vec<f64>) {
    let recent = &bars[bars.len().saturating_sub(SUPPORT_RESISTANCE_LOOKBACK)..];

    let mut highs: Vec<f64> = recent.iter().map(|bar| bar.high).collect();
    let mut lows: Vec<f64> = recent.iter().map(|bar| bar.low).collect();
    highs.sort_by(|a, b| b.total_cmp(a));
    highs.truncate(levels * 2);
    lows.sort_by(|a, b| a.total_cmp(b));
    lows.truncate(levels * 2);

    let mut resistance: Vec<f64> = highs.into_iter().filter(|h| *h > current_price).collect();
    resistance.sort_by(|a, b| a.total_cmp(b));
    resistance.truncate(levels);

    // Closest levels below the price, returned ascending.
    let mut support: Vec<f64> = lows.into_iter().filter(|l| *l < current_price).collect();
    support.sort_by(|a, b| b.total_cmp(a));
    support.truncate(levels);
    support.reverse();

    (support, resistance)
}

fn detect_patterns(closes: &[f64]) -> Vec<String> {
    let mut patterns = Vec::new();
    if closes.len() < 10 {
        return patterns;
    }
    let prices = &closes[closes.len().saturating_sub(20)..];
    let n = prices.len();

    if prices[n - 5..].windows(2).all(|pair| pair[0] <= pair[1]) {
        patterns.push("uptrend".to_string());
    }
    if prices[n - 5..].windows(2).all(|pair| pair[0] >= pair[1]) {
        patterns.push("downtrend".to_string());
    }

    // Maxima/minima of consecutive 3-bar blocks.
    let mut block_highs = Vec::new();
    let mut block_lows = Vec::new();
    let mut i = 0;
    while i + 3 < n {
        let block = &prices[i..i + 3];
        block_highs.push(block.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        block_lows.push(block.iter().copied().fold(f64::INFINITY, f64::min));
        i += 3;
    }
    if block_highs.len() >= 3 && block_highs.windows(2).all(|pair| pair[0] < pair[1]) {
        patterns.push("higher highs".to_string());
    }
    if block_lows.len() >= 3 && block_lows.windows(2).all(|pair| pair[0] > pair[1]) {
        patterns.push("lower lows".to_string());
    }

    let tail = &prices[n - 10..];
    let highest = tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lowest = tail.iter().copied().fold(f64::INFINITY, f64::min);
    let reference = prices[n - 1];
    if reference != 0.0 && (highest - lowest) / reference < 0.03 {
        patterns.push("consolidation".to_string());
    }

    patterns
}
