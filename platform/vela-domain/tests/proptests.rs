use proptest::prelude::*;
use vela_domain::services::analysis::TechnicalAnalyzer;
use vela_domain::services::engine::{simulate_symbol, SimulatorParams};
use vela_domain::services::indicators::{
    atr, bollinger_bands, ema, macd, obv, rsi, sma, stochastic,
};
use vela_domain::services::strategy::StrategyKind;
use vela_domain::value_objects::bar::Bar;

fn bar(ts: i64, close: f64) -> Bar {
    Bar {
        symbol: "AAPL".to_string(),
        timestamp: ts * 86_400,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000.0,
    }
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| bar(i as i64, *close))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn indicator_series_preserve_length(closes in prop::collection::vec(0.01f64..10_000.0, 0..80)) {
        let volumes = vec![1_000.0; closes.len()];
        prop_assert_eq!(sma(&closes, 20).len(), closes.len());
        prop_assert_eq!(ema(&closes, 12).len(), closes.len());
        prop_assert_eq!(rsi(&closes, 14).len(), closes.len());
        prop_assert_eq!(obv(&closes, &volumes).len(), closes.len());
        let series = macd(&closes, 12, 26, 9);
        prop_assert_eq!(series.macd.len(), closes.len());
        prop_assert_eq!(series.signal.len(), closes.len());
        prop_assert_eq!(series.histogram.len(), closes.len());
        let bands = bollinger_bands(&closes, 20, 2.0);
        prop_assert_eq!(bands.upper.len(), closes.len());
        prop_assert_eq!(bands.lower.len(), closes.len());
        let stoch = stochastic(&closes, &closes, &closes, 14, 3);
        prop_assert_eq!(stoch.k.len(), closes.len());
        prop_assert_eq!(stoch.d.len(), closes.len());
        prop_assert_eq!(atr(&closes, &closes, &closes, 14).len(), closes.len());
    }

    #[test]
    fn windowed_indicators_have_exact_warmup(closes in prop::collection::vec(0.01f64..10_000.0, 30..60)) {
        let out = sma(&closes, 20);
        prop_assert!(out[..19].iter().all(Option::is_none));
        prop_assert!(out[19..].iter().all(Option::is_some));

        let bands = bollinger_bands(&closes, 20, 2.0);
        prop_assert!(bands.upper[..19].iter().all(Option::is_none));
        prop_assert!(bands.upper[19..].iter().all(Option::is_some));

        // RSI consumes period + 1 bars.
        let out = rsi(&closes, 14);
        prop_assert!(out[..14].iter().all(Option::is_none));
        prop_assert!(out[14..].iter().all(Option::is_some));

        let out = atr(&closes, &closes, &closes, 14);
        prop_assert!(out[..13].iter().all(Option::is_none));
        prop_assert!(out[13..].iter().all(Option::is_some));

        let stoch = stochastic(&closes, &closes, &closes, 14, 3);
        prop_assert!(stoch.k[..13].iter().all(Option::is_none));
        prop_assert!(stoch.k[13..].iter().all(Option::is_some));
        prop_assert!(stoch.d[..15].iter().all(Option::is_none));
        prop_assert!(stoch.d[15..].iter().all(Option::is_some));
    }

    #[test]
    fn rsi_is_always_bounded(closes in prop::collection::vec(0.01f64..10_000.0, 15..120)) {
        for value in rsi(&closes, 14).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn sma_of_constant_series_is_the_constant(constant in 0.01f64..10_000.0, len in 5usize..60) {
        let values = vec![constant; len];
        for (i, value) in sma(&values, 5).into_iter().enumerate() {
            if i >= 4 {
                let value = value.expect("defined after warm-up");
                prop_assert!((value - constant).abs() < 1e-9);
            } else {
                prop_assert!(value.is_none());
            }
        }
    }

    #[test]
    fn analyzer_confidence_stays_clamped(closes in prop::collection::vec(1.0f64..1_000.0, 0..90)) {
        let analyzer = TechnicalAnalyzer::new();
        let result = analyzer.analyze(&bars_from_closes(&closes), "AAPL");
        prop_assert!((0.1..=0.95).contains(&result.confidence));
        prop_assert!((0.0..=100.0).contains(&result.overall_score));
    }

    #[test]
    fn simulator_output_is_reproducible(closes in prop::collection::vec(1.0f64..1_000.0, 0..150)) {
        let bars = bars_from_closes(&closes);
        let strategy = StrategyKind::parse("technical").expect("known strategy");
        let params = SimulatorParams::default();
        let first = simulate_symbol(&bars, &strategy, &params);
        let second = simulate_symbol(&bars, &strategy, &params);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn closed_trades_are_consistent(closes in prop::collection::vec(1.0f64..1_000.0, 60..150)) {
        let bars = bars_from_closes(&closes);
        let strategy = StrategyKind::parse("mean_reversion").expect("known strategy");
        let trades = simulate_symbol(&bars, &strategy, &SimulatorParams::default());
        for trade in trades {
            let exit_ts = trade.exit_timestamp.expect("recorded trades are closed");
            let exit_price = trade.exit_price.expect("recorded trades are closed");
            prop_assert!(exit_ts > trade.entry_timestamp);
            let expected = (exit_price - trade.entry_price) / trade.entry_price * 100.0;
            prop_assert!((trade.return_percent - expected).abs() < 1e-9);
            prop_assert!(!(trade.hit_target && trade.hit_stop_loss));
        }
    }
}
