//! Indicator Engine Property Tests
//!
//! Properties that must hold for any candle sequence, including degenerate
//! and corrupted ones.

mod common;

use common::{candle, engine, evaluate_each};
use proptest::prelude::*;
use supertrend_signals::indicators::{average_true_range, relative_strength_index};
use supertrend_signals::{
    BandTracker, Calculation, Candle, IndicatorConfig, PriceSeries, Trend,
};

prop_compose! {
    /// Random walk of well-formed candles around `base`
    fn random_walk(max_len: usize)(
        base in 0.5f64..5000.0,
        steps in prop::collection::vec((-1.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0), 1..max_len),
    ) -> Vec<Candle> {
        let mut price = base;
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (step, up_wick, down_wick))| {
                let open = price;
                let close = open * (1.0 + step * 0.01);
                let high = open.max(close) + up_wick * open * 0.005;
                let low = open.min(close) - down_wick * open * 0.005;
                price = close;
                candle(i, open, high, low, close)
            })
            .collect()
    }
}

fn noisy_price() -> impl Strategy<Value = f64> {
    prop_oneof![
        6 => 0.5f64..2.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(0.0),
        1 => Just(-1.0),
        1 => Just(1e12),
    ]
}

prop_compose! {
    /// Candles with corrupted prices, flat bars and zero volume mixed in
    fn noisy_candles(max_len: usize)(
        prices in prop::collection::vec(
            (noisy_price(), noisy_price(), noisy_price(), noisy_price()),
            1..max_len,
        ),
    ) -> Vec<Candle> {
        prices
            .into_iter()
            .enumerate()
            .map(|(i, (o, h, l, c))| {
                let mut bar = candle(i, o, h, l, c);
                bar.volume = 0;
                bar
            })
            .collect()
    }
}

prop_compose! {
    fn indicator_config()(
        periods in 5usize..=20,
        multiplier in 0.5f64..=5.0,
        rsi_length in 5usize..=30,
        use_rsi_filter in any::<bool>(),
    ) -> IndicatorConfig {
        IndicatorConfig {
            periods,
            multiplier,
            rsi_length,
            use_rsi_filter,
            ..IndicatorConfig::default()
        }
    }
}

fn series_of(candles: &[Candle]) -> PriceSeries {
    PriceSeries::from_candles(candles)
}

proptest! {
    /// Property: no calculated field is ever NaN or infinite
    #[test]
    fn results_are_always_finite(
        candles in random_walk(120),
        config in indicator_config(),
    ) {
        for evaluation in evaluate_each(config, &candles).into_iter().filter_map(Calculation::ready) {
            let result = evaluation.result;
            prop_assert!(result.is_finite(), "non-finite result {:?}", result);
            prop_assert!(result.atr > 0.0);
            prop_assert!((0.0..=100.0).contains(&result.rsi));
            prop_assert!((0.0..=100.0).contains(&result.trend_strength));
        }
    }

    /// Property: corrupted feeds degrade to safe values instead of NaN
    #[test]
    fn corrupted_candles_never_leak_nan(
        candles in noisy_candles(80),
        config in indicator_config(),
    ) {
        let mut engine = engine(config);
        for c in candles {
            engine.push_candle(c);
            if let Calculation::Ready(result) = engine.calculate() {
                prop_assert!(result.is_finite(), "non-finite result {:?}", result);
                prop_assert!((0.0..=100.0).contains(&result.rsi));
            }
        }
    }

    /// Property: RSI stays within [0, 100] for any input
    #[test]
    fn rsi_is_bounded(
        close in prop::collection::vec(proptest::num::f64::ANY, 0..100),
        period in 1usize..40,
    ) {
        let rsi = relative_strength_index(&close, period);
        prop_assert_eq!(rsi.len(), close.len());
        for value in rsi {
            prop_assert!((0.0..=100.0).contains(&value), "rsi {} out of bounds", value);
        }
    }

    /// Property: the same buffer and configuration give bit-identical results
    #[test]
    fn calculation_is_deterministic(
        candles in random_walk(120),
        config in indicator_config(),
    ) {
        let mut engine = engine(config);
        for c in candles {
            engine.push_candle(c);
        }
        prop_assert_eq!(engine.calculate(), engine.calculate());
    }

    /// Property: support only ratchets up while price holds above it, and
    /// resistance only ratchets down while price holds below it
    #[test]
    fn bands_ratchet_with_the_trend(
        candles in random_walk(150),
        multiplier in 0.5f64..=5.0,
        period in 5usize..=20,
    ) {
        let series = series_of(&candles);
        let atr = average_true_range(&series, period);
        let bands = BandTracker::new(multiplier)
            .track(&series.high, &series.low, &series.close, &atr)
            .unwrap();

        for i in 2..bands.len() {
            let window = &bands.trend[i - 2..=i];
            if window.iter().all(|t| *t == Trend::Bullish) && series.close[i - 1] > bands.upper[i - 1] {
                prop_assert!(
                    bands.upper[i] >= bands.upper[i - 1],
                    "support fell at bar {}: {} -> {}", i, bands.upper[i - 1], bands.upper[i]
                );
            }
            if window.iter().all(|t| *t == Trend::Bearish) && series.close[i - 1] < bands.lower[i - 1] {
                prop_assert!(
                    bands.lower[i] <= bands.lower[i - 1],
                    "resistance rose at bar {}: {} -> {}", i, bands.lower[i - 1], bands.lower[i]
                );
            }
        }
    }

    /// Property: signals fire only on the bar where the trend flips
    #[test]
    fn signals_fire_on_flip_edges_only(
        candles in random_walk(150),
        config in indicator_config(),
    ) {
        let calculations = evaluate_each(config, &candles);
        let mut previous: Option<(Trend, bool, bool)> = None;

        for evaluation in calculations.into_iter().filter_map(Calculation::ready) {
            let result = evaluation.result;
            if result.buy_signal {
                prop_assert_eq!(result.trend, Trend::Bullish);
            }
            if result.sell_signal {
                prop_assert_eq!(result.trend, Trend::Bearish);
            }
            if let Some((trend, buy, sell)) = previous {
                prop_assert!(!(buy && result.buy_signal), "repeated buy");
                prop_assert!(!(sell && result.sell_signal), "repeated sell");
                if trend == result.trend {
                    prop_assert!(!result.buy_signal && !result.sell_signal);
                }
            }
            previous = Some((result.trend, result.buy_signal, result.sell_signal));
        }
    }

    /// Property: the previous-step trend equals the final trend of the same
    /// pipeline run without the newest bar
    #[test]
    fn previous_trend_matches_prefix_recomputation(
        candles in random_walk(120),
        multiplier in 0.5f64..=5.0,
        period in 5usize..=20,
    ) {
        prop_assume!(candles.len() > period);

        let full = series_of(&candles);
        let prefix = full.without_last();
        let tracker = BandTracker::new(multiplier);

        let full_bands = tracker
            .track(&full.high, &full.low, &full.close, &average_true_range(&full, period))
            .unwrap();
        let prefix_bands = tracker
            .track(&prefix.high, &prefix.low, &prefix.close, &average_true_range(&prefix, period))
            .unwrap();

        prop_assert_eq!(full_bands.previous_trend(), prefix_bands.trend.last().copied());
    }

    /// Property: exactly `periods` bars is insufficient, one more is enough
    #[test]
    fn readiness_starts_at_periods_plus_one(
        candles in random_walk(60),
        config in indicator_config(),
    ) {
        let calculations = evaluate_each(config, &candles);
        for (i, calculation) in calculations.iter().enumerate() {
            let bars = i + 1;
            prop_assert_eq!(calculation.is_ready(), bars > config.periods);
        }
    }
}

#[test]
fn single_candle_and_flat_bars_are_safe() {
    let series = PriceSeries::from_candles(&[candle(0, 1.1, 1.1, 1.1, 1.1)]);
    assert_eq!(relative_strength_index(&series.close, 14), vec![50.0]);
    assert_eq!(average_true_range(&series, 20), vec![0.0001]);

    let bands = BandTracker::new(2.0)
        .track(&series.high, &series.low, &series.close, &[0.0001])
        .unwrap();
    let levels = bands.current(1.1).unwrap();
    assert!(levels.up.is_finite() && levels.down.is_finite());
    assert_eq!(levels.trend, Trend::Bullish);
}
