//! Criterion benchmarks for RankLab hot paths.
//!
//! Benchmarks:
//! 1. Day event loop (full momentum backtest)
//! 2. Broker simulation (one day's order batch)
//! 3. Momentum ranking on a wide cross-section

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ranklab_core::domain::{Bar, CrossSection, Order, Portfolio, PriceSnapshot};
use ranklab_core::engine::{run_backtest, EngineConfig};
use ranklab_core::execution::{Broker, MarketOnCloseBroker};
use ranklab_core::strategy::{HoldCash, Momentum, MomentumParams, Strategy};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(days: usize, symbols: usize) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(days * symbols);
    for s in 0..symbols {
        let phase = s as f64 * 0.7;
        for i in 0..days {
            let close = 100.0 + ((i as f64 * 0.05) + phase).sin() * 20.0 + s as f64;
            bars.push(Bar {
                timestamp: base_date + chrono::Duration::days(i as i64),
                symbol: format!("SYM{s:03}"),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            });
        }
    }
    bars
}

fn momentum() -> Momentum {
    Momentum::new(MomentumParams {
        lookback_days: 20,
        top_k: 5,
        dollar_per_position: 10_000.0,
    })
    .unwrap()
}

// ── 1. Day Event Loop ────────────────────────────────────────────────

fn bench_day_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("day_event_loop");
    let config = EngineConfig::new(100_000.0);
    let broker = MarketOnCloseBroker::default();

    for &days in &[252, 1260, 2520] {
        let bars = make_bars(days, 10);
        group.bench_with_input(BenchmarkId::new("hold_cash", days), &days, |b, _| {
            b.iter(|| run_backtest(black_box(&bars), &config, &mut HoldCash, &broker));
        });
        group.bench_with_input(BenchmarkId::new("momentum", days), &days, |b, _| {
            b.iter(|| {
                let mut strategy = momentum();
                run_backtest(black_box(&bars), &config, &mut strategy, &broker)
            });
        });
    }

    // Wide universe (the realistic case)
    let wide = make_bars(1260, 100);
    group.bench_function("momentum_100_symbols_1260_days", |b| {
        b.iter(|| {
            let mut strategy = momentum();
            run_backtest(black_box(&wide), &config, &mut strategy, &broker)
        });
    });

    group.finish();
}

// ── 2. Broker Simulation ─────────────────────────────────────────────

fn bench_broker(c: &mut Criterion) {
    let mut group = c.benchmark_group("broker");
    let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();

    let mut prices = PriceSnapshot::new();
    for s in 0..50 {
        prices.insert(format!("SYM{s:03}"), 50.0 + s as f64);
    }
    let orders: Vec<Order> = (0..50)
        .map(|s| Order::new(date, format!("SYM{s:03}"), 10 + s as i64, "bench").unwrap())
        .collect();
    let portfolio = Portfolio::new(1_000_000.0);
    let broker = MarketOnCloseBroker::default();

    group.bench_function("simulate_50_buys", |b| {
        b.iter(|| broker.simulate(black_box(&orders), black_box(&prices), &portfolio));
    });

    group.finish();
}

// ── 3. Momentum Ranking ──────────────────────────────────────────────

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("momentum_rank");

    let bars = make_bars(25, 500);
    let mut strategy = momentum();
    let portfolio = Portfolio::new(1_000_000.0);
    let mut sections: Vec<CrossSection> = Vec::new();
    for day in 0..25 {
        let date = bars[day].timestamp;
        let day_bars: Vec<Bar> = bars.iter().filter(|b| b.timestamp == date).cloned().collect();
        sections.push(CrossSection::new(date, day_bars));
    }
    for cs in &sections {
        let _ = strategy.on_bar(cs, &portfolio);
    }
    let last = &sections[sections.len() - 1];

    group.bench_function("rank_500_symbols", |b| {
        b.iter(|| strategy.rank(black_box(last)));
    });

    group.finish();
}

criterion_group!(benches, bench_day_loop, bench_broker, bench_ranking);
criterion_main!(benches);
