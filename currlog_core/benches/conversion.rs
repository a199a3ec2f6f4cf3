use criterion::{Criterion, black_box, criterion_group, criterion_main};
use currlog_core::config::Boundary;
use currlog_core::{Calibration, lit_count};

// Bus words for a sweep of codes, as the transport would deliver them
fn synth_words(n: usize) -> Vec<u16> {
    (0..n)
        .map(|i| {
            let code = ((i as i32 * 37) % 65536 - 32768) as i16;
            (code as u16).swap_bytes()
        })
        .collect()
}

pub fn bench_word_to_amps(c: &mut Criterion) {
    let cal = Calibration::default();
    let words = synth_words(4096);
    c.bench_function("word_to_amps_4096", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &w in &words {
                acc += cal.word_to_amps(black_box(w));
            }
            acc
        })
    });
}

pub fn bench_bar(c: &mut Criterion) {
    let cal = Calibration::default();
    let amps: Vec<f64> = synth_words(4096).iter().map(|&w| cal.word_to_amps(w)).collect();
    c.bench_function("lit_count_4096", |b| {
        b.iter(|| {
            amps.iter()
                .map(|&a| lit_count(black_box(a), 5.0, 6, Boundary::Strict))
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_word_to_amps, bench_bar);
criterion_main!(benches);
