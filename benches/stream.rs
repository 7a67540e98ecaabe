use criterion::{criterion_group, criterion_main, Criterion};

use rec_filter::{Bandpass, Highpass, RecursiveFilter};

fn trace(secs: f64) -> Vec<f64> {
    (0..((secs * 100.0) as usize))
        .map(|x| x as f64 * 0.01 + (x as f64 * 1.5 * 2.0 * std::f64::consts::PI / 100.0).sin())
        .collect()
}

pub fn bench_stream(c: &mut Criterion) {
    let input = trace(3600.0);
    let mut output = [0.0; 1024];
    c.bench_function("rec-filter highpass/1h", |b| {
        b.iter(|| {
            let mut filter = RecursiveFilter::new(Highpass::new(0.94).unwrap().into());
            for chunk in input.chunks_exact(1024) {
                filter.process(&mut output[..], chunk).unwrap();
            }
        })
    });
    c.bench_function("rec-filter bandpass/1h", |b| {
        b.iter(|| {
            let mut filter = RecursiveFilter::new(Bandpass::new(0.94, 0.06).unwrap().into());
            for chunk in input.chunks_exact(1024) {
                filter.process(&mut output[..], chunk).unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_stream,);
criterion_main!(benches);
