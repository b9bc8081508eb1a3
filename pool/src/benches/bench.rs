use criterion::criterion_main;

mod growth;

criterion_main!(steady::benches, growth::benches);
