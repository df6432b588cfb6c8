//! Offset Allocator Benchmark Suite
//!
//! Measures planning throughput for allocation traffic shaped like a
//! transformer forward pass: per layer, allocate activations and scratch,
//! free the previous layer's buffers, reuse the holes.
//!
//! Run with: `cargo bench --bench allocator_bench`

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tensorforge::runtime::HostRuntime;
use tensorforge::{DType, OffsetAllocator, TensorShape};

struct Benchmark {
    name: String,
    iterations: usize,
    warmup_iterations: usize,
}

struct BenchmarkResult {
    name: String,
    elapsed: Duration,
    iterations: usize,
}

impl Benchmark {
    fn new(name: &str, iterations: usize) -> Self {
        Benchmark {
            name: name.to_string(),
            iterations,
            warmup_iterations: iterations.min(10),
        }
    }

    fn run_time<F, R>(&self, mut f: F) -> BenchmarkResult
    where
        F: FnMut() -> R,
    {
        for _ in 0..self.warmup_iterations {
            black_box(f());
        }
        let start = Instant::now();
        for _ in 0..self.iterations {
            black_box(f());
        }
        BenchmarkResult {
            name: self.name.clone(),
            elapsed: start.elapsed(),
            iterations: self.iterations,
        }
    }
}

impl BenchmarkResult {
    fn report(&self) {
        let per_iter = self.elapsed.as_nanos() as f64 / self.iterations as f64;
        println!(
            "{:<40} {:>10.1} ns/iter ({} iters, {:?} total)",
            self.name, per_iter, self.iterations, self.elapsed
        );
    }
}

/// One planning pass over `layers` layers: allocate this layer's buffers,
/// free the previous layer's, rely on hole reuse to bound the footprint.
fn plan_forward_pass(layers: usize, hidden: usize) -> usize {
    let activation = TensorShape::from_dims(&[1, 128, hidden]).byte_size(DType::F16);
    let scratch = TensorShape::from_dims(&[1, 128, hidden * 4]).byte_size(DType::F16);

    let mut alloc = OffsetAllocator::new(Arc::new(HostRuntime));
    let mut previous: Option<(usize, usize)> = None;
    for _ in 0..layers {
        let act = alloc.alloc(activation);
        let tmp = alloc.alloc(scratch);
        alloc.free(tmp, scratch);
        if let Some((offset, nbytes)) = previous.take() {
            alloc.free(offset, nbytes);
        }
        previous = Some((act, activation));
    }
    alloc.peak()
}

fn bench_fragmented_reuse(blocks: usize) -> usize {
    let mut alloc = OffsetAllocator::new(Arc::new(HostRuntime));
    let offsets: Vec<usize> = (0..blocks).map(|_| alloc.alloc(64)).collect();
    // Free every other block, then fill the holes back in.
    for offset in offsets.iter().step_by(2) {
        alloc.free(*offset, 64);
    }
    for _ in (0..blocks).step_by(2) {
        black_box(alloc.alloc(64));
    }
    alloc.peak()
}

fn main() {
    println!("offset allocator benchmarks");
    println!("{}", "=".repeat(72));

    Benchmark::new("forward_pass_plan/32_layers", 1000)
        .run_time(|| plan_forward_pass(32, 4096))
        .report();

    Benchmark::new("forward_pass_plan/80_layers", 400)
        .run_time(|| plan_forward_pass(80, 8192))
        .report();

    Benchmark::new("fragmented_reuse/256_blocks", 1000)
        .run_time(|| bench_fragmented_reuse(256))
        .report();

    Benchmark::new("fragmented_reuse/2048_blocks", 100)
        .run_time(|| bench_fragmented_reuse(2048))
        .report();
}
