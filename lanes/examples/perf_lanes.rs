#[path = "../tests/common/mod.rs"]
mod common;

use lanes::{print_box, BatchBuffers, BatchVerifier, CpuLanes, InlineLane};
use std::time::{Duration, Instant};

fn report(label: &str, count: usize, elapsed: Duration, baseline: Option<Duration>) {
    let per_sig = elapsed.as_secs_f64() / count as f64;
    println!("{}:", label);
    println!("  Total time:  {:.3} seconds", elapsed.as_secs_f64());
    println!("  Per verify:  {:.3} μs", per_sig * 1_000_000.0);
    println!("  Rate:        {:.0} signatures/sec", 1.0 / per_sig);
    if let Some(base) = baseline {
        println!("  Speedup:     {:.2}x", base.as_secs_f64() / elapsed.as_secs_f64());
    }
    println!();
}

fn main() {
    println!("=== Batch Verification Performance Test ===\n");

    let threads = rayon::current_num_threads();
    println!("System information:");
    println!("  CPU cores available: {}", threads);
    println!();

    let count = 1 << 14;
    println!("Signing {} requests with k256...", count);
    let mut rng = rand::rng();
    let requests: Vec<_> = (0..count).map(|_| common::valid_request(&mut rng)).collect();
    let buffers = BatchBuffers::from_requests(&requests).unwrap();
    let input = buffers.as_input().unwrap();
    println!();

    print_box("SEQUENTIAL (Inline Lane Baseline)");
    let inline = BatchVerifier::with_executor(Box::new(InlineLane), usize::MAX);
    let start = Instant::now();
    let verdicts = inline.verify_input(&input).unwrap();
    let seq = start.elapsed();
    assert!(verdicts.iter().all(|&v| v == 1));
    report("Inline lane", count, seq, None);

    print_box("PARALLEL (CPU Lanes with Rayon)");
    for lanes in [2, 4, threads] {
        let pooled = BatchVerifier::with_executor(Box::new(CpuLanes::new(Some(lanes)).unwrap()), 0);
        let start = Instant::now();
        let verdicts = pooled.verify_input(&input).unwrap();
        let elapsed = start.elapsed();
        assert!(verdicts.iter().all(|&v| v == 1));
        report(&format!("{} lanes", lanes), count, elapsed, Some(seq));
    }

    #[cfg(feature = "gpu")]
    {
        print_box("GPU (WGPU Compute)");
        let config = lanes::LaneConfig::default().with_backend(lanes::Backend::Gpu);
        match lanes::gpu::GpuLanes::new(&config) {
            Ok(gpu) => {
                let verifier = BatchVerifier::with_executor(Box::new(gpu), 0);
                let start = Instant::now();
                let verdicts = verifier.verify_input(&input).unwrap();
                let elapsed = start.elapsed();
                assert!(verdicts.iter().all(|&v| v == 1));
                report("GPU lanes", count, elapsed, Some(seq));
            }
            Err(e) => println!("GPU unavailable: {}\n", e),
        }
    }
}
