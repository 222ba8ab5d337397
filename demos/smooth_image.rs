//! Bilateral-smooth a single image.
//!
//! Usage:
//! ```sh
//! cargo run --example smooth_image -- input.jpg output.png [sigma_color] [sigma_space]
//! ```

use std::env;
use std::process;

use bilateral_smoothing::{process_file, FilterParams, ProcessOptions};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <input> <output> [sigma_color] [sigma_space]",
            args[0]
        );
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];
    let sigma = |i: usize| args.get(i).and_then(|s| s.parse().ok()).unwrap_or(25.0);

    let params = FilterParams::new(sigma(3), sigma(4)).expect("sigmas must be positive");
    let opts = ProcessOptions {
        params,
        ..ProcessOptions::default()
    };
    let result = process_file(input.as_ref(), output.as_ref(), &opts);

    if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
