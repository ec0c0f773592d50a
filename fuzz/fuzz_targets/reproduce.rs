use std::time::Instant;

use log::info;
use patternpeek::content::first_paragraph;
use patternpeek::convert::markdown_to_lines;

fn main() {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: reproduce <artifact-file-or-markdown>");
        std::process::exit(1);
    });

    let data = std::fs::read(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read {path}: {e}");
        std::process::exit(1);
    });

    // fuzz_convert artifacts carry the width in the first byte.
    let (width, body) = match data.split_first() {
        Some((&w, rest)) => (w as usize, rest),
        None => (80, &data[..]),
    };
    let markdown = match std::str::from_utf8(body) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Input is not valid UTF-8: {e}");
            std::process::exit(1);
        }
    };

    let iterations = std::env::var("ITERATIONS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1);

    eprintln!(
        "=== Input: {} ({} bytes, width {}), {} iteration(s) ===",
        path,
        markdown.len(),
        width,
        iterations
    );

    for i in 0..iterations {
        let iter_start = Instant::now();
        let lines = markdown_to_lines(markdown, width);
        let paragraph = first_paragraph(markdown);
        info!(
            "iteration {}: {} line(s), first paragraph {} char(s), {:.1}ms",
            i,
            lines.len(),
            paragraph.map(|p| p.chars().count()).unwrap_or(0),
            iter_start.elapsed().as_secs_f64() * 1000.0
        );
    }
}
