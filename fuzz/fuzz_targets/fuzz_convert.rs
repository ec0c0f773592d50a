#![no_main]

use libfuzzer_sys::fuzz_target;
use patternpeek::content::first_paragraph;
use patternpeek::convert::{LineKind, markdown_to_lines};

fuzz_target!(|data: &[u8]| {
    let Some((&w, rest)) = data.split_first() else {
        return;
    };
    let Ok(markdown) = std::str::from_utf8(rest) else {
        return;
    };

    // Must not panic at any width, including ones below the minimum.
    let lines = markdown_to_lines(markdown, w as usize);

    for line in &lines {
        if line.kind == LineKind::Blank {
            assert!(line.text.is_empty(), "blank line with text: {:?}", line.text);
        }
    }
    assert!(
        lines.last().is_none_or(|l| l.kind != LineKind::Blank),
        "trailing blank line"
    );

    if let Some(p) = first_paragraph(markdown) {
        assert!(!p.is_empty());
        assert_eq!(p.trim(), p);
    }
});
