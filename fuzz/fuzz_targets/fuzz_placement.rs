#![no_main]

use libfuzzer_sys::fuzz_target;
use patternpeek::placement::{PanelGeometry, Point, Size, place};

fuzz_target!(|input: ([i16; 2], [u16; 2], [u16; 5])| {
    let ([x, y], [vw, vh], [w, h, ox, oy, pad]) = input;
    let g = PanelGeometry {
        width: w as i32,
        height: h as i32,
        offset_x: ox as i32,
        offset_y: oy as i32,
        padding: pad as i32,
    };
    let viewport = Size::new(vw as i32, vh as i32);
    let r = place(Point::new(x as i32, y as i32), viewport, &g);

    assert!(r.left >= g.padding && r.top >= g.padding, "{r:?} under padding");
    assert_eq!((r.width, r.height), (g.width, g.height));

    // Room on both sides of the pointer: the panel fits entirely.
    let fits_x = g.width + g.offset_x + g.padding;
    let fits_y = g.height + g.offset_y + g.padding;
    let px = x as i32;
    let py = y as i32;
    if px >= fits_x && px + fits_x <= viewport.width {
        assert!(r.right() <= viewport.width - g.padding, "{r:?} off right edge");
    }
    if py >= fits_y && py + fits_y <= viewport.height {
        assert!(r.bottom() <= viewport.height - g.padding, "{r:?} off bottom edge");
    }
});
