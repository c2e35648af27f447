//! Allocation ceiling: a warmed-up, reused parser/sink pair must render a
//! representative 16 KiB document in a bounded number of heap allocations.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use flowdown_render::{parse_with, LiveParser, RenderOptions, StreamRenderer};
use flowdown_theme::default_theme;

struct CountingAlloc;

static ALLOCS: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCS.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        ALLOCS.fetch_add(1, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        ALLOCS.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc_zeroed(layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn sample_document() -> String {
    let block = concat!(
        "# Section heading with some words\n",
        "\n",
        "A paragraph that carries *emphasis*, **strong**, `inline code`, and a\n",
        "[link](https://example.com/docs) plus enough prose to wrap a few times\n",
        "at eighty columns when rendered by the streaming pipeline.\n",
        "\n",
        "- first bullet with content that wraps\n",
        "- second bullet with content\n",
        "  - nested bullet underneath\n",
        "\n",
        "1. ordered item one\n",
        "2. ordered item two\n",
        "\n",
        "> A quoted line with several words in it\n",
        "> and a lazy continuation line too\n",
        "\n",
        "```sh\n",
        "echo streaming && ls -la\n",
        "```\n",
        "\n",
    );
    let mut doc = String::new();
    while doc.len() < 16 * 1024 {
        doc.push_str(block);
    }
    doc
}

#[test]
fn warmed_render_stays_under_allocation_ceiling() {
    let doc = sample_document();
    let theme = default_theme();
    let mut parser = LiveParser::new(&theme, false);
    let mut sink = StreamRenderer::new(Vec::with_capacity(64 * 1024), 80, RenderOptions::default());

    // warm up: grow every reusable buffer to its high-water mark
    for _ in 0..2 {
        sink.get_mut().clear();
        sink.reset(80);
        parser.reset(&theme, false);
        parse_with(doc.as_bytes(), &mut sink, &mut parser).expect("warmup render");
    }

    sink.get_mut().clear();
    sink.reset(80);
    parser.reset(&theme, false);
    let before = ALLOCS.load(Ordering::Relaxed);
    parse_with(doc.as_bytes(), &mut sink, &mut parser).expect("measured render");
    let allocs = ALLOCS.load(Ordering::Relaxed) - before;

    assert!(!sink.get_ref().is_empty(), "render produced no output");
    assert!(allocs < 6000, "too many allocations per render: {allocs}");
}
