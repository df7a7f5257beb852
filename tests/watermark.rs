//! End-to-end behaviour through the public API: raster output, resize
//! redraw over the notification channel, and the tamper guard loop.

use image::{Rgba, RgbaImage};
use tilemark::render::fonts::FontBook;
use tilemark::render::recording::Op;
use tilemark::{
    surface_channel, Bitmap, ImageInfo, NodeTree, Options, RasterSurface, RecordingSurface,
    Repair, SceneTree, Size, Surface, SurfaceEvent, TamperGuard, Watermark,
};

fn red_square(side: u32) -> Bitmap {
    Bitmap::new(RgbaImage::from_pixel(side, side, Rgba([255, 0, 0, 255])))
}

fn bitmap_options(opacity: f32) -> Options {
    Options::bitmap(red_square(10))
        .rotate(0.0)
        .image_info(ImageInfo {
            width: 0.0,
            height: 0.0,
            opacity: Some(opacity),
        })
}

#[test]
fn bitmap_tiles_land_on_anchors() {
    let wm = Watermark::new(RasterSurface::new(Size::new(100.0, 100.0)), bitmap_options(0.5)).unwrap();
    let image = wm.surface().to_image();
    assert_eq!(image.dimensions(), (100, 100));

    for (x, y) in [(5, 5), (55, 5), (5, 55), (55, 55)] {
        let px = image.get_pixel(x, y);
        assert!(px[0] > 250, "red at ({x},{y}): {px:?}");
        assert!((126..=129).contains(&px[3]), "half alpha at ({x},{y}): {px:?}");
    }
    for (x, y) in [(25, 25), (75, 30), (30, 75)] {
        assert_eq!(image.get_pixel(x, y)[3], 0, "gap at ({x},{y}) stays clear");
    }
}

#[test]
fn explicit_image_size_scales_tiles() {
    let options = Options::bitmap(red_square(10)).rotate(0.0).image_info(ImageInfo {
        width: 20.0,
        height: 20.0,
        opacity: None,
    });
    let wm = Watermark::new(RasterSurface::new(Size::new(60.0, 60.0)), options).unwrap();
    let image = wm.surface().to_image();
    let px = image.get_pixel(15, 15);
    assert!(px[0] > 250 && px[3] > 250, "scaled tile covers (15,15): {px:?}");
    assert_eq!(image.get_pixel(25, 25)[3], 0);
}

#[test]
fn resize_over_channel_matches_fresh_render() {
    let (notifier, mut events) = surface_channel();
    let mut wm = Watermark::new(RasterSurface::new(Size::new(200.0, 100.0)), bitmap_options(1.0)).unwrap();

    wm.surface_mut().set_measured_size(Size::new(120.0, 80.0));
    notifier.resized(120.0, 80.0);
    assert!(wm.pump(&mut events).unwrap().is_empty());

    let fresh = Watermark::new(RasterSurface::new(Size::new(120.0, 80.0)), bitmap_options(1.0)).unwrap();
    assert_eq!(wm.options().width, 120);
    assert_eq!(wm.options().height, 80);
    assert_eq!(wm.grid().len(), fresh.grid().len());
    assert_eq!(wm.surface().to_image(), fresh.surface().to_image());
}

#[test]
fn high_density_doubles_the_buffer_and_grid() {
    let wm = Watermark::new(
        RecordingSurface::new(Size::new(100.0, 50.0)),
        Options::text("hd").high_density(true),
    )
    .unwrap();
    assert_eq!(wm.surface().buffer_size(), (200, 100));
    // (ceil(200/50)+2) × (ceil(100/50)+2)
    assert_eq!(wm.grid().len(), 24);
}

#[test]
fn resize_after_disconnect_is_ignored() {
    let mut wm = Watermark::new(RecordingSurface::new(Size::new(100.0, 100.0)), Options::text("wm")).unwrap();
    wm.disconnect_resize();
    wm.handle_event(SurfaceEvent::Resized(Size::new(40.0, 40.0))).unwrap();
    assert_eq!(wm.surface().buffer_size(), (100, 100));
    assert!(!wm.is_observing());
}

#[test]
fn bitmap_pass_restores_alpha() {
    let wm = Watermark::new(RecordingSurface::new(Size::new(50.0, 50.0)), bitmap_options(0.3)).unwrap();
    let ops = wm.surface().recorder().unwrap().ops();
    let alphas: Vec<f32> = ops
        .iter()
        .filter_map(|op| match op {
            Op::SetGlobalAlpha(a) => Some(*a),
            _ => None,
        })
        .collect();
    assert_eq!(alphas, vec![0.3, 1.0]);
    assert!(matches!(ops.last(), Some(Op::SetGlobalAlpha(a)) if *a == 1.0));
}

#[test]
fn guard_keeps_surface_attached_and_empty() {
    let mut tree = SceneTree::new("body");
    let container = tree.add_child(tree.root, "container");
    let canvas = tree.add_child(container, "canvas");
    tree.take_records();

    let (notifier, mut events) = surface_channel();
    let mut wm = Watermark::new(RecordingSurface::new(Size::new(80.0, 80.0)), Options::text("wm"))
        .unwrap()
        .with_guard(TamperGuard::attach(&tree, canvas));

    let overlay = tree.add_child(canvas, "overlay");
    tree.remove(canvas);
    notifier.mutated(tree.take_records());

    let repairs = wm.pump(&mut events).unwrap();
    assert_eq!(
        repairs,
        vec![
            Repair::RemoveChild {
                parent: canvas,
                child: overlay
            },
            Repair::Reattach {
                parent: container,
                child: canvas
            },
        ]
    );
    for repair in &repairs {
        repair.apply(&mut tree);
    }
    assert_eq!(tree.parent(canvas), Some(container));
    assert!(tree.children(canvas).is_empty());

    // The repairs' own records settle without further work.
    notifier.mutated(tree.take_records());
    assert!(wm.pump(&mut events).unwrap().is_empty());
}

#[tokio::test]
async fn run_applies_repairs_until_channel_closes() {
    let mut tree = SceneTree::new("body");
    let canvas = tree.add_child(tree.root, "canvas");
    tree.take_records();

    let (notifier, mut events) = surface_channel();
    let mut wm = Watermark::new(RecordingSurface::new(Size::new(60.0, 60.0)), Options::text("wm"))
        .unwrap()
        .with_guard(TamperGuard::attach(&tree, canvas));

    tree.remove(canvas);
    notifier.mutated(tree.take_records());
    notifier.resized(30.0, 30.0);
    drop(notifier);

    let mut applied = Vec::new();
    wm.run(&mut events, |repair| applied.push(repair)).await.unwrap();

    assert_eq!(
        applied,
        vec![Repair::Reattach {
            parent: tree.root,
            child: canvas
        }]
    );
    assert_eq!(wm.surface().buffer_size(), (30, 30));
}

const DEJAVU: &[u8] = include_bytes!("fixtures/DejaVuSans.ttf");

#[test]
fn text_tiles_ink_above_each_anchor() {
    let fonts = FontBook::with_font(DEJAVU.to_vec()).unwrap();
    let wm = Watermark::new(
        RasterSurface::with_fonts(Size::new(120.0, 120.0), fonts),
        Options::text("W").rotate(0.0).font("20px sans-serif"),
    )
    .unwrap();
    let image = wm.surface().to_image();

    // Just above and right of every in-bounds anchor there is glyph ink.
    for ax in [0, 50, 100] {
        for ay in [50, 100] {
            let inked = (ax..ax + 20)
                .flat_map(|x| (ay - 16..ay).map(move |y| (x, y)))
                .filter(|&(x, y)| x < 120 && y < 120)
                .any(|(x, y)| image.get_pixel(x, y)[3] > 0);
            assert!(inked, "no ink above anchor ({ax},{ay})");
        }
    }
    // Nothing lands in the band between rows of tiles.
    for (x, y, px) in image.enumerate_pixels() {
        if (25..50).contains(&(x % 50)) && (5..30).contains(&(y % 50)) {
            assert_eq!(px[3], 0, "stray ink at ({x},{y})");
        }
    }
}
