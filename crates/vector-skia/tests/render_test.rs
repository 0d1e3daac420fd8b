use skia_safe::{Color, Image};
use std::sync::Arc;
use vector_core::{AnimatedVectorLoader, ManualClock, VectorDrawable};
use vector_data::{DisplayMetrics, MemoryResources, Resources};
use vector_skia::{render_image, render_png};

const SQUARE: &str = r##"<vector xmlns:android="http://schemas.android.com/apk/res/android"
        android:width="10dp" android:height="10dp"
        android:viewportWidth="10" android:viewportHeight="10" android:alpha="{alpha}">
    <group android:name="half">
        <clip-path android:pathData="M0,0 H5 V10 H0 Z"/>
        <path android:name="square" android:pathData="M0,0 H10 V10 H0 Z" android:fillColor="#FFFF0000"/>
    </group>
</vector>"##;

const FADE: &str = r#"<objectAnimator xmlns:android="http://schemas.android.com/apk/res/android"
    android:propertyName="fillColor" android:valueFrom="#FFFF0000" android:valueTo="#FF0000FF"
    android:duration="100" android:interpolator="@android:interpolator/linear"/>"#;

const ANIMATED: &str = r#"<animated-vector xmlns:android="http://schemas.android.com/apk/res/android"
    android:drawable="@drawable/square">
    <target android:name="square" android:animation="@animator/fade"/>
</animated-vector>"#;

fn resources(alpha: f32) -> Arc<dyn Resources> {
    Arc::new(
        MemoryResources::new(DisplayMetrics::default())
            .with_document("@drawable/square", &SQUARE.replace("{alpha}", &alpha.to_string()))
            .with_document("@animator/fade", FADE)
            .with_document("@drawable/animated", ANIMATED),
    )
}

fn pixel(image: &Image, x: i32, y: i32) -> Color {
    let pixmap = image.peek_pixels().expect("raster image");
    pixmap.get_color((x, y))
}

#[test]
fn test_clip_limits_fill() {
    let mut drawable = VectorDrawable::load(resources(1.0), "@drawable/square").unwrap();
    let image = render_image(&mut drawable, 20, 20).unwrap();
    assert_eq!(pixel(&image, 4, 10), Color::RED);
    assert_eq!(pixel(&image, 15, 10).a(), 0);
}

#[test]
fn test_alpha_composites_as_layer() {
    let mut drawable = VectorDrawable::load(resources(0.5), "@drawable/square").unwrap();
    let image = render_image(&mut drawable, 20, 20).unwrap();
    let color = pixel(&image, 4, 10);
    assert!((120..=136).contains(&color.a()), "{color:?}");
}

#[test]
fn test_animated_frames_change_color() {
    let clock = ManualClock::new();
    let mut loader = AnimatedVectorLoader::new(resources(1.0));
    let mut avd = loader.load_with_clock("@drawable/animated", clock.clone()).unwrap();
    avd.start();

    let first = render_image(&mut avd, 10, 10).unwrap();
    assert_eq!(pixel(&first, 2, 5), Color::RED);

    clock.advance_ms(100);
    let last = render_image(&mut avd, 10, 10).unwrap();
    assert_eq!(pixel(&last, 2, 5), Color::BLUE);
    assert!(!avd.is_running());
}

#[test]
fn test_png_signature() {
    let mut drawable = VectorDrawable::load(resources(1.0), "@drawable/square").unwrap();
    let png = render_png(&mut drawable, 16, 16).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}
