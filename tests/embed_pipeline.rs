use std::io::Cursor;

use image::codecs::gif::GifEncoder;
use image::{Delay, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use flipbook::{
    AnimationMode, Canvas, ComposeOptions, ExtractOptions, FlipbookError, GridSize,
    PipelineOptions, Rect, Session, SourceDocument, Step, run_pipeline,
};

fn synth_pdf(page_sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = page_sizes
        .iter()
        .map(|&(w, h)| {
            let content_id =
                doc.add_object(Object::Stream(Stream::new(dictionary! {}, Vec::new())));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
                "Contents" => content_id,
            });
            Object::Reference(page_id)
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn synth_gif(frame_count: u32, delay_ms: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = GifEncoder::new(Cursor::new(&mut buf));
        for i in 0..frame_count {
            let shade = ((i * 37) % 256) as u8;
            let img = RgbaImage::from_pixel(8, 8, Rgba([shade, 255 - shade, 64, 255]));
            let frame =
                image::Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
            enc.encode_frames(std::iter::once(frame)).unwrap();
        }
    }
    buf
}

fn ready_session(source: &SourceDocument, canvas: Canvas, page: usize) -> Session {
    let mut session = Session::new();
    session.document_loaded();
    session.select_page(page, source.page_count()).unwrap();
    session
        .set_rect(Rect::new(250.0, 350.0, 100.0, 100.0), canvas)
        .unwrap();
    session
}

fn objects_matching(doc: &Document, pred: impl Fn(&Dictionary) -> bool) -> usize {
    doc.objects
        .values()
        .filter(|obj| match obj {
            Object::Dictionary(d) => pred(d),
            Object::Stream(s) => pred(&s.dict),
            _ => false,
        })
        .count()
}

#[test]
fn scripted_embed_end_to_end() {
    let pdf = synth_pdf(&[(612.0, 792.0), (612.0, 792.0), (612.0, 792.0)]);
    let source = SourceDocument::from_bytes(&pdf).unwrap();
    let canvas = Canvas::new(600.0, 800.0).unwrap();
    let mut session = ready_session(&source, canvas, 1);

    let opts = PipelineOptions {
        extract: ExtractOptions::default(),
        compose: ComposeOptions {
            grid: GridSize { cols: 40, rows: 20 },
            ..ComposeOptions::default()
        },
    };
    let bytes = run_pipeline(&mut session, &source, &synth_gif(5, 100), canvas, &opts).unwrap();

    let out = Document::load_mem(&bytes).unwrap();
    assert_eq!(out.get_pages().len(), 3);

    // Text field with the first ASCII frame, plus a document-level script.
    assert_eq!(
        objects_matching(&out, |d| {
            matches!(d.get(b"FT"), Ok(Object::Name(n)) if n == b"Tx")
        }),
        1
    );
    assert!(
        objects_matching(&out, |d| {
            matches!(d.get(b"S"), Ok(Object::Name(n)) if n == b"JavaScript")
        }) >= 1
    );
    assert_eq!(session.step(), Some(Step::Generated));
}

#[test]
fn static_button_embed_draws_raster_and_button() {
    let pdf = synth_pdf(&[(612.0, 792.0)]);
    let source = SourceDocument::from_bytes(&pdf).unwrap();
    let canvas = Canvas::new(600.0, 800.0).unwrap();
    let mut session = ready_session(&source, canvas, 0);

    let opts = PipelineOptions {
        extract: ExtractOptions::default(),
        compose: ComposeOptions {
            mode: AnimationMode::StaticButton,
            ..ComposeOptions::default()
        },
    };
    let bytes = run_pipeline(&mut session, &source, &synth_gif(4, 100), canvas, &opts).unwrap();

    let out = Document::load_mem(&bytes).unwrap();
    assert_eq!(out.get_pages().len(), 1);
    assert!(
        objects_matching(&out, |d| {
            matches!(d.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image")
        }) >= 1
    );
    assert_eq!(
        objects_matching(&out, |d| {
            matches!(d.get(b"FT"), Ok(Object::Name(n)) if n == b"Btn")
        }),
        1
    );
}

#[test]
fn single_frame_gif_embeds_without_script() {
    let pdf = synth_pdf(&[(612.0, 792.0)]);
    let source = SourceDocument::from_bytes(&pdf).unwrap();
    let canvas = Canvas::new(600.0, 800.0).unwrap();
    let mut session = ready_session(&source, canvas, 0);

    let bytes = run_pipeline(
        &mut session,
        &source,
        &synth_gif(1, 100),
        canvas,
        &PipelineOptions::default(),
    )
    .unwrap();

    let out = Document::load_mem(&bytes).unwrap();
    assert_eq!(
        objects_matching(&out, |d| {
            matches!(d.get(b"FT"), Ok(Object::Name(n)) if n == b"Tx")
        }),
        1
    );
    assert_eq!(
        objects_matching(&out, |d| {
            matches!(d.get(b"S"), Ok(Object::Name(n)) if n == b"JavaScript")
        }),
        0
    );
}

#[test]
fn guard_recovers_after_decode_failure() {
    let pdf = synth_pdf(&[(612.0, 792.0)]);
    let source = SourceDocument::from_bytes(&pdf).unwrap();
    let canvas = Canvas::new(600.0, 800.0).unwrap();
    let mut session = ready_session(&source, canvas, 0);

    let mut corrupt = b"GIF89a".to_vec();
    corrupt.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    let err = run_pipeline(
        &mut session,
        &source,
        &corrupt,
        canvas,
        &PipelineOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, FlipbookError::Decode(_)));
    assert!(!session.is_busy());

    run_pipeline(
        &mut session,
        &source,
        &synth_gif(3, 100),
        canvas,
        &PipelineOptions::default(),
    )
    .unwrap();
    assert_eq!(session.step(), Some(Step::Generated));
}

#[test]
fn wrong_media_kinds_are_rejected() {
    let pdf = synth_pdf(&[(612.0, 792.0)]);
    assert!(matches!(
        SourceDocument::from_bytes(&synth_gif(2, 100)).unwrap_err(),
        FlipbookError::InputRejected(_)
    ));

    let source = SourceDocument::from_bytes(&pdf).unwrap();
    let canvas = Canvas::new(600.0, 800.0).unwrap();
    let mut session = ready_session(&source, canvas, 0);
    assert!(matches!(
        run_pipeline(
            &mut session,
            &source,
            &pdf,
            canvas,
            &PipelineOptions::default()
        )
        .unwrap_err(),
        FlipbookError::InputRejected(_)
    ));
}
