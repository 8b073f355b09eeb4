use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::ascii::{GridSize, TextFrame};
use crate::document::SourceDocument;
use crate::error::{FlipbookError, FlipbookResult};
use crate::extract::{Frame, FrameSet};
use crate::placement::Placement;
use crate::script;

/// Name of the text field the frame loop rewrites.
pub const ANIM_FIELD_NAME: &str = "flipbook_anim";

/// Floor for the computed field font size, in points.
pub const MIN_FONT_SIZE_PTS: f64 = 4.0;

const START_BUTTON_NAME: &str = "flipbook_start";
const ADVANCE_BUTTON_NAME: &str = "flipbook_advance";
const BUTTON_WIDTH_PTS: f64 = 64.0;
const BUTTON_HEIGHT_PTS: f64 = 18.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationMode {
    /// Timer-driven text field rewritten frame by frame.
    Scripted,
    /// Single drawn raster plus a manual advance control.
    StaticButton,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ComposeOptions {
    pub mode: AnimationMode,
    pub autoplay: bool,
    pub interval_ms: u32,
    pub grid: GridSize,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            mode: AnimationMode::Scripted,
            autoplay: true,
            interval_ms: 120,
            grid: GridSize { cols: 60, rows: 30 },
        }
    }
}

/// Assemble the output document: every source page copied, the animation
/// artifact inserted on the selected page, the result serialized to bytes.
///
/// The source document is never mutated. A failure while building the
/// scripted artifact degrades to drawing the first frame as a static raster;
/// only serialization and static drawing failures bubble.
pub fn compose(
    source: &SourceDocument,
    page_index: usize,
    frames: &FrameSet,
    text_frames: &[TextFrame],
    placement: &Placement,
    opts: &ComposeOptions,
) -> FlipbookResult<Vec<u8>> {
    let page_id = source.page_id(page_index)?;
    let mut doc = source.inner().clone();

    match opts.mode {
        AnimationMode::Scripted => {
            if let Err(err) = build_scripted(&mut doc, page_id, text_frames, placement, opts) {
                tracing::warn!(%err, "scripted composition failed, degrading to static raster");
                // Start from a fresh copy so no half-built objects leak into
                // the output.
                doc = source.inner().clone();
                draw_image(&mut doc, page_id, frames.first(), placement)?;
            }
        }
        AnimationMode::StaticButton => {
            build_static(&mut doc, page_id, frames, placement)?;
        }
    }

    doc.compress();
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| FlipbookError::compose(format!("serialize output document: {e}")))?;
    Ok(buf)
}

fn build_scripted(
    doc: &mut Document,
    page_id: ObjectId,
    text_frames: &[TextFrame],
    placement: &Placement,
    opts: &ComposeOptions,
) -> FlipbookResult<()> {
    let [first, ..] = text_frames else {
        return Err(FlipbookError::compose("no text frames to place"));
    };

    let font_size = field_font_size(placement, opts.grid);
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let field_id = add_text_field(doc, page_id, placement, first, font_size)?;
    register_form_field(doc, field_id, Some(font_id))?;

    if text_frames.len() >= 2 {
        let js = script::animation_script(
            ANIM_FIELD_NAME,
            text_frames,
            opts.interval_ms,
            opts.autoplay,
        );
        attach_document_script(doc, "flipbook", &js)?;

        if !opts.autoplay {
            let btn_id = add_pushbutton(
                doc,
                page_id,
                START_BUTTON_NAME,
                button_rect(placement),
                "Play",
                &script::start_button_script(),
            )?;
            register_form_field(doc, btn_id, None)?;
        }
    }
    Ok(())
}

fn build_static(
    doc: &mut Document,
    page_id: ObjectId,
    frames: &FrameSet,
    placement: &Placement,
) -> FlipbookResult<()> {
    draw_image(doc, page_id, frames.first(), placement)?;

    if frames.len() > 1 {
        let btn_id = add_pushbutton(
            doc,
            page_id,
            ADVANCE_BUTTON_NAME,
            button_rect(placement),
            "Next frame",
            &script::advance_script(frames.len()),
        )?;
        register_form_field(doc, btn_id, None)?;
    }
    Ok(())
}

/// Font size that fits the grid into the placement rectangle, floored.
fn field_font_size(placement: &Placement, grid: GridSize) -> f64 {
    let per_col = placement.width_pts / f64::from(grid.cols.max(1));
    let per_row = placement.height_pts / f64::from(grid.rows.max(1));
    per_col.min(per_row).max(MIN_FONT_SIZE_PTS)
}

fn pdf<T>(result: lopdf::Result<T>, what: &str) -> FlipbookResult<T> {
    result.map_err(|e| FlipbookError::compose(format!("{what}: {e}")))
}

fn placement_rect(p: &Placement) -> Vec<Object> {
    vec![
        (p.x as f32).into(),
        (p.y as f32).into(),
        ((p.x + p.width_pts) as f32).into(),
        ((p.y + p.height_pts) as f32).into(),
    ]
}

/// Controls sit just below the placement rectangle, clamped to the page edge.
fn button_rect(p: &Placement) -> Vec<Object> {
    let y = (p.y - BUTTON_HEIGHT_PTS - 4.0).max(0.0);
    vec![
        (p.x as f32).into(),
        (y as f32).into(),
        ((p.x + BUTTON_WIDTH_PTS) as f32).into(),
        ((y + BUTTON_HEIGHT_PTS) as f32).into(),
    ]
}

fn add_text_field(
    doc: &mut Document,
    page_id: ObjectId,
    placement: &Placement,
    value: &str,
    font_size: f64,
) -> FlipbookResult<ObjectId> {
    // Multiline (bit 13) and read-only (bit 1): the timer writes the value,
    // the user never does.
    let flags: i64 = (1 << 12) | 1;
    let da = format!("/Courier {font_size:.2} Tf 0 g");

    let field_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal(ANIM_FIELD_NAME),
        "V" => Object::string_literal(value),
        "Ff" => flags,
        "Rect" => placement_rect(placement),
        "DA" => Object::string_literal(da),
        "F" => 4,
    });
    append_page_annot(doc, page_id, field_id)?;
    Ok(field_id)
}

fn add_pushbutton(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    rect: Vec<Object>,
    caption: &str,
    js: &str,
) -> FlipbookResult<ObjectId> {
    let action_id = doc.add_object(dictionary! {
        "S" => "JavaScript",
        "JS" => Object::string_literal(js),
    });
    let btn_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal(name),
        "Ff" => 1i64 << 16,
        "Rect" => rect,
        "F" => 4,
        "MK" => dictionary! {
            "CA" => Object::string_literal(caption),
            "BG" => vec![0.9f32.into(), 0.9f32.into(), 0.9f32.into()],
        },
        "A" => action_id,
        "DA" => Object::string_literal("/Courier 10 Tf 0 g"),
    });
    append_page_annot(doc, page_id, btn_id)?;
    Ok(btn_id)
}

/// Draw one opaque frame as an RGB image XObject over the placement rect.
fn draw_image(
    doc: &mut Document,
    page_id: ObjectId,
    frame: &Frame,
    placement: &Placement,
) -> FlipbookResult<()> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.rgba.len() != expected {
        return Err(FlipbookError::compose(format!(
            "frame buffer size {} does not match {}x{}",
            frame.rgba.len(),
            frame.width,
            frame.height
        )));
    }

    let rgb: Vec<u8> = frame
        .rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let image_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => frame.width as i64,
            "Height" => frame.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb,
    )));

    let name = format!("FbIm{}", image_id.0);
    add_xobject_resource(doc, page_id, &name, image_id)?;

    let ops = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (placement.width_pts as f32).into(),
                    0.into(),
                    0.into(),
                    (placement.height_pts as f32).into(),
                    (placement.x as f32).into(),
                    (placement.y as f32).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ],
    };
    append_page_content(doc, page_id, ops)
}

fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Content,
) -> FlipbookResult<()> {
    let encoded = pdf(content.encode(), "encode content stream")?;
    let stream_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, encoded)));

    let page = pdf(
        pdf(doc.get_object_mut(page_id), "page object")?.as_dict_mut(),
        "page dictionary",
    )?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(rid)) => vec![Object::Reference(*rid), stream_id.into()],
        Ok(Object::Array(existing)) => {
            let mut v = existing.clone();
            v.push(stream_id.into());
            v
        }
        _ => vec![stream_id.into()],
    };
    page.set("Contents", contents);
    Ok(())
}

fn append_page_annot(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> FlipbookResult<()> {
    let annots_ref = {
        let page = pdf(doc.get_dictionary(page_id), "page dictionary")?;
        match page.get(b"Annots") {
            Ok(Object::Reference(rid)) => Some(*rid),
            _ => None,
        }
    };

    if let Some(rid) = annots_ref {
        let arr = pdf(
            pdf(doc.get_object_mut(rid), "annots object")?.as_array_mut(),
            "annots array",
        )?;
        arr.push(annot_id.into());
        return Ok(());
    }

    let page = pdf(
        pdf(doc.get_object_mut(page_id), "page object")?.as_dict_mut(),
        "page dictionary",
    )?;
    if matches!(page.get(b"Annots"), Ok(Object::Array(_))) {
        if let Ok(Object::Array(arr)) = page.get_mut(b"Annots") {
            arr.push(annot_id.into());
        }
    } else {
        page.set("Annots", vec![Object::from(annot_id)]);
    }
    Ok(())
}

fn add_xobject_resource(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    image_id: ObjectId,
) -> FlipbookResult<()> {
    // Resolve indirection up front; mutation below then needs only one borrow.
    let (resources_ref, xobject_ref, has_direct_resources) = {
        let page = pdf(doc.get_dictionary(page_id), "page dictionary")?;
        match page.get(b"Resources") {
            Ok(Object::Reference(rid)) => {
                let xref = doc
                    .get_dictionary(*rid)
                    .ok()
                    .and_then(|res| match res.get(b"XObject") {
                        Ok(Object::Reference(x)) => Some(*x),
                        _ => None,
                    });
                (Some(*rid), xref, false)
            }
            Ok(Object::Dictionary(res)) => {
                let xref = match res.get(b"XObject") {
                    Ok(Object::Reference(x)) => Some(*x),
                    _ => None,
                };
                (None, xref, true)
            }
            _ => (None, None, false),
        }
    };

    if let Some(xid) = xobject_ref {
        let xobjects = pdf(
            pdf(doc.get_object_mut(xid), "xobject dict")?.as_dict_mut(),
            "xobject dict",
        )?;
        xobjects.set(name, image_id);
        return Ok(());
    }

    let resources = match resources_ref {
        Some(rid) => pdf(
            pdf(doc.get_object_mut(rid), "resources object")?.as_dict_mut(),
            "resources dictionary",
        )?,
        None => {
            let page = pdf(
                pdf(doc.get_object_mut(page_id), "page object")?.as_dict_mut(),
                "page dictionary",
            )?;
            if !has_direct_resources {
                page.set("Resources", Dictionary::new());
            }
            pdf(
                pdf(page.get_mut(b"Resources"), "page resources")?.as_dict_mut(),
                "resources dictionary",
            )?
        }
    };

    if !matches!(resources.get(b"XObject"), Ok(Object::Dictionary(_))) {
        resources.set("XObject", Dictionary::new());
    }
    let xobjects = pdf(
        pdf(resources.get_mut(b"XObject"), "resources xobject")?.as_dict_mut(),
        "xobject dictionary",
    )?;
    xobjects.set(name, image_id);
    Ok(())
}

/// Locate (or create) the interactive form dictionary in the catalog.
fn acroform_dict_mut(doc: &mut Document) -> FlipbookResult<&mut Dictionary> {
    let root_id = pdf(
        doc.trailer.get(b"Root").and_then(Object::as_reference),
        "document catalog reference",
    )?;
    let acro_ref = {
        let catalog = pdf(doc.get_dictionary(root_id), "document catalog")?;
        match catalog.get(b"AcroForm") {
            Ok(Object::Reference(rid)) => Some(*rid),
            _ => None,
        }
    };

    match acro_ref {
        Some(rid) => pdf(
            pdf(doc.get_object_mut(rid), "acroform object")?.as_dict_mut(),
            "acroform dictionary",
        ),
        None => {
            let catalog = pdf(
                pdf(doc.get_object_mut(root_id), "catalog object")?.as_dict_mut(),
                "catalog dictionary",
            )?;
            if !matches!(catalog.get(b"AcroForm"), Ok(Object::Dictionary(_))) {
                catalog.set("AcroForm", Dictionary::new());
            }
            pdf(
                pdf(catalog.get_mut(b"AcroForm"), "catalog acroform")?.as_dict_mut(),
                "acroform dictionary",
            )
        }
    }
}

fn register_form_field(
    doc: &mut Document,
    field_id: ObjectId,
    courier_font: Option<ObjectId>,
) -> FlipbookResult<()> {
    let form = acroform_dict_mut(doc)?;

    if !matches!(form.get(b"Fields"), Ok(Object::Array(_))) {
        form.set("Fields", Vec::<Object>::new());
    }
    if let Ok(Object::Array(fields)) = form.get_mut(b"Fields") {
        fields.push(field_id.into());
    }
    // Widgets carry no appearance streams; the viewer regenerates them.
    form.set("NeedAppearances", true);
    form.set("DA", Object::string_literal("/Courier 0 Tf 0 g"));

    if let Some(font_id) = courier_font {
        if !matches!(form.get(b"DR"), Ok(Object::Dictionary(_))) {
            form.set("DR", Dictionary::new());
        }
        if let Ok(Object::Dictionary(dr)) = form.get_mut(b"DR") {
            if !matches!(dr.get(b"Font"), Ok(Object::Dictionary(_))) {
                dr.set("Font", Dictionary::new());
            }
            if let Ok(Object::Dictionary(fonts)) = dr.get_mut(b"Font") {
                fonts.set("Courier", font_id);
            }
        }
    }
    Ok(())
}

fn attach_document_script(doc: &mut Document, name: &str, js: &str) -> FlipbookResult<()> {
    let action_id = doc.add_object(dictionary! {
        "S" => "JavaScript",
        "JS" => Object::string_literal(js),
    });
    let tree_id = doc.add_object(dictionary! {
        "Names" => vec![Object::string_literal(name), action_id.into()],
    });

    let root_id = pdf(
        doc.trailer.get(b"Root").and_then(Object::as_reference),
        "document catalog reference",
    )?;
    let names_ref = {
        let catalog = pdf(doc.get_dictionary(root_id), "document catalog")?;
        match catalog.get(b"Names") {
            Ok(Object::Reference(rid)) => Some(*rid),
            _ => None,
        }
    };

    match names_ref {
        Some(rid) => {
            let names = pdf(
                pdf(doc.get_object_mut(rid), "names object")?.as_dict_mut(),
                "names dictionary",
            )?;
            names.set("JavaScript", tree_id);
        }
        None => {
            let catalog = pdf(
                pdf(doc.get_object_mut(root_id), "catalog object")?.as_dict_mut(),
                "catalog dictionary",
            )?;
            if !matches!(catalog.get(b"Names"), Ok(Object::Dictionary(_))) {
                catalog.set("Names", Dictionary::new());
            }
            if let Ok(Object::Dictionary(names)) = catalog.get_mut(b"Names") {
                names.set("JavaScript", tree_id);
            }
        }
    }
    Ok(())
}
