use super::pptx_parts::{self, TextBox, TextLine, EMU_PER_INCH};
use crate::core::report::{DeckRenderer, RenderError, RenderedDeck, SlideContent, SlideContentMap};
use chrono::{DateTime, Utc};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SECTION_TOP_INCHES: f64 = 1.5;
const LINE_HEIGHT_INCHES: f64 = 0.5;
const HEADER_SIZE_PT: u32 = 18;
const BULLET_SIZE_PT: u32 = 14;
const DECK_TITLE: &str = "Generated Report";

/// Writes slide content as a .pptx package.
///
/// One slide per map entry, in ascending slide index. Each slide gets the title
/// `Slide <index>` and one text box per non-empty section, stacked top to bottom.
#[derive(Debug, Clone, Default)]
pub struct PptxRenderer;

impl PptxRenderer {
    /// Renders with an explicit timestamp for the document properties. Two calls
    /// with the same content and timestamp produce identical bytes.
    pub fn render_at(
        &self,
        content: &SlideContentMap,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedDeck, RenderError> {
        let slide_count = content.len();
        let mut package = PackageWriter::new();

        package.add("[Content_Types].xml", &pptx_parts::content_types(slide_count))?;
        package.add("_rels/.rels", &pptx_parts::package_rels())?;
        package.add(
            "docProps/core.xml",
            &pptx_parts::core_properties(DECK_TITLE, generated_at),
        )?;
        package.add("docProps/app.xml", &pptx_parts::app_properties(slide_count))?;
        package.add("ppt/presentation.xml", &pptx_parts::presentation(slide_count))?;
        package.add(
            "ppt/_rels/presentation.xml.rels",
            &pptx_parts::presentation_rels(slide_count),
        )?;
        package.add("ppt/presProps.xml", &pptx_parts::presentation_properties())?;
        package.add("ppt/viewProps.xml", &pptx_parts::view_properties())?;
        package.add("ppt/tableStyles.xml", &pptx_parts::table_styles())?;
        package.add("ppt/slideMasters/slideMaster1.xml", &pptx_parts::slide_master())?;
        package.add(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &pptx_parts::slide_master_rels(),
        )?;
        package.add("ppt/slideLayouts/slideLayout1.xml", &pptx_parts::slide_layout())?;
        package.add(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &pptx_parts::slide_layout_rels(),
        )?;
        package.add("ppt/theme/theme1.xml", &pptx_parts::theme())?;

        for (position, (slide_no, slide_content)) in content.iter().enumerate() {
            let n = position + 1;
            package.add(
                &format!("ppt/slides/slide{n}.xml"),
                &slide_xml(*slide_no, slide_content),
            )?;
            package.add(
                &format!("ppt/slides/_rels/slide{n}.xml.rels"),
                &pptx_parts::slide_rels(),
            )?;
        }

        Ok(RenderedDeck {
            bytes: package.finish()?,
            slide_count,
        })
    }
}

impl DeckRenderer for PptxRenderer {
    fn render(&self, content: &SlideContentMap) -> Result<RenderedDeck, RenderError> {
        self.render_at(content, Utc::now())
    }
}

fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

fn slide_xml(slide_no: i64, content: &SlideContent) -> String {
    let labels: Vec<(String, Vec<String>)> = content
        .sections()
        .map(|(label, items)| {
            let bullets: Vec<String> = items.iter().map(|item| format!("- {item}")).collect();
            (format!("{label}:"), bullets)
        })
        .collect();

    let mut y_offset = SECTION_TOP_INCHES;
    let mut boxes = Vec::with_capacity(labels.len());
    for (header, bullets) in &labels {
        let height = bullets.len() as f64 * LINE_HEIGHT_INCHES + LINE_HEIGHT_INCHES;

        let mut lines = Vec::with_capacity(bullets.len() + 1);
        lines.push(TextLine {
            text: header,
            size_pt: HEADER_SIZE_PT,
            bold: true,
        });
        lines.extend(bullets.iter().map(|bullet| TextLine {
            text: bullet,
            size_pt: BULLET_SIZE_PT,
            bold: false,
        }));

        boxes.push(TextBox {
            x: inches(0.5),
            y: inches(y_offset),
            width: inches(9.0),
            height: inches(height),
            lines,
        });
        y_offset += height;
    }

    pptx_parts::slide(&format!("Slide {slide_no}"), &boxes)
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Thin wrapper over the zip writer that maps its errors into `RenderError`.
struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl PackageWriter {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn add(&mut self, name: &str, xml: &str) -> Result<(), RenderError> {
        self.zip
            .start_file(name, part_options())
            .map_err(|e| RenderError::Zip(e.to_string()))?;
        self.zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| RenderError::Zip(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
