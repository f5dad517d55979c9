// =============================================================================
// PRESENTATIONML PACKAGE PARTS
// =============================================================================
//
// A .pptx file is a zip archive of XML "parts" tied together by relationship
// files. The parts below are the smallest set PowerPoint, Keynote, LibreOffice
// and Google Slides all open without complaint: one master, one "Title Only"
// layout, one theme, and N slides.
//
// Sizes are in EMU (English Metric Units): 914400 EMU per inch, 12700 per point.

use chrono::{DateTime, SecondsFormat, Utc};

pub const EMU_PER_INCH: i64 = 914_400;

/// 10in x 7.5in, the classic 4:3 slide.
pub const SLIDE_WIDTH: i64 = 9_144_000;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

// =============================================================================
// TEXT
// =============================================================================

/// Escapes text for use inside XML elements and attributes.
/// Control characters XML 1.0 cannot carry are dropped.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            '\u{FFFE}' | '\u{FFFF}' => {}
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

fn namespaces() -> String {
    format!(r#"xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}""#)
}

fn relationship(id: &str, kind: &str, target: &str) -> String {
    format!(r#"<Relationship Id="{id}" Type="{REL_BASE}/{kind}" Target="{target}"/>"#)
}

fn relationships(entries: &[String]) -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        entries.concat()
    )
}

// =============================================================================
// PACKAGE LEVEL
// =============================================================================

pub fn content_types(slide_count: usize) -> String {
    let pml = "application/vnd.openxmlformats-officedocument.presentationml";
    let mut overrides = vec![
        format!(r#"<Override PartName="/ppt/presentation.xml" ContentType="{pml}.presentation.main+xml"/>"#),
        format!(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{pml}.slideMaster+xml"/>"#),
        format!(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{pml}.slideLayout+xml"/>"#),
        r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#.to_string(),
        format!(r#"<Override PartName="/ppt/presProps.xml" ContentType="{pml}.presProps+xml"/>"#),
        format!(r#"<Override PartName="/ppt/viewProps.xml" ContentType="{pml}.viewProps+xml"/>"#),
        format!(r#"<Override PartName="/ppt/tableStyles.xml" ContentType="{pml}.tableStyles+xml"/>"#),
        r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#.to_string(),
        r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#.to_string(),
    ];
    for n in 1..=slide_count {
        overrides.push(format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{pml}.slide+xml"/>"#
        ));
    }

    format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
        overrides.concat()
    )
}

pub fn package_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL_BASE}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

pub fn core_properties(title: &str, generated_at: DateTime<Utc>) -> String {
    let stamp = generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>insight-deck-service</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified></cp:coreProperties>"#,
        escape_xml(title)
    )
}

pub fn app_properties(slide_count: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>insight-deck-service</Application><Slides>{slide_count}</Slides></Properties>"#
    )
}

// =============================================================================
// PRESENTATION
// =============================================================================

/// Relationship ids: rId1 master, rId2 theme, rId3..rId5 props, slides after.
const FIRST_SLIDE_REL: usize = 6;

pub fn presentation(slide_count: usize) -> String {
    let slide_ids = if slide_count == 0 {
        String::new()
    } else {
        let ids: String = (0..slide_count)
            .map(|i| {
                format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    256 + i,
                    FIRST_SLIDE_REL + i
                )
            })
            .collect();
        format!("<p:sldIdLst>{ids}</p:sldIdLst>")
    };

    format!(
        r#"{XML_DECL}<p:presentation {} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{slide_ids}<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}" type="screen4x3"/><p:notesSz cx="{SLIDE_HEIGHT}" cy="{SLIDE_WIDTH}"/></p:presentation>"#,
        namespaces()
    )
}

pub fn presentation_rels(slide_count: usize) -> String {
    let mut entries = vec![
        relationship("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        relationship("rId2", "theme", "theme/theme1.xml"),
        relationship("rId3", "presProps", "presProps.xml"),
        relationship("rId4", "viewProps", "viewProps.xml"),
        relationship("rId5", "tableStyles", "tableStyles.xml"),
    ];
    for i in 0..slide_count {
        entries.push(relationship(
            &format!("rId{}", FIRST_SLIDE_REL + i),
            "slide",
            &format!("slides/slide{}.xml", i + 1),
        ));
    }
    relationships(&entries)
}

pub fn presentation_properties() -> String {
    format!(r#"{XML_DECL}<p:presentationPr {}/>"#, namespaces())
}

pub fn view_properties() -> String {
    format!(
        r#"{XML_DECL}<p:viewPr {}><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        namespaces()
    )
}

pub fn table_styles() -> String {
    format!(
        r#"{XML_DECL}<a:tblStyleLst xmlns:a="{NS_A}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#
    )
}

// =============================================================================
// MASTER, LAYOUT, THEME
// =============================================================================

fn group_shape_header() -> &'static str {
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
}

pub fn slide_master() -> String {
    let title = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr anchor="ctr"/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
        EMU_PER_INCH / 2,
        EMU_PER_INCH / 4,
        SLIDE_WIDTH - EMU_PER_INCH,
        EMU_PER_INCH
    );
    format!(
        r#"{XML_DECL}<p:sldMaster {}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{}{title}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="3600" b="1"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#,
        namespaces(),
        group_shape_header()
    )
}

pub fn slide_master_rels() -> String {
    relationships(&[
        relationship("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
        relationship("rId2", "theme", "../theme/theme1.xml"),
    ])
}

pub fn slide_layout() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout {} type="titleOnly" preserve="1"><p:cSld name="Title Only"><p:spTree>{}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        namespaces(),
        group_shape_header()
    )
}

pub fn slide_layout_rels() -> String {
    relationships(&[relationship(
        "rId1",
        "slideMaster",
        "../slideMasters/slideMaster1.xml",
    )])
}

pub fn theme() -> String {
    let accents = [
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ]
    .iter()
    .map(|(name, rgb)| format!(r#"<a:{name}><a:srgbClr val="{rgb}"/></a:{name}>"#))
    .collect::<String>();

    let font = |kind: &str| {
        format!(
            r#"<a:{kind}><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:{kind}>"#
        )
    };
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = format!(r#"<a:ln w="9525">{solid}</a:ln>"#);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2>{accents}</a:clrScheme><a:fontScheme name="Office">{}{}</a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{}</a:fillStyleLst><a:lnStyleLst>{}</a:lnStyleLst><a:effectStyleLst>{}</a:effectStyleLst><a:bgFillStyleLst>{}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#,
        font("majorFont"),
        font("minorFont"),
        solid.repeat(3),
        line.repeat(3),
        effect.repeat(3),
        solid.repeat(3),
    )
}

// =============================================================================
// SLIDES
// =============================================================================

/// A run of text inside a text box paragraph.
pub struct TextLine<'a> {
    pub text: &'a str,
    pub size_pt: u32,
    pub bold: bool,
}

/// A free-standing text box positioned on the slide.
pub struct TextBox<'a> {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub lines: Vec<TextLine<'a>>,
}

fn paragraph(line: &TextLine<'_>) -> String {
    let bold = if line.bold { r#" b="1""# } else { "" };
    format!(
        r#"<a:p><a:r><a:rPr lang="en-US" sz="{}"{bold} dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
        line.size_pt * 100,
        escape_xml(line.text)
    )
}

/// Shape ids on a slide: 1 is the tree, 2 the title. Names trail ids by one.
const FIRST_TEXT_BOX_ID: usize = 3;

pub fn slide(title: &str, boxes: &[TextBox<'_>]) -> String {
    let title_shape = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        escape_xml(title)
    );

    let text_shapes: String = boxes
        .iter()
        .enumerate()
        .map(|(i, text_box)| {
            let id = FIRST_TEXT_BOX_ID + i;
            let paragraphs: String = text_box.lines.iter().map(paragraph).collect();
            format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
                id - 1,
                text_box.x,
                text_box.y,
                text_box.width,
                text_box.height,
            )
        })
        .collect();

    format!(
        r#"{XML_DECL}<p:sld {}><p:cSld><p:spTree>{}{title_shape}{text_shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        namespaces(),
        group_shape_header()
    )
}

pub fn slide_rels() -> String {
    relationships(&[relationship(
        "rId1",
        "slideLayout",
        "../slideLayouts/slideLayout1.xml",
    )])
}
