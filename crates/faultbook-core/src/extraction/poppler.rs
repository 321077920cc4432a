use crate::error::FaultbookError;
use crate::extraction::PdfDocument;
use crate::model::{BBox, PageRegion, TextFragment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use std::process::Command;

/// PDF backend using poppler-utils.
///
/// `pdfinfo` gives the page count, `pdffonts` tells whether a page carries a
/// text layer, and `pdftotext -bbox` returns one box per word.
#[derive(Debug)]
pub struct PopplerDocument {
    path: PathBuf,
    page_count: usize,
}

impl PopplerDocument {
    pub fn open(path: &Path) -> Result<Self, FaultbookError> {
        if !path.is_file() {
            return Err(FaultbookError::DocumentNotFound(path.to_path_buf()));
        }

        let info = run_tool(Command::new("pdfinfo").arg(path))?;
        let page_count = parse_page_count(&info).ok_or_else(|| {
            FaultbookError::Extraction(format!(
                "pdfinfo reported no page count for {}",
                path.display()
            ))
        })?;

        tracing::info!(path = %path.display(), page_count, "opened PDF");
        Ok(PopplerDocument {
            path: path.to_path_buf(),
            page_count,
        })
    }
}

impl PdfDocument for PopplerDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn read_page(&self, page_number: usize) -> Result<Option<PageRegion>, FaultbookError> {
        let page = page_number.to_string();

        let fonts = run_tool(
            Command::new("pdffonts")
                .args(["-f", page.as_str(), "-l", page.as_str()])
                .arg(&self.path),
        )?;
        if !lists_any_font(&fonts) {
            return Ok(None);
        }

        let xml = run_tool(
            Command::new("pdftotext")
                .args(["-bbox", "-f", page.as_str(), "-l", page.as_str()])
                .arg(&self.path)
                .arg("-"), // output to stdout
        )?;
        let fragments = parse_bbox_words(&xml)?;

        Ok(Some(PageRegion {
            page_number,
            fragments,
        }))
    }

    fn backend_name(&self) -> &str {
        "poppler"
    }
}

fn run_tool(command: &mut Command) -> Result<String, FaultbookError> {
    let tool = command.get_program().to_string_lossy().into_owned();
    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FaultbookError::PopplerNotFound
        } else {
            FaultbookError::Extraction(format!("{tool} failed: {e}"))
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(FaultbookError::PopplerFailed { tool, code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// `pdffonts` prints a two-line header followed by one line per font.
/// Image-only pages list no fonts.
fn lists_any_font(listing: &str) -> bool {
    listing
        .lines()
        .skip_while(|line| !line.starts_with("---"))
        .skip(1)
        .any(|line| !line.trim().is_empty())
}

/// Parse the XHTML produced by `pdftotext -bbox` into word fragments.
fn parse_bbox_words(xml: &str) -> Result<Vec<TextFragment>, FaultbookError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut words = Vec::new();
    let mut current: Option<(BBox, String)> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(tag) if tag.name().as_ref() == b"word" => {
                current = Some((parse_bbox(&tag)?, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::End(tag) if tag.name().as_ref() == b"word" => {
                if let Some((bbox, text)) = current.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        words.push(TextFragment {
                            text: text.to_string(),
                            bbox,
                        });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(words)
}

fn parse_bbox(tag: &BytesStart) -> Result<BBox, FaultbookError> {
    let mut coords = [None; 4];
    for attr in tag.attributes() {
        let attr = attr.map_err(xml_error)?;
        let slot = match attr.key.as_ref() {
            b"xMin" => 0,
            b"yMin" => 1,
            b"xMax" => 2,
            b"yMax" => 3,
            _ => continue,
        };
        let value = attr.unescape_value().map_err(xml_error)?;
        coords[slot] = value.trim().parse::<f32>().ok();
    }

    match coords {
        [Some(x_min), Some(y_min), Some(x_max), Some(y_max)] => Ok(BBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }),
        _ => Err(FaultbookError::Extraction(
            "word element without a complete bounding box".into(),
        )),
    }
}

fn xml_error(e: impl std::fmt::Display) -> FaultbookError {
    FaultbookError::Extraction(format!("malformed pdftotext -bbox output: {e}"))
}
