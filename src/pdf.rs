//! Boarding-pass PDF export.
//!
//! The document is a single A4 flow of text blocks and images, continued on a
//! new page if it runs past the bottom margin. It is rendered fully in memory
//! and only then written to disk.

use std::fs;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::image::{DynamicImage, Rgb as PixelRgb, RgbImage, Rgba, RgbaImage};
use printpdf::*;
use tracing::{info, warn};

use crate::codec::generate_barcode_image;
use crate::config::PdfConfig;
use crate::date::{format_ticket_date, short_time};
use crate::error::{Error, Result};
use crate::models::TicketDetail;

// ============================================================================
// Constants
// ============================================================================

/// A4 dimensions in mm
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;

const PT_TO_MM: f32 = 25.4 / 72.0;

/// Margins
const MARGIN_MM: f32 = 36.0 * PT_TO_MM;

/// Logo placement, measured from the top-right corner
const LOGO_WIDTH_MM: f32 = 300.0 * PT_TO_MM;
const LOGO_RIGHT_OFFSET_MM: f32 = 50.0 * PT_TO_MM;
const LOGO_BOTTOM_FROM_TOP_MM: f32 = 350.0 * PT_TO_MM;
const LOGO_CORNER_RADIUS_PX: u32 = 200;

/// Barcode box
const BARCODE_WIDTH_MM: f32 = 200.0 * PT_TO_MM;
const BARCODE_HEIGHT_MM: f32 = 50.0 * PT_TO_MM;

/// Space between paragraphs
const PARAGRAPH_GAP_MM: f32 = 1.5;

/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Font sizes in points
const TITLE_FONT_SIZE: f32 = 28.0;
const AIRPORT_FONT_SIZE: f32 = 20.0;
const HEADING_FONT_SIZE: f32 = 16.0;
const SCHEDULE_FONT_SIZE: f32 = 14.0;
const EMPHASIS_FONT_SIZE: f32 = 12.0;
const NORMAL_FONT_SIZE: f32 = 11.0;
const LABEL_FONT_SIZE: f32 = 10.0;
const FINE_PRINT_FONT_SIZE: f32 = 8.0;

/// Placeholder values printed on every pass
const BOARDING_GROUP: &str = "4";
const SEAT: &str = "6C";
const BOOKING_REFERENCE: &str = "W6LTWP 2017-07-13";
const ORIGIN_CITY: &str = "LIMA";
const ORIGIN_AIRPORT: &str = "NUEVO AEROPUERTO INTERNACIONAL JORGE CHAVEZ";

const BRAND_TITLE: &str = "XPECTRUM";
const BRAND_SUBTITLE: &str = "Operated by Expectrum Peru";

const FINE_PRINT: [&str; 3] = [
    "Recuerda que el artículo personal permitido sin costo por Viva Air es una única pieza de máximo 6 kg y 40x35x25 cm. Exceder las medidas o peso tendrá un costo adicional.",
    "Acércate al counter para reclamar el pase de abordar y entregar el equipaje, está disponible entre 2 horas y 45 minutos antes de la salida programada para vuelos nacionales. Todos los pasajeros deben presentarse en la sala de espera a más tardar 45 minutos antes de la salida programada del vuelo.",
    "El equipaje en cabina, y en general cualquier pieza, que exceda los 55x45x25 cm y 12 kg, deberá ser entregado en el counter de Viva Air antes de ingresar a la espera y dentro de los tiempos mencionados en el punto anterior.",
];

const HASHTAG: &str = "#YoSoyXPECTRUM";

/// Logo used when no path or URL is configured.
const BUNDLED_LOGO: &[u8] = include_bytes!("../assets/logo.png");

// ============================================================================
// Export
// ============================================================================

/// `BoardingPass-<name>-<flightCode>.pdf`, with path separators replaced.
pub fn file_name(ticket: &TicketDetail) -> String {
    format!("BoardingPass-{}-{}.pdf", ticket.name, ticket.flight_code).replace(['/', '\\'], "-")
}

/// Render the boarding pass for `ticket` and write it into the configured
/// output directory. An existing file with the same name is overwritten.
///
/// # Errors
///
/// Returns [`Error::Pdf`] if the document cannot be assembled and
/// [`Error::Io`] if it cannot be written. A partially written file is removed.
pub fn generate_boarding_pass(ticket: &TicketDetail, config: &PdfConfig) -> Result<PathBuf> {
    let logo = resolve_logo(config);
    let bytes = render_boarding_pass(ticket, logo.as_ref())?;

    let dir = config.resolved_output_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name(ticket));
    write_or_remove(&path, &bytes)?;

    info!(path = %path.display(), size = bytes.len(), "boarding pass written");
    Ok(path)
}

/// Status line shown after an export attempt.
pub fn export_message(result: &Result<PathBuf>) -> String {
    match result {
        Ok(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("PDF guardado en Descargas: {}", name)
        }
        Err(e) => format!("Error al generar PDF: {}", e),
    }
}

fn write_or_remove(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Err(e) = fs::write(path, bytes) {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
        return Err(e.into());
    }
    Ok(())
}

// ============================================================================
// Logo
// ============================================================================

/// The configured logo, or the bundled one when none is set. Any failure is
/// logged and yields `None` so the pass falls back to a text header.
pub fn resolve_logo(config: &PdfConfig) -> Option<DynamicImage> {
    let source = config.logo.as_deref();
    let loaded = match source {
        Some(source) => load_logo(source, config.logo_timeout()),
        None => ::image::load_from_memory(BUNDLED_LOGO).map_err(Error::from),
    };
    match loaded {
        Ok(img) => Some(img),
        Err(e) => {
            warn!(source = source.unwrap_or("bundled"), "logo unavailable, using text header: {}", e);
            None
        }
    }
}

/// Load the logo from a file path or an http(s) URL. `timeout` bounds both
/// connecting and each read.
///
/// # Errors
///
/// Returns [`Error::Image`] if the logo cannot be fetched or decoded.
pub fn load_logo(source: &str, timeout: Duration) -> Result<DynamicImage> {
    let image_bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        let response = agent
            .get(source)
            .call()
            .map_err(|e| Error::Image(format!("Failed to fetch URL: {}", e)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| Error::Image(format!("Failed to read response: {}", e)))?;
        bytes
    } else {
        fs::read(source).map_err(|e| Error::Image(format!("{}: {}", source, e)))?
    };

    Ok(::image::load_from_memory(&image_bytes)?)
}

/// Make everything outside a rounded rectangle of `radius` pixels transparent.
pub fn round_corners(img: &DynamicImage, radius: u32) -> RgbaImage {
    let mut output = img.to_rgba8();
    let (width, height) = output.dimensions();
    let r = radius.min(width / 2).min(height / 2) as f32;

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        // Distance is measured from pixel centres to the nearest corner circle.
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let cx = px.clamp(r, width as f32 - r);
        let cy = py.clamp(r, height as f32 - r);
        let (dx, dy) = (px - cx, py - cy);
        if dx * dx + dy * dy > r * r {
            pixel.0[3] = 0;
        }
    }
    output
}

/// Flatten an RGBA image onto a white background.
fn composite_on_white(rgba_image: &RgbaImage) -> RgbImage {
    let (width_px, height_px) = rgba_image.dimensions();
    let mut rgb_image = RgbImage::new(width_px, height_px);
    for (x, y, pixel) in rgba_image.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let bg = 255.0;
        let out_r = (r as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_g = (g as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_b = (b as f32 * alpha + bg * (1.0 - alpha)) as u8;
        rgb_image.put_pixel(x, y, PixelRgb([out_r, out_g, out_b]));
    }
    rgb_image
}

// ============================================================================
// Document Assembly
// ============================================================================

/// Build the boarding pass document and return the PDF bytes.
///
/// Without a logo (or if embedding it fails) the brand header is printed as
/// text only and the rest of the document is unchanged.
///
/// # Errors
///
/// Returns [`Error::Pdf`] if fonts, the barcode or serialization fail.
pub fn render_boarding_pass(ticket: &TicketDetail, logo: Option<&DynamicImage>) -> Result<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Boarding Pass",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    let font_regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::Pdf(e.to_string()))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::Pdf(e.to_string()))?;

    {
        let mut flow = Flow::new(&doc, doc.get_page(page1).get_layer(layer1));

        let logo_placed = match logo {
            Some(img) => match embed_logo(&flow.layer, img) {
                Ok(left_x) => {
                    flow.set_exclusion(left_x, PAGE_HEIGHT_MM - LOGO_BOTTOM_FROM_TOP_MM);
                    true
                }
                Err(e) => {
                    warn!("failed to compose logo: {}", e);
                    false
                }
            },
            None => false,
        };
        draw_brand_header(&mut flow, &font_regular, &font_bold, logo_placed);
        draw_passenger_section(&mut flow, &font_regular, &font_bold, ticket);
        draw_barcode(&mut flow)?;
        draw_schedule(&mut flow, &font_bold, ticket);
        draw_fine_print(&mut flow, &font_regular, &font_bold);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| Error::Pdf(e.to_string()))?;
    writer.into_inner().map_err(|e| Error::Pdf(e.to_string()))
}

fn draw_brand_header(
    flow: &mut Flow,
    font_regular: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    logo_placed: bool,
) {
    let title_color = if logo_placed {
        Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
    } else {
        Color::Rgb(Rgb::new(0.0, 0.0, 1.0, None))
    };
    if logo_placed {
        flow.space(20.0 * PT_TO_MM);
    }
    flow.layer.set_fill_color(title_color);
    flow.paragraph(BRAND_TITLE, font_bold, TITLE_FONT_SIZE);
    flow.layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    flow.paragraph(BRAND_SUBTITLE, font_regular, LABEL_FONT_SIZE);
}

fn draw_passenger_section(
    flow: &mut Flow,
    font_regular: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    ticket: &TicketDetail,
) {
    flow.paragraph("Pase de abordar", font_bold, HEADING_FONT_SIZE);
    flow.paragraph("Online boarding pass", font_regular, NORMAL_FONT_SIZE);
    flow.blank_line(NORMAL_FONT_SIZE);

    flow.paragraph("Nombre de pasajero/Name of passenger", font_regular, LABEL_FONT_SIZE);
    flow.paragraph(&or_dash(&ticket.name).to_uppercase(), font_bold, EMPHASIS_FONT_SIZE);

    flow.paragraph(
        &format!("Vuelo No./Flight #: {}", or_dash(&ticket.flight_code)),
        font_bold,
        EMPHASIS_FONT_SIZE,
    );
    flow.paragraph(&format!("Grupo de abordaje: {}", BOARDING_GROUP), font_regular, LABEL_FONT_SIZE);
    flow.paragraph(&format!("Seat: {}", SEAT), font_regular, LABEL_FONT_SIZE);
    flow.paragraph(&format!("Booking: {}", BOOKING_REFERENCE), font_regular, LABEL_FONT_SIZE);
    flow.blank_line(NORMAL_FONT_SIZE);
}

fn draw_barcode(flow: &mut Flow) -> Result<()> {
    let barcode = generate_barcode_image(BOOKING_REFERENCE)?;
    flow.image(&barcode.to_rgb8(), BARCODE_WIDTH_MM, BARCODE_HEIGHT_MM);
    Ok(())
}

fn draw_schedule(flow: &mut Flow, font_bold: &IndirectFontRef, ticket: &TicketDetail) {
    let departure_date = format_ticket_date(Some(&ticket.departure_date)).unwrap_or_default();
    let arrival_date = format_ticket_date(Some(&ticket.arrival_date)).unwrap_or_default();

    flow.paragraph(
        &format!("{} - {}", ORIGIN_CITY, ORIGIN_AIRPORT),
        font_bold,
        AIRPORT_FONT_SIZE,
    );
    flow.blank_line(NORMAL_FONT_SIZE);
    flow.paragraph(
        &format!("Salida: {} {}", departure_date, short_time(&ticket.departure_time)),
        font_bold,
        SCHEDULE_FONT_SIZE,
    );
    flow.paragraph(
        &format!("Llegada: {} {}", arrival_date, short_time(&ticket.arrival_time)),
        font_bold,
        SCHEDULE_FONT_SIZE,
    );
    flow.blank_line(NORMAL_FONT_SIZE);
}

fn draw_fine_print(flow: &mut Flow, font_regular: &IndirectFontRef, font_bold: &IndirectFontRef) {
    for (i, text) in FINE_PRINT.iter().enumerate() {
        if i > 0 {
            flow.blank_line(FINE_PRINT_FONT_SIZE);
        }
        flow.paragraph(text, font_regular, FINE_PRINT_FONT_SIZE);
    }
    flow.blank_line(FINE_PRINT_FONT_SIZE);
    flow.paragraph(HASHTAG, font_bold, EMPHASIS_FONT_SIZE);
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Place the rounded logo in the top-right corner. Returns its left edge.
fn embed_logo(layer: &PdfLayerReference, logo: &DynamicImage) -> Result<f32> {
    let (width_px, height_px) = (logo.width(), logo.height());
    if width_px == 0 || height_px == 0 {
        return Err(Error::Image("logo has no pixels".to_string()));
    }

    let rounded = round_corners(logo, LOGO_CORNER_RADIUS_PX);
    let rgb_image = composite_on_white(&rounded);

    let height_mm = LOGO_WIDTH_MM * height_px as f32 / width_px as f32;
    let x = PAGE_WIDTH_MM - LOGO_WIDTH_MM - LOGO_RIGHT_OFFSET_MM;
    let y = PAGE_HEIGHT_MM - LOGO_BOTTOM_FROM_TOP_MM;
    place_image(layer, &rgb_image, x, y, LOGO_WIDTH_MM, height_mm, true);
    Ok(x)
}

// ============================================================================
// Flow Layout
// ============================================================================

/// Top-to-bottom cursor over the pages of a document.
struct Flow<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    /// Top of the next block, in mm from the bottom of the page.
    y: f32,
    /// Right edge for text while the cursor is above `exclusion_bottom`.
    exclusion: Option<(f32, f32)>,
}

impl<'a> Flow<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
            exclusion: None,
        }
    }

    fn set_exclusion(&mut self, left_x: f32, bottom_y: f32) {
        self.exclusion = Some((left_x, bottom_y));
    }

    fn text_width(&self) -> f32 {
        match self.exclusion {
            Some((left_x, bottom_y)) if self.y > bottom_y => left_x - MARGIN_MM - 4.0,
            _ => PAGE_WIDTH_MM - 2.0 * MARGIN_MM,
        }
    }

    /// Start a new page when `height` does not fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height >= MARGIN_MM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        self.exclusion = None;
    }

    fn space(&mut self, height: f32) {
        self.y -= height;
    }

    fn blank_line(&mut self, font_size: f32) {
        self.space(line_height(font_size) + PARAGRAPH_GAP_MM);
    }

    fn paragraph(&mut self, text: &str, font: &IndirectFontRef, font_size: f32) {
        let line_h = line_height(font_size);
        let max_chars = chars_per_line(self.text_width(), font_size);
        for line in wrap_text(text, max_chars) {
            self.reserve(line_h);
            self.y -= line_h;
            // Baseline sits a little above the bottom of the line box.
            let baseline = self.y + line_h * 0.2;
            self.layer
                .use_text(&line, font_size, Mm(MARGIN_MM), Mm(baseline), font);
        }
        self.y -= PARAGRAPH_GAP_MM;
    }

    fn image(&mut self, rgb_image: &RgbImage, width_mm: f32, height_mm: f32) {
        self.reserve(height_mm);
        self.y -= height_mm;
        place_image(&self.layer, rgb_image, MARGIN_MM, self.y, width_mm, height_mm, false);
        self.y -= PARAGRAPH_GAP_MM;
    }
}

fn line_height(font_size: f32) -> f32 {
    font_size * 1.2 * PT_TO_MM
}

fn chars_per_line(width_mm: f32, font_size: f32) -> usize {
    let glyph_mm = font_size * AVG_GLYPH_WIDTH * PT_TO_MM;
    ((width_mm / glyph_mm).floor() as usize).max(1)
}

/// Greedy word wrap. Words longer than a line get a line of their own.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Draw `rgb_image` with its bottom-left corner at (`x`, `y`), stretched to
/// `width_mm` x `height_mm`.
fn place_image(
    layer: &PdfLayerReference,
    rgb_image: &RgbImage,
    x: f32,
    y: f32,
    width_mm: f32,
    height_mm: f32,
    interpolate: bool,
) {
    let (width_px, height_px) = rgb_image.dimensions();

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate,
        image_data: rgb_image.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4) fixes the width; height is scaled to fit.
    let dpi = (width_px as f32) / (width_mm / 25.4);
    let natural_height_mm = height_px as f32 / dpi * 25.4;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            scale_y: Some(height_mm / natural_height_mm),
            ..Default::default()
        },
    );
}
