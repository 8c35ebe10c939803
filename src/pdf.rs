// Minimal PDF 1.4 writer.
//
// Only what the report needs: landscape pages, the two standard Helvetica
// faces, filled/stroked rectangles and single-line text. Content streams are
// left uncompressed.

/// A4 landscape, in points.
pub const PAGE_WIDTH: f64 = 842.0;
pub const PAGE_HEIGHT: f64 = 595.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "/F1",
            Font::Bold => "/F2",
        }
    }
}

/// Rough Helvetica advance width; good enough to decide truncation.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.52
}

/// Cut `text` so it fits in `width` points, marking the cut with `...`.
pub fn fit_text(text: &str, size: f64, width: f64) -> String {
    if text_width(text, size) <= width {
        return text.to_string();
    }
    let max_chars = (width / (size * 0.52)).floor() as usize;
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Escape a string literal for a content stream.
///
/// Latin-1 characters map onto WinAnsiEncoding via octal escapes; anything
/// outside that range becomes `?`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", ch as u32)),
            c if c.is_control() => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

/// Drawing operations for one page.
#[derive(Debug, Default, Clone)]
pub struct Canvas {
    ops: String,
}

impl Canvas {
    pub fn new() -> Self {
        Canvas::default()
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, gray: f64) {
        self.ops.push_str(&format!(
            "q {:.3} g {:.2} {:.2} {:.2} {:.2} re f Q\n",
            gray, x, y, w, h
        ));
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, gray: f64, line_width: f64) {
        self.ops.push_str(&format!(
            "q {:.3} G {:.2} w {:.2} {:.2} {:.2} {:.2} re S Q\n",
            gray, line_width, x, y, w, h
        ));
    }

    pub fn text(&mut self, x: f64, y: f64, font: Font, size: f64, text: &str) {
        self.ops.push_str(&format!(
            "BT {} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            font.resource(),
            size,
            x,
            y,
            escape_text(text)
        ));
    }

    pub fn into_content(self) -> String {
        self.ops
    }
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    title: String,
    pages: Vec<String>,
}

impl PdfDocument {
    pub fn new(title: &str) -> Self {
        PdfDocument {
            title: title.to_string(),
            pages: Vec::new(),
        }
    }

    pub fn add_page(&mut self, canvas: Canvas) {
        self.pages.push(canvas.into_content());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len().max(1)
    }

    /// Serialize with a cross-reference table. A document without pages still
    /// gets one blank page.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut pages = self.pages.clone();
        if pages.is_empty() {
            pages.push(String::new());
        }

        // 1 catalog, 2 page tree, 3-4 fonts, 5 info, then (page, content) pairs.
        let first_page = 6;
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page + 2 * i).collect();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()).into_bytes(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
            format!(
                "<< /Title ({}) /Producer (rca_dashboard) >>",
                escape_text(&self.title)
            )
            .into_bytes(),
        ];
        for (content, page_id) in pages.iter().zip(page_ids.iter()) {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    PAGE_WIDTH,
                    PAGE_HEIGHT,
                    page_id + 1
                )
                .into_bytes(),
            );
            let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            stream.extend_from_slice(content.as_bytes());
            stream.extend_from_slice(b"endstream");
            objects.push(stream);
        }

        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(buf.len());
            buf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            buf.extend_from_slice(body);
            buf.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = buf.len();
        buf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        buf.extend_from_slice(b"0000000000 65535 f \n");
        for off in &offsets {
            buf.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
        }
        buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_at
            )
            .as_bytes(),
        );
        buf
    }
}
