//! ESC/POS command builders
//!
//! [`EscPosBuilder`] accumulates bytes and encodes them on `build`.
//! [`EscPosTextBuilder`] accumulates a UTF-8 `String` so that receipt
//! content can be previewed or stored before it is encoded and sent.

use crate::encoding::{encode_latin, text_width};

const INIT: [u8; 2] = [0x1B, 0x40];
const ALIGN_LEFT: &str = "\x1B\x61\x00";
const ALIGN_CENTER: &str = "\x1B\x61\x01";
const ALIGN_RIGHT: &str = "\x1B\x61\x02";
const BOLD_ON: &str = "\x1B\x45\x01";
const BOLD_OFF: &str = "\x1B\x45\x00";
const SIZE_DOUBLE: &str = "\x1D\x21\x11";
const SIZE_DOUBLE_HEIGHT: &str = "\x1D\x21\x01";
const SIZE_RESET: &str = "\x1D\x21\x00";

/// Layout of a left/right pair: padded on one line, or split with a space
fn compose_lr(width: usize, left: &str, right: &str) -> String {
    let used = text_width(left) + text_width(right);
    if used >= width {
        format!("{left} {right}")
    } else {
        format!("{left}{}{right}", " ".repeat(width - used))
    }
}

/// ESC/POS command builder
///
/// Common widths: 58mm paper holds 32 characters, 80mm paper 48.
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a builder; the buffer starts with INIT (ESC @)
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(2048);
        buf.extend_from_slice(&INIT);
        Self { buf, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    /// Write raw text (encoded on `build`)
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Print and feed n lines (ESC d n)
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    // === Alignment ===

    pub fn center(&mut self) -> &mut Self {
        self.text(ALIGN_CENTER)
    }

    pub fn left(&mut self) -> &mut Self {
        self.text(ALIGN_LEFT)
    }

    pub fn right(&mut self) -> &mut Self {
        self.text(ALIGN_RIGHT)
    }

    // === Text Style ===

    pub fn bold(&mut self) -> &mut Self {
        self.text(BOLD_ON)
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.text(BOLD_OFF)
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.text(SIZE_DOUBLE)
    }

    pub fn reset_size(&mut self) -> &mut Self {
        self.text(SIZE_RESET)
    }

    // === Separators ===

    pub fn sep_double(&mut self) -> &mut Self {
        let sep = "=".repeat(self.width);
        self.line(&sep)
    }

    pub fn sep_single(&mut self) -> &mut Self {
        let sep = "-".repeat(self.width);
        self.line(&sep)
    }

    /// Left and right text on the same line
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let composed = compose_lr(self.width, left, right);
        self.line(&composed)
    }

    // === Paper Control ===

    /// Feed n lines then full cut (GS V 66 n)
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    // === Build ===

    /// Final byte buffer in Windows-1252
    pub fn build(self) -> Vec<u8> {
        encode_latin(&self.buf)
    }

    /// Buffer without encoding (UTF-8 text, for tests and debugging)
    pub fn build_raw(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}

/// String-based ESC/POS builder used for receipt rendering
///
/// The result is a UTF-8 `String` with embedded commands; encode it with
/// [`encode_latin`] before sending.
pub struct EscPosTextBuilder {
    buf: String,
    width: usize,
}

impl EscPosTextBuilder {
    pub fn new(width: usize) -> Self {
        Self {
            buf: String::new(),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    pub fn write(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    pub fn write_line(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self.buf.push('\n');
        self
    }

    // === Alignment ===

    pub fn align_center(&mut self) -> &mut Self {
        self.write(ALIGN_CENTER)
    }

    pub fn align_left(&mut self) -> &mut Self {
        self.write(ALIGN_LEFT)
    }

    // === Text Style ===

    pub fn bold_on(&mut self) -> &mut Self {
        self.write(BOLD_ON)
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.write(BOLD_OFF)
    }

    pub fn size_double(&mut self) -> &mut Self {
        self.write(SIZE_DOUBLE)
    }

    pub fn size_double_height(&mut self) -> &mut Self {
        self.write(SIZE_DOUBLE_HEIGHT)
    }

    pub fn size_reset(&mut self) -> &mut Self {
        self.write(SIZE_RESET)
    }

    // === Separators ===

    pub fn eq_sep(&mut self) -> &mut Self {
        let sep = "=".repeat(self.width);
        self.write_line(&sep)
    }

    pub fn dash_sep(&mut self) -> &mut Self {
        let sep = "-".repeat(self.width);
        self.write_line(&sep)
    }

    // === Layout Helpers ===

    /// Centered line, alignment restored to left afterwards
    pub fn text_center(&mut self, s: &str) -> &mut Self {
        self.align_center();
        self.write_line(s);
        self.align_left()
    }

    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let composed = compose_lr(self.width, left, right);
        self.write_line(&composed)
    }

    /// Label followed by a value that may wrap onto the next lines
    pub fn labeled(&mut self, label: &str, value: &str) -> &mut Self {
        self.bold_on();
        self.write(label);
        self.bold_off();
        self.write(" ");
        self.write_line(value)
    }

    // === Build ===

    pub fn finalize(self) -> String {
        self.buf
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Default for EscPosTextBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_starts_with_init() {
        let mut b = EscPosBuilder::new(32);
        b.center().double_size().line("Pedido").reset_size();
        let data = b.build_raw();
        assert_eq!(&data[..2], &INIT);
        assert!(String::from_utf8_lossy(&data).contains("Pedido"));
    }

    #[test]
    fn test_build_encodes_accents() {
        let mut b = EscPosBuilder::new(32);
        b.line("Entregue já");
        let data = b.build();
        assert!(data.contains(&0xE1)); // á
        assert!(!data.windows(2).any(|w| w == [0xC3, 0xA1]));
    }

    #[test]
    fn test_line_lr_pads_to_width() {
        let mut b = EscPosTextBuilder::new(20);
        b.line_lr("Subtotal:", "R$ 10,00");
        assert_eq!(b.as_str(), "Subtotal:   R$ 10,00\n");
    }

    #[test]
    fn test_line_lr_counts_accents_as_one_column() {
        let mut b = EscPosTextBuilder::new(16);
        b.line_lr("Açaí", "R$ 9,90");
        let line = b.finalize();
        assert_eq!(text_width(line.trim_end_matches('\n')), 16);
    }

    #[test]
    fn test_line_lr_overflow() {
        let mut b = EscPosTextBuilder::new(10);
        b.line_lr("Taxa de Entrega:", "R$ 5,00");
        assert_eq!(b.as_str(), "Taxa de Entrega: R$ 5,00\n");
    }

    #[test]
    fn test_separators() {
        let mut b = EscPosBuilder::new(10);
        b.sep_double();
        let s = String::from_utf8(b.build_raw()).unwrap();
        assert!(s.contains("=========="));

        let mut t = EscPosTextBuilder::new(4);
        t.dash_sep();
        assert_eq!(t.as_str(), "----\n");
    }

    #[test]
    fn test_text_center_restores_alignment() {
        let mut t = EscPosTextBuilder::new(32);
        t.text_center("Obrigado");
        assert_eq!(t.as_str(), "\x1B\x61\x01Obrigado\n\x1B\x61\x00");
    }
}
