//! Static width tables for the two PDF base fonts the document uses.
//!
//! Widths are in em units (glyph advance / 1000 from the Helvetica AFM files).
//! Both tables cover ASCII 0x20..=0x7E; index = (char as usize) - 32.

/// The base-14 fonts the renderer embeds by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    /// Resource name used in page content streams.
    pub fn resource(&self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> &'static FontMetricTable {
        match self {
            Font::Helvetica => &HELVETICA_TABLE,
            Font::HelveticaBold => &HELVETICA_BOLD_TABLE,
        }
    }
}

pub struct FontMetricTable {
    widths: [f32; 95],
    /// Used for every character outside printable ASCII.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Width of `s` in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Width of `s` in points at `size`.
    pub fn width_pt(&self, s: &str, size: f32) -> f32 {
        self.measure_str(s) * size
    }

    /// Greedy word wrap at `max_width` points. Explicit newlines start a new
    /// line; a single word wider than the line is broken between characters.
    /// Empty or whitespace-only text yields no lines.
    pub fn wrap_lines(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let max_em = max_width / size;
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in paragraph.split_whitespace() {
                for piece in self.split_oversized(word, max_em) {
                    let piece_w = self.measure_str(&piece);
                    if current.is_empty() {
                        current_width = piece_w;
                        current = piece;
                    } else if current_width + self.space_width + piece_w > max_em {
                        lines.push(std::mem::take(&mut current));
                        current_width = piece_w;
                        current = piece;
                    } else {
                        current.push(' ');
                        current.push_str(&piece);
                        current_width += self.space_width + piece_w;
                    }
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }
        lines
    }

    fn split_oversized(&self, word: &str, max_em: f32) -> Vec<String> {
        if self.measure_str(word) <= max_em {
            return vec![word.to_string()];
        }
        let mut pieces = Vec::new();
        let mut piece = String::new();
        let mut width = 0.0_f32;
        for c in word.chars() {
            let mut buf = [0u8; 4];
            let w = self.measure_str(c.encode_utf8(&mut buf));
            if !piece.is_empty() && width + w > max_em {
                pieces.push(std::mem::take(&mut piece));
                width = 0.0;
            }
            piece.push(c);
            width += w;
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0-9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0-9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        assert_eq!(Font::Helvetica.metrics().measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        // "Rust" = R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = Font::Helvetica.metrics().measure_str("Rust");
        assert!((width - 2.056).abs() < 1e-3, "got {width}");
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "Backend Developer";
        assert!(
            Font::HelveticaBold.metrics().measure_str(text)
                > Font::Helvetica.metrics().measure_str(text)
        );
    }

    #[test]
    fn test_non_ascii_falls_back_to_average() {
        let metrics = Font::Helvetica.metrics();
        assert!((metrics.measure_str("ø") - metrics.average_char_width).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_lines_fits_width() {
        let metrics = Font::Helvetica.metrics();
        let text = "Built and operated payment services handling card settlement \
                    for several Nordic banks with strict uptime requirements";
        let lines = metrics.wrap_lines(text, 10.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.width_pt(line, 10.0) <= 200.0, "overflow: {line}");
        }
        assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_wrap_lines_keeps_explicit_newlines() {
        let lines = Font::Helvetica.metrics().wrap_lines("first\nsecond", 10.0, 500.0);
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_wrap_lines_breaks_oversized_word() {
        let metrics = Font::Helvetica.metrics();
        let word = "x".repeat(200);
        let lines = metrics.wrap_lines(&word, 10.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_wrap_lines_empty_text() {
        assert!(Font::Helvetica.metrics().wrap_lines("   ", 10.0, 100.0).is_empty());
    }
}
