use crate::style::Rgb;

/// One character cell: eight dots and the color of the last dot drawn
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    pub bits: u8,
    pub color: Option<Rgb>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn glyph(&self) -> char {
        char::from_u32(0x2800 + self.bits as u32).unwrap_or(' ')
    }
}

/// Braille Unicode canvas with a foreground color per character cell.
/// Each cell is a 2x4 dot grid; later draws win the cell's color.
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<Cell>,
}

impl BrailleCanvas {
    /// Create a canvas of `width` x `height` characters
    /// (`width*2` x `height*4` dots).
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    /// Set a dot and color its cell.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        const BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

        let cell = &mut self.cells[cy * self.width + cx];
        cell.bits |= BITS[x % 2][y % 4];
        cell.color = Some(color);
    }

    /// Set a dot using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, color: Rgb) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col)
    }

    /// Cells of one row, left to right
    pub fn row(&self, row: usize) -> &[Cell] {
        if row >= self.height {
            return &[];
        }
        &self.cells[row * self.width..(row + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        (0..self.height).map(|i| self.row(i))
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.rows()
            .map(|row| row.iter().map(Cell::glyph).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::hex(0xff0000);
    const BLUE: Rgb = Rgb::hex(0x0000ff);

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0, RED);
        assert_eq!(canvas.to_string(), "⠁"); // U+2801
        assert_eq!(canvas.cell(0, 0).unwrap().color, Some(RED));
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y, RED);
            }
        }
        assert_eq!(canvas.to_string(), "⣿"); // U+28FF (all dots)
    }

    #[test]
    fn test_last_draw_wins_color() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(0, 0, RED);
        canvas.set_pixel(1, 1, BLUE);
        canvas.set_pixel(2, 2, RED);
        canvas.set_pixel(3, 3, RED);
        // First char: (0,0) and (1,1) = 0x01 | 0x10 = 0x11
        // Second char: (0,2) and (1,3) = 0x04 | 0x80 = 0x84
        assert_eq!(canvas.to_string(), "⠑⢄");
        assert_eq!(canvas.cell(0, 0).unwrap().color, Some(BLUE));
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(2, 0, RED);
        canvas.set_pixel_signed(-1, 0, RED);
        assert!(canvas.cell(0, 0).unwrap().is_empty());
        assert!(canvas.cell(1, 0).is_none());
    }
}
