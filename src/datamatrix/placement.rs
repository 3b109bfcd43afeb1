//! Codeword placement into the DataMatrix mapping matrix: codewords are laid
//! out as "Utah" shaped 8 module blocks along diagonal sweeps, with four
//! special corner shapes.

use crate::symbol::ModuleGrid;

struct Placement<'a> {
    nrow: i32,
    ncol: i32,
    codewords: &'a [u8],
    grid: ModuleGrid,
    placed: Vec<bool>,
}

impl<'a> Placement<'a> {
    fn is_placed(&self, row: i32, col: i32) -> bool {
        self.placed[(row * self.ncol + col) as usize]
    }

    /// Places bit `bit` (1 = most significant) of codeword `chr`, wrapping
    /// negative coordinates around the matrix.
    fn module(&mut self, mut row: i32, mut col: i32, chr: usize, bit: u32) {
        if row < 0 {
            row += self.nrow;
            col += 4 - ((self.nrow + 4) % 8);
        }
        if col < 0 {
            col += self.ncol;
            row += 4 - ((self.ncol + 4) % 8);
        }
        let value = self.codewords.get(chr).copied().unwrap_or(0);
        self.grid.set(col as u32, row as u32, (value >> (8 - bit)) & 1 == 1);
        self.placed[(row * self.ncol + col) as usize] = true;
    }

    fn utah(&mut self, row: i32, col: i32, chr: usize) {
        const SHAPE: [(i32, i32); 8] = [(-2, -2), (-2, -1), (-1, -2), (-1, -1), (-1, 0), (0, -2), (0, -1), (0, 0)];
        for (bit, (dr, dc)) in SHAPE.iter().enumerate() {
            self.module(row + dr, col + dc, chr, bit as u32 + 1);
        }
    }

    fn corner(&mut self, cells: [(i32, i32); 8], chr: usize) {
        for (bit, &(row, col)) in cells.iter().enumerate() {
            self.module(row, col, chr, bit as u32 + 1);
        }
    }

    fn run(mut self) -> ModuleGrid {
        let (nrow, ncol) = (self.nrow, self.ncol);
        let mut chr = 0;
        let (mut row, mut col) = (4i32, 0i32);
        loop {
            if row == nrow && col == 0 {
                #[rustfmt::skip]
                let cells = [
                    (nrow - 1, 0), (nrow - 1, 1), (nrow - 1, 2), (0, ncol - 2),
                    (0, ncol - 1), (1, ncol - 1), (2, ncol - 1), (3, ncol - 1),
                ];
                self.corner(cells, chr);
                chr += 1;
            }
            if row == nrow - 2 && col == 0 && ncol % 4 != 0 {
                #[rustfmt::skip]
                let cells = [
                    (nrow - 3, 0), (nrow - 2, 0), (nrow - 1, 0), (0, ncol - 4),
                    (0, ncol - 3), (0, ncol - 2), (0, ncol - 1), (1, ncol - 1),
                ];
                self.corner(cells, chr);
                chr += 1;
            }
            if row == nrow - 2 && col == 0 && ncol % 8 == 4 {
                #[rustfmt::skip]
                let cells = [
                    (nrow - 3, 0), (nrow - 2, 0), (nrow - 1, 0), (0, ncol - 2),
                    (0, ncol - 1), (1, ncol - 1), (2, ncol - 1), (3, ncol - 1),
                ];
                self.corner(cells, chr);
                chr += 1;
            }
            if row == nrow + 4 && col == 2 && ncol % 8 == 0 {
                #[rustfmt::skip]
                let cells = [
                    (nrow - 1, 0), (nrow - 1, ncol - 1), (0, ncol - 3), (0, ncol - 2),
                    (0, ncol - 1), (1, ncol - 3), (1, ncol - 2), (1, ncol - 1),
                ];
                self.corner(cells, chr);
                chr += 1;
            }

            // up and to the right
            loop {
                if row < nrow && col >= 0 && !self.is_placed(row, col) {
                    self.utah(row, col, chr);
                    chr += 1;
                }
                row -= 2;
                col += 2;
                if !(row >= 0 && col < ncol) {
                    break;
                }
            }
            row += 1;
            col += 3;

            // down and to the left
            loop {
                if row >= 0 && col < ncol && !self.is_placed(row, col) {
                    self.utah(row, col, chr);
                    chr += 1;
                }
                row += 2;
                col -= 2;
                if !(row < nrow && col >= 0) {
                    break;
                }
            }
            row += 3;
            col += 1;

            if !(row < nrow || col < ncol) {
                break;
            }
        }

        // sizes with a spare 2x2 corner get a fixed pattern there
        if !self.is_placed(nrow - 1, ncol - 1) {
            self.grid.set((ncol - 1) as u32, (nrow - 1) as u32, true);
            self.grid.set((ncol - 2) as u32, (nrow - 2) as u32, true);
        }
        self.grid
    }
}

/// Lays out `codewords` (data followed by ecc) in an `nrow` x `ncol` mapping matrix.
pub fn place(nrow: u32, ncol: u32, codewords: &[u8]) -> ModuleGrid {
    Placement {
        nrow: nrow as i32,
        ncol: ncol as i32,
        codewords,
        grid: ModuleGrid::new(ncol, nrow),
        placed: vec![false; (nrow * ncol) as usize],
    }
    .run()
}
