/// Reed-Solomon error correction for the three 2D symbologies.
///
/// QR uses GF(256) with the polynomial 0x11D and generator roots starting at
/// alpha^0, which is exactly what the `reed-solomon` crate implements. DataMatrix
/// uses the polynomial 0x12D with roots starting at alpha^1, PDF417 works in the
/// prime field GF(929) with roots 3^1..3^k.
use lazy_static::lazy_static;
use reed_solomon::Encoder;

use crate::tables::SymbolCapacity;

/// Error correction codewords of one QR block.
pub fn qr_block_ecc(data: &[u8], ecc_len: usize) -> Vec<u8> {
    let encoder = Encoder::new(ecc_len);
    encoder.encode(data).ecc().to_vec()
}

/// Split the data codewords into blocks, compute each block's ecc and interleave
/// everything into the final codeword sequence.
pub fn qr_interleave(data: &[u8], capacity: &SymbolCapacity) -> Vec<u8> {
    let sizes = capacity.block_sizes();
    let ecc_len = capacity.ecc_per_block as usize;

    let mut blocks: Vec<&[u8]> = Vec::with_capacity(sizes.len());
    let mut rest = data;
    for size in &sizes {
        let (block, tail) = rest.split_at(std::cmp::min(*size, rest.len()));
        blocks.push(block);
        rest = tail;
    }
    let eccs: Vec<Vec<u8>> = blocks.iter().map(|b| qr_block_ecc(b, ecc_len)).collect();

    let longest = sizes.iter().copied().max().unwrap_or(0);
    let mut out = Vec::with_capacity(capacity.codewords as usize);
    for i in 0..longest {
        out.extend(blocks.iter().filter_map(|b| b.get(i)));
    }
    for i in 0..ecc_len {
        out.extend(eccs.iter().filter_map(|e| e.get(i)));
    }
    out
}

//-------------------------------------------------------------------
// GF(256) with a configurable reduction polynomial
//-------------------------------------------------------------------

pub struct Galois256 {
    exp: [u8; 512],
    log: [u8; 256],
}

impl Galois256 {
    fn new(poly: u32) -> Galois256 {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u32 = 1;
        for i in 0..255 {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= poly;
            }
        }
        for i in 255..512 {
            exp[i] = exp[i - 255];
        }
        Galois256 { exp, log }
    }

    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    /// Generator polynomial with `n` roots alpha^start.., highest power first.
    fn generator(&self, n: usize, start: usize) -> Vec<u8> {
        let mut g = vec![1u8];
        for i in 0..n {
            let root = self.exp[(i + start) % 255];
            let mut next = vec![0u8; g.len() + 1];
            for (j, &c) in g.iter().enumerate() {
                next[j] ^= c;
                next[j + 1] ^= self.mul(c, root);
            }
            g = next;
        }
        g
    }

    /// Remainder of the data polynomial divided by the generator.
    pub fn ecc(&self, data: &[u8], n: usize, start: usize) -> Vec<u8> {
        let g = self.generator(n, start);
        let mut rem = vec![0u8; n];
        for &d in data {
            let factor = d ^ rem[0];
            rem.rotate_left(1);
            rem[n - 1] = 0;
            for j in 0..n {
                rem[j] ^= self.mul(g[j + 1], factor);
            }
        }
        rem
    }
}

lazy_static! {
    static ref DATAMATRIX_FIELD: Galois256 = Galois256::new(0x12D);
}

/// Error correction codewords of one DataMatrix block.
pub fn datamatrix_block_ecc(data: &[u8], ecc_len: usize) -> Vec<u8> {
    DATAMATRIX_FIELD.ecc(data, ecc_len, 1)
}

/// DataMatrix interleaving: codeword i belongs to block i % blocks, for data and ecc alike.
pub fn datamatrix_ecc(data: &[u8], blocks: usize, ecc_per_block: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    out.resize(data.len() + blocks * ecc_per_block, 0);
    for b in 0..blocks {
        let block: Vec<u8> = data.iter().skip(b).step_by(blocks).copied().collect();
        let ecc = datamatrix_block_ecc(&block, ecc_per_block);
        for (k, e) in ecc.into_iter().enumerate() {
            out[data.len() + b + k * blocks] = e;
        }
    }
    out
}

//-------------------------------------------------------------------
// GF(929)
//-------------------------------------------------------------------

const PDF417_PRIME: u32 = 929;

/// Coefficients of prod (x - 3^j), j = 1..=k, lowest power first, leading 1 dropped.
fn pdf417_generator(k: usize) -> Vec<u32> {
    let mut p = vec![1u32];
    let mut root = 1u32;
    for _ in 0..k {
        root = root * 3 % PDF417_PRIME;
        let mut q = vec![0u32; p.len() + 1];
        for (i, &c) in p.iter().enumerate() {
            q[i] = (q[i] + PDF417_PRIME - root * c % PDF417_PRIME) % PDF417_PRIME;
            q[i + 1] = (q[i + 1] + c) % PDF417_PRIME;
        }
        p = q;
    }
    p.pop();
    p
}

/// Number of ecc codewords of a PDF417 error correction level.
pub fn pdf417_ecc_count(level: u8) -> usize {
    1 << (level as usize + 1)
}

/// Error correction codewords for the complete PDF417 data codeword sequence
/// (length descriptor included).
pub fn pdf417_ecc(data: &[u16], level: u8) -> Vec<u16> {
    let factors = pdf417_generator(pdf417_ecc_count(level));
    let n = factors.len();
    let mut ecc = vec![0u32; n];

    for &cw in data {
        let t = (cw as u32 + ecc[0]) % PDF417_PRIME;
        for i in (0..n).rev() {
            let factor = t * factors[i] % PDF417_PRIME;
            let d = if i > 0 { ecc[n - i] } else { 0 };
            ecc[n - 1 - i] = (d + PDF417_PRIME - factor) % PDF417_PRIME;
        }
    }

    ecc.into_iter()
        .map(|e| if e != 0 { (PDF417_PRIME - e) as u16 } else { 0 })
        .collect()
}
