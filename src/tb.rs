// SPDX-License-Identifier: (GPL-3.0-or-later OR UPL-1.0)

use bitboard::*;
use movegen::*;
use position::Position;
use position::zobrist::material;
use types::*;

use memmap::{Mmap, MmapOptions};
use std;
use std::fs;
use std::path::PathBuf;

const WDL_TO_MAP: [u32; 5] = [1, 3, 0, 2, 0];
const PA_FLAGS: [u8; 5] = [8, 0, 0, 0, 4];
const WDL_TO_DTZ: [i32; 5] = [-1, -101, 0, 101, 1];

const WDL_MAGIC: u32 = 0x5d23e871;
const DTZ_MAGIC: u32 = 0xa50c66d7;

const WDL_SUFFIX: &str = ".rtbw";
const DTZ_SUFFIX: &str = ".rtbz";

const TB_HASH_BITS: u32 = 12;
const HSH_MAX: usize = 8;

// A corrupted header can claim an absurd symbol count. Reject the file
// instead of allocating on its say-so.
const MAX_SYMS: usize = 4096;

// Number of DTZ tables kept mapped at any one time. DTZ files are much
// larger than WDL files, so they are mapped on demand and the least
// recently used mapping is dropped when the limit is reached.
const DTZ_ENTRIES: usize = 64;

// A read-only memory mapping of a single tablebase file.
struct MappedFile {
    map: Mmap,
}

impl MappedFile {
    fn new(file: &fs::File) -> Option<MappedFile> {
        match unsafe { MmapOptions::new().map(file) } {
            Ok(map) => Some(MappedFile { map: map }),
            Err(err) => {
                warn!("failed to map tablebase file: {}", err);
                None
            }
        }
    }

    fn bytes(&self) -> &[u8] {
        &self.map
    }

    fn size(&self) -> usize {
        self.map.len()
    }
}

fn read_u16(d: &[u8], p: usize) -> u16 {
    d[p] as u16 | (d[p + 1] as u16) << 8
}

fn read_u32(d: &[u8], p: usize) -> u32 {
    d[p] as u32
        | (d[p + 1] as u32) << 8
        | (d[p + 2] as u32) << 16
        | (d[p + 3] as u32) << 24
}

// Reads the bit-packed stream of a compressed block. The code word is
// kept big-endian-normalized in a 64-bit window and refilled in 32-bit
// chunks as bits are consumed. Reads past the end of the mapping are
// zero-padded; the decoder never consumes more bits than the block
// actually contains.
struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    code: u64,
    bit_cnt: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8], pos: usize) -> BitReader<'a> {
        let mut reader = BitReader {
            data: data,
            pos: pos,
            code: 0,
            bit_cnt: 0,
        };
        let hi = reader.refill32() as u64;
        let lo = reader.refill32() as u64;
        reader.code = hi << 32 | lo;
        reader
    }

    fn refill32(&mut self) -> u32 {
        let mut v = 0u32;
        for _ in 0..4 {
            v = v << 8 | *self.data.get(self.pos).unwrap_or(&0) as u32;
            self.pos += 1;
        }
        v
    }

    fn peek(&self) -> u64 {
        self.code
    }

    fn consume(&mut self, bits: usize) {
        self.code <<= bits;
        self.bit_cnt += bits;
        if self.bit_cnt >= 32 {
            self.bit_cnt -= 32;
            let w = self.refill32() as u64;
            self.code |= w << self.bit_cnt;
        }
    }
}

// Huffman decoder state for one sub-table. All table positions are byte
// offsets into the file mapping; only the symbol lengths and base codes
// are materialized.
struct PairsData {
    index_table: usize,
    size_table: usize,
    data: usize,
    offset: usize,
    sym_pat: usize,
    sym_len: Vec<u8>,
    base: Vec<u64>,
    block_size: u32,
    idx_bits: u32,
    min_len: u8,
    const_val: u16,
}

impl PairsData {
    fn new() -> PairsData {
        PairsData {
            index_table: 0,
            size_table: 0,
            data: 0,
            offset: 0,
            sym_pat: 0,
            sym_len: Vec::new(),
            base: Vec::new(),
            block_size: 0,
            idx_bits: 0,
            min_len: 0,
            const_val: 0,
        }
    }
}

struct EncInfo {
    pairs: PairsData,
    factor: [u32; 6],
    pieces: [u8; 6],
    norm: [u8; 6],
}

impl EncInfo {
    fn new() -> EncInfo {
        EncInfo {
            pairs: PairsData::new(),
            factor: [0; 6],
            pieces: [0; 6],
            norm: [0; 6],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Enc {
    Pieces,
    Files,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TableKind {
    Wdl,
    Dtz,
}

// The part of an entry the encoder needs to know about.
#[derive(Clone, Copy)]
struct Shape {
    num: u8,
    kk_enc: bool,
    pawns: [u8; 2],
    enc: Enc,
}

// One parsed tablebase file. Pawn tables have four sub-tables, one per
// canonicalized leading-pawn file; piece tables have one. Split WDL
// tables carry a decoder per side to move in ei[t][0] and ei[t][1].
struct Table {
    file: MappedFile,
    ei: Vec<[EncInfo; 2]>,
    flags: Vec<u8>,
    map_idx: Vec<[u16; 4]>,
    map: usize,
    split: bool,
}

enum TableSlot {
    Untried,
    Failed,
    Ready(Table),
}

struct PieceEntry {
    key: Key,
    num: u8,
    symmetric: bool,
    kk_enc: bool,
    has_dtz: bool,
    wdl: TableSlot,
    dtz: TableSlot,
}

struct PawnEntry {
    key: Key,
    num: u8,
    symmetric: bool,
    pawns: [u8; 2],
    has_dtz: bool,
    wdl: TableSlot,
    dtz: TableSlot,
}

enum TbEntry {
    Piece(PieceEntry),
    Pawn(PawnEntry),
}

impl TbEntry {
    fn key(&self) -> Key {
        match *self {
            TbEntry::Piece(ref e) => e.key,
            TbEntry::Pawn(ref e) => e.key,
        }
    }

    fn symmetric(&self) -> bool {
        match *self {
            TbEntry::Piece(ref e) => e.symmetric,
            TbEntry::Pawn(ref e) => e.symmetric,
        }
    }

    fn has_dtz(&self) -> bool {
        match *self {
            TbEntry::Piece(ref e) => e.has_dtz,
            TbEntry::Pawn(ref e) => e.has_dtz,
        }
    }

    fn shape(&self) -> Shape {
        match *self {
            TbEntry::Piece(ref e) => Shape {
                num: e.num,
                kk_enc: e.kk_enc,
                pawns: [0; 2],
                enc: Enc::Pieces,
            },
            TbEntry::Pawn(ref e) => Shape {
                num: e.num,
                kk_enc: false,
                pawns: e.pawns,
                enc: Enc::Files,
            },
        }
    }

    fn slot(&self, kind: TableKind) -> &TableSlot {
        match *self {
            TbEntry::Piece(ref e) => {
                if kind == TableKind::Wdl { &e.wdl } else { &e.dtz }
            }
            TbEntry::Pawn(ref e) => {
                if kind == TableKind::Wdl { &e.wdl } else { &e.dtz }
            }
        }
    }

    fn slot_mut(&mut self, kind: TableKind) -> &mut TableSlot {
        match *self {
            TbEntry::Piece(ref mut e) => {
                if kind == TableKind::Wdl { &mut e.wdl } else { &mut e.dtz }
            }
            TbEntry::Pawn(ref mut e) => {
                if kind == TableKind::Wdl { &mut e.wdl } else { &mut e.dtz }
            }
        }
    }
}

// Given a position with 6 or fewer pieces, produce a text string of the
// form KQPvKRP, where "KQP" represents the white pieces if flip == false
// and the black pieces if flip == true.
fn prt_str(pos: &Position, flip: bool) -> String {
    let mut c = if flip { BLACK } else { WHITE };

    let mut s = String::new();

    for pt in (1..7).rev() {
        for _ in 0..pos.count(c, PieceType(pt)) {
            s.push(Position::PIECE_TO_CHAR.chars().nth(pt as usize).unwrap());
        }
    }
    s.push('v');
    c = !c;
    for pt in (1..7).rev() {
        for _ in 0..pos.count(c, PieceType(pt)) {
            s.push(Position::PIECE_TO_CHAR.chars().nth(pt as usize).unwrap());
        }
    }

    s
}

fn calc_key_from_pcs(pcs: &[i32; 16], flip: bool) -> Key {
    let mut key = Key(0);

    for c in 0..2 {
        for pt in 1..7 {
            let pc = Piece::make(Color(c), PieceType(pt));
            for i in 0..pcs[pc.0 as usize] {
                key ^= material(pc ^ flip, i);
            }
        }
    }

    key
}

fn sep_char() -> char {
    if cfg!(target_os = "windows") { ';' } else { ':' }
}

fn test_tb(paths: &[PathBuf], name: &str, suffix: &str) -> bool {
    for dir in paths.iter() {
        if dir.join(format!("{}{}", name, suffix)).is_file() {
            return true;
        }
    }

    false
}

fn open_tb(paths: &[PathBuf], name: &str, suffix: &str) -> Option<fs::File> {
    for dir in paths.iter() {
        if let Ok(file) = fs::File::open(dir.join(format!("{}{}", name, suffix)))
        {
            return Some(file);
        }
    }

    None
}

// place k like pieces on n squares
fn subfactor(k: u32, n: u32) -> u32 {
    let mut f = n;
    let mut l = 1;
    for i in 1..k {
        f *= n - i;
        l *= i + 1;
    }

    f / l
}

// Binomial and leading-pawn index tables, computed once per Tablebases
// value instead of living in process globals.
struct Indices {
    binomial: [[u32; 64]; 6],
    pawn_idx: [[u32; 24]; 5],
    pfactor: [[u32; 4]; 5],
}

impl Indices {
    fn new() -> Indices {
        let mut binomial = [[0u32; 64]; 6];
        for i in 0..6 {
            for j in 0..64 {
                let mut f = 1i32;
                let mut l = 1i32;
                for k in 0..i {
                    f *= j as i32 - k as i32;
                    l *= k as i32 + 1;
                }
                binomial[i][j] = (f / l) as u32;
            }
        }

        let mut pawn_idx = [[0u32; 24]; 5];
        let mut pfactor = [[0u32; 4]; 5];
        for i in 0..5 {
            let mut s = 0u32;
            for j in 0..24 {
                pawn_idx[i][j] = s;
                let k = (1 + (j % 6)) * 8 + (j / 6);
                s += binomial[i][PTWIST[k] as usize];
                if (j + 1) % 6 == 0 {
                    pfactor[i][j / 6] = s;
                    s = 0;
                }
            }
        }

        Indices {
            binomial: binomial,
            pawn_idx: pawn_idx,
            pfactor: pfactor,
        }
    }

    fn binomial(&self, n: usize, k: usize) -> usize {
        self.binomial[k][n] as usize
    }
}

fn calc_factors(
    ind: &Indices, ei: &mut EncInfo, shape: Shape, order: u8, order2: u8,
    t: usize
) -> usize {
    let mut i = ei.norm[0];
    if order2 < 0x0f {
        i += ei.norm[i as usize];
    }
    let mut n = 64 - i;
    let mut f = 1usize;
    let mut k = 0;
    while i < shape.num || k == order || k == order2 {
        if k == order {
            ei.factor[0] = f as u32;
            f *= if shape.enc == Enc::Pieces {
                if shape.kk_enc { 462 } else { 31332 }
            } else {
                ind.pfactor[ei.norm[0] as usize - 1][t] as usize
            };
        } else if k == order2 {
            ei.factor[ei.norm[0] as usize] = f as u32;
            f *= subfactor(ei.norm[ei.norm[0] as usize] as u32,
                48 - ei.norm[0] as u32) as usize;
        } else {
            ei.factor[i as usize] = f as u32;
            f *= subfactor(ei.norm[i as usize] as u32, n as u32) as usize;
            n -= ei.norm[i as usize];
            i += ei.norm[i as usize];
        }
        k += 1;
    }

    f
}

fn set_norm(ei: &mut EncInfo, shape: Shape) {
    let mut i;
    if shape.enc == Enc::Pieces {
        ei.norm[0] = if shape.kk_enc { 2 } else { 3 };
        i = ei.norm[0] as usize;
    } else {
        ei.norm[0] = shape.pawns[0];
        if shape.pawns[1] > 0 {
            ei.norm[shape.pawns[0] as usize] = shape.pawns[1];
        }
        i = (shape.pawns[0] + shape.pawns[1]) as usize;
    }

    while i < shape.num as usize {
        for j in i..shape.num as usize {
            if ei.pieces[j] != ei.pieces[i] {
                break;
            }
            ei.norm[i] += 1;
        }
        i += ei.norm[i] as usize;
    }
}

fn setup_pieces(
    ind: &Indices, ei: &mut EncInfo, shape: Shape, bytes: &[u8], ptr: usize,
    s: u32, t: usize
) -> usize {
    let j = 1 + (shape.pawns[1] > 0) as usize;

    for i in 0..shape.num as usize {
        ei.pieces[i] = (bytes[ptr + i + j] >> s) & 0x0f;
    }
    let order = (bytes[ptr] >> s) & 0x0f;
    let order2 =
        if shape.pawns[1] > 0 { (bytes[ptr + 1] >> s) & 0x0f } else { 0x0f };

    set_norm(ei, shape);
    calc_factors(ind, ei, shape, order, order2, t)
}

fn s1(d: &[u8], w: usize) -> usize {
    d[w] as usize | (d[w + 1] as usize & 0x0f) << 8
}

fn s2(d: &[u8], w: usize) -> usize {
    (d[w + 2] as usize) << 4 | (d[w + 1] as usize) >> 4
}

fn calc_sym_len(
    sym_len: &mut Vec<u8>, bytes: &[u8], sym_pat: usize, s: usize,
    tmp: &mut Vec<u8>
) {
    if tmp[s] != 0 {
        return;
    }

    let w = sym_pat + 3 * s;
    let s2 = s2(bytes, w);
    if s2 == 0x0fff {
        sym_len[s] = 0;
    } else {
        let s1 = s1(bytes, w);
        calc_sym_len(sym_len, bytes, sym_pat, s1, tmp);
        calc_sym_len(sym_len, bytes, sym_pat, s2, tmp);
        sym_len[s] = sym_len[s1] + sym_len[s2] + 1;
    }
    tmp[s] = 1;
}

fn setup_pairs(
    bytes: &[u8], ptr: &mut usize, tb_size: usize, size: &mut [usize],
    flags_out: &mut u8, name: &str
) -> PairsData {
    let p = *ptr;
    let flags = bytes[p];
    *flags_out = flags;
    if flags & 0x80 != 0 {
        *ptr = p + 2;
        let mut pairs = PairsData::new();
        pairs.const_val = bytes[p + 1] as u16;
        return pairs;
    }

    let block_size = bytes[p + 1] as u32;
    let idx_bits = bytes[p + 2] as u32;
    let real_num_blocks = read_u32(bytes, p + 4);
    let num_blocks = real_num_blocks + bytes[p + 3] as u32;
    let max_len = bytes[p + 8];
    let min_len = bytes[p + 9];
    let h = (max_len - min_len + 1) as usize;
    let num_syms = read_u16(bytes, p + 10 + 2 * h) as usize;
    if num_syms > MAX_SYMS {
        panic!("corrupted table {}: {} symbols", name, num_syms);
    }
    let offset = p + 10;
    let sym_pat = p + 12 + 2 * h;

    let mut sym_len = vec![0u8; num_syms];
    let mut tmp = vec![0u8; num_syms];
    for s in 0..num_syms {
        calc_sym_len(&mut sym_len, bytes, sym_pat, s, &mut tmp);
    }

    let num_indices = (tb_size + (1usize << idx_bits) - 1) >> idx_bits;
    size[0] = num_indices;
    size[1] = num_blocks as usize;
    size[2] = (real_num_blocks as usize) << block_size;

    *ptr = p + 12 + 2 * h + 3 * num_syms + (num_syms & 1);

    let mut base = vec![0u64; h];
    for i in (0..h - 1).rev() {
        let b1 = read_u16(bytes, offset + 2 * i) as u64;
        let b2 = read_u16(bytes, offset + 2 * (i + 1)) as u64;
        base[i] = (base[i + 1] + b1 - b2) / 2;
    }
    for i in 0..h {
        base[i] <<= 64 - (min_len as usize + i);
    }

    PairsData {
        index_table: 0,
        size_table: 0,
        data: 0,
        offset: offset,
        sym_pat: sym_pat,
        sym_len: sym_len,
        base: base,
        block_size: block_size,
        idx_bits: idx_bits,
        min_len: min_len,
        const_val: 0,
    }
}

fn align_to(ptr: usize, align: usize) -> usize {
    (ptr + align - 1) & !(align - 1)
}

// Parse a complete WDL or DTZ file into a Table. The mapping is page
// aligned, so aligning file offsets aligns the backing memory as well.
fn load_table(
    paths: &[PathBuf], ind: &Indices, shape: Shape, name: &str,
    kind: TableKind
) -> Option<Table> {
    let (suffix, magic) = match kind {
        TableKind::Wdl => (WDL_SUFFIX, WDL_MAGIC),
        TableKind::Dtz => (DTZ_SUFFIX, DTZ_MAGIC),
    };

    let file = match open_tb(paths, name, suffix) {
        Some(file) => file,
        None => return None,
    };
    let map = match MappedFile::new(&file) {
        Some(map) => map,
        None => return None,
    };

    if map.size() < 5 || read_u32(map.bytes(), 0) != magic {
        error!("Corrupted table: {}{}", name, suffix);
        return None;
    }

    let num_sub = if shape.enc == Enc::Files { 4 } else { 1 };
    let mut ei: Vec<[EncInfo; 2]> =
        (0..num_sub).map(|_| [EncInfo::new(), EncInfo::new()]).collect();
    let mut flags_vec = vec![0u8; num_sub];
    let mut map_idx = vec![[0u16; 4]; num_sub];
    let mut map_off = 0usize;
    let split;

    {
        let bytes = map.bytes();
        split = kind == TableKind::Wdl && bytes[4] & 0x01 != 0;

        let mut ptr = 5usize;
        let mut tb_size = [[0usize; 2]; 4];
        for t in 0..num_sub {
            tb_size[t][0] =
                setup_pieces(ind, &mut ei[t][0], shape, bytes, ptr, 0, t);
            if split {
                tb_size[t][1] =
                    setup_pieces(ind, &mut ei[t][1], shape, bytes, ptr, 4, t);
            }
            ptr += shape.num as usize + 1 + (shape.pawns[1] > 0) as usize;
        }
        ptr = align_to(ptr, 2);

        let mut size = [[0usize; 6]; 4];
        let mut flags = 0;
        for t in 0..num_sub {
            ei[t][0].pairs = setup_pairs(bytes, &mut ptr, tb_size[t][0],
                &mut size[t][0..3], &mut flags, name);
            flags_vec[t] = flags;
            if split {
                ei[t][1].pairs = setup_pairs(bytes, &mut ptr, tb_size[t][1],
                    &mut size[t][3..6], &mut flags, name);
            }
        }

        if kind == TableKind::Dtz {
            map_off = ptr;
            let mut idx = 0u16;
            for t in 0..num_sub {
                if flags_vec[t] & 2 != 0 {
                    for i in 0..4 {
                        map_idx[t][i] = 1 + idx;
                        idx += 1 + bytes[map_off + idx as usize] as u16;
                    }
                }
            }
            ptr += idx as usize;
            ptr = align_to(ptr, 2);
        }

        for t in 0..num_sub {
            ei[t][0].pairs.index_table = ptr;
            ptr += 6 * size[t][0];
            if split {
                ei[t][1].pairs.index_table = ptr;
                ptr += 6 * size[t][3];
            }
        }

        for t in 0..num_sub {
            ei[t][0].pairs.size_table = ptr;
            ptr += 2 * size[t][1];
            if split {
                ei[t][1].pairs.size_table = ptr;
                ptr += 2 * size[t][4];
            }
        }

        for t in 0..num_sub {
            ptr = align_to(ptr, 64);
            ei[t][0].pairs.data = ptr;
            ptr += size[t][2];
            if split {
                ptr = align_to(ptr, 64);
                ei[t][1].pairs.data = ptr;
                ptr += size[t][5];
            }
        }
    }

    Some(Table {
        file: map,
        ei: ei,
        flags: flags_vec,
        map_idx: map_idx,
        map: map_off,
        split: split,
    })
}

fn fill_squares(
    pos: &Position, pc: &[u8; 6], num: usize, flip: bool, p: &mut [Square; 6]
) {
    let mut i = 0;
    loop {
        let piece = Piece(pc[i] as u32);
        let b = pos.pieces_cp(piece.color() ^ flip, piece.piece_type());
        for sq in b {
            p[i] = sq;
            i += 1;
        }
        if i == num {
            break;
        }
    }
}

// Translate a raw DTZ symbol to plies, using the map table when present.
fn dtz_map(table: &Table, t: usize, mut res: i32, wdl: i32) -> i32 {
    if table.flags[t] & 2 != 0 {
        let i = table.map_idx[t][WDL_TO_MAP[(wdl + 2) as usize] as usize];
        res = table.file.bytes()[table.map + i as usize + res as usize] as i32;
    }
    if table.flags[t] & PA_FLAGS[(wdl + 2) as usize] == 0 || wdl & 1 != 0 {
        res *= 2;
    }

    res
}

fn decompress_pairs(bytes: &[u8], d: &PairsData, idx: usize) -> i32 {
    if d.idx_bits == 0 {
        return d.const_val as i32;
    }

    let main_idx = idx >> d.idx_bits;
    let mut lit_idx = (idx as isize & ((1isize << d.idx_bits) - 1))
        - (1isize << (d.idx_bits - 1));
    let mut block = read_u32(bytes, d.index_table + 6 * main_idx) as usize;
    lit_idx += read_u16(bytes, d.index_table + 6 * main_idx + 4) as isize;

    while lit_idx < 0 {
        block -= 1;
        lit_idx += read_u16(bytes, d.size_table + 2 * block) as isize + 1;
    }
    while lit_idx > read_u16(bytes, d.size_table + 2 * block) as isize {
        lit_idx -= read_u16(bytes, d.size_table + 2 * block) as isize + 1;
        block += 1;
    }

    let mut reader =
        BitReader::new(bytes, d.data + (block << d.block_size));
    let mut sym;
    loop {
        let mut l = 0;
        while reader.peek() < d.base[l] {
            l += 1;
        }
        sym = read_u16(bytes, d.offset + 2 * l) as usize;
        let l2 = l + d.min_len as usize;
        sym += ((reader.peek() - d.base[l]) >> (64 - l2)) as usize;
        if lit_idx < d.sym_len[sym] as isize + 1 {
            break;
        }
        lit_idx -= d.sym_len[sym] as isize + 1;
        reader.consume(l2);
    }

    while d.sym_len[sym] != 0 {
        let w = d.sym_pat + 3 * sym;
        let left = s1(bytes, w);
        if lit_idx < d.sym_len[left] as isize + 1 {
            sym = left;
        } else {
            lit_idx -= d.sym_len[left] as isize + 1;
            sym = s2(bytes, w);
        }
    }

    s1(bytes, d.sym_pat + 3 * sym) as i32
}

// Add underpromotion captures to list of captures.
fn add_underprom_caps(
    pos: &Position, list: &mut [ExtMove], end: usize
) -> usize {
    let mut extra = end;

    for idx in 0..end {
        let m = list[idx].m;
        if m.move_type() == PROMOTION && pos.piece_on(m.to()) != NO_PIECE {
            list[extra    ].m = Move(m.0 - (1 << 12));
            list[extra + 1].m = Move(m.0 - (2 << 12));
            list[extra + 2].m = Move(m.0 - (3 << 12));
            extra += 3;
        }
    }

    extra
}

// All loaded tablebases. The engine owns a single value of this type;
// probing takes &mut self because tables are parsed lazily on first use
// and DTZ mappings rotate through a small LRU.
pub struct Tablebases {
    paths: Vec<PathBuf>,
    entries: Vec<TbEntry>,
    hash: Vec<[Option<(Key, usize)>; HSH_MAX]>,
    dtz_lru: Vec<usize>,
    ind: Indices,
    num_wdl: u32,
    num_dtz: u32,
    max_cardinality: u32,
}

impl Tablebases {
    pub fn new() -> Tablebases {
        Tablebases {
            paths: Vec::new(),
            entries: Vec::new(),
            hash: vec![[None; HSH_MAX]; 1 << TB_HASH_BITS],
            dtz_lru: Vec::new(),
            ind: Indices::new(),
            num_wdl: 0,
            num_dtz: 0,
            max_cardinality: 0,
        }
    }

    // init() scans the given directory list for all material combinations
    // the probing code knows about and registers those whose WDL file is
    // present. Reinitialization drops every mapping first and starts over.
    pub fn init(&mut self, path: &str) {
        const P: [char; 5] = ['Q', 'R', 'B', 'N', 'P'];

        self.entries.clear();
        for bucket in self.hash.iter_mut() {
            *bucket = [None; HSH_MAX];
        }
        self.dtz_lru.clear();
        self.paths.clear();
        self.num_wdl = 0;
        self.num_dtz = 0;
        self.max_cardinality = 0;

        if path == "" || path == "<empty>" {
            return;
        }

        self.paths = path.split(sep_char()).map(PathBuf::from).collect();

        // Restrict to 5-piece tables on platforms with a 32-bit address
        // space.
        let max5 = std::mem::size_of::<usize>() < 8;

        for i in 0..5 {
            self.add_material(&format!("K{}vK", P[i]));
        }

        for i in 0..5 {
            for j in i..5 {
                self.add_material(&format!("K{}vK{}", P[i], P[j]));
            }
        }

        for i in 0..5 {
            for j in i..5 {
                self.add_material(&format!("K{}{}vK", P[i], P[j]));
            }
        }

        for i in 0..5 {
            for j in i..5 {
                for k in 0..5 {
                    self.add_material(&format!("K{}{}vK{}", P[i], P[j], P[k]));
                }
            }
        }

        for i in 0..5 {
            for j in i..5 {
                for k in j..5 {
                    self.add_material(&format!("K{}{}{}vK", P[i], P[j], P[k]));
                }
            }
        }

        if !max5 {

            for i in 0..5 {
                for j in i..5 {
                    for k in i..5 {
                        for l in (if i == k { j } else { k })..5 {
                            self.add_material(&format!("K{}{}vK{}{}",
                                P[i], P[j], P[k], P[l]));
                        }
                    }
                }
            }

            for i in 0..5 {
                for j in i..5 {
                    for k in j..5 {
                        for l in 0..5 {
                            self.add_material(&format!("K{}{}{}vK{}",
                                P[i], P[j], P[k], P[l]));
                        }
                    }
                }
            }

            for i in 0..5 {
                for j in i..5 {
                    for k in j..5 {
                        for l in k..5 {
                            self.add_material(&format!("K{}{}{}{}vK",
                                P[i], P[j], P[k], P[l]));
                        }
                    }
                }
            }

        }

        info!("Found {} WDL and {} DTZ tablebase files.",
            self.num_wdl, self.num_dtz);
    }

    pub fn max_cardinality(&self) -> u32 {
        self.max_cardinality
    }

    fn add_material(&mut self, name: &str) {
        if !test_tb(&self.paths, name, WDL_SUFFIX) {
            return;
        }

        let has_dtz = test_tb(&self.paths, name, DTZ_SUFFIX);

        let mut pcs = [0; 16];
        let mut color = 0;
        for c in name.chars() {
            match c {
                'P' => pcs[PAWN.0 as usize   | color] += 1,
                'N' => pcs[KNIGHT.0 as usize | color] += 1,
                'B' => pcs[BISHOP.0 as usize | color] += 1,
                'R' => pcs[ROOK.0 as usize   | color] += 1,
                'Q' => pcs[QUEEN.0 as usize  | color] += 1,
                'K' => pcs[KING.0 as usize   | color] += 1,
                'v' => color = 8,
                _ => {}
            }
        }

        let key = calc_key_from_pcs(&pcs, false);
        let key2 = calc_key_from_pcs(&pcs, true);
        let symmetric = key == key2;

        let num = pcs.iter().sum::<i32>() as u32;
        if num > self.max_cardinality {
            self.max_cardinality = num;
        }

        let entry = if pcs[W_PAWN.0 as usize] + pcs[B_PAWN.0 as usize] == 0 {
            TbEntry::Piece(PieceEntry {
                key: key,
                num: num as u8,
                symmetric: symmetric,
                kk_enc: pcs.iter().filter(|&n| *n == 1).count() == 2,
                has_dtz: has_dtz,
                wdl: TableSlot::Untried,
                dtz: TableSlot::Untried,
            })
        } else {
            // By convention side 0 is the side with the fewer pawns, or
            // with pawns at all if the other side has none.
            let mut p0 = pcs[W_PAWN.0 as usize];
            let mut p1 = pcs[B_PAWN.0 as usize];
            if p1 > 0 && (p0 == 0 || p0 > p1) {
                std::mem::swap(&mut p0, &mut p1);
            }
            TbEntry::Pawn(PawnEntry {
                key: key,
                num: num as u8,
                symmetric: symmetric,
                pawns: [p0 as u8, p1 as u8],
                has_dtz: has_dtz,
                wdl: TableSlot::Untried,
                dtz: TableSlot::Untried,
            })
        };

        self.entries.push(entry);
        let idx = self.entries.len() - 1;
        self.hash_insert(key, idx);
        if key != key2 {
            self.hash_insert(key2, idx);
        }

        self.num_wdl += 1;
        self.num_dtz += has_dtz as u32;
    }

    fn hash_insert(&mut self, key: Key, idx: usize) {
        let bucket = (key.0 >> (64 - TB_HASH_BITS)) as usize;
        for slot in self.hash[bucket].iter_mut() {
            if slot.is_none() {
                *slot = Some((key, idx));
                return;
            }
        }

        panic!("tablebase hash bucket overflow");
    }

    fn find_entry(&self, key: Key) -> Option<usize> {
        let bucket = (key.0 >> (64 - TB_HASH_BITS)) as usize;
        for slot in self.hash[bucket].iter() {
            if let Some((k, idx)) = *slot {
                if k == key {
                    return Some(idx);
                }
            }
        }

        None
    }

    fn touch_dtz(&mut self, idx: usize) {
        self.dtz_lru.retain(|&i| i != idx);
        self.dtz_lru.insert(0, idx);
    }

    fn ensure_table(
        &mut self, idx: usize, kind: TableKind, name: &str
    ) -> bool {
        match *self.entries[idx].slot(kind) {
            TableSlot::Ready(_) => {
                if kind == TableKind::Dtz {
                    self.touch_dtz(idx);
                }
                return true;
            }
            TableSlot::Failed => return false,
            TableSlot::Untried => {}
        }

        let shape = self.entries[idx].shape();
        match load_table(&self.paths, &self.ind, shape, name, kind) {
            Some(table) => {
                *self.entries[idx].slot_mut(kind) = TableSlot::Ready(table);
                if kind == TableKind::Dtz {
                    self.touch_dtz(idx);
                    if self.dtz_lru.len() > DTZ_ENTRIES {
                        if let Some(old) = self.dtz_lru.pop() {
                            // Dropping the table unmaps the file; the
                            // entry can be remapped on a later probe.
                            *self.entries[old].slot_mut(TableKind::Dtz) =
                                TableSlot::Untried;
                        }
                    }
                }
                true
            }
            None => {
                *self.entries[idx].slot_mut(kind) = TableSlot::Failed;
                false
            }
        }
    }

    fn probe_table(
        &mut self, pos: &Position, kind: TableKind, wdl: i32,
        success: &mut i32
    ) -> i32 {
        // Obtain the position's material signature key
        let key = pos.material_key();

        // Test for KvK
        if kind == TableKind::Wdl && pos.pieces() == pos.pieces_p(KING) {
            return 0;
        }

        let idx = match self.find_entry(key) {
            Some(idx) => idx,
            None => {
                *success = 0;
                return 0;
            }
        };

        if kind == TableKind::Dtz && !self.entries[idx].has_dtz() {
            *success = 0;
            return 0;
        }

        let name = prt_str(pos, self.entries[idx].key() != key);
        if !self.ensure_table(idx, kind, &name) {
            *success = 0;
            return 0;
        }

        let e = &self.entries[idx];
        let shape = e.shape();
        let table = match *e.slot(kind) {
            TableSlot::Ready(ref table) => table,
            _ => {
                *success = 0;
                return 0;
            }
        };

        let flip = if !e.symmetric() {
            key != e.key()
        } else {
            pos.side_to_move() != WHITE
        };
        let bside = (!e.symmetric()
            && ((key != e.key()) == (pos.side_to_move() == WHITE))) as usize;

        let t = if shape.enc == Enc::Files {
            let color = Piece(table.ei[0][0].pieces[0] as u32).color();
            let b = pos.pieces_cp(color ^ flip, PAWN);
            leading_pawn_file(b) as usize
        } else {
            0
        };

        // A DTZ table stores one side only. If the side to move is the
        // other one, the caller must flip the position and probe again.
        if kind == TableKind::Dtz && !e.symmetric()
            && (table.flags[t] & 1) as usize != bside
        {
            *success = -1;
            return 0;
        }

        let side = if table.split { bside } else { 0 };
        let ei = &table.ei[t][side];

        let mut p: [Square; 6] = [Square(0); 6];
        fill_squares(pos, &ei.pieces, shape.num as usize, flip, &mut p);
        if shape.enc == Enc::Files && flip {
            for i in 0..shape.num as usize {
                p[i] = !p[i];
            }
        }

        let idx64 = encode(&mut p, ei, shape, &self.ind);
        let res = decompress_pairs(table.file.bytes(), &ei.pairs, idx64);

        match kind {
            TableKind::Wdl => res - 2,
            TableKind::Dtz => dtz_map(table, t, res, wdl),
        }
    }

    fn probe_ab(
        &mut self, pos: &mut Position, mut alpha: i32, beta: i32,
        success: &mut i32
    ) -> i32 {
        assert!(pos.ep_square() == Square::NONE);

        let mut list: [ExtMove; 64] =
            [ExtMove { m: Move::NONE, value: 0 }; 64];

        let end = if pos.checkers() == 0 {
            let end = generate_captures(pos, &mut list, 0);
            add_underprom_caps(pos, &mut list, end)
        } else {
            generate_evasions(pos, &mut list, 0)
        };

        for &m in list[0..end].iter() {
            if !pos.capture(m.m) || !pos.legal(m.m) {
                continue;
            }
            let gives_check = pos.gives_check(m.m);
            pos.do_move(m.m, gives_check);
            let v = -self.probe_ab(pos, -beta, -alpha, success);
            pos.undo_move(m.m);
            if *success == 0 {
                return 0;
            }
            if v > alpha {
                if v >= beta {
                    return v;
                }
                alpha = v;
            }
        }

        let v = self.probe_table(pos, TableKind::Wdl, 0, success);

        if alpha >= v { alpha } else { v }
    }

    // Probe the WDL table for a particular position.
    //
    // If *success != 0, the probe was successful.
    //
    // If *success == 2, the position has a winning capture, or the
    // position is a cursed win and has a cursed winning capture, or the
    // position has an ep capture as only best move.
    // This information is used in probe_dtz().
    //
    // The return value is from the point of view of the side to move.
    // -2 : loss
    // -1 : loss, but draw under the 50-move rule
    //  0 : draw
    //  1 : win, but draw under the 50-move rule
    //  2 : win
    pub fn probe_wdl(
        &mut self, pos: &mut Position, success: &mut i32
    ) -> i32 {
        // Generate (at least) all legal en-passant captures
        let mut list: [ExtMove; 64] =
            [ExtMove { m: Move::NONE, value: 0 }; 64];

        let mut end = if pos.checkers() == 0 {
            let end = generate_captures(pos, &mut list, 0);
            add_underprom_caps(pos, &mut list, end)
        } else {
            generate_evasions(pos, &mut list, 0)
        };

        let mut best_cap = -3;
        let mut best_ep = -3;

        for &m in list[0..end].iter() {
            if !pos.capture(m.m) || !pos.legal(m.m) {
                continue;
            }
            let gives_check = pos.gives_check(m.m);
            pos.do_move(m.m, gives_check);
            let v = -self.probe_ab(pos, -2, -best_cap, success);
            pos.undo_move(m.m);
            if *success == 0 {
                return 0;
            }
            if v > best_cap {
                if v == 2 {
                    *success = 2;
                    return 2;
                }
                if m.m.move_type() != ENPASSANT {
                    best_cap = v;
                } else if v > best_ep {
                    best_ep = v;
                }
            }
        }

        let v = self.probe_table(pos, TableKind::Wdl, 0, success);
        if *success == 0 {
            return 0;
        }

        // Now max(v, best_cap) is the WDL value of the position without
        // ep rights. If the position without ep rights is not stalemate
        // or no ep captures exist, then the value of the position is
        // max(v, best_cap, best_ep). If the position without ep rights
        // is stalemate and best_ep > -3, then the value of the position
        // is best_ep (and we will have v == 0).

        if best_ep > best_cap {
            if best_ep > v {
                // ep capture (possibly cursed losing) is best
                *success = 2;
                return best_ep;
            }
            best_cap = best_ep;
        }

        // Now max(v, best_cap) is the WDL value of the position, unless
        // the position without ep rights is stalemate and best_ep > -3.

        if best_cap >= v {
            // No need to test for the stalemate case here: either there
            // are non-ep captures, or best_cap == best_ep >= v anyway.
            *success = 1 + (best_cap > 0) as i32;
            return best_cap;
        }

        // Now handle the stalemate case.
        if best_ep > -3 && v == 0 {
            // Check for stalemate in the position without ep captures.
            for &m in list[0..end].iter() {
                if m.m.move_type() != ENPASSANT && pos.legal(m.m) {
                    return v;
                }
            }
            if pos.checkers() == 0 {
                end = generate_quiets(pos, &mut list, 0);
                for &m in list[0..end].iter() {
                    if m.m.move_type() != ENPASSANT && pos.legal(m.m) {
                        return v;
                    }
                }
            }
            *success = 2;
            return best_ep;
        }

        v
    }

    // Probe the DTZ table for a particular position.
    // If *success != 0, the probe was successful.
    // The return value is from the point of view of the side to move:
    //         n < -100 : loss, but draw under 50-move rule
    // -100 <= n < -1   : loss in n ply (assuming 50-move counter == 0)
    //         0        : draw
    //     1 < n <= 100 : win in n ply (assuming 50-move counter == 0)
    //   100 < n        : win, but draw under 50-move rule
    //
    // If the position is mate, -1 is returned instead of 0.
    //
    // The return value n can be off by 1: a return value -n can mean a
    // loss in n+1 ply and a return value +n can mean a win in n+1 ply.
    // This cannot happen for tables with positions exactly on the "edge"
    // of the 50-move rule.
    //
    // This means that if dtz > 0 is returned, the position is certainly
    // a win if dtz + 50-move-counter <= 99. Care must be taken that the
    // engine picks moves that preserve dtz + 50-move-counter <= 99.
    //
    // If n = 100 immediately after a capture or pawn move, then the
    // position is also certainly a win, and during the whole phase until
    // the next capture or pawn move, the inequality to be preserved is
    // dtz + 50-move-counter <= 100.
    //
    // In short, if a move is available resulting in
    // dtz + 50-move-counter <= 99, then do not accept moves leading to
    // dtz + 50-move-counter == 100.
    pub fn probe_dtz(
        &mut self, pos: &mut Position, success: &mut i32
    ) -> i32 {
        let wdl = self.probe_wdl(pos, success);
        if *success == 0 {
            return 0;
        }

        // If draw, then dtz = 0
        if wdl == 0 {
            return 0;
        }

        // Check for winning capture or en-passant capture as only best
        // move
        if *success == 2 {
            return WDL_TO_DTZ[(wdl + 2) as usize];
        }

        let mut list: [ExtMove; 256] =
            [ExtMove { m: Move::NONE, value: 0 }; 256];
        let mut end = 0;

        // If winning, check for a winning pawn move.
        if wdl > 0 {
            end = if pos.checkers() == 0 {
                generate_non_evasions(pos, &mut list, 0)
            } else {
                generate_evasions(pos, &mut list, 0)
            };

            for &m in list[0..end].iter() {
                if pos.moved_piece(m.m).piece_type() != PAWN
                    || pos.capture(m.m)
                    || !pos.legal(m.m)
                {
                    continue;
                }
                let gives_check = pos.gives_check(m.m);
                pos.do_move(m.m, gives_check);
                let v = -self.probe_wdl(pos, success);
                pos.undo_move(m.m);
                if *success == 0 {
                    return 0;
                }
                if v == wdl {
                    return WDL_TO_DTZ[(wdl + 2) as usize];
                }
            }
        }

        // If we are here, we know that the best move is not an ep
        // capture. In other words, the value of wdl corresponds to the
        // WDL value of the position without ep rights. It is therefore
        // safe to probe the DTZ table with the current value of wdl.

        let dtz = self.probe_table(pos, TableKind::Dtz, wdl, success);
        if *success >= 0 {
            return WDL_TO_DTZ[(wdl + 2) as usize]
                + if wdl > 0 { dtz } else { -dtz };
        }

        // *success < 0 means we need to probe DTZ for the other side to
        // move.
        let mut best;
        if wdl > 0 {
            best = std::i32::MAX;
            // If wdl > 0, we have already generated all moves
        } else {
            // If (cursed) loss, the worst case is a losing capture or
            // pawn move as the "best" move, leading to dtz of -1 or -101.
            // In case of mate, this will cause -1 to be returned.
            best = WDL_TO_DTZ[(wdl + 2) as usize];
            // If wdl < 0, we still have to generate all moves
            end = if pos.checkers() == 0 {
                generate_non_evasions(pos, &mut list, 0)
            } else {
                generate_evasions(pos, &mut list, 0)
            };
        }

        for &m in list[..end].iter() {
            // We can skip pawn moves and captures. If wdl > 0, we
            // already caught them. If wdl < 0, the initial value of best
            // already takes account of them.
            if pos.capture(m.m)
                || pos.moved_piece(m.m).piece_type() == PAWN
                || !pos.legal(m.m)
            {
                continue;
            }
            let gives_check = pos.gives_check(m.m);
            pos.do_move(m.m, gives_check);
            let v = -self.probe_dtz(pos, success);
            pos.undo_move(m.m);
            if *success == 0 {
                return 0;
            }
            if wdl > 0 {
                if v > 0 && v + 1 < best {
                    best = v + 1;
                }
            } else {
                if v - 1 < best {
                    best = v - 1;
                }
            }
        }

        best
    }
}

const OFF_DIAG: [i8; 64] = [
    0, -1, -1, -1, -1, -1, -1, -1,
    1,  0, -1, -1, -1, -1, -1, -1,
    1,  1,  0, -1, -1, -1, -1, -1,
    1,  1,  1,  0, -1, -1, -1, -1,
    1,  1,  1,  1,  0, -1, -1, -1,
    1,  1,  1,  1,  1,  0, -1, -1,
    1,  1,  1,  1,  1,  1,  0, -1,
    1,  1,  1,  1,  1,  1,  1,  0,
];

const TRIANGLE: [u8; 64] = [
    6, 0, 1, 2, 2, 1, 0, 6,
    0, 7, 3, 4, 4, 3, 7, 0,
    1, 3, 8, 5, 5, 8, 3, 1,
    2, 4, 5, 9, 9, 5, 4, 2,
    2, 4, 5, 9, 9, 5, 4, 2,
    1, 3, 8, 5, 5, 8, 3, 1,
    0, 7, 3, 4, 4, 3, 7, 0,
    6, 0, 1, 2, 2, 1, 0, 6,
];

const FLIP_DIAG: [u8; 64] = [
    0,  8, 16, 24, 32, 40, 48, 56,
    1,  9, 17, 25, 33, 41, 49, 57,
    2, 10, 18, 26, 34, 42, 50, 58,
    3, 11, 19, 27, 35, 43, 51, 59,
    4, 12, 20, 28, 36, 44, 52, 60,
    5, 13, 21, 29, 37, 45, 53, 61,
    6, 14, 22, 30, 38, 46, 54, 62,
    7, 15, 23, 31, 39, 47, 55, 63,
];

const LOWER: [u8; 64] = [
    28,  0,  1,  2,  3,  4,  5,  6,
     0, 29,  7,  8,  9, 10, 11, 12,
     1,  7, 30, 13, 14, 15, 16, 17,
     2,  8, 13, 31, 18, 19, 20, 21,
     3,  9, 14, 18, 32, 22, 23, 24,
     4, 10, 15, 19, 22, 33, 25, 26,
     5, 11, 16, 20, 23, 25, 34, 27,
     6, 12, 17, 21, 24, 26, 27, 35,
];

const DIAG: [u8; 64] = [
     0,  0,  0,  0,  0,  0,  0,  8,
     0,  1,  0,  0,  0,  0,  9,  0,
     0,  0,  2,  0,  0, 10,  0,  0,
     0,  0,  0,  3, 11,  0,  0,  0,
     0,  0,  0, 12,  4,  0,  0,  0,
     0,  0, 13,  0,  0,  5,  0,  0,
     0, 14,  0,  0,  0,  0,  6,  0,
    15,  0,  0,  0,  0,  0,  0,  7,
];

const FLAP: [u8; 64] = [
    0,  0,  0,  0,  0,  0,  0, 0,
    0,  6, 12, 18, 18, 12,  6, 0,
    1,  7, 13, 19, 19, 13,  7, 1,
    2,  8, 14, 20, 20, 14,  8, 2,
    3,  9, 15, 21, 21, 15,  9, 3,
    4, 10, 16, 22, 22, 16, 10, 4,
    5, 11, 17, 23, 23, 17, 11, 5,
    0,  0,  0,  0,  0,  0,  0, 0,
];

const PTWIST: [u8; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    47, 35, 23, 11, 10, 22, 34, 46,
    45, 33, 21,  9,  8, 20, 32, 44,
    43, 31, 19,  7,  6, 18, 30, 42,
    41, 29, 17,  5,  4, 16, 28, 40,
    39, 27, 15,  3,  2, 14, 26, 38,
    37, 25, 13,  1,  0, 12, 24, 36,
     0,  0,  0,  0,  0,  0,  0,  0
];

const KK_IDX: [[u16; 64]; 10] = [
    [   0,   0,   0,   0,   1,   2,   3,   4,
        0,   0,   0,   5,   6,   7,   8,   9,
       10,  11,  12,  13,  14,  15,  16,  17,
       18,  19,  20,  21,  22,  23,  24,  25,
       26,  27,  28,  29,  30,  31,  32,  33,
       34,  35,  36,  37,  38,  39,  40,  41,
       42,  43,  44,  45,  46,  47,  48,  49,
       50,  51,  52,  53,  54,  55,  56,  57, ],
    [  58,   0,   0,   0,  59,  60,  61,  62,
       63,   0,   0,   0,  64,  65,  66,  67,
       68,  69,  70,  71,  72,  73,  74,  75,
       76,  77,  78,  79,  80,  81,  82,  83,
       84,  85,  86,  87,  88,  89,  90,  91,
       92,  93,  94,  95,  96,  97,  98,  99,
      100, 101, 102, 103, 104, 105, 106, 107,
      108, 109, 110, 111, 112, 113, 114, 115 ],
    [ 116, 117,   0,   0,   0, 118, 119, 120,
      121, 122,   0,   0,   0, 123, 124, 125,
      126, 127, 128, 129, 130, 131, 132, 133,
      134, 135, 136, 137, 138, 139, 140, 141,
      142, 143, 144, 145, 146, 147, 148, 149,
      150, 151, 152, 153, 154, 155, 156, 157,
      158, 159, 160, 161, 162, 163, 164, 165,
      166, 167, 168, 169, 170, 171, 172, 173 ],
    [ 174,   0,   0,   0, 175, 176, 177, 178,
      179,   0,   0,   0, 180, 181, 182, 183,
      184,   0,   0,   0, 185, 186, 187, 188,
      189, 190, 191, 192, 193, 194, 195, 196,
      197, 198, 199, 200, 201, 202, 203, 204,
      205, 206, 207, 208, 209, 210, 211, 212,
      213, 214, 215, 216, 217, 218, 219, 220,
      221, 222, 223, 224, 225, 226, 227, 228 ],
    [ 229, 230,   0,   0,   0, 231, 232, 233,
      234, 235,   0,   0,   0, 236, 237, 238,
      239, 240,   0,   0,   0, 241, 242, 243,
      244, 245, 246, 247, 248, 249, 250, 251,
      252, 253, 254, 255, 256, 257, 258, 259,
      260, 261, 262, 263, 264, 265, 266, 267,
      268, 269, 270, 271, 272, 273, 274, 275,
      276, 277, 278, 279, 280, 281, 282, 283 ],
    [ 284, 285, 286, 287, 288, 289, 290, 291,
      292, 293,   0,   0,   0, 294, 295, 296,
      297, 298,   0,   0,   0, 299, 300, 301,
      302, 303,   0,   0,   0, 304, 305, 306,
      307, 308, 309, 310, 311, 312, 313, 314,
      315, 316, 317, 318, 319, 320, 321, 322,
      323, 324, 325, 326, 327, 328, 329, 330,
      331, 332, 333, 334, 335, 336, 337, 338 ],
    [   0,   0, 339, 340, 341, 342, 343, 344,
        0,   0, 345, 346, 347, 348, 349, 350,
        0,   0, 441, 351, 352, 353, 354, 355,
        0,   0,   0, 442, 356, 357, 358, 359,
        0,   0,   0,   0, 443, 360, 361, 362,
        0,   0,   0,   0,   0, 444, 363, 364,
        0,   0,   0,   0,   0,   0, 445, 365,
        0,   0,   0,   0,   0,   0,   0, 446 ],
    [   0,   0,   0, 366, 367, 368, 369, 370,
        0,   0,   0, 371, 372, 373, 374, 375,
        0,   0,   0, 376, 377, 378, 379, 380,
        0,   0,   0, 447, 381, 382, 383, 384,
        0,   0,   0,   0, 448, 385, 386, 387,
        0,   0,   0,   0,   0, 449, 388, 389,
        0,   0,   0,   0,   0,   0, 450, 390,
        0,   0,   0,   0,   0,   0,   0, 451 ],
    [ 452, 391, 392, 393, 394, 395, 396, 397,
        0,   0,   0,   0, 398, 399, 400, 401,
        0,   0,   0,   0, 402, 403, 404, 405,
        0,   0,   0,   0, 406, 407, 408, 409,
        0,   0,   0,   0, 453, 410, 411, 412,
        0,   0,   0,   0,   0, 454, 413, 414,
        0,   0,   0,   0,   0,   0, 455, 415,
        0,   0,   0,   0,   0,   0,   0, 456 ],
    [ 457, 416, 417, 418, 419, 420, 421, 422,
        0, 458, 423, 424, 425, 426, 427, 428,
        0,   0,   0,   0,   0, 429, 430, 431,
        0,   0,   0,   0,   0, 432, 433, 434,
        0,   0,   0,   0,   0, 435, 436, 437,
        0,   0,   0,   0,   0, 459, 438, 439,
        0,   0,   0,   0,   0,   0, 460, 440,
        0,   0,   0,   0,   0,   0,   0, 461 ],
];

fn off_diag(s: Square) -> i8 {
    OFF_DIAG[s.0 as usize]
}

fn is_off_diag(s: Square) -> bool {
    off_diag(s) != 0
}

fn triangle(s: Square) -> usize {
    TRIANGLE[s.0 as usize] as usize
}

fn flip_diag(s: Square) -> Square {
    Square(FLIP_DIAG[s.0 as usize] as u32)
}

fn lower(s: Square) -> usize {
    LOWER[s.0 as usize] as usize
}

fn diag(s: Square) -> usize {
    DIAG[s.0 as usize] as usize
}

fn skip(s1: Square, s2: Square) -> usize {
    (s1.0 > s2.0) as usize
}

fn flap(s: Square) -> usize {
    FLAP[s.0 as usize] as usize
}

fn ptwist(s: Square) -> usize {
    PTWIST[s.0 as usize] as usize
}

fn kk_idx(s1: usize, s2: Square) -> usize {
    KK_IDX[s1][s2.0 as usize] as usize
}

// Canonicalize the leading pawn's file into {A, B, C, D} to pick the
// pawn-table sub-table.
fn leading_pawn_file(pawns: Bitboard) -> u32 {
    if pawns & (FILEA_BB | FILEB_BB | FILEG_BB | FILEH_BB) != 0 {
        if pawns & (FILEA_BB | FILEH_BB) != 0 { FILE_A } else { FILE_B }
    } else {
        if pawns & (FILEC_BB | FILEF_BB) != 0 { FILE_C } else { FILE_D }
    }
}

fn encode(
    p: &mut [Square; 6], ei: &EncInfo, shape: Shape, ind: &Indices
) -> usize {
    let n = shape.num as usize;

    // normalize
    if p[0].0 & 4 != 0 {
        for i in 0..n {
            p[i] = Square(p[i].0 ^ 0x07);
        }
    }

    let mut i;
    let mut idx;
    if shape.enc == Enc::Pieces {
        if p[0].0 & 0x20 != 0 {
            for i in 0..n {
                p[i] = Square(p[i].0 ^ 0x38);
            }
        }

        for i in 0..n {
            if is_off_diag(p[i]) {
                if off_diag(p[i]) > 0
                    && i < (if shape.kk_enc { 2 } else { 3 })
                {
                    for j in i..n {
                        p[j] = flip_diag(p[j]);
                    }
                }
                break;
            }
        }

        idx = if shape.kk_enc {
            i = 2;
            kk_idx(triangle(p[0]), p[1])
        } else {
            i = 3;
            let s1 = skip(p[1], p[0]);
            let s2 = skip(p[2], p[0]) + skip(p[2], p[1]);
            if is_off_diag(p[0]) {
                triangle(p[0]) * 63*62 + (p[1].0 as usize - s1) * 62
                + (p[2].0 as usize - s2)
            } else if is_off_diag(p[1]) {
                6*63*62 + diag(p[0]) * 28*62 + lower(p[1]) * 62
                + p[2].0 as usize - s2
            } else if is_off_diag(p[2]) {
                6*63*62 + 4*28*62 + diag(p[0]) * 7*28
                + (diag(p[1]) - s1) * 28 + lower(p[2])
            } else {
                6*63*62 + 4*28*62 + 4*7*28 + diag(p[0]) * 7*6
                + (diag(p[1]) - s1) * 6 + (diag(p[2]) - s2)
            }
        };
        idx *= ei.factor[0] as usize;
    } else {
        for i in 0..shape.pawns[0] {
            for j in i + 1..shape.pawns[0] {
                if ptwist(p[i as usize]) < ptwist(p[j as usize]) {
                    p.swap(i as usize, j as usize);
                }
            }
        }

        let t = shape.pawns[0] as usize;
        idx = ind.pawn_idx[t - 1][flap(p[0])] as usize;
        for i in 1..t {
            idx += ind.binomial(ptwist(p[i]), t - i);
        }
        idx *= ei.factor[0] as usize;

        // remaining pawns
        i = shape.pawns[0] as usize;
        let t = i + shape.pawns[1] as usize;
        if t > i {
            for j in i..t {
                for k in j + 1..t {
                    if p[j].0 > p[k].0 {
                        p.swap(j, k);
                    }
                }
            }
            let mut s = 0;
            for m in i..t {
                let sq = p[m];
                let mut skips = 0;
                for k in 0..i {
                    skips += skip(sq, p[k]);
                }
                s += ind.binomial(sq.0 as usize - skips - 8, m - i + 1);
            }
            idx += s * ei.factor[i] as usize;
            i = t;
        }
    }

    while i < n {
        let t = ei.norm[i] as usize;
        for j in i..i + t {
            for k in j + 1..i + t {
                if p[j] > p[k] {
                    p.swap(j, k);
                }
            }
        }
        let mut s = 0;
        for m in i..i + t {
            let sq = p[m];
            let mut skips = 0;
            for k in 0..i {
                skips += skip(sq, p[k]);
            }
            s += ind.binomial(sq.0 as usize - skips, m - i + 1);
        }
        idx += s * ei.factor[i] as usize;
        i += t;
    }

    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use position::Position;

    #[test]
    fn binomial_satisfies_pascals_identity() {
        let ind = Indices::new();
        for n in 0..64 {
            assert_eq!(ind.binomial[0][n], 1);
            assert_eq!(ind.binomial[1][n], n as u32);
        }
        for k in 1..6 {
            for n in 1..64 {
                assert_eq!(
                    ind.binomial[k][n],
                    ind.binomial[k][n - 1] + ind.binomial[k - 1][n - 1]
                );
            }
        }
        assert_eq!(ind.binomial[2][5], 10);
        assert_eq!(ind.binomial[3][48], 17296);
    }

    #[test]
    fn kk_idx_enumerates_462_king_configurations() {
        let mut count = [0u32; 462];
        let mut max = 0;
        for t in KK_IDX.iter() {
            for &v in t.iter() {
                count[v as usize] += 1;
                if v > max {
                    max = v;
                }
            }
        }
        assert_eq!(max, 461);
        for v in 1..462 {
            assert_eq!(count[v], 1, "index {} duplicated or missing", v);
        }
    }

    #[test]
    fn triangle_is_invariant_under_board_flips() {
        for s in 0..64 {
            assert_eq!(TRIANGLE[s], TRIANGLE[s ^ 0x07]);
            assert_eq!(TRIANGLE[s], TRIANGLE[s ^ 0x38]);
        }
    }

    #[test]
    fn leading_pawn_file_canonicalizes_to_the_queenside() {
        ::init_for_tests();
        let sq = |f: u32, r: u32| Bitboard(1u64 << (8 * r + f));
        assert_eq!(leading_pawn_file(sq(0, 1)), FILE_A);
        assert_eq!(leading_pawn_file(sq(7, 4)), FILE_A);
        assert_eq!(leading_pawn_file(sq(1, 2)), FILE_B);
        assert_eq!(leading_pawn_file(sq(6, 6)), FILE_B);
        assert_eq!(leading_pawn_file(sq(2, 3)), FILE_C);
        assert_eq!(leading_pawn_file(sq(5, 3)), FILE_C);
        assert_eq!(leading_pawn_file(sq(3, 5)), FILE_D);
        assert_eq!(leading_pawn_file(sq(4, 5)), FILE_D);
    }

    #[test]
    fn single_value_tables_decode_without_data() {
        let mut d = PairsData::new();
        d.const_val = 3;
        assert_eq!(decompress_pairs(&[], &d, 0), 3);
        assert_eq!(decompress_pairs(&[], &d, 123456), 3);
    }

    #[test]
    fn decompress_reads_symbols_in_stream_order() {
        // A hand-built table with two one-bit symbols: bit 1 decodes to
        // 9 and bit 0 to 5. The stream holds the bits 1, 0.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0, 0]);             // offset table: [0]
        bytes.extend_from_slice(&[0, 0, 0, 0, 1, 0]); // index: block 0, offset 1
        bytes.extend_from_slice(&[63, 0]);            // size table: [63]
        bytes.push(0b1000_0000);                      // data
        bytes.extend_from_slice(&[5, 0xf0, 0xff]);    // symbol 0: literal 5
        bytes.extend_from_slice(&[9, 0xf0, 0xff]);    // symbol 1: literal 9

        let d = PairsData {
            index_table: 2,
            size_table: 8,
            data: 10,
            offset: 0,
            sym_pat: 11,
            sym_len: vec![0, 0],
            base: vec![0],
            block_size: 0,
            idx_bits: 1,
            min_len: 1,
            const_val: 0,
        };

        assert_eq!(decompress_pairs(&bytes, &d, 0), 9);
        assert_eq!(decompress_pairs(&bytes, &d, 1), 5);
    }

    #[test]
    fn mirrored_keys_resolve_to_the_same_entry() {
        let mut tb = Tablebases::new();
        let key = Key(0xdead_beef_0123_4567);
        let key2 = Key(0x0123_4567_dead_beef);
        tb.hash_insert(key, 3);
        tb.hash_insert(key2, 3);
        assert_eq!(tb.find_entry(key), Some(3));
        assert_eq!(tb.find_entry(key2), Some(3));
        assert_eq!(tb.find_entry(Key(42)), None);
    }

    #[test]
    fn missing_directories_register_nothing() {
        ::init_for_tests();
        let mut tb = Tablebases::new();
        tb.init("/no/such/directory");
        assert_eq!(tb.max_cardinality(), 0);

        let mut pos = Position::new();
        pos.init_states();
        pos.set("4k3/8/8/8/8/8/8/QK6 w - - 0 1", false);
        let mut success = 1;
        tb.probe_wdl(&mut pos, &mut success);
        assert_eq!(success, 0);

        // Reinitialization with an empty path drops everything and is
        // a no-op probe-wise.
        tb.init("");
        assert_eq!(tb.max_cardinality(), 0);
    }

    #[test]
    fn bare_kings_are_a_draw_without_any_files() {
        ::init_for_tests();
        let mut tb = Tablebases::new();

        let mut pos = Position::new();
        pos.init_states();
        pos.set("8/8/4k3/8/8/8/4K3/8 w - - 0 1", false);
        let mut success = 1;
        let v = tb.probe_wdl(&mut pos, &mut success);
        assert_eq!(v, 0);
        assert_eq!(success, 1);
    }
}
