// SPDX-License-Identifier: GPL-3.0-or-later

//! NNUE evaluation.
//!
//! The network is a HalfKP(Friend) 256x2-32-32-1 architecture: a big
//! quantized feature transformer indexed by (king square, piece, square)
//! tuples for each side's perspective, followed by a small fully
//! connected network. The transformer accumulator is attached to the
//! position's state stack and updated incrementally from the dirty piece
//! records written by do_move().

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use std;

use thiserror::Error;

use position::Position;
use types::*;

/// Version identifier of the supported network files.
pub const VERSION: u32 = 0x7af32f16;

// Hashes identifying the network architecture. The header hash is the
// xor of the two section hashes.
const HEADER_HASH: u32 = 0x3e5aa6ee;
const TRANSFORMER_HASH: u32 = 0x5d69d7b8;
const NETWORK_HASH: u32 = 0x63337156;

// Output scaling divisor
const FV_SCALE: i32 = 16;

// Quantization shift of the hidden layers
const WEIGHT_SCALE_BITS: u32 = 6;

// Dimensions of the feature transformer
const HALF_DIMENSIONS: usize = 256;
const FT_IN_DIMS: usize = 64 * PS_END as usize;

// Indices of the piece-square features, one block of 64 squares per
// piece and perspective. Kings are not part of the feature set.
const PS_W_PAWN  : u32 = 1;
const PS_B_PAWN  : u32 = 1 * 64 + 1;
const PS_W_KNIGHT: u32 = 2 * 64 + 1;
const PS_B_KNIGHT: u32 = 3 * 64 + 1;
const PS_W_BISHOP: u32 = 4 * 64 + 1;
const PS_B_BISHOP: u32 = 5 * 64 + 1;
const PS_W_ROOK  : u32 = 6 * 64 + 1;
const PS_B_ROOK  : u32 = 7 * 64 + 1;
const PS_W_QUEEN : u32 = 8 * 64 + 1;
const PS_B_QUEEN : u32 = 9 * 64 + 1;
const PS_END     : u32 = 10 * 64 + 1;

// PIECE_TO_INDEX[perspective][piece] is the feature block of a piece as
// seen from each perspective.
const PIECE_TO_INDEX: [[u32; 16]; 2] = [
    [ 0, PS_W_PAWN, PS_W_KNIGHT, PS_W_BISHOP, PS_W_ROOK, PS_W_QUEEN, 0, 0,
      0, PS_B_PAWN, PS_B_KNIGHT, PS_B_BISHOP, PS_B_ROOK, PS_B_QUEEN, 0, 0 ],
    [ 0, PS_B_PAWN, PS_B_KNIGHT, PS_B_BISHOP, PS_B_ROOK, PS_B_QUEEN, 0, 0,
      0, PS_W_PAWN, PS_W_KNIGHT, PS_W_BISHOP, PS_W_ROOK, PS_W_QUEEN, 0, 0 ],
];

/// Accumulated first-layer sums for both perspectives, cached in each
/// StateInfo on the position's state stack.
#[derive(Clone)]
pub struct Accumulator {
    pub accumulation: [[i16; HALF_DIMENSIONS]; 2],
    pub computed: bool,
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator {
            accumulation: [[0; HALF_DIMENSIONS]; 2],
            computed: false,
        }
    }
}

/// Pieces moved by the last do_move(), recorded for the incremental
/// accumulator update. A normal move touches one piece, a capture or a
/// castling two and a capture-promotion three.
#[derive(Clone)]
pub struct DirtyPiece {
    pub num: usize,
    pub piece: [Piece; 3],
    pub from: [Square; 3],
    pub to: [Square; 3],
}

impl DirtyPiece {
    pub fn new() -> DirtyPiece {
        DirtyPiece {
            num: 0,
            piece: [NO_PIECE; 3],
            from: [Square::NONE; 3],
            to: [Square::NONE; 3],
        }
    }
}

#[derive(Debug, Error)]
pub enum NnueError {
    #[error("network file {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("wrong network version {0:#010x}, expected {1:#010x}")]
    BadVersion(u32, u32),
    #[error("wrong network hash {0:#010x}, expected {1:#010x}")]
    BadHash(u32, u32),
    #[error("truncated network file")]
    Truncated,
}

/// Parsed network weights. Read-only after loading; shared by all
/// threads.
pub struct Network {
    ft_biases: Vec<i16>,      // HALF_DIMENSIONS
    ft_weights: Vec<i16>,     // FT_IN_DIMS * HALF_DIMENSIONS
    hidden1_biases: Vec<i32>, // 32
    hidden1_weights: Vec<i8>, // 32 * 512
    hidden2_biases: Vec<i32>, // 32
    hidden2_weights: Vec<i8>, // 32 * 32
    output_bias: i32,
    output_weights: Vec<i8>,  // 32
}

// Little-endian reader over the raw file contents
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data: data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], NnueError> {
        if self.pos + n > self.data.len() {
            return Err(NnueError::Truncated);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, NnueError> {
        let b = self.take(4)?;
        Ok(u32::from(b[0])
            | (u32::from(b[1]) << 8)
            | (u32::from(b[2]) << 16)
            | (u32::from(b[3]) << 24))
    }

    fn read_i32(&mut self) -> Result<i32, NnueError> {
        Ok(self.read_u32()? as i32)
    }

    fn read_i16_vec(&mut self, n: usize) -> Result<Vec<i16>, NnueError> {
        let b = self.take(2 * n)?;
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            v.push((u16::from(b[2 * i])
                | (u16::from(b[2 * i + 1]) << 8)) as i16);
        }
        Ok(v)
    }

    fn read_i8_vec(&mut self, n: usize) -> Result<Vec<i8>, NnueError> {
        let b = self.take(n)?;
        Ok(b.iter().map(|&x| x as i8).collect())
    }
}

impl Network {
    /// Parses a network from the raw bytes of an .nnue file.
    pub fn parse(data: &[u8]) -> Result<Network, NnueError> {
        let mut r = Reader::new(data);

        let version = r.read_u32()?;
        if version != VERSION {
            return Err(NnueError::BadVersion(version, VERSION));
        }

        let hash = r.read_u32()?;
        if hash != HEADER_HASH {
            return Err(NnueError::BadHash(hash, HEADER_HASH));
        }

        // Architecture description string, only informational
        let desc_len = r.read_u32()? as usize;
        let _ = r.take(desc_len)?;

        let ft_hash = r.read_u32()?;
        if ft_hash != TRANSFORMER_HASH {
            return Err(NnueError::BadHash(ft_hash, TRANSFORMER_HASH));
        }

        let ft_biases = r.read_i16_vec(HALF_DIMENSIONS)?;
        let ft_weights = r.read_i16_vec(FT_IN_DIMS * HALF_DIMENSIONS)?;

        let net_hash = r.read_u32()?;
        if net_hash != NETWORK_HASH {
            return Err(NnueError::BadHash(net_hash, NETWORK_HASH));
        }

        let mut hidden1_biases = Vec::with_capacity(32);
        for _ in 0..32 {
            hidden1_biases.push(r.read_i32()?);
        }
        let hidden1_weights = r.read_i8_vec(32 * 2 * HALF_DIMENSIONS)?;

        let mut hidden2_biases = Vec::with_capacity(32);
        for _ in 0..32 {
            hidden2_biases.push(r.read_i32()?);
        }
        let hidden2_weights = r.read_i8_vec(32 * 32)?;

        let output_bias = r.read_i32()?;
        let output_weights = r.read_i8_vec(32)?;

        Ok(Network {
            ft_biases: ft_biases,
            ft_weights: ft_weights,
            hidden1_biases: hidden1_biases,
            hidden1_weights: hidden1_weights,
            hidden2_biases: hidden2_biases,
            hidden2_weights: hidden2_weights,
            output_bias: output_bias,
            output_weights: output_weights,
        })
    }
}

// find_file() searches for the network file in the working directory and
// next to the engine binary.
fn find_file(eval_file: &str) -> Option<PathBuf> {
    let direct = PathBuf::from(eval_file);
    if direct.is_file() {
        return Some(direct);
    }

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            let beside = dir.join(eval_file);
            if beside.is_file() {
                return Some(beside);
            }
        }
    }

    None
}

/// Locates, reads and parses the network file.
pub fn load(eval_file: &str) -> Result<Network, NnueError> {
    let path = find_file(eval_file)
        .ok_or_else(|| NnueError::NotFound(String::from(eval_file)))?;
    let data = fs::read(&path)?;
    Network::parse(&data)
}

/// Aborts the process when the network was requested but could not be
/// loaded. Called once before the search starts.
pub fn verify(eval_file: &str, loaded: bool) {
    if loaded {
        info!("NNUE evaluation using {} enabled", eval_file);
        return;
    }

    error!("NNUE evaluation was requested, but network file {} was not \
            loaded.", eval_file);
    error!("The file was searched for in the working directory and in the \
            directory of the binary.");
    error!("The EvalFile option might need to specify the full path, \
            including the directory name, of the file.");
    std::process::exit(1);
}

fn orient(perspective: Color, s: Square) -> u32 {
    s.0 ^ if perspective == WHITE { 0 } else { 0x3f }
}

fn make_index(perspective: Color, s: Square, pc: Piece, oriented_ksq: u32)
    -> usize
{
    (orient(perspective, s)
        + PIECE_TO_INDEX[perspective.0 as usize][pc.0 as usize]
        + PS_END * oriented_ksq) as usize
}

fn add_feature(network: &Network, acc: &mut [i16; HALF_DIMENSIONS],
    index: usize)
{
    let row = &network.ft_weights[index * HALF_DIMENSIONS..];
    for i in 0..HALF_DIMENSIONS {
        acc[i] += row[i];
    }
}

fn sub_feature(network: &Network, acc: &mut [i16; HALF_DIMENSIONS],
    index: usize)
{
    let row = &network.ft_weights[index * HALF_DIMENSIONS..];
    for i in 0..HALF_DIMENSIONS {
        acc[i] -= row[i];
    }
}

// refresh_accumulator() computes the accumulator of the current position
// from scratch by summing the feature rows of every non-king piece under
// both perspectives.
fn refresh_accumulator(network: &Network, pos: &mut Position) {
    let kings = [
        orient(WHITE, pos.square(WHITE, KING)),
        orient(BLACK, pos.square(BLACK, KING)),
    ];

    let mut accumulation = [[0i16; HALF_DIMENSIONS]; 2];
    for p in 0..2 {
        accumulation[p].copy_from_slice(&network.ft_biases);

        let perspective = Color(p as u32);
        for s in pos.pieces() & !pos.pieces_p(KING) {
            let index =
                make_index(perspective, s, pos.piece_on(s), kings[p]);
            add_feature(network, &mut accumulation[p], index);
        }
    }

    let n = pos.states.len();
    pos.states[n - 1].accumulator.accumulation = accumulation;
    pos.states[n - 1].accumulator.computed = true;
}

// update_accumulator() brings the accumulator of the current position up
// to date. It walks the state stack backwards looking for a computed
// accumulator and replays the dirty piece records on top of it; a king
// move invalidates every feature of the chain, in which case we refresh
// from scratch.
fn update_accumulator(network: &Network, pos: &mut Position) {
    let n = pos.states.len();
    if pos.states[n - 1].accumulator.computed {
        return;
    }

    let mut anchor = n;
    let mut i = n - 1;
    loop {
        if pos.states[i].accumulator.computed {
            anchor = i;
            break;
        }
        if i == 0 {
            break;
        }
        let dp = &pos.states[i].dirty_piece;
        if dp.num == 0 || dp.piece[0].piece_type() == KING {
            break;
        }
        i -= 1;
    }

    if anchor == n {
        refresh_accumulator(network, pos);
        return;
    }

    let kings = [
        orient(WHITE, pos.square(WHITE, KING)),
        orient(BLACK, pos.square(BLACK, KING)),
    ];

    let mut accumulation = pos.states[anchor].accumulator.accumulation;

    for j in anchor + 1..n {
        for k in 0..pos.states[j].dirty_piece.num {
            let pc = pos.states[j].dirty_piece.piece[k];
            let from = pos.states[j].dirty_piece.from[k];
            let to = pos.states[j].dirty_piece.to[k];

            for p in 0..2 {
                let perspective = Color(p as u32);
                if from != Square::NONE {
                    let index =
                        make_index(perspective, from, pc, kings[p]);
                    sub_feature(network, &mut accumulation[p], index);
                }
                if to != Square::NONE {
                    let index = make_index(perspective, to, pc, kings[p]);
                    add_feature(network, &mut accumulation[p], index);
                }
            }
        }
    }

    pos.states[n - 1].accumulator.accumulation = accumulation;
    pos.states[n - 1].accumulator.computed = true;
}

// transform() clips the accumulator halves to 0..127 and concatenates
// them, the side to move first.
fn transform(pos: &Position, output: &mut [u8; 2 * HALF_DIMENSIONS]) {
    let acc = &pos.states[pos.states.len() - 1].accumulator;
    let perspectives = [pos.side_to_move(), !pos.side_to_move()];

    for p in 0..2 {
        let accumulation =
            &acc.accumulation[perspectives[p].0 as usize];
        for i in 0..HALF_DIMENSIONS {
            let sum = i32::from(accumulation[i]);
            output[p * HALF_DIMENSIONS + i] =
                std::cmp::max(0, std::cmp::min(127, sum)) as u8;
        }
    }
}

fn affine_propagate(input: &[u8], biases: &[i32], weights: &[i8],
    output: &mut [i32])
{
    for i in 0..output.len() {
        let mut sum = biases[i];
        let row = &weights[i * input.len()..];
        for j in 0..input.len() {
            sum += i32::from(row[j]) * i32::from(input[j]);
        }
        output[i] = sum;
    }
}

fn clipped_relu(input: &[i32], output: &mut [u8]) {
    for i in 0..input.len() {
        output[i] = std::cmp::max(0,
            std::cmp::min(127, input[i] >> WEIGHT_SCALE_BITS)) as u8;
    }
}

/// Evaluates the position with the network. When `adjusted` is true the
/// raw output is rescaled by the material on the board, which improves
/// play in positions the network undervalues.
pub fn evaluate(network: &Network, pos: &mut Position, adjusted: bool)
    -> Value
{
    update_accumulator(network, pos);

    let mut transformed = [0u8; 2 * HALF_DIMENSIONS];
    transform(pos, &mut transformed);

    let mut hidden1 = [0i32; 32];
    affine_propagate(&transformed, &network.hidden1_biases,
        &network.hidden1_weights, &mut hidden1);
    let mut hidden1_clipped = [0u8; 32];
    clipped_relu(&hidden1, &mut hidden1_clipped);

    let mut hidden2 = [0i32; 32];
    affine_propagate(&hidden1_clipped, &network.hidden2_biases,
        &network.hidden2_weights, &mut hidden2);
    let mut hidden2_clipped = [0u8; 32];
    clipped_relu(&hidden2, &mut hidden2_clipped);

    let mut output = [0i32; 1];
    affine_propagate(&hidden2_clipped, &[network.output_bias],
        &network.output_weights, &mut output);

    let mut v = output[0] / FV_SCALE;

    if adjusted {
        let pawns = pos.count(WHITE, PAWN) + pos.count(BLACK, PAWN);
        let scale =
            1049 + 8 * pawns + 20 * pos.non_pawn_material().0 / 1024;
        v = v * scale / 1024;
    }

    Value(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_position(fen: &str) -> Position {
        ::init_for_tests();
        let mut pos = Position::new();
        pos.init_states();
        pos.alloc_caches();
        pos.set(fen, false);
        pos
    }

    // A network of all-zero weights with feature transformer biases of 1
    // and an output bias of 512. Small enough to build in memory.
    fn zero_network() -> Network {
        let mut data = Vec::new();

        let push_u32 = |data: &mut Vec<u8>, v: u32| {
            data.extend_from_slice(&[
                v as u8, (v >> 8) as u8, (v >> 16) as u8, (v >> 24) as u8,
            ]);
        };

        push_u32(&mut data, VERSION);
        push_u32(&mut data, super::HEADER_HASH);
        push_u32(&mut data, 0); // empty description

        push_u32(&mut data, super::TRANSFORMER_HASH);
        for _ in 0..HALF_DIMENSIONS {
            data.extend_from_slice(&[1, 0]); // bias 1
        }
        data.resize(data.len() + 2 * FT_IN_DIMS * HALF_DIMENSIONS, 0);

        push_u32(&mut data, super::NETWORK_HASH);
        data.resize(data.len() + 4 * 32, 0);               // hidden1 biases
        data.resize(data.len() + 32 * 2 * HALF_DIMENSIONS, 0);
        data.resize(data.len() + 4 * 32, 0);               // hidden2 biases
        data.resize(data.len() + 32 * 32, 0);
        push_u32(&mut data, 512);                           // output bias
        data.resize(data.len() + 32, 0);

        Network::parse(&data).unwrap()
    }

    // A network whose feature rows all differ, so that a wrong index in
    // the incremental update changes the output.
    fn patterned_network() -> Network {
        let mut ft_weights = vec![0i16; FT_IN_DIMS * HALF_DIMENSIONS];
        for (i, w) in ft_weights.iter_mut().enumerate() {
            *w = (i % 61) as i16 - 30;
        }
        Network {
            ft_biases: vec![7; HALF_DIMENSIONS],
            ft_weights: ft_weights,
            hidden1_biases: vec![0; 32],
            hidden1_weights: vec![1; 32 * 2 * HALF_DIMENSIONS],
            hidden2_biases: vec![0; 32],
            hidden2_weights: vec![1; 32 * 32],
            output_bias: 0,
            output_weights: vec![1; 32],
        }
    }

    #[test]
    fn feature_indices_fit_the_input_dimensions() {
        for pt in 1..6 {
            for c in 0..2 {
                let pc = Piece::make(Color(c), PieceType(pt));
                for sq in 0..64 {
                    let idx = make_index(WHITE, Square(sq), pc, 63);
                    assert!(idx < FT_IN_DIMS);
                    let idx = make_index(BLACK, Square(sq), pc, 63);
                    assert!(idx < FT_IN_DIMS);
                }
            }
        }
    }

    #[test]
    fn orientation_mirrors_the_board_for_black() {
        assert_eq!(orient(WHITE, Square::A1), Square::A1.0);
        assert_eq!(orient(BLACK, Square::A1), Square::H8.0);
        assert_eq!(orient(BLACK, Square::E4), Square::D5.0);
    }

    #[test]
    fn parse_rejects_a_bad_version() {
        let data = [0u8; 8];
        match Network::parse(&data) {
            Err(NnueError::BadVersion(0, v)) => assert_eq!(v, VERSION),
            _ => panic!("bad version accepted"),
        }
    }

    #[test]
    fn parse_rejects_a_truncated_file() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x16, 0x2f, 0xf3, 0x7a]); // version
        data.extend_from_slice(&[0xee, 0xa6, 0x5a, 0x3e]); // hash
        data.extend_from_slice(&[0, 0, 0, 0]);             // description
        match Network::parse(&data) {
            Err(NnueError::Truncated) => (),
            _ => panic!("truncated file accepted"),
        }
    }

    #[test]
    fn zero_network_output_is_the_scaled_bias() {
        let network = zero_network();
        let mut pos = make_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        // All weights are zero, so only the output bias remains
        assert_eq!(evaluate(&network, &mut pos, false),
            Value(512 / FV_SCALE));
    }

    #[test]
    fn incremental_update_matches_a_full_refresh() {
        let network = patterned_network();

        let mut pos = make_position(
            "r1bq1rk1/pp2bppp/2n2n2/2pp4/4P3/2NP1N2/PPP1BPPP/R1BQ1RK1 w - - 0 8");
        // Compute the parent accumulator so the update has an anchor
        evaluate(&network, &mut pos, false);
        pos.do_move(Move::make(Square::E4, Square::D5), false);
        let incremental = evaluate(&network, &mut pos, false);

        let mut fresh = make_position(
            "r1bq1rk1/pp2bppp/2n2n2/2pP4/8/2NP1N2/PPP1BPPP/R1BQ1RK1 b - - 0 8");
        let refreshed = evaluate(&network, &mut fresh, false);

        assert_eq!(incremental, refreshed);
    }

    #[test]
    fn adjusted_output_tracks_the_material_on_the_board() {
        let network = zero_network();

        // Full board: large scale
        let mut pos = make_position(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let full = evaluate(&network, &mut pos, true);

        // Bare kings: scale is 1049/1024
        let mut pos = make_position("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        let bare = evaluate(&network, &mut pos, true);

        assert!(full >= bare);
        assert_eq!(bare, Value(512 / FV_SCALE * 1049 / 1024));
    }
}
