// SPDX-License-Identifier: GPL-3.0-or-later

use types::*;

macro_rules! S { ($x:expr, $y:expr) => (Score(($y << 16) + $x)) }

// BONUS[piece type][rank][file / 2] contains piece-square scores for the
// white pieces. Tables are defined for files A..D and the other half of
// the board is obtained by mirroring. Pawns have their own table below,
// defined for the full board as they are not symmetric.
const BONUS: [[[Score; 4]; 8]; 7] = [
    [[Score(0); 4]; 8],
    [[Score(0); 4]; 8],
    [ // Knight
        [ S!(-175, -96), S!(-92,-65), S!(-74,-49), S!(-73,-21) ],
        [ S!( -77, -67), S!(-41,-54), S!(-27,-18), S!(-15,  8) ],
        [ S!( -61, -40), S!(-17,-27), S!(  6, -8), S!( 12, 29) ],
        [ S!( -35, -35), S!(  8, -2), S!( 40, 13), S!( 49, 28) ],
        [ S!( -34, -45), S!( 13,-16), S!( 44,  9), S!( 51, 39) ],
        [ S!(  -9, -51), S!( 22,-44), S!( 58,-16), S!( 53, 17) ],
        [ S!( -67, -69), S!(-27,-50), S!(  4,-51), S!( 37, 12) ],
        [ S!(-201,-100), S!(-83,-88), S!(-56,-56), S!(-26,-17) ],
    ],
    [ // Bishop
        [ S!(-53,-57), S!( -5,-30), S!( -8,-37), S!(-23,-12) ],
        [ S!(-15,-37), S!(  8,-13), S!( 19,-17), S!(  4,  1) ],
        [ S!( -7,-16), S!( 21, -1), S!( -5, -2), S!( 17, 10) ],
        [ S!( -5,-20), S!( 11, -6), S!( 25,  0), S!( 39, 17) ],
        [ S!(-12,-17), S!( 29, -1), S!( 22,-14), S!( 31, 15) ],
        [ S!(-16,-30), S!(  6,  6), S!(  1,  4), S!( 11,  6) ],
        [ S!(-17,-31), S!(-14,-20), S!(  5, -1), S!(  0,  1) ],
        [ S!(-48,-46), S!(  1,-42), S!(-14,-37), S!(-23,-24) ],
    ],
    [ // Rook
        [ S!(-31, -9), S!(-20,-13), S!(-14,-10), S!( -5, -9) ],
        [ S!(-21,-12), S!(-13, -9), S!( -8, -1), S!(  6, -2) ],
        [ S!(-25,  6), S!(-11, -8), S!( -1, -2), S!(  3, -6) ],
        [ S!(-13, -6), S!( -5,  1), S!( -4, -9), S!( -6,  7) ],
        [ S!(-27, -5), S!(-15,  8), S!( -4,  7), S!(  3, -6) ],
        [ S!(-22,  6), S!( -2,  1), S!(  6, -7), S!( 12, 10) ],
        [ S!( -2,  4), S!( 12,  5), S!( 16, 20), S!( 18, -5) ],
        [ S!(-17, 18), S!(-19,  0), S!( -1, 19), S!(  9, 13) ],
    ],
    [ // Queen
        [ S!(  3,-69), S!( -5,-57), S!( -5,-47), S!(  4,-26) ],
        [ S!( -3,-54), S!(  5,-31), S!(  8,-22), S!( 12, -4) ],
        [ S!( -3,-39), S!(  6,-18), S!( 13, -9), S!(  7,  3) ],
        [ S!(  4,-23), S!(  5, -3), S!(  9, 13), S!(  8, 24) ],
        [ S!(  0,-29), S!( 14, -6), S!( 12,  9), S!(  5, 21) ],
        [ S!( -4,-38), S!( 10,-18), S!(  6,-11), S!(  8,  1) ],
        [ S!( -5,-50), S!(  6,-27), S!( 10,-24), S!(  8, -8) ],
        [ S!( -2,-74), S!( -2,-52), S!(  1,-43), S!( -2,-34) ],
    ],
    [ // King
        [ S!(271,  1), S!(327, 45), S!(271, 85), S!(198, 76) ],
        [ S!(278, 53), S!(303,100), S!(234,133), S!(179,135) ],
        [ S!(195, 88), S!(258,130), S!(169,169), S!(120,175) ],
        [ S!(164,103), S!(190,156), S!(138,172), S!( 98,172) ],
        [ S!(154, 96), S!(179,166), S!(105,199), S!( 70,199) ],
        [ S!(123, 92), S!(145,172), S!( 81,184), S!( 31,191) ],
        [ S!( 88, 47), S!(120,121), S!( 65,116), S!( 33,131) ],
        [ S!( 59, 11), S!( 89, 59), S!( 45, 73), S!( -1, 78) ],
    ],
];

const PBONUS: [[Score; 8]; 8] = [
    [Score(0); 8],
    [ S!(  2, -8), S!(  4, -6), S!( 11,  9), S!( 18,  5),
      S!( 16, 16), S!( 21,  6), S!(  9, -6), S!( -3,-18) ],
    [ S!( -9, -9), S!(-15, -7), S!( 11,-10), S!( 15,  5),
      S!( 31,  2), S!( 23,  3), S!(  6, -8), S!(-20, -5) ],
    [ S!( -3,  7), S!(-20,  1), S!(  8, -8), S!( 19, -2),
      S!( 39,-14), S!( 17,-13), S!(  2,-11), S!( -5, -6) ],
    [ S!( 11, 12), S!( -4,  6), S!(-11,  2), S!(  2, -6),
      S!( 11, -5), S!(  0, -4), S!(-12, 14), S!(  5,  9) ],
    [ S!(  3, 27), S!(-11, 18), S!( -6, 19), S!( 22, 29),
      S!( -8, 30), S!( -5,  9), S!(-14,  8), S!(-11, 14) ],
    [ S!( -7, -1), S!(  6,-14), S!( -2, 13), S!(-11, 22),
      S!(  4, 24), S!(-14, 17), S!( 10,  7), S!( -9,  7) ],
    [Score(0); 8],
];

static mut PSQ: [[Score; 64]; 16] = [[Score(0); 64]; 16];

pub fn psq(pc: Piece, s: Square) -> Score {
    unsafe { PSQ[pc.0 as usize][s.0 as usize] }
}

// init() initializes piece-square tables: the white halves of the tables
// are copied from BONUS[] and PBONUS[], adding the piece value, then the
// black halves are initialized by flipping and changing the sign.

pub fn init() {
    for pt in 1..7 {
        let pc = Piece::make(WHITE, PieceType(pt));
        let v = Score::make(piece_value(MG, pc).0, piece_value(EG, pc).0);

        for s in Square::A1.take(64) {
            let score = v + if PieceType(pt) == PAWN {
                PBONUS[s.rank() as usize][s.file() as usize]
            } else {
                BONUS[pt as usize][s.rank() as usize]
                     [std::cmp::min(s.file(), FILE_H - s.file()) as usize]
            };
            unsafe {
                PSQ[pc.0 as usize][s.0 as usize] = score;
                PSQ[(!pc).0 as usize][(!s).0 as usize] = -score;
            }
        }
    }
}

use std;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_antisymmetric_in_color() {
        init();
        for pt in 1..7 {
            let w = Piece::make(WHITE, PieceType(pt));
            for s in Square::A1.take(64) {
                assert_eq!(psq(!w, !s), -psq(w, s));
            }
        }
    }

    #[test]
    fn non_pawn_tables_mirror_in_file() {
        init();
        for &pt in &[KNIGHT, BISHOP, ROOK, QUEEN, KING] {
            let pc = Piece::make(WHITE, pt);
            for s in Square::A1.take(64) {
                let mirrored = Square::make(FILE_H - s.file(), s.rank());
                assert_eq!(psq(pc, s), psq(pc, mirrored));
            }
        }
    }
}
